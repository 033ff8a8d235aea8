//! Book records from the host page.
//!
//! The page embeds a `<script id="book-data">` element. Its text is the JSON
//! record array; when it instead carries a `data-src` attribute the records
//! are fetched from that URL, retrying transient failures with a doubling
//! delay. Every request honors an [`AbortSignal`] so a superseded load stops
//! without touching state.

use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortSignal, HtmlScriptElement, Request, RequestInit, Response};

use crate::catalog::{BookRecord, parse_records};

/// Id of the element holding or pointing at the records.
pub const DATA_ELEMENT_ID: &str = "book-data";
/// Attribute naming a URL to fetch instead of inline JSON.
pub const DATA_SRC_ATTRIBUTE: &str = "data-src";
/// Fetch attempts before giving up.
pub const MAX_ATTEMPTS: u32 = 3;
/// Delay before the first retry; doubles after each failure.
pub const RETRY_BASE_MS: i32 = 400;

/// Why records could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
	/// The data element is not in the document.
	#[error("no <script id=\"{0}\"> element on the page")]
	MissingElement(&'static str),
	/// The payload is not a JSON array of records.
	#[error("book data is not valid JSON: {0}")]
	Parse(String),
	/// The server answered with a non-success status.
	#[error("HTTP {status} from {url}")]
	Status { url: String, status: u16 },
	/// The request failed before a response.
	#[error("network error: {0}")]
	Network(String),
	/// The load was cancelled.
	#[error("request aborted")]
	Aborted,
}

impl LoadError {
	/// Whether another attempt could succeed.
	pub fn is_retryable(&self) -> bool {
		match self {
			LoadError::Network(_) => true,
			LoadError::Status { status, .. } => *status >= 500 || *status == 429,
			_ => false,
		}
	}
}

/// Where the records come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataSource {
	/// JSON embedded in the element.
	Inline(String),
	/// URL to fetch.
	Remote(String),
}

/// Inspect the page for the data element.
pub fn locate_source() -> Result<DataSource, LoadError> {
	let missing = || LoadError::MissingElement(DATA_ELEMENT_ID);
	let document = web_sys::window().and_then(|w| w.document()).ok_or_else(missing)?;
	let script: HtmlScriptElement = document
		.get_element_by_id(DATA_ELEMENT_ID)
		.ok_or_else(missing)?
		.dyn_into()
		.map_err(|_| missing())?;

	if let Some(url) = script
		.get_attribute(DATA_SRC_ATTRIBUTE)
		.filter(|u| !u.trim().is_empty())
	{
		return Ok(DataSource::Remote(url));
	}
	Ok(DataSource::Inline(script.text().unwrap_or_default()))
}

/// Parse and normalize a record array. Blank input is an empty catalog.
pub fn decode(json: &str) -> Result<Vec<BookRecord>, LoadError> {
	if json.trim().is_empty() {
		return Ok(Vec::new());
	}
	let books = parse_records(json).map_err(|e| LoadError::Parse(e.to_string()))?;
	log::info!("book-globe: loaded {} books", books.len());
	Ok(books)
}

/// Delay before retry number `attempt` (1-based).
pub fn retry_delay_ms(attempt: u32) -> i32 {
	RETRY_BASE_MS << attempt.saturating_sub(1).min(8)
}

/// Load the catalog from the page, fetching and retrying when remote.
pub async fn load_books(signal: Option<AbortSignal>) -> Result<Vec<BookRecord>, LoadError> {
	match locate_source()? {
		DataSource::Inline(json) => decode(&json),
		DataSource::Remote(url) => {
			let mut attempt = 1;
			loop {
				match fetch_text(&url, signal.as_ref()).await {
					Ok(json) => return decode(&json),
					Err(err) if err.is_retryable() && attempt < MAX_ATTEMPTS => {
						let delay = retry_delay_ms(attempt);
						log::warn!(
							"book-globe: fetch attempt {} failed ({}), retrying in {}ms",
							attempt,
							err,
							delay
						);
						sleep(delay).await;
						if signal.as_ref().is_some_and(AbortSignal::aborted) {
							return Err(LoadError::Aborted);
						}
						attempt += 1;
					}
					Err(err) => return Err(err),
				}
			}
		}
	}
}

fn describe(value: &JsValue) -> String {
	value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

async fn fetch_text(url: &str, signal: Option<&AbortSignal>) -> Result<String, LoadError> {
	let aborted = || signal.is_some_and(AbortSignal::aborted);

	let opts = RequestInit::new();
	opts.set_method("GET");
	opts.set_signal(signal);
	let request = Request::new_with_str_and_init(url, &opts).map_err(|e| LoadError::Network(describe(&e)))?;

	let window = web_sys::window().ok_or_else(|| LoadError::Network("no window".into()))?;
	let response: Response = match JsFuture::from(window.fetch_with_request(&request)).await {
		Ok(value) => value
			.dyn_into()
			.map_err(|_| LoadError::Network("fetch did not return a Response".into()))?,
		Err(_) if aborted() => return Err(LoadError::Aborted),
		Err(e) => return Err(LoadError::Network(describe(&e))),
	};

	if !response.ok() {
		return Err(LoadError::Status {
			url: url.to_string(),
			status: response.status(),
		});
	}

	let body = response.text().map_err(|e| LoadError::Network(describe(&e)))?;
	match JsFuture::from(body).await {
		Ok(text) => Ok(text.as_string().unwrap_or_default()),
		Err(_) if aborted() => Err(LoadError::Aborted),
		Err(e) => Err(LoadError::Network(describe(&e))),
	}
}

async fn sleep(ms: i32) {
	let promise = js_sys::Promise::new(&mut |resolve, _reject| match web_sys::window() {
		Some(window) => {
			let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
		}
		None => {
			let _ = resolve.call0(&JsValue::NULL);
		}
	});
	let _ = JsFuture::from(promise).await;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_decode_normalizes() {
		let books = decode(r#"[{"id": 1, "title": "A"}, {"title": "no id"}, {"id": " 2 ", "title": "B"}]"#).unwrap();
		let ids: Vec<_> = books.iter().filter_map(|b| b.key()).collect();
		assert_eq!(ids, ["1", "2"]);
		assert_eq!(books[1].id.as_deref(), Some("2"));
	}

	#[test]
	fn test_decode_blank_and_malformed() {
		assert_eq!(decode("  \n").unwrap().len(), 0);
		assert!(matches!(decode("{not json"), Err(LoadError::Parse(_))));
	}

	#[test]
	fn test_retry_delay_doubles() {
		assert_eq!(retry_delay_ms(1), 400);
		assert_eq!(retry_delay_ms(2), 800);
		assert_eq!(retry_delay_ms(3), 1600);
	}

	#[test]
	fn test_retryable_errors() {
		assert!(LoadError::Network("offline".into()).is_retryable());
		let status = |status| LoadError::Status {
			url: "/books.json".into(),
			status,
		};
		assert!(status(503).is_retryable());
		assert!(!status(404).is_retryable());
		assert!(!LoadError::Aborted.is_retryable());
		assert!(!LoadError::Parse("x".into()).is_retryable());
		assert_eq!(status(404).to_string(), "HTTP 404 from /books.json");
	}
}

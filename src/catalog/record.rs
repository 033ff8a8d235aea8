//! Book records as delivered by the data source.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::text::{clean, normalize_division, split_values};
use super::types::NodeType;

/// One catalog entry.
///
/// Every field is optional on the wire; records lacking an id or title are
/// dropped by [`normalize_records`] and skipped by the graph builder.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct BookRecord {
	/// Primary key; numbers are stringified on load.
	#[serde(default, deserialize_with = "string_or_number")]
	pub id: Option<String>,
	/// Display title; required for a record to count.
	#[serde(default)]
	pub title: Option<String>,
	/// Single author name.
	#[serde(default)]
	pub author: Option<String>,
	/// Single translator name.
	#[serde(default)]
	pub translator: Option<String>,
	/// Older exports carry the translator under its localized key.
	#[serde(default, rename = "역자")]
	pub translator_alt: Option<String>,
	/// Delimited list of categories.
	#[serde(default)]
	pub category: Option<String>,
	/// Delimited list of subjects.
	#[serde(default)]
	pub subject: Option<String>,
	/// Delimited list of genres.
	#[serde(default)]
	pub genre: Option<String>,
	/// Reading level, e.g. "2단계".
	#[serde(default)]
	pub level: Option<String>,
	/// Free-text edition note, normalized on build.
	#[serde(default)]
	pub division: Option<String>,
	/// Cover image URL.
	#[serde(default)]
	pub image: Option<String>,
	/// Publisher name, shown on the preview card.
	#[serde(default)]
	pub publisher: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Option::<Value>::deserialize(deserializer)? {
		Some(Value::String(s)) => Some(s),
		Some(Value::Number(n)) => Some(n.to_string()),
		_ => None,
	})
}

impl BookRecord {
	/// A record with only an id and title set.
	pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
		Self {
			id: Some(id.into()),
			title: Some(title.into()),
			..Default::default()
		}
	}

	/// Trimmed id, when present and non-blank.
	pub fn key(&self) -> Option<&str> {
		clean(self.id.as_deref())
	}

	/// Trimmed title, when present and non-blank.
	pub fn display_title(&self) -> Option<&str> {
		clean(self.title.as_deref())
	}

	/// Whether the record can become a book node.
	pub fn is_valid(&self) -> bool {
		self.key().is_some() && self.display_title().is_some()
	}

	/// Translator with the localized-key fallback applied.
	pub fn translator_name(&self) -> Option<&str> {
		clean(self.translator.as_deref()).or_else(|| clean(self.translator_alt.as_deref()))
	}

	fn raw_field(&self, node_type: NodeType) -> Option<&str> {
		match node_type {
			NodeType::Book => None,
			NodeType::Author => clean(self.author.as_deref()),
			NodeType::Translator => self.translator_name(),
			NodeType::Category => clean(self.category.as_deref()),
			NodeType::Subject => clean(self.subject.as_deref()),
			NodeType::Genre => clean(self.genre.as_deref()),
			NodeType::Level => clean(self.level.as_deref()),
			NodeType::Division => clean(self.division.as_deref()),
		}
	}

	/// Normalized values this record contributes for one attribute type.
	///
	/// Multi-valued types are split; the division is mapped onto its
	/// vocabulary. Repeated tokens are kept; callers dedupe.
	pub fn values(&self, node_type: NodeType) -> Vec<String> {
		let Some(raw) = self.raw_field(node_type) else {
			return Vec::new();
		};
		match node_type {
			NodeType::Category | NodeType::Subject | NodeType::Genre => {
				split_values(raw).into_iter().map(str::to_string).collect()
			}
			NodeType::Division => normalize_division(raw).into_iter().collect(),
			_ => vec![raw.to_string()],
		}
	}

	/// `(type, value)` pairs across every attribute type, in type order.
	pub fn attributes(&self) -> impl Iterator<Item = (NodeType, String)> + '_ {
		NodeType::ATTRIBUTES
			.into_iter()
			.flat_map(move |t| self.values(t).into_iter().map(move |v| (t, v)))
	}
}

/// Drop records that can never become book nodes and trim their keys.
pub fn normalize_records(records: Vec<BookRecord>) -> Vec<BookRecord> {
	let total = records.len();
	let kept: Vec<BookRecord> = records
		.into_iter()
		.filter(BookRecord::is_valid)
		.map(|mut r| {
			r.id = r.key().map(str::to_string);
			r
		})
		.collect();
	if kept.len() < total {
		log::debug!("book-globe: skipped {} malformed records", total - kept.len());
	}
	kept
}

/// Parse a JSON array of records and normalize it.
pub fn parse_records(json: &str) -> Result<Vec<BookRecord>, serde_json::Error> {
	let records: Vec<BookRecord> = serde_json::from_str(json)?;
	Ok(normalize_records(records))
}

//! book-globe: interactive radial graph of a book catalog.
//!
//! Book records are turned into a bipartite graph of books and their
//! attributes (authors, translators, categories, subjects, genres, levels,
//! divisions), filtered by a tab/chip selection and laid out as concentric
//! rings by a force simulation rendered on a WASM canvas.

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::*;
use log::{Level, info, warn};
use web_sys::AbortController;

pub mod catalog;
pub mod components;
pub mod data;

pub use catalog::{BookRecord, GraphData, NodeType, Selection, Tab};
pub use components::force_graph::{ForceGraphCanvas, GlobeConfig};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("book-globe: logging initialized");
}

/// Progress of the catalog load.
#[derive(Clone, Debug, PartialEq)]
enum LoadStatus {
	Loading,
	Ready,
	Failed(String),
}

/// Next selection after clicking a chip: toggles it within the current tab.
fn toggle_chip(current: &Selection, node_type: NodeType, value: &str) -> Selection {
	if current.tab == Tab::Facet(node_type) && current.chip.as_deref() == Some(value) {
		Selection::facet(node_type)
	} else {
		Selection::chip(node_type, value)
	}
}

/// The selection without a chip whose value is no longer in the catalog.
fn prune_chip(current: &Selection, facets: &catalog::FacetIndex) -> Option<Selection> {
	match (current.tab, current.chip.as_deref()) {
		(Tab::Facet(t), Some(chip)) if !facets.contains(t, chip) => Some(Selection::facet(t)),
		_ => None,
	}
}

/// Main application component.
/// Loads the catalog from the page, renders the filter controls and the globe.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let books = RwSignal::new(Vec::<BookRecord>::new());
	let status = RwSignal::new(LoadStatus::Loading);
	let selection = RwSignal::new(Selection::all());
	let attempt = RwSignal::new(0u32);
	let pending = StoredValue::new_local(None::<AbortController>);

	Effect::new(move |_| {
		attempt.track();
		pending.update_value(|slot| {
			if let Some(previous) = slot.take() {
				previous.abort();
			}
		});
		let controller = AbortController::new().ok();
		let signal = controller.as_ref().map(AbortController::signal);
		pending.set_value(controller);
		status.set(LoadStatus::Loading);

		spawn_local(async move {
			match data::load_books(signal).await {
				Ok(loaded) => {
					books.set(loaded);
					status.set(LoadStatus::Ready);
				}
				Err(data::LoadError::Aborted) => {}
				Err(err) => {
					warn!("book-globe: failed to load books: {}", err);
					books.set(Vec::new());
					status.set(LoadStatus::Failed(err.to_string()));
				}
			}
		});
	});

	on_cleanup(move || {
		pending.try_update_value(|slot| {
			if let Some(controller) = slot.take() {
				controller.abort();
			}
		});
	});

	let facets = Memo::new(move |_| books.with(|b| catalog::extract_facets(b)));

	Effect::new(move |_| {
		let pruned = facets.with(|f| selection.with_untracked(|s| prune_chip(s, f)));
		if let Some(next) = pruned {
			selection.set(next);
		}
	});

	let tabs = move || {
		std::iter::once(Tab::All)
			.chain(NodeType::ATTRIBUTES.into_iter().map(Tab::Facet))
			.map(|tab| {
				let active = move || selection.with(|s| s.tab == tab);
				let empty = move || match tab {
					Tab::All => false,
					Tab::Facet(t) => facets.with(|f| !f.types().any(|present| present == t)),
				};
				let pick = move |_| {
					selection.set(match tab {
						Tab::All => Selection::all(),
						Tab::Facet(t) => Selection::facet(t),
					})
				};
				view! {
					<button class="globe-tab" class:active=active disabled=empty on:click=pick>
						{tab.to_string()}
					</button>
				}
			})
			.collect_view()
	};

	let chips = move || {
		let Tab::Facet(node_type) = selection.with(|s| s.tab) else {
			return None;
		};
		let items = facets.with(|f| {
			f.values(node_type)
				.iter()
				.map(|value| (value.clone(), f.book_count(node_type, value)))
				.collect::<Vec<_>>()
		});
		Some(
			items
				.into_iter()
				.map(|(value, count)| {
					let chosen = value.clone();
					let active = {
						let value = value.clone();
						move || selection.with(|s| s.chip.as_deref() == Some(value.as_str()))
					};
					let pick = move |_| selection.update(|s| *s = toggle_chip(s, node_type, &chosen));
					view! {
						<button class="globe-chip" class:active=active on:click=pick>
							{value}
							<span class="globe-chip-count">{count}</span>
						</button>
					}
				})
				.collect_view(),
		)
	};

	let status_line = move || match status.get() {
		LoadStatus::Loading => Some(view! { <p class="globe-status">"도서 정보를 불러오는 중…"</p> }.into_any()),
		LoadStatus::Ready => None,
		LoadStatus::Failed(message) => Some(
			view! {
				<p class="globe-status error">
					{format!("불러오지 못했습니다: {}", message)}
					<button class="globe-retry" on:click=move |_| attempt.update(|n| *n += 1)>
						"다시 시도"
					</button>
				</p>
			}
			.into_any(),
		),
	};

	view! {
		<Html attr:lang="ko" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Book Globe" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<ForceGraphCanvas books=books selection=selection fullscreen=true />
			<div class="graph-overlay">
				<nav class="globe-tabs">{tabs}</nav>
				<div class="globe-chips">{chips}</div>
				{status_line}
			</div>
		</div>
	}
}

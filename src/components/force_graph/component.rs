//! Leptos component wrapping the globe canvas.
//!
//! The component owns a [`GlobeState`] behind `Rc<RefCell<..>>`, drives it
//! from a `requestAnimationFrame` loop and forwards mouse, touch and wheel
//! input to it. Window resizes are debounced before the layout is
//! reapplied, and a one-shot timer fits the camera to a freshly seeded graph
//! unless the viewport or the selection changes first.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent, WheelEvent, Window};

use super::config::GlobeConfig;
use super::interaction::InteractionEvent;
use super::render;
use super::state::GlobeState;
use super::theme::Theme;
use crate::catalog::{BookRecord, Selection};

/// Canvas, its 2D context and the state drawn into it.
struct GraphContext {
	state: GlobeState,
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
	theme: Theme,
}

/// Callback that can be handed to browser APIs.
trait JsCallback {
	fn function(&self) -> &js_sys::Function;
}

impl JsCallback for Closure<dyn FnMut()> {
	fn function(&self) -> &js_sys::Function {
		self.as_ref().unchecked_ref()
	}
}

/// A restartable one-shot `setTimeout`.
struct Timeout<C = Closure<dyn FnMut()>> {
	handle: Cell<Option<i32>>,
	callback: RefCell<Option<C>>,
}

impl<C> Default for Timeout<C> {
	fn default() -> Self {
		Self {
			handle: Cell::new(None),
			callback: RefCell::new(None),
		}
	}
}

impl<C: JsCallback> Timeout<C> {
	fn set_callback(&self, callback: C) {
		*self.callback.borrow_mut() = Some(callback);
	}

	fn schedule(&self, ms: i32) {
		self.cancel();
		let Some(window) = web_sys::window() else {
			return;
		};
		if let Some(cb) = self.callback.borrow().as_ref() {
			self.handle.set(
				window
					.set_timeout_with_callback_and_timeout_and_arguments_0(cb.function(), ms)
					.ok(),
			);
		}
	}

	fn cancel(&self) {
		let Some(handle) = self.handle.take() else {
			return;
		};
		if let Some(window) = web_sys::window() {
			window.clear_timeout_with_handle(handle);
		}
	}

	/// Cancel and drop the callback along with whatever it captured.
	fn clear(&self) {
		self.cancel();
		self.callback.borrow_mut().take();
	}
}

/// Everything the callbacks share.
///
/// The callbacks hold `Rc`s back to this, so [`Shared::teardown`] must drop
/// every one of them or the whole graph outlives the component.
struct Shared<C = Closure<dyn FnMut()>> {
	context: RefCell<Option<GraphContext>>,
	animate: RefCell<Option<C>>,
	frame: Cell<Option<i32>>,
	resize_listener: RefCell<Option<C>>,
	resize_timer: Timeout<C>,
	fit_timer: Timeout<C>,
	alive: Cell<bool>,
}

impl<C> Default for Shared<C> {
	fn default() -> Self {
		Self {
			context: RefCell::new(None),
			animate: RefCell::new(None),
			frame: Cell::new(None),
			resize_listener: RefCell::new(None),
			resize_timer: Timeout::default(),
			fit_timer: Timeout::default(),
			alive: Cell::new(false),
		}
	}
}

impl<C: JsCallback> Shared<C> {
	fn with_state(&self, f: impl FnOnce(&mut GlobeState)) {
		if let Some(c) = self.context.borrow_mut().as_mut() {
			f(&mut c.state);
		}
	}

	fn request_frame(&self, window: &Window) {
		if let Some(cb) = self.animate.borrow().as_ref() {
			self.frame.set(window.request_animation_frame(cb.function()).ok());
		}
	}

	fn teardown(&self) {
		self.alive.set(false);
		self.resize_timer.clear();
		self.fit_timer.clear();
		let listener = self.resize_listener.borrow_mut().take();
		let frame = self.frame.take();
		if listener.is_some() || frame.is_some() {
			if let Some(window) = web_sys::window() {
				if let Some(cb) = listener.as_ref() {
					let _ = window.remove_event_listener_with_callback("resize", cb.function());
				}
				if let Some(handle) = frame {
					let _ = window.cancel_animation_frame(handle);
				}
			}
		}
		self.animate.borrow_mut().take();
		self.context.borrow_mut().take();
	}
}

/// Contents of the floating preview card.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewCard {
	/// Book title or attribute value.
	pub title: String,
	/// Localized node type tag.
	pub kind: &'static str,
	/// Author and publisher for books, book count for attributes.
	pub detail: Option<String>,
	/// Cover URL, books only.
	pub image: Option<String>,
	/// Anchor in canvas pixels.
	pub x: f64,
	pub y: f64,
}

impl PreviewCard {
	/// Card for the state's previewed node, if any.
	pub fn from_state(state: &GlobeState) -> Option<Self> {
		let (node, (x, y)) = state.preview()?;
		let detail = if node.node_type.is_book() {
			let parts: Vec<&str> = [node.author.as_deref(), node.publisher.as_deref()]
				.into_iter()
				.flatten()
				.collect();
			(!parts.is_empty()).then(|| parts.join(" · "))
		} else {
			Some(format!("도서 {}권", state.base().degree(&node.id)))
		};
		Some(Self {
			title: node.label.clone(),
			kind: node.node_type.tag(),
			detail,
			image: node.image.clone(),
			x,
			y,
		})
	}
}

fn viewport_size(window: &Window, canvas: &HtmlCanvasElement, fullscreen: bool) -> (f64, f64) {
	if fullscreen {
		let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
		(dim(window.inner_width()), dim(window.inner_height()))
	} else {
		canvas
			.parent_element()
			.map(|p| (p.client_width() as f64, p.client_height() as f64))
			.unwrap_or((0.0, 0.0))
	}
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, client_x: i32, client_y: i32) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?;
	let rect = canvas.get_bounding_client_rect();
	Some((client_x as f64 - rect.left(), client_y as f64 - rect.top()))
}

/// Renders the book globe on a canvas.
///
/// `books` replaces the catalog whenever it changes; `selection` re-filters
/// it. With `fullscreen` the canvas tracks the window size, otherwise its
/// parent element's.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] books: Signal<Vec<BookRecord>>,
	#[prop(into)] selection: Signal<Selection>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(optional)] config: Option<GlobeConfig>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let preview = RwSignal::new(None::<PreviewCard>);
	let shared: Rc<Shared> = Rc::new(Shared::default());
	let config = config.unwrap_or_default();
	let (resize_ms, fit_ms, frame_dt) = (
		config.timing.resize_debounce_ms,
		config.timing.auto_fit_ms,
		config.timing.frame_dt,
	);

	let shared_init = shared.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if shared_init.context.borrow().is_some() {
			return;
		}
		let Some(window) = web_sys::window() else {
			return;
		};
		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			log::warn!("book-globe: canvas has no 2d context");
			return;
		};

		let (w, h) = viewport_size(&window, &canvas, fullscreen);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let mut state = GlobeState::new(config.clone(), w, h);
		state.select(selection.get_untracked());
		state.set_books(&books.get_untracked());
		*shared_init.context.borrow_mut() = Some(GraphContext {
			state,
			canvas,
			ctx,
			theme: Theme::default(),
		});
		shared_init.alive.set(true);

		let fit_target = shared_init.clone();
		shared_init.fit_timer.set_callback(Closure::new(move || {
			fit_target.with_state(|state| {
				if state.fit_pending() {
					state.fit_to_nodes();
				}
			});
		}));
		shared_init.fit_timer.schedule(fit_ms);

		let resize_target = shared_init.clone();
		shared_init.resize_timer.set_callback(Closure::new(move || {
			let Some(window) = web_sys::window() else {
				return;
			};
			if let Some(c) = resize_target.context.borrow_mut().as_mut() {
				let (nw, nh) = viewport_size(&window, &c.canvas, fullscreen);
				c.canvas.set_width(nw as u32);
				c.canvas.set_height(nh as u32);
				if !c.state.resize(nw, nh) {
					log::debug!("book-globe: resize to {}x{} left layout untouched", nw, nh);
				}
			}
		}));

		let debounce = shared_init.clone();
		let listener: Closure<dyn FnMut()> = Closure::new(move || {
			debounce.fit_timer.cancel();
			debounce.resize_timer.schedule(resize_ms);
		});
		let _ = window.add_event_listener_with_callback("resize", listener.function());
		*shared_init.resize_listener.borrow_mut() = Some(listener);

		let frame = shared_init.clone();
		*shared_init.animate.borrow_mut() = Some(Closure::new(move || {
			if !frame.alive.get() {
				return;
			}
			if let Some(c) = frame.context.borrow_mut().as_mut() {
				c.state.tick(frame_dt);
				let labels = c.state.place_labels();
				render::render(&c.state, &c.ctx, &c.theme, &labels);

				let card = PreviewCard::from_state(&c.state);
				if preview.with_untracked(|current| *current != card) {
					preview.set(card);
				}
			}
			if let Some(window) = web_sys::window() {
				frame.request_frame(&window);
			}
		}));
		shared_init.request_frame(&window);
	});

	let shared_books = shared.clone();
	Effect::new(move |_| {
		let books = books.get();
		let mut reseeded = false;
		shared_books.with_state(|state| {
			state.set_books(&books);
			reseeded = true;
		});
		if reseeded {
			shared_books.fit_timer.schedule(fit_ms);
		}
	});

	let shared_select = shared.clone();
	Effect::new(move |_| {
		let selection = selection.get();
		let mut reseeded = false;
		shared_select.with_state(|state| {
			if *state.selection() != selection {
				state.select(selection);
				reseeded = true;
			}
		});
		if reseeded {
			shared_select.fit_timer.schedule(fit_ms);
		}
	});

	let teardown = StoredValue::new_local(shared.clone());
	on_cleanup(move || {
		teardown.try_with_value(|shared| shared.teardown());
	});

	let dispatch = move |event: Option<InteractionEvent>| {
		let Some(InteractionEvent::Navigate { href }) = event else {
			return;
		};
		log::info!("book-globe: navigating to {}", href);
		if let Some(window) = web_sys::window() {
			let _ = window.location().set_href(&href);
		}
	};

	let shared_md = shared.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		shared_md.with_state(|state| state.pointer_down(x, y));
	};

	let shared_mm = shared.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		shared_mm.with_state(|state| state.pointer_move(x, y));
	};

	let shared_mu = shared.clone();
	let on_mouseup = move |_: MouseEvent| {
		let mut event = None;
		shared_mu.with_state(|state| event = state.pointer_up(js_sys::Date::now()));
		dispatch(event);
	};

	let shared_ml = shared.clone();
	let on_mouseleave = move |_: MouseEvent| {
		shared_ml.with_state(GlobeState::pointer_leave);
	};

	let shared_wh = shared.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, ev.client_x(), ev.client_y()) else {
			return;
		};
		shared_wh.fit_timer.cancel();
		shared_wh.with_state(|state| state.zoom(x, y, ev.delta_y()));
	};

	let shared_ts = shared.clone();
	let on_touchstart = move |ev: TouchEvent| {
		let Some(touch) = ev.touches().get(0) else {
			return;
		};
		let Some((x, y)) = local_point(canvas_ref, touch.client_x(), touch.client_y()) else {
			return;
		};
		shared_ts.with_state(|state| state.pointer_down(x, y));
	};

	let shared_tm = shared.clone();
	let on_touchmove = move |ev: TouchEvent| {
		let Some(touch) = ev.touches().get(0) else {
			return;
		};
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, touch.client_x(), touch.client_y()) else {
			return;
		};
		shared_tm.with_state(|state| state.pointer_move(x, y));
	};

	let shared_te = shared.clone();
	let on_touchend = move |ev: TouchEvent| {
		ev.prevent_default();
		let mut event = None;
		shared_te.with_state(|state| event = state.pointer_up(js_sys::Date::now()));
		dispatch(event);
	};

	let dismissed = RwSignal::new(0u32);
	let shared_close = shared.clone();
	Effect::new(move |_| {
		if dismissed.get() > 0 {
			shared_close.with_state(GlobeState::clear_preview);
			preview.set(None);
		}
	});

	view! {
		<div class="globe" style="position: relative; width: 100%; height: 100%;">
			<canvas
				node_ref=canvas_ref
				class="force-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:touchstart=on_touchstart
				on:touchmove=on_touchmove
				on:touchend=on_touchend
				style="display: block; cursor: grab; touch-action: none;"
			/>
			{move || {
				preview
					.get()
					.map(|card| {
						let style = format!(
							"position: absolute; left: {}px; top: {}px;",
							card.x + 12.0,
							card.y + 12.0,
						);
						view! {
							<div class="globe-preview" style=style>
								{card.image.map(|src| view! { <img class="globe-preview-cover" src=src alt="" /> })}
								<span class="globe-preview-kind">{card.kind}</span>
								<strong class="globe-preview-title">{card.title}</strong>
								{card.detail.map(|d| view! { <p class="globe-preview-detail">{d}</p> })}
								<button
									class="globe-preview-close"
									on:click=move |_| dismissed.update(|n| *n += 1)
								>
									"×"
								</button>
							</div>
						}
					})
			}}
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::engine::PhysicsEngine;

	/// Callback that only keeps its owner alive.
	struct Held {
		_owner: Rc<Shared<Held>>,
	}

	impl JsCallback for Held {
		fn function(&self) -> &js_sys::Function {
			unreachable!("nothing is scheduled without a window")
		}
	}

	#[test]
	fn test_teardown_releases_every_callback() {
		let shared: Rc<Shared<Held>> = Rc::new(Shared::default());
		shared.alive.set(true);
		shared.fit_timer.set_callback(Held { _owner: shared.clone() });
		shared.resize_timer.set_callback(Held { _owner: shared.clone() });
		*shared.animate.borrow_mut() = Some(Held { _owner: shared.clone() });
		assert_eq!(Rc::strong_count(&shared), 4);

		shared.teardown();
		assert_eq!(Rc::strong_count(&shared), 1);
		assert!(!shared.alive.get());
		assert!(shared.animate.borrow().is_none());
		assert!(shared.fit_timer.callback.borrow().is_none());
	}

	#[test]
	fn test_preview_card_for_book() {
		let mut state = GlobeState::new(GlobeConfig::default(), 800.0, 600.0);
		state.set_books(&[BookRecord {
			author: Some("한강".into()),
			publisher: Some("창비".into()),
			..BookRecord::new("1", "소년이 온다")
		}]);
		assert!(PreviewCard::from_state(&state).is_none());

		let p = *state.engine.positions().get("book:1").unwrap();
		let (sx, sy) = state.transform.world_to_screen(p.x, p.y).unwrap();
		state.pointer_down(sx, sy);
		state.pointer_up(0.0);

		let card = PreviewCard::from_state(&state).unwrap();
		assert_eq!(card.title, "소년이 온다");
		assert_eq!(card.kind, "도서");
		assert_eq!(card.detail.as_deref(), Some("한강 · 창비"));
		assert_eq!((card.x, card.y), (sx, sy));
	}

	#[test]
	fn test_preview_card_for_attribute_counts_books() {
		let mut state = GlobeState::new(GlobeConfig::default(), 800.0, 600.0);
		let book = |id: &str| BookRecord {
			author: Some("한강".into()),
			..BookRecord::new(id, "T")
		};
		state.set_books(&[book("1"), book("2"), book("2")]);

		let p = *state.engine.positions().get("author:한강").unwrap();
		let (sx, sy) = state.transform.world_to_screen(p.x, p.y).unwrap();
		state.pointer_down(sx, sy);
		state.pointer_up(0.0);

		let card = PreviewCard::from_state(&state).unwrap();
		assert_eq!(card.kind, "저자");
		assert_eq!(card.detail.as_deref(), Some("도서 2권"));
	}
}

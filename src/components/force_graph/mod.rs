//! Radial "globe" view of the book catalog.
//!
//! Books sit on an inner ring and each attribute type (author, genre, level,
//! ...) on its own ring around them, held there by a force simulation. The
//! view supports pan, zoom, node dragging, hover highlight, decluttered
//! labels and a tap preview card.
//!
//! # Example
//!
//! ```ignore
//! use book_globe::{BookRecord, ForceGraphCanvas, Selection};
//!
//! let books = vec![BookRecord::new("1", "채식주의자")];
//! view! {
//!     <ForceGraphCanvas books=books selection=Selection::all() fullscreen=true />
//! }
//! ```

mod component;
pub mod config;
pub mod engine;
pub mod interaction;
pub mod labels;
pub mod layout;
mod render;
pub mod scale;
mod spatial;
pub mod state;
pub mod theme;

pub use component::{ForceGraphCanvas, PreviewCard};
pub use config::GlobeConfig;
pub use engine::{ForceGraphEngine, PhysicsEngine};
pub use state::GlobeState;
pub use theme::Theme;

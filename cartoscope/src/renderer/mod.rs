//! Renderer handles: the imperative mutation surface the reconciler drives.
//!
//! A [`RendererHandle`] wraps one concrete rendering engine behind the narrow
//! mutation contract the reconciliation engine needs: create and remove
//! sources, add and remove layers, patch individual properties in place, and
//! report whether the base style has finished loading. Mutations are
//! synchronous and fail with a [`RendererError`]; asynchronous engine
//! conditions (style load completion, tile fetch failures) arrive as
//! [`RendererEvent`]s on a broadcast channel.
//!
//! Two engines are supported, selected by [`EngineKind`]. They differ in one
//! capability: the Mapbox engine resolves `mapbox://` tileset URLs natively,
//! while the MapLibre engine reaches the same tile host through a
//! [`TileUrlRewriter`] applied inside the handle. Callers never see the
//! rewritten URLs.
//!
//! [`HeadlessRenderer`] is the in-process implementation used by the session
//! runtime and the test suite. Its [`RendererControl`] handle simulates the
//! asynchronous half of a real engine: completing the style load, surfacing
//! source errors, and injecting mutation failures.

mod error;
mod events;
mod handle;
mod headless;
mod rewrite;

pub use error::RendererError;
pub use events::RendererEvent;
pub use handle::{EngineKind, RendererHandle};
pub use headless::{HeadlessRenderer, RendererControl};
pub use rewrite::TileUrlRewriter;

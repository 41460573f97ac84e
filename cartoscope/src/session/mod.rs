//! Session orchestration.
//!
//! A session is the top of the crate: it owns the store, the draw router,
//! and a worker task that keeps a renderer reconciled against the layer
//! catalog. Construction is configuration-first: build a
//! [`SessionConfig`], pick a service stack, call
//! [`MapSession::start`](MapSession::start) or
//! [`MapSession::start_default`](MapSession::start_default).

mod config;
mod factory;
mod map_session;

pub use config::SessionConfig;
pub use factory::{HeadlessFactory, RendererFactory};
pub use map_session::{MapSession, SessionError};

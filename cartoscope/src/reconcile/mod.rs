//! Layer reconciliation: diffing desired state onto a live renderer.
//!
//! The [`Reconciler`] owns a renderer handle exclusively and keeps it
//! synchronized with whatever [`DescriptorSet`](crate::descriptor::DescriptorSet)
//! it was last given. Each [`sync`](Reconciler::sync) call diffs the desired
//! set against the previously applied one and issues only the mutations that
//! close the gap, so syncing the same set twice is a no-op.
//!
//! The renderer's asynchronous lifecycle is tracked as a forward-only state
//! machine ([`RendererLifecycle`]). Desired state arriving before the base
//! style has loaded is buffered, latest-wins, and flushed when the loaded
//! signal comes in. A failed mutation parks the lifecycle in its terminal
//! error state without rolling back what was already applied; recovery is an
//! engine swap, which rebuilds everything from scratch.

mod engine;
mod lifecycle;
mod mutation;

pub use engine::{ReconcileError, Reconciler};
pub use lifecycle::{RendererLifecycle, RendererState};
pub use mutation::Mutation;

//! Renderer construction for sessions.

use crate::renderer::{EngineKind, HeadlessRenderer, RendererHandle};

/// Builds renderer handles on demand.
///
/// A session builds one renderer at start and a fresh one on every engine
/// swap; the factory owns whatever credentials and engine setup that takes.
pub trait RendererFactory: Send + 'static {
    /// The renderer type this factory produces.
    type Handle: RendererHandle + 'static;

    /// Builds a fresh renderer for `kind`, ready to be mounted.
    fn build(&mut self, kind: EngineKind) -> Self::Handle;
}

/// Factory for in-process renderers.
///
/// The renderers it produces report their style as loaded immediately: a
/// headless engine has no style asset to fetch, so there is nothing to wait
/// for between mount and readiness.
pub struct HeadlessFactory {
    access_token: Option<String>,
}

impl HeadlessFactory {
    /// Creates a factory passing `access_token` to every renderer it
    /// builds.
    pub fn new(access_token: Option<String>) -> Self {
        Self { access_token }
    }
}

impl RendererFactory for HeadlessFactory {
    type Handle = HeadlessRenderer;

    fn build(&mut self, kind: EngineKind) -> HeadlessRenderer {
        let renderer = HeadlessRenderer::new(kind, self.access_token.clone());
        renderer.control().complete_style_load();
        renderer
    }
}

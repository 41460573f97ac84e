//! Asynchronous renderer notifications.

use crate::descriptor::SourceId;

/// Conditions a renderer reports outside the synchronous mutation path.
#[derive(Debug, Clone, PartialEq)]
pub enum RendererEvent {
    /// The base style and its bundled sources have finished loading.
    ///
    /// Until this fires, mutations fail with
    /// [`RendererError::StyleNotLoaded`](super::RendererError::StyleNotLoaded)
    /// and the reconciler buffers desired state instead of applying it.
    StyleLoaded,

    /// A source failed after creation, typically a tile fetch error.
    SourceError {
        /// The failing source, when the engine could attribute the failure.
        source_id: Option<SourceId>,
        /// Engine-provided description of the failure.
        message: String,
    },
}

impl RendererEvent {
    /// Formats a source error the way the health indicator displays it.
    pub fn health_message(&self) -> Option<String> {
        match self {
            RendererEvent::StyleLoaded => None,
            RendererEvent::SourceError { source_id, message } => {
                let source = source_id
                    .as_ref()
                    .map(|id| id.as_str().to_string())
                    .unwrap_or_else(|| "Unknown Source".to_string());
                let message = if message.is_empty() {
                    "Source Load Failure"
                } else {
                    message.as_str()
                };
                Some(format!("Failed [{source}]: {message}"))
            }
        }
    }
}

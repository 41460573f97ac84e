//! Renderer mutation errors.

use thiserror::Error;

use crate::descriptor::{LayerId, SourceId};

/// Errors raised by renderer mutations.
///
/// Each error is fatal to the mutation that raised it and nothing else:
/// sources and layers applied before the failure stay live.
#[derive(Debug, Error, PartialEq)]
pub enum RendererError {
    /// A mutation arrived before the base style finished loading.
    #[error("style is not loaded yet")]
    StyleNotLoaded,

    /// Attempted to create a source under an id that is already taken.
    #[error("source '{0}' already exists")]
    SourceExists(SourceId),

    /// The referenced source does not exist in the renderer.
    #[error("source '{0}' does not exist")]
    UnknownSource(SourceId),

    /// Attempted to remove a source that a live layer still reads from.
    #[error("source '{0}' is still referenced by layer '{1}'")]
    SourceInUse(SourceId, LayerId),

    /// Attempted to add a layer under an id that is already taken.
    #[error("layer '{0}' already exists")]
    LayerExists(LayerId),

    /// The referenced layer does not exist in the renderer.
    #[error("layer '{0}' does not exist")]
    UnknownLayer(LayerId),

    /// A `mapbox://` tileset was requested without an access token.
    #[error("mapbox access token missing")]
    MissingCredential,

    /// The engine rejected the mutation for its own reasons.
    #[error("engine failure: {0}")]
    EngineFailure(String),
}

//! Renderer lifecycle tracking.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::descriptor::{LayerId, SourceId};
use crate::renderer::EngineKind;

/// Where a mounted renderer is in its life.
///
/// Transitions only move forward: a renderer that reaches `Error` stays
/// there until the whole engine is swapped out. `Uninitialized` exists only
/// between construction and mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RendererLifecycle {
    /// Constructed, not yet mounted.
    Uninitialized,
    /// Mounted; the base style is still loading. Mutations are buffered.
    StyleLoading,
    /// Base style loaded; mutations apply immediately.
    Ready,
    /// A fatal mutation or source failure occurred. Terminal.
    Error,
}

impl RendererLifecycle {
    /// Whether moving to `next` is a legal forward transition.
    pub fn can_transition_to(self, next: RendererLifecycle) -> bool {
        use RendererLifecycle::*;
        matches!(
            (self, next),
            (Uninitialized, StyleLoading) | (StyleLoading, Ready) | (StyleLoading, Error) | (Ready, Error)
        )
    }

    /// Whether this state accepts no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, RendererLifecycle::Error)
    }

    /// Lowercase name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            RendererLifecycle::Uninitialized => "uninitialized",
            RendererLifecycle::StyleLoading => "style-loading",
            RendererLifecycle::Ready => "ready",
            RendererLifecycle::Error => "error",
        }
    }
}

impl fmt::Display for RendererLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of what the reconciler has applied to its renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererState {
    /// Engine behind the mounted renderer.
    pub engine: EngineKind,
    /// Current lifecycle state.
    pub lifecycle: RendererLifecycle,
    /// Human-readable failure description, set once lifecycle is `Error`.
    pub error_message: Option<String>,
    /// Ids of sources currently live in the renderer.
    pub active_source_ids: BTreeSet<SourceId>,
    /// Ids of layers currently live in the renderer, in paint order.
    pub active_layer_ids: Vec<LayerId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use RendererLifecycle::*;

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(Uninitialized.can_transition_to(StyleLoading));
        assert!(StyleLoading.can_transition_to(Ready));
        assert!(StyleLoading.can_transition_to(Error));
        assert!(Ready.can_transition_to(Error));
    }

    #[test]
    fn test_backward_and_self_transitions_refused() {
        assert!(!Ready.can_transition_to(StyleLoading));
        assert!(!Ready.can_transition_to(Uninitialized));
        assert!(!StyleLoading.can_transition_to(StyleLoading));
        assert!(!Uninitialized.can_transition_to(Ready));
    }

    #[test]
    fn test_error_is_terminal() {
        assert!(Error.is_terminal());
        assert!(!Error.can_transition_to(Ready));
        assert!(!Error.can_transition_to(StyleLoading));
        assert!(!Ready.is_terminal());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(StyleLoading.to_string(), "style-loading");
        assert_eq!(Ready.to_string(), "ready");
    }
}

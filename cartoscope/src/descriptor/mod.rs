//! Declarative layer and source descriptors.
//!
//! This module is the serializable vocabulary the rest of the system speaks:
//! a [`DescriptorSet`] describes every source and layer the map should show,
//! independent of any concrete rendering engine. The reconciliation engine
//! consumes descriptor sets and mutates a live renderer to match; nothing in
//! this module performs I/O.
//!
//! # Identity
//!
//! A [`LayerId`] uniquely determines a layer's identity across reconciliation
//! passes: two descriptors with the same id describe the same layer at
//! different points in time, never two layers.

mod layer;
mod set;
mod source;

pub use layer::{derive_opacity, LayerDescriptor, LayerId, LayerKind, StyleRule};
pub use set::{DescriptorError, DescriptorSet};
pub use source::{SourceData, SourceDescriptor, SourceId};

//! The layer catalog: store state in, descriptor set out.
//!
//! [`derive_descriptors`] is a pure function from a [`StoreSnapshot`] (plus
//! the latest building scan) to the [`DescriptorSet`] the reconciler should
//! materialize. All layer styling lives here; nothing else in the crate
//! knows a hospital marker is red.
//!
//! [`StoreSnapshot`]: crate::store::StoreSnapshot
//! [`DescriptorSet`]: crate::descriptor::DescriptorSet

mod config;
mod derive;

pub use config::CatalogConfig;
pub use derive::{derive_descriptors, ids};

//! Manifest parsing, resource identity, normalization, and collections for manidiff.
//!
//! This crate defines the schema layer: splitting multi-document YAML into
//! resources (`parse_manifests`), identity keys (`ResourceKey`), ordered
//! deduplicated collections (`ManifestCollection`), field paths used by
//! normalization and suppression (`FieldPath`), and the cluster-scoped kind
//! table that decides which resources receive a default namespace.

pub mod collection;
pub mod identity;
pub mod manifest;
pub mod normalize;
pub mod path;
pub mod resource;
pub mod scope;
pub mod types;

pub use collection::ManifestCollection;
pub use identity::ResourceKey;
pub use manifest::{parse_manifests, ManifestError, ParseOptions};
pub use normalize::normalize_body;
pub use path::{FieldPath, PathError, Segment};
pub use resource::{
    canonical_yaml, Resource, HOOK_ANNOTATION, TEST_HOOK, TEST_SUCCESS_HOOK,
};
pub use scope::{ClusterScope, BUILTIN_CLUSTER_SCOPED_KINDS};
pub use types::{ApiVersion, Kind, Namespace, ResourceName};

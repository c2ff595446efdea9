use crate::types::{ApiVersion, Kind, Namespace, ResourceName};
use serde::Serialize;
use std::fmt;

/// Identity of a resource within one manifest collection.
///
/// Field order drives the derived ordering: namespace, name, kind, then
/// apiVersion. Cluster-scoped keys (no namespace) sort first. The ordering
/// is total, so sorting by it is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ResourceKey {
    pub namespace: Option<Namespace>,
    pub name: ResourceName,
    pub kind: Kind,
    pub api_version: ApiVersion,
}

impl ResourceKey {
    pub fn new(
        api_version: impl Into<ApiVersion>,
        kind: impl Into<Kind>,
        namespace: Option<Namespace>,
        name: impl Into<ResourceName>,
    ) -> Self {
        Self {
            namespace,
            name: name.into(),
            kind: kind.into(),
            api_version: api_version.into(),
        }
    }

    /// Same resource type and name, ignoring the namespace.
    pub fn same_object_as(&self, other: &ResourceKey) -> bool {
        self.api_version == other.api_version && self.kind == other.kind && self.name == other.name
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.namespace {
            write!(f, "{ns}, ")?;
        }
        write!(f, "{}, {} ({})", self.name, self.kind, self.api_version)
    }
}

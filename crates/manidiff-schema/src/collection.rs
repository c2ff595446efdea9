use crate::identity::ResourceKey;
use crate::resource::Resource;
use indexmap::IndexMap;

/// Resources parsed from one input blob, keyed by identity in first-seen order.
///
/// Keys are unique. Inserting a colliding key replaces the earlier resource
/// in place (latest document wins, slot of the first occurrence is kept).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestCollection {
    resources: IndexMap<ResourceKey, Resource>,
}

impl ManifestCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource, returning the one it superseded.
    pub(crate) fn insert(&mut self, resource: Resource) -> Option<Resource> {
        self.resources.insert(resource.key.clone(), resource)
    }

    pub fn get(&self, key: &ResourceKey) -> Option<&Resource> {
        self.resources.get(key)
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.resources.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ResourceKey> {
        self.resources.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl FromIterator<Resource> for ManifestCollection {
    fn from_iter<T: IntoIterator<Item = Resource>>(iter: T) -> Self {
        let mut collection = Self::new();
        for resource in iter {
            collection.insert(resource);
        }
        collection
    }
}

impl<'a> IntoIterator for &'a ManifestCollection {
    type Item = &'a Resource;
    type IntoIter = indexmap::map::Values<'a, ResourceKey, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.values()
    }
}

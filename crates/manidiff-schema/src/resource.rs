use crate::identity::ResourceKey;
use serde_yaml::Value;

/// Annotation marking a resource as a lifecycle hook.
pub const HOOK_ANNOTATION: &str = "helm.sh/hook";
/// Hook phase of test pods.
pub const TEST_HOOK: &str = "test";
/// Legacy hook phase of test pods.
pub const TEST_SUCCESS_HOOK: &str = "test-success";

/// One parsed manifest document.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub key: ResourceKey,
    /// The document as written, in source order.
    pub body: Value,
    /// Raw value of the hook annotation, if any.
    pub hook: Option<String>,
    /// The namespace in `key` came from the default rather than the document.
    pub namespace_defaulted: bool,
    /// Template path from a leading `# Source:` comment.
    pub source: Option<String>,
}

impl Resource {
    /// Hook phases from the comma-separated annotation value.
    pub fn hook_phases(&self) -> impl Iterator<Item = &str> {
        self.hook
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|phase| !phase.is_empty())
    }

    pub fn is_hook(&self) -> bool {
        self.hook_phases().next().is_some()
    }

    pub fn canonical_yaml(&self) -> Result<String, serde_yaml::Error> {
        canonical_yaml(&self.body)
    }
}

/// Serialize a manifest tree to the line-oriented form used for comparison.
pub fn canonical_yaml(body: &Value) -> Result<String, serde_yaml::Error> {
    if body.is_null() {
        return Ok(String::new());
    }
    serde_yaml::to_string(body)
}

pub(crate) fn hook_annotation(body: &Value) -> Option<String> {
    body.get("metadata")
        .and_then(|m| m.get("annotations"))
        .and_then(|a| a.get(HOOK_ANNOTATION))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

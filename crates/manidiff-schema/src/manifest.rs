use crate::collection::ManifestCollection;
use crate::identity::ResourceKey;
use crate::normalize::normalize_body;
use crate::path::FieldPath;
use crate::resource::{hook_annotation, Resource, TEST_HOOK, TEST_SUCCESS_HOOK};
use crate::scope::ClusterScope;
use crate::types::Namespace;
use serde_yaml::Value;
use std::borrow::Cow;
use std::collections::BTreeSet;
use thiserror::Error;

const EXCERPT_LINES: usize = 3;
const EXCERPT_CHARS: usize = 120;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to parse manifest document #{index}: {source} (near: {excerpt})")]
    Parse {
        index: usize,
        excerpt: String,
        source: serde_yaml::Error,
    },
    #[error("failed to parse manifest document #{index}: not a mapping (near: {excerpt})")]
    NotAMapping { index: usize, excerpt: String },
    #[error("failed to parse manifest document #{index}: missing {field} (near: {excerpt})")]
    MissingField {
        index: usize,
        field: &'static str,
        excerpt: String,
    },
    #[error("failed to parse manifest document #{index}: {field} must be a scalar (near: {excerpt})")]
    InvalidField {
        index: usize,
        field: &'static str,
        excerpt: String,
    },
}

impl ManifestError {
    /// Zero-based position of the offending document among the non-blank
    /// documents of the input, so a leading `---` does not shift it.
    pub fn document_index(&self) -> usize {
        match self {
            Self::Parse { index, .. }
            | Self::NotAMapping { index, .. }
            | Self::MissingField { index, .. }
            | Self::InvalidField { index, .. } => *index,
        }
    }
}

/// Parser configuration, passed explicitly to every parse call.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Namespace given to namespaced resources that do not declare one.
    pub default_namespace: String,
    /// Run the canonicalization pass on every resource body.
    pub normalize: bool,
    /// Fields removed by the canonicalization pass.
    pub normalize_fields: Vec<FieldPath>,
    /// Resources carrying any of these hook phases are dropped.
    pub excluded_hooks: BTreeSet<String>,
    pub cluster_scope: ClusterScope,
    /// Convert CRLF line endings to LF before splitting.
    pub strip_trailing_cr: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            default_namespace: "default".to_owned(),
            normalize: false,
            normalize_fields: Vec::new(),
            excluded_hooks: [TEST_HOOK, TEST_SUCCESS_HOOK]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            cluster_scope: ClusterScope::default(),
            strip_trailing_cr: false,
        }
    }
}

impl ParseOptions {
    #[must_use]
    pub fn with_default_namespace(mut self, namespace: &str) -> Self {
        namespace.clone_into(&mut self.default_namespace);
        self
    }

    /// Keep test hooks (and every other hook) in the collection.
    #[must_use]
    pub fn including_hooks(mut self) -> Self {
        self.excluded_hooks.clear();
        self
    }

    #[must_use]
    pub fn normalized(mut self, fields: Vec<FieldPath>) -> Self {
        self.normalize = true;
        self.normalize_fields = fields;
        self
    }
}

/// Parse a multi-document manifest blob into a collection keyed by identity.
pub fn parse_manifests(
    input: &str,
    options: &ParseOptions,
) -> Result<ManifestCollection, ManifestError> {
    let text: Cow<'_, str> = if options.strip_trailing_cr {
        Cow::Owned(input.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(input)
    };

    let mut collection = ManifestCollection::new();
    let documents = split_documents(&text).into_iter().filter(|doc| !is_blank(doc));
    for (index, doc) in documents.enumerate() {
        let value: Value = serde_yaml::from_str(doc).map_err(|source| ManifestError::Parse {
            index,
            excerpt: excerpt(doc),
            source,
        })?;
        if value.is_null() {
            continue;
        }
        let source = source_comment(doc);
        for item in expand_list(value) {
            let ctx = DocContext { index, text: doc };
            if let Some(resource) = build_resource(item, &ctx, source.as_deref(), options)? {
                collection.insert(resource);
            }
        }
    }
    Ok(collection)
}

struct DocContext<'a> {
    index: usize,
    text: &'a str,
}

fn build_resource(
    mut body: Value,
    ctx: &DocContext<'_>,
    source: Option<&str>,
    options: &ParseOptions,
) -> Result<Option<Resource>, ManifestError> {
    if !body.is_mapping() {
        return Err(ManifestError::NotAMapping {
            index: ctx.index,
            excerpt: excerpt(ctx.text),
        });
    }

    let field = |path: &[&str], label: &'static str| identity_field(&body, path, label, ctx);
    let missing = |field: &'static str| ManifestError::MissingField {
        index: ctx.index,
        field,
        excerpt: excerpt(ctx.text),
    };
    let kind = field(&["kind"], "kind")?.ok_or_else(|| missing("kind"))?;
    let api_version = field(&["apiVersion"], "apiVersion")?.ok_or_else(|| missing("apiVersion"))?;
    let name = field(&["metadata", "name"], "metadata.name")?
        .ok_or_else(|| missing("metadata.name"))?;

    let (namespace, namespace_defaulted) = match field(&["metadata", "namespace"], "metadata.namespace")? {
        Some(ns) => (Some(Namespace::from(ns)), false),
        None if options.cluster_scope.is_cluster_scoped(&kind) => (None, false),
        None if options.default_namespace.is_empty() => (None, false),
        None => (Some(Namespace::from(options.default_namespace.as_str())), true),
    };
    let key = ResourceKey::new(api_version, kind, namespace, name);

    let hook = hook_annotation(&body);
    let resource_hooks = hook.as_deref().unwrap_or_default();
    if resource_hooks
        .split(',')
        .map(str::trim)
        .any(|phase| options.excluded_hooks.contains(phase))
    {
        return Ok(None);
    }

    if options.normalize {
        normalize_body(&mut body, &options.normalize_fields);
    }

    Ok(Some(Resource {
        key,
        body,
        hook,
        namespace_defaulted,
        source: source.map(str::to_owned),
    }))
}

/// Identity fields are read as text: numbers and booleans keep their YAML
/// spelling, null and the empty string count as absent.
fn identity_field(
    body: &Value,
    path: &[&str],
    label: &'static str,
    ctx: &DocContext<'_>,
) -> Result<Option<String>, ManifestError> {
    let Some(mut found) = path.iter().try_fold(body, |v, key| v.get(*key)) else {
        return Ok(None);
    };
    while let Value::Tagged(tagged) = found {
        found = &tagged.value;
    }
    let text = match found {
        Value::Null => return Ok(None),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => {
            return Err(ManifestError::InvalidField {
                index: ctx.index,
                field: label,
                excerpt: excerpt(ctx.text),
            })
        }
    };
    Ok(Some(text).filter(|s| !s.is_empty()))
}

/// Split on `---` marker lines. A marker may carry a trailing comment.
fn split_documents(text: &str) -> Vec<&str> {
    let mut docs = Vec::new();
    let mut start = 0;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if is_separator(line) {
            docs.push(&text[start..offset]);
            start = offset + line.len();
        }
        offset += line.len();
    }
    docs.push(&text[start..]);
    docs
}

fn is_separator(line: &str) -> bool {
    let line = line.trim_end();
    match line.strip_prefix("---") {
        Some(rest) => {
            rest.is_empty() || (rest.starts_with(' ') && rest.trim_start().starts_with('#'))
        }
        None => false,
    }
}

fn is_blank(doc: &str) -> bool {
    doc.lines().map(str::trim).all(|l| l.is_empty() || l.starts_with('#'))
}

fn source_comment(doc: &str) -> Option<String> {
    doc.lines()
        .map(str::trim)
        .take_while(|l| l.is_empty() || l.starts_with('#'))
        .find_map(|l| l.strip_prefix("# Source:"))
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

/// `*List` documents carrying an `items` sequence stand for their items.
fn expand_list(mut value: Value) -> Vec<Value> {
    let is_list = value
        .get("kind")
        .and_then(Value::as_str)
        .is_some_and(|k| k.ends_with("List"))
        && value.get("items").is_some_and(Value::is_sequence);
    if is_list {
        if let Some(Value::Sequence(items)) = value.get_mut("items").map(std::mem::take) {
            return items;
        }
    }
    vec![value]
}

fn excerpt(doc: &str) -> String {
    let joined = doc
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .take(EXCERPT_LINES)
        .collect::<Vec<_>>()
        .join(" | ");
    if joined.chars().count() > EXCERPT_CHARS {
        let cut: String = joined.chars().take(EXCERPT_CHARS).collect();
        format!("{cut}...")
    } else {
        joined
    }
}

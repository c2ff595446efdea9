//! Per-resource comparison of two manifest collections.
//!
//! Every identity key from either side yields one `ResourceDiff`. Both
//! versions are suppressed, then redacted (or decoded), then serialized to
//! canonical YAML; identical text means `Unchanged`, anything else gets an
//! LCS line diff cut into hunks by the configured context window.

use crate::options::{ContextWindow, DiffOptions};
use crate::redact::{decode_secrets, is_secret, redact_secrets};
use crate::suppress::apply_suppression;
use crate::CoreError;
use manidiff_schema::{canonical_yaml, ManifestCollection, Resource, ResourceKey};
use serde::Serialize;
use serde_yaml::Value;
use similar::{Algorithm, ChangeTag, DiffOp, TextDiff};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Change {
    Added,
    Removed,
    Modified,
    Unchanged,
}

impl Change {
    /// Whether this classification counts toward `any_change_observed`.
    pub fn is_change(self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
            Self::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTag {
    Context,
    Added,
    Removed,
}

/// One line of a hunk, without its trailing newline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub tag: LineTag,
    pub text: String,
}

/// A run of changed lines with surrounding context.
///
/// Starts are 1-based line numbers; a side with zero lines reports start 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hunk {
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<DiffLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceDiff {
    pub key: ResourceKey,
    /// Key of the other side when a defaulted namespace was paired with an
    /// explicit one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paired_key: Option<ResourceKey>,
    pub change: Change,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub hunks: Vec<Hunk>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    pub unchanged: usize,
}

/// Outcome of one diff call, ordered by identity key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffReport {
    pub entries: Vec<ResourceDiff>,
    pub any_change_observed: bool,
}

impl DiffReport {
    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary::default();
        for entry in &self.entries {
            match entry.change {
                Change::Added => summary.added += 1,
                Change::Removed => summary.removed += 1,
                Change::Modified => summary.modified += 1,
                Change::Unchanged => summary.unchanged += 1,
            }
        }
        summary
    }

    /// Entries that were added, removed or modified.
    pub fn changes(&self) -> impl Iterator<Item = &ResourceDiff> {
        self.entries.iter().filter(|e| e.change.is_change())
    }
}

/// Compare two collections. Neither input is modified.
pub fn diff_manifests(
    before: &ManifestCollection,
    after: &ManifestCollection,
    options: &DiffOptions,
) -> Result<DiffReport, CoreError> {
    let keys: BTreeSet<&ResourceKey> = before.keys().chain(after.keys()).collect();
    let pairs = pair_defaulted_namespaces(before, after, &keys);
    let mut entries = Vec::with_capacity(keys.len());
    let mut paired: BTreeSet<&ResourceKey> = BTreeSet::new();

    for (old_key, new_key) in pairs {
        let (Some(old), Some(new)) = (before.get(old_key), after.get(new_key)) else {
            return Err(CoreError::Internal(format!(
                "paired keys '{old_key}' and '{new_key}' vanished from their collections"
            )));
        };
        let (key, other) = if old.namespace_defaulted {
            (new_key, old_key)
        } else {
            (old_key, new_key)
        };
        debug!(key = %key, paired = %other, "paired defaulted namespace");
        entries.push(diff_resource(key, Some(other), Some(old), Some(new), options)?);
        paired.insert(old_key);
        paired.insert(new_key);
    }

    for key in keys.iter().copied().filter(|k| !paired.contains(k)) {
        let old = before.get(key);
        let new = after.get(key);
        if old.is_none() && new.is_none() {
            return Err(CoreError::Internal(format!(
                "key '{key}' is in neither collection"
            )));
        }
        entries.push(diff_resource(key, None, old, new, options)?);
    }

    entries.sort_by(|a, b| a.key.cmp(&b.key));
    let any_change_observed = entries.iter().any(|e| e.change.is_change());
    debug!(
        resources = entries.len(),
        any_change_observed, "diff complete"
    );
    Ok(DiffReport {
        entries,
        any_change_observed,
    })
}

/// Match keys present on one side only that name the same object, where
/// exactly one side took the default namespace. Greedy in key order.
fn pair_defaulted_namespaces<'a>(
    before: &'a ManifestCollection,
    after: &'a ManifestCollection,
    keys: &BTreeSet<&'a ResourceKey>,
) -> Vec<(&'a ResourceKey, &'a ResourceKey)> {
    let mut only_after: Vec<&ResourceKey> = keys
        .iter()
        .copied()
        .filter(|k| !before.contains(k))
        .collect();
    let mut pairs = Vec::new();

    for old_key in keys.iter().copied().filter(|k| !after.contains(k)) {
        let Some(old) = before.get(old_key) else {
            continue;
        };
        let found = only_after.iter().position(|new_key| {
            old_key.same_object_as(new_key)
                && after
                    .get(new_key)
                    .is_some_and(|new| new.namespace_defaulted != old.namespace_defaulted)
        });
        if let Some(index) = found {
            pairs.push((old_key, only_after.remove(index)));
        }
    }
    pairs
}

fn diff_resource(
    key: &ResourceKey,
    paired_key: Option<&ResourceKey>,
    before: Option<&Resource>,
    after: Option<&Resource>,
    options: &DiffOptions,
) -> Result<ResourceDiff, CoreError> {
    let kind = key.kind.as_str();
    let mut old = before.map(|r| r.body.clone());
    let mut new = after.map(|r| r.body.clone());

    apply_suppression(options, kind, &mut old);
    apply_suppression(options, kind, &mut new);

    if is_secret(kind) {
        if options.redact_secrets {
            redact_secrets(old.as_mut(), new.as_mut());
        } else {
            old.iter_mut().chain(new.iter_mut()).for_each(decode_secrets);
        }
    }

    let old_text = serialize(old.as_ref())?;
    let new_text = serialize(new.as_ref())?;
    let source = after.or(before).and_then(|r| r.source.clone());

    let (change, hunks) = if old_text == new_text {
        (Change::Unchanged, Vec::new())
    } else {
        let change = match (before, after) {
            (None, Some(_)) => Change::Added,
            (Some(_), None) => Change::Removed,
            _ => Change::Modified,
        };
        (change, line_hunks(&old_text, &new_text, options.context))
    };
    trace!(key = %key, %change, hunks = hunks.len(), "compared resource");

    Ok(ResourceDiff {
        key: key.clone(),
        paired_key: paired_key.cloned(),
        change,
        source,
        hunks,
    })
}

fn serialize(body: Option<&Value>) -> Result<String, CoreError> {
    Ok(body.map(canonical_yaml).transpose()?.unwrap_or_default())
}

fn line_hunks(old: &str, new: &str, context: ContextWindow) -> Vec<Hunk> {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Lcs)
        .diff_lines(old, new);
    let groups = match context {
        ContextWindow::Lines(n) => diff.grouped_ops(n),
        ContextWindow::Unlimited => vec![diff.ops().to_vec()],
    };

    let mut hunks = Vec::with_capacity(groups.len());
    for group in &groups {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let lines = group
            .iter()
            .flat_map(|op| diff.iter_changes(op))
            .map(|change| {
                let tag = match change.tag() {
                    ChangeTag::Equal => LineTag::Context,
                    ChangeTag::Insert => LineTag::Added,
                    ChangeTag::Delete => LineTag::Removed,
                };
                let value = change.value();
                DiffLine {
                    tag,
                    text: value.strip_suffix('\n').unwrap_or(value).to_owned(),
                }
            })
            .collect();
        let (old_start, old_len) = span(first, last, DiffOp::old_range);
        let (new_start, new_len) = span(first, last, DiffOp::new_range);
        hunks.push(Hunk {
            old_start,
            old_len,
            new_start,
            new_len,
            lines,
        });
    }
    hunks
}

fn span(
    first: &DiffOp,
    last: &DiffOp,
    range: impl Fn(&DiffOp) -> std::ops::Range<usize>,
) -> (usize, usize) {
    let start = range(first).start;
    let len = range(last).end - start;
    if len == 0 {
        (0, 0)
    } else {
        (start + 1, len)
    }
}

use crate::options::{DiffOptions, SuppressRule};
use serde_yaml::Value;
use tracing::trace;

/// Apply every suppression rule to one side of a comparison.
///
/// A matching kind rule blanks the whole document to `None`; path rules
/// remove their field when it exists and are otherwise no-ops.
pub fn apply_suppression(options: &DiffOptions, kind: &str, body: &mut Option<Value>) {
    if options.suppresses_kind(kind) {
        if body.take().is_some() {
            trace!(kind, "suppressed document");
        }
        return;
    }
    let Some(value) = body.as_mut() else {
        return;
    };
    for rule in &options.suppress {
        if let SuppressRule::Path(path) = rule {
            if path.remove_from(value) {
                trace!(kind, path = %path, "suppressed field");
            }
        }
    }
}

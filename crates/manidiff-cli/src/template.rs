use manidiff_core::{CoreError, DiffReport, ReportTemplate};
use std::error::Error as _;
use std::path::Path;
use tera::{Context, Tera};

/// Env var naming a Tera template file for `--output template`.
pub const TEMPLATE_ENV: &str = "MANIDIFF_TPL";

const BUILTIN: &str = include_str!("../templates/default.json.tera");

/// A report template rendered with Tera.
///
/// The template sees `report` (the whole report), `changes` (changed
/// entries only), `summary` and `any_change`.
#[derive(Debug, Clone)]
pub struct TeraTemplate {
    source: String,
}

impl TeraTemplate {
    /// JSON list of changed resources.
    pub fn builtin() -> Self {
        Self {
            source: BUILTIN.to_owned(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            format!("config error: failed to read template {}: {e}", path.display())
        })?;
        Ok(Self { source })
    }

    /// The file named by `MANIDIFF_TPL`, or the built-in template.
    pub fn resolve() -> Result<Self, String> {
        match std::env::var_os(TEMPLATE_ENV) {
            Some(path) if !path.is_empty() => Self::from_file(Path::new(&path)),
            _ => Ok(Self::builtin()),
        }
    }
}

impl ReportTemplate for TeraTemplate {
    fn render(&self, report: &DiffReport) -> Result<String, CoreError> {
        let changes: Vec<_> = report.changes().collect();
        let mut context = Context::new();
        context.insert("report", report);
        context.insert("changes", &changes);
        context.insert("summary", &report.summary());
        context.insert("any_change", &report.any_change_observed);
        Tera::one_off(&self.source, &context, false).map_err(|e| CoreError::Template(describe(&e)))
    }
}

/// Tera's top-level message rarely says what went wrong; append the causes.
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }
    message
}

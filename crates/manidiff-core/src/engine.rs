use crate::diff::{diff_manifests, DiffReport};
use crate::options::DiffOptions;
use crate::render::Renderer;
use crate::CoreError;
use manidiff_schema::{parse_manifests, ManifestCollection, ParseOptions};
use std::io::Write;
use std::thread;
use tracing::debug;

/// Parse, diff and render two manifest blobs with one set of options.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    pub parse: ParseOptions,
    pub diff: DiffOptions,
}

impl Engine {
    pub fn new(parse: ParseOptions, diff: DiffOptions) -> Self {
        Self { parse, diff }
    }

    /// Parse both inputs on scoped threads. A failure in `before` is
    /// reported ahead of one in `after`.
    pub fn parse_pair(
        &self,
        before: &str,
        after: &str,
    ) -> Result<(ManifestCollection, ManifestCollection), CoreError> {
        let (old, new) = thread::scope(|s| {
            let worker = s.spawn(|| parse_manifests(before, &self.parse));
            let new = parse_manifests(after, &self.parse);
            (worker.join(), new)
        });
        let old = old.map_err(|_| CoreError::Internal("manifest parser thread panicked".into()))?;
        let old = old?;
        let new = new?;
        debug!(before = old.len(), after = new.len(), "parsed manifests");
        Ok((old, new))
    }

    pub fn compare(&self, before: &str, after: &str) -> Result<DiffReport, CoreError> {
        let (old, new) = self.parse_pair(before, after)?;
        diff_manifests(&old, &new, &self.diff)
    }

    /// Run the whole pipeline and write the rendered report to `out`.
    ///
    /// Nothing reaches `out` unless parsing, diffing and rendering all
    /// succeed. Returns whether any resource was added, removed or modified.
    pub fn run(
        &self,
        before: &str,
        after: &str,
        renderer: &Renderer,
        out: &mut dyn Write,
    ) -> Result<bool, CoreError> {
        let report = self.compare(before, after)?;
        let mut buf = Vec::new();
        renderer.render(&report, &mut buf)?;
        out.write_all(&buf)?;
        out.flush()?;
        debug!(bytes = buf.len(), "rendered report");
        Ok(report.any_change_observed)
    }
}

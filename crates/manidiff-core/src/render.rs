use crate::diff::{Change, DiffReport, LineTag, ResourceDiff};
use crate::CoreError;
use console::Style;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Diff,
    Simple,
    Template,
}

impl FromStr for OutputFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "diff" => Ok(Self::Diff),
            "simple" => Ok(Self::Simple),
            "template" => Ok(Self::Template),
            other => Err(CoreError::Config(format!(
                "unknown output format '{other}' (expected diff, simple or template)"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Diff => "diff",
            Self::Simple => "simple",
            Self::Template => "template",
        })
    }
}

/// Caller-supplied formatter for the `template` output.
pub trait ReportTemplate {
    fn render(&self, report: &DiffReport) -> Result<String, CoreError>;
}

/// Output strategy, chosen once before rendering.
pub enum Renderer {
    Diff { color: bool },
    Simple { color: bool },
    Template(Box<dyn ReportTemplate>),
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diff { color } => f.debug_struct("Diff").field("color", color).finish(),
            Self::Simple { color } => f.debug_struct("Simple").field("color", color).finish(),
            Self::Template(_) => f.write_str("Template(..)"),
        }
    }
}

impl Renderer {
    pub fn new(
        format: OutputFormat,
        template: Option<Box<dyn ReportTemplate>>,
        color: bool,
    ) -> Result<Self, CoreError> {
        match format {
            OutputFormat::Diff => Ok(Self::Diff { color }),
            OutputFormat::Simple => Ok(Self::Simple { color }),
            OutputFormat::Template => template.map(Self::Template).ok_or_else(|| {
                CoreError::Config("template output selected but no template was provided".into())
            }),
        }
    }

    /// Write `report` to `out`. The report itself is never modified.
    pub fn render(&self, report: &DiffReport, out: &mut dyn Write) -> Result<(), CoreError> {
        match self {
            Self::Diff { color } => render_diff(report, &Palette::new(*color), out),
            Self::Simple { color } => render_simple(report, &Palette::new(*color), out),
            Self::Template(template) => {
                let text = template.render(report)?;
                out.write_all(text.as_bytes())?;
                Ok(())
            }
        }
    }
}

struct Palette {
    header: Style,
    added: Style,
    removed: Style,
    changed: Style,
    plain: Style,
}

impl Palette {
    fn new(color: bool) -> Self {
        Self {
            header: Style::new().yellow().force_styling(color),
            added: Style::new().green().force_styling(color),
            removed: Style::new().red().force_styling(color),
            changed: Style::new().yellow().force_styling(color),
            plain: Style::new().force_styling(color),
        }
    }

    fn for_change(&self, change: Change) -> &Style {
        match change {
            Change::Added => &self.added,
            Change::Removed => &self.removed,
            Change::Modified => &self.changed,
            Change::Unchanged => &self.plain,
        }
    }
}

fn header(entry: &ResourceDiff) -> String {
    let verb = match entry.change {
        Change::Added => "has been added",
        Change::Removed => "has been removed",
        Change::Modified | Change::Unchanged => "has changed",
    };
    match &entry.paired_key {
        Some(other) => format!("{} {verb} (paired with {other}):", entry.key),
        None => format!("{} {verb}:", entry.key),
    }
}

fn render_diff(report: &DiffReport, palette: &Palette, out: &mut dyn Write) -> Result<(), CoreError> {
    for entry in report.changes() {
        writeln!(out, "{}", palette.header.apply_to(header(entry)))?;
        if let Some(source) = &entry.source {
            writeln!(out, "  # Source: {source}")?;
        }
        for (i, hunk) in entry.hunks.iter().enumerate() {
            if i > 0 {
                writeln!(out, "...")?;
            }
            for line in &hunk.lines {
                match line.tag {
                    LineTag::Added => {
                        writeln!(out, "{}", palette.added.apply_to(format!("+ {}", line.text)))?;
                    }
                    LineTag::Removed => {
                        writeln!(out, "{}", palette.removed.apply_to(format!("- {}", line.text)))?;
                    }
                    LineTag::Context => writeln!(out, "  {}", line.text)?,
                }
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn render_simple(report: &DiffReport, palette: &Palette, out: &mut dyn Write) -> Result<(), CoreError> {
    for entry in report.changes() {
        let verb = match entry.change {
            Change::Added => "to be added",
            Change::Removed => "to be removed",
            Change::Modified | Change::Unchanged => "to be changed",
        };
        let line = format!("{} {verb}.", entry.key);
        writeln!(out, "{}", palette.for_change(entry.change).apply_to(line))?;
    }
    let summary = report.summary();
    writeln!(
        out,
        "Plan: {} to add, {} to change, and {} to destroy.",
        summary.added, summary.modified, summary.removed
    )?;
    Ok(())
}

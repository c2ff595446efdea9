use crate::CoreError;
use manidiff_schema::FieldPath;
use std::fmt;
use std::str::FromStr;

/// Unchanged lines shown around each change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextWindow {
    Lines(usize),
    /// Show the whole document.
    #[default]
    Unlimited,
}

impl ContextWindow {
    /// Negative values mean unlimited, matching the `-C -1` CLI convention.
    pub fn from_signed(lines: i64) -> Self {
        usize::try_from(lines).map_or(Self::Unlimited, Self::Lines)
    }
}

impl FromStr for ContextWindow {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "unlimited" | "all" => Ok(Self::Unlimited),
            other => other
                .parse::<i64>()
                .map(Self::from_signed)
                .map_err(|_| CoreError::Config(format!("invalid context window '{other}'"))),
        }
    }
}

impl fmt::Display for ContextWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lines(n) => write!(f, "{n}"),
            Self::Unlimited => f.write_str("unlimited"),
        }
    }
}

/// One entry of the suppression list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressRule {
    /// Blank every resource of this kind.
    Kind(String),
    /// Remove this field from every resource.
    Path(FieldPath),
}

impl SuppressRule {
    /// Entries containing `.` or `[` (or starting with `.`) are field paths;
    /// anything else is a kind name.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(CoreError::Config("empty suppression entry".to_owned()));
        }
        if input.contains(['.', '[']) {
            Ok(Self::Path(FieldPath::parse(input)?))
        } else {
            Ok(Self::Kind(input.to_owned()))
        }
    }
}

impl FromStr for SuppressRule {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SuppressRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kind(kind) => f.write_str(kind),
            Self::Path(path) => write!(f, "{path}"),
        }
    }
}

/// Diff engine configuration, passed explicitly to every diff call.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Replace Secret values with markers. When off, Secret data is decoded
    /// so the plain values are shown.
    pub redact_secrets: bool,
    pub context: ContextWindow,
    pub suppress: Vec<SuppressRule>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            redact_secrets: true,
            context: ContextWindow::Unlimited,
            suppress: Vec::new(),
        }
    }
}

impl DiffOptions {
    pub fn suppresses_kind(&self, kind: &str) -> bool {
        self.suppress
            .iter()
            .any(|rule| matches!(rule, SuppressRule::Kind(k) if k == kind))
    }
}

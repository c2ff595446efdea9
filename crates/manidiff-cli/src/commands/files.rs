use super::{EXIT_CHANGES, EXIT_SUCCESS};
use crate::config::CliConfig;
use crate::template::TeraTemplate;
use clap::Args;
use manidiff_core::{
    ContextWindow, CoreError, DiffOptions, Engine, OutputFormat, Renderer, ReportTemplate, SuppressRule,
    SECRET_KIND,
};
use manidiff_schema::{ClusterScope, ParseOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Args)]
pub struct FilesArgs {
    /// Rendered manifests currently deployed (`-` for stdin).
    pub before: PathBuf,
    /// Rendered manifests about to be deployed (`-` for stdin).
    pub after: PathBuf,
    /// Leave Secret resources out of the comparison entirely.
    #[arg(short = 'q', long, default_value_t = false)]
    pub suppress_secrets: bool,
    /// Show decoded Secret values instead of redaction markers.
    #[arg(long, default_value_t = false)]
    pub show_secrets: bool,
    /// Exit with status 2 when any resource changed.
    #[arg(long, default_value_t = false)]
    pub detailed_exitcode: bool,
    /// Kind to ignore, or field path to strip before comparing (repeatable).
    #[arg(long, value_name = "KIND|PATH")]
    pub suppress: Vec<String>,
    /// Lines of context around changes; negative shows whole resources.
    #[arg(short = 'C', long, allow_negative_numbers = true)]
    pub context: Option<i64>,
    /// Keep test hook resources.
    #[arg(long, default_value_t = false)]
    pub include_tests: bool,
    /// Output format: diff, simple or template.
    #[arg(long)]
    pub output: Option<String>,
    /// Ignore carriage returns at line ends.
    #[arg(long, default_value_t = false)]
    pub strip_trailing_cr: bool,
    /// Drop server-populated fields and sort keys before comparing.
    #[arg(long, default_value_t = false)]
    pub normalize_manifests: bool,
    /// Namespace for namespaced resources that do not declare one.
    #[arg(long)]
    pub default_namespace: Option<String>,
}

pub fn run(args: &FilesArgs, config_path: Option<&Path>, color: bool) -> Result<u8, String> {
    let config = match config_path {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::load_default()?,
    };
    let engine = build_engine(args, &config)?;

    let format: OutputFormat = args
        .output
        .as_deref()
        .or(config.output.as_deref())
        .unwrap_or("diff")
        .parse()
        .map_err(|e: CoreError| e.to_string())?;
    let template = match format {
        OutputFormat::Template => {
            Some(Box::new(TeraTemplate::resolve()?) as Box<dyn ReportTemplate>)
        }
        OutputFormat::Diff | OutputFormat::Simple => None,
    };
    let renderer = Renderer::new(format, template, color).map_err(|e| e.to_string())?;

    if args.before.as_os_str() == "-" && args.after.as_os_str() == "-" {
        return Err("input error: only one side can be read from stdin".to_owned());
    }
    let before = read_input(&args.before)?;
    let after = read_input(&args.after)?;

    let mut stdout = std::io::stdout().lock();
    let changed = engine
        .run(&before, &after, &renderer, &mut stdout)
        .map_err(|e| e.to_string())?;
    debug!(changed, %format, "files compared");

    if changed && args.detailed_exitcode {
        Ok(EXIT_CHANGES)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Merge the config file with flags. Flags win; suppression lists add up.
fn build_engine(args: &FilesArgs, config: &CliConfig) -> Result<Engine, String> {
    let mut parse = ParseOptions::default();
    if let Some(ns) = args
        .default_namespace
        .as_deref()
        .or(config.default_namespace.as_deref())
    {
        parse = parse.with_default_namespace(ns);
    }
    if args.include_tests {
        parse = parse.including_hooks();
    }
    if args.normalize_manifests {
        parse = parse.normalized(config.normalize_fields()?);
    }
    parse.strip_trailing_cr = args.strip_trailing_cr;
    parse.cluster_scope = ClusterScope::builtin().with_extra(config.cluster_scoped_kinds.iter().cloned());

    let mut suppress = config
        .suppress
        .iter()
        .chain(&args.suppress)
        .map(String::as_str)
        .map(SuppressRule::parse)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;
    if args.suppress_secrets {
        suppress.push(SuppressRule::Kind(SECRET_KIND.to_owned()));
    }

    let context = args
        .context
        .or(config.context)
        .map_or(ContextWindow::Unlimited, ContextWindow::from_signed);

    debug!(
        default_namespace = %parse.default_namespace,
        normalize = parse.normalize,
        suppress = suppress.len(),
        %context,
        "files options resolved"
    );

    Ok(Engine::new(
        parse,
        DiffOptions {
            redact_secrets: !args.show_secrets,
            context,
            suppress,
        },
    ))
}

fn read_input(path: &Path) -> Result<String, String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| format!("input error: failed to read stdin: {e}"))?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .map_err(|e| format!("input error: failed to read {}: {e}", path.display()))
}

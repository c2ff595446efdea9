mod commands;
mod config;
mod template;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::files::FilesArgs;
use commands::{EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_INPUT_ERROR, EXIT_MANIFEST_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "manidiff",
    version,
    about = "Preview what a release upgrade changes in rendered Kubernetes manifests"
)]
struct Cli {
    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    /// Config file (default: ~/.config/manidiff/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Never colour the output.
    #[arg(long, default_value_t = false, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compare two files of rendered manifests.
    Files(FilesArgs),
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("MANIDIFF_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let color = !cli.no_color && console::colors_enabled();

    let result = match &cli.command {
        Commands::Files(args) => commands::files::run(args, cli.config.as_deref(), color),
        Commands::Completions { shell } => commands::completions::run::<Cli>(*shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(exit_code_for(&msg))
        }
    }
}

fn exit_code_for(msg: &str) -> u8 {
    if msg.starts_with("input error:") {
        EXIT_INPUT_ERROR
    } else if msg.starts_with("manifest error:") || msg.starts_with("failed to parse manifest") {
        EXIT_MANIFEST_ERROR
    } else if msg.starts_with("config error:") || msg.starts_with("template error:") {
        EXIT_CONFIG_ERROR
    } else {
        EXIT_FAILURE
    }
}

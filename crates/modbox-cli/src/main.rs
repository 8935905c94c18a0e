mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{
    Context, EXIT_DRIFT_REFUSED, EXIT_FAILURE, EXIT_PROFILE_ERROR, EXIT_RESOLUTION_ERROR,
};
use modbox_core::ModboxLayout;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

const DEFAULT_HOME: &str = "~/.config/modbox";

#[derive(Debug, Parser)]
#[command(
    name = "modbox",
    version,
    about = "Compose sandbox container images from reusable mods"
)]
struct Cli {
    /// modbox home directory (global profile, user mods). Defaults to $MODBOX_HOME or ~/.config/modbox.
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Project directory holding `.modbox/`.
    #[arg(long, default_value = ".", global = true)]
    project: PathBuf,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a new profile, optionally from a template.
    Init {
        /// Create the global (base image) profile instead of the project profile.
        #[arg(long, default_value_t = false)]
        global: bool,
        /// Template to start from (see `modbox templates`).
        #[arg(long)]
        template: Option<String>,
        /// Overwrite an existing profile.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Add mods to a profile.
    Add {
        /// Mod identifiers, e.g. `tools/mise`.
        #[arg(required = true)]
        mods: Vec<String>,
        #[arg(long, default_value_t = false)]
        global: bool,
    },
    /// Remove mods from a profile.
    Remove {
        #[arg(required = true)]
        mods: Vec<String>,
        #[arg(long, default_value_t = false)]
        global: bool,
    },
    /// List available mods by category.
    Mods,
    /// Resolve a profile and print the mods it installs, in order.
    Show {
        #[arg(long, default_value_t = false)]
        global: bool,
    },
    /// Write the Dockerfile for a profile and record the build.
    Generate {
        #[arg(long, default_value_t = false)]
        global: bool,
        /// Overwrite a Dockerfile that was edited by hand.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Report whether a profile or its Dockerfile drifted since the last generate.
    Status {
        #[arg(long, default_value_t = false)]
        global: bool,
    },
    /// List profile templates.
    Templates,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
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
            tracing_subscriber::EnvFilter::try_from_env("MODBOX_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let home = resolve_home(cli.home.as_deref());
    let project = absolute(&cli.project);
    debug!("home {}, project {}", home.display(), project.display());
    let ctx = Context::new(ModboxLayout::new(home, project), cli.json);

    let result = match cli.command {
        Commands::Init {
            global,
            template,
            force,
        } => commands::init::run(&ctx, global, template.as_deref(), force),
        Commands::Add { mods, global } => commands::add::run(&ctx, &mods, global),
        Commands::Remove { mods, global } => commands::remove::run(&ctx, &mods, global),
        Commands::Mods => commands::mods::run(&ctx),
        Commands::Show { global } => commands::show::run(&ctx, global),
        Commands::Generate { global, force } => commands::generate::run(&ctx, global, force),
        Commands::Status { global } => commands::status::run(&ctx, global),
        Commands::Templates => commands::templates::run(&ctx),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("profile error:") {
                EXIT_PROFILE_ERROR
            } else if msg.starts_with("resolution error:") {
                EXIT_RESOLUTION_ERROR
            } else if msg.starts_with("drift:") {
                EXIT_DRIFT_REFUSED
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

fn resolve_home(flag: Option<&Path>) -> PathBuf {
    if let Some(home) = flag {
        return expand_tilde(&home.to_string_lossy());
    }
    match std::env::var("MODBOX_HOME") {
        Ok(home) if !home.trim().is_empty() => expand_tilde(&home),
        _ => expand_tilde(DEFAULT_HOME),
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

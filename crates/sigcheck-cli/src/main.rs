use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sigcheck_cli::{collect_java_files, render_declarations, render_text, run_check};
use sigcheck_config::{
    init_tracing, load_for_workspace_with_diagnostics, ConfigDiagnostics, ConfigWarning, FailOn,
    LoggingConfig, SigcheckConfig,
};
use sigcheck_core::GenericMethodPolicy;

#[derive(Parser)]
#[command(
    name = "sigcheck",
    version,
    about = "Find conflicting method and constructor declarations in Java sources"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check files or directories for conflicting declarations
    Check(CheckArgs),
    /// Print the declarations extracted from a single file
    Declarations(DeclarationsArgs),
}

#[derive(Args)]
struct CheckArgs {
    /// Java files or directories to check
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
    /// Config file (defaults to discovery from the first path)
    #[arg(long)]
    config: Option<PathBuf>,
    /// How method type parameters take part in signature identity
    #[arg(long, value_enum)]
    generic_methods: Option<GenericMethodsArg>,
    /// Annotation name that never makes two declarations differ (repeatable)
    #[arg(long = "ignore-decoration", value_name = "NAME")]
    ignore_decorations: Vec<String>,
    /// Lowest severity that makes the check fail
    #[arg(long, value_enum)]
    fail_on: Option<FailOnArg>,
}

#[derive(Args)]
struct DeclarationsArgs {
    /// Java file to read
    file: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum GenericMethodsArg {
    Syntactic,
    Positional,
}

impl From<GenericMethodsArg> for GenericMethodPolicy {
    fn from(arg: GenericMethodsArg) -> Self {
        match arg {
            GenericMethodsArg::Syntactic => GenericMethodPolicy::Syntactic,
            GenericMethodsArg::Positional => GenericMethodPolicy::Positional,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FailOnArg {
    Error,
    Warning,
}

impl From<FailOnArg> for FailOn {
    fn from(arg: FailOnArg) -> Self {
        match arg {
            FailOnArg::Error => FailOn::Error,
            FailOnArg::Warning => FailOn::Warning,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Check(args) => check(args),
        Command::Declarations(args) => {
            init_tracing(&LoggingConfig::default());
            let source = std::fs::read_to_string(&args.file)
                .with_context(|| format!("failed to read {}", args.file.display()))?;
            let unit = sigcheck_java::extract_unit(&args.file, &source)?;
            if args.json {
                print_json(&unit.types)?;
            } else {
                let mut stdout = std::io::stdout().lock();
                render_declarations(&unit, &mut stdout)?;
                stdout.flush()?;
            }
            Ok(0)
        }
    }
}

fn check(args: CheckArgs) -> Result<i32> {
    let mut config = load_config(&args)?;
    if let Some(policy) = args.generic_methods {
        config.detection.generic_methods = policy.into();
    }
    config
        .detection
        .ignored_decorations
        .extend(args.ignore_decorations.iter().cloned());
    if let Some(fail_on) = args.fail_on {
        config.detection.fail_on = fail_on.into();
    }

    let filter = config.file_filter()?;
    let files = collect_java_files(&args.paths, &filter)?;
    let report = run_check(&files, &config.detection.detect_options())?;

    if args.json {
        print_json(&report)?;
    } else {
        let mut stdout = std::io::stdout().lock();
        render_text(&report, &mut stdout)?;
        stdout.flush()?;
    }
    Ok(report.exit_code(config.detection.fail_on))
}

fn load_config(args: &CheckArgs) -> Result<SigcheckConfig> {
    let (config, diagnostics) = match &args.config {
        Some(path) => {
            let (config, diagnostics) = SigcheckConfig::load_from_path_with_diagnostics(path)?;
            init_tracing(&config.logging);
            (config, diagnostics)
        }
        None => {
            let root = workspace_root(&args.paths);
            let (config, path, diagnostics) = load_for_workspace_with_diagnostics(&root)?;
            init_tracing(&config.logging);
            if let Some(path) = path {
                tracing::debug!(target: "sigcheck.cli", path = %path.display(), "using config");
            }
            (config, diagnostics)
        }
    };
    report_config_diagnostics(&diagnostics);
    Ok(config)
}

/// The directory config discovery starts from: the first path, or its parent for a file.
fn workspace_root(paths: &[PathBuf]) -> PathBuf {
    let Some(first) = paths.first() else {
        return PathBuf::from(".");
    };
    if first.is_dir() {
        return first.clone();
    }
    match first.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    }
}

fn report_config_diagnostics(diagnostics: &ConfigDiagnostics) {
    for key in &diagnostics.unknown_keys {
        eprintln!("warning: unknown config key `{key}`");
    }
    for warning in &diagnostics.warnings {
        match warning {
            ConfigWarning::LoggingLevelInvalid { value } => {
                eprintln!("warning: invalid logging.level {value:?}; using info")
            }
            ConfigWarning::IgnoredDecorationHasArguments { value } => eprintln!(
                "warning: ignored decoration {value:?} has arguments; only names are compared"
            ),
            other => eprintln!("warning: {other:?}"),
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, ValueEnum};
use readme_table::{
    build, BuildOutcome, Config, ConfigError, ExitCode, LoadOptions, PipelineError,
    TemplateVariant,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Render the first table of a README into a static HTML page",
    long_about = None
)]
struct Cli {
    /// Page layout wrapped around the table
    #[arg(short, long, value_enum, value_name = "VARIANT")]
    template: Option<TemplateArg>,

    /// Markdown file to read [default: README.md]
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// HTML file to write [default: index.html]
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Configuration file applied over discovered .readme-table.toml files
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Run as if started in DIR
    #[arg(short = 'C', long = "directory", value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Suppress the success message
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TemplateArg {
    /// Bare <html> wrapper
    Minimal,
    /// Navigation, version selector and search
    Full,
}

impl From<TemplateArg> for TemplateVariant {
    fn from(arg: TemplateArg) -> Self {
        match arg {
            TemplateArg::Minimal => TemplateVariant::Minimal,
            TemplateArg::Full => TemplateVariant::Full,
        }
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(&cli) {
        Ok(exit) | Err(exit) => exit.into(),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "readme_table=warn",
        1 => "readme_table=info",
        2 => "readme_table=debug",
        _ => "readme_table=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode, ExitCode> {
    let config = Config::load(load_options(cli)).map_err(|err| {
        report_config_error(&err);
        ExitCode::for_config_error(&err)
    })?;

    match build(&config) {
        Ok(outcome) => {
            report_outcome(cli, &config, &outcome);
            Ok(outcome.exit_code())
        }
        Err(err) => {
            report_pipeline_error(&err);
            Err(err.exit_code())
        }
    }
}

fn load_options(cli: &Cli) -> LoadOptions {
    let mut options = LoadOptions::default();
    if let Some(dir) = &cli.directory {
        options = options.with_working_dir(dir);
    }
    if let Some(path) = &cli.config {
        options = options.with_override_path(path);
    }
    if let Some(path) = &cli.input {
        options = options.with_input(path);
    }
    if let Some(path) = &cli.output {
        options = options.with_output(path);
    }
    if let Some(template) = cli.template {
        options = options.with_template(template.into());
    }
    options
}

fn report_outcome(cli: &Cli, config: &Config, outcome: &BuildOutcome) {
    match outcome {
        BuildOutcome::Written { path, shape, .. } => {
            if !cli.quiet {
                println!(
                    "Wrote {} ({}, {})",
                    display_path(path, &config.sources.working_directory),
                    count(shape.columns, "column"),
                    count(shape.body_rows, "row")
                );
            }
        }
        BuildOutcome::NoTable { input } => {
            eprintln!(
                "No table found in {}.",
                display_path(input, &config.sources.working_directory)
            );
        }
    }
}

fn report_config_error(err: &ConfigError) {
    eprintln!("Configuration error: {err}");
}

fn report_pipeline_error(err: &PipelineError) {
    match err {
        PipelineError::Parse { .. } => {
            eprintln!("{err}");
            eprintln!(
                "Inline HTML in the markdown must be well-formed XML (e.g. <br/> rather than <br>)."
            );
        }
        PipelineError::Read { .. } | PipelineError::Write { .. } => {
            eprintln!("I/O error: {err}");
        }
    }
}

fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::info;
use treedit_runtime::EditorConfig;

use crate::editor::Editor;
use crate::error::{CliError, Result};
use crate::logging::init_tracing;

#[derive(Debug, Parser)]
#[command(
    name = "treedit",
    about = "Edit an HTML-like element tree with undoable text commands",
    version
)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Execute a command script, one command per line.
    Run(RunArgs),

    /// Read commands interactively from stdin.
    Repl(ReplArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Script to execute.
    pub script: PathBuf,

    /// Document to start from (HTML, or JSON by extension).
    #[arg(long, value_name = "DOC")]
    pub input: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ReplArgs {
    /// Document to start from (HTML, or JSON by extension).
    #[arg(long, value_name = "DOC")]
    pub input: Option<PathBuf>,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Run(args) => run_script(&config, args),
        Commands::Repl(args) => run_repl(&config, args),
    }
}

/// Defaults when no path is given; otherwise the file, validated.
pub fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    let config = match path {
        Some(path) => EditorConfig::from_toml_file(path)?,
        None => EditorConfig::default(),
    };
    Ok(config.validated()?)
}

fn editor(config: &EditorConfig, input: Option<&Path>) -> Result<Editor> {
    let mut editor = Editor::from_config(config)?;
    if let Some(path) = input {
        editor.load(path)?;
    }
    Ok(editor)
}

fn run_script(config: &EditorConfig, args: RunArgs) -> Result<()> {
    let mut editor = editor(config, args.input.as_deref())?;
    let file = File::open(&args.script).map_err(|source| CliError::Script {
        path: args.script.clone(),
        source,
    })?;
    let stats = editor.run_script(
        BufReader::new(file),
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )?;
    info!(
        script = %args.script.display(),
        commands = stats.commands,
        rejected = stats.rejected,
        "script complete"
    );
    Ok(())
}

fn run_repl(config: &EditorConfig, args: ReplArgs) -> Result<()> {
    let mut editor = editor(config, args.input.as_deref())?;
    editor.run_repl(
        io::stdin().lock(),
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )?;
    Ok(())
}

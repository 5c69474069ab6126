use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use white_label_overlay::{
  OverlayBuilder, OverlayConfig, OverlayWatcher, ProcessEnv, Resolution, SlotId,
};

/// Stage white-label overrides and run the build-time transforms.
#[derive(Parser)]
#[command(name = "white_label_overlay")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Project root containing the application and its defaults
  #[arg(long, global = true, default_value = ".")]
  root: PathBuf,

  /// Configuration file (default: <root>/overlay.config.json)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Clear the staging area and copy every override into it
  Stage {
    /// Print the staging report as JSON
    #[arg(long)]
    json: bool,
  },

  /// Print the resolved HTML shell after script injection and comment stripping
  Html {
    /// Write the document here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// Run the file hooks on a single module and print the result
  Transform {
    /// Module to transform
    file: PathBuf,
  },

  /// Stage once, then re-stage overrides whenever their sources change
  Watch,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
    )
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let builder = load_builder(&cli.root, cli.config.as_deref())?;

  match cli.command {
    Commands::Stage { json } => cmd_stage(&builder, json),
    Commands::Html { output } => cmd_html(&builder, output.as_deref()),
    Commands::Transform { file } => cmd_transform(&builder, &file),
    Commands::Watch => cmd_watch(&builder),
  }
}

fn load_builder(root: &Path, config: Option<&Path>) -> Result<OverlayBuilder> {
  let root = root
    .canonicalize()
    .with_context(|| format!("project root not found at {}", root.display()))?;

  let config = match config {
    Some(path) => OverlayConfig::from_path(path)
      .ok_or_else(|| anyhow!("failed to load configuration from {}", path.display()))?,
    None => OverlayConfig::discover(&root),
  };

  let builder = OverlayBuilder::new(config, root);
  tracing::debug!(
    staging = %builder.config().staging_dir,
    entry = %builder.config().entry_path,
    "loaded overlay configuration"
  );
  Ok(builder)
}

fn cmd_stage(builder: &OverlayBuilder, json: bool) -> Result<()> {
  let staged = builder.stage(&ProcessEnv).context("failed to stage overrides")?;

  if json {
    println!("{}", staged.to_json()?);
    return Ok(());
  }

  for report in &staged.slots {
    match &report.resolved {
      Some(resolved) => println!(
        "{:<12} {} -> {}",
        report.slot.as_str(),
        resolved.source.display(),
        resolved.destination.display()
      ),
      None => println!("{:<12} (not overridden)", report.slot.as_str()),
    }
  }
  Ok(())
}

fn cmd_html(builder: &OverlayBuilder, output: Option<&Path>) -> Result<()> {
  let source = match builder.resolve_slot(SlotId::Html, &ProcessEnv)? {
    Resolution::Resolved(resolved) => resolved.source,
    Resolution::Absent => return Err(anyhow!("no HTML shell configured")),
  };

  let html = fs::read_to_string(&source)
    .with_context(|| format!("failed to read {}", source.display()))?;
  let document = builder.transforms().transform_document(&html)?;

  match output {
    Some(path) => {
      fs::write(path, document).with_context(|| format!("failed to write {}", path.display()))
    }
    None => {
      print!("{document}");
      Ok(())
    }
  }
}

fn cmd_transform(builder: &OverlayBuilder, file: &Path) -> Result<()> {
  let file = file
    .canonicalize()
    .with_context(|| format!("module not found at {}", file.display()))?;
  let code =
    fs::read_to_string(&file).with_context(|| format!("failed to read {}", file.display()))?;

  match builder.transforms().transform_file(&code, &file)? {
    Some(transformed) => print!("{transformed}"),
    None => {
      tracing::info!(path = %file.display(), "no hook claimed the module, passing through");
      print!("{code}");
    }
  }
  Ok(())
}

fn cmd_watch(builder: &OverlayBuilder) -> Result<()> {
  let staged = builder.stage(&ProcessEnv).context("failed to stage overrides")?;
  OverlayWatcher::new(&staged).run()?;
  Ok(())
}

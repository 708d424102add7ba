//! Command-line probe for the genogram engine.
//!
//! # Responsibility
//! - Verify `genogram_core` linkage (`probe`).
//! - Summarise, export and tidy genogram files without a host page.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use genogram_core::export::compute_content_bounds;
use genogram_core::{default_log_level, init_stderr_logging, Editor, EditorSettings};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "genogram", version, about = "Genogram engine probe")]
struct Cli {
    /// Log level written to stderr (trace|debug|info|warn|error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print core ping and version.
    Probe,
    /// Summarise a genogram file and optionally write its SVG.
    Inspect {
        file: PathBuf,
        /// Write the clean SVG export here.
        #[arg(long)]
        svg: Option<PathBuf>,
        #[arg(long)]
        transparent: bool,
    },
    /// Auto-arrange a genogram file and write the result.
    Arrange {
        file: PathBuf,
        /// Output path; defaults to rewriting the input.
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(level) = &cli.log_level {
        init_stderr_logging(level).map_err(anyhow::Error::msg)?;
    } else if std::env::var_os("GENOGRAM_LOG").is_some() {
        init_stderr_logging(default_log_level()).map_err(anyhow::Error::msg)?;
    }

    match cli.command.unwrap_or(Command::Probe) {
        Command::Probe => {
            println!("genogram_core ping={}", genogram_core::ping());
            println!("genogram_core version={}", genogram_core::core_version());
        }
        Command::Inspect {
            file,
            svg,
            transparent,
        } => inspect(&file, svg.as_deref(), transparent)?,
        Command::Arrange { file, out } => arrange(&file, out.as_deref().unwrap_or(&file))?,
    }
    Ok(())
}

fn open(file: &Path) -> Result<Editor> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read `{}`", file.display()))?;
    let mut editor = Editor::new(EditorSettings::default());
    let report = editor
        .load_file(&raw)
        .with_context(|| format!("failed to parse `{}`", file.display()))?;
    for note in report.coerced.iter().chain(&report.repaired) {
        eprintln!("note: {note}");
    }
    Ok(editor)
}

fn inspect(file: &Path, svg: Option<&Path>, transparent: bool) -> Result<()> {
    let editor = open(file)?;
    let store = editor.store();
    let active = store.people().iter().filter(|person| person.is_active()).count();
    let bounds = compute_content_bounds(&editor.snapshot(), editor.settings());

    println!("people={active} archived={}", store.people().len() - active);
    println!("relationships={}", store.relationships().len());
    println!("households={}", store.households().len());
    println!("text_boxes={}", store.text_boxes().len());
    println!(
        "bounds x={} y={} width={} height={}",
        bounds.x, bounds.y, bounds.width, bounds.height
    );

    if let Some(out) = svg {
        let export = editor.export_svg(transparent)?;
        std::fs::write(out, export.svg)
            .with_context(|| format!("failed to write `{}`", out.display()))?;
        println!("svg={} width={} height={}", out.display(), export.width, export.height);
    }
    Ok(())
}

fn arrange(file: &Path, out: &Path) -> Result<()> {
    let mut editor = open(file)?;
    let report = editor.auto_arrange()?;
    std::fs::write(out, editor.to_file()?)
        .with_context(|| format!("failed to write `{}`", out.display()))?;
    println!(
        "arranged={} generations={} out={}",
        report.arranged,
        report.generations,
        out.display()
    );
    Ok(())
}

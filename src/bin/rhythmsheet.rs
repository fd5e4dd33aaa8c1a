//! rhythmsheet - randomized rhythm worksheet generator
//!
//! Renders a worksheet for one difficulty tier and writes it as PNG, an
//! 800 px preview, and/or a one-page A4 PDF.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rhythmlib::{
    default_preview, export_to_file, save_png, GlyphSet, RepertoireTable, Renderer, Result,
    Settings,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "rhythmsheet")]
#[command(about = "Randomized rhythm worksheet generator")]
#[command(version)]
struct Cli {
    /// Difficulty tier (see --list-tiers)
    #[arg(short, long, default_value = "beginner")]
    difficulty: String,

    /// Number of measures to draw
    #[arg(short, long, default_value_t = 8, allow_negative_numbers = true)]
    measures: i64,

    /// Directory holding <id>.png glyph images
    #[arg(short, long, default_value = "pics")]
    glyphs: PathBuf,

    /// Seed for a reproducible worksheet
    #[arg(short, long)]
    seed: Option<u64>,

    /// Write the full-size worksheet PNG here
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Write an A4 PDF here
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Write an 800 px wide preview PNG here
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Settings JSON (layout, page, below_minimum)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tier table JSON replacing the built-in tiers
    #[arg(long)]
    tiers: Option<PathBuf>,

    /// Print the available tiers and exit
    #[arg(long)]
    list_tiers: bool,
}

fn load_table(cli: &Cli) -> Result<RepertoireTable> {
    match &cli.tiers {
        Some(path) => RepertoireTable::from_json(&std::fs::read_to_string(path)?),
        None => Ok(RepertoireTable::default()),
    }
}

fn run(cli: Cli) -> Result<()> {
    let table = load_table(&cli)?;

    if cli.list_tiers {
        for tier in table.tiers() {
            println!(
                "{:<14} {} glyphs, {} measures/row, {}..={} measures",
                tier.id,
                tier.glyphs.len(),
                tier.measures_per_row,
                tier.min_measures,
                tier.max_measures
            );
        }
        return Ok(());
    }

    let settings = match &cli.config {
        Some(path) => Settings::from_json_file(path)?,
        None => Settings::default(),
    };
    let glyphs = GlyphSet::from_dir(&cli.glyphs)?;
    let renderer = Renderer::with_settings(glyphs, table, settings);

    let sheet = match cli.seed {
        Some(seed) => renderer.render_seeded(&cli.difficulty, cli.measures, seed)?,
        None => renderer.render(&cli.difficulty, cli.measures)?,
    };

    // No outputs named: write the PDF to the working directory.
    let pdf = match (&cli.out, &cli.pdf, &cli.preview) {
        (None, None, None) => Some(PathBuf::from("sheet_music.pdf")),
        _ => cli.pdf.clone(),
    };

    if let Some(path) = &cli.out {
        save_png(&sheet, path)?;
        info!(path = %path.display(), "wrote worksheet png");
    }
    if let Some(path) = &cli.preview {
        save_png(&default_preview(&sheet)?, path)?;
        info!(path = %path.display(), "wrote preview png");
    }
    if let Some(path) = &pdf {
        export_to_file(&sheet, &renderer.settings().page, path)?;
        info!(path = %path.display(), "wrote worksheet pdf");
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(kind = ?e.kind(), "{e}");
            ExitCode::FAILURE
        }
    }
}

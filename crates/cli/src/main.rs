//! # sheetmap-cli
//!
//! Command-line interface for reading and converting spreadsheets.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use sheetmap_sheet::{
    export_grid, read_grid_from_path, ExportOptions, FileDownload, Grid, ReadOptions,
    SpreadsheetFormat, CONTENT_DISPOSITION,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// sheetmap - read .xls/.xlsx sheets as text grids
#[derive(Parser)]
#[command(name = "sheetmap")]
#[command(author, version, about = "Spreadsheet grid reader and converter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the first sheet of a workbook
    Read {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Row whose width bounds every row read
        #[arg(long = "header-row", default_value_t = 0)]
        header_row: usize,

        /// Output format (table, json)
        #[arg(short = 'o', long = "output", default_value = "table")]
        output: OutputFormat,
    },
    /// Re-export the first sheet of a workbook
    Convert {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Destination file
        #[arg(long = "out", value_name = "PATH")]
        out: PathBuf,

        #[arg(long = "header-row", default_value_t = 0)]
        header_row: usize,

        /// Target format; taken from the destination extension when omitted
        #[arg(long = "to")]
        to: Option<TargetFormat>,

        /// Download title; defaults to the destination file stem
        #[arg(long = "title")]
        title: Option<String>,
    },
}

/// Output format for grids.
#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    /// JSON array of rows
    Json,
    /// Aligned columns (default)
    #[default]
    Table,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, clap::ValueEnum)]
enum TargetFormat {
    Xls,
    Xlsx,
}

impl From<TargetFormat> for SpreadsheetFormat {
    fn from(target: TargetFormat) -> Self {
        SpreadsheetFormat::from_legacy_flag(target == TargetFormat::Xls)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    match cli.command {
        Command::Read {
            file,
            header_row,
            output,
        } => {
            let grid = load(&file, header_row)?;
            print_grid(&grid, output)
        }
        Command::Convert {
            file,
            out,
            header_row,
            to,
            title,
        } => {
            let grid = load(&file, header_row)?;
            let format = to.map_or_else(|| format_for_path(&out), SpreadsheetFormat::from);
            let title = title.unwrap_or_else(|| default_title(&out));
            convert(&grid, &out, &title, format)
        }
    }
}

fn load(file: &Path, header_row: usize) -> Result<Grid> {
    let options = ReadOptions::default().with_header_row(header_row);
    read_grid_from_path(file, &options)
        .with_context(|| format!("Failed to read workbook: {}", file.display()))
}

fn convert(grid: &Grid, out: &Path, title: &str, format: SpreadsheetFormat) -> Result<()> {
    let mut sink = FileDownload::create(out)
        .with_context(|| format!("Failed to create file: {}", out.display()))?;
    let options = ExportOptions::default().with_format(format);
    let bytes = export_grid(title, grid, &options, &mut sink)
        .with_context(|| format!("Failed to write workbook: {}", out.display()))?;

    tracing::info!(
        "{}: {}",
        CONTENT_DISPOSITION,
        sink.header(CONTENT_DISPOSITION).unwrap_or_default()
    );
    tracing::info!("Content-Type: {}", sink.content_type().unwrap_or_default());
    println!(
        "{} {} ({} rows, {} bytes)",
        "Wrote".green().bold(),
        out.display(),
        grid.len(),
        bytes
    );
    Ok(())
}

/// `.xls` destinations get the legacy format, everything else .xlsx
fn format_for_path(path: &Path) -> SpreadsheetFormat {
    let legacy = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xls"));
    SpreadsheetFormat::from_legacy_flag(legacy)
}

fn default_title(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("export")
        .to_string()
}

fn print_grid(grid: &Grid, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(grid)?),
        OutputFormat::Table => {
            if grid.is_empty() {
                println!("(empty sheet)");
            }
            for line in format_table(grid) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// Pad every column to its widest cell
fn format_table(grid: &Grid) -> Vec<String> {
    let cols = grid.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..cols)
        .map(|col| {
            grid.iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    grid.iter()
        .map(|row| {
            row.iter()
                .zip(&widths)
                .map(|(cell, width)| {
                    let pad = width - cell.chars().count();
                    format!("{cell}{}", " ".repeat(pad))
                })
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        })
        .collect()
}

//! sheetport CLI - SQLite <-> XLSX conversion tool

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sheetport::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sheetport")]
#[command(
    author,
    version,
    about = "Convert SQLite tables to and from XLSX workbooks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export tables from a SQLite database to an XLSX workbook
    Export {
        /// Input SQLite database
        db: PathBuf,

        /// Output XLSX file
        output: PathBuf,

        /// Tables to export (default: every table)
        tables: Vec<String>,
    },

    /// Import an XLSX workbook into a SQLite database, one table per sheet
    Import {
        /// Target SQLite database (created if missing)
        db: PathBuf,

        /// Input XLSX file
        input: PathBuf,

        /// Sheets to import, by name (default: every sheet)
        #[arg(short, long)]
        sheet: Vec<String>,

        /// Sheets to import, by 1-based position
        #[arg(short, long)]
        position: Vec<usize>,
    },

    /// List the sheets in an XLSX workbook
    Sheets {
        /// Input XLSX file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Export { db, output, tables } => export(&db, &output, tables),
        Commands::Import {
            db,
            input,
            sheet,
            position,
        } => import(&db, &input, sheet, position),
        Commands::Sheets { input } => list_sheets(&input),
    }
}

fn export(db: &Path, output: &Path, tables: Vec<String>) -> Result<()> {
    let report = export_tables(db, output, &tables)
        .with_context(|| format!("Failed to export '{}'", db.display()))?;

    eprintln!(
        "Wrote {} sheet(s) to '{}'",
        report.sheets_written,
        output.display()
    );

    if report.cells_truncated > 0 {
        if let Some(site) = &report.first_truncation {
            eprintln!(
                "Warning: {} cell(s) exceeded the {} character limit and were truncated. \
                 First occurrence: table '{}', row {}, column {}",
                report.cells_truncated, MAX_CELL_TEXT_LEN, site.table, site.row, site.column
            );
        }
    }

    Ok(())
}

fn import(db: &Path, input: &Path, sheets: Vec<String>, positions: Vec<usize>) -> Result<()> {
    let selection = match (sheets.is_empty(), positions.is_empty()) {
        (true, true) => SheetSelection::All,
        (false, true) => SheetSelection::Names(sheets),
        (true, false) => SheetSelection::Positions(positions),
        (false, false) => bail!("--sheet and --position cannot be combined"),
    };

    let summary = import_workbook(db, input, &selection)
        .with_context(|| format!("Failed to import '{}'", input.display()))?;

    eprintln!(
        "Imported {} table(s) ({} row(s)) into '{}'",
        summary.tables_created,
        summary.rows_inserted,
        db.display()
    );

    for (name, reason) in &summary.skipped {
        eprintln!("Skipped sheet '{}': {}", name, reason);
    }

    Ok(())
}

fn list_sheets(input: &Path) -> Result<()> {
    let file =
        File::open(input).with_context(|| format!("Failed to open '{}'", input.display()))?;
    let entries = XlsxReader::sheet_names(file)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;

    for entry in entries {
        println!("{}\t{}", entry.position, entry.name);
    }

    Ok(())
}

//! Import and export command implementations

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use budgetwise_core::{
    dates::parse_bound,
    db::Database,
    export::export_csv,
    import::{import_csv, ImportStats},
    models::DateRange,
};

pub fn cmd_import(db: &Database, file: &Path) -> Result<ImportStats> {
    println!("📥 Importing expenses from {}...", file.display());

    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let stats = import_csv(db, csv_file).context("Failed to import CSV")?;

    println!("   Imported: {}", stats.imported);
    if !stats.skipped.is_empty() {
        println!("   Skipped:  {}", stats.skipped.len());
        for row in &stats.skipped {
            println!("     line {}: {}", row.line, row.reason);
        }
    }
    println!("✅ Import complete");

    Ok(stats)
}

/// Write expenses as CSV to a file, or stdout when no output is given
pub fn cmd_export(
    db: &Database,
    output: Option<&Path>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<usize> {
    let range = DateRange::new(parse_bound(from), parse_bound(to));
    let expenses = db.list_expenses(&range)?;

    let count = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            let count = export_csv(&expenses, &mut writer)?;
            writer.flush()?;
            eprintln!("✅ Exported {} expenses to {}", count, path.display());
            count
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            export_csv(&expenses, &mut handle)?
        }
    };

    Ok(count)
}

use anyhow::Context;
use core::fmt::Write as _;
use std::{collections::BTreeMap, fs, path::Path};

/// Wall-clock milliseconds of one full sweep, keyed by worker count.
pub type ResultsTable = BTreeMap<usize, f64>;

const HEADER: &str = "WORKERS,TIME_MS";

/// Renders `table` as CSV, one row per worker count in ascending order.
pub fn to_csv(table: &ResultsTable) -> String {
    let mut out = String::with_capacity(HEADER.len() + 1 + table.len() * 16);
    out.push_str(HEADER);
    out.push('\n');
    for (workers, millis) in table {
        // Writing to a `String` cannot fail.
        let _ = writeln!(out, "{workers},{millis}");
    }
    out
}

/// Writes `table` to `<dir>/<length>.csv`, creating `dir` if needed.
pub fn write_csv(table: &ResultsTable, dir: &Path, length: usize) -> anyhow::Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("unable to create output directory {}", dir.display()))?;
    let path = dir.join(format!("{length}.csv"));
    fs::write(&path, to_csv(table))
        .with_context(|| format!("unable to write results to {}", path.display()))?;

    tracing::info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_are_sorted_by_worker_count() {
        let table = ResultsTable::from([(3, 1.5), (1, 4.25), (2, 2.0)]);
        assert_eq!(to_csv(&table), "WORKERS,TIME_MS\n1,4.25\n2,2\n3,1.5\n");
    }

    #[test]
    fn empty_table_has_only_a_header() {
        assert_eq!(to_csv(&ResultsTable::new()), "WORKERS,TIME_MS\n");
    }

    #[test]
    fn write_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let table = ResultsTable::from([(1, 10.0)]);
        write_csv(&table, &out, 4).unwrap();
        let written = fs::read_to_string(out.join("4.csv")).unwrap();
        assert_eq!(written, "WORKERS,TIME_MS\n1,10\n");
    }

    #[test]
    fn write_reports_unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"").unwrap();
        let err = write_csv(&ResultsTable::new(), &blocker, 1).unwrap_err();
        assert!(err.to_string().contains("unable to create output directory"));
    }
}

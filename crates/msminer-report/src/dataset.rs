use std::io::Write;

use anyhow::Result;

use msminer_core::dataset::{columns, DatasetRow};

/// Write dataset rows as CSV, optionally preceded by the header.
pub fn write_rows<W: Write>(out: W, rows: &[DatasetRow], header: bool) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    if header {
        wtr.write_record(columns())?;
    }
    for row in rows {
        wtr.write_record(row.cells())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render dataset rows to a CSV string.
pub fn format_rows(rows: &[DatasetRow], header: bool) -> Result<String> {
    let mut buf = Vec::new();
    write_rows(&mut buf, rows, header)?;
    Ok(String::from_utf8(buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_row() {
        let mut row = DatasetRow::new("https://example.com/a/b", "deadbeef");
        row.set("MICROSERVICES", "3").unwrap();
        row.set("AUTHOR_NAME", "Doe, Jane").unwrap();
        let csv = format_rows(&[row], true).unwrap();
        let mut lines = csv.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("REPO,COMMIT,AUTHOR_NAME,"));
        assert!(header.ends_with(",FUNCTIONS,STATEMENTS"));

        let line = lines.next().unwrap();
        assert!(line.starts_with("https://example.com/a/b,deadbeef,\"Doe, Jane\","));
        assert_eq!(line.matches(',').count(), 40, "39 separators plus the quoted comma");
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_rows_without_header() {
        let csv = format_rows(&[DatasetRow::new("r", "c")], false).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("r,c,"));
    }
}

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::Context as _;

use crate::formats::Reading;

/// Appends one reading to the CSV log, writing the header first when the
/// file does not exist yet.
pub fn append(path: &Path, reading: &Reading) -> anyhow::Result<()> {
    let is_new = !path.exists();
    if is_new {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create snapshot log dir: {}", parent.display()))?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open snapshot log: {}", path.display()))?;
    let mut out = BufWriter::new(file);

    if is_new {
        write_row(&mut out, &Reading::COLUMNS.map(str::to_owned))
            .context("write snapshot log header")?;
    }
    write_row(&mut out, &reading.to_row()).context("write snapshot log row")?;
    out.flush().context("flush snapshot log")?;

    tracing::debug!(path = %path.display(), header = is_new, "reading appended");
    Ok(())
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write>(mut w: W, row: &[String]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(notes: &str) -> Reading {
        Reading {
            timestamp_utc: "2025-03-01T18:30:00+00:00".to_owned(),
            event_id: Some(7),
            event_url: "https://tickets.example/e?eventId=7".to_owned(),
            sold_tickets: None,
            total_available: Some(12),
            sectors_json: r#"[{"sector":"A","available":12}]"#.to_owned(),
            success: true,
            notes: notes.to_owned(),
        }
    }

    #[test]
    fn write_row_quotes_only_when_needed() -> anyhow::Result<()> {
        let mut buf = Vec::new();
        write_row(
            &mut buf,
            &["plain".to_owned(), "a,b".to_owned(), "say \"hi\"".to_owned(), String::new()],
        )?;
        assert_eq!(String::from_utf8(buf)?, "plain,\"a,b\",\"say \"\"hi\"\"\",\n");
        Ok(())
    }

    #[test]
    fn append_bootstraps_header_once() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("nested").join("ticket_snapshots.csv");

        append(&path, &reading("first"))?;
        append(&path, &reading("a; b"))?;

        let contents = std::fs::read_to_string(&path)?;
        let lines = contents.lines().collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec![
                "timestamp_utc,event_id,event_url,sold_tickets,total_available,sectors_json,success,notes",
                r#"2025-03-01T18:30:00+00:00,7,https://tickets.example/e?eventId=7,,12,"[{""sector"":""A"",""available"":12}]",true,first"#,
                r#"2025-03-01T18:30:00+00:00,7,https://tickets.example/e?eventId=7,,12,"[{""sector"":""A"",""available"":12}]",true,a; b"#,
            ]
        );
        Ok(())
    }

    #[test]
    fn append_to_existing_file_skips_header() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("log.csv");
        std::fs::write(&path, "existing\n")?;

        append(&path, &reading("x"))?;

        let contents = std::fs::read_to_string(&path)?;
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.starts_with("existing\n2025-03-01"));
        Ok(())
    }
}

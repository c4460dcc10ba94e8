//! Segment tables: a small header followed by one
//! `phoneme\t\tbegin\t\tend` row per segment, times in seconds.

use std::fmt::Write;
use std::path::Path;

use crate::batch::{self, BatchReport, Outcome};
use crate::lab::{self, LabRecord};

const SILENCE_LABEL: &str = "Sil";

/// Labels rewritten to [`SILENCE_LABEL`].
const SILENCE_ALIASES: [&str; 2] = ["R", "pau"];

/// Renders the table, or `None` when there are no records.
pub fn render(records: &[LabRecord]) -> Option<String> {
    if records.is_empty() {
        return None;
    }
    let mut out = String::new();
    let _ = writeln!(out, "nPhonemes {}", records.len());
    let _ = writeln!(out, "articulationsAreStationaries 0");
    let _ = writeln!(out, "phoneme\t\tBeginTime\t\tEndTime");
    let _ = writeln!(out, "{}", "=".repeat(49));
    for record in records {
        let span = record.span.to_seconds();
        let _ = writeln!(
            out,
            "{}\t\t{:.6}\t\t{:.6}",
            relabel_silence(&record.label),
            span.start,
            span.end
        );
    }
    Some(out)
}

fn relabel_silence(label: &str) -> &str {
    if SILENCE_ALIASES.contains(&label) {
        SILENCE_LABEL
    } else {
        label
    }
}

/// Converts every `.lab` under `input` into a `.seg` at the mirrored
/// location under `output`.
pub fn labs_to_segs(input: &Path, output: &Path) -> anyhow::Result<BatchReport> {
    let files = batch::collect_files(input, "lab")?;
    Ok(batch::process(&files, |path| {
        let records = lab::read(path)?;
        let Some(table) = render(&records) else {
            return Ok(Outcome::Empty);
        };
        let out_path = batch::output_path(input, path, Some(output), "seg")?;
        batch::write_file(&out_path, &table)?;
        Ok(Outcome::Written(out_path))
    }))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::span::Span;

    fn record(start: i64, end: i64, label: &str) -> LabRecord {
        LabRecord {
            span: Span::new(start, end),
            label: label.to_string(),
        }
    }

    #[test]
    fn renders_header_and_rows() {
        let table = render(&[record(0, 5_000_000, "pau"), record(5_000_000, 12_500_000, "ka")])
            .unwrap();
        let expected = "nPhonemes 2\n\
                        articulationsAreStationaries 0\n\
                        phoneme\t\tBeginTime\t\tEndTime\n\
                        =================================================\n\
                        Sil\t\t0.000000\t\t0.500000\n\
                        ka\t\t0.500000\t\t1.250000\n";
        assert_eq!(table, expected);
    }

    #[test]
    fn only_reserved_labels_become_silence() {
        assert_eq!(relabel_silence("R"), "Sil");
        assert_eq!(relabel_silence("pau"), "Sil");
        assert_eq!(relabel_silence("r"), "r");
        assert_eq!(relabel_silence("sil"), "sil");
        assert_eq!(relabel_silence("pau2"), "pau2");
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(render(&[]), None);
    }

    #[test]
    fn batch_writes_mirrored_seg_files() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::create_dir_all(input.path().join("spk")).unwrap();
        fs::write(input.path().join("spk/a.lab"), "0 1000000 R\n1000000 2500000 a\n").unwrap();
        fs::write(input.path().join("spk/empty.lab"), "\n").unwrap();
        fs::write(input.path().join("spk/bad.lab"), "zero one two\n").unwrap();

        let report = labs_to_segs(input.path(), output.path()).unwrap();
        assert_eq!((report.written, report.empty, report.failed), (1, 1, 1));

        let seg = fs::read_to_string(output.path().join("spk/a.seg")).unwrap();
        assert!(seg.starts_with("nPhonemes 2\n"));
        assert!(seg.ends_with("Sil\t\t0.000000\t\t0.100000\na\t\t0.100000\t\t0.250000\n"));
        assert!(!output.path().join("spk/empty.seg").exists());
    }
}

//! HTK-style label files: one `<start> <end> <label>` line per segment,
//! times in 100 ns ticks.

use std::fs;
use std::path::Path;

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;

use crate::batch::{self, BatchReport, Outcome};
use crate::error::LabError;
use crate::mapping::MappingTable;
use crate::rewrite::{rewrite, PassThrough, SymbolSequence, Token};
use crate::span::Span;
use crate::textgrid;

lazy_static! {
    static ref LAB_LINE: Regex = Regex::new(r"^(\d+)\s+(\d+)\s+(.+)$").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabRecord {
    pub span: Span<i64>,
    pub label: String,
}

impl From<Token<f64>> for LabRecord {
    fn from(token: Token<f64>) -> Self {
        Self {
            span: token.span.to_ticks(),
            label: token.text,
        }
    }
}

impl From<Token<i64>> for LabRecord {
    fn from(token: Token<i64>) -> Self {
        Self {
            span: token.span,
            label: token.text,
        }
    }
}

/// One newline-terminated line per record.
pub fn render(records: &[LabRecord]) -> String {
    records
        .iter()
        .map(|record| format!("{} {} {}\n", record.span.start, record.span.end, record.label))
        .collect()
}

/// Parses lab text. Blank lines are skipped; any other line that does not
/// look like `<digits> <digits> <label>` fails the whole file.
pub fn parse(contents: &str) -> Result<Vec<LabRecord>, LabError> {
    let mut records = Vec::new();
    for (index, raw_line) in contents.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed = LAB_LINE.captures(line).and_then(|caps| {
            let start = caps[1].parse::<i64>().ok()?;
            let end = caps[2].parse::<i64>().ok()?;
            Some(LabRecord {
                span: Span::new(start, end),
                label: caps[3].to_string(),
            })
        });
        match parsed {
            Some(record) => records.push(record),
            None => {
                return Err(LabError::Parse {
                    line: index + 1,
                    content: line.to_string(),
                })
            }
        }
    }
    Ok(records)
}

#[derive(Debug, Clone)]
pub struct TextGridOptions {
    /// Interval tier holding the phone labels.
    pub tier: String,
    /// When false, labels are written one per interval without merging.
    pub use_converter: bool,
}

impl Default for TextGridOptions {
    fn default() -> Self {
        Self {
            tier: "phones".to_string(),
            use_converter: true,
        }
    }
}

/// Reads one TextGrid and returns its merged lab records.
///
/// Labels go through the table's normalization before lookup, so
/// pass-through labels come out normalized as well.
pub fn convert_textgrid(
    path: &Path,
    table: &MappingTable,
    options: &TextGridOptions,
) -> anyhow::Result<Vec<LabRecord>> {
    let intervals = textgrid::read_tier(path, &options.tier)
        .with_context(|| format!("Failed to read TextGrid '{}'", path.display()))?;
    let sequence = textgrid::to_sequence(intervals).map_symbols(|label| table.normalize(&label));

    let unmerged;
    let lexicon = if options.use_converter {
        table
    } else {
        unmerged = MappingTable::new(table.normalization());
        &unmerged
    };

    let tokens = rewrite(&sequence, lexicon, &PassThrough);
    for token in tokens.iter().filter(|token| token.source.len() > 1) {
        tracing::trace!("Merged {} labels into `{}`", token.source.len(), token.text);
    }
    Ok(tokens.into_iter().map(LabRecord::from).collect())
}

/// Runs the mapping table over lab records, keeping their tick spans.
pub fn relabel(records: Vec<LabRecord>, table: &MappingTable) -> Vec<LabRecord> {
    let sequence: SymbolSequence<String, i64> = records
        .into_iter()
        .map(|record| (record.label, record.span))
        .collect();
    rewrite(&sequence, table, &PassThrough)
        .into_iter()
        .map(LabRecord::from)
        .collect()
}

/// Converts every `.TextGrid` under `input`. Output goes next to each
/// source file, or into the same relative location under `output`.
pub fn textgrids_to_labs(
    input: &Path,
    output: Option<&Path>,
    table: &MappingTable,
    options: &TextGridOptions,
) -> anyhow::Result<BatchReport> {
    let files = batch::collect_files(input, "TextGrid")?;
    Ok(batch::process(&files, |path| {
        let records = convert_textgrid(path, table, options)?;
        if records.is_empty() {
            return Ok(Outcome::Empty);
        }
        let out_path = batch::output_path(input, path, output, "lab")?;
        batch::write_file(&out_path, &render(&records))?;
        Ok(Outcome::Written(out_path))
    }))
}

/// Rewrites the labels of every `.lab` under `input` in place.
pub fn relabel_labs(input: &Path, table: &MappingTable) -> anyhow::Result<BatchReport> {
    let files = batch::collect_files(input, "lab")?;
    Ok(batch::process(&files, |path| {
        let records = read(path)?;
        if records.is_empty() {
            return Ok(Outcome::Empty);
        }
        let records = relabel(records, table);
        batch::write_file(path, &render(&records))?;
        Ok(Outcome::Written(path.to_owned()))
    }))
}

pub fn read(path: &Path) -> anyhow::Result<Vec<LabRecord>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read lab file '{}'", path.display()))?;
    parse(&contents).with_context(|| format!("Failed to parse lab file '{}'", path.display()))
}

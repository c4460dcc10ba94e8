//! Reader for Praat TextGrid files.
//!
//! Only what the lab conversion needs is extracted: the intervals of one
//! named interval tier. Files go through the `textgrid` crate first; the
//! long-format line scanner below takes over when that fails, which also
//! covers UTF-16 files.

use std::fs;
use std::path::Path;

use ::textgrid::{TextGrid, TierType};

use crate::error::TextGridError;
use crate::rewrite::SymbolSequence;
use crate::span::Span;

/// Label given to intervals with no text.
pub const SILENCE: &str = "pau";

#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub xmin: f64,
    pub xmax: f64,
    pub text: String,
}

pub fn read_tier(path: &Path, tier_name: &str) -> Result<Vec<Interval>, TextGridError> {
    match read_tier_with_textgrid_crate(path, tier_name) {
        Ok(intervals) => Ok(intervals),
        Err(crate_err) => {
            tracing::debug!(
                "textgrid crate could not read '{}' ({crate_err}), using the line parser",
                path.display()
            );
            let bytes = fs::read(path)?;
            let contents = decode(&bytes)?;
            parse_tier(&contents, tier_name)
        }
    }
}

fn read_tier_with_textgrid_crate(path: &Path, tier_name: &str) -> Result<Vec<Interval>, String> {
    let textgrid =
        TextGrid::from_file(path).map_err(|err| format!("textgrid crate parse failed: {err}"))?;

    let Some(tier) = textgrid
        .tiers
        .iter()
        .find(|tier| tier.tier_type == TierType::IntervalTier && tier.name == tier_name)
    else {
        return Ok(Vec::new());
    };

    Ok(tier
        .intervals
        .iter()
        .map(|interval| Interval {
            xmin: interval.xmin,
            xmax: interval.xmax,
            text: interval.text.clone(),
        })
        .collect())
}

/// Intervals of the interval tier called `tier_name`, in file order.
/// A missing tier yields no intervals.
pub fn parse_tier(contents: &str, tier_name: &str) -> Result<Vec<Interval>, TextGridError> {
    let mut in_item = false;
    let mut item_is_interval_tier = false;
    let mut item_has_name = false;
    let mut in_tier = false;

    let mut cur_xmin: Option<f64> = None;
    let mut cur_xmax: Option<f64> = None;
    let mut intervals = Vec::new();

    for (index, raw_line) in contents.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        if line.starts_with("item [") {
            in_item = true;
            item_is_interval_tier = false;
            item_has_name = false;
            in_tier = false;
            cur_xmin = None;
            cur_xmax = None;
            continue;
        }

        if !in_item {
            continue;
        }

        if let Some(value) = assignment_value(line, "class") {
            item_is_interval_tier = unquote(value) == "IntervalTier";
            in_tier = item_is_interval_tier && item_has_name;
            continue;
        }

        if let Some(value) = assignment_value(line, "name") {
            item_has_name = unquote(value) == tier_name;
            in_tier = item_is_interval_tier && item_has_name;
            continue;
        }

        if !in_tier {
            continue;
        }

        if let Some(value) = assignment_value(line, "xmin") {
            cur_xmin = Some(parse_number(value, line_no)?);
            continue;
        }

        if let Some(value) = assignment_value(line, "xmax") {
            cur_xmax = Some(parse_number(value, line_no)?);
            continue;
        }

        if let Some(value) = assignment_value(line, "text") {
            let xmin = cur_xmin
                .ok_or_else(|| TextGridError::malformed(line_no, "missing xmin before text"))?;
            let xmax = cur_xmax
                .ok_or_else(|| TextGridError::malformed(line_no, "missing xmax before text"))?;
            intervals.push(Interval {
                xmin,
                xmax,
                text: unquote(value),
            });
            cur_xmin = None;
            cur_xmax = None;
        }
    }

    Ok(intervals)
}

/// Turns intervals into labelled spans in seconds. Blank labels become [`SILENCE`].
pub fn to_sequence(intervals: Vec<Interval>) -> SymbolSequence<String, f64> {
    intervals
        .into_iter()
        .map(|interval| {
            let label = match interval.text.trim() {
                "" => SILENCE.to_string(),
                text => text.to_string(),
            };
            (label, Span::new(interval.xmin, interval.xmax))
        })
        .collect()
}

/// Praat writes either UTF-8 or UTF-16 with a byte order mark.
fn decode(bytes: &[u8]) -> Result<String, TextGridError> {
    let utf16 = |big_endian: bool| -> Result<String, TextGridError> {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| {
                if big_endian {
                    u16::from_be_bytes([pair[0], pair[1]])
                } else {
                    u16::from_le_bytes([pair[0], pair[1]])
                }
            })
            .collect();
        String::from_utf16(&units).map_err(|err| TextGridError::Encoding(err.to_string()))
    };
    match bytes {
        [0xff, 0xfe, ..] => utf16(false),
        [0xfe, 0xff, ..] => utf16(true),
        _ => {
            let text = std::str::from_utf8(bytes)
                .map_err(|err| TextGridError::Encoding(err.to_string()))?;
            Ok(text.trim_start_matches('\u{feff}').to_string())
        }
    }
}

fn assignment_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(key)?.trim_start();
    rest.strip_prefix('=').map(str::trim)
}

fn unquote(value: &str) -> String {
    let inner = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    inner.replace("\"\"", "\"")
}

fn parse_number(value: &str, line: usize) -> Result<f64, TextGridError> {
    value
        .parse::<f64>()
        .map_err(|_| TextGridError::malformed(line, format!("invalid number `{value}`")))
}

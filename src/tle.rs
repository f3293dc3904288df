//! Two-line element set parsing.
//!
//! Input is plain text in groups of three lines (name, line 1, line 2). Each
//! element line is checked for shape and against its modulo-10 checksum
//! before SGP4 decodes the fields and is initialised. A bad group is reported and skipped;
//! it never aborts the rest of the batch.
//!
//! [`TleStream`] accepts lines one at a time for on-demand ingestion;
//! [`parse_tle_batch`] runs a whole document through it.

use bevy::log::{info, warn};

use crate::orbit::ElementSet;

/// Length of a TLE element line including the checksum column.
pub const TLE_LINE_LENGTH: usize = 69;

/// Why an element-set group was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Wrong shape: length, line number, separators, or an unparseable field.
    /// `line` is 1 or 2 for element lines and 0 for the group as a whole;
    /// field errors from the SGP4 decoder use 0 and name the line in `reason`.
    #[error("malformed TLE (line {line}): {reason}")]
    Malformed { line: u8, reason: String },

    #[error("TLE line {line} checksum mismatch (expected {expected}, computed {computed})")]
    ChecksumFailed { line: u8, expected: u32, computed: u32 },
}

impl ParseError {
    fn malformed(line: u8, reason: impl Into<String>) -> Self {
        ParseError::Malformed {
            line,
            reason: reason.into(),
        }
    }
}

/// A group that was skipped during ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord {
    /// 1-based input line where the group started.
    pub line_number: usize,
    /// Name line of the group, when one was present.
    pub name: Option<String>,
    pub error: ParseError,
}

/// Outcome of parsing a whole document.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub element_sets: Vec<ElementSet>,
    pub rejected: Vec<RejectedRecord>,
}

/// Modulo-10 checksum over the first 68 columns: digits count their value,
/// minus signs count one, everything else zero.
pub fn checksum(line: &str) -> u32 {
    line.bytes()
        .take(TLE_LINE_LENGTH - 1)
        .map(|b| match b {
            b'0'..=b'9' => (b - b'0') as u32,
            b'-' => 1,
            _ => 0,
        })
        .sum::<u32>()
        % 10
}

/// Columns `start..=end`, 1-based as in the format definition.
fn columns(line: &str, start: usize, end: usize) -> &str {
    &line[start - 1..end]
}

/// Check length, line number and column separators of one element line and
/// return its first 69 columns. Anything past the checksum column is ignored.
fn validate_shape(line: &str, number: u8) -> Result<&str, ParseError> {
    let line = line.trim_end();
    if !line.is_ascii() {
        return Err(ParseError::malformed(number, "contains non-ASCII characters"));
    }
    if line.len() < TLE_LINE_LENGTH {
        return Err(ParseError::malformed(
            number,
            format!("expected {} columns, found {}", TLE_LINE_LENGTH, line.len()),
        ));
    }
    let line = &line[..TLE_LINE_LENGTH];

    let bytes = line.as_bytes();
    if bytes[0] != b'0' + number {
        return Err(ParseError::malformed(
            number,
            format!("line must start with '{}'", number),
        ));
    }

    let separators: &[usize] = if number == 1 {
        &[2, 9, 18, 33, 44, 53, 62, 64]
    } else {
        &[2, 8, 17, 26, 34, 43, 52]
    };
    if let Some(col) = separators.iter().find(|&&col| bytes[col - 1] != b' ') {
        return Err(ParseError::malformed(
            number,
            format!("expected blank separator in column {}", col),
        ));
    }

    if !bytes[TLE_LINE_LENGTH - 1].is_ascii_digit() {
        return Err(ParseError::malformed(number, "checksum column is not a digit"));
    }

    Ok(line)
}

fn verify_checksum(line: &str, number: u8) -> Result<(), ParseError> {
    let expected = (line.as_bytes()[TLE_LINE_LENGTH - 1] - b'0') as u32;
    let computed = checksum(line);
    if expected != computed {
        return Err(ParseError::ChecksumFailed {
            line: number,
            expected,
            computed,
        });
    }
    Ok(())
}

/// Validate one group and initialise SGP4 for it.
///
/// Shape and catalog numbers are checked first, then the checksums, so a
/// line whose columns line up but whose checksum digit disagrees is
/// reported as [`ParseError::ChecksumFailed`]. Field decoding is left to
/// [`sgp4::Elements::from_tle`].
pub fn parse_element_set(name: &str, line1: &str, line2: &str) -> Result<ElementSet, ParseError> {
    let line1 = validate_shape(line1, 1)?;
    let line2 = validate_shape(line2, 2)?;

    let catalog1 = columns(line1, 3, 7).trim();
    let catalog2 = columns(line2, 3, 7).trim();
    if catalog1 != catalog2 {
        return Err(ParseError::malformed(
            0,
            format!("catalog numbers differ ({} vs {})", catalog1, catalog2),
        ));
    }

    verify_checksum(line1, 1)?;
    verify_checksum(line2, 2)?;

    let elements = sgp4::Elements::from_tle(None, line1.as_bytes(), line2.as_bytes())
        .map_err(|e| ParseError::malformed(0, e.to_string()))?;
    let norad_id = u32::try_from(elements.norad_id)
        .map_err(|_| ParseError::malformed(0, format!("catalog number {} out of range", elements.norad_id)))?;
    if elements.mean_motion.is_nan() || elements.mean_motion <= 0.0 {
        return Err(ParseError::malformed(2, "mean motion must be positive"));
    }
    let constants = sgp4::Constants::from_elements(&elements)
        .map_err(|e| ParseError::malformed(0, format!("SGP4 initialisation failed: {}", e)))?;

    let name = match object_name(name) {
        "" => format!("NORAD {}", norad_id),
        trimmed => trimmed.to_string(),
    };

    Ok(ElementSet::from_validated(
        name,
        norad_id,
        &elements,
        (line1.to_string(), line2.to_string()),
        constants,
    ))
}

/// Name line without surrounding blanks or the `0 ` prefix of 3LE files.
fn object_name(line: &str) -> &str {
    let line = line.trim();
    line.strip_prefix("0 ").map_or(line, str::trim_start)
}

fn is_line1(line: &str) -> bool {
    line.starts_with("1 ")
}

fn is_line2(line: &str) -> bool {
    line.starts_with("2 ")
}

/// Incremental three-line grouping.
///
/// Feed lines with [`TleStream::push_line`]; each call yields at most one
/// finished group. Lines that cannot belong to a group are reported as
/// [`ParseError::Malformed`] and the stream resynchronises on the next
/// plausible group start. A group without a name line is accepted and named
/// after its catalog number.
#[derive(Debug, Default)]
pub struct TleStream {
    /// (1-based line number, text)
    pending: Vec<(usize, String)>,
    lines_seen: usize,
}

impl TleStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lines consumed so far, including blank ones.
    pub fn lines_seen(&self) -> usize {
        self.lines_seen
    }

    pub fn push_line(&mut self, line: &str) -> Option<Result<ElementSet, RejectedRecord>> {
        self.lines_seen += 1;
        let line = line.trim_end();
        if line.trim().is_empty() {
            return None;
        }
        self.pending.push((self.lines_seen, line.to_string()));

        match self.pending.len() {
            1 => {
                if is_line2(&self.pending[0].1) {
                    return Some(Err(self.reject(1, "line 2 without a preceding line 1")));
                }
                None
            }
            2 => {
                let first = &self.pending[0].1;
                let second = &self.pending[1].1;
                if is_line1(first) && is_line2(second) {
                    return Some(self.finish_group(None));
                }
                if is_line1(first) {
                    return Some(Err(self.reject(1, "line 1 without a following line 2")));
                }
                if is_line2(second) {
                    return Some(Err(self.reject(2, "line 2 without a preceding line 1")));
                }
                if !is_line1(second) {
                    return Some(Err(self.reject(1, "name line without element lines")));
                }
                None
            }
            _ => {
                if is_line2(&self.pending[2].1) {
                    let name = self.pending.remove(0);
                    return Some(self.finish_group(Some(name)));
                }
                Some(Err(self.reject(2, "line 1 without a following line 2")))
            }
        }
    }

    /// Flush the stream at end of input; an incomplete trailing group is
    /// reported as truncated.
    pub fn finish(&mut self) -> Option<RejectedRecord> {
        if self.pending.is_empty() {
            return None;
        }
        let count = self.pending.len();
        Some(self.reject(count, "truncated group at end of input"))
    }

    /// Drop the first `count` pending lines and describe them as rejected.
    fn reject(&mut self, count: usize, reason: &str) -> RejectedRecord {
        let dropped: Vec<_> = self.pending.drain(..count).collect();
        let line_number = dropped.first().map(|(n, _)| *n).unwrap_or(self.lines_seen);
        let name = dropped
            .first()
            .map(|(_, text)| text)
            .filter(|text| !is_line1(text) && !is_line2(text))
            .map(|text| object_name(text).to_string());
        RejectedRecord {
            line_number,
            name,
            error: ParseError::malformed(0, reason),
        }
    }

    /// Parse the two pending element lines as one group.
    fn finish_group(
        &mut self,
        name: Option<(usize, String)>,
    ) -> Result<ElementSet, RejectedRecord> {
        let (_, line2) = self.pending.pop().unwrap_or_default();
        let (line1_number, line1) = self.pending.pop().unwrap_or_default();
        self.pending.clear();

        let line_number = name.as_ref().map_or(line1_number, |(n, _)| *n);
        let name = name.map(|(_, text)| object_name(&text).to_string());

        parse_element_set(name.as_deref().unwrap_or(""), &line1, &line2).map_err(|error| {
            RejectedRecord {
                line_number,
                name,
                error,
            }
        })
    }
}

/// Parse a whole TLE document.
///
/// Every rejected group is logged at warn level and collected in the report.
pub fn parse_tle_batch(text: &str) -> ParseReport {
    let mut stream = TleStream::new();
    let mut report = ParseReport::default();

    for line in text.lines() {
        match stream.push_line(line) {
            Some(Ok(set)) => report.element_sets.push(set),
            Some(Err(rejected)) => report.rejected.push(rejected),
            None => {}
        }
    }
    if let Some(rejected) = stream.finish() {
        report.rejected.push(rejected);
    }

    for rejected in &report.rejected {
        warn!(
            "Skipping TLE group at line {} ({}): {}",
            rejected.line_number,
            rejected.name.as_deref().unwrap_or("unnamed"),
            rejected.error
        );
    }
    info!(
        "Parsed {} element sets ({} rejected)",
        report.element_sets.len(),
        report.rejected.len()
    );

    report
}

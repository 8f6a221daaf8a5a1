//! Decoding of server lines into [`Record`]s.
//!
//! Decoding is strictly per line: a malformed line yields a [`DecodeError`]
//! and has no effect on the lines around it.

use std::fmt;
use std::str::FromStr;

use simview_core::{Agent, AgentState, DomainError, GridConfig, Place, PlaceKind, StatsSummary};
use thiserror::Error;

use crate::record::Record;
use crate::{FIELD_DELIMITER, FRAME_END};

// ============================================================================
// Errors
// ============================================================================

/// Field count a record kind requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCount {
    Exactly(usize),
    AtLeast(usize),
}

impl FieldCount {
    fn accepts(&self, found: usize) -> bool {
        match *self {
            Self::Exactly(n) => found == n,
            Self::AtLeast(n) => found >= n,
        }
    }
}

impl fmt::Display for FieldCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "exactly {n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// Why a single line could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Blank line
    #[error("Empty line")]
    Empty,

    /// First field is not a known record tag
    #[error("Unknown record kind: {kind}")]
    UnknownKind { kind: String },

    /// Record has the wrong number of fields
    #[error("{kind} record has {found} fields (expected {expected})")]
    FieldCount {
        kind: &'static str,
        expected: FieldCount,
        found: usize,
    },

    /// A numeric field did not parse
    #[error("{kind} record: invalid {field} value {value:?}")]
    InvalidNumber {
        kind: &'static str,
        field: &'static str,
        value: String,
    },

    /// Fields parsed but the value is not acceptable
    #[error("Invalid record value: {0}")]
    Domain(#[from] DomainError),
}

impl DecodeError {
    /// Record tag the failing line carried, when it is known.
    ///
    /// `None` for blank lines and for values rejected after parsing.
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::UnknownKind { kind } => Some(kind.as_str()),
            Self::FieldCount { kind, .. } | Self::InvalidNumber { kind, .. } => Some(*kind),
            Self::Empty | Self::Domain(_) => None,
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes one protocol line.
///
/// A trailing `\r` or `\n` is ignored. The line is split on `;` and the
/// first field selects the record kind:
///
/// | Tag | Fields | Result |
/// |-----|--------|--------|
/// | `CONFIG` | at least 3 | [`Record::Config`] |
/// | `AGENT` | exactly 9 | [`Record::Agent`] |
/// | `MAISON` `TRAVAIL` `PARC` `LOISIR` | at least 3 | [`Record::Place`] |
/// | `STATS` | exactly 7 | [`Record::Stats`] |
/// | `END` | exactly 1 | [`Record::End`] |
///
/// # Errors
///
/// Any other tag, a wrong field count, or an unparsable number.
pub fn decode(line: &str) -> Result<Record, DecodeError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Err(DecodeError::Empty);
    }

    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    let tag = fields.first().copied().unwrap_or_default();

    match tag {
        FRAME_END => {
            expect_fields(FRAME_END, FieldCount::Exactly(1), &fields)?;
            Ok(Record::End)
        }
        "CONFIG" => decode_config(&fields),
        "AGENT" => decode_agent(&fields),
        "STATS" => decode_stats(&fields),
        other => match PlaceKind::from_wire_tag(other) {
            Some(kind) => decode_place(kind, &fields),
            None => Err(DecodeError::UnknownKind {
                kind: other.to_string(),
            }),
        },
    }
}

fn decode_config(fields: &[&str]) -> Result<Record, DecodeError> {
    const KIND: &str = "CONFIG";
    expect_fields(KIND, FieldCount::AtLeast(3), fields)?;

    let width = parse_int(KIND, "width", field(fields, 1))?;
    let height = parse_int(KIND, "height", field(fields, 2))?;
    Ok(Record::Config(GridConfig::try_new(width, height)?))
}

fn decode_agent(fields: &[&str]) -> Result<Record, DecodeError> {
    const KIND: &str = "AGENT";
    expect_fields(KIND, FieldCount::Exactly(9), fields)?;

    Ok(Record::Agent(Agent {
        name: field(fields, 1).to_string(),
        x: parse_float(KIND, "x", field(fields, 2))?,
        y: parse_float(KIND, "y", field(fields, 3))?,
        energy: parse_float(KIND, "energy", field(fields, 4))?,
        stress: parse_float(KIND, "stress", field(fields, 5))?,
        money: parse_float(KIND, "money", field(fields, 6))?,
        state: AgentState::new(field(fields, 7)),
        heading: parse_float(KIND, "heading", field(fields, 8))?,
    }))
}

fn decode_place(kind: PlaceKind, fields: &[&str]) -> Result<Record, DecodeError> {
    let tag = kind.wire_tag();
    expect_fields(tag, FieldCount::AtLeast(3), fields)?;

    let x = parse_cell(tag, "x", field(fields, 1))?;
    let y = parse_cell(tag, "y", field(fields, 2))?;
    // Only a literal "1" means occupied; a missing flag means free
    let occupied = fields.get(3).is_some_and(|flag| *flag == "1");

    Ok(Record::Place(Place::new(kind, x, y, occupied)))
}

fn decode_stats(fields: &[&str]) -> Result<Record, DecodeError> {
    const KIND: &str = "STATS";
    expect_fields(KIND, FieldCount::Exactly(7), fields)?;

    Ok(Record::Stats(StatsSummary {
        avg_energy: parse_float(KIND, "avg_energy", field(fields, 1))?,
        avg_stress: parse_float(KIND, "avg_stress", field(fields, 2))?,
        avg_money: parse_float(KIND, "avg_money", field(fields, 3))?,
        alive: parse_int(KIND, "alive", field(fields, 4))?,
        dead: parse_int(KIND, "dead", field(fields, 5))?,
        occupied: parse_int(KIND, "occupied", field(fields, 6))?,
    }))
}

// ============================================================================
// Field Helpers
// ============================================================================

fn expect_fields(kind: &'static str, expected: FieldCount, fields: &[&str]) -> Result<(), DecodeError> {
    if expected.accepts(fields.len()) {
        Ok(())
    } else {
        Err(DecodeError::FieldCount {
            kind,
            expected,
            found: fields.len(),
        })
    }
}

/// Field at `index`, empty if absent. Callers check the count first.
fn field<'a>(fields: &[&'a str], index: usize) -> &'a str {
    fields.get(index).copied().unwrap_or_default()
}

fn parse_float(kind: &'static str, name: &'static str, raw: &str) -> Result<f64, DecodeError> {
    match f64::from_str(raw.trim()) {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(invalid(kind, name, raw)),
    }
}

fn parse_int(kind: &'static str, name: &'static str, raw: &str) -> Result<u32, DecodeError> {
    raw.trim().parse::<u32>().map_err(|_| invalid(kind, name, raw))
}

/// Parses a place coordinate. Integers are taken as is; a float is
/// truncated toward zero to the cell that contains it.
fn parse_cell(kind: &'static str, name: &'static str, raw: &str) -> Result<i32, DecodeError> {
    let trimmed = raw.trim();
    if let Ok(cell) = trimmed.parse::<i32>() {
        return Ok(cell);
    }
    let value = parse_float(kind, name, trimmed)?;
    if value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return Err(invalid(kind, name, raw));
    }
    Ok(value.trunc() as i32)
}

fn invalid(kind: &'static str, field: &'static str, raw: &str) -> DecodeError {
    DecodeError::InvalidNumber {
        kind,
        field,
        value: raw.to_string(),
    }
}

//! Conversion of wire results into typed tables.
//!
//! Every column's type tag is parsed once into a [`WireType`]; each cell is
//! then converted by a single exhaustive match on that type.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use num_bigint::BigInt;
use serde_json::Value as Json;
use std::collections::BTreeMap;

use super::types::{Row, Table, Value, WireResult};
use crate::error::{HttpSqlError, Result};

/// The closed set of wire type tags this decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Boolean,
    /// Integer, float and decimal types that fit a double.
    Number,
    /// 64-bit and wider integers.
    BigInt,
    Text,
    Date,
    Time,
    /// Naive timestamp, read as UTC.
    Timestamp,
    TimestampTz,
    Blob,
    List,
    Struct,
    /// Anything else; cells pass through unchanged.
    Other,
}

impl WireType {
    /// Parses a wire type tag. Case-insensitive; type parameters such as
    /// `DECIMAL(18,3)` are ignored.
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();

        if tag.ends_with("[]") {
            return Self::List;
        }

        let base = tag.split('(').next().unwrap_or_default().trim();

        match base {
            "boolean" | "bool" => Self::Boolean,
            "tinyint" | "smallint" | "integer" | "int" | "int32" | "float" | "real" | "double"
            | "decimal" | "utinyint" | "usmallint" | "uinteger" => Self::Number,
            "bigint" | "int64" | "hugeint" | "ubigint" | "uhugeint" => Self::BigInt,
            "varchar" | "string" | "text" | "uuid" => Self::Text,
            "date" => Self::Date,
            "time" => Self::Time,
            "timestamp" | "datetime" => Self::Timestamp,
            "timestamptz" | "timestamp with time zone" => Self::TimestampTz,
            "blob" => Self::Blob,
            "list" | "array" => Self::List,
            "struct" | "json" => Self::Struct,
            _ => Self::Other,
        }
    }
}

/// Decodes a wire result into rows of typed values, preserving row order.
pub fn decode_result(wire: &WireResult) -> Result<Table> {
    let columns: Vec<(&str, WireType)> = wire
        .meta
        .iter()
        .map(|col| (col.name.as_str(), WireType::parse(&col.type_tag)))
        .collect();

    wire.data
        .iter()
        .map(|cells| -> Result<Row> {
            let mut row = Row::with_capacity(columns.len());
            for (i, &(name, wire_type)) in columns.iter().enumerate() {
                // Short rows: absent cells decode as NULL.
                let cell = cells.get(i).unwrap_or(&Json::Null);
                let value = decode_cell(wire_type, cell)
                    .map_err(|e| HttpSqlError::decode(format!("column \"{name}\": {e}")))?;
                row.insert(name, value);
            }
            Ok(row)
        })
        .collect()
}

/// Converts one raw cell according to its column's wire type.
///
/// Only malformed embedded list/struct JSON fails. Scalar literals that do
/// not parse as their declared type (e.g. `infinity` timestamps) are kept
/// as text.
pub fn decode_cell(wire_type: WireType, cell: &Json) -> std::result::Result<Value, String> {
    if cell.is_null() {
        return Ok(Value::Null);
    }

    let value = match wire_type {
        WireType::Boolean => decode_bool(cell),
        WireType::Number => Some(Value::Number(decode_number(cell))),
        WireType::BigInt => decode_bigint(cell),
        WireType::Text => Some(Value::Text(json_to_text(cell))),
        WireType::Date => NaiveDate::parse_from_str(json_to_text(cell).trim(), "%Y-%m-%d")
            .ok()
            .map(Value::Date),
        WireType::Time => Some(Value::Time(json_to_text(cell))),
        WireType::Timestamp => parse_naive_timestamp(&json_to_text(cell)).map(Value::Timestamp),
        WireType::TimestampTz => parse_timestamptz(&json_to_text(cell)).map(Value::Timestamp),
        WireType::Blob => Some(decode_blob(cell)),
        WireType::List => {
            return match cell {
                Json::String(text) => parse_embedded(text).map(|v| match v {
                    Json::Array(items) => Value::List(items.iter().map(passthrough).collect()),
                    other => passthrough(&other),
                }),
                other => Ok(passthrough(other)),
            }
        }
        WireType::Struct => {
            return match cell {
                Json::String(text) => parse_embedded(text).map(|v| passthrough(&v)),
                other => Ok(passthrough(other)),
            }
        }
        WireType::Other => Some(passthrough(cell)),
    };

    Ok(value.unwrap_or_else(|| Value::Text(json_to_text(cell))))
}

fn decode_bool(cell: &Json) -> Option<Value> {
    match cell {
        Json::Bool(b) => Some(Value::Bool(*b)),
        Json::Number(n) => Some(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
        Json::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Some(Value::Bool(true)),
            "false" | "f" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

/// Lenient numeric coercion; unparseable input becomes NaN.
fn decode_number(cell: &Json) -> f64 {
    match cell {
        Json::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Json::Bool(b) => f64::from(u8::from(*b)),
        Json::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Builds the integer from its decimal text so no double rounding can occur.
/// Unquoted numbers keep their literal text (serde_json `arbitrary_precision`).
fn decode_bigint(cell: &Json) -> Option<Value> {
    let text = match cell {
        Json::Number(n) => n.to_string(),
        Json::String(s) => s.trim().to_string(),
        _ => return None,
    };

    text.parse::<BigInt>().ok().map(Value::BigInt)
}

/// Base64 text, an array of byte values, or the raw text as bytes.
fn decode_blob(cell: &Json) -> Value {
    match cell {
        Json::String(s) => {
            Value::Bytes(STANDARD.decode(s).unwrap_or_else(|_| s.clone().into_bytes()))
        }
        Json::Array(items) if items.iter().all(|i| i.as_u64().is_some_and(|b| b <= 255)) => {
            Value::Bytes(items.iter().filter_map(|i| i.as_u64()).map(|b| b as u8).collect())
        }
        other => Value::Bytes(other.to_string().into_bytes()),
    }
}

/// Reads `YYYY-MM-DD HH:MM:SS[.f]` (space or `T` separated) as UTC.
fn parse_naive_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let iso = text.trim().replacen(' ', "T", 1);
    NaiveDateTime::parse_from_str(&iso, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&iso, "%Y-%m-%dT%H:%M"))
        .map(|dt| dt.and_utc())
        .ok()
        .or_else(|| parse_timestamptz(text))
}

/// Reads a zone-aware timestamp: RFC 3339 or `YYYY-MM-DD HH:MM:SS[.f]+HH[:MM]`.
fn parse_timestamptz(text: &str) -> Option<DateTime<Utc>> {
    let iso = text.trim().replacen(' ', "T", 1);
    DateTime::parse_from_rfc3339(&iso)
        .or_else(|_| DateTime::parse_from_str(&iso, "%Y-%m-%dT%H:%M:%S%.f%#z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn parse_embedded(text: &str) -> std::result::Result<Json, String> {
    serde_json::from_str(text).map_err(|e| format!("malformed embedded JSON: {e}"))
}

/// Text coercion: strings as-is, everything else as its JSON text.
fn json_to_text(cell: &Json) -> String {
    match cell {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Maps a raw JSON value onto the nearest typed value without interpretation.
fn passthrough(cell: &Json) -> Value {
    match cell {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        Json::String(s) => Value::Text(s.clone()),
        Json::Array(items) => Value::List(items.iter().map(passthrough).collect()),
        Json::Object(fields) => Value::Struct(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), passthrough(v)))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}

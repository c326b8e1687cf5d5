//! SQL dialect support.
//!
//! Different databases spell the same query differently and store values
//! with different precision. A [`Dialect`] holds every rendering decision the
//! compiler delegates, plus the mapping from native type names to
//! [`SemanticType`]s and the value normalizations used for cross-database
//! comparison.

mod duckdb;

pub use duckdb::DuckDbDialect;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::ast::{Fractional, Row, SemanticType, Temporal, TypeClass, UuidKind, Value};
use crate::error::Result;
use crate::schema::DbPath;

/// Hex digits in an MD5 digest.
pub const MD5_HEXDIGITS: u32 = 32;
/// Hex digits of the MD5 digest kept for checksums.
pub const CHECKSUM_HEXDIGITS: u32 = 15;
/// Offset of the fractional seconds in `YYYY-MM-DD HH:MM:SS.ffffff`.
pub const TIMESTAMP_PRECISION_POS: u32 = 20;
/// Fractional-second digits assumed when the database reports none.
pub const DEFAULT_DATETIME_PRECISION: u32 = 6;
/// Float precision, in bits, assumed when the database reports none.
pub const DEFAULT_NUMERIC_PRECISION: u32 = 24;

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Quotes an identifier.
    fn quote(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        format!("{quote}{name}{quote}")
    }

    /// Casts a compiled expression to text.
    fn to_string(&self, expr: &str) -> String;

    /// Renders a type for DDL.
    fn type_repr(&self, ty: &SemanticType) -> String {
        base_type_repr(ty)
    }

    /// Renders the LIMIT/OFFSET clause.
    fn offset_limit(&self, offset: Option<u64>, limit: Option<u64>) -> String {
        match (limit, offset.filter(|o| *o > 0)) {
            (Some(limit), Some(offset)) => format!("LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!("LIMIT {limit}"),
            (None, Some(offset)) => format!("OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }

    /// Concatenates compiled text expressions.
    fn concat(&self, items: &[String]) -> String {
        format!("concat({})", items.join(", "))
    }

    fn random(&self) -> String {
        String::from("random()")
    }

    fn current_timestamp(&self) -> String {
        String::from("current_timestamp()")
    }

    /// Wraps a compiled query so the database explains it.
    fn explain_as_text(&self, query: &str) -> String {
        format!("EXPLAIN {query}")
    }

    fn is_distinct_from(&self, a: &str, b: &str) -> String {
        format!("{a} is distinct from {b}")
    }

    /// Renders a timestamp literal.
    fn timestamp_value(&self, t: &NaiveDateTime) -> String {
        format!("'{}'", t.format("%Y-%m-%d %H:%M:%S%.6f"))
    }

    /// Renders a binary literal.
    fn bytes_value(&self, bytes: &[u8]) -> String {
        let hex: String = bytes.iter().map(|byte| format!("{byte:02X}")).collect();
        format!("X'{hex}'")
    }

    /// Renders a literal value.
    fn literal(&self, value: &Value) -> String {
        match value {
            Value::Null => String::from("NULL"),
            Value::Bool(true) => String::from("TRUE"),
            Value::Bool(false) => String::from("FALSE"),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => {
                // Escape single quotes by doubling them
                let escaped = s.replace('\'', "''");
                format!("'{escaped}'")
            }
            Value::Timestamp(t) => self.timestamp_value(t),
            Value::Bytes(b) => self.bytes_value(b),
        }
    }

    /// Renders constant rows for an INSERT.
    fn constant_values(&self, rows: &[Row]) -> String {
        let rows: Vec<String> = rows
            .iter()
            .map(|row| {
                let values: Vec<String> = row.iter().map(|v| self.literal(v)).collect();
                format!("({})", values.join(", "))
            })
            .collect();
        format!("VALUES {}", rows.join(", "))
    }

    /// Maps a native type name onto a type class.
    fn type_class(&self, _native: &str) -> Option<TypeClass> {
        None
    }

    /// Converts a binary float precision into decimal digits.
    fn convert_db_precision_to_digits(&self, bits: u32) -> u32 {
        bits_to_digits(bits)
    }

    /// Whether timestamps round, rather than truncate, on precision loss.
    fn rounds_on_precision_loss(&self) -> bool {
        false
    }

    /// Maps a native column type onto a semantic type.
    ///
    /// Names without a type class become [`SemanticType::Unknown`].
    ///
    /// # Errors
    ///
    /// The provided implementation never fails. Dialects that parse
    /// parameterized type names may.
    fn parse_type(
        &self,
        path: &DbPath,
        column: &str,
        native: &str,
        datetime_precision: Option<u32>,
        numeric_precision: Option<u32>,
        numeric_scale: Option<u32>,
    ) -> Result<SemanticType> {
        parse_type_by_class(
            self,
            path,
            column,
            native,
            datetime_precision,
            numeric_precision,
            numeric_scale,
        )
    }

    fn supports_primary_key(&self) -> bool {
        false
    }

    fn supports_indexes(&self) -> bool {
        false
    }

    /// Table to select from when a query has no FROM clause, if required.
    fn placeholder_table(&self) -> Option<&'static str> {
        None
    }

    /// Statement switching the session to UTC.
    fn set_timezone_to_utc(&self) -> String;

    /// Computes the MD5 of a text expression as an integer, keeping
    /// [`CHECKSUM_HEXDIGITS`] hex digits.
    fn md5_as_int(&self, expr: &str) -> String;

    /// Renders a timestamp as `YYYY-MM-DD HH:MM:SS.ffffff`, cut to the
    /// type's precision and zero-padded to six fractional digits.
    fn normalize_timestamp(&self, value: &str, ty: &Temporal) -> String;

    /// Renders a number with exactly `ty.precision` fractional digits.
    fn normalize_number(&self, value: &str, ty: &Fractional) -> String;

    /// Renders a boolean as `0` or `1`.
    fn normalize_boolean(&self, value: &str) -> String {
        self.to_string(value)
    }

    /// Strips a UUID of surrounding artifacts.
    fn normalize_uuid(&self, value: &str, kind: UuidKind) -> String {
        match kind {
            UuidKind::Text => format!("TRIM({value})"),
            UuidKind::Native => self.to_string(value),
        }
    }

    /// Dispatches to the normalization for `ty`.
    fn normalize_value_by_type(&self, value: &str, ty: &SemanticType) -> String {
        match ty {
            SemanticType::Timestamp(t) | SemanticType::TimestampTz(t) => {
                self.normalize_timestamp(value, t)
            }
            SemanticType::Float(f) | SemanticType::Decimal(f) => self.normalize_number(value, f),
            SemanticType::Uuid(kind) => self.normalize_uuid(value, *kind),
            SemanticType::Boolean => self.normalize_boolean(value),
            SemanticType::Integer | SemanticType::Text | SemanticType::Unknown(_) => {
                self.to_string(value)
            }
        }
    }
}

/// Type names shared by most engines.
#[must_use]
pub fn base_type_repr(ty: &SemanticType) -> String {
    match ty {
        SemanticType::Integer => String::from("INT"),
        SemanticType::Float(_) => String::from("FLOAT"),
        SemanticType::Decimal(f) => format!("DECIMAL(38, {})", f.precision),
        SemanticType::Text | SemanticType::Uuid(UuidKind::Text) => String::from("VARCHAR"),
        SemanticType::Boolean => String::from("BOOLEAN"),
        SemanticType::Timestamp(_) => String::from("TIMESTAMP"),
        SemanticType::TimestampTz(t) => format!(
            "TIMESTAMP({})",
            t.precision.min(DEFAULT_DATETIME_PRECISION)
        ),
        SemanticType::Uuid(UuidKind::Native) => String::from("UUID"),
        SemanticType::Unknown(name) => name.clone(),
    }
}

/// Decimal digits representable by a binary precision: `floor(log10(2^bits))`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn bits_to_digits(bits: u32) -> u32 {
    (f64::from(bits) * 2_f64.log10()).floor() as u32
}

/// Maps a native type onto a semantic type through [`Dialect::type_class`].
///
/// Temporal types take the reported precision (default
/// [`DEFAULT_DATETIME_PRECISION`]), decimals take their scale (default 0)
/// and floats convert their binary precision (default
/// [`DEFAULT_NUMERIC_PRECISION`]) to digits.
///
/// # Errors
///
/// Never fails; the signature matches [`Dialect::parse_type`].
pub fn parse_type_by_class<D: Dialect + ?Sized>(
    dialect: &D,
    path: &DbPath,
    column: &str,
    native: &str,
    datetime_precision: Option<u32>,
    numeric_precision: Option<u32>,
    numeric_scale: Option<u32>,
) -> Result<SemanticType> {
    let Some(class) = dialect.type_class(native.trim()) else {
        debug!(table = %path, column, native, "Unknown column type");
        return Ok(SemanticType::Unknown(native.to_owned()));
    };
    let temporal = || Temporal {
        precision: datetime_precision.unwrap_or(DEFAULT_DATETIME_PRECISION),
        rounds: dialect.rounds_on_precision_loss(),
    };
    Ok(match class {
        TypeClass::Timestamp => SemanticType::Timestamp(temporal()),
        TypeClass::TimestampTz => SemanticType::TimestampTz(temporal()),
        TypeClass::Integer => SemanticType::Integer,
        TypeClass::Boolean => SemanticType::Boolean,
        TypeClass::Decimal => SemanticType::Decimal(Fractional {
            precision: numeric_scale.unwrap_or(0),
        }),
        TypeClass::Float => SemanticType::Float(Fractional {
            precision: dialect.convert_db_precision_to_digits(
                numeric_precision.unwrap_or(DEFAULT_NUMERIC_PRECISION),
            ),
        }),
        TypeClass::Text => SemanticType::Text,
        TypeClass::NativeUuid => SemanticType::Uuid(UuidKind::Native),
    })
}

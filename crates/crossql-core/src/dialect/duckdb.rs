//! DuckDB dialect.

use regex::Regex;

use super::{
    base_type_repr, bits_to_digits, parse_type_by_class, Dialect, CHECKSUM_HEXDIGITS, MD5_HEXDIGITS,
    TIMESTAMP_PRECISION_POS,
};
use crate::ast::{Fractional, SemanticType, Temporal, TypeClass, UuidKind};
use crate::error::{Error, Result};
use crate::schema::DbPath;

/// DuckDB dialect.
///
/// DuckDB reports float precision two digits higher than it round-trips, so
/// [`Dialect::convert_db_precision_to_digits`] subtracts two.
#[derive(Debug, Default, Clone, Copy)]
pub struct DuckDbDialect;

impl DuckDbDialect {
    /// Creates a new DuckDB dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for DuckDbDialect {
    fn name(&self) -> &'static str {
        "DuckDB"
    }

    fn to_string(&self, expr: &str) -> String {
        format!("{expr}::VARCHAR")
    }

    fn type_repr(&self, ty: &SemanticType) -> String {
        match ty {
            SemanticType::Integer => String::from("BIGINT"),
            SemanticType::Float(_) => String::from("DOUBLE"),
            SemanticType::TimestampTz(_) => String::from("TIMESTAMP WITH TIME ZONE"),
            SemanticType::Uuid(UuidKind::Native) => String::from("UUID"),
            _ => base_type_repr(ty),
        }
    }

    fn current_timestamp(&self) -> String {
        String::from("current_timestamp")
    }

    fn bytes_value(&self, bytes: &[u8]) -> String {
        let escaped: String = bytes.iter().map(|byte| format!("\\x{byte:02X}")).collect();
        format!("'{escaped}'::BLOB")
    }

    fn type_class(&self, native: &str) -> Option<TypeClass> {
        let class = match native.to_ascii_uppercase().as_str() {
            "TIMESTAMP WITH TIME ZONE" => TypeClass::TimestampTz,
            "TIMESTAMP" => TypeClass::Timestamp,
            "DOUBLE" | "FLOAT" => TypeClass::Float,
            "DECIMAL" => TypeClass::Decimal,
            "INTEGER" | "BIGINT" => TypeClass::Integer,
            "VARCHAR" | "TEXT" => TypeClass::Text,
            "UUID" => TypeClass::NativeUuid,
            "BOOLEAN" => TypeClass::Boolean,
            _ => return None,
        };
        Some(class)
    }

    fn convert_db_precision_to_digits(&self, bits: u32) -> u32 {
        bits_to_digits(bits).saturating_sub(2)
    }

    fn parse_type(
        &self,
        path: &DbPath,
        column: &str,
        native: &str,
        datetime_precision: Option<u32>,
        numeric_precision: Option<u32>,
        numeric_scale: Option<u32>,
    ) -> Result<SemanticType> {
        let decimal = Regex::new(r"(?i)^DECIMAL\((\d+),\s*(\d+)\)$")
            .map_err(|e| Error::Type(e.to_string()))?;
        if let Some(caps) = decimal.captures(native.trim()) {
            let precision = caps[2]
                .parse()
                .map_err(|e| Error::Type(format!("Invalid scale in {native}: {e}")))?;
            return Ok(SemanticType::Decimal(Fractional { precision }));
        }

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
        true
    }

    fn supports_indexes(&self) -> bool {
        true
    }

    fn set_timezone_to_utc(&self) -> String {
        String::from("SET GLOBAL TimeZone='UTC'")
    }

    fn md5_as_int(&self, expr: &str) -> String {
        let start = 1 + MD5_HEXDIGITS - CHECKSUM_HEXDIGITS;
        format!("('0x' || SUBSTRING(md5({expr}), {start},{CHECKSUM_HEXDIGITS}))::BIGINT")
    }

    fn normalize_timestamp(&self, value: &str, ty: &Temporal) -> String {
        if ty.rounds && ty.precision > 0 {
            return format!(
                "CONCAT(SUBSTRING(STRFTIME({value}::TIMESTAMP, '%Y-%m-%d %H:%M:%S.'),1,23), \
                 LPAD(((ROUND(strftime({value}::timestamp, '%f')::DECIMAL(15,7)/100000,{})*100000)::INT)::VARCHAR,6,'0'))",
                ty.precision - 1
            );
        }
        format!(
            "rpad(substring(strftime({value}::timestamp, '%Y-%m-%d %H:%M:%S.%f'),1,{}),26,'0')",
            TIMESTAMP_PRECISION_POS + ty.precision
        )
    }

    fn normalize_number(&self, value: &str, ty: &Fractional) -> String {
        self.to_string(&format!("{value}::DECIMAL(38, {})", ty.precision))
    }

    fn normalize_boolean(&self, value: &str) -> String {
        self.to_string(&format!("{value}::INTEGER"))
    }
}

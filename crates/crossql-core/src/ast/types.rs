//! Semantic column types and expression type inference.

use core::fmt;

use crate::error::{Error, Result};

/// Precision of a fractional number: digits after the decimal point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fractional {
    /// Number of significant fractional digits.
    pub precision: u32,
}

/// Precision of a temporal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Temporal {
    /// Number of fractional-second digits.
    pub precision: u32,
    /// Whether the engine rounds, rather than truncates, on precision loss.
    pub rounds: bool,
}

/// How a UUID is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UuidKind {
    /// A native UUID column.
    Native,
    /// A UUID held in a text column.
    Text,
}

/// Engine-independent classification of a column's value domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemanticType {
    /// Whole numbers.
    Integer,
    /// Binary floating point.
    Float(Fractional),
    /// Fixed-point decimal.
    Decimal(Fractional),
    /// Character strings.
    Text,
    /// Booleans.
    Boolean,
    /// Timestamp without time zone.
    Timestamp(Temporal),
    /// Timestamp with time zone.
    TimestampTz(Temporal),
    /// UUIDs.
    Uuid(UuidKind),
    /// A native type no dialect rule recognised.
    Unknown(String),
}

impl SemanticType {
    /// Returns the temporal precision for timestamp types.
    #[must_use]
    pub const fn temporal(&self) -> Option<&Temporal> {
        match self {
            Self::Timestamp(t) | Self::TimestampTz(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the fractional precision for float and decimal types.
    #[must_use]
    pub const fn fractional(&self) -> Option<&Fractional> {
        match self {
            Self::Float(f) | Self::Decimal(f) => Some(f),
            _ => None,
        }
    }

    /// Returns true for integer, float and decimal types.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float(_) | Self::Decimal(_))
    }

    /// Whether a host literal of type `literal` can stand in for this type.
    #[must_use]
    pub const fn accepts_literal(&self, literal: LiteralType) -> bool {
        matches!(
            (self, literal),
            (Self::Integer, LiteralType::Int)
                | (Self::Float(_) | Self::Decimal(_), LiteralType::Float)
                | (Self::Text | Self::Uuid(UuidKind::Text), LiteralType::Text)
                | (Self::Boolean, LiteralType::Bool)
                | (Self::Timestamp(_), LiteralType::Timestamp)
        )
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.write_str("Integer"),
            Self::Float(p) => write!(f, "Float(precision={})", p.precision),
            Self::Decimal(p) => write!(f, "Decimal(precision={})", p.precision),
            Self::Text => f.write_str("Text"),
            Self::Boolean => f.write_str("Boolean"),
            Self::Timestamp(t) => write!(f, "Timestamp(precision={}, rounds={})", t.precision, t.rounds),
            Self::TimestampTz(t) => {
                write!(f, "TimestampTZ(precision={}, rounds={})", t.precision, t.rounds)
            }
            Self::Uuid(UuidKind::Native) => f.write_str("Native_UUID"),
            Self::Uuid(UuidKind::Text) => f.write_str("String_UUID"),
            Self::Unknown(name) => write!(f, "Unknown({name})"),
        }
    }
}

/// The native-type classes a dialect maps type names onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    /// Timestamp without time zone.
    Timestamp,
    /// Timestamp with time zone.
    TimestampTz,
    /// Binary floating point.
    Float,
    /// Fixed-point decimal.
    Decimal,
    /// Whole numbers.
    Integer,
    /// Character strings.
    Text,
    /// Native UUID.
    NativeUuid,
    /// Booleans.
    Boolean,
}

/// Type of a host literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralType {
    /// Integer literal.
    Int,
    /// Floating-point literal.
    Float,
    /// String literal.
    Text,
    /// `TRUE` or `FALSE`.
    Bool,
    /// Timestamp literal.
    Timestamp,
    /// Binary literal.
    Bytes,
    /// `NULL`.
    Null,
}

/// The inferred type of an expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprType {
    /// A column-backed value.
    Semantic(SemanticType),
    /// A host literal.
    Literal(LiteralType),
    /// Not statically known (raw code, function calls, parameters).
    Unknown,
}

impl ExprType {
    /// Shorthand for the boolean semantic type.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::Semantic(SemanticType::Boolean)
    }

    /// Returns true for the NULL literal.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Literal(LiteralType::Null))
    }

    /// Returns true when the type is statically known.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown | Self::Semantic(SemanticType::Unknown(_)))
    }

    /// Returns the semantic type, if this is a column-backed type.
    #[must_use]
    pub const fn as_semantic(&self) -> Option<&SemanticType> {
        match self {
            Self::Semantic(t) => Some(t),
            _ => None,
        }
    }

    /// Whether two known types agree: equal semantic types, equal
    /// literal types, or a literal that a semantic type accepts.
    fn agrees_with(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Semantic(a), Self::Semantic(b)) => a == b,
            (Self::Semantic(s), Self::Literal(l)) | (Self::Literal(l), Self::Semantic(s)) => {
                s.accepts_literal(*l)
            }
            (Self::Literal(a), Self::Literal(b)) => a == b,
            _ => true,
        }
    }

    /// Merges a set of types that must agree, such as the branches of a
    /// CASE or the operands of an arithmetic operator.
    ///
    /// NULL literals and unknown types are compatible with anything. Other
    /// semantic types must be equal, precision included. A semantic type
    /// wins over a literal it accepts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Type`] when two known types disagree. `context`
    /// prefixes the message.
    pub fn unify<'a, I>(types: I, context: &str) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let types: Vec<&Self> = types.into_iter().collect();
        let known: Vec<&Self> = types
            .iter()
            .copied()
            .filter(|t| t.is_known() && !t.is_null())
            .collect();

        let representative = known
            .iter()
            .find(|t| matches!(t, Self::Semantic(_)))
            .or_else(|| known.first());
        if let Some(representative) = representative {
            if known.iter().any(|t| !t.agrees_with(representative)) {
                let names: Vec<String> = known.iter().map(|t| t.to_string()).collect();
                return Err(Error::Type(format!("{context}: {}", names.join(", "))));
            }
            return Ok((*representative).clone());
        }

        if types.iter().any(|t| !t.is_null()) {
            Ok(Self::Unknown)
        } else {
            Ok(Self::Literal(LiteralType::Null))
        }
    }
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Semantic(t) => t.fmt(f),
            Self::Literal(l) => write!(f, "{l:?}"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

impl From<SemanticType> for ExprType {
    fn from(t: SemanticType) -> Self {
        Self::Semantic(t)
    }
}

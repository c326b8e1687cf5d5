//! Expression nodes.

use std::sync::{Arc, OnceLock};

use super::identity::NoCompare;
use super::table::Table;
use super::types::{ExprType, LiteralType, SemanticType};
use super::value::Value;
use crate::error::{Error, Result};

/// Behaviour shared by every expression node.
pub trait ExprNode {
    /// Child expressions that name resolution descends into.
    ///
    /// The relation a column belongs to and embedded subqueries are not
    /// children.
    fn children(&self) -> Vec<&Expr>;

    /// Infers the type of the node without compiling it.
    ///
    /// # Errors
    ///
    /// Returns a type error when operand types disagree or a column's table
    /// has no schema.
    fn ty(&self) -> Result<ExprType>;
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Addition (+)
    Add,
    /// Subtraction (-)
    Sub,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// IS, used for NULL comparisons
    Is,
    /// LIKE
    Like,
    /// Logical AND
    And,
    /// Logical OR
    Or,
}

impl BinaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Is => "IS",
            Self::Like => "LIKE",
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Returns true for operators whose result has the operands' type.
    #[must_use]
    pub const fn is_arithmetic(&self) -> bool {
        matches!(self, Self::Add | Self::Sub)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
}

impl UnaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Neg => "-",
        }
    }
}

/// A column of a relation.
///
/// Two columns with the same name compare equal whichever relation they
/// were taken from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    source: NoCompare<Table>,
    name: String,
}

impl Column {
    pub(crate) fn new(source: Table, name: impl Into<String>) -> Self {
        Self {
            source: NoCompare(source),
            name: name.into(),
        }
    }

    /// The relation this column belongs to.
    #[must_use]
    pub fn source(&self) -> &Table {
        &self.source
    }

    /// The column name, in its declared casing.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up the column's type in its relation's schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaRequired`] when the relation has no schema.
    pub fn semantic_type(&self) -> Result<SemanticType> {
        let schema = self
            .source
            .schema()?
            .ok_or_else(|| Error::SchemaRequired(self.source.label()))?;
        schema
            .get(&self.name)
            .cloned()
            .ok_or_else(|| Error::UnknownColumn {
                table: self.source.label(),
                column: self.name.clone(),
            })
    }
}

/// A column placeholder, bound once to a concrete column.
#[derive(Debug)]
pub struct UnresolvedColumn {
    name: String,
    resolved: OnceLock<Expr>,
}

impl UnresolvedColumn {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resolved: OnceLock::new(),
        }
    }

    /// The name to resolve.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound expression, if resolution happened.
    #[must_use]
    pub fn resolved(&self) -> Option<&Expr> {
        self.resolved.get()
    }

    /// Binds the placeholder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyResolved`] if it was bound before.
    pub fn bind(&self, expr: Expr) -> Result<()> {
        self.resolved
            .set(expr)
            .map_err(|_| Error::AlreadyResolved(self.name.clone()))
    }

    /// Returns the bound expression.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unresolved`] if the placeholder was never bound.
    pub fn get(&self) -> Result<&Expr> {
        self.resolved
            .get()
            .ok_or_else(|| Error::Unresolved(self.name.clone()))
    }
}

impl PartialEq for UnresolvedColumn {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.resolved.get() == other.resolved.get()
    }
}

impl Eq for UnresolvedColumn {}

impl core::hash::Hash for UnresolvedColumn {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// `expr AS name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Alias {
    pub expr: Expr,
    pub name: String,
}

/// NULL-safe concatenation of the text forms of `exprs`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Concat {
    pub exprs: Vec<Expr>,
    pub sep: Option<String>,
}

/// `count(*)`, `count(expr)` or `count(distinct expr)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Count {
    pub expr: Option<Expr>,
    pub distinct: bool,
}

/// A function call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Func {
    pub name: String,
    pub args: Vec<Expr>,
}

/// One `WHEN .. THEN ..` branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WhenThen {
    pub when: Expr,
    pub then: Expr,
}

/// `CASE WHEN .. THEN .. [ELSE ..] END`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CaseWhen {
    pub cases: Vec<WhenThen>,
    pub else_expr: Option<Expr>,
}

impl CaseWhen {
    /// Infers the common type of every branch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Type`] when the branches disagree.
    pub fn branch_type(&self) -> Result<ExprType> {
        let types = self
            .cases
            .iter()
            .map(|case| &case.then)
            .chain(self.else_expr.as_ref())
            .map(ExprNode::ty)
            .collect::<Result<Vec<_>>>()?;
        ExprType::unify(&types, "Non-matching types in when")
    }
}

/// `a is distinct from b`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IsDistinctFrom {
    pub a: Expr,
    pub b: Expr,
}

/// An n-ary operator application, joined by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinOp {
    pub op: BinaryOp,
    pub args: Vec<Expr>,
}

/// A prefix operator application.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Unary {
    pub op: UnaryOp,
    pub expr: Expr,
}

/// `expr IN (list)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct In {
    pub expr: Expr,
    pub list: Vec<Expr>,
}

/// `cast(expr as type)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cast {
    pub expr: Expr,
    pub target: SemanticType,
}

/// A scalar expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// A literal value.
    Value(Value),
    /// Raw SQL, emitted verbatim.
    Code(String),
    /// A column of a relation.
    Column(Column),
    /// A placeholder created by [`this`](crate::builder::this).
    Unresolved(Arc<UnresolvedColumn>),
    /// `expr AS name`.
    Alias(Arc<Alias>),
    /// NULL-safe text concatenation.
    Concat(Arc<Concat>),
    /// `count(*)`, `count(expr)` or `count(distinct expr)`.
    Count(Arc<Count>),
    /// A function call.
    Func(Arc<Func>),
    /// `CASE WHEN .. END`.
    Case(Arc<CaseWhen>),
    /// `a is distinct from b`.
    IsDistinctFrom(Arc<IsDistinctFrom>),
    /// A binary operation.
    BinOp(Arc<BinOp>),
    /// A unary operation.
    UnaryOp(Arc<Unary>),
    /// `expr IN (list)`.
    In(Arc<In>),
    /// `cast(expr as type)`.
    Cast(Arc<Cast>),
    /// The dialect's random number.
    Random,
    /// The dialect's current timestamp.
    CurrentTimestamp,
    /// A value supplied at compile time.
    Param(String),
    /// A relation in expression position.
    Subquery(Table),
}

impl Expr {
    /// The output name of the expression, for columns and aliases.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Column(c) => Some(c.name()),
            Self::Alias(a) => Some(&a.name),
            Self::Unresolved(u) => u.resolved().and_then(Self::name),
            _ => None,
        }
    }

    /// Returns true for the NULL literal.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Value(Value::Null))
    }

    /// All nodes of the tree, depth first, starting with `self`.
    #[must_use]
    pub fn walk(&self) -> Vec<&Self> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children().into_iter().rev());
        }
        out
    }
}

impl ExprNode for Expr {
    fn children(&self) -> Vec<&Expr> {
        match self {
            Self::Value(_)
            | Self::Code(_)
            | Self::Column(_)
            | Self::Unresolved(_)
            | Self::Random
            | Self::CurrentTimestamp
            | Self::Param(_)
            | Self::Subquery(_) => Vec::new(),
            Self::Alias(a) => vec![&a.expr],
            Self::Concat(c) => c.exprs.iter().collect(),
            Self::Count(c) => c.expr.iter().collect(),
            Self::Func(f) => f.args.iter().collect(),
            Self::Case(c) => c
                .cases
                .iter()
                .flat_map(|case| [&case.when, &case.then])
                .chain(c.else_expr.as_ref())
                .collect(),
            Self::IsDistinctFrom(d) => vec![&d.a, &d.b],
            Self::BinOp(b) => b.args.iter().collect(),
            Self::UnaryOp(u) => vec![&u.expr],
            Self::In(i) => core::iter::once(&i.expr).chain(&i.list).collect(),
            Self::Cast(c) => vec![&c.expr],
        }
    }

    fn ty(&self) -> Result<ExprType> {
        match self {
            Self::Value(v) => Ok(ExprType::Literal(v.literal_type())),
            Self::Code(_) | Self::Func(_) | Self::Param(_) | Self::Subquery(_) => {
                Ok(ExprType::Unknown)
            }
            Self::Column(c) => c.semantic_type().map(ExprType::Semantic),
            Self::Unresolved(u) => u.get()?.ty(),
            Self::Alias(a) => a.expr.ty(),
            Self::Concat(_) => Ok(ExprType::Semantic(SemanticType::Text)),
            Self::Count(_) => Ok(ExprType::Semantic(SemanticType::Integer)),
            Self::Case(c) => c.branch_type(),
            Self::IsDistinctFrom(_) | Self::In(_) => Ok(ExprType::boolean()),
            Self::BinOp(b) => {
                if b.op.is_arithmetic() {
                    let types = b.args.iter().map(Self::ty).collect::<Result<Vec<_>>>()?;
                    ExprType::unify(&types, "Expected all args to have the same type")
                } else {
                    Ok(ExprType::boolean())
                }
            }
            Self::UnaryOp(u) => u.expr.ty(),
            Self::Cast(c) => Ok(ExprType::Semantic(c.target.clone())),
            Self::Random => Ok(ExprType::Literal(LiteralType::Float)),
            Self::CurrentTimestamp => Ok(ExprType::Literal(LiteralType::Timestamp)),
        }
    }
}

macro_rules! impl_from_literal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expr {
                fn from(v: $ty) -> Self {
                    Self::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_from_literal!(bool, i64, i32, u32, f64, String, &str, chrono::NaiveDateTime, Vec<u8>);

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<Column> for Expr {
    fn from(c: Column) -> Self {
        Self::Column(c)
    }
}

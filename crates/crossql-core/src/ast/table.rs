//! Relation nodes: anything that produces a row set.

use std::sync::Arc;

use super::expression::{Column, Expr, ExprNode};
use super::identity::{NoCompare, RelationId};
use super::types::{ExprType, LiteralType, SemanticType};
use crate::error::{Error, Result};
use crate::schema::{DbPath, Schema};

/// A leaf relation addressed by path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TablePath {
    id: NoCompare<RelationId>,
    pub path: DbPath,
    pub schema: Option<Schema>,
}

impl TablePath {
    /// Creates a table path node.
    #[must_use]
    pub fn new(path: DbPath, schema: Option<Schema>) -> Self {
        Self {
            id: NoCompare(RelationId::fresh()),
            path,
            schema,
        }
    }

    /// Returns a new node for the same path with the given schema.
    #[must_use]
    pub fn with_schema(&self, schema: Schema) -> Self {
        Self::new(self.path.clone(), Some(schema))
    }

    #[must_use]
    pub fn id(&self) -> RelationId {
        *self.id
    }
}

/// `source AS name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableAlias {
    id: NoCompare<RelationId>,
    pub source: Table,
    pub name: String,
}

impl TableAlias {
    #[must_use]
    pub fn new(source: Table, name: impl Into<String>) -> Self {
        Self {
            id: NoCompare(RelationId::fresh()),
            source,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> RelationId {
        *self.id
    }

    /// Whether a column of `relation` is reachable through this alias.
    #[must_use]
    pub fn covers(&self, relation: RelationId) -> bool {
        self.id() == relation || self.source.id() == relation
    }
}

/// Join flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinKind {
    /// `JOIN`
    #[default]
    Inner,
    /// `LEFT JOIN`
    Left,
    /// `RIGHT JOIN`
    Right,
    /// `FULL OUTER JOIN`
    FullOuter,
}

impl JoinKind {
    /// The keyword placed before `JOIN`, if any.
    #[must_use]
    pub const fn keyword(&self) -> Option<&'static str> {
        match self {
            Self::Inner => None,
            Self::Left => Some("LEFT"),
            Self::Right => Some("RIGHT"),
            Self::FullOuter => Some("FULL OUTER"),
        }
    }
}

/// A join of several relations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Join {
    id: NoCompare<RelationId>,
    pub sources: Vec<Table>,
    pub kind: JoinKind,
    pub on: Vec<Expr>,
    pub columns: Option<Vec<Expr>>,
}

impl Join {
    #[must_use]
    pub fn new(sources: Vec<Table>, kind: JoinKind) -> Self {
        Self {
            id: NoCompare(RelationId::fresh()),
            sources,
            kind,
            on: Vec::new(),
            columns: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> RelationId {
        *self.id
    }

    pub(crate) fn with_on(&self, exprs: Vec<Expr>) -> Self {
        let mut on = self.on.clone();
        on.extend(exprs);
        Self {
            id: NoCompare(RelationId::fresh()),
            on,
            ..self.clone()
        }
    }

    pub(crate) fn with_columns(&self, columns: Vec<Expr>) -> Self {
        Self {
            id: NoCompare(RelationId::fresh()),
            columns: Some(columns),
            ..self.clone()
        }
    }

    /// Finds the single joined relation that provides `name`.
    ///
    /// A source whose schema cannot be computed, such as a nested join
    /// without selected columns, fails the lookup.
    fn source_column(&self, name: &str) -> Result<Column> {
        let mut found = Vec::new();
        let mut unknown = Vec::new();
        for source in &self.sources {
            match source.schema()? {
                Some(schema) => {
                    if let Some(key) = schema.get_key(name) {
                        found.push(Column::new(source.clone(), key));
                    }
                }
                None => unknown.push(source),
            }
        }
        match (found.len(), unknown.len()) {
            (1, _) => Ok(found.remove(0)),
            (0, 1) => Ok(Column::new(unknown[0].clone(), name)),
            (0, 0) => Err(Error::UnknownColumn {
                table: String::from("join"),
                column: String::from(name),
            }),
            _ => Err(Error::AmbiguousColumn(String::from(name))),
        }
    }
}

/// `SELECT keys, values FROM table GROUP BY keys [HAVING ..]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupBy {
    id: NoCompare<RelationId>,
    pub table: Table,
    pub keys: Vec<Expr>,
    pub values: Vec<Expr>,
    pub having: Vec<Expr>,
}

impl GroupBy {
    /// Creates a group-by node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Builder`] when both `keys` and `values` are empty.
    pub fn new(table: Table, keys: Vec<Expr>, values: Vec<Expr>) -> Result<Self> {
        if keys.is_empty() && values.is_empty() {
            return Err(Error::Builder(String::from(
                "GROUP BY requires at least one key or value",
            )));
        }
        Ok(Self {
            id: NoCompare(RelationId::fresh()),
            table,
            keys,
            values,
            having: Vec::new(),
        })
    }

    #[must_use]
    pub fn id(&self) -> RelationId {
        *self.id
    }

    pub(crate) fn with_having(&self, exprs: Vec<Expr>) -> Self {
        let mut having = self.having.clone();
        having.extend(exprs);
        Self {
            id: NoCompare(RelationId::fresh()),
            having,
            ..self.clone()
        }
    }

    /// Output columns: keys followed by values.
    pub fn output_columns(&self) -> impl Iterator<Item = &Expr> {
        self.keys.iter().chain(&self.values)
    }
}

/// Set operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOp {
    /// `UNION`
    Union,
    /// `UNION ALL`
    UnionAll,
    /// `EXCEPT`
    Except,
    /// `INTERSECT`
    Intersect,
}

impl SetOp {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::UnionAll => "UNION ALL",
            Self::Except => "EXCEPT",
            Self::Intersect => "INTERSECT",
        }
    }
}

/// `left OP right`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableOp {
    id: NoCompare<RelationId>,
    pub op: SetOp,
    pub left: Table,
    pub right: Table,
}

impl TableOp {
    #[must_use]
    pub fn new(op: SetOp, left: Table, right: Table) -> Self {
        Self {
            id: NoCompare(RelationId::fresh()),
            op,
            left,
            right,
        }
    }

    #[must_use]
    pub fn id(&self) -> RelationId {
        *self.id
    }
}

/// A SELECT query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Select {
    id: NoCompare<RelationId>,
    pub table: Option<Table>,
    pub columns: Option<Vec<Expr>>,
    pub where_exprs: Vec<Expr>,
    pub order_by: Vec<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Vec<Expr>,
    pub limit: Option<u64>,
    pub distinct: bool,
}

/// Clauses layered onto a relation by [`Select::make`].
#[derive(Debug, Clone, Default)]
pub(crate) struct SelectParts {
    pub columns: Option<Vec<Expr>>,
    pub where_exprs: Vec<Expr>,
    pub order_by: Vec<Expr>,
    pub limit: Option<u64>,
    pub distinct: Option<bool>,
}

impl Select {
    /// Creates `SELECT * FROM table`, or a table-less select.
    #[must_use]
    pub fn new(table: Option<Table>) -> Self {
        Self {
            id: NoCompare(RelationId::fresh()),
            table,
            columns: None,
            where_exprs: Vec::new(),
            order_by: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            limit: None,
            distinct: false,
        }
    }

    /// Creates a table-less `SELECT columns`.
    #[must_use]
    pub fn columns_only(columns: Vec<Expr>) -> Self {
        Self {
            columns: Some(columns),
            ..Self::new(None)
        }
    }

    #[must_use]
    pub fn id(&self) -> RelationId {
        *self.id
    }

    /// Returns a copy under a new identity.
    pub(crate) fn derive(&self) -> Self {
        Self {
            id: NoCompare(RelationId::fresh()),
            ..self.clone()
        }
    }

    fn wrap(table: Table, parts: SelectParts) -> Self {
        Self {
            columns: parts.columns,
            where_exprs: parts.where_exprs,
            order_by: parts.order_by,
            limit: parts.limit,
            distinct: parts.distinct.unwrap_or(false),
            ..Self::new(Some(table))
        }
    }

    /// Layers clauses onto `table`.
    ///
    /// A plain select without LIMIT or GROUP BY absorbs the new clauses
    /// instead of being nested. WHERE is additive. A clause the receiver
    /// already sets, or un-setting DISTINCT, nests a new select.
    pub(crate) fn make(table: Table, parts: SelectParts) -> Table {
        let Table::Select(existing) = &table else {
            return Self::wrap(table, parts).into();
        };

        let undistinct = parts.distinct == Some(false) && existing.distinct;
        let sealed = existing.limit.is_some() || !existing.group_by.is_empty();
        let conflict = (parts.columns.is_some() && existing.columns.is_some())
            || (!parts.order_by.is_empty() && !existing.order_by.is_empty());
        if undistinct || sealed || conflict {
            return Self::wrap(table, parts).into();
        }

        let mut merged = existing.derive();
        if parts.columns.is_some() {
            merged.columns = parts.columns;
        }
        merged.where_exprs.extend(parts.where_exprs);
        if !parts.order_by.is_empty() {
            merged.order_by = parts.order_by;
        }
        if parts.limit.is_some() {
            merged.limit = parts.limit;
        }
        if let Some(distinct) = parts.distinct {
            merged.distinct = distinct;
        }
        merged.into()
    }
}

/// A common table expression, hoisted into a WITH clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cte {
    id: NoCompare<RelationId>,
    pub source: Table,
    pub name: Option<String>,
    pub params: Option<Vec<String>>,
}

impl Cte {
    #[must_use]
    pub fn new(source: Table, name: Option<String>, params: Option<Vec<String>>) -> Self {
        Self {
            id: NoCompare(RelationId::fresh()),
            source,
            name,
            params,
        }
    }

    #[must_use]
    pub fn id(&self) -> RelationId {
        *self.id
    }
}

/// A relation supplied at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableParam {
    id: NoCompare<RelationId>,
    pub name: String,
}

impl TableParam {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NoCompare(RelationId::fresh()),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> RelationId {
        *self.id
    }
}

/// A relation node.
///
/// Cloning is cheap and keeps the node's identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Table {
    /// A named table.
    Path(Arc<TablePath>),
    /// An aliased relation.
    Alias(Arc<TableAlias>),
    /// A join.
    Join(Arc<Join>),
    /// A grouping.
    GroupBy(Arc<GroupBy>),
    /// A set operation.
    Op(Arc<TableOp>),
    /// A SELECT query.
    Select(Arc<Select>),
    /// A common table expression.
    Cte(Arc<Cte>),
    /// A relation supplied at compile time.
    Param(Arc<TableParam>),
}

impl Table {
    /// Identity of the node.
    #[must_use]
    pub fn id(&self) -> RelationId {
        match self {
            Self::Path(t) => t.id(),
            Self::Alias(t) => t.id(),
            Self::Join(t) => t.id(),
            Self::GroupBy(t) => t.id(),
            Self::Op(t) => t.id(),
            Self::Select(t) => t.id(),
            Self::Cte(t) => t.id(),
            Self::Param(t) => t.id(),
        }
    }

    /// Short human-readable name for error messages.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Path(t) => t.path.to_string(),
            Self::Alias(t) => t.name.clone(),
            Self::Join(_) => String::from("<join>"),
            Self::GroupBy(_) => String::from("<group by>"),
            Self::Op(t) => format!("<{}>", t.op.as_str()),
            Self::Select(_) => String::from("<select>"),
            Self::Cte(t) => t.name.clone().unwrap_or_else(|| String::from("<cte>")),
            Self::Param(t) => format!("<param {}>", t.name),
        }
    }

    /// The relation's columns and types, when known.
    ///
    /// # Errors
    ///
    /// Fails for a join without selected columns, for set operations whose
    /// sides differ in width, and when a selected column has no name.
    pub fn schema(&self) -> Result<Option<Schema>> {
        match self {
            Self::Path(t) => Ok(t.schema.clone()),
            Self::Alias(t) => t.source.schema(),
            Self::Cte(t) => t.source.schema(),
            Self::Param(_) => Ok(None),
            Self::Join(j) => {
                let columns = j.columns.as_ref().ok_or_else(|| {
                    Error::Builder(String::from(
                        "Join schema requires selected columns (SELECT * is not supported)",
                    ))
                })?;
                let base = match j.sources.first() {
                    Some(first) => first.schema()?,
                    None => None,
                };
                match base {
                    Some(base) => columns_schema(columns, base).map(Some),
                    None => Ok(None),
                }
            }
            Self::GroupBy(g) => match g.table.schema()? {
                Some(base) => {
                    let columns: Vec<Expr> = g.output_columns().cloned().collect();
                    columns_schema(&columns, base).map(Some)
                }
                None => Ok(None),
            },
            Self::Op(op) => {
                let left = op.left.schema()?;
                if let (Some(l), Some(r)) = (&left, op.right.schema()?) {
                    if l.len() != r.len() {
                        return Err(Error::Type(format!(
                            "{} requires both sides to have the same number of columns ({} vs {})",
                            op.op.as_str(),
                            l.len(),
                            r.len()
                        )));
                    }
                }
                Ok(left)
            }
            Self::Select(s) => {
                let base = match &s.table {
                    Some(t) => t.schema()?,
                    None => None,
                };
                match (base, &s.columns) {
                    (Some(base), Some(columns)) => columns_schema(columns, base).map(Some),
                    (base, _) => Ok(base),
                }
            }
        }
    }

    /// The relation that bare names in builder arguments bind against.
    #[must_use]
    pub fn resolution_source(&self) -> &Self {
        match self {
            Self::Alias(t) => &t.source,
            Self::Cte(t) => &t.source,
            _ => self,
        }
    }

    /// Looks up a column of this relation.
    ///
    /// With a schema, the name is matched according to the schema's case
    /// mode and the declared casing is kept. Without one, any name is
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownColumn`] when the schema lacks the column, and
    /// [`Error::AmbiguousColumn`] when several joined relations provide it.
    pub fn get_column(&self, name: &str) -> Result<Column> {
        match self {
            Self::Join(j) if j.columns.is_none() => j.source_column(name),
            Self::Select(s) if s.columns.is_none() => {
                let name = match &s.table {
                    Some(t) => t.get_column(name)?.name().to_owned(),
                    None => name.to_owned(),
                };
                Ok(Column::new(self.clone(), name))
            }
            _ => {
                let name = match self.schema()? {
                    Some(schema) => schema
                        .get_key(name)
                        .ok_or_else(|| Error::UnknownColumn {
                            table: self.label(),
                            column: name.to_owned(),
                        })?
                        .to_owned(),
                    None => name.to_owned(),
                };
                Ok(Column::new(self.clone(), name))
            }
        }
    }
}

fn columns_schema(columns: &[Expr], base: Schema) -> Result<Schema> {
    let mut schema = base.new_like();
    for (i, column) in columns.iter().enumerate() {
        let name = column.name().ok_or_else(|| {
            Error::Type(format!(
                "Selected column {} has no name; give it an alias",
                i + 1
            ))
        })?;
        schema.insert(name, semantic_of(column.ty()?));
    }
    Ok(schema)
}

fn semantic_of(ty: ExprType) -> SemanticType {
    match ty {
        ExprType::Semantic(t) => t,
        ExprType::Literal(LiteralType::Int) => SemanticType::Integer,
        ExprType::Literal(LiteralType::Text) => SemanticType::Text,
        ExprType::Literal(LiteralType::Bool) => SemanticType::Boolean,
        ExprType::Literal(l) => SemanticType::Unknown(format!("{l:?}")),
        ExprType::Unknown => SemanticType::Unknown(String::new()),
    }
}

macro_rules! impl_into_table {
    ($($node:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$node> for Table {
                fn from(node: $node) -> Self {
                    Self::$variant(Arc::new(node))
                }
            }
        )*
    };
}

impl_into_table!(
    TablePath => Path,
    TableAlias => Alias,
    Join => Join,
    GroupBy => GroupBy,
    TableOp => Op,
    Select => Select,
    Cte => Cte,
    TableParam => Param,
);

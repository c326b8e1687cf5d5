//! Query IR: expressions, relations and statements.

mod expression;
mod identity;
mod statement;
mod table;
mod types;
mod value;

pub use expression::{
    Alias, BinOp, BinaryOp, Cast, CaseWhen, Column, Concat, Count, Expr, ExprNode, Func, In,
    IsDistinctFrom, Unary, UnaryOp, UnresolvedColumn, WhenThen,
};
pub use identity::{NoCompare, RelationId};
pub use statement::{
    CreateTable, DropTable, Explain, InsertSource, InsertToTable, Node, Statement, TruncateTable,
};
pub(crate) use table::SelectParts;
pub use table::{
    Cte, GroupBy, Join, JoinKind, Select, SetOp, Table, TableAlias, TableOp, TableParam, TablePath,
};
pub use types::{ExprType, Fractional, LiteralType, SemanticType, Temporal, TypeClass, UuidKind};
pub use value::{Row, Value};

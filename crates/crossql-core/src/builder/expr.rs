//! Expression algebra.

use std::sync::Arc;

use crate::ast::{
    Alias, BinOp, BinaryOp, Cast, Count, Expr, Func, In, IsDistinctFrom, SemanticType, Unary,
    UnaryOp,
};

impl Expr {
    fn binary(self, op: BinaryOp, other: impl Into<Self>) -> Self {
        Self::BinOp(Arc::new(BinOp {
            op,
            args: vec![self, other.into()],
        }))
    }

    /// `self + other`
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn add(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Add, other)
    }

    /// `self - other`
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Sub, other)
    }

    /// `-self`
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn neg(self) -> Self {
        Self::UnaryOp(Arc::new(Unary {
            op: UnaryOp::Neg,
            expr: self,
        }))
    }

    #[must_use]
    pub fn gt(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Gt, other)
    }

    #[must_use]
    pub fn ge(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Ge, other)
    }

    /// `self = other`, or `self IS NULL` when `other` is NULL.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn eq(self, other: impl Into<Self>) -> Self {
        let other = other.into();
        if other.is_null() {
            self.binary(BinaryOp::Is, other)
        } else {
            self.binary(BinaryOp::Eq, other)
        }
    }

    #[must_use]
    pub fn lt(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Lt, other)
    }

    #[must_use]
    pub fn le(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Le, other)
    }

    #[must_use]
    pub fn and(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::And, other)
    }

    #[must_use]
    pub fn or(self, other: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Or, other)
    }

    #[must_use]
    pub fn like(self, pattern: impl Into<Self>) -> Self {
        self.binary(BinaryOp::Like, pattern)
    }

    /// NULL-safe inequality.
    #[must_use]
    pub fn is_distinct_from(self, other: impl Into<Self>) -> Self {
        Self::IsDistinctFrom(Arc::new(IsDistinctFrom {
            a: self,
            b: other.into(),
        }))
    }

    /// `self IN (list)`
    #[must_use]
    pub fn in_list<I, E>(self, list: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Self>,
    {
        Self::In(Arc::new(In {
            expr: self,
            list: list.into_iter().map(Into::into).collect(),
        }))
    }

    #[must_use]
    pub fn cast_to(self, target: SemanticType) -> Self {
        Self::Cast(Arc::new(Cast { expr: self, target }))
    }

    /// `self AS name`
    #[must_use]
    pub fn alias(self, name: impl Into<String>) -> Self {
        Self::Alias(Arc::new(Alias {
            expr: self,
            name: name.into(),
        }))
    }

    #[must_use]
    pub fn sum(self) -> Self {
        Self::Func(Arc::new(Func {
            name: String::from("SUM"),
            args: vec![self],
        }))
    }

    #[must_use]
    pub fn count(self) -> Self {
        Self::Count(Arc::new(Count {
            expr: Some(self),
            distinct: false,
        }))
    }

    #[must_use]
    pub fn count_distinct(self) -> Self {
        Self::Count(Arc::new(Count {
            expr: Some(self),
            distinct: true,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprNode, ExprType, Fractional, LiteralType, Table, TablePath, Value};
    use crate::error::Error;
    use crate::schema::{DbPath, Schema};

    fn prices() -> Table {
        let schema = Schema::case_sensitive()
            .with_column("qty", SemanticType::Integer)
            .with_column("price", SemanticType::Decimal(Fractional { precision: 2 }));
        TablePath::new(DbPath::parse("prices").unwrap(), Some(schema)).into()
    }

    #[test]
    fn test_eq_null_builds_is() {
        let e = Expr::from(1).eq(Value::Null);
        assert!(matches!(e, Expr::BinOp(ref b) if b.op == BinaryOp::Is));
        let e = Expr::from(1).eq(2);
        assert!(matches!(e, Expr::BinOp(ref b) if b.op == BinaryOp::Eq));
    }

    #[test]
    fn test_comparison_is_boolean() {
        let e = Expr::from(1).gt(2).and(Expr::from("a").like("b%"));
        assert_eq!(e.ty().unwrap(), ExprType::boolean());
        assert_eq!(Expr::from(1).in_list([1, 2, 3]).ty().unwrap(), ExprType::boolean());
    }

    #[test]
    fn test_arithmetic_types_must_match() {
        assert_eq!(
            Expr::from(1).add(2).ty().unwrap(),
            ExprType::Literal(LiteralType::Int)
        );
        assert!(Expr::from(1).add(2.5).ty().is_err());
        let err = Expr::from(1).add("a").ty().unwrap_err();
        assert!(matches!(err, Error::Type(msg) if msg.starts_with("Expected all args to have the same type")));
    }

    #[test]
    fn test_arithmetic_over_columns_of_different_types() {
        let t = prices();
        let qty = Expr::from(t.get_column("qty").unwrap());
        let price = Expr::from(t.get_column("price").unwrap());
        assert!(matches!(qty.clone().add(price.clone()).ty(), Err(Error::Type(_))));
        assert_eq!(
            qty.add(1).ty().unwrap(),
            ExprType::Semantic(SemanticType::Integer)
        );
        assert_eq!(
            price.sub(0.5).ty().unwrap(),
            ExprType::Semantic(SemanticType::Decimal(Fractional { precision: 2 }))
        );
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(
            Expr::from(1).count().ty().unwrap(),
            ExprType::Semantic(SemanticType::Integer)
        );
        let e = Expr::from(1).alias("one");
        assert_eq!(e.name(), Some("one"));
        assert_eq!(
            Expr::from(1).cast_to(SemanticType::Text).ty().unwrap(),
            ExprType::Semantic(SemanticType::Text)
        );
    }
}

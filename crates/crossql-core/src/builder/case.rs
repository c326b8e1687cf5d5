//! Fluent `CASE WHEN` construction.

use std::sync::Arc;

use crate::ast::{BinOp, BinaryOp, CaseWhen, Expr, ExprNode, ExprType, WhenThen};
use crate::error::{Error, Result};

use super::resolve::present;

/// A `CASE` with a pending `WHEN`, waiting for its `THEN`.
#[derive(Debug, Clone)]
pub struct When {
    case: CaseWhen,
    when: Expr,
}

impl When {
    /// Completes the branch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Type`] when every branch type is known and they
    /// disagree.
    pub fn then(self, then: impl Into<Expr>) -> Result<CaseWhen> {
        let mut case = self.case;
        case.cases.push(WhenThen {
            when: self.when,
            then: then.into(),
        });
        check_branches(&case)?;
        Ok(case)
    }
}

impl CaseWhen {
    /// Opens a new branch. Several predicates are AND-ed together.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Builder`] when no predicate is left after dropping
    /// skipped ones.
    pub fn when<I, E>(&self, predicates: I) -> Result<When>
    where
        I: IntoIterator<Item = E>,
        E: Into<Option<Expr>>,
    {
        let mut predicates = present(predicates);
        let when = match predicates.len() {
            0 => return Err(Error::Builder(String::from("Expected valid whens"))),
            1 => predicates.remove(0),
            _ => Expr::BinOp(Arc::new(BinOp {
                op: BinaryOp::And,
                args: predicates,
            })),
        };
        Ok(When {
            case: self.clone(),
            when,
        })
    }

    /// Sets the `ELSE` branch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Builder`] if an `ELSE` was already given, and
    /// [`Error::Type`] on a branch type mismatch.
    pub fn else_(&self, otherwise: impl Into<Expr>) -> Result<Self> {
        if self.else_expr.is_some() {
            return Err(Error::Builder(String::from(
                "Else clause already specified",
            )));
        }
        let case = Self {
            cases: self.cases.clone(),
            else_expr: Some(otherwise.into()),
        };
        check_branches(&case)?;
        Ok(case)
    }
}

// Branches whose type cannot be inferred yet (unbound placeholders,
// schema-less columns) postpone the check to `ty()`.
fn check_branches(case: &CaseWhen) -> Result<()> {
    let types: Option<Vec<ExprType>> = case
        .cases
        .iter()
        .map(|c| &c.then)
        .chain(case.else_expr.as_ref())
        .map(|e| e.ty().ok())
        .collect();
    match types {
        Some(types) => ExprType::unify(&types, "Non-matching types in when").map(|_| ()),
        None => Ok(()),
    }
}

impl From<CaseWhen> for Expr {
    fn from(case: CaseWhen) -> Self {
        Self::Case(Arc::new(case))
    }
}

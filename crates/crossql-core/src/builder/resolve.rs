//! Binding of [`this`](super::this) placeholders.

use std::sync::Arc;

use crate::ast::{Expr, Table, UnresolvedColumn};
use crate::error::Result;

/// Drops skipped (`None`) arguments.
pub(crate) fn present<I, E>(items: I) -> Vec<Expr>
where
    I: IntoIterator<Item = E>,
    E: Into<Option<Expr>>,
{
    items.into_iter().filter_map(Into::into).collect()
}

/// Binds every placeholder in `exprs` to the column of the same name in
/// `source`.
///
/// A placeholder reached twice within `exprs` is bound once.
///
/// # Errors
///
/// Returns [`Error::AlreadyResolved`](crate::Error::AlreadyResolved) for a
/// placeholder bound by an earlier builder call, and the lookup error when
/// `source` lacks the name.
pub(crate) fn resolve_names(source: &Table, exprs: &[Expr]) -> Result<()> {
    let mut seen: Vec<&Arc<UnresolvedColumn>> = Vec::new();
    for expr in exprs {
        for node in expr.walk() {
            if let Expr::Unresolved(placeholder) = node {
                if seen.iter().any(|p| Arc::ptr_eq(p, placeholder)) {
                    continue;
                }
                seen.push(placeholder);
                let column = source.get_column(placeholder.name())?;
                placeholder.bind(column.into())?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprNode, ExprType, SemanticType, TablePath};
    use crate::builder::this;
    use crate::error::Error;
    use crate::schema::{DbPath, Schema};

    fn users(schema: Schema) -> Table {
        TablePath::new(DbPath::parse("users").unwrap(), Some(schema)).into()
    }

    #[test]
    fn test_resolve_case_insensitive() {
        let t = users(Schema::case_insensitive().with_column("Id", SemanticType::Integer));
        let id = this("ID");
        resolve_names(&t, &[id.clone()]).unwrap();
        assert_eq!(id.name(), Some("Id"));
        assert_eq!(id.ty().unwrap(), ExprType::Semantic(SemanticType::Integer));
    }

    #[test]
    fn test_resolve_case_sensitive_rejects_other_casing() {
        let t = users(Schema::case_sensitive().with_column("Id", SemanticType::Integer));
        let err = resolve_names(&t, &[this("id")]).unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { .. }));
    }

    #[test]
    fn test_resolve_nested() {
        let t = users(Schema::case_sensitive().with_column("a", SemanticType::Integer));
        let a = this("a");
        let expr = a.clone().add(1).gt(2);
        resolve_names(&t, &[expr]).unwrap();
        assert!(matches!(a, Expr::Unresolved(ref u) if u.resolved().is_some()));
    }

    #[test]
    fn test_second_binding_fails() {
        let a = users(Schema::case_sensitive().with_column("id", SemanticType::Integer));
        let b = users(Schema::case_sensitive().with_column("id", SemanticType::Integer));
        let id = this("id");
        resolve_names(&a, &[id.clone().gt(1)]).unwrap();
        let err = resolve_names(&b, &[id.gt(1)]).unwrap_err();
        assert!(matches!(err, Error::AlreadyResolved(name) if name == "id"));
    }

    #[test]
    fn test_repeated_placeholder_in_one_call_binds_once() {
        let t = users(Schema::case_sensitive().with_column("n", SemanticType::Integer));
        let n = this("n");
        resolve_names(&t, &[n.clone().add(n.clone()), n.clone().gt(0)]).unwrap();
        assert_eq!(n.ty().unwrap(), ExprType::Semantic(SemanticType::Integer));
    }

    #[test]
    fn test_present_drops_skips() {
        let exprs = present([Some(Expr::from(1)), None, Some(Expr::from(2))]);
        assert_eq!(exprs.len(), 2);
    }
}

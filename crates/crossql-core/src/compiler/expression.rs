//! Rendering of expressions.

use super::{as_query, Compilable, Compiler};
use crate::ast::{Column, Expr};
use crate::error::{Error, Result};

impl Compilable for Column {
    fn compile(&self, c: &Compiler<'_>) -> Result<String> {
        let name = c.quote(self.name());
        if c.table_context().len() <= 1 {
            return Ok(name);
        }

        let source = self.source().id();
        let aliases: Vec<_> = c
            .table_context()
            .iter()
            .filter(|alias| alias.covers(source))
            .collect();
        match aliases.as_slice() {
            [] => Ok(name),
            [alias] => Ok(format!("{}.{name}", c.quote(&alias.name))),
            _ => Err(Error::TooManyAliases(self.name().to_owned())),
        }
    }
}

impl Compilable for Expr {
    fn compile(&self, c: &Compiler<'_>) -> Result<String> {
        let d = c.dialect();
        match self {
            Self::Value(v) => Ok(d.literal(v)),
            Self::Code(sql) => Ok(sql.clone()),
            Self::Column(col) => c.sql(col),
            Self::Unresolved(u) => c.sql(u.get()?),
            Self::Alias(a) => Ok(format!("{} AS {}", c.sql(&a.expr)?, c.quote(&a.name))),
            Self::Concat(concat) => {
                let mut items = concat
                    .exprs
                    .iter()
                    .map(|e| Ok(format!("coalesce({}, '<null>')", d.to_string(&c.sql(e)?))))
                    .collect::<Result<Vec<_>>>()?;
                match items.len() {
                    0 => Err(Error::Compile(String::from(
                        "Concat requires at least one expression",
                    ))),
                    1 => Ok(items.remove(0)),
                    _ => {
                        if let Some(sep) = &concat.sep {
                            let sep = d.literal(&sep.as_str().into());
                            items = interleave(items, &sep);
                        }
                        Ok(d.concat(&items))
                    }
                }
            }
            Self::Count(count) => {
                let expr = match &count.expr {
                    Some(e) => c.sql(e)?,
                    None => String::from("*"),
                };
                if count.distinct {
                    Ok(format!("count(distinct {expr})"))
                } else {
                    Ok(format!("count({expr})"))
                }
            }
            Self::Func(f) => Ok(format!("{}({})", f.name, c.sql_list(&f.args, ", ")?)),
            Self::Case(case) => {
                if case.cases.is_empty() {
                    return Err(Error::Compile(String::from(
                        "CASE requires at least one WHEN",
                    )));
                }
                let mut sql = String::from("CASE");
                for branch in &case.cases {
                    sql.push_str(&format!(
                        " WHEN {} THEN {}",
                        c.sql(&branch.when)?,
                        c.sql(&branch.then)?
                    ));
                }
                if let Some(otherwise) = &case.else_expr {
                    sql.push_str(&format!(" ELSE {}", c.sql(otherwise)?));
                }
                sql.push_str(" END");
                Ok(sql)
            }
            Self::IsDistinctFrom(x) => Ok(d.is_distinct_from(&c.sql(&x.a)?, &c.sql(&x.b)?)),
            Self::BinOp(b) => {
                let sep = format!(" {} ", b.op.as_str());
                Ok(format!("({})", c.sql_list(&b.args, &sep)?))
            }
            Self::UnaryOp(u) => Ok(format!("({}{})", u.op.as_str(), c.sql(&u.expr)?)),
            Self::In(i) => Ok(format!(
                "({} IN ({}))",
                c.sql(&i.expr)?,
                c.sql_list(&i.list, ", ")?
            )),
            Self::Cast(cast) => Ok(format!(
                "cast({} as {})",
                c.sql(&cast.expr)?,
                d.type_repr(&cast.target)
            )),
            Self::Random => Ok(d.random()),
            Self::CurrentTimestamp => Ok(d.current_timestamp()),
            Self::Param(name) => c.sql(c.param(name)?),
            Self::Subquery(t) => {
                let inner = c.with_flags(false, false);
                Ok(format!("({})", inner.sql(&as_query(t))?))
            }
        }
    }
}

fn interleave(items: Vec<String>, sep: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(items.len() * 2);
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push(sep.to_owned());
        }
        out.push(item);
    }
    out
}

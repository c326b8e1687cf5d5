//! Rendering of relations.

use std::sync::Arc;

use super::{as_query, Compilable, Compiler};
use crate::ast::{Cte, Expr, GroupBy, Join, Select, Table, TableAlias, TableOp, TablePath};
use crate::error::Result;

impl Compilable for TablePath {
    fn compile(&self, c: &Compiler<'_>) -> Result<String> {
        let segments: Vec<String> = self.path.segments().iter().map(|s| c.quote(s)).collect();
        Ok(segments.join("."))
    }
}

impl Compilable for TableAlias {
    fn compile(&self, c: &Compiler<'_>) -> Result<String> {
        let source = c.with_flags(false, true).sql(&self.source)?;
        Ok(format!("{source} {}", c.quote(&self.name)))
    }
}

impl Compilable for Join {
    fn compile(&self, parent: &Compiler<'_>) -> Result<String> {
        let tables: Vec<Arc<TableAlias>> = self
            .sources
            .iter()
            .map(|source| match source {
                Table::Alias(alias) => Arc::clone(alias),
                other => Arc::new(TableAlias::new(other.clone(), parent.new_unique_name())),
            })
            .collect();
        let c = parent.with_tables(&tables).with_flags(false, true);

        let op = match self.kind.keyword() {
            Some(keyword) => format!(" {keyword} JOIN "),
            None => String::from(" JOIN "),
        };
        let mut sql = c.sql_list(&tables, &op)?;
        if !self.on.is_empty() {
            sql = format!("{sql} ON {}", c.sql_list(&self.on, " AND ")?);
        }

        let columns = match &self.columns {
            Some(columns) => c.sql_list(columns, ", ")?,
            None => String::from("*"),
        };
        Ok(parent.wrap_table(format!("SELECT {columns} FROM {sql}")))
    }
}

impl Compilable for GroupBy {
    fn compile(&self, c: &Compiler<'_>) -> Result<String> {
        let columns: Vec<Expr> = self.output_columns().cloned().collect();
        let keys: Vec<Expr> = (1..=self.keys.len())
            .map(|i| Expr::Code(i.to_string()))
            .collect();

        // A plain select absorbs the grouping instead of being nested.
        if let Table::Select(inner) = &self.table {
            if inner.columns.is_none()
                && inner.group_by.is_empty()
                && inner.limit.is_none()
                && !inner.distinct
            {
                let mut merged = inner.derive();
                merged.columns = Some(columns);
                merged.group_by = keys;
                merged.having.clone_from(&self.having);
                return c.sql(&merged);
            }
        }

        let mut sql = format!(
            "SELECT {} FROM {}",
            c.sql_list(&columns, ", ")?,
            c.with_flags(true, false).sql(&self.table)?
        );
        if !keys.is_empty() {
            sql = format!("{sql} GROUP BY {}", c.sql_list(&keys, ", ")?);
        }
        if !self.having.is_empty() {
            sql = format!("{sql} HAVING {}", c.sql_list(&self.having, " AND ")?);
        }
        Ok(c.wrap_table(sql))
    }
}

impl Compilable for TableOp {
    fn compile(&self, parent: &Compiler<'_>) -> Result<String> {
        let c = parent.with_flags(false, parent.in_join);
        let sql = format!(
            "{} {} {}",
            c.sql(&as_query(&self.left))?,
            self.op.as_str(),
            c.sql(&as_query(&self.right))?
        );
        Ok(parent.wrap_table(sql))
    }
}

impl Compilable for Select {
    fn compile(&self, parent: &Compiler<'_>) -> Result<String> {
        let c = parent.with_flags(true, parent.in_join);
        let d = c.dialect();

        let columns = match &self.columns {
            Some(columns) if !columns.is_empty() => c.sql_list(columns, ", ")?,
            _ => String::from("*"),
        };
        let distinct = if self.distinct { "DISTINCT " } else { "" };
        let mut sql = format!("SELECT {distinct}{columns}");

        match (&self.table, d.placeholder_table()) {
            (Some(table), _) => sql = format!("{sql} FROM {}", c.sql(table)?),
            (None, Some(placeholder)) => sql = format!("{sql} FROM {placeholder}"),
            (None, None) => {}
        }
        if !self.where_exprs.is_empty() {
            sql = format!("{sql} WHERE {}", c.sql_list(&self.where_exprs, " AND ")?);
        }
        if !self.group_by.is_empty() {
            sql = format!("{sql} GROUP BY {}", c.sql_list(&self.group_by, ", ")?);
        }
        if !self.having.is_empty() {
            sql = format!("{sql} HAVING {}", c.sql_list(&self.having, " AND ")?);
        }
        if !self.order_by.is_empty() {
            sql = format!("{sql} ORDER BY {}", c.sql_list(&self.order_by, ", ")?);
        }
        if self.limit.is_some() {
            sql = format!("{sql} {}", d.offset_limit(None, self.limit));
        }
        Ok(parent.wrap_table(sql))
    }
}

impl Compilable for Cte {
    fn compile(&self, parent: &Compiler<'_>) -> Result<String> {
        let c = parent.without_tables().with_flags(false, parent.in_join);
        let body = c.sql(&as_query(&self.source))?;

        let name = match &self.name {
            Some(name) => name.clone(),
            None => parent.new_unique_name(),
        };
        let key = match &self.params {
            Some(params) if !params.is_empty() => format!("{name}({})", params.join(", ")),
            _ => name.clone(),
        };
        parent.add_cte(key, body);
        Ok(name)
    }
}

impl Compilable for Table {
    fn compile(&self, c: &Compiler<'_>) -> Result<String> {
        match self {
            Self::Path(t) => c.sql(t),
            Self::Alias(t) => c.sql(t),
            Self::Join(t) => c.sql(t),
            Self::GroupBy(t) => c.sql(t),
            Self::Op(t) => c.sql(t),
            Self::Select(t) => c.sql(t),
            Self::Cte(t) => c.sql(t),
            Self::Param(p) => c.sql(c.param(&p.name)?),
        }
    }
}

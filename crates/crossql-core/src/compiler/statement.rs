//! Rendering of statements.

use super::{as_query, Compilable, Compiler};
use crate::ast::{
    CreateTable, DropTable, Explain, InsertSource, InsertToTable, Statement, TruncateTable,
};
use crate::error::{Error, Result};

impl Compilable for CreateTable {
    fn compile(&self, c: &Compiler<'_>) -> Result<String> {
        let d = c.dialect();
        let ne = if self.if_not_exists { "IF NOT EXISTS " } else { "" };
        let path = c.sql(&self.path)?;
        if let Some(source) = &self.source {
            return Ok(format!("CREATE TABLE {ne}{path} AS {}", c.sql(source)?));
        }

        let schema = self
            .path
            .schema
            .as_ref()
            .ok_or_else(|| Error::SchemaRequired(self.path.path.to_string()))?;
        let columns: Vec<String> = schema
            .iter()
            .map(|(name, ty)| format!("{} {}", c.quote(name), d.type_repr(ty)))
            .collect();
        let pks = if !self.primary_keys.is_empty() && d.supports_primary_key() {
            let keys: Vec<String> = self.primary_keys.iter().map(|k| c.quote(k)).collect();
            format!(", PRIMARY KEY ({})", keys.join(", "))
        } else {
            String::new()
        };
        Ok(format!("CREATE TABLE {ne}{path}({}{pks})", columns.join(", ")))
    }
}

impl Compilable for DropTable {
    fn compile(&self, c: &Compiler<'_>) -> Result<String> {
        let ie = if self.if_exists { "IF EXISTS " } else { "" };
        Ok(format!("DROP TABLE {ie}{}", c.sql(&self.path)?))
    }
}

impl Compilable for TruncateTable {
    fn compile(&self, c: &Compiler<'_>) -> Result<String> {
        Ok(format!("TRUNCATE TABLE {}", c.sql(&self.path)?))
    }
}

impl Compilable for InsertToTable {
    fn compile(&self, c: &Compiler<'_>) -> Result<String> {
        let source = match &self.source {
            InsertSource::Rows(rows) => c.dialect().constant_values(rows),
            InsertSource::Query(query) => c.sql(query)?,
        };
        let columns = match &self.columns {
            Some(columns) => {
                let quoted: Vec<String> = columns.iter().map(|col| c.quote(col)).collect();
                format!("({})", quoted.join(", "))
            }
            None => String::new(),
        };
        Ok(format!("INSERT INTO {}{columns} {source}", c.sql(&self.path)?))
    }
}

impl Compilable for Explain {
    fn compile(&self, c: &Compiler<'_>) -> Result<String> {
        let query = c.sql(&as_query(&self.query))?;
        Ok(c.dialect().explain_as_text(&query))
    }
}

impl Compilable for Statement {
    fn compile(&self, c: &Compiler<'_>) -> Result<String> {
        match self {
            Self::CreateTable(s) => c.sql(s),
            Self::DropTable(s) => c.sql(s),
            Self::TruncateTable(s) => c.sql(s),
            Self::Insert(s) => c.sql(s),
            Self::Commit if c.is_autocommit() => Ok(String::new()),
            Self::Commit => Ok(String::from("COMMIT")),
            Self::Explain(s) => c.sql(s),
        }
    }
}

//! The execution collaborator.

use tracing::debug;

use crate::ast::{Node, Row};
use crate::compiler::{Compiler, Params};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::schema::DbPath;

/// A database that runs compiled SQL.
pub trait Database: Send + Sync {
    fn dialect(&self) -> &dyn Dialect;

    /// Whether every statement commits on its own.
    fn is_autocommit(&self) -> bool;

    /// Schema prepended to single-segment table paths.
    fn default_schema(&self) -> &str;

    /// Runs one SQL statement, returning its rows (empty for statements
    /// without a result set).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Execution`] when the database rejects the statement.
    fn execute(&self, sql: &str) -> Result<Vec<Row>>;

    /// Releases the connection. Later calls fail.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection could not be closed cleanly.
    fn close(&self) -> Result<()>;

    /// A compiler configured for this database.
    fn compiler(&self) -> Compiler<'_> {
        Compiler::new(self.dialect()).autocommit(self.is_autocommit())
    }

    /// Compiles and runs `node`. A node that compiles to nothing is not sent.
    ///
    /// # Errors
    ///
    /// Returns compilation errors and errors reported by [`Self::execute`].
    fn query(&self, node: Node) -> Result<Vec<Row>> {
        let sql = self.compiler().compile(node)?;
        run(self, &sql)
    }

    /// Like [`Self::query`], with parameter values.
    ///
    /// # Errors
    ///
    /// See [`Self::query`].
    fn query_with_params(&self, node: Node, params: &Params) -> Result<Vec<Row>> {
        let sql = self.compiler().with_params(params).compile(node)?;
        run(self, &sql)
    }

    /// Qualifies a table path with the default schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Builder`] for paths of more than two segments.
    fn normalize_table_path(&self, path: &DbPath) -> Result<DbPath> {
        match path.segments() {
            [name] => DbPath::new([self.default_schema(), name.as_str()]),
            [_, _] => Ok(path.clone()),
            _ => Err(Error::Builder(format!(
                "{}: Bad table path '{path}'. Expected form: schema.table",
                self.dialect().name()
            ))),
        }
    }
}

fn run<D: Database + ?Sized>(db: &D, sql: &str) -> Result<Vec<Row>> {
    if sql.is_empty() {
        return Ok(Vec::new());
    }
    debug!(dialect = db.dialect().name(), sql, "Running query");
    db.execute(sql)
}

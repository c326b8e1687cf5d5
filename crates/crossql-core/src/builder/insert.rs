//! DDL and DML shorthands on [`TablePath`].

use tracing::debug;

use crate::ast::{
    CreateTable, DropTable, InsertSource, InsertToTable, Row, Select, Table, TablePath,
    TruncateTable, Value,
};
use crate::database::Database;
use crate::error::{Error, Result};

/// Rows per INSERT issued by [`insert_rows_in_batches`].
pub const DEFAULT_BATCH_SIZE: usize = 1024 * 8;

// Statements need a query, not a bare path.
fn as_query(source: Table) -> Table {
    match source {
        Table::Path(_) => Select::new(Some(source)).into(),
        other => other,
    }
}

impl TablePath {
    /// `CREATE TABLE path (columns..)` from the path's schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaRequired`] when the path has no schema or an
    /// empty one.
    pub fn create(&self) -> Result<CreateTable> {
        match &self.schema {
            Some(schema) if !schema.is_empty() => Ok(CreateTable {
                path: self.clone(),
                source: None,
                if_not_exists: false,
                primary_keys: Vec::new(),
            }),
            _ => Err(Error::SchemaRequired(self.path.to_string())),
        }
    }

    /// `CREATE TABLE path AS source`
    #[must_use]
    pub fn create_as(&self, source: impl Into<Table>) -> CreateTable {
        CreateTable {
            path: self.clone(),
            source: Some(as_query(source.into())),
            if_not_exists: false,
            primary_keys: Vec::new(),
        }
    }

    #[must_use]
    pub fn drop(&self) -> DropTable {
        DropTable {
            path: self.clone(),
            if_exists: false,
        }
    }

    #[must_use]
    pub fn truncate(&self) -> TruncateTable {
        TruncateTable { path: self.clone() }
    }

    /// Inserts constant rows.
    #[must_use]
    pub fn insert_rows<I>(&self, rows: I, columns: Option<Vec<String>>) -> InsertToTable
    where
        I: IntoIterator<Item = Row>,
    {
        InsertToTable {
            path: self.clone(),
            source: InsertSource::Rows(rows.into_iter().collect()),
            columns,
        }
    }

    /// Inserts a single row.
    #[must_use]
    pub fn insert_row<I, V>(&self, values: I, columns: Option<Vec<String>>) -> InsertToTable
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let row: Row = values.into_iter().map(Into::into).collect();
        self.insert_rows([row], columns)
    }

    /// Inserts the result of a query.
    #[must_use]
    pub fn insert_expr(&self, query: impl Into<Table>) -> InsertToTable {
        InsertToTable {
            path: self.clone(),
            source: InsertSource::Query(as_query(query.into())),
            columns: None,
        }
    }
}

/// Inserts `rows` into `table`, one INSERT per `batch_size` rows, in order.
///
/// Stops at the first failing batch. Batches already inserted stay.
///
/// # Errors
///
/// Returns [`Error::Builder`] for a zero batch size, or the first error the
/// database reports.
pub fn insert_rows_in_batches<D>(
    db: &D,
    table: &TablePath,
    rows: Vec<Row>,
    columns: Option<&[String]>,
    batch_size: usize,
) -> Result<()>
where
    D: Database + ?Sized,
{
    if batch_size == 0 {
        return Err(Error::Builder(String::from("batch_size must be positive")));
    }

    let total = rows.len();
    let mut rows = rows.into_iter().peekable();
    let mut inserted = 0;
    while rows.peek().is_some() {
        let batch: Vec<Row> = rows.by_ref().take(batch_size).collect();
        let len = batch.len();
        let columns = columns.map(<[String]>::to_vec);
        db.query(table.insert_rows(batch, columns).into())?;
        inserted += len;
        debug!(table = %table.path, rows = len, inserted, total, "Inserted batch");
    }
    Ok(())
}

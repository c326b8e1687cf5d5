//! Table paths and column schemas.

use core::fmt;

use crate::ast::SemanticType;
use crate::error::{Error, Result};

/// Path identifying a relation, such as `schema.table`.
///
/// Never empty, and no segment is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbPath(Vec<String>);

impl DbPath {
    /// Creates a path from its segments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyTablePath`] if there are no segments or one of
    /// them is empty.
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() || segments.iter().any(String::is_empty) {
            return Err(Error::EmptyTablePath);
        }
        Ok(Self(segments))
    }

    /// Parses a dotted path such as `main.users`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyTablePath`] for an empty string or an empty
    /// segment.
    pub fn parse(path: &str) -> Result<Self> {
        Self::new(path.split('.'))
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns the last segment, the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the path has no segments. Construction rejects empty
    /// paths, so this is false for every `DbPath` built through [`DbPath::new`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DbPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Ordered mapping from column name to semantic type.
///
/// A case-insensitive schema matches names regardless of case but keeps the
/// casing each column was declared with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Schema {
    columns: Vec<(String, SemanticType)>,
    case_sensitive: bool,
}

impl Schema {
    /// Creates an empty case-sensitive schema.
    #[must_use]
    pub const fn case_sensitive() -> Self {
        Self {
            columns: Vec::new(),
            case_sensitive: true,
        }
    }

    /// Creates an empty case-insensitive schema.
    #[must_use]
    pub const fn case_insensitive() -> Self {
        Self {
            columns: Vec::new(),
            case_sensitive: false,
        }
    }

    /// Creates an empty schema with the same case mode as `self`.
    #[must_use]
    pub const fn new_like(&self) -> Self {
        Self {
            columns: Vec::new(),
            case_sensitive: self.case_sensitive,
        }
    }

    /// Adds a column, replacing any existing column of the same name.
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, ty: SemanticType) -> Self {
        self.insert(name, ty);
        self
    }

    /// Adds a column, replacing any existing column of the same name.
    ///
    /// A replaced column keeps its position and its original casing.
    pub fn insert(&mut self, name: impl Into<String>, ty: SemanticType) {
        let name = name.into();
        match self.position(&name) {
            Some(i) => self.columns[i].1 = ty,
            None => self.columns.push((name, ty)),
        }
    }

    /// Returns whether lookups are case-sensitive.
    #[must_use]
    pub const fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    fn position(&self, name: &str) -> Option<usize> {
        if self.case_sensitive {
            self.columns.iter().position(|(k, _)| k == name)
        } else {
            self.columns
                .iter()
                .position(|(k, _)| k.eq_ignore_ascii_case(name))
        }
    }

    /// Looks up a column type.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SemanticType> {
        self.position(name).map(|i| &self.columns[i].1)
    }

    /// Returns the declared name of a column, in its original casing.
    #[must_use]
    pub fn get_key(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.columns[i].0.as_str())
    }

    /// Returns true if the schema has the column.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates over columns in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SemanticType)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over column names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(k, _)| k.as_str())
    }
}

impl<S: Into<String>> FromIterator<(S, SemanticType)> for Schema {
    fn from_iter<I: IntoIterator<Item = (S, SemanticType)>>(iter: I) -> Self {
        let mut schema = Self::case_sensitive();
        for (name, ty) in iter {
            schema.insert(name, ty);
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_path() {
        let path = DbPath::parse("main.users").unwrap();
        assert_eq!(path.segments(), ["main", "users"]);
        assert_eq!(path.name(), "users");
        assert_eq!(path.to_string(), "main.users");
        assert_eq!(path, DbPath::new(["main", "users"]).unwrap());
    }

    #[test]
    fn test_db_path_rejects_empty() {
        assert!(matches!(
            DbPath::new(Vec::<String>::new()),
            Err(Error::EmptyTablePath)
        ));
        assert!(matches!(DbPath::parse("main."), Err(Error::EmptyTablePath)));
    }

    #[test]
    fn test_case_insensitive_lookup_keeps_casing() {
        let schema = Schema::case_insensitive()
            .with_column("UserId", SemanticType::Integer)
            .with_column("Name", SemanticType::Text);
        assert_eq!(schema.get_key("userid"), Some("UserId"));
        assert_eq!(schema.get("NAME"), Some(&SemanticType::Text));
        assert!(schema.get("missing").is_none());
    }

    #[test]
    fn test_case_sensitive_lookup() {
        let schema = Schema::case_sensitive().with_column("id", SemanticType::Integer);
        assert_eq!(schema.get_key("id"), Some("id"));
        assert_eq!(schema.get_key("ID"), None);
    }

    #[test]
    fn test_duplicate_replaces_in_place() {
        let schema: Schema = [
            ("a", SemanticType::Integer),
            ("b", SemanticType::Text),
            ("a", SemanticType::Boolean),
        ]
        .into_iter()
        .collect();
        let cols: Vec<_> = schema.iter().collect();
        assert_eq!(
            cols,
            [("a", &SemanticType::Boolean), ("b", &SemanticType::Text)]
        );
    }
}

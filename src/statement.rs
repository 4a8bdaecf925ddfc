//! Statement classification
//!
//! The cursor only needs to know what kind of statement it is serving: a
//! query produces rows to fetch, DML produces row counts and batch errors.

/// Kind of SQL statement, decided by its first keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementType {
    /// Unknown or unparsed statement
    #[default]
    Unknown,
    /// SELECT query
    Query,
    /// DML: INSERT, UPDATE, DELETE, MERGE
    Dml,
    /// DDL: CREATE, ALTER, DROP, etc.
    Ddl,
    /// PL/SQL block: BEGIN, DECLARE, CALL
    PlSql,
}

/// An executed statement as seen by its cursor
#[derive(Debug, Clone)]
pub struct Statement {
    sql: String,
    statement_type: StatementType,
    cursor_id: u16,
}

impl Statement {
    /// Create a statement from SQL text
    pub fn new(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let statement_type = classify(&sql);
        Self {
            sql,
            statement_type,
            cursor_id: 0,
        }
    }

    /// Get the SQL text
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Get the statement type
    pub fn statement_type(&self) -> StatementType {
        self.statement_type
    }

    /// Check if this is a query (SELECT)
    pub fn is_query(&self) -> bool {
        self.statement_type == StatementType::Query
    }

    /// Check if this is a DML statement
    pub fn is_dml(&self) -> bool {
        self.statement_type == StatementType::Dml
    }

    /// Server cursor id, 0 until the server assigns one
    pub fn cursor_id(&self) -> u16 {
        self.cursor_id
    }

    /// Set the server cursor id
    pub fn set_cursor_id(&mut self, id: u16) {
        self.cursor_id = id;
    }
}

/// Skip whitespace, comments and opening parentheses before the first keyword
fn first_keyword(sql: &str) -> &str {
    let mut rest = sql;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.split_once('\n').map_or("", |(_, tail)| tail);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map_or("", |(_, tail)| tail);
        } else {
            break;
        }
    }
    let end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    &rest[..end]
}

fn classify(sql: &str) -> StatementType {
    match first_keyword(sql).to_ascii_uppercase().as_str() {
        "SELECT" | "WITH" => StatementType::Query,
        "INSERT" | "UPDATE" | "DELETE" | "MERGE" => StatementType::Dml,
        "CREATE" | "ALTER" | "DROP" | "GRANT" | "REVOKE" | "ANALYZE" | "AUDIT" | "COMMENT"
        | "TRUNCATE" => StatementType::Ddl,
        "DECLARE" | "BEGIN" | "CALL" => StatementType::PlSql,
        _ => StatementType::Unknown,
    }
}

//! Database-context suppression.
//!
//! Statements that create, drop or list databases must be submitted without
//! a database context; the engine rejects them otherwise. This is a plain
//! case-insensitive substring check over a fixed keyword set. The statement
//! is not parsed.

/// Keywords that suppress the database context when present.
pub const DATABASE_KEYWORDS: [&str; 6] = [
    "CREATE DATABASE",
    "DROP DATABASE",
    "SHOW DATABASES",
    "CREATE SCHEMA",
    "DROP SCHEMA",
    "SHOW SCHEMAS",
];

/// Returns true if `statement` manipulates or lists databases.
#[must_use]
pub fn manipulates_database(statement: &str) -> bool {
    let upper = statement.to_uppercase();
    DATABASE_KEYWORDS.iter().any(|keyword| upper.contains(keyword))
}

/// Returns the database context to attach to `statement`, if any.
#[must_use]
pub fn database_context<'a>(statement: &str, database: Option<&'a str>) -> Option<&'a str> {
    database.filter(|db| !db.is_empty() && !manipulates_database(statement))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_database_any_case_suppresses_context() {
        assert_eq!(database_context("CREATE DATABASE claims", Some("db")), None);
        assert_eq!(database_context("create database claims", Some("db")), None);
        assert_eq!(database_context("Create Database IF NOT EXISTS x", Some("db")), None);
    }

    #[test]
    fn test_drop_and_show_suppress_context() {
        assert_eq!(database_context("DROP DATABASE x CASCADE", Some("db")), None);
        assert_eq!(database_context("show databases", Some("db")), None);
        assert_eq!(database_context("SHOW SCHEMAS", Some("db")), None);
    }

    #[test]
    fn test_regular_statements_keep_context() {
        assert_eq!(
            database_context("DROP TABLE IF EXISTS dim_date_etl", Some("db")),
            Some("db")
        );
        assert_eq!(database_context("SELECT 1", Some("db")), Some("db"));
    }

    #[test]
    fn test_missing_or_empty_database() {
        assert_eq!(database_context("SELECT 1", None), None);
        assert_eq!(database_context("SELECT 1", Some("")), None);
    }
}

//! SQL dialects and dialect resolution.

use crate::error::DbError;
use std::fmt;
use std::str::FromStr;

/// Environment variable consulted when a table does not name its dialect.
pub const DIALECT_ENV: &str = "DB_DIALECT";

/// One of the supported SQL backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    MySql,
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Resolve the dialect for a call.
    ///
    /// An explicit dialect wins; otherwise `DB_DIALECT` is consulted, and MySQL
    /// is used when neither names one.
    pub fn resolve(requested: Option<Dialect>) -> Result<Dialect, DbError> {
        if let Some(dialect) = requested {
            return Ok(dialect);
        }
        Self::resolve_name(std::env::var(DIALECT_ENV).ok().as_deref())
    }

    /// Resolve a dialect from an optional name (empty counts as absent).
    pub fn resolve_name(name: Option<&str>) -> Result<Dialect, DbError> {
        match name.map(str::trim) {
            None | Some("") => Ok(Dialect::default()),
            Some(name) => name.parse(),
        }
    }

    /// Placeholder for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }

    /// Pagination clause (with leading space).
    pub fn pagination(&self, start: u64, limit: u64) -> String {
        match self {
            Dialect::Postgres => format!(" OFFSET {start} LIMIT {limit}"),
            Dialect::MySql | Dialect::Sqlite => format!(" LIMIT {start}, {limit}"),
        }
    }

    /// Portable expression for the difference between two dates.
    ///
    /// `unit` is only used by Postgres (`DATE_PART`); MySQL returns days and
    /// SQLite returns fractional days.
    pub fn date_diff(&self, unit: &str, date1: &str, date2: &str) -> String {
        match self {
            Dialect::MySql => format!("DATEDIFF({date1},{date2})"),
            Dialect::Postgres => {
                format!("DATE_PART('{unit}',{date1}::timestamp - {date2}::timestamp)")
            }
            Dialect::Sqlite => format!("JULIANDAY({date1}) - JULIANDAY({date2})"),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            _ => Err(DbError::UnsupportedDialect(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("mysql".parse::<Dialect>().unwrap(), Dialect::MySql);
        assert_eq!("Postgres".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("postgresql".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("sqlite3".parse::<Dialect>().unwrap(), Dialect::Sqlite);
        assert!("oracle".parse::<Dialect>().is_err());
    }

    #[test]
    fn explicit_dialect_wins() {
        assert_eq!(
            Dialect::resolve(Some(Dialect::Sqlite)).unwrap(),
            Dialect::Sqlite
        );
    }

    #[test]
    fn empty_name_defaults_to_mysql() {
        assert_eq!(Dialect::resolve_name(None).unwrap(), Dialect::MySql);
        assert_eq!(Dialect::resolve_name(Some("  ")).unwrap(), Dialect::MySql);
        assert_eq!(
            Dialect::resolve_name(Some("sqlite")).unwrap(),
            Dialect::Sqlite
        );
    }

    #[test]
    fn pagination_per_dialect() {
        assert_eq!(Dialect::Postgres.pagination(20, 10), " OFFSET 20 LIMIT 10");
        assert_eq!(Dialect::MySql.pagination(20, 10), " LIMIT 20, 10");
        assert_eq!(Dialect::Sqlite.pagination(0, 5), " LIMIT 0, 5");
    }

    #[test]
    fn placeholders() {
        assert_eq!(Dialect::Postgres.placeholder(3), "$3");
        assert_eq!(Dialect::MySql.placeholder(3), "?");
    }

    #[test]
    fn date_diff_per_dialect() {
        assert_eq!(
            Dialect::MySql.date_diff("day", "a", "b"),
            "DATEDIFF(a,b)"
        );
        assert_eq!(
            Dialect::Postgres.date_diff("day", "a", "b"),
            "DATE_PART('day',a::timestamp - b::timestamp)"
        );
        assert_eq!(
            Dialect::Sqlite.date_diff("day", "a", "b"),
            "JULIANDAY(a) - JULIANDAY(b)"
        );
    }
}

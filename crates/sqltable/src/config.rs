//! Table and connection configuration.

use crate::dialect::Dialect;

/// Default ceiling for the number of rows a single `get` may request.
pub const DEFAULT_ROWS_LIMIT: u64 = 1000;

/// Per-table query settings.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Hard ceiling for `limit`; larger requests are capped.
    pub rows_limit: u64,
    /// Quote used for string and date literals in UPDATE (Postgres always uses `'`).
    pub quote: char,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            rows_limit: DEFAULT_ROWS_LIMIT,
            quote: '\'',
        }
    }
}

impl TableConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the row ceiling.
    pub fn rows_limit(mut self, limit: u64) -> Self {
        self.rows_limit = limit;
        self
    }

    /// Set the literal quote character.
    pub fn quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    /// Quote to use for the given dialect.
    pub fn quote_for(&self, dialect: Dialect) -> char {
        match dialect {
            Dialect::Postgres => '\'',
            Dialect::MySql | Dialect::Sqlite => self.quote,
        }
    }
}

/// Connection settings, usually read from `DB_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Default database name (or file path for SQLite).
    pub database: String,
    pub host: String,
    pub port: Option<u16>,
    pub user: String,
    pub password: String,
}

impl ConnectionConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `DB_NAME`, `DB_HOST`, `DB_PORT`, `DB_USER` and `DB_PASSWORD`.
    ///
    /// The dialect is not part of the connection settings; tables resolve it
    /// per call (see [`Dialect::resolve`]).
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        let port = var("DB_PORT").trim().parse().ok();
        Self {
            database: var("DB_NAME"),
            host: var("DB_HOST"),
            port,
            user: var("DB_USER"),
            password: var("DB_PASSWORD"),
        }
    }

    /// Load a `.env` file if present, then read the environment.
    pub fn from_dotenv() -> Self {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Database to open: the requested name, or the configured default when empty.
    pub fn database_or_default<'a>(&'a self, requested: &'a str) -> &'a str {
        if requested.is_empty() {
            &self.database
        } else {
            requested
        }
    }

    /// Build a `tokio_postgres::Config` for the given database.
    pub fn postgres_config(&self, database: &str) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        if !self.host.is_empty() {
            config.host(&self.host);
        }
        if let Some(port) = self.port {
            config.port(port);
        }
        if !self.user.is_empty() {
            config.user(&self.user);
        }
        if !self.password.is_empty() {
            config.password(&self.password);
        }
        let dbname = self.database_or_default(database);
        if !dbname.is_empty() {
            config.dbname(dbname);
        }
        config
    }
}

//! SELECT statement builder.

use super::{
    find_keyword, keyword_positions, portable_functions, postgres_quotes, quote_ident,
    split_top_level,
};
use crate::config::DEFAULT_ROWS_LIMIT;
use crate::dialect::Dialect;
use crate::error::DbResult;
use crate::guard;

/// Search sentinel that suppresses the WHERE clause entirely.
pub const NO_FILTER: &str = "-";

/// SELECT builder for a table or a raw row source.
#[derive(Clone, Debug)]
pub struct SelectQb {
    table: String,
    source: Option<String>,
    dialect: Dialect,
    fields: String,
    search: String,
    sort: String,
    start: u64,
    limit: u64,
    rows_limit: u64,
}

impl SelectQb {
    /// Create a builder selecting from `table`.
    pub fn new(table: &str, dialect: Dialect) -> Self {
        Self {
            table: table.to_string(),
            source: None,
            dialect,
            fields: "*".to_string(),
            search: String::new(),
            sort: String::new(),
            start: 0,
            limit: 0,
            rows_limit: DEFAULT_ROWS_LIMIT,
        }
    }

    /// Use a raw row source (e.g. `select ... from a join b ...`) instead of the table.
    ///
    /// An empty source keeps the table.
    pub fn source(mut self, source: &str) -> Self {
        self.source = (!source.trim().is_empty()).then(|| source.to_string());
        self
    }

    /// Comma-separated select list; empty means `*`.
    pub fn fields(mut self, fields: &str) -> Self {
        self.fields = if fields.trim().is_empty() {
            "*".to_string()
        } else {
            fields.to_string()
        };
        self
    }

    /// Filter predicate. Empty means `true`, [`NO_FILTER`] means no WHERE clause.
    pub fn search(mut self, search: &str) -> Self {
        self.search = search.to_string();
        self
    }

    /// ORDER BY expression; empty means unordered.
    pub fn sort(mut self, sort: &str) -> Self {
        self.sort = sort.to_string();
        self
    }

    /// Pagination. Both zero means no pagination clause.
    pub fn page(mut self, start: u64, limit: u64) -> Self {
        self.start = start;
        self.limit = limit;
        self
    }

    /// Ceiling applied to the requested limit.
    pub fn rows_limit(mut self, rows_limit: u64) -> Self {
        self.rows_limit = rows_limit;
        self
    }

    /// Whether the requested limit exceeds the ceiling.
    pub fn limit_capped(&self) -> bool {
        self.limit > self.rows_limit
    }

    /// The limit that will be rendered.
    pub fn effective_limit(&self) -> u64 {
        self.limit.min(self.rows_limit)
    }

    /// Render the statement, rejecting it if the guard matches.
    pub fn build(&self) -> DbResult<String> {
        let pg = self.dialect == Dialect::Postgres;
        let fragment = |s: &str| if pg { postgres_quotes(s) } else { s.to_string() };

        let filter = match self.search.as_str() {
            NO_FILTER => String::new(),
            "" => " where true".to_string(),
            search => format!(" where {}", fragment(search)),
        };
        let order = if self.sort.trim().is_empty() {
            String::new()
        } else {
            format!(" order by {}", fragment(&self.sort))
        };
        let pagination = if self.start != 0 || self.limit != 0 {
            self.dialect.pagination(self.start, self.effective_limit())
        } else {
            String::new()
        };

        let prefix = match &self.source {
            Some(source) if pg => quote_source_aliases(&fragment(source)),
            Some(source) => source.clone(),
            None if pg => format!("select {} from {}", quote_field_list(&self.fields), self.table),
            None => format!("select {} from {}", self.fields, self.table),
        };

        let sql = portable_functions(&format!("{prefix}{filter}{order}{pagination}"), self.dialect);
        guard::check(&sql)?;
        Ok(sql)
    }
}

/// Quote the plain identifiers of a select list for Postgres.
///
/// `*`, `t.*`, already quoted names and expressions are left untouched;
/// `expr AS alias` gets its alias quoted.
fn quote_field_list(fields: &str) -> String {
    split_top_level(fields, ',')
        .into_iter()
        .map(|field| {
            let field = field.trim();
            if let Some(aliased) = quote_alias(field) {
                return aliased;
            }
            let parts = split_top_level(field, '.');
            if parts.len() > 1 && parts.iter().all(|p| super::is_plain_ident(p) || *p == "*") {
                return parts
                    .into_iter()
                    .map(|p| if p == "*" { p.to_string() } else { quote_ident(p) })
                    .collect::<Vec<_>>()
                    .join(".");
            }
            quote_ident(field)
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Quote `AS` aliases in the select list of a raw `select ... from ...` source.
///
/// Sources that are not a top-level SELECT are returned unchanged.
fn quote_source_aliases(source: &str) -> String {
    let trimmed = source.trim_start();
    let lead = &source[..source.len() - trimmed.len()];
    let Some(list_start) = find_keyword(trimmed, "select").filter(|pos| *pos == 0) else {
        return source.to_string();
    };
    let list_start = list_start + "select".len();
    let list_end = find_keyword(trimmed, "from").unwrap_or(trimmed.len());
    if list_end < list_start {
        return source.to_string();
    }

    let list = split_top_level(&trimmed[list_start..list_end], ',')
        .into_iter()
        .map(|item| {
            let body = item.trim_end();
            let trailing = &item[body.len()..];
            match quote_alias(body) {
                Some(aliased) => format!("{}{aliased}{trailing}", leading_ws(body)),
                None => item.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(",");

    format!(
        "{lead}{}{list}{}",
        &trimmed[..list_start],
        &trimmed[list_end..]
    )
}

fn leading_ws(s: &str) -> &str {
    &s[..s.len() - s.trim_start().len()]
}

/// Rewrite `expr AS alias` to `expr AS "alias"`; `None` if there is no alias to quote.
fn quote_alias(item: &str) -> Option<String> {
    let item = item.trim();
    let pos = *keyword_positions(item, "as").last()?;
    let alias = item[pos + 2..].trim();
    let expr = item[..pos].trim_end();
    if expr.is_empty() || !super::is_plain_ident(alias) {
        return None;
    }
    Some(format!("{expr} {} {}", &item[pos..pos + 2], quote_ident(alias)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_filter_sentinel_drops_where() {
        let sql = SelectQb::new("users", Dialect::MySql)
            .fields("*")
            .search("-")
            .build()
            .unwrap();
        assert_eq!(sql, "select * from users");
    }

    #[test]
    fn empty_search_is_where_true() {
        let sql = SelectQb::new("users", Dialect::Sqlite).build().unwrap();
        assert_eq!(sql, "select * from users where true");
    }

    #[test]
    fn empty_fields_select_star() {
        let sql = SelectQb::new("users", Dialect::MySql)
            .fields("")
            .search(NO_FILTER)
            .build()
            .unwrap();
        assert_eq!(sql, "select * from users");
    }

    #[test]
    fn sort_and_pagination_mysql() {
        let sql = SelectQb::new("users", Dialect::MySql)
            .fields("id, name")
            .search("age > 18")
            .sort("name desc")
            .page(10, 5)
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "select id, name from users where age > 18 order by name desc LIMIT 10, 5"
        );
    }

    #[test]
    fn pagination_postgres() {
        let sql = SelectQb::new("users", Dialect::Postgres)
            .page(10, 5)
            .build()
            .unwrap();
        assert_eq!(sql, "select * from users where true OFFSET 10 LIMIT 5");
    }

    #[test]
    fn no_pagination_when_both_zero() {
        let sql = SelectQb::new("users", Dialect::Sqlite)
            .page(0, 0)
            .build()
            .unwrap();
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn limit_is_capped() {
        let qb = SelectQb::new("users", Dialect::Sqlite)
            .rows_limit(100)
            .page(0, 5000);
        assert!(qb.limit_capped());
        assert_eq!(qb.effective_limit(), 100);
        assert_eq!(qb.build().unwrap(), "select * from users where true LIMIT 0, 100");
    }

    #[test]
    fn limit_at_ceiling_is_not_capped() {
        let qb = SelectQb::new("users", Dialect::Sqlite)
            .rows_limit(100)
            .page(0, 100);
        assert!(!qb.limit_capped());
    }

    #[test]
    fn source_replaces_table() {
        let sql = SelectQb::new("users", Dialect::MySql)
            .source("select u.id, r.name from users u join roles r on r.id = u.role_id")
            .search("u.id = 3")
            .sort("u.id")
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "select u.id, r.name from users u join roles r on r.id = u.role_id where u.id = 3 order by u.id"
        );
    }

    #[test]
    fn rand_is_rewritten_for_sqlite() {
        let sql = SelectQb::new("quotes", Dialect::Sqlite)
            .sort("RAND()")
            .page(0, 1)
            .build()
            .unwrap();
        assert_eq!(sql, "select * from quotes where true order by RANDOM() LIMIT 0, 1");
    }

    #[test]
    fn rand_is_kept_for_mysql() {
        let sql = SelectQb::new("quotes", Dialect::MySql)
            .sort("RAND()")
            .build()
            .unwrap();
        assert!(sql.ends_with("order by RAND()"));
    }

    #[test]
    fn postgres_quotes_fields() {
        let sql = SelectQb::new("users", Dialect::Postgres)
            .fields("id, userName, u.email, count(*) as total")
            .search("-")
            .build()
            .unwrap();
        assert_eq!(
            sql,
            r#"select "id","userName","u"."email",count(*) as "total" from users"#
        );
    }

    #[test]
    fn postgres_keeps_star() {
        let sql = SelectQb::new("users", Dialect::Postgres)
            .search("-")
            .build()
            .unwrap();
        assert_eq!(sql, "select * from users");
    }

    #[test]
    fn postgres_converts_literal_quotes() {
        let sql = SelectQb::new("users", Dialect::Postgres)
            .search(r#"""Name"" = "bob""#)
            .build()
            .unwrap();
        assert_eq!(sql, r#"select * from users where "Name" = 'bob'"#);
    }

    #[test]
    fn postgres_quotes_source_aliases() {
        let sql = SelectQb::new("users", Dialect::Postgres)
            .source("select u.id as userId, upper(u.name) AS displayName, r.label from users u join roles r on r.id = u.role_id")
            .search("-")
            .build()
            .unwrap();
        assert_eq!(
            sql,
            r#"select u.id as "userId", upper(u.name) AS "displayName", r.label from users u join roles r on r.id = u.role_id"#
        );
    }

    #[test]
    fn postgres_source_with_irregular_whitespace() {
        let sql = SelectQb::new("t", Dialect::Postgres)
            .source("select   a  as   x ,b   from t")
            .search("-")
            .build()
            .unwrap();
        assert_eq!(sql, r#"select   a as "x" ,b   from t"#);
    }

    #[test]
    fn injection_in_search_is_rejected() {
        let err = SelectQb::new("users", Dialect::MySql)
            .search("id = 1; drop table users")
            .build()
            .unwrap_err();
        assert!(err.is_suspicious());
    }

    #[test]
    fn injection_in_sort_is_rejected() {
        for sort in ["name -- x", "name /* x */", "name # x"] {
            let err = SelectQb::new("users", Dialect::Sqlite)
                .sort(sort)
                .build()
                .unwrap_err();
            assert!(err.is_suspicious(), "{sort}");
        }
    }

    #[test]
    fn tautology_is_rejected() {
        assert!(
            SelectQb::new("users", Dialect::MySql)
                .search("name = 'x' or 1=1")
                .build()
                .is_err()
        );
    }
}

//! Dialect-aware statement builders.
//!
//! Each builder renders one statement for a [`Dialect`]:
//!
//! ```ignore
//! use sqltable::qb::{SelectQb, UpdateQb, FieldType};
//! use sqltable::Dialect;
//!
//! let sql = SelectQb::new("users", Dialect::Postgres)
//!     .fields("id, name")
//!     .search("active = true")
//!     .sort("name")
//!     .page(0, 20)
//!     .build()?;
//! // select "id","name" from users where active = true order by name OFFSET 0 LIMIT 20
//!
//! let sql = UpdateQb::new("users", Dialect::MySql)
//!     .set("name", "bob", FieldType::Text)
//!     .filter("id = 4")
//!     .build()?;
//! // UPDATE users set name = 'bob' where id = 4
//! ```
//!
//! Filter and sort text is inserted verbatim; every builder runs the
//! [`guard`](crate::guard) over the free-text parts before returning.

mod delete;
mod insert;
mod select;
mod update;

pub use delete::DeleteQb;
pub use insert::InsertQb;
pub use select::{NO_FILTER, SelectQb};
pub use update::{FieldType, UpdateQb};

use crate::dialect::Dialect;
use regex::Regex;
use std::sync::OnceLock;

/// Predicate used when a filter is empty.
pub(crate) fn predicate(filter: &str) -> &str {
    if filter.trim().is_empty() {
        "true"
    } else {
        filter
    }
}

/// Rewrite MySQL-only function names for the other dialects.
pub(crate) fn portable_functions(sql: &str, dialect: Dialect) -> String {
    static RAND_RE: OnceLock<Regex> = OnceLock::new();
    static UCASE_RE: OnceLock<Regex> = OnceLock::new();

    if dialect == Dialect::MySql {
        return sql.to_string();
    }
    let rand = RAND_RE
        .get_or_init(|| Regex::new(r"(?i)\brand\s*\(").expect("invalid built-in rand regex"));
    let ucase = UCASE_RE
        .get_or_init(|| Regex::new(r"(?i)\bucase\s*\(").expect("invalid built-in ucase regex"));
    map_unquoted(sql, |text| {
        let text = rand.replace_all(text, "RANDOM(");
        ucase.replace_all(&text, "upper(").into_owned()
    })
}

/// Apply `f` to the parts of `sql` outside quoted literals and identifiers.
fn map_unquoted(sql: &str, f: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut scan = Scanner::default();
    let mut start = 0;
    for (i, c) in sql.char_indices() {
        let was_quoted = scan.quote.is_some();
        scan.advance(c);
        match (was_quoted, scan.quote.is_some()) {
            (false, true) => {
                out.push_str(&f(&sql[start..i]));
                start = i;
            }
            (true, false) => {
                let end = i + c.len_utf8();
                out.push_str(&sql[start..end]);
                start = end;
            }
            _ => {}
        }
    }
    if scan.quote.is_some() {
        out.push_str(&sql[start..]);
    } else {
        out.push_str(&f(&sql[start..]));
    }
    out
}

/// Stand-in for `""` while single `"` are turned into `'`.
const IDENT_QUOTE_TOKEN: &str = "\u{1}";

/// Convert caller quoting to Postgres quoting.
///
/// Callers write string literals with `"` (as MySQL accepts) and identifiers
/// with `""`. Postgres needs `'` and `"` respectively.
pub(crate) fn postgres_quotes(fragment: &str) -> String {
    fragment
        .replace("\"\"", IDENT_QUOTE_TOKEN)
        .replace('"', "'")
        .replace(IDENT_QUOTE_TOKEN, "\"")
}

/// Whether `s` is a plain unquoted identifier.
pub(crate) fn is_plain_ident(s: &str) -> bool {
    static IDENT_RE: OnceLock<Regex> = OnceLock::new();
    IDENT_RE
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("invalid built-in identifier regex")
        })
        .is_match(s)
}

/// Whether `s` is a column reference usable on the left of `SET x = ...`.
///
/// Accepts dotted names whose parts are plain or double-quoted identifiers.
pub(crate) fn is_column_ref(s: &str) -> bool {
    !s.is_empty()
        && split_top_level(s, '.').into_iter().all(|part| {
            is_plain_ident(part)
                || (part.len() > 2
                    && part.starts_with('"')
                    && part.ends_with('"')
                    && !part[1..part.len() - 1].contains('"'))
        })
}

/// Wrap a plain identifier in double quotes; anything else is returned as is.
pub(crate) fn quote_ident(s: &str) -> String {
    if is_plain_ident(s) {
        format!("\"{s}\"")
    } else {
        s.to_string()
    }
}

/// Split on `sep` outside parentheses and quotes.
pub(crate) fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut scan = Scanner::default();
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if scan.at_top_level(c) && c == sep {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
        scan.advance(c);
    }
    parts.push(&s[start..]);
    parts
}

/// Byte offset of the first top-level occurrence of `keyword` as a whole word.
pub(crate) fn find_keyword(s: &str, keyword: &str) -> Option<usize> {
    keyword_positions(s, keyword).into_iter().next()
}

/// Byte offsets of every top-level occurrence of `keyword` as a whole word.
pub(crate) fn keyword_positions(s: &str, keyword: &str) -> Vec<usize> {
    let bytes = s.as_bytes();
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let mut found = Vec::new();
    let mut scan = Scanner::default();
    for (i, c) in s.char_indices() {
        if scan.at_top_level(c) {
            let end = i + keyword.len();
            let matches = s
                .get(i..end)
                .is_some_and(|w| w.eq_ignore_ascii_case(keyword));
            let bounded = (i == 0 || !is_word(bytes[i - 1]))
                && (end == bytes.len() || !is_word(bytes[end]));
            if matches && bounded {
                found.push(i);
            }
        }
        scan.advance(c);
    }
    found
}

/// Tracks nesting and quoting while walking SQL text.
#[derive(Default)]
struct Scanner {
    depth: usize,
    quote: Option<char>,
}

impl Scanner {
    fn at_top_level(&self, c: char) -> bool {
        self.depth == 0 && self.quote.is_none() && c != '\'' && c != '"'
    }

    fn advance(&mut self, c: char) {
        match self.quote {
            Some(q) if c == q => self.quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => self.quote = Some(c),
                '(' => self.depth += 1,
                ')' => self.depth = self.depth.saturating_sub(1),
                _ => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_is_true() {
        assert_eq!(predicate(""), "true");
        assert_eq!(predicate("  "), "true");
        assert_eq!(predicate("id = 1"), "id = 1");
    }

    #[test]
    fn rewrites_functions_outside_mysql() {
        let sql = "select * from t order by RAND(), rand ( ) where ucase(name) = 'A'";
        assert_eq!(
            portable_functions(sql, Dialect::Sqlite),
            "select * from t order by RANDOM(), RANDOM( ) where upper(name) = 'A'"
        );
        assert_eq!(portable_functions(sql, Dialect::MySql), sql);
        assert_eq!(
            portable_functions("order by random()", Dialect::Postgres),
            "order by random()"
        );
    }

    #[test]
    fn function_names_inside_literals_are_kept() {
        let sql = "select 'rand(' as r, \"ucase(\" from t where note = 'it''s rand()' order by rand()";
        assert_eq!(
            portable_functions(sql, Dialect::Postgres),
            "select 'rand(' as r, \"ucase(\" from t where note = 'it''s rand()' order by RANDOM()"
        );
        assert_eq!(
            portable_functions("select 'unterminated rand(", Dialect::Sqlite),
            "select 'unterminated rand("
        );
    }

    #[test]
    fn postgres_quote_round_trip() {
        assert_eq!(
            postgres_quotes(r#"""Name"" = "bob""#),
            r#""Name" = 'bob'"#
        );
    }

    #[test]
    fn splits_outside_parens_and_quotes() {
        assert_eq!(
            split_top_level("a, coalesce(b, c), 'x,y'", ','),
            vec!["a", " coalesce(b, c)", " 'x,y'"]
        );
    }

    #[test]
    fn finds_whole_keywords_only() {
        let s = "select fromage, (select 1 from x) from t";
        assert_eq!(find_keyword(s, "from"), Some(34));
        assert_eq!(find_keyword("select a", "from"), None);
    }

    #[test]
    fn column_refs() {
        assert!(is_column_ref("name"));
        assert!(is_column_ref("u.name"));
        assert!(is_column_ref(r#""User"."Name""#));
        assert!(!is_column_ref("name = 1"));
        assert!(!is_column_ref("a;b"));
        assert!(!is_column_ref(""));
    }
}

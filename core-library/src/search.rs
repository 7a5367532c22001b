//! Search token helpers shared by the query builder and the backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Comparison operator accepted by [`CollectionQuery::add_where`](crate::query::CollectionQuery::add_where)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SqlOperator {
    #[default]
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
}

impl SqlOperator {
    /// Prefixes recognised by [`SqlOperator::split_prefix`], longest first
    /// where one is a prefix of another.
    const PREFIXES: [(&'static str, SqlOperator); 7] = [
        ("<>", SqlOperator::Ne),
        ("<=", SqlOperator::Le),
        ("<", SqlOperator::Lt),
        (">=", SqlOperator::Ge),
        (">", SqlOperator::Gt),
        ("!=", SqlOperator::Ne),
        ("=", SqlOperator::Eq),
    ];

    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlOperator::Eq => "=",
            SqlOperator::Ne => "<>",
            SqlOperator::Lt => "<",
            SqlOperator::Le => "<=",
            SqlOperator::Gt => ">",
            SqlOperator::Ge => ">=",
            SqlOperator::In => "IN",
        }
    }

    /// Split a leading comparison operator off a search token.
    ///
    /// `">=0.8"` yields `(Ge, "0.8")`; a token without an operator yields
    /// `(Eq, token)`. The remainder is trimmed.
    pub fn split_prefix(token: &str) -> (SqlOperator, &str) {
        let token = token.trim();
        for (prefix, op) in Self::PREFIXES {
            if let Some(rest) = token.strip_prefix(prefix) {
                return (op, rest.trim());
            }
        }
        (SqlOperator::Eq, token)
    }
}

impl FromStr for SqlOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim() {
            "=" | "==" => SqlOperator::Eq,
            "<>" | "!=" => SqlOperator::Ne,
            "<" => SqlOperator::Lt,
            "<=" => SqlOperator::Le,
            ">" => SqlOperator::Gt,
            ">=" => SqlOperator::Ge,
            other if other.eq_ignore_ascii_case("in") => SqlOperator::In,
            other => return Err(format!("Unsupported operator: {}", other)),
        };
        Ok(op)
    }
}

impl fmt::Display for SqlOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Parse a free-form rating typed into the search box.
///
/// Unparseable, empty or non-finite input yields `0.0`.
pub fn parse_search_rating(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(rating) if rating.is_finite() => rating,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_prefix() {
        assert_eq!(SqlOperator::split_prefix(">=0.8"), (SqlOperator::Ge, "0.8"));
        assert_eq!(SqlOperator::split_prefix("<= 0.5"), (SqlOperator::Le, "0.5"));
        assert_eq!(SqlOperator::split_prefix("<>1"), (SqlOperator::Ne, "1"));
        assert_eq!(SqlOperator::split_prefix("!=1"), (SqlOperator::Ne, "1"));
        assert_eq!(SqlOperator::split_prefix("<0.2"), (SqlOperator::Lt, "0.2"));
        assert_eq!(SqlOperator::split_prefix(">0.2"), (SqlOperator::Gt, "0.2"));
        assert_eq!(SqlOperator::split_prefix("=0.6"), (SqlOperator::Eq, "0.6"));
        assert_eq!(SqlOperator::split_prefix(" 0.4 "), (SqlOperator::Eq, "0.4"));
    }

    #[test]
    fn test_operator_from_str() {
        assert_eq!("in".parse::<SqlOperator>(), Ok(SqlOperator::In));
        assert_eq!("In".parse::<SqlOperator>(), Ok(SqlOperator::In));
        assert_eq!("!=".parse::<SqlOperator>(), Ok(SqlOperator::Ne));
        assert!("LIKE".parse::<SqlOperator>().is_err());
        assert_eq!(SqlOperator::Ge.to_string(), ">=");
    }

    #[test]
    fn test_parse_search_rating() {
        assert_eq!(parse_search_rating("0.8"), 0.8);
        assert_eq!(parse_search_rating(" 4 "), 4.0);
        assert_eq!(parse_search_rating(""), 0.0);
        assert_eq!(parse_search_rating("five"), 0.0);
        assert_eq!(parse_search_rating("NaN"), 0.0);
    }
}

//! Filter predicates and the operator whitelist.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MetagraphError, MetagraphResult};
use crate::value::Value;

/// Comparison operators a filter may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Matches,
    StartsWith,
    EndsWith,
    Contains,
}

impl Operator {
    /// Operator as it appears in statement text.
    pub fn as_cypher(&self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::NotEquals => "<>",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::Matches => "=~",
            Self::StartsWith => "STARTS WITH",
            Self::EndsWith => "ENDS WITH",
            Self::Contains => "CONTAINS",
        }
    }
}

impl FromStr for Operator {
    type Err = MetagraphError;

    /// Accepts the symbolic form and the word aliases, case-insensitively and
    /// with `_` or spaces between words.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .split(|c: char| c.is_whitespace() || c == '_')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();

        let op = match normalized.as_str() {
            "=" | "IS" | "EQUALS" => Self::Equals,
            "<>" | "IS NOT" | "NOT EQUALS" => Self::NotEquals,
            "<" | "LESS THAN" => Self::LessThan,
            "<=" | "LESS THAN EQUALS" => Self::LessThanOrEqual,
            ">" | "GREATER THAN" => Self::GreaterThan,
            ">=" | "GREATER THAN EQUALS" => Self::GreaterThanOrEqual,
            "=~" | "MATCHES" => Self::Matches,
            "STARTS WITH" => Self::StartsWith,
            "ENDS WITH" => Self::EndsWith,
            "CONTAINS" => Self::Contains,
            _ => return Err(MetagraphError::UnsupportedOperator(s.to_string())),
        };
        Ok(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_cypher())
    }
}

/// A filter as received from a caller, operator still unchecked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRequest {
    pub model: String,
    pub property: String,
    pub operator: String,
    pub value: Value,
}

/// A validated filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub model: String,
    pub property: String,
    pub operator: Operator,
    pub value: Value,
}

impl Filter {
    pub fn new(
        model: impl Into<String>,
        property: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            model: model.into(),
            property: property.into(),
            operator,
            value: value.into(),
        }
    }

    /// Validate the operator of a caller-supplied filter.
    pub fn parse(request: &FilterRequest) -> MetagraphResult<Self> {
        Ok(Self {
            model: request.model.clone(),
            property: request.property.clone(),
            operator: request.operator.parse()?,
            value: request.value.clone(),
        })
    }

    /// Validate a whole filter set, failing on the first bad operator.
    pub fn parse_all(requests: &[FilterRequest]) -> MetagraphResult<Vec<Self>> {
        requests.iter().map(Self::parse).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbolic_operators() {
        for (raw, op) in [
            ("=", Operator::Equals),
            ("<>", Operator::NotEquals),
            ("<", Operator::LessThan),
            ("<=", Operator::LessThanOrEqual),
            (">", Operator::GreaterThan),
            (">=", Operator::GreaterThanOrEqual),
            ("=~", Operator::Matches),
            ("STARTS WITH", Operator::StartsWith),
            ("ENDS WITH", Operator::EndsWith),
            ("CONTAINS", Operator::Contains),
        ] {
            assert_eq!(raw.parse::<Operator>().unwrap(), op);
            assert_eq!(op.as_cypher(), raw);
        }
    }

    #[test]
    fn test_word_aliases() {
        assert_eq!("is not".parse::<Operator>().unwrap(), Operator::NotEquals);
        assert_eq!("GREATER_THAN_EQUALS".parse::<Operator>().unwrap(), Operator::GreaterThanOrEqual);
        assert_eq!("starts  with".parse::<Operator>().unwrap(), Operator::StartsWith);
    }

    #[test]
    fn test_rejects_unknown_operator() {
        for raw in ["", "==", "OR 1=1 //", "DETACH DELETE", "IN"] {
            match raw.parse::<Operator>() {
                Err(MetagraphError::UnsupportedOperator(op)) => assert_eq!(op, raw),
                other => panic!("{raw:?} should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_all_stops_at_bad_operator() {
        let requests = vec![
            FilterRequest {
                model: "visit".into(),
                property: "day".into(),
                operator: ">".into(),
                value: Value::Integer(3),
            },
            FilterRequest {
                model: "patient".into(),
                property: "name".into(),
                operator: "LIKE".into(),
                value: Value::from("a%"),
            },
        ];
        assert!(matches!(
            Filter::parse_all(&requests),
            Err(MetagraphError::UnsupportedOperator(op)) if op == "LIKE"
        ));
    }
}

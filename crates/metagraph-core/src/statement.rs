//! Parameterised statements handed to the storage engine.

use std::collections::BTreeMap;
use std::fmt;

use crate::value::Value;

/// Statement text plus its bound parameters.
///
/// Caller-supplied literals always travel as parameters; only identifiers that
/// were validated or escaped end up in the text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    text: String,
    params: BTreeMap<String, Value>,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: BTreeMap::new(),
        }
    }

    /// Bind a parameter, builder style.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &BTreeMap<String, Value> {
        &self.params
    }

    pub fn get_param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Quote an identifier (label, relationship type, property key, variable) so
/// that it can be embedded in statement text.
pub fn escape_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("age"), "`age`");
        assert_eq!(escape_identifier("@sort_key"), "`@sort_key`");
        assert_eq!(escape_identifier("a`b"), "`a``b`");
    }

    #[test]
    fn test_params_builder() {
        let stmt = Statement::new("RETURN $x").param("x", 1i64).param("y", "two");
        assert_eq!(stmt.get_param("x"), Some(&Value::Integer(1)));
        assert_eq!(stmt.get_param("y"), Some(&Value::from("two")));
        assert_eq!(stmt.to_string(), "RETURN $x");
    }
}

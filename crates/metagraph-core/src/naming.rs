//! Model name rules.

use crate::error::{MetagraphError, MetagraphResult};

/// Longest accepted model name, in characters.
pub const MAX_NAME_LENGTH: usize = 64;

/// Names that collide with platform concepts.
pub const RESERVED_MODEL_NAMES: &[&str] = &["file"];

/// Validate a model name and return its trimmed form.
///
/// Checks run in a fixed order: empty, length, reserved, pattern.
pub fn validate_model_name(name: &str) -> MetagraphResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(MetagraphError::EmptyName);
    }

    let length = name.chars().count();
    if length > MAX_NAME_LENGTH {
        return Err(MetagraphError::NameTooLong {
            name: name.to_string(),
            length,
            max: MAX_NAME_LENGTH,
        });
    }

    if is_reserved(name) {
        return Err(MetagraphError::ReservedName(name.to_string()));
    }

    if !is_identifier(name) {
        return Err(MetagraphError::InvalidNamePattern(name.to_string()));
    }

    Ok(name.to_string())
}

/// Reserved names are matched case-insensitively.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_MODEL_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name))
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(validate_model_name("  patient \n").unwrap(), "patient");
    }

    #[test]
    fn test_empty_and_blank() {
        assert!(matches!(validate_model_name(""), Err(MetagraphError::EmptyName)));
        assert!(matches!(validate_model_name("   "), Err(MetagraphError::EmptyName)));
    }

    #[test]
    fn test_too_long() {
        let name = "a".repeat(65);
        match validate_model_name(&name) {
            Err(MetagraphError::NameTooLong { length, max, .. }) => {
                assert_eq!(length, 65);
                assert_eq!(max, 64);
            }
            other => panic!("expected NameTooLong, got {other:?}"),
        }
        assert!(validate_model_name(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn test_reserved_is_case_insensitive() {
        assert!(matches!(validate_model_name("file"), Err(MetagraphError::ReservedName(_))));
        assert!(matches!(validate_model_name(" File "), Err(MetagraphError::ReservedName(_))));
        assert!(validate_model_name("files").is_ok());
    }

    #[test]
    fn test_pattern() {
        for bad in ["1visit", "visit-date", "visit date", "päivä", "-x"] {
            assert!(
                matches!(validate_model_name(bad), Err(MetagraphError::InvalidNamePattern(_))),
                "{bad} should be rejected"
            );
        }
        for good in ["_x", "Visit", "visit_2", "A1_b2"] {
            assert!(validate_model_name(good).is_ok(), "{good} should be accepted");
        }
    }

    proptest! {
        #[test]
        fn prop_identifiers_are_accepted(name in "[A-Za-z_][A-Za-z0-9_]{0,63}") {
            prop_assume!(!is_reserved(&name));
            prop_assert_eq!(validate_model_name(&name).unwrap(), name);
        }

        #[test]
        fn prop_leading_digit_is_rejected(name in "[0-9][A-Za-z0-9_]{0,40}") {
            prop_assert!(matches!(
                validate_model_name(&name),
                Err(MetagraphError::InvalidNamePattern(_))
            ));
        }
    }
}

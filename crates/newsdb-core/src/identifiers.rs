use thiserror::Error;

/// Rejected category or keyword input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("identifier must not be empty")]
    Empty,

    #[error("identifier '{input}' contains '{found}'; only letters, hyphens and spaces are allowed")]
    InvalidCharacter { input: String, found: char },

    #[error("identifier '{0}' must not start or end with a hyphen")]
    DanglingHyphen(String),
}

/// Canonicalizes a category name or keyword.
///
/// The input is trimmed, lowercased and inner whitespace is collapsed to a
/// single space. Only alphabetic characters, `-` and whitespace are accepted.
///
/// # Errors
///
/// Returns [`ValidationError`] when the input is empty after trimming,
/// contains a disallowed character, or has a hyphen at either end.
pub fn validate_identifier(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    if let Some(found) = trimmed
        .chars()
        .find(|c| !(c.is_alphabetic() || *c == '-' || c.is_whitespace()))
    {
        return Err(ValidationError::InvalidCharacter {
            input: trimmed.to_string(),
            found,
        });
    }

    let canonical = trimmed
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ");

    if canonical.starts_with('-') || canonical.ends_with('-') {
        return Err(ValidationError::DanglingHyphen(canonical));
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_lowercases_and_collapses() {
        assert_eq!(
            validate_identifier("  Climate   Change ").unwrap(),
            "climate change"
        );
    }

    #[test]
    fn keeps_interior_hyphen() {
        assert_eq!(validate_identifier("E-Commerce").unwrap(), "e-commerce");
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert_eq!(validate_identifier(""), Err(ValidationError::Empty));
        assert_eq!(validate_identifier("   \t"), Err(ValidationError::Empty));
    }

    #[test]
    fn rejects_digits_and_punctuation() {
        assert!(matches!(
            validate_identifier("covid19"),
            Err(ValidationError::InvalidCharacter { found: '1', .. })
        ));
        assert!(matches!(
            validate_identifier("rock&roll"),
            Err(ValidationError::InvalidCharacter { found: '&', .. })
        ));
    }

    #[test]
    fn rejects_leading_hyphen() {
        assert!(matches!(
            validate_identifier("-tech"),
            Err(ValidationError::DanglingHyphen(_))
        ));
    }
}

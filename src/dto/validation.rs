//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest nickname accepted at join time.
pub const MAX_NICKNAME_LEN: usize = 32;

/// Validates that a nickname is non-blank, at most [`MAX_NICKNAME_LEN`]
/// characters, and free of control characters.
///
/// # Examples
///
/// ```ignore
/// validate_nickname("Ana")      // Ok
/// validate_nickname("   ")      // Err - blank
/// validate_nickname("a\nb")     // Err - control character
/// ```
pub fn validate_nickname(nickname: &str) -> Result<(), ValidationError> {
    if nickname.trim().is_empty() {
        let mut err = ValidationError::new("nickname_blank");
        err.message = Some("Nickname must not be blank".into());
        return Err(err);
    }

    if nickname.chars().count() > MAX_NICKNAME_LEN {
        let mut err = ValidationError::new("nickname_length");
        err.message =
            Some(format!("Nickname must be at most {MAX_NICKNAME_LEN} characters").into());
        return Err(err);
    }

    if nickname.chars().any(char::is_control) {
        let mut err = ValidationError::new("nickname_format");
        err.message = Some("Nickname must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_nickname_valid() {
        assert!(validate_nickname("Ana").is_ok());
        assert!(validate_nickname("player one").is_ok());
        assert!(validate_nickname("Ωmega").is_ok());
    }

    #[test]
    fn test_validate_nickname_blank() {
        assert!(validate_nickname("").is_err());
        assert!(validate_nickname("   ").is_err());
        assert!(validate_nickname("\t").is_err());
    }

    #[test]
    fn test_validate_nickname_too_long() {
        let long = "x".repeat(MAX_NICKNAME_LEN + 1);
        assert!(validate_nickname(&long).is_err());
        let max = "x".repeat(MAX_NICKNAME_LEN);
        assert!(validate_nickname(&max).is_ok());
    }

    #[test]
    fn test_validate_nickname_control_chars() {
        assert!(validate_nickname("a\nb").is_err());
        assert!(validate_nickname("a\u{0007}b").is_err());
    }
}

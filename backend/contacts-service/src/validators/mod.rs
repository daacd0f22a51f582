/// Input validation utilities for the contacts API
use validator::ValidateEmail;

/// Validates email format according to RFC 5322
pub fn validate_email(email: &str) -> bool {
    email.validate_email()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("user+tag@example.co.uk"));
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(!validate_email("invalid-email"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email("user@"));
        assert!(!validate_email(""));
    }
}

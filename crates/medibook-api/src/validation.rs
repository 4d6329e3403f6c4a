//! Request validation

use serde::Serialize;

use crate::error::ApiError;

/// Maximum allowed email length
pub const MAX_EMAIL_LENGTH: usize = 254;
/// Minimum allowed password length
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum allowed password length in bytes (bcrypt ignores anything past 72)
pub const MAX_PASSWORD_LENGTH: usize = 72;
/// Maximum length for names and short text fields
pub const MAX_NAME_LENGTH: usize = 100;
/// Maximum length for free-text fields
pub const MAX_TEXT_LENGTH: usize = 2000;

/// One rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Collects every field error before failing
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &'static str, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn email(&mut self, field: &'static str, value: &str) -> &mut Self {
        self.check(is_valid_email(value), field, "Must be a valid email address")
    }

    pub fn password(&mut self, field: &'static str, value: &str) -> &mut Self {
        self.check(
            value.len() >= MIN_PASSWORD_LENGTH,
            field,
            format!("Must be at least {} characters long", MIN_PASSWORD_LENGTH),
        )
        .check(
            value.len() <= MAX_PASSWORD_LENGTH,
            field,
            format!("Must be at most {} bytes long", MAX_PASSWORD_LENGTH),
        )
    }

    /// Non-blank text up to `max` characters
    pub fn text(&mut self, field: &'static str, value: &str, max: usize) -> &mut Self {
        self.check(!value.trim().is_empty(), field, "Must not be empty")
            .check(
                value.chars().count() <= max,
                field,
                format!("Must be at most {} characters long", max),
            )
    }

    /// Like [`Validator::text`] for fields that may be absent
    pub fn optional_text(&mut self, field: &'static str, value: Option<&str>, max: usize) -> &mut Self {
        match value {
            Some(value) => self.check(
                value.chars().count() <= max,
                field,
                format!("Must be at most {} characters long", max),
            ),
            None => self,
        }
    }

    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

/// Lowercased, trimmed form used for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH || email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Empty optional text means "clear the field"
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last+tag@clinic.co.uk"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@@x.com"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("a@x.com."));
    }

    #[test]
    fn test_collects_every_error() {
        let err = Validator::new()
            .email("email", "nope")
            .password("password", "short")
            .text("name", "   ", MAX_NAME_LENGTH)
            .finish()
            .unwrap_err();

        match err {
            ApiError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec!["email", "password", "name"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_password_bounds() {
        assert!(Validator::new().password("p", "longenough1").finish().is_ok());
        assert!(Validator::new().password("p", &"x".repeat(72)).finish().is_ok());
        assert!(Validator::new().password("p", &"x".repeat(73)).finish().is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }

    #[test]
    fn test_blank_to_none() {
        assert_eq!(blank_to_none(Some("  ".into())), None);
        assert_eq!(blank_to_none(Some(" 555 ".into())), Some("555".to_string()));
        assert_eq!(blank_to_none(None), None);
    }
}

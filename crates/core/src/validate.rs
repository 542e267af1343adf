//! Field validation for the contact creation form.
//!
//! Rules are only enforced at creation time; card edits are committed as
//! typed, matching the upstream behavior this tool reproduces.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Minimum number of characters for a contact name.
pub const MIN_NAME_CHARS: usize = 2;
/// Minimum number of characters for a phone number.
pub const MIN_PHONE_CHARS: usize = 10;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .expect("failed to compile email regex")
});

/// A single failed form rule, displayed verbatim under the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    /// Name shorter than [`MIN_NAME_CHARS`].
    #[error("Name must be at least 2 characters.")]
    NameTooShort,
    /// Email not matching the address pattern.
    #[error("Please enter a valid email address.")]
    EmailInvalid,
    /// Phone shorter than [`MIN_PHONE_CHARS`].
    #[error("Phone number must be at least 10 digits.")]
    PhoneTooShort,
}

/// Per-field outcome of validating the creation form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldReport {
    /// Failure for the name field, if any.
    pub name: Option<FieldError>,
    /// Failure for the email field, if any.
    pub email: Option<FieldError>,
    /// Failure for the phone field, if any.
    pub phone: Option<FieldError>,
}

impl FieldReport {
    /// True when every field passed.
    pub fn is_clean(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none()
    }
}

/// Validate the three typed fields of the creation form.
///
/// Lengths count characters, not bytes, so multibyte names are not
/// penalised. Inputs are checked as typed; nothing is trimmed.
pub fn validate_fields(name: &str, email: &str, phone: &str) -> FieldReport {
    FieldReport {
        name: (name.chars().count() < MIN_NAME_CHARS).then_some(FieldError::NameTooShort),
        email: (!is_valid_email(email)).then_some(FieldError::EmailInvalid),
        phone: (phone.chars().count() < MIN_PHONE_CHARS).then_some(FieldError::PhoneTooShort),
    }
}

/// Whether the input matches the address pattern used by the form.
pub fn is_valid_email(input: &str) -> bool {
    EMAIL_RE.is_match(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_fully_valid_submission() {
        let report = validate_fields("Jane Doe", "jane@x.com", "1234567890");
        assert!(report.is_clean());
    }

    #[test]
    fn one_character_names_are_rejected() {
        let report = validate_fields("A", "jane@x.com", "1234567890");
        assert_eq!(report.name, Some(FieldError::NameTooShort));
        assert!(report.email.is_none());
        assert!(report.phone.is_none());
    }

    #[test]
    fn name_length_counts_characters_not_bytes() {
        // Two characters, four bytes.
        assert!(validate_fields("Él", "jane@x.com", "1234567890").is_clean());
        assert_eq!(
            validate_fields("É", "jane@x.com", "1234567890").name,
            Some(FieldError::NameTooShort)
        );
    }

    #[test]
    fn email_needs_local_part_domain_and_tld() {
        for bad in ["jane", "jane@x", "@x.com", "jane doe@x.com", "jane@", ""] {
            assert!(!is_valid_email(bad), "{bad:?} should be rejected");
        }
        for good in ["jane@x.com", "john.roe+tag@mail.example.org"] {
            assert!(is_valid_email(good), "{good:?} should be accepted");
        }
    }

    #[test]
    fn phone_boundary_is_ten_characters() {
        assert!(validate_fields("Jane Doe", "jane@x.com", "1234567890").is_clean());
        assert_eq!(
            validate_fields("Jane Doe", "jane@x.com", "123456789").phone,
            Some(FieldError::PhoneTooShort)
        );
        // Formatting characters count; the rule is length, not digits.
        assert!(validate_fields("Jane Doe", "jane@x.com", "(123) 456-7").is_clean());
    }

    #[test]
    fn failures_accumulate_per_field() {
        let report = validate_fields("", "nope", "123");
        assert_eq!(report.name, Some(FieldError::NameTooShort));
        assert_eq!(report.email, Some(FieldError::EmailInvalid));
        assert_eq!(report.phone, Some(FieldError::PhoneTooShort));
        assert!(!report.is_clean());
    }
}

//! Field validation rules shared by the account, profile and book flows.
//!
//! Messages read as "<field> <message>", e.g. "name is too short
//! (minimum is 2 characters)".

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 20;
pub const INTRODUCTION_MAX: usize = 50;
pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 128;
pub const BOOK_BODY_MAX: usize = 200;

pub const TAKEN: &str = "has already been taken";
pub const BLANK: &str = "can't be blank";
pub const INVALID: &str = "is invalid";

/// Field name -> list of messages, serialized as a JSON object.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{} {}", field, m)))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

fn too_short(min: usize) -> String {
    format!("is too short (minimum is {} characters)", min)
}

fn too_long(max: usize) -> String {
    format!("is too long (maximum is {} characters)", max)
}

/// Length is counted in characters, not bytes.
fn check_length(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    min: Option<usize>,
    max: usize,
) {
    let len = value.chars().count();
    if let Some(min) = min
        && len < min
    {
        errors.add(field, too_short(min));
    } else if len > max {
        errors.add(field, too_long(max));
    }
}

pub fn validate_name(errors: &mut ValidationErrors, name: &str) {
    check_length(errors, "name", name, Some(NAME_MIN), NAME_MAX);
}

pub fn validate_introduction(errors: &mut ValidationErrors, introduction: Option<&str>) {
    if let Some(intro) = introduction {
        check_length(errors, "introduction", intro, None, INTRODUCTION_MAX);
    }
}

/// Same shape the authentication plugin enforces: something@something, no spaces.
pub fn validate_email(errors: &mut ValidationErrors, email: &str) {
    if email.trim().is_empty() {
        errors.add("email", BLANK);
        return;
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        errors.add("email", INVALID);
    }
}

pub fn validate_password(errors: &mut ValidationErrors, password: &str, confirmation: &str) {
    if password.is_empty() {
        errors.add("password", BLANK);
    } else {
        check_length(errors, "password", password, Some(PASSWORD_MIN), PASSWORD_MAX);
    }
    if password != confirmation {
        errors.add("password_confirmation", "doesn't match Password");
    }
}

pub fn validate_book(errors: &mut ValidationErrors, title: &str, body: &str) {
    if title.trim().is_empty() {
        errors.add("title", BLANK);
    }
    if body.trim().is_empty() {
        errors.add("body", BLANK);
    } else {
        check_length(errors, "body", body, None, BOOK_BODY_MAX);
    }
}

pub fn validate_comment(errors: &mut ValidationErrors, comment: &str) {
    if comment.trim().is_empty() {
        errors.add("comment", BLANK);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_errors(name: &str) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        validate_name(&mut errors, name);
        errors
    }

    #[test]
    fn test_name_length_bounds() {
        assert!(name_errors("ann").is_empty());
        assert!(name_errors("an").is_empty());
        assert!(name_errors(&"a".repeat(20)).is_empty());

        let short = name_errors("a");
        assert_eq!(
            short.get("name").unwrap(),
            ["is too short (minimum is 2 characters)"]
        );

        let long = name_errors(&"a".repeat(21));
        assert_eq!(
            long.get("name").unwrap(),
            ["is too long (maximum is 20 characters)"]
        );
    }

    #[test]
    fn test_name_counts_characters_not_bytes() {
        // 10 multi-byte characters, 30 bytes
        assert!(name_errors("本本本本本本本本本本").is_empty());
    }

    #[test]
    fn test_introduction_limit() {
        let mut errors = ValidationErrors::default();
        validate_introduction(&mut errors, Some(&"x".repeat(50)));
        validate_introduction(&mut errors, None);
        assert!(errors.is_empty());

        validate_introduction(&mut errors, Some(&"x".repeat(51)));
        assert_eq!(
            errors.get("introduction").unwrap(),
            ["is too long (maximum is 50 characters)"]
        );
    }

    #[test]
    fn test_email_format() {
        let check = |email: &str| {
            let mut errors = ValidationErrors::default();
            validate_email(&mut errors, email);
            errors
        };
        assert!(check("ann@example.com").is_empty());
        assert_eq!(check("").get("email").unwrap(), [BLANK]);
        assert_eq!(check("ann.example.com").get("email").unwrap(), [INVALID]);
        assert_eq!(check("ann@@example.com").get("email").unwrap(), [INVALID]);
        assert_eq!(check("a nn@example.com").get("email").unwrap(), [INVALID]);
    }

    #[test]
    fn test_password_rules() {
        let mut errors = ValidationErrors::default();
        validate_password(&mut errors, "secret", "secret");
        assert!(errors.is_empty());

        validate_password(&mut errors, "short", "other");
        assert_eq!(
            errors.get("password").unwrap(),
            ["is too short (minimum is 6 characters)"]
        );
        assert_eq!(
            errors.get("password_confirmation").unwrap(),
            ["doesn't match Password"]
        );
    }

    #[test]
    fn test_book_rules() {
        let mut errors = ValidationErrors::default();
        validate_book(&mut errors, "", &"b".repeat(201));
        assert_eq!(errors.get("title").unwrap(), [BLANK]);
        assert_eq!(
            errors.get("body").unwrap(),
            ["is too long (maximum is 200 characters)"]
        );
    }

    #[test]
    fn test_errors_serialize_as_object() {
        let mut errors = ValidationErrors::default();
        errors.add("name", TAKEN);
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({ "name": ["has already been taken"] }));
    }
}

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use zine_msg::{Credentials, SignUpInput};

use crate::Error;

pub const MIN_PASSWORD_LENGTH: usize = 8;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref SPECIAL_RE: Regex = Regex::new(r"[!#$%&*@^]").unwrap();
}

/// A problem with one form field, reported before anything is sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: &str) -> Self {
        FieldError {
            field,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if email.trim().is_empty() {
        errors.push(FieldError::new("email", "Please enter email"));
    } else if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Invalid email"));
    }
}

/// Strength rules for a new password. None when it is acceptable.
pub fn password_problem(password: &str) -> Option<&'static str> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        Some("Password should be at least 8 characters")
    } else if !password.chars().any(|c| c.is_ascii_digit()) {
        Some("Password should contain at least one number")
    } else if !SPECIAL_RE.is_match(password) {
        Some("Password should contain at least one special character: !@#$%^&*")
    } else {
        None
    }
}

fn into_result(errors: Vec<FieldError>) -> Result<(), Error> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(errors))
    }
}

pub fn validate_credentials(credentials: &Credentials) -> Result<(), Error> {
    let mut errors = Vec::new();
    check_email(&credentials.email, &mut errors);
    if credentials.password.is_empty() {
        errors.push(FieldError::new("password", "Please enter password"));
    }
    into_result(errors)
}

pub fn validate_sign_up(input: &SignUpInput) -> Result<(), Error> {
    let mut errors = Vec::new();
    if input.name.trim().is_empty() {
        errors.push(FieldError::new(
            "name",
            "Please enter a name to sign your comments and publication",
        ));
    }
    check_email(&input.email, &mut errors);
    if input.password.is_empty() {
        errors.push(FieldError::new("password", "Please enter password"));
    } else if let Some(problem) = password_problem(&input.password) {
        errors.push(FieldError::new("password", problem));
    }
    into_result(errors)
}

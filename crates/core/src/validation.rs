//! Field-level validation primitives.
//!
//! Validators are pure: they inspect a request and return every violated rule,
//! in rule order. Nothing here short-circuits on the first failure, callers get
//! the full list.

use serde::{Deserialize, Serialize};

/// A single violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Ordered result of applying field rules to one request.
///
/// Empty means valid. Produced fresh per request, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    errors: Vec<FieldError>,
}

impl ValidationOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` against `field` unless `ok` holds.
    pub fn ensure(&mut self, ok: bool, field: &str, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

/// Non-empty list of violations, as carried by a failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.message.as_str())
    }

    /// Messages in validator order, joined with `sep`.
    pub fn joined(&self, sep: &str) -> String {
        self.messages().collect::<Vec<_>>().join(sep)
    }
}

impl core::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.joined(", "))
    }
}

/// Pluggable validator for a request shape.
pub trait Validator<R: ?Sized>: Send + Sync {
    fn validate(&self, request: &R) -> ValidationOutcome;
}

impl<R, F> Validator<R> for F
where
    R: ?Sized,
    F: Fn(&R) -> ValidationOutcome + Send + Sync,
{
    fn validate(&self, request: &R) -> ValidationOutcome {
        self(request)
    }
}

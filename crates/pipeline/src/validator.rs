//! Search term validation.
//!
//! Every search term passes through `TermValidator` before any provider
//! is touched. Checks run in a fixed order and stop at the first failure:
//!
//! 1. Type (only for untyped payloads, see `validate_value`)
//! 2. Trim, NFC-normalize, collapse whitespace; reject empty
//! 3. Minimum length (in chars)
//! 4. Maximum length (in chars)
//! 5. Injection patterns (delegated to a `TermSanitizer`)
//! 6. Character set
//!
//! A sanitizer that errors or panics never leaks out: it becomes a
//! `VALIDATION_ERROR` carrying a fresh correlation id that is also logged.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

/// Punctuation accepted in a term besides letters, numbers and spaces
const ALLOWED_PUNCTUATION: &[char] = &['-', '_', '.', ',', '\'', '!', '?', '@', '&', '#', '+'];

/// Inclusive bounds on the normalized term length, counted in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermBounds {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for TermBounds {
    fn default() -> Self {
        Self {
            min_length: 2,
            max_length: 50,
        }
    }
}

/// Why a term was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorKind {
    InvalidType,
    EmptyTerm,
    TooShort,
    TooLong,
    SecurityThreat,
    InvalidCharacters,
    /// The validator itself failed; carries a correlation id
    ValidationError,
}

impl ValidationErrorKind {
    /// Stable machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            ValidationErrorKind::InvalidType => "SEARCH_INVALID_TYPE",
            ValidationErrorKind::EmptyTerm => "SEARCH_EMPTY_TERM",
            ValidationErrorKind::TooShort => "SEARCH_TERM_TOO_SHORT",
            ValidationErrorKind::TooLong => "SEARCH_TERM_TOO_LONG",
            ValidationErrorKind::SecurityThreat => "SEARCH_SECURITY_THREAT",
            ValidationErrorKind::InvalidCharacters => "SEARCH_INVALID_CHARACTERS",
            ValidationErrorKind::ValidationError => "SEARCH_VALIDATION_ERROR",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorKind::InvalidType => "INVALID_TYPE",
            ValidationErrorKind::EmptyTerm => "EMPTY_TERM",
            ValidationErrorKind::TooShort => "TOO_SHORT",
            ValidationErrorKind::TooLong => "TOO_LONG",
            ValidationErrorKind::SecurityThreat => "SECURITY_THREAT",
            ValidationErrorKind::InvalidCharacters => "INVALID_CHARACTERS",
            ValidationErrorKind::ValidationError => "VALIDATION_ERROR",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured context attached to some rejections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_characters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// A rejected search term.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ValidationDetails>,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: kind.code().to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: ValidationDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Internal failure with a generated correlation id
    fn internal(correlation_id: String) -> Self {
        Self::new(
            ValidationErrorKind::ValidationError,
            format!("Search term could not be validated (reference {})", correlation_id),
        )
        .with_details(ValidationDetails {
            correlation_id: Some(correlation_id),
            ..Default::default()
        })
    }
}

/// A term that passed every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedTerm {
    /// Trimmed, NFC-normalized, single-spaced term
    pub term: String,
    /// Length in chars
    pub char_length: usize,
    /// Length in UTF-8 bytes
    pub byte_length: usize,
}

/// Detects injection attempts in a normalized term.
pub trait TermSanitizer: Send + Sync {
    /// # Returns
    /// * `Ok(Some(name))` - The term matches the named dangerous pattern
    /// * `Ok(None)` - The term looks safe
    /// * `Err` - The sanitizer failed
    fn inspect(&self, term: &str) -> anyhow::Result<Option<String>>;
}

/// Regex-backed sanitizer covering SQL, script and template injection.
pub struct PatternSanitizer {
    patterns: Vec<(String, Regex)>,
}

impl PatternSanitizer {
    /// The built-in pattern set
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_patterns(&[
            ("sql_comment", r"--|/\*|\*/"),
            (
                "sql_statement",
                r"(?i)\b(union\s+(all\s+)?select|drop\s+(table|database)|insert\s+into|delete\s+from|update\s+\w+\s+set|truncate\s+table)\b",
            ),
            ("sql_tautology", r#"(?i)['"]\s*(or|and)\s+['"]?\w+['"]?\s*=\s*['"]?\w+"#),
            ("sql_exec", r"(?i)\b(exec|execute|xp_cmdshell)\s*\("),
            ("script_tag", r"(?i)<\s*/?\s*(script|iframe|object|embed)"),
            ("script_uri", r"(?i)(javascript|vbscript|data)\s*:"),
            ("event_handler", r"(?i)\bon[a-z]+\s*="),
            ("template", r"\{\{|\$\{|<%"),
            ("path_traversal", r"\.\./|\.\.\\"),
            ("null_byte", r"\x00"),
        ])
    }

    /// Build a sanitizer from `(name, regex)` pairs
    pub fn with_patterns(patterns: &[(&str, &str)]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|(name, pattern)| Ok((name.to_string(), Regex::new(pattern)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { patterns })
    }
}

impl TermSanitizer for PatternSanitizer {
    fn inspect(&self, term: &str) -> anyhow::Result<Option<String>> {
        Ok(self
            .patterns
            .iter()
            .find(|(_, regex)| regex.is_match(term))
            .map(|(name, _)| name.clone()))
    }
}

/// Validates and normalizes raw search terms.
#[derive(Clone)]
pub struct TermValidator {
    bounds: TermBounds,
    sanitizer: Arc<dyn TermSanitizer>,
}

impl TermValidator {
    pub fn new(bounds: TermBounds, sanitizer: Arc<dyn TermSanitizer>) -> Self {
        Self { bounds, sanitizer }
    }

    pub fn bounds(&self) -> TermBounds {
        self.bounds
    }

    /// Validate a term from an untyped payload (e.g. a JSON request body).
    pub fn validate_value(&self, raw: &serde_json::Value) -> Result<ValidatedTerm, ValidationError> {
        match raw {
            serde_json::Value::String(term) => self.validate(term),
            other => Err(ValidationError::new(
                ValidationErrorKind::InvalidType,
                format!("Search term must be a string, got {}", json_type_name(other)),
            )),
        }
    }

    /// Validate and normalize a search term.
    pub fn validate(&self, raw: &str) -> Result<ValidatedTerm, ValidationError> {
        let term = normalize(raw);
        if term.is_empty() {
            return Err(ValidationError::new(
                ValidationErrorKind::EmptyTerm,
                "Search term cannot be empty",
            ));
        }

        let char_length = term.chars().count();
        if char_length < self.bounds.min_length {
            return Err(ValidationError::new(
                ValidationErrorKind::TooShort,
                format!(
                    "Search term must be at least {} characters",
                    self.bounds.min_length
                ),
            )
            .with_details(ValidationDetails {
                current_length: Some(char_length),
                min_length: Some(self.bounds.min_length),
                ..Default::default()
            }));
        }
        if char_length > self.bounds.max_length {
            return Err(ValidationError::new(
                ValidationErrorKind::TooLong,
                format!(
                    "Search term must be at most {} characters",
                    self.bounds.max_length
                ),
            )
            .with_details(ValidationDetails {
                current_length: Some(char_length),
                max_length: Some(self.bounds.max_length),
                ..Default::default()
            }));
        }

        if let Some(pattern) = self.run_sanitizer(&term)? {
            debug!("Rejected term matching pattern '{}'", pattern);
            return Err(ValidationError::new(
                ValidationErrorKind::SecurityThreat,
                "Search term contains a disallowed pattern",
            ));
        }

        let invalid: String = term.chars().filter(|c| !is_allowed_char(*c)).collect();
        if !invalid.is_empty() {
            return Err(ValidationError::new(
                ValidationErrorKind::InvalidCharacters,
                "Search term may only contain letters, numbers, spaces, hyphens, underscores and common punctuation",
            )
            .with_details(ValidationDetails {
                invalid_characters: Some(invalid),
                ..Default::default()
            }));
        }

        Ok(ValidatedTerm {
            byte_length: term.len(),
            char_length,
            term,
        })
    }

    /// Run the sanitizer, turning its failures into `VALIDATION_ERROR`.
    fn run_sanitizer(&self, term: &str) -> Result<Option<String>, ValidationError> {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.sanitizer.inspect(term)));
        let cause = match outcome {
            Ok(Ok(verdict)) => return Ok(verdict),
            Ok(Err(e)) => format!("{:#}", e),
            Err(_) => "sanitizer panicked".to_string(),
        };

        let correlation_id = Uuid::new_v4().to_string();
        error!(correlation_id = %correlation_id, "Term validation failed: {}", cause);
        Err(ValidationError::internal(correlation_id))
    }
}

/// Trim, NFC-normalize and collapse internal whitespace runs to one space.
pub fn normalize(raw: &str) -> String {
    let composed: String = raw.nfc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_allowed_char(c: char) -> bool {
    c.is_alphanumeric() || c == ' ' || ALLOWED_PUNCTUATION.contains(&c)
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

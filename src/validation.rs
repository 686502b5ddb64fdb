//! Small composable input checks applied at the handler boundary.
//!
//! A rule is a function from a value to `Ok(())` or a human-readable reason.
//! [`Validator`] runs rules per field and collects every failure as a
//! `field: reason` detail.

use thiserror::Error;

pub type Rule<T> = Box<dyn Fn(&T) -> Result<(), String> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation failed")]
pub struct ValidationError {
    /// `field: reason`, in the order checks ran
    pub details: Vec<String>,
}

impl ValidationError {
    pub fn single(field: &str, reason: impl std::fmt::Display) -> Self {
        Self {
            details: vec![format!("{}: {}", field, reason)],
        }
    }
}

#[derive(Debug, Default)]
pub struct Validator {
    details: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every rule against `value`; all failures are kept, not just the first.
    pub fn check<T: ?Sized>(&mut self, field: &str, value: &T, rules: &[Rule<T>]) -> &mut Self {
        for rule in rules {
            if let Err(reason) = rule(value) {
                self.details.push(format!("{}: {}", field, reason));
            }
        }
        self
    }

    /// Like [`Validator::check`], skipping absent values.
    pub fn check_optional<T: ?Sized>(&mut self, field: &str, value: Option<&T>, rules: &[Rule<T>]) -> &mut Self {
        if let Some(value) = value {
            self.check(field, value, rules);
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ValidationError> {
        if self.details.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                details: std::mem::take(&mut self.details),
            })
        }
    }
}

/// Character count within `min..=max`.
pub fn length(min: usize, max: usize) -> Rule<str> {
    Box::new(move |value: &str| {
        let len = value.chars().count();
        if len < min || len > max {
            Err(format!("length must be between {} and {}", min, max))
        } else {
            Ok(())
        }
    })
}

pub fn max_length(max: usize) -> Rule<str> {
    Box::new(move |value: &str| {
        if value.chars().count() > max {
            Err(format!("length must be at most {}", max))
        } else {
            Ok(())
        }
    })
}

pub fn not_blank() -> Rule<str> {
    Box::new(|value: &str| {
        if value.trim().is_empty() {
            Err("must not be blank".to_string())
        } else {
            Ok(())
        }
    })
}

pub fn range<T>(min: T, max: T) -> Rule<T>
where
    T: PartialOrd + std::fmt::Display + Send + Sync + 'static,
{
    Box::new(move |value: &T| {
        if *value < min || *value > max {
            Err(format!("must be between {} and {}", min, max))
        } else {
            Ok(())
        }
    })
}

/// Syntactic check only: one `@`, a non-empty local part and a dotted domain.
pub fn email() -> Rule<str> {
    Box::new(|value: &str| {
        let valid = match value.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && !value.chars().any(char::is_whitespace)
                    && domain.contains('.')
                    && domain.split('.').all(|label| !label.is_empty())
            }
            None => false,
        };

        if valid {
            Ok(())
        } else {
            Err("must be a well-formed email address".to_string())
        }
    })
}

//! Accumulating configuration validation

/// One failed validation rule
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A number below its minimum
    #[error("Field '{field}' must be at least {min} (got {actual})")]
    TooSmall {
        /// Dotted field path
        field: String,
        /// Smallest accepted value
        min: u64,
        /// Configured value
        actual: u64,
    },

    /// A rule specific to the field failed
    #[error("Field '{field}': {message}")]
    Custom {
        /// Dotted field path
        field: String,
        /// Why the value was rejected
        message: String,
    },
}

/// Collects validation failures for a config section and its children
#[derive(Debug, Default)]
pub struct ConfigValidator {
    errors: Vec<ValidationError>,
    field_prefix: String,
}

impl ConfigValidator {
    /// Validator for the config root
    pub fn new() -> Self {
        Self::default()
    }

    /// Validator for a nested section
    pub fn for_field(&self, field_name: &str) -> Self {
        Self {
            errors: Vec::new(),
            field_prefix: self.full_field_name(field_name),
        }
    }

    /// Require `value >= min`
    pub fn at_least(&mut self, field_name: &str, value: u64, min: u64) -> &mut Self {
        if value < min {
            self.errors.push(ValidationError::TooSmall {
                field: self.full_field_name(field_name),
                min,
                actual: value,
            });
        }
        self
    }

    /// Require `predicate(value)`
    pub fn custom<T: ?Sized>(
        &mut self,
        field_name: &str,
        value: &T,
        predicate: impl FnOnce(&T) -> bool,
        message: &str,
    ) -> &mut Self {
        if !predicate(value) {
            self.errors.push(ValidationError::Custom {
                field: self.full_field_name(field_name),
                message: message.to_string(),
            });
        }
        self
    }

    /// Take over the failures of a nested validator
    pub fn merge(&mut self, other: ConfigValidator) {
        self.errors.extend(other.errors);
    }

    /// `Ok` when every rule passed, otherwise every failure
    pub fn result(self) -> Result<(), Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    fn full_field_name(&self, field_name: &str) -> String {
        if self.field_prefix.is_empty() {
            field_name.to_string()
        } else {
            format!("{}.{field_name}", self.field_prefix)
        }
    }
}

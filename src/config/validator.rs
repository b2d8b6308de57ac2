use thiserror::Error;

use crate::config::{MockRuleConfig, MockRuleStrategy, Settings};

/// Upper bound for generated list lengths
pub const MAX_LIST_LENGTH: usize = 100;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if settings.server.host.is_empty() {
            errors.push(ValidationError::MissingField("server.host".to_string()));
        }

        if settings.schema.path.is_empty() {
            errors.push(ValidationError::MissingField("schema.path".to_string()));
        }

        if settings.mocks.list_length > MAX_LIST_LENGTH {
            errors.push(ValidationError::InvalidValue {
                field: "mocks.list_length".to_string(),
                reason: format!("must be at most {}", MAX_LIST_LENGTH),
            });
        }

        for (type_name, rule) in &settings.rules {
            Self::validate_rule(type_name, rule, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_rule(type_name: &str, rule: &MockRuleConfig, errors: &mut Vec<ValidationError>) {
        let field = |name: &str| format!("rules.{}.{}", type_name, name);

        match rule.strategy {
            MockRuleStrategy::Integer | MockRuleStrategy::Float => {
                Self::validate_range(rule, &field, errors);
            }
            MockRuleStrategy::Enum => {
                if rule.values.as_ref().map_or(true, |v| v.is_empty()) {
                    errors.push(ValidationError::MissingField(field("values")));
                }
            }
            MockRuleStrategy::Pattern => {
                if rule.pattern.is_none() {
                    errors.push(ValidationError::MissingField(field("pattern")));
                }
            }
            MockRuleStrategy::Faker => {
                if rule.faker.is_none() {
                    errors.push(ValidationError::MissingField(field("faker")));
                }
            }
            MockRuleStrategy::Fields => {
                if rule.fields.is_none() {
                    errors.push(ValidationError::MissingField(field("fields")));
                }
            }
            MockRuleStrategy::Constant | MockRuleStrategy::Boolean | MockRuleStrategy::Uuid => {}
        }

        if let Some(list_length) = rule.list_length {
            if list_length > MAX_LIST_LENGTH {
                errors.push(ValidationError::InvalidValue {
                    field: field("list_length"),
                    reason: format!("must be at most {}", MAX_LIST_LENGTH),
                });
            }
        }
    }

    /// Missing bounds default to 0 and 100.
    fn validate_range(
        rule: &MockRuleConfig,
        field: &dyn Fn(&str) -> String,
        errors: &mut Vec<ValidationError>,
    ) {
        let min = rule.min.unwrap_or(0.0);
        let max = rule.max.unwrap_or(100.0);

        let mut finite = true;
        for (name, value) in [("min", min), ("max", max)] {
            if !value.is_finite() {
                finite = false;
                errors.push(ValidationError::InvalidValue {
                    field: field(name),
                    reason: format!("must be a finite number, got {}", value),
                });
            }
        }
        if !finite {
            return;
        }

        if min > max {
            let (name, reason) = match (rule.min, rule.max) {
                (Some(_), Some(_)) => ("min", format!("min ({}) is greater than max ({})", min, max)),
                (Some(_), None) => ("min", format!("min ({}) is greater than the default max (100)", min)),
                _ => ("max", format!("max ({}) is less than the default min (0)", max)),
            };
            errors.push(ValidationError::InvalidValue {
                field: field(name),
                reason,
            });
        } else if !(max - min).is_finite() {
            errors.push(ValidationError::InvalidValue {
                field: field("max"),
                reason: format!("range {}..={} is too wide to sample", min, max),
            });
        }
    }
}

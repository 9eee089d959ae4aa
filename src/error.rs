use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigurationError>;

/// Errors caused by how modules were put together rather than by what they do.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Duplicate registration: a module of type {type_name} is already registered")]
    DuplicateRegistration { type_name: String },

    #[error("Injection target {target} requested by {module} is not a module of that type")]
    InjectionTargetNotAModule { module: String, target: String },

    #[error("Injection target {target} requested by {module} could not be resolved")]
    InjectionTargetUnresolved { module: String, target: String },

    #[error("Invalid configuration value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

impl ConfigurationError {
    pub fn duplicate(type_name: impl Into<String>) -> Self {
        Self::DuplicateRegistration {
            type_name: type_name.into(),
        }
    }

    pub fn not_a_module(module: impl Into<String>, target: impl Into<String>) -> Self {
        Self::InjectionTargetNotAModule {
            module: module.into(),
            target: target.into(),
        }
    }

    pub fn unresolved(module: impl Into<String>, target: impl Into<String>) -> Self {
        Self::InjectionTargetUnresolved {
            module: module.into(),
            target: target.into(),
        }
    }

    pub fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

//! `${VAR}` expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references.
///
/// Bare `$VAR` is left alone, so Ruby globals in a superclass name survive.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, UnsetVar> {
        std::env::var(var).map(Some).map_err(|_| UnsetVar(var.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_set_var() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("H2F_TEST_SUPERCLASS", "Views::Base");
        }
        let result = expand_env("${H2F_TEST_SUPERCLASS}", "widget.superclass").unwrap();
        assert_eq!(result, "Views::Base");
        unsafe {
            std::env::remove_var("H2F_TEST_SUPERCLASS");
        }
    }

    #[test]
    fn test_expand_default() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::remove_var("H2F_TEST_UNSET_BASE");
        }
        let result = expand_env("${H2F_TEST_UNSET_BASE:-app}/views", "output.class_base").unwrap();
        assert_eq!(result, "app/views");
    }

    #[test]
    fn test_expand_missing_var() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::remove_var("H2F_TEST_MISSING");
        }
        let err = expand_env("${H2F_TEST_MISSING}", "widget.superclass").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("H2F_TEST_MISSING"));
        assert!(err.to_string().contains("widget.superclass"));
    }

    #[test]
    fn test_bare_dollar_untouched() {
        assert_eq!(expand_env("$stdout", "widget.superclass").unwrap(), "$stdout");
    }
}

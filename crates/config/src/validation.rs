//! Per-section validation
//!
//! Every section of `config.toml` is a `ConfigSection`; `Config::validate`
//! gathers the errors of all of them so one pass reports every bad field.

pub use crate::error::ValidationError;

/// One `[section]` of the config file
pub trait ConfigSection: Default {
    /// Checks every field, returning all problems found
    fn validate(&self) -> Result<(), Vec<ValidationError>>;

    /// Takes every value from `other`
    fn merge(&mut self, other: Self);

    /// Puts the default back into one field, named `section.field`
    fn restore_default(&mut self, field: &str);

    /// Swaps every invalid field for its default, returning what was replaced
    fn replace_invalid(&mut self) -> Vec<ValidationError> {
        let errors = self.validate().err().unwrap_or_default();
        for error in &errors {
            self.restore_default(&error.field);
        }
        errors
    }

    /// Table name in `config.toml`
    fn section_name(&self) -> &'static str;
}

/// Field checks shared by the sections
pub struct Validator;

impl Validator {
    /// `min..=max`
    pub fn in_range<T>(value: T, min: T, max: T, field: &str) -> Result<(), ValidationError>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if (min..=max).contains(&value) {
            return Ok(());
        }
        Err(ValidationError::with_value(
            field,
            format!("must be between {} and {}", min, max),
            value,
        ))
    }

    /// Rejects empty and whitespace-only strings
    pub fn not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        match value.trim() {
            "" => Err(ValidationError::new(field, "must not be empty")),
            _ => Ok(()),
        }
    }

    /// Requires an `http://` or `https://` prefix followed by a host
    pub fn http_url(value: &str, field: &str) -> Result<(), ValidationError> {
        let host = ["https://", "http://"]
            .iter()
            .find_map(|scheme| value.strip_prefix(scheme));

        match host {
            Some(host) if !host.trim().is_empty() && !host.contains(char::is_whitespace) => {
                Ok(())
            }
            _ => Err(ValidationError::with_value(
                field,
                "must be an http:// or https:// URL",
                value,
            )),
        }
    }

    /// Keeps the failures, `Ok` when there are none
    pub fn collect_errors<I>(results: I) -> Result<(), Vec<ValidationError>>
    where
        I: IntoIterator<Item = Result<(), ValidationError>>,
    {
        let errors: Vec<_> = results.into_iter().filter_map(Result::err).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range_bounds_are_inclusive() {
        assert!(Validator::in_range(1u64, 1, 120, "catalog.timeout_secs").is_ok());
        assert!(Validator::in_range(120u64, 1, 120, "catalog.timeout_secs").is_ok());

        let err = Validator::in_range(121u64, 1, 120, "catalog.timeout_secs").unwrap_err();
        assert_eq!(err.value.as_deref(), Some("121"));
        assert!(Validator::in_range(0u64, 1, 120, "catalog.timeout_secs").is_err());
    }

    #[test]
    fn test_not_empty() {
        assert!(Validator::not_empty("pagemark/0.1", "catalog.user_agent").is_ok());
        assert!(Validator::not_empty("", "catalog.user_agent").is_err());
        assert!(Validator::not_empty(" \t", "catalog.user_agent").is_err());
    }

    #[test]
    fn test_http_url() {
        assert!(Validator::http_url("https://api.openbd.jp", "catalog.base_url").is_ok());
        assert!(Validator::http_url("http://localhost:5000", "catalog.base_url").is_ok());
        assert!(Validator::http_url("ftp://example.com", "catalog.base_url").is_err());
        assert!(Validator::http_url("https://", "catalog.base_url").is_err());
        assert!(Validator::http_url("http://local host", "catalog.base_url").is_err());
        assert!(Validator::http_url("localhost:5000", "catalog.base_url").is_err());
    }

    #[test]
    fn test_collect_errors_keeps_only_failures() {
        assert!(Validator::collect_errors([Ok(()), Ok(())]).is_ok());

        let errors = Validator::collect_errors([
            Ok(()),
            Err(ValidationError::new("catalog.user_agent", "must not be empty")),
            Err(ValidationError::new("app.data_file", "must not be empty")),
        ])
        .unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["catalog.user_agent", "app.data_file"]);
    }
}

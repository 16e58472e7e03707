//! Configuration access port trait.

use crate::domain::error::SwingscanError;
use std::str::FromStr;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Non-negative integer; a present but negative or malformed value is an error.
    fn get_usize(&self, section: &str, key: &str, default: usize) -> Result<usize, SwingscanError> {
        match self.get_string(section, key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| SwingscanError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: format!("expected a non-negative integer, got '{}'", raw.trim()),
                }),
        }
    }
}

/// Parse a value through `FromStr`, falling back to `default` when absent.
pub fn get_parsed<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, SwingscanError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| SwingscanError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            }),
    }
}

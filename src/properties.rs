//! Resolved property bag handed to the adapter by the workload driver.
//!
//! Values are kept as strings and parsed on demand by the typed getters, the
//! same way the driver's own `.properties` files carry them.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KvBenchError;

pub const MYSQL_HOST: &str = "mysql.host";
pub const MYSQL_PORT: &str = "mysql.port";
pub const MYSQL_USER: &str = "mysql.user";
pub const MYSQL_PASSWORD: &str = "mysql.password";
pub const MYSQL_DB_NAME: &str = "mysql.db";
pub const MYSQL_FORCE_INDEX: &str = "mysql.force_index";

pub const THREAD_COUNT: &str = "threadcount";
pub const THREAD_COUNT_DEFAULT: i64 = 200;
pub const USE_SHORT_CONN: &str = "useshortconn";
pub const VERBOSE: &str = "verbose";
pub const SILENCE: &str = "silence";
pub const TABLE_NAME: &str = "table";
pub const TABLE_NAME_DEFAULT: &str = "usertable";
pub const FIELD_COUNT: &str = "fieldcount";
pub const FIELD_COUNT_DEFAULT: i64 = 10;
pub const FIELD_LENGTH: &str = "fieldlength";
pub const FIELD_LENGTH_DEFAULT: i64 = 100;
pub const FIELDS: &str = "fields";
pub const DROP_DATA: &str = "dropdata";
pub const DO_TRANSACTIONS: &str = "dotransactions";

/// String-keyed configuration as resolved by the hosting driver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
    values: HashMap<String, String>,
}

impl Properties {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a flat JSON object of string values.
    ///
    /// # Errors
    /// Returns `KvBenchError::ConfigError` if the text is not a JSON object of strings.
    pub fn from_json_str(json: &str) -> Result<Self, KvBenchError> {
        serde_json::from_str(json)
            .map_err(|e| KvBenchError::ConfigError(format!("invalid property JSON: {e}")))
    }

    /// Parse a single `key=value` assignment, as given on a command line.
    ///
    /// # Errors
    /// Returns `KvBenchError::ConfigError` when there is no `=` or the key is empty.
    pub fn parse_assignment(assignment: &str) -> Result<(String, String), KvBenchError> {
        match assignment.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(KvBenchError::ConfigError(format!(
                "expected key=value, got {assignment:?}"
            ))),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    /// # Errors
    /// Returns `KvBenchError::ConfigError` if the value is neither `true` nor `false`.
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, KvBenchError> {
        match self.get(key).map(str::trim) {
            None | Some("") => Ok(default),
            Some(v) if v.eq_ignore_ascii_case("true") => Ok(true),
            Some(v) if v.eq_ignore_ascii_case("false") => Ok(false),
            Some(v) => Err(KvBenchError::ConfigError(format!(
                "{key} must be true or false, got {v:?}"
            ))),
        }
    }

    /// # Errors
    /// Returns `KvBenchError::ConfigError` if the value does not parse as `T`.
    pub fn get_parsed<T>(&self, key: &str, default: T) -> Result<T, KvBenchError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key).map(str::trim) {
            None | Some("") => Ok(default),
            Some(v) => v
                .parse()
                .map_err(|e| KvBenchError::ConfigError(format!("{key}={v:?}: {e}"))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Extend<(String, String)> for Properties {
    fn extend<I: IntoIterator<Item = (String, String)>>(&mut self, iter: I) {
        self.values.extend(iter);
    }
}

//! Runtime configuration

use std::env;

use crate::encoding::DEFAULT_CAPACITY;

/// Settings read from the environment by the `symdb` binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Initial byte capacity of encoding buffers
    pub builder_capacity: usize,
    /// Log at DEBUG instead of INFO
    pub debug_logging: bool,
    /// Print command output as JSON
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            builder_capacity: DEFAULT_CAPACITY,
            debug_logging: false,
            json: false,
        }
    }
}

impl Config {
    /// `SYMDB_BUILDER_CAPACITY`, `SYMDB_LOG=debug`, `SYMDB_JSON=1`
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            builder_capacity: var("SYMDB_BUILDER_CAPACITY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.builder_capacity),
            debug_logging: var("SYMDB_LOG").is_some_and(|v| v.eq_ignore_ascii_case("debug")),
            json: var("SYMDB_JSON").is_some_and(|v| v == "1"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config(&[]), Config::default());
        assert_eq!(Config::default().builder_capacity, 1024);
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("SYMDB_BUILDER_CAPACITY", "4096"),
            ("SYMDB_LOG", "DEBUG"),
            ("SYMDB_JSON", "1"),
        ]);
        assert_eq!(cfg.builder_capacity, 4096);
        assert!(cfg.debug_logging);
        assert!(cfg.json);
    }

    #[test]
    fn test_bad_capacity_falls_back() {
        let cfg = config(&[("SYMDB_BUILDER_CAPACITY", "lots")]);
        assert_eq!(cfg.builder_capacity, DEFAULT_CAPACITY);
    }
}

//! Cache configuration.

use serde::Deserialize;
use skein_reactive::DEFAULT_INCREMENTAL_DIRECTIVES;

/// Settings for a `SuspenseCache`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct CacheConfig {
    /// Directive names that mark a query as incrementally delivered. The
    /// promise of such a query settles on its first chunk.
    pub incremental_directives: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            incremental_directives: DEFAULT_INCREMENTAL_DIRECTIVES
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        assert_eq!(CacheConfig::default().incremental_directives, vec!["defer".to_string()]);
    }

    #[test]
    fn test_deserialize() {
        let config: CacheConfig =
            serde_json::from_str(r#"{ "incremental_directives": ["defer", "stream"] }"#).unwrap();
        assert_eq!(config.incremental_directives, vec!["defer", "stream"]);

        let config: CacheConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CacheConfig::default());

        assert!(serde_json::from_str::<CacheConfig>(r#"{ "unknown": 1 }"#).is_err());
    }
}

//! Injector configuration.
//!
//! Settings come from code, from the environment (`TOKENIZED_DI_*`), or with
//! the `config` feature, from JSON.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Default limit on nested resolutions before giving up.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Environment variable overriding [`InjectorConfig::max_depth`].
pub const ENV_MAX_DEPTH: &str = "TOKENIZED_DI_MAX_DEPTH";

/// Environment variable overriding [`InjectorConfig::name`].
pub const ENV_NAME: &str = "TOKENIZED_DI_NAME";

/// Settings shared by an injector and all of its children.
///
/// # Examples
///
/// ```
/// use tokenized_di::{Injector, InjectorConfig};
///
/// let config = InjectorConfig::default().with_max_depth(64).with_name("app");
/// let injector = Injector::builder().config(config).build();
///
/// let child = injector.create_child(Vec::new());
/// assert_eq!(child.config().max_depth, 64);
/// assert_eq!(child.config().name.as_deref(), Some("app"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct InjectorConfig {
    /// Longest resolution chain before failing with `DepthExceeded`
    pub max_depth: usize,
    /// Label attached to the injector's log events
    pub name: Option<String>,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            name: None,
        }
    }
}

impl InjectorConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Defaults overridden by `TOKENIZED_DI_*` environment variables.
    ///
    /// Values that do not parse are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = env::var(ENV_MAX_DEPTH) {
            match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_depth = depth,
                _ => tracing::warn!(var = ENV_MAX_DEPTH, value = %raw, "ignoring invalid max depth"),
            }
        }

        if let Ok(name) = env::var(ENV_NAME) {
            if !name.is_empty() {
                config.name = Some(name);
            }
        }

        config
    }

    /// Parse a JSON document; missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.with_max_depth(config.max_depth))
    }

    pub(crate) fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("injector")
    }
}

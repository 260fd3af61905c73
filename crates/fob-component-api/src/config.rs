//! Extraction options and their figment-based loading.

use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format as _, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "fob-docs.toml";

/// Options controlling component API extraction.
///
/// The conventions default to Svelte 5 runes: a `Props` interface, a
/// `$props()` destructuring, `onX` callback props and `dispatch('x')`
/// call sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Name of the structured type declaring the component parameters.
    pub props_type_name: String,
    /// Name of the initializer call whose destructuring carries defaults.
    pub props_rune: String,
    /// Prefix marking callback members as events.
    pub event_prefix: String,
    /// Name of the event dispatch function.
    pub dispatch_function: String,
    /// Deadline for a single component analysis, in milliseconds.
    pub analysis_timeout_ms: u64,
    /// Resolve capitalized type names referenced by parameters.
    pub resolve_parameter_types: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            props_type_name: "Props".to_string(),
            props_rune: "$props".to_string(),
            event_prefix: "on".to_string(),
            dispatch_function: "dispatch".to_string(),
            analysis_timeout_ms: 5_000,
            resolve_parameter_types: true,
        }
    }
}

impl ExtractOptions {
    /// Load options from multiple sources.
    /// Priority: environment variables > config file > defaults
    ///
    /// Without an explicit path, `fob-docs.toml` in the working directory is
    /// used when present. Environment variables use the `FOB_DOCS_` prefix,
    /// e.g. `FOB_DOCS_PROPS_TYPE_NAME` sets `props_type_name`.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = config_path.map(|p| p.to_path_buf()).or_else(|| {
            let default_path = Path::new(CONFIG_FILE_NAME);
            default_path.exists().then(|| default_path.to_path_buf())
        });

        if let Some(path) = config_file {
            tracing::debug!("Loading extraction options from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("FOB_DOCS_"));

        Ok(figment.extract()?)
    }

    /// Deadline for a single component analysis.
    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_millis(self.analysis_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_follow_svelte_conventions() {
        let options = ExtractOptions::default();
        assert_eq!(options.props_type_name, "Props");
        assert_eq!(options.props_rune, "$props");
        assert_eq!(options.event_prefix, "on");
        assert_eq!(options.analysis_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn loads_toml_over_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "props_type_name = \"ButtonProps\"").unwrap();
        writeln!(file, "analysis_timeout_ms = 250").unwrap();

        let options = ExtractOptions::load(Some(file.path())).unwrap();
        assert_eq!(options.props_type_name, "ButtonProps");
        assert_eq!(options.analysis_timeout_ms, 250);
        assert_eq!(options.props_rune, "$props");
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "analysis_timeout_ms = \"soon\"").unwrap();

        let result = ExtractOptions::load(Some(file.path()));
        assert!(matches!(result, Err(crate::error::ApiError::Config(_))));
    }
}

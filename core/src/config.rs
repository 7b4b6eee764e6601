//! Generation configuration.
//!
//! Every key is optional in the YAML form; missing keys take their defaults.
//!
//! # Example YAML
//!
//! ```yaml
//! abbreviate_options: true
//! inherit_options: true
//! option_stacking: false
//! bash_completions_version: [2, 12]
//! include_files:
//!   - extra-completions.sh
//! disable_when: true
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Version of the bash-completion library the generated script targets.
///
/// # Examples
///
/// ```
/// use completion_schema_core::BashCompletionsVersion;
///
/// assert!(!BashCompletionsVersion::default().has_comp_api());
/// assert!(BashCompletionsVersion(2, 12).has_comp_api());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BashCompletionsVersion(pub u32, pub u32);

impl BashCompletionsVersion {
    /// First version providing `_comp_compgen` and `_comp_initialize`.
    pub const COMP_API: BashCompletionsVersion = BashCompletionsVersion(2, 12);

    /// Returns `true` if the `_comp_*` helper API is available.
    pub fn has_comp_api(self) -> bool {
        self >= Self::COMP_API
    }
}

impl Default for BashCompletionsVersion {
    fn default() -> Self {
        BashCompletionsVersion(2, 11)
    }
}

/// Options controlling code generation.
///
/// # Examples
///
/// ```
/// use completion_schema_core::Config;
///
/// let config: Config = serde_yaml::from_str("abbreviate_options: true").unwrap();
/// assert!(config.abbreviate_options);
/// assert!(config.option_stacking);
/// assert!(!config.inherit_options);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Accept unique prefixes of subcommand names.
    pub abbreviate_commands: bool,
    /// Accept unique prefixes of long options.
    pub abbreviate_options: bool,
    /// Default for options without an explicit `repeatable`.
    pub repeatable_options: bool,
    /// Default for commands without an explicit `inherit_options`.
    pub inherit_options: bool,
    /// Short options may be clustered (`-abc`).
    pub option_stacking: bool,
    /// Append an editor modeline to the script.
    pub vim_modeline: bool,
    /// Zsh: emit a `#compdef` header and call the function directly instead
    /// of registering it with `compdef`.
    pub zsh_compdef: bool,
    pub bash_completions_version: BashCompletionsVersion,
    /// Emit tracing of the embedded parser to stderr.
    pub debug: bool,
    /// Files whose contents are copied verbatim into the script.
    pub include_files: Vec<PathBuf>,
    /// Offer hidden options like any other option.
    pub disable_hidden: bool,
    /// Ignore the `final` flag of every option.
    pub disable_final: bool,
    /// Ignore mutual-exclusion groups.
    pub disable_groups: bool,
    /// Treat every option as repeatable.
    pub disable_repeatable: bool,
    /// Ignore `when` conditions.
    pub disable_when: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            abbreviate_commands: false,
            abbreviate_options: false,
            repeatable_options: false,
            inherit_options: false,
            option_stacking: true,
            vim_modeline: true,
            zsh_compdef: true,
            bash_completions_version: BashCompletionsVersion::default(),
            debug: false,
            include_files: Vec::new(),
            disable_hidden: false,
            disable_final: false,
            disable_groups: false,
            disable_repeatable: false,
            disable_when: false,
        }
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be read,
    /// or [`YamlError`](ConfigError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be
    /// written, or [`YamlError`](ConfigError::YamlError) if serialization
    /// fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.option_stacking);
        assert!(config.zsh_compdef);
        assert!(!config.abbreviate_commands);
        assert_eq!(config.bash_completions_version, BashCompletionsVersion(2, 11));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_version_tuple() {
        let config: Config = serde_yaml::from_str("bash_completions_version: [2, 12]").unwrap();
        assert!(config.bash_completions_version.has_comp_api());
        assert!(BashCompletionsVersion(3, 0).has_comp_api());
        assert!(!BashCompletionsVersion(2, 9).has_comp_api());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        let config = Config {
            abbreviate_options: true,
            include_files: vec![PathBuf::from("extra.sh")],
            disable_groups: true,
            ..Config::default()
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("missing.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}

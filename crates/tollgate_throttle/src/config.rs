//! Configuration for provider policies.
//!
//! Policies are loaded from TOML with the following precedence (later sources
//! override earlier ones):
//! 1. Bundled defaults (include_str! from tollgate.toml)
//! 2. User config in home directory (~/.config/tollgate/tollgate.toml)
//! 3. User config in current directory (./tollgate.toml)
//!
//! Individual limits can then be overridden from the environment with
//! variables named after the provider, e.g. `OPENAI_REQUESTS_PER_MINUTE` or
//! `ANTHROPIC_INPUT_TOKENS_PER_MINUTE`.

use crate::{Policy, PolicyTable};
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tollgate_error::{ConfigError, TollgateError, TollgateResult};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../tollgate.toml");

/// Top-level throttle configuration.
///
/// # Example
///
/// ```no_run
/// use tollgate_throttle::ThrottleConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = ThrottleConfig::load()?;
/// config.apply_env_overrides()?;
///
/// let openai = config.providers.get("openai").unwrap();
/// println!("OpenAI RPM: {}", openai.requests_per_minute);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
pub struct ThrottleConfig {
    /// Map of provider name to its policy
    #[serde(default)]
    pub providers: PolicyTable,
}

impl ThrottleConfig {
    /// Read provider policies from one TOML file.
    ///
    /// Only the policies in that file are returned; the bundled defaults are
    /// not merged in.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or does not describe policies.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> TollgateResult<Self> {
        let path = path.as_ref();
        let builder = Config::builder().add_source(File::from(path));
        Self::collect_policies(builder, &path.display().to_string())
    }

    /// Parse provider policies from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not describe policies.
    pub fn from_toml(source: &str) -> TollgateResult<Self> {
        let builder = Config::builder().add_source(File::from_str(source, FileFormat::Toml));
        Self::collect_policies(builder, "inline TOML")
    }

    /// The bundled defaults alone, ignoring user files and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled file is malformed.
    pub fn bundled() -> TollgateResult<Self> {
        Self::from_toml(DEFAULT_CONFIG)
    }

    /// Bundled policies with user files layered on top.
    ///
    /// A provider table in `~/.config/tollgate/tollgate.toml` replaces fields
    /// of the bundled one, and `./tollgate.toml` replaces both. Either file may
    /// be absent. Environment variables are a separate step, see
    /// [`ThrottleConfig::apply_env_overrides`].
    ///
    /// # Errors
    ///
    /// Returns an error if a user file exists but does not describe policies.
    #[instrument]
    pub fn load() -> TollgateResult<Self> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let user_policies = home.join(".config/tollgate/tollgate.toml");
            debug!(path = %user_policies.display(), "Layering user policies");
            builder = builder.add_source(File::from(user_policies).required(false));
        }
        builder = builder.add_source(File::with_name("tollgate").required(false));

        Self::collect_policies(builder, "bundled and user policy files")
    }

    fn collect_policies(
        builder: ConfigBuilder<DefaultState>,
        origin: &str,
    ) -> TollgateResult<Self> {
        let config: Self = builder
            .build()
            .and_then(|layered| layered.try_deserialize())
            .map_err(|e| {
                TollgateError::from(ConfigError::new(format!(
                    "Cannot read provider policies from {}: {}",
                    origin, e
                )))
            })?;
        debug!(origin, providers = config.providers.len(), "Provider policies loaded");
        Ok(config)
    }

    /// Override limits from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a matching variable does not parse as a number.
    pub fn apply_env_overrides(&mut self) -> TollgateResult<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Override limits from an arbitrary variable lookup.
    ///
    /// For each configured provider, variables are named
    /// `<PROVIDER>_<FIELD>` with the provider upper-cased and `-` mapped to
    /// `_`, for example `AZURE_OUTPUT_TOKENS_PER_MINUTE`.
    ///
    /// # Example
    ///
    /// ```
    /// use tollgate_throttle::ThrottleConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut config = ThrottleConfig::bundled()?;
    /// config.apply_overrides_from(|key| {
    ///     (key == "OPENAI_REQUESTS_PER_MINUTE").then(|| "60".to_string())
    /// })?;
    /// assert_eq!(config.providers["openai"].requests_per_minute, 60);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if a matching variable does not parse as a number.
    #[instrument(skip(self, lookup))]
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> TollgateResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        for (provider, policy) in self.providers.iter_mut() {
            let prefix = provider.to_uppercase().replace('-', "_");
            let var = |field: &str| format!("{}_{}", prefix, field);

            if let Some(rpm) = parse_override(&lookup, &var("REQUESTS_PER_MINUTE"))? {
                policy.requests_per_minute = rpm;
            }
            if let Some(rph) = parse_override(&lookup, &var("REQUESTS_PER_HOUR"))? {
                policy.requests_per_hour = Some(rph);
            }
            if let Some(rpd) = parse_override(&lookup, &var("REQUESTS_PER_DAY"))? {
                policy.requests_per_day = Some(rpd);
            }
            if let Some(input) = parse_override(&lookup, &var("INPUT_TOKENS_PER_MINUTE"))? {
                policy.input_tokens_per_minute = Some(input);
            }
            if let Some(output) = parse_override(&lookup, &var("OUTPUT_TOKENS_PER_MINUTE"))? {
                policy.output_tokens_per_minute = Some(output);
            }
        }
        Ok(())
    }

    /// Check every provider policy.
    ///
    /// # Errors
    ///
    /// Returns the first invalid policy as a configuration error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.providers
            .iter()
            .try_for_each(|(provider, policy)| policy.validate(provider))
    }

    /// Policy for `provider`, if configured.
    pub fn policy(&self, provider: &str) -> Option<&Policy> {
        self.providers.get(provider)
    }
}

fn parse_override<T, F>(lookup: &F, key: &str) -> TollgateResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };

    let value = raw.trim().parse().map_err(|e| {
        ConfigError::new(format!("Invalid value '{}' for {}: {}", raw, key, e))
    })?;
    debug!(key, "Applying environment override");
    Ok(Some(value))
}

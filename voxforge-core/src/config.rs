use crate::error::{Error, Result};
use crate::provider::{ProviderConfig, ProviderType};
use std::time::Duration;

pub const DEFAULT_BIND: &str = "0.0.0.0:3001";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_JOURNAL_CAPACITY: usize = 64;
pub const DEFAULT_MORPH_SAMPLE: usize = 100;

/// Settings for the forge and the server around it.
///
/// Read once at process start. The credential may be absent: the server
/// still starts, and each forge request then fails with a configuration error.
#[derive(Clone)]
pub struct ForgeConfig {
    /// Which provider backend to talk to.
    pub provider: ProviderType,
    /// Provider credential.
    pub api_key: Option<String>,
    /// Name of the variable the credential was looked up under.
    pub api_key_env: String,
    /// Model override; the provider default otherwise.
    pub model: Option<String>,
    /// API base URL override.
    pub base_url: Option<String>,
    /// Bounded wait for one provider call.
    pub timeout: Duration,
    /// Address the HTTP server binds to.
    pub bind_address: String,
    /// Number of journal entries kept before the oldest is overwritten.
    pub journal_capacity: usize,
    /// Voxels of the prior model included in a morph prompt.
    pub morph_sample: usize,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            provider: ProviderType::Gemini,
            api_key: None,
            api_key_env: ProviderType::Gemini.credential_env().to_string(),
            model: None,
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            bind_address: DEFAULT_BIND.to_string(),
            journal_capacity: DEFAULT_JOURNAL_CAPACITY,
            morph_sample: DEFAULT_MORPH_SAMPLE,
        }
    }
}

impl ForgeConfig {
    /// Builds a configuration from environment variables, falling back to
    /// the defaults above.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ForgeConfig::from_env`] over an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let provider = match var("VOXFORGE_PROVIDER") {
            Some(name) => name
                .parse::<ProviderType>()
                .map_err(|_| Error::config_invalid("VOXFORGE_PROVIDER", name))?,
            None => ProviderType::Gemini,
        };

        let (api_key, api_key_env) = match var("VOXFORGE_API_KEY") {
            Some(key) => (Some(key), "VOXFORGE_API_KEY".to_string()),
            None => {
                let env = provider.credential_env();
                (var(env), env.to_string())
            }
        };

        let timeout_secs: u64 = parse_or(&var, "VOXFORGE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(Error::config_invalid("VOXFORGE_TIMEOUT_SECS", "0"));
        }

        let journal_capacity = parse_or(&var, "VOXFORGE_JOURNAL_CAPACITY", DEFAULT_JOURNAL_CAPACITY)?;
        if journal_capacity == 0 {
            return Err(Error::config_invalid("VOXFORGE_JOURNAL_CAPACITY", "0"));
        }

        let morph_sample = parse_or(&var, "VOXFORGE_MORPH_SAMPLE", DEFAULT_MORPH_SAMPLE)?;
        if morph_sample == 0 {
            return Err(Error::config_invalid("VOXFORGE_MORPH_SAMPLE", "0"));
        }

        Ok(Self {
            provider,
            api_key,
            api_key_env,
            model: var("VOXFORGE_MODEL"),
            base_url: var("VOXFORGE_BASE_URL"),
            timeout: Duration::from_secs(timeout_secs),
            bind_address: var("VOXFORGE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            journal_capacity,
            morph_sample,
        })
    }

    /// Whether a usable credential was supplied
    pub fn has_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Provider settings for one request
    pub fn provider_config(&self, api_key: &str) -> ProviderConfig {
        let mut config = ProviderConfig::for_type(self.provider, api_key)
            .with_timeout(self.timeout.as_secs().max(1));
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        config
    }
}

// The credential never reaches logs.
impl std::fmt::Debug for ForgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForgeConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("bind_address", &self.bind_address)
            .field("journal_capacity", &self.journal_capacity)
            .field("morph_sample", &self.morph_sample)
            .finish()
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw.parse().map_err(|_| Error::config_invalid(key.to_string(), raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ForgeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.provider, ProviderType::Gemini);
        assert!(!config.has_credential());
        assert_eq!(config.api_key_env, "GOOGLE_API_KEY");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.bind_address, "0.0.0.0:3001");
        assert_eq!(config.journal_capacity, 64);
        assert_eq!(config.morph_sample, 100);
    }

    #[test]
    fn test_provider_specific_credential() {
        let config = ForgeConfig::from_lookup(lookup(&[
            ("VOXFORGE_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
            ("GOOGLE_API_KEY", "ignored"),
        ]))
        .unwrap();
        assert_eq!(config.provider, ProviderType::OpenAI);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_generic_credential_wins() {
        let config = ForgeConfig::from_lookup(lookup(&[
            ("VOXFORGE_API_KEY", "generic"),
            ("GOOGLE_API_KEY", "specific"),
        ]))
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("generic"));
    }

    #[test]
    fn test_blank_credential_is_absent() {
        let config = ForgeConfig::from_lookup(lookup(&[("GOOGLE_API_KEY", "   ")])).unwrap();
        assert!(!config.has_credential());
    }

    #[test]
    fn test_invalid_values() {
        let err = ForgeConfig::from_lookup(lookup(&[("VOXFORGE_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let err = ForgeConfig::from_lookup(lookup(&[("VOXFORGE_TIMEOUT_SECS", "0")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let err = ForgeConfig::from_lookup(lookup(&[("VOXFORGE_JOURNAL_CAPACITY", "0")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let err = ForgeConfig::from_lookup(lookup(&[("VOXFORGE_MORPH_SAMPLE", "0")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.context_value("key"), Some("VOXFORGE_MORPH_SAMPLE"));

        let err = ForgeConfig::from_lookup(lookup(&[("VOXFORGE_PROVIDER", "llama")])).unwrap_err();
        assert_eq!(err.context_value("key"), Some("VOXFORGE_PROVIDER"));
    }

    #[test]
    fn test_provider_config_overrides() {
        let config = ForgeConfig::from_lookup(lookup(&[
            ("VOXFORGE_MODEL", "gemini-1.5-flash"),
            ("VOXFORGE_BASE_URL", "http://localhost:9999"),
            ("VOXFORGE_TIMEOUT_SECS", "12"),
        ]))
        .unwrap();
        let provider = config.provider_config("key");
        assert_eq!(provider.default_model.as_deref(), Some("gemini-1.5-flash"));
        assert_eq!(provider.base_url.as_deref(), Some("http://localhost:9999"));
        assert_eq!(provider.timeout_secs, Some(12));
        assert_eq!(provider.api_key.as_deref(), Some("key"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ForgeConfig::from_lookup(lookup(&[("GOOGLE_API_KEY", "secret-value")])).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-value"));
        assert!(debug.contains("<redacted>"));
    }
}

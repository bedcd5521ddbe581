//! Configuration loading and validation for the hello-back service.
//!
//! A base configuration (defaults, optionally overridden by a `config.*`
//! file in the working directory) is overlaid with a fixed set of `SHB_*`
//! environment variables. The process refuses to start if HTTPS is enabled
//! without complete keystore settings, or if an override cannot be coerced
//! to its target type.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use thiserror::Error;

/// Environment override for the keystore file path.
pub const ENV_KEYSTORE_FILE: &str = "SHB_KEYSTORE_FILE";
/// Environment override for inline base64 keystore contents.
pub const ENV_KEYSTORE_CONTENTS: &str = "SHB_KEYSTORE_CONTENTS";
/// Environment override for the keystore passphrase.
pub const ENV_KEYSTORE_PASS: &str = "SHB_KEYSTORE_PASS";
/// Environment override for the listen port.
pub const ENV_HTTP_PORT: &str = "SHB_HTTP_PORT";
/// Generic listen-port alias (e.g. set by PaaS environments). Applied after
/// [`ENV_HTTP_PORT`], so it wins when both are set.
pub const ENV_PORT: &str = "PORT";
/// Environment override for the HTTPS toggle.
pub const ENV_USE_SSL: &str = "SHB_USE_SSL";

/// Raw configuration: defaults plus whatever the optional config file set.
#[derive(Debug, Clone, Deserialize)]
pub struct BaseConfig {
    /// Port the HTTP(S) listener binds to.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Whether to terminate TLS on the listener.
    #[serde(default = "default_use_https")]
    pub use_https: bool,

    /// Filesystem path to the PKCS#12 keystore bundle.
    #[serde(default)]
    pub keystore_file: Option<String>,

    /// Base64-encoded PKCS#12 keystore bundle, supplied inline.
    #[serde(default)]
    pub keystore_contents: Option<String>,

    /// Keystore passphrase.
    #[serde(default)]
    pub keystore_pass: Option<String>,

    /// Greeting prefix substituted into the response template.
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_http_port() -> u16 {
    8443
}
fn default_use_https() -> bool {
    true
}
fn default_greeting() -> String {
    "Hey".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            use_https: default_use_https(),
            keystore_file: None,
            keystore_contents: None,
            keystore_pass: None,
            greeting: default_greeting(),
            log_level: default_log_level(),
        }
    }
}

impl BaseConfig {
    /// Read the base configuration from an optional `config.*` file in the
    /// working directory, falling back to defaults for anything unset.
    pub fn from_file() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .build()
            .context("failed to read base configuration file")?;

        cfg.try_deserialize()
            .context("failed to deserialise base configuration")
    }
}

/// Where the TLS keystore bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeystoreSource {
    /// Read the bundle from this path at startup. The path is handed to the
    /// TLS layer unresolved; a missing file surfaces there, not here.
    File(PathBuf),
    /// Bundle bytes supplied inline, already base64-decoded.
    Inline(Vec<u8>),
}

/// TLS settings, present exactly when the HTTPS toggle is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    /// Keystore bundle source.
    pub keystore: KeystoreSource,
    /// Passphrase protecting the bundle.
    pub passphrase: String,
}

/// Validated runtime configuration, immutable after startup.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    /// Port the listener binds to.
    pub port: u16,
    /// TLS settings; `None` means plain HTTP.
    pub tls: Option<TlsSettings>,
    /// Greeting prefix for the response template.
    pub greeting: String,
    /// Tracing log level.
    pub log_level: String,
}

/// Startup-time configuration failure.
///
/// Carries **every** missing or invalid field found during resolution, not
/// just the first.
#[derive(Debug, Error)]
#[error("invalid configuration: {}", .problems.join("; "))]
pub struct ConfigError {
    /// One entry per missing or invalid field.
    pub problems: Vec<String>,
}

impl EffectiveConfig {
    /// Load the base configuration file (if any) and resolve it against the
    /// process environment.
    pub fn load() -> Result<Self> {
        let base = BaseConfig::from_file()?;
        let env: HashMap<String, String> = std::env::vars().collect();
        Ok(Self::resolve(base, &env)?)
    }

    /// Overlay `env` onto `base` and validate the result.
    ///
    /// Each override, when present and non-empty, replaces the corresponding
    /// base value; an absent variable never clears one. Overrides are applied
    /// in a fixed order: [`ENV_PORT`] after [`ENV_HTTP_PORT`], so the generic
    /// alias wins when both are set.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] listing every override that failed coercion and, when
    /// HTTPS is enabled, every missing keystore field.
    pub fn resolve(
        mut base: BaseConfig,
        env: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut problems = Vec::new();

        if let Some(value) = non_empty(env, ENV_KEYSTORE_FILE) {
            base.keystore_file = Some(value.to_owned());
        }
        if let Some(value) = non_empty(env, ENV_KEYSTORE_CONTENTS) {
            base.keystore_contents = Some(value.to_owned());
        }
        if let Some(value) = non_empty(env, ENV_KEYSTORE_PASS) {
            base.keystore_pass = Some(value.to_owned());
        }
        for name in [ENV_HTTP_PORT, ENV_PORT] {
            if let Some(value) = non_empty(env, name) {
                match value.parse::<u16>() {
                    Ok(port) => base.http_port = port,
                    Err(_) => problems.push(format!("{name} is not a valid port: {value:?}")),
                }
            }
        }
        if let Some(value) = non_empty(env, ENV_USE_SSL) {
            match value.parse::<bool>() {
                Ok(flag) => base.use_https = flag,
                Err(_) => {
                    problems.push(format!("{ENV_USE_SSL} is not a valid boolean: {value:?}"));
                }
            }
        }

        let tls = if base.use_https {
            resolve_tls(&base, &mut problems)
        } else {
            None
        };

        if !problems.is_empty() {
            return Err(ConfigError { problems });
        }

        Ok(Self {
            port: base.http_port,
            tls,
            greeting: base.greeting,
            log_level: base.log_level,
        })
    }
}

/// Validate and assemble the keystore settings once HTTPS is known to be on.
///
/// Either a file path or inline contents satisfies the keystore requirement;
/// inline contents take precedence when both are set. Inline contents are
/// base64-decoded here so the TLS layer only ever sees raw bytes.
fn resolve_tls(base: &BaseConfig, problems: &mut Vec<String>) -> Option<TlsSettings> {
    let keystore = match (&base.keystore_contents, &base.keystore_file) {
        (Some(contents), _) => match BASE64.decode(contents) {
            Ok(bytes) => Some(KeystoreSource::Inline(bytes)),
            Err(e) => {
                problems.push(format!("keystore_contents is not valid base64: {e}"));
                None
            }
        },
        (None, Some(path)) => Some(KeystoreSource::File(PathBuf::from(path))),
        (None, None) => {
            problems.push(
                "keystore_file or keystore_contents is required when use_https is enabled".into(),
            );
            None
        }
    };

    let passphrase = match &base.keystore_pass {
        Some(pass) => Some(pass.clone()),
        None => {
            problems.push("keystore_pass is required when use_https is enabled".into());
            None
        }
    };

    match (keystore, passphrase) {
        (Some(keystore), Some(passphrase)) => Some(TlsSettings {
            keystore,
            passphrase,
        }),
        _ => None,
    }
}

/// Present-and-non-empty environment lookup. Empty values count as unset.
fn non_empty<'a>(env: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    env.get(name).map(String::as_str).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn plain_http_base() -> BaseConfig {
        BaseConfig {
            use_https: false,
            ..BaseConfig::default()
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_http_port(), 8443);
        assert!(default_use_https());
        assert_eq!(default_greeting(), "Hey");
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn plain_http_resolves_without_keystore_settings() {
        let cfg = EffectiveConfig::resolve(plain_http_base(), &env(&[])).unwrap();
        assert_eq!(cfg.port, 8443);
        assert_eq!(cfg.tls, None);
        assert_eq!(cfg.greeting, "Hey");
    }

    #[test]
    fn https_without_keystore_fields_names_both() {
        let err = EffectiveConfig::resolve(BaseConfig::default(), &env(&[])).unwrap_err();
        assert_eq!(err.problems.len(), 2);
        let rendered = err.to_string();
        assert!(rendered.contains("keystore_file"));
        assert!(rendered.contains("keystore_contents"));
        assert!(rendered.contains("keystore_pass"));
    }

    #[test]
    fn env_keystore_path_and_passphrase_resolve_https() {
        let environment = env(&[
            (ENV_KEYSTORE_FILE, "/etc/shb/keystore.p12"),
            (ENV_KEYSTORE_PASS, "changeit"),
        ]);
        let cfg = EffectiveConfig::resolve(BaseConfig::default(), &environment).unwrap();
        let tls = cfg.tls.unwrap();
        assert_eq!(
            tls.keystore,
            KeystoreSource::File(PathBuf::from("/etc/shb/keystore.p12"))
        );
        assert_eq!(tls.passphrase, "changeit");
    }

    #[test]
    fn inline_contents_take_precedence_and_are_decoded() {
        let encoded = BASE64.encode(b"pkcs12 bundle bytes");
        let environment = env(&[
            (ENV_KEYSTORE_FILE, "/etc/shb/keystore.p12"),
            (ENV_KEYSTORE_CONTENTS, &encoded),
            (ENV_KEYSTORE_PASS, "changeit"),
        ]);
        let cfg = EffectiveConfig::resolve(BaseConfig::default(), &environment).unwrap();
        assert_eq!(
            cfg.tls.unwrap().keystore,
            KeystoreSource::Inline(b"pkcs12 bundle bytes".to_vec())
        );
    }

    #[test]
    fn invalid_inline_base64_is_a_config_error() {
        let environment = env(&[
            (ENV_KEYSTORE_CONTENTS, "not!!valid!!base64"),
            (ENV_KEYSTORE_PASS, "changeit"),
        ]);
        let err = EffectiveConfig::resolve(BaseConfig::default(), &environment).unwrap_err();
        assert!(err.to_string().contains("keystore_contents"));
    }

    #[test]
    fn generic_port_alias_wins_over_prefixed_variable() {
        let environment = env(&[(ENV_HTTP_PORT, "9000"), (ENV_PORT, "9443")]);
        let cfg = EffectiveConfig::resolve(plain_http_base(), &environment).unwrap();
        assert_eq!(cfg.port, 9443);
    }

    #[test]
    fn prefixed_port_applies_when_alone() {
        let environment = env(&[(ENV_HTTP_PORT, "9000")]);
        let cfg = EffectiveConfig::resolve(plain_http_base(), &environment).unwrap();
        assert_eq!(cfg.port, 9000);
    }

    #[test]
    fn malformed_overrides_are_collected_not_defaulted() {
        let environment = env(&[(ENV_PORT, "eighty"), (ENV_USE_SSL, "yes")]);
        let err = EffectiveConfig::resolve(plain_http_base(), &environment).unwrap_err();
        assert_eq!(err.problems.len(), 2);
        assert!(err.to_string().contains(ENV_PORT));
        assert!(err.to_string().contains(ENV_USE_SSL));
    }

    #[test]
    fn empty_env_values_never_clear_base_values() {
        let base = BaseConfig {
            keystore_file: Some("/etc/shb/keystore.p12".into()),
            keystore_pass: Some("changeit".into()),
            ..BaseConfig::default()
        };
        let environment = env(&[(ENV_KEYSTORE_FILE, ""), (ENV_KEYSTORE_PASS, "")]);
        let cfg = EffectiveConfig::resolve(base, &environment).unwrap();
        assert_eq!(
            cfg.tls.unwrap().keystore,
            KeystoreSource::File(PathBuf::from("/etc/shb/keystore.p12"))
        );
    }

    #[test]
    fn use_ssl_override_can_disable_tls_validation() {
        let environment = env(&[(ENV_USE_SSL, "false")]);
        let cfg = EffectiveConfig::resolve(BaseConfig::default(), &environment).unwrap();
        assert_eq!(cfg.tls, None);
    }

    #[test]
    fn use_ssl_override_can_enable_tls_validation() {
        let environment = env(&[(ENV_USE_SSL, "true")]);
        let err = EffectiveConfig::resolve(plain_http_base(), &environment).unwrap_err();
        assert!(err.to_string().contains("keystore_pass"));
    }
}

// Configuration chargée une seule fois au démarrage (après dotenv)
// puis injectée dans les handlers via web::Data<AppConfig>.

use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in .env file")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Algorithme de signature réglé sur le compte Cloudinary (SHA-1 par défaut)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl FromStr for SignatureAlgorithm {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CloudConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub signature_algorithm: SignatureAlgorithm,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    /// Adresse d'expédition de tous les emails (VERIFICATION_EMAIL)
    pub from: String,
    pub password_reset_link: String,
    pub sign_in_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub session_ttl_hours: i64,
    pub cleanup_interval_secs: u64,
    pub cloud: CloudConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construit la config à partir d'une fonction de lecture arbitraire
    /// (env en prod, HashMap dans les tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            host: or_default("HOST", "127.0.0.1"),
            port: parse_or(&lookup, "PORT", 8989)?,
            session_ttl_hours: parse_or(&lookup, "SESSION_TTL_HOURS", 24 * 30)?,
            cleanup_interval_secs: parse_or(&lookup, "CLEANUP_INTERVAL_SECS", 600)?,
            cloud: CloudConfig {
                cloud_name: or_default("CLOUD_NAME", ""),
                api_key: or_default("CLOUD_KEY", ""),
                api_secret: or_default("CLOUD_SECRET", ""),
                signature_algorithm: parse_or(
                    &lookup,
                    "CLOUD_SIGNATURE_ALGORITHM",
                    SignatureAlgorithm::Sha1,
                )?,
            },
            mail: MailConfig {
                smtp_host: or_default("SMTP_HOST", "sandbox.smtp.mailtrap.io"),
                smtp_port: parse_or(&lookup, "SMTP_PORT", 2525)?,
                username: or_default("MAILTRAP_USER", ""),
                password: or_default("MAILTRAP_PASS", ""),
                from: or_default("VERIFICATION_EMAIL", "no-reply@panmusic.app"),
                password_reset_link: or_default(
                    "PASSWORD_RESET_LINK",
                    "http://localhost:8989/reset-password.html",
                ),
                sign_in_url: or_default("SIGN_IN_URL", "http://localhost:8989/sign-in"),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/panmusic"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8989);
        assert_eq!(config.mail.smtp_port, 2525);
        assert_eq!(config.mail.smtp_host, "sandbox.smtp.mailtrap.io");
        assert_eq!(config.cleanup_interval_secs, 600);
        assert_eq!(config.cloud.signature_algorithm, SignatureAlgorithm::Sha1);
    }

    #[test]
    fn test_signature_algorithm() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "secret"),
            ("CLOUD_SIGNATURE_ALGORITHM", "SHA256"),
        ]))
        .unwrap();
        assert_eq!(config.cloud.signature_algorithm, SignatureAlgorithm::Sha256);

        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "secret"),
            ("CLOUD_SIGNATURE_ALGORITHM", "md5"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { key: "CLOUD_SIGNATURE_ALGORITHM", .. })
        ));
    }

    #[test]
    fn test_missing_jwt_secret() {
        let result = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")]));
        assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));
    }

    #[test]
    fn test_invalid_port() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "secret"),
            ("PORT", "eighty"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { key: "PORT", .. })));
    }
}

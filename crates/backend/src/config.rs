// =============================================================================
// Somoco Backend - Configuration
// =============================================================================

use std::env;

/// Where catalog documents live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmsBackend {
    /// The hosted CMS over HTTP.
    Sanity,
    /// Process-local store for local runs without CMS credentials.
    Memory,
}

/// How outgoing mail is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailBackend {
    /// SMTP for contact/reset mail, Resend for partner inquiries.
    Live,
    /// Record messages in memory and log them.
    Memory,
}

#[derive(Debug, Clone)]
pub struct CmsConfig {
    pub backend: CmsBackend,
    pub project_id: String,
    pub dataset: String,
    /// Dated API version, e.g. "2024-01-01"
    pub api_version: String,
    /// Write token; reads of the public dataset work without it
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    /// Preferred port; the other of 587/465 is tried if it fails
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub username: Option<String>,
    /// Receives password reset mail
    pub email: Option<String>,
    /// `ADMIN_PASSWORD_HASH_B64`: base64 of the bcrypt hash
    pub password_hash_b64: Option<String>,
    /// `ADMIN_PASSWORD_HASH`: raw bcrypt hash
    pub password_hash: Option<String>,
}

impl CmsConfig {
    /// CMS settings alone, for tools that never serve HTTP.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("CMS_BACKEND").as_deref() {
            None | Some("sanity") => CmsBackend::Sanity,
            Some("memory") => CmsBackend::Memory,
            Some(other) => return Err(ConfigError::Invalid("CMS_BACKEND", other.to_string())),
        };
        let project_id = get("SANITY_PROJECT_ID").or_else(|| get("NEXT_PUBLIC_SANITY_PROJECT_ID"));
        if backend == CmsBackend::Sanity && project_id.is_none() {
            return Err(ConfigError::Missing("SANITY_PROJECT_ID"));
        }

        Ok(Self {
            backend,
            project_id: project_id.unwrap_or_else(|| "local".into()),
            dataset: get("SANITY_DATASET")
                .or_else(|| get("NEXT_PUBLIC_SANITY_DATASET"))
                .unwrap_or_else(|| "production".into()),
            api_version: get("SANITY_API_VERSION").unwrap_or_else(|| "2024-01-01".into()),
            token: get("SANITY_API_TOKEN"),
        })
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "127.0.0.1:7000")
    pub bind_address: String,

    /// Site origin allowed by CORS
    pub frontend_url: String,

    /// Secret for signing admin session tokens
    pub jwt_secret: String,

    /// Session token expiry in hours
    pub jwt_expiry_hours: i64,

    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,

    pub cms: CmsConfig,
    pub mail_backend: MailBackend,
    pub smtp: Option<SmtpConfig>,
    pub resend: Option<ResendConfig>,

    /// Inbox for contact form submissions
    pub contact_inbox: String,

    /// Inbox receiving a tracking copy of every partner inquiry
    pub partner_copy_inbox: String,

    pub admin: AdminConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET")
            .or_else(|| get("AUTH_SECRET"))
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let cms = CmsConfig::from_lookup(&lookup)?;

        let mail_backend = match get("MAIL_BACKEND").as_deref() {
            None | Some("live") => MailBackend::Live,
            Some("memory") => MailBackend::Memory,
            Some(other) => return Err(ConfigError::Invalid("MAIL_BACKEND", other.to_string())),
        };

        let smtp = match (get("SMTP_HOST"), get("SMTP_USER"), get("SMTP_PASS")) {
            (Some(host), Some(user), Some(pass)) => {
                let port = match get("SMTP_PORT") {
                    Some(raw) => raw
                        .parse()
                        .map_err(|_| ConfigError::Invalid("SMTP_PORT", raw))?,
                    None => 587,
                };
                Some(SmtpConfig {
                    host,
                    port,
                    from: get("SMTP_FROM").unwrap_or_else(|| user.clone()),
                    user,
                    pass,
                })
            }
            _ => None,
        };

        let resend = get("RESEND_API_KEY").map(|api_key| ResendConfig {
            api_key,
            from: get("RESEND_FROM").unwrap_or_else(|| "Somoco EV <onboarding@resend.dev>".into()),
        });

        Ok(Self {
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:7000".into()),
            frontend_url: get("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".into()),
            jwt_secret,
            jwt_expiry_hours: get("JWT_EXPIRY_HOURS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            max_upload_bytes: get("UPLOAD_LIMIT_MB")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(20)
                * 1024
                * 1024,
            cms,
            mail_backend,
            smtp,
            resend,
            contact_inbox: get("CONTACT_INBOX").unwrap_or_else(|| "cs@somotex.com".into()),
            partner_copy_inbox: get("PARTNER_COPY_INBOX")
                .unwrap_or_else(|| "cs@somotex.com".into()),
            admin: AdminConfig {
                username: get("ADMIN_USERNAME"),
                email: get("ADMIN_EMAIL"),
                password_hash_b64: get("ADMIN_PASSWORD_HASH_B64"),
                password_hash: get("ADMIN_PASSWORD_HASH"),
            },
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_requires_secret() {
        let err = load(&[("CMS_BACKEND", "memory")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn test_auth_secret_fallback_and_defaults() {
        let config = load(&[("AUTH_SECRET", "s3cret"), ("CMS_BACKEND", "memory")]).unwrap();
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.bind_address, "127.0.0.1:7000");
        assert_eq!(config.cms.backend, CmsBackend::Memory);
        assert_eq!(config.cms.dataset, "production");
        assert_eq!(config.mail_backend, MailBackend::Live);
        assert!(config.smtp.is_none());
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn test_sanity_requires_project() {
        let err = load(&[("JWT_SECRET", "x")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SANITY_PROJECT_ID")));

        let config = load(&[("JWT_SECRET", "x"), ("NEXT_PUBLIC_SANITY_PROJECT_ID", "abc")]).unwrap();
        assert_eq!(config.cms.project_id, "abc");
    }

    #[test]
    fn test_cms_config_without_server_settings() {
        let cms = CmsConfig::from_lookup(|key| match key {
            "SANITY_PROJECT_ID" => Some("abc".into()),
            "SANITY_API_TOKEN" => Some("tok".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cms.backend, CmsBackend::Sanity);
        assert_eq!(cms.project_id, "abc");
        assert_eq!(cms.token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_smtp_needs_all_credentials() {
        let base = [("JWT_SECRET", "x"), ("CMS_BACKEND", "memory")];

        let partial = load(&[base[0], base[1], ("SMTP_HOST", "mail.example.com")]).unwrap();
        assert!(partial.smtp.is_none());

        let full = load(&[
            base[0],
            base[1],
            ("SMTP_HOST", "mail.example.com"),
            ("SMTP_USER", "noreply@example.com"),
            ("SMTP_PASS", "pw"),
            ("SMTP_PORT", "465"),
        ])
        .unwrap();
        let smtp = full.smtp.unwrap();
        assert_eq!(smtp.port, 465);
        assert_eq!(smtp.from, "noreply@example.com");

        let bad = load(&[
            base[0],
            base[1],
            ("SMTP_HOST", "h"),
            ("SMTP_USER", "u"),
            ("SMTP_PASS", "p"),
            ("SMTP_PORT", "smtp"),
        ]);
        assert!(matches!(bad, Err(ConfigError::Invalid("SMTP_PORT", _))));
    }
}

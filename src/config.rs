//! Vendor endpoints and credentials, read from the environment.
//!
//! A `.env` file is honoured (loaded by the binary through `dotenvy`). Each
//! vendor is optional: it is registered only when its URL variable is set.
//!
//! | Variable               | Meaning                                   |
//! |------------------------|-------------------------------------------|
//! | `SBC_BASE_URL`         | SBC API root, enables the SBC feed        |
//! | `SBC_USERNAME`         | SBC login user (required with the URL)    |
//! | `SBC_PASSWORD`         | SBC login password (required with the URL)|
//! | `SBC_LOGIN_PATH`       | login path, default `login`               |
//! | `SBC_SITES_PATH`       | station list path, default `sites`        |
//! | `SBC_SOURCE_TAG`       | source tag, default `SBC`                 |
//! | `TRIMBLE_URL`          | station marker endpoint, enables Trimble  |
//! | `TRIMBLE_SOURCE_TAG`   | source tag, default `TRIMBLE`             |
//! | `TRIMBLE_HEALTHY_CODE` | health code meaning online, default `1`   |

use anyhow::{Context, Result, anyhow};
use reqwest::Url;

use crate::health::DEFAULT_TRIMBLE_HEALTHY_CODE;

pub const DEFAULT_SBC_SOURCE: &str = "SBC";
pub const DEFAULT_TRIMBLE_SOURCE: &str = "TRIMBLE";

#[derive(Clone)]
pub struct SbcConfig {
    pub login_url: Url,
    pub sites_url: Url,
    pub username: String,
    pub password: String,
    pub source: String,
}

impl SbcConfig {
    /// Config with the default `login` / `sites` paths under `base_url`.
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<Self> {
        Ok(Self {
            login_url: endpoint(base_url, "login")?,
            sites_url: endpoint(base_url, "sites")?,
            username: username.to_string(),
            password: password.to_string(),
            source: DEFAULT_SBC_SOURCE.to_string(),
        })
    }
}

impl std::fmt::Debug for SbcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SbcConfig")
            .field("login_url", &self.login_url.as_str())
            .field("sites_url", &self.sites_url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct TrimbleConfig {
    pub url: Url,
    pub source: String,
    pub healthy_code: i64,
}

impl TrimbleConfig {
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            url: Url::parse(url).with_context(|| format!("invalid Trimble URL '{url}'"))?,
            source: DEFAULT_TRIMBLE_SOURCE.to_string(),
            healthy_code: DEFAULT_TRIMBLE_HEALTHY_CODE,
        })
    }
}

/// Which vendors to poll, in registration order (SBC first).
#[derive(Debug, Clone, Default)]
pub struct VendorSettings {
    pub sbc: Option<SbcConfig>,
    pub trimble: Option<TrimbleConfig>,
}

impl VendorSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let sbc = match var("SBC_BASE_URL") {
            Some(base) => {
                let username = var("SBC_USERNAME")
                    .ok_or_else(|| anyhow!("SBC_USERNAME must be set when SBC_BASE_URL is set"))?;
                let password = var("SBC_PASSWORD")
                    .ok_or_else(|| anyhow!("SBC_PASSWORD must be set when SBC_BASE_URL is set"))?;
                let login_path = var("SBC_LOGIN_PATH").unwrap_or_else(|| "login".to_string());
                let sites_path = var("SBC_SITES_PATH").unwrap_or_else(|| "sites".to_string());

                Some(SbcConfig {
                    login_url: endpoint(&base, &login_path)?,
                    sites_url: endpoint(&base, &sites_path)?,
                    username,
                    password,
                    source: var("SBC_SOURCE_TAG").unwrap_or_else(|| DEFAULT_SBC_SOURCE.to_string()),
                })
            }
            None => None,
        };

        let trimble = match var("TRIMBLE_URL") {
            Some(url) => {
                let mut config = TrimbleConfig::new(&url)?;
                if let Some(tag) = var("TRIMBLE_SOURCE_TAG") {
                    config.source = tag;
                }
                if let Some(code) = var("TRIMBLE_HEALTHY_CODE") {
                    config.healthy_code = code.parse().with_context(|| {
                        format!("TRIMBLE_HEALTHY_CODE '{code}' is not an integer")
                    })?;
                }
                Some(config)
            }
            None => None,
        };

        Ok(Self { sbc, trimble })
    }

    pub fn is_empty(&self) -> bool {
        self.sbc.is_none() && self.trimble.is_none()
    }
}

/// Joins `path` onto `base` without `Url::join`'s last-segment replacement.
fn endpoint(base: &str, path: &str) -> Result<Url> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).with_context(|| format!("invalid vendor URL '{joined}'"))
}

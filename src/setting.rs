use crate::{catalog::Catalog, Error, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, time::Duration};

/// number of threads config
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Thread {
    /// number of http server threads
    pub http: usize,
}

/// network config
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Network {
    /// server bind host
    pub host: String,
    /// server bind port
    pub port: u16,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Razorpay setting, orders are mocked when the key pair is not set.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Razorpay {
    /// public key id, also handed to the browser checkout
    pub key_id: Option<String>,
    /// key secret for orders api and payment signatures
    pub key_secret: Option<String>,
    pub api_url: String,
    pub currency: String,
    /// gateway request timeout in seconds
    pub timeout: u64,
}

impl Default for Razorpay {
    fn default() -> Self {
        Self {
            key_id: None,
            key_secret: None,
            api_url: razorpay_client::razorpay::API_URL.to_owned(),
            currency: "INR".to_owned(),
            timeout: 10,
        }
    }
}

impl fmt::Debug for Razorpay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Razorpay")
            .field("key_id", &self.key_id)
            .field("key_secret", &self.key_secret.as_ref().map(|_| "***"))
            .field("api_url", &self.api_url)
            .field("currency", &self.currency)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Razorpay {
    pub fn key_id(&self) -> Option<&str> {
        non_empty(&self.key_id)
    }

    pub fn key_secret(&self) -> Option<&str> {
        non_empty(&self.key_secret)
    }

    /// key id and secret, both required for creating orders
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.key_id().zip(self.key_secret())
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }
}

/// browser checkout display options
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Checkout {
    /// merchant name shown in the checkout
    pub name: String,
    pub theme_color: String,
}

impl Default for Checkout {
    fn default() -> Self {
        Self {
            name: "CowSeva".to_owned(),
            theme_color: "#0f172a".to_owned(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Setting {
    /// database url, persistence is disabled when not set
    /// https://www.sea-ql.org/SeaORM/docs/install-and-config/connection/
    pub db_url: Option<String>,
    /// database service credential, replaces the password of db_url
    pub db_password: Option<String>,

    pub thread: Thread,
    pub network: Network,

    pub razorpay: Razorpay,
    pub checkout: Checkout,

    pub catalog: Catalog,
}

impl Setting {
    /// read config from file and env
    pub fn read<P: AsRef<Path>>(file: P, env_prefix: Option<String>) -> Result<Self> {
        let path = file
            .as_ref()
            .to_str()
            .ok_or_else(|| Error::Message("invalid config path".to_owned()))?;
        let mut config = Config::builder().add_source(File::with_name(path));
        if let Some(prefix) = env_prefix {
            config = config.add_source(Self::env_source(&prefix));
        }

        let config = config.build()?;
        let mut setting: Setting = config.try_deserialize()?;
        setting.validate()?;
        Ok(setting)
    }

    fn env_source(prefix: &str) -> Environment {
        Environment::with_prefix(prefix)
            .try_parsing(true)
            .prefix_separator("_")
            .separator("__")
    }

    /// read config from env
    pub fn from_env(env_prefix: String) -> Result<Self> {
        let config = Config::builder()
            .add_source(Self::env_source(&env_prefix))
            .build()?;
        let mut setting: Setting = config.try_deserialize()?;
        setting.validate()?;
        Ok(setting)
    }

    /// config from str
    pub fn from_str(s: &str, format: FileFormat) -> Result<Self> {
        let builder = Config::builder();
        let config = builder.add_source(File::from_str(s, format)).build()?;
        let mut setting: Setting = config.try_deserialize()?;
        setting.validate()?;
        Ok(setting)
    }

    /// connect url with the service credential applied
    pub fn database_url(&self) -> Result<Option<String>> {
        let url = match non_empty(&self.db_url) {
            Some(url) => url,
            None => return Ok(None),
        };
        match non_empty(&self.db_password) {
            Some(password) => {
                let mut parsed = url::Url::parse(url)
                    .map_err(|e| Error::Message(format!("invalid db_url: {}", e)))?;
                parsed
                    .set_password(Some(password))
                    .map_err(|_| Error::Message("db_url can't carry a password".to_owned()))?;
                Ok(Some(parsed.to_string()))
            }
            None => Ok(Some(url.to_owned())),
        }
    }

    fn validate(&mut self) -> Result<()> {
        if self.razorpay.currency.trim().is_empty() {
            return Err(Error::Message("razorpay.currency is empty".to_owned()));
        }
        self.catalog.validate()
    }
}

//! Configuration manager for tandem.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_PORT: u16 = 5000;
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// Public URL of current instance.
    pub url: String,
    /// Listening port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origin of the single-page client, allowed by CORS.
    #[serde(skip_serializing)]
    pub client_url: Option<String>,
    /// Production-like deployment, turns on `Secure` cookies.
    #[serde(default)]
    pub production: bool,
    #[serde(default)]
    version: String,
    #[serde(skip)]
    path: PathBuf,
    /// Related to JsonWebToken configuration.
    #[serde(skip_serializing)]
    pub token: Option<Token>,
    /// Related to PostgreSQL configuration.
    #[serde(skip_serializing)]
    pub postgres: Option<Postgres>,
    /// Related to Argon2 configuration.
    #[serde(skip_serializing)]
    pub argon2: Option<Argon2>,
    /// Related to the hosted chat provider.
    #[serde(skip_serializing)]
    pub chat: Option<Chat>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// PostgreSQL configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Postgres {
    /// Hostname:(?port) for PostgreSQL instance.
    pub address: String,
    /// Database name.
    pub database: Option<String>,
    /// Username credential to connect.
    pub username: Option<String>,
    /// Password credential to connect.
    pub password: Option<String>,
    /// Maximum pool connections.
    pub pool_size: Option<u32>,
}

/// Argon2 configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Argon2 {
    /// Memory used while hashing.
    pub memory_cost: u32,
    /// Iterations of hash.
    pub iterations: u32,
    /// Parallelism degree.
    pub parallelism: u32,
    /// Output hash length.
    pub hash_length: usize,
}

impl Default for Argon2 {
    fn default() -> Self {
        Self {
            memory_cost: 1024 * 64, // 64 MiB.
            iterations: 4,
            parallelism: 2,
            hash_length: 32,
        }
    }
}

/// Json Web Token configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Token {
    /// HMAC secret used to sign identity tokens.
    pub secret: String,
    /// Lifetime in seconds. Default is one hour.
    pub expires_in: Option<u64>,
}

/// Hosted chat (Stream) configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub api_key: String,
    pub api_secret: String,
    /// Default is `https://chat.stream-io-api.com`.
    pub base_url: Option<String>,
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Normalizes a URL string by ensuring it starts with a valid scheme
    /// (`http` or `https`).
    fn normalize_url(&self, url: &str) -> Result<String, url::ParseError> {
        let url_with_scheme =
            if url.starts_with("http://") || url.starts_with("https://") {
                url.to_string()
            } else {
                format!("https://{url}")
            };

        let parsed_url = Url::parse(&url_with_scheme)?;
        Ok(parsed_url.to_string())
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Result<Self, url::ParseError> {
        let file_path = if self.path.is_file() {
            &self.path
        } else {
            &Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        match File::open(file_path) {
            Ok(file) => {
                let mut config: Configuration =
                    match serde_yaml::from_reader(file) {
                        Ok(config) => config,
                        Err(err) => {
                            return Ok(self.error(err));
                        },
                    };

                // set app version.
                config.version = VERSION.to_owned();

                // normalize URLs.
                if !config.url.is_empty() {
                    config.url = self.normalize_url(&config.url)?;
                }
                config.client_url = config
                    .client_url
                    .map(|c| {
                        self.normalize_url(&c)
                            .map(|c| c.trim_end_matches('/').to_owned())
                    })
                    .transpose()?;

                Ok(config)
            },
            Err(err) => Ok(self.error(err)),
        }
    }

    /// Overlay secrets supplied through the environment.
    ///
    /// `JWT_SECRET`, `STREAM_API_KEY` and `STREAM_API_SECRET` win over the
    /// file values.
    pub fn with_env(mut self) -> Self {
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            let token = self.token.get_or_insert_with(Token::default);
            token.secret = secret;
        }

        if let (Ok(api_key), Ok(api_secret)) = (
            std::env::var("STREAM_API_KEY"),
            std::env::var("STREAM_API_SECRET"),
        ) {
            let base_url = self.chat.take().and_then(|c| c.base_url);
            self.chat = Some(Chat {
                api_key,
                api_secret,
                base_url,
            });
        }

        self
    }

    /// Whether cookies must carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.production
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, "`config.yaml` file not found");
        Self {
            version: VERSION.to_owned(),
            port: DEFAULT_PORT,
            ..Default::default()
        }
    }
}

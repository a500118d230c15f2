use serde::Deserialize;

use crate::error::Error;

pub const DEFAULT_PATH: &str = "/etc/redletter/redletter.toml";
const ENV_PREFIX: &str = "REDLETTER";

/// SMTP connection settings for the dispatch side.
#[derive(Clone, Debug, Deserialize)]
pub struct SmtpConfig {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub username: Option<String>,
    pub password: Option<String>,
}

fn default_port() -> u16 {
    25
}

/// Loads SMTP config from the filesystem and merges it with any
/// environment variables prefixed with REDLETTER_.
pub fn load_config(path: Option<&str>) -> Result<SmtpConfig, Error> {
    let mut settings = config::Config::default();

    settings
        .merge(config::File::with_name(path.unwrap_or(DEFAULT_PATH)))?
        .merge(config::Environment::with_prefix(ENV_PREFIX))?;

    let config = settings.try_into::<SmtpConfig>()?;
    Ok(config)
}

use std::time::Duration;
use clap::Args;
use log::LevelFilter;

#[derive(Args, Debug, Clone)]
pub struct FlatConfig {
    #[arg(long, env = "MEDIA_API_URL", default_value = "http://localhost:1698", help = "URL of the content repository API")]
    pub api_url: String,

    #[arg(long, env = "MEDIA_API_TOKEN", hide_env_values = true, help = "API Bearer token")]
    pub api_token: Option<String>,

    #[arg(long, env = "MEDIA_BASE_URL", help = "Base URL of stored files, defaults to the API URL")]
    pub base_url: Option<String>,

    #[arg(long, env = "MEDIA_HTTP_TIMEOUT", default_value = "10s", value_parser = humantime::parse_duration, help = "HTTP request timeout")]
    pub timeout: Duration,

    #[arg(long, env = "MEDIA_LOG_LEVEL", default_value = "info", help = "Log level")]
    pub log_level: LevelFilter,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfiguration,
    pub storage: StorageConfiguration,
    pub log_level: LevelFilter,
}

#[derive(Debug, Clone)]
pub struct ApiConfiguration {
    pub api_url: String, // MEDIA_API_URL
    pub bearer_token: Option<String>, // MEDIA_API_TOKEN
    pub timeout: Duration, // MEDIA_HTTP_TIMEOUT
}

#[derive(Debug, Clone)]
pub struct StorageConfiguration {
    pub base_url: String, // MEDIA_BASE_URL
}

impl From<FlatConfig> for Config {
    fn from(value: FlatConfig) -> Self {
        let base_url = value.base_url.unwrap_or_else(|| value.api_url.clone());
        Config {
            api: ApiConfiguration {
                api_url: value.api_url,
                bearer_token: value.api_token.filter(|x| !x.trim().is_empty()),
                timeout: value.timeout,
            },
            storage: StorageConfiguration {
                base_url,
            },
            log_level: value.log_level,
        }
    }
}

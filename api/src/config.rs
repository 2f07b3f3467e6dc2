use std::{path::Path, time::Duration};

use serde::Deserialize;
use types::Result;
use url::Url;

/// Base name of the optional config file, looked up in the working directory.
pub const CONFIG_FILE: &str = "complaints-admin";
pub const ENV_PREFIX: &str = "COMPLAINTS";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_url: Url,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            request_timeout_secs: None,
        }
        .normalized()
    }

    /// Load from `complaints-admin.toml` (if present) and `COMPLAINTS_*` variables.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(file: &Path) -> Result<Self> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from(file).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        Ok(config.normalized())
    }

    pub fn with_api_url(mut self, api_url: Url) -> Self {
        self.api_url = api_url;
        self.normalized()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    // Endpoint paths are joined relative to the base, so it must end in a slash
    // for a path prefix like `https://city.example/complaints` to survive.
    fn normalized(mut self) -> Self {
        if !self.api_url.path().ends_with('/') {
            let path = format!("{}/", self.api_url.path());
            self.api_url.set_path(&path);
        }
        self
    }
}

//! Arguments shared by the WildSense binaries.

use {
    anyhow::Result,
    clap::Args,
    remote::{API_URL_ENV, Client, DEFAULT_BASE_URL, RemoteConfig},
    std::{path::PathBuf, time::Duration},
};

/// Where the detection backend lives.
#[derive(Debug, Clone, Args)]
pub struct BackendArgs {
    /// Base URL of the WildSense API.
    #[arg(long, env = API_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub api_url: String,
    /// Request timeout in seconds.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}

impl BackendArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn config(&self) -> RemoteConfig {
        RemoteConfig::default()
            .with_base_url(self.api_url.as_str())
            .with_timeout(self.timeout())
    }

    pub fn client(&self) -> Result<Client> {
        Ok(Client::new(self.config())?)
    }
}

#[derive(Debug, Clone, Args)]
pub struct LogArgs {
    /// Write daily log files into this directory instead of stdout.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

impl LogArgs {
    pub fn init(&self) -> Result<()> {
        match &self.log_dir {
            Some(dir) => base::init_file_logger(dir)?,
            None => base::init_stdout_logger(),
        }
        Ok(())
    }
}

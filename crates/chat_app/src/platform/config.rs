use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chat_engine::{SessionSettings, TransportSettings};
use chat_logging::chat_info;
use serde::{Deserialize, Serialize};

use super::cli::CliArgs;

pub(crate) const TOKEN_ENV_VAR: &str = "STUDY_CHAT_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ChatConfig {
    pub base_url: String,
    pub material_id: Option<u64>,
    pub token: Option<String>,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub log_file: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            material_id: None,
            token: None,
            connect_timeout_secs: 10,
            read_timeout_secs: 120,
            log_file: Some(PathBuf::from("./study_chat.log")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("no study material selected; pass --material or set material_id in the config")]
    MissingMaterial,
}

/// Loads the config file; a missing file yields the defaults.
pub(crate) fn load_config(path: &Path) -> Result<ChatConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ChatConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Everything the question loop needs, after CLI, environment and file are merged.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedConfig {
    pub session: SessionSettings,
    pub transport: TransportSettings,
    pub token: Option<String>,
}

/// CLI flags win over the environment, which wins over the file.
pub(crate) fn resolve(
    args: &CliArgs,
    config: ChatConfig,
    env_token: Option<String>,
) -> Result<ResolvedConfig, ConfigError> {
    let base_url = args.base_url.clone().unwrap_or(config.base_url);
    let material_id = args
        .material
        .or(config.material_id)
        .ok_or(ConfigError::MissingMaterial)?;
    let token = env_token
        .filter(|token| !token.trim().is_empty())
        .or(config.token);

    chat_info!(
        "Resolved config base_url={} material_id={} token_present={}",
        base_url,
        material_id,
        token.is_some()
    );

    Ok(ResolvedConfig {
        session: SessionSettings::new(base_url, material_id),
        transport: TransportSettings {
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            read_timeout: Duration::from_secs(config.read_timeout_secs),
            ..TransportSettings::default()
        },
        token,
    })
}

use std::fs;
use std::path::Path;

use uid_core::RedactConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 读取配置，文件不存在时返回默认值
pub fn load_config(path: Option<&Path>) -> Result<RedactConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(RedactConfig::default());
    };
    if !path.exists() {
        log::warn!("[Config] 配置文件不存在，使用默认配置: {}", path.display());
        return Ok(RedactConfig::default());
    }
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// 保存配置
pub fn save_config(path: &Path, config: &RedactConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let raw = serde_json::to_string_pretty(config)?;
    fs::write(path, raw)?;
    Ok(())
}

//! 配额计数文件
//!
//! 格式：`{"processed_count": n}`，写回时保留文件中的其他字段

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use uid_core::{CoreError, QuotaStore};

const COUNT_KEY: &str = "processed_count";

#[derive(Debug, Default, Deserialize)]
struct QuotaFile {
    processed_count: u64,
}

pub struct JsonQuotaStore {
    path: PathBuf,
}

impl JsonQuotaStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读出现有的 JSON 对象，文件不存在时为空对象
    fn load_object(&self) -> uid_core::Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&raw).map_err(|e| quota_error(&self.path, e))? {
            Value::Object(map) => Ok(map),
            _ => Err(quota_error(&self.path, "not a JSON object")),
        }
    }
}

fn quota_error(path: &Path, err: impl std::fmt::Display) -> CoreError {
    CoreError::Quota(format!("{}: {}", path.display(), err))
}

impl QuotaStore for JsonQuotaStore {
    fn get(&self) -> uid_core::Result<u64> {
        if !self.path.exists() {
            return Ok(0);
        }
        let raw = fs::read_to_string(&self.path)?;
        let file: QuotaFile = serde_json::from_str(&raw).map_err(|e| quota_error(&self.path, e))?;
        Ok(file.processed_count)
    }

    fn set(&self, value: u64) -> uid_core::Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let mut doc = self.load_object()?;
        doc.insert(COUNT_KEY.to_string(), Value::from(value));
        let raw = serde_json::to_string_pretty(&Value::Object(doc)).map_err(|e| quota_error(&self.path, e))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonQuotaStore::new(dir.path().join("registry.json"));
        assert_eq!(store.get().unwrap(), 0);
    }

    #[test]
    fn test_set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("registry.json");
        let store = JsonQuotaStore::new(&path);
        store.set(42).unwrap();
        assert_eq!(store.get().unwrap(), 42);

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["processed_count"], 42);
    }

    #[test]
    fn test_set_keeps_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        fs::write(&path, r#"{"processed_count": 10, "license": "site-7", "limits": {"daily": 50}}"#).unwrap();

        let store = JsonQuotaStore::new(&path);
        store.set(11).unwrap();
        assert_eq!(store.get().unwrap(), 11);

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["processed_count"], 11);
        assert_eq!(raw["license"], "site-7");
        assert_eq!(raw["limits"]["daily"], 50);
    }

    #[test]
    fn test_reads_existing_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        fs::write(&path, r#"{"processed_count": 599}"#).unwrap();
        assert_eq!(JsonQuotaStore::new(&path).get().unwrap(), 599);

        fs::write(&path, "[]").unwrap();
        assert!(matches!(JsonQuotaStore::new(&path).get(), Err(CoreError::Quota(_))));
    }
}

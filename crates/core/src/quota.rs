//! 处理配额
//!
//! 累计处理文档数持久化在外部存储中，批处理开始时读一次，结束后写一次。

use std::sync::{Arc, Mutex};

use crate::{CoreError, Result};

/// 配额计数的持久化
pub trait QuotaStore: Send + Sync {
    fn get(&self) -> Result<u64>;
    fn set(&self, value: u64) -> Result<()>;
}

/// 内存存储，进程结束即丢失
#[derive(Debug, Default)]
pub struct InMemoryQuotaStore {
    value: Mutex<u64>,
}

impl InMemoryQuotaStore {
    pub fn new(value: u64) -> Self {
        Self { value: Mutex::new(value) }
    }
}

impl QuotaStore for InMemoryQuotaStore {
    fn get(&self) -> Result<u64> {
        self.value
            .lock()
            .map(|v| *v)
            .map_err(|e| CoreError::Quota(e.to_string()))
    }

    fn set(&self, value: u64) -> Result<()> {
        let mut guard = self.value.lock().map_err(|e| CoreError::Quota(e.to_string()))?;
        *guard = value;
        Ok(())
    }
}

/// 配额服务
#[derive(Clone)]
pub struct ProcessedQuota {
    store: Arc<dyn QuotaStore>,
    ceiling: u64,
}

impl ProcessedQuota {
    pub fn new(store: Arc<dyn QuotaStore>, ceiling: u64) -> Self {
        Self { store, ceiling }
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    pub fn used(&self) -> Result<u64> {
        self.store.get()
    }

    pub fn remaining(&self) -> Result<u64> {
        Ok(self.ceiling.saturating_sub(self.used()?))
    }

    /// 在批处理开始时读到的计数上增加已处理数，只写不读，返回新的计数
    pub fn advance(&self, used_at_start: u64, processed: u64) -> Result<u64> {
        let used = used_at_start.saturating_add(processed);
        self.store.set(used)?;
        log::info!("[Quota] 已处理 {}/{}", used, self.ceiling);
        Ok(used)
    }

    pub fn reset(&self) -> Result<()> {
        self.store.set(0)?;
        log::info!("[Quota] 计数已重置");
        Ok(())
    }
}

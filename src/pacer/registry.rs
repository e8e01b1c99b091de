//! 句柄表
//!
//! 绑定层（托管语言侧）只持有不透明的整数 id，从不持有地址。
//! 未知或已关闭的 id：状态操作无效果，write 返回 -1

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use super::{Pacer, PacerConfig, PacerError};
use crate::audio::{AudioFormat, SampleEncoding};

/// 写入失败时返回给绑定层的哨兵值
pub const WRITE_ERROR: i32 = -1;

/// 不透明的 pacer 句柄
///
/// 0 表示空句柄，永远不会被分配
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PacerId(u64);

impl PacerId {
    pub const NULL: PacerId = PacerId(0);

    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn as_raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for PacerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pacer#{}", self.0)
    }
}

/// Pacer 句柄表
pub struct PacerRegistry {
    pacers: Mutex<HashMap<u64, Arc<Pacer>>>,
    next_id: AtomicU64,
    config: PacerConfig,
}

impl PacerRegistry {
    pub fn new(config: PacerConfig) -> Self {
        Self {
            pacers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            config,
        }
    }

    /// 进程级共享实例
    pub fn global() -> &'static PacerRegistry {
        static GLOBAL: OnceLock<PacerRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| PacerRegistry::new(PacerConfig::default()))
    }

    fn table(&self) -> MutexGuard<'_, HashMap<u64, Arc<Pacer>>> {
        self.pacers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // 只在表锁内克隆 Arc，调用 pacer 时表锁已释放，
    // 一个阻塞的写入不会卡住其他句柄
    fn get(&self, id: PacerId) -> Option<Arc<Pacer>> {
        self.table().get(&id.0).cloned()
    }

    /// 按绑定层参数创建 pacer
    pub fn try_create(
        &self,
        encoding: i32,
        channels: i32,
        sample_rate: i32,
        buffer_frames: i32,
    ) -> Result<PacerId, PacerError> {
        let encoding = SampleEncoding::from_ordinal(encoding)
            .ok_or(PacerError::InvalidFormat("unknown sample encoding"))?;
        let channels = u16::try_from(channels)
            .map_err(|_| PacerError::InvalidFormat("channel count out of range"))?;
        let sample_rate = u32::try_from(sample_rate)
            .map_err(|_| PacerError::InvalidFormat("sample rate out of range"))?;
        let buffer_frames = usize::try_from(buffer_frames)
            .map_err(|_| PacerError::InvalidFormat("buffer frames out of range"))?;

        let format = AudioFormat::new(encoding, channels, sample_rate);
        let pacer = Pacer::with_config(format, buffer_frames, self.config.clone())?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.table().insert(id, Arc::new(pacer));
        Ok(PacerId(id))
    }

    /// 创建 pacer，失败时返回空句柄
    pub fn create(
        &self,
        encoding: i32,
        channels: i32,
        sample_rate: i32,
        buffer_frames: i32,
    ) -> PacerId {
        match self.try_create(encoding, channels, sample_rate, buffer_frames) {
            Ok(id) => id,
            Err(e) => {
                log::warn!("Failed to create pacer: {}", e);
                PacerId::NULL
            }
        }
    }

    /// 写入 `num_frames` 帧，返回写入帧数或 `WRITE_ERROR`
    pub fn write(&self, id: PacerId, data: &[u8], num_frames: i32) -> i32 {
        match self.try_write(id, data, num_frames) {
            Ok(frames) => frames,
            Err(PacerError::NotRunning) => WRITE_ERROR,
            Err(e) => {
                log::debug!("Write to {} failed: {}", id, e);
                WRITE_ERROR
            }
        }
    }

    pub fn try_write(&self, id: PacerId, data: &[u8], num_frames: i32) -> Result<i32, PacerError> {
        let pacer = self.get(id).ok_or(PacerError::InvalidHandle)?;
        let frames =
            usize::try_from(num_frames).map_err(|_| PacerError::InvalidFrameCount(num_frames))?;
        let written = pacer.write(data, frames)?;
        // written ≤ num_frames，不会越界
        Ok(written as i32)
    }

    pub fn start(&self, id: PacerId) {
        if let Some(pacer) = self.get(id) {
            if let Err(e) = pacer.start() {
                log::warn!("Failed to start {}: {}", id, e);
            }
        }
    }

    pub fn pause(&self, id: PacerId) {
        if let Some(pacer) = self.get(id) {
            pacer.pause();
        }
    }

    pub fn stop(&self, id: PacerId) {
        if let Some(pacer) = self.get(id) {
            pacer.stop();
        }
    }

    pub fn flush(&self, id: PacerId) {
        if let Some(pacer) = self.get(id) {
            pacer.flush();
        }
    }

    /// 关闭并移除句柄；之后对该 id 的调用都是空操作
    pub fn close(&self, id: PacerId) {
        let pacer = self.table().remove(&id.0);
        if let Some(pacer) = pacer {
            pacer.close();
            log::debug!("{} removed from registry", id);
        }
    }

    /// 查找 pacer（监控用）
    pub fn lookup(&self, id: PacerId) -> Option<Arc<Pacer>> {
        self.get(id)
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }
}

impl Default for PacerRegistry {
    fn default() -> Self {
        Self::new(PacerConfig::default())
    }
}

//! Pacer 统计模块
//!
//! 计数器全部是原子操作，写入/消费/清空路径在持锁时顺手累加，
//! 因此在同一把锁下读取时满足守恒：written = drained + flushed + available

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_utils::CachePadded;

use super::format::AudioFormat;

/// Pacer 统计收集器
///
/// 生产者和消费者各自高频更新的计数器用 CachePadded 隔开，避免 false sharing
#[derive(Default)]
pub struct PacerStats {
    // 生产者侧
    bytes_written: CachePadded<AtomicU64>,
    blocked_writes: AtomicU64,
    rejected_writes: AtomicU64,

    // 消费者侧
    bytes_drained: CachePadded<AtomicU64>,
    drain_count: AtomicU64,
    late_wakeups: AtomicU64,

    bytes_flushed: AtomicU64,
}

impl PacerStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add_written(&self, bytes: usize) {
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// 记录一次因空间不足而阻塞的写入
    #[inline]
    pub fn record_blocked_write(&self) {
        self.blocked_writes.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录一次因状态非 Running 被拒绝的写入
    #[inline]
    pub fn record_rejected_write(&self) {
        self.rejected_writes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_drained(&self, bytes: usize) {
        self.bytes_drained.fetch_add(bytes as u64, Ordering::Relaxed);
        self.drain_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_late_wakeup(&self) {
        self.late_wakeups.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_flushed(&self, bytes: usize) {
        self.bytes_flushed.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn bytes_drained(&self) -> u64 {
        self.bytes_drained.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn bytes_flushed(&self) -> u64 {
        self.bytes_flushed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn drain_count(&self) -> u64 {
        self.drain_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn late_wakeups(&self) -> u64 {
        self.late_wakeups.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn blocked_writes(&self) -> u64 {
        self.blocked_writes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rejected_writes(&self) -> u64 {
        self.rejected_writes.load(Ordering::Relaxed)
    }

    /// 生成报告
    ///
    /// `available_bytes` 由调用方在锁内读取后传入
    pub fn report(&self, format: &AudioFormat, available_bytes: usize) -> StatsReport {
        let bytes_drained = self.bytes_drained();
        StatsReport {
            bytes_written: self.bytes_written(),
            bytes_drained,
            bytes_flushed: self.bytes_flushed(),
            available_bytes: available_bytes as u64,
            drain_count: self.drain_count(),
            late_wakeups: self.late_wakeups(),
            blocked_writes: self.blocked_writes(),
            rejected_writes: self.rejected_writes(),
            drained_duration: format
                .duration_of_frames(bytes_drained / format.bytes_per_frame().max(1) as u64),
        }
    }
}

/// 统计报告
#[derive(Debug, Clone)]
pub struct StatsReport {
    pub bytes_written: u64,
    pub bytes_drained: u64,
    pub bytes_flushed: u64,
    pub available_bytes: u64,
    pub drain_count: u64,
    pub late_wakeups: u64,
    pub blocked_writes: u64,
    pub rejected_writes: u64,
    /// 已消费数据对应的音频时长
    pub drained_duration: Duration,
}

impl StatsReport {
    /// 写入量是否等于 消费 + 清空 + 剩余
    pub fn is_balanced(&self) -> bool {
        self.bytes_written == self.bytes_drained + self.bytes_flushed + self.available_bytes
    }
}

impl std::fmt::Display for StatsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Pacer Statistics")?;
        writeln!(f, "================")?;
        writeln!(f, "Bytes written:  {}", self.bytes_written)?;
        writeln!(f, "Bytes drained:  {}", self.bytes_drained)?;
        writeln!(f, "Bytes flushed:  {}", self.bytes_flushed)?;
        writeln!(f, "Bytes buffered: {}", self.available_bytes)?;
        writeln!(f)?;

        writeln!(f, "Consumer:")?;
        writeln!(f, "  Chunks drained: {}", self.drain_count)?;
        writeln!(
            f,
            "  Audio played:   {:.2} s",
            self.drained_duration.as_secs_f64()
        )?;
        let late_pct = if self.drain_count > 0 {
            self.late_wakeups as f64 / self.drain_count as f64 * 100.0
        } else {
            0.0
        };
        writeln!(
            f,
            "  Late wakeups:   {} ({:.1}%)",
            self.late_wakeups, late_pct
        )?;
        writeln!(f)?;

        writeln!(f, "Producer:")?;
        writeln!(f, "  Blocked writes:  {}", self.blocked_writes)?;
        writeln!(f, "  Rejected writes: {}", self.rejected_writes)?;

        Ok(())
    }
}

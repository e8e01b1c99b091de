//! 单调时钟
//!
//! unix 上直接读 CLOCK_MONOTONIC，其他平台回退到 std::time::Instant。
//! 读数是"自某个固定原点起的时长"，只用于相减和比较

use std::time::Duration;

#[cfg(not(unix))]
use std::sync::OnceLock;
#[cfg(not(unix))]
use std::time::Instant;

/// 时钟抽象
///
/// 生产环境用 `MonotonicClock`；测试可以注入手动推进的时钟，
/// 从而脱离线程独立验证调度逻辑
pub trait Clock: Send {
    /// 当前单调时间
    fn now(&self) -> Duration;

    /// 睡眠指定时长
    fn sleep(&self, duration: Duration);
}

/// 系统单调时钟
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Duration {
        now()
    }

    #[inline]
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// 获取当前单调时间
#[cfg(unix)]
#[inline]
pub fn now() -> Duration {
    // CLOCK_MONOTONIC 在所有受支持的 unix 上都存在，调用不会失败
    let ts = unsafe {
        let mut ts: libc::timespec = std::mem::zeroed();
        libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
        ts
    };
    Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32)
}

#[cfg(not(unix))]
#[inline]
pub fn now() -> Duration {
    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    ORIGIN.get_or_init(Instant::now).elapsed()
}

/// 获取当前时间（纳秒）
#[inline]
pub fn now_ns() -> u64 {
    now().as_nanos() as u64
}

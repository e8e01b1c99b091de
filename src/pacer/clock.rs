//! 节拍时钟
//!
//! 维护下一次唤醒的单调时间点。每消费一块数据就把截止时间推后
//! 该块的播放时长，然后睡到截止时间。
//!
//! 迟到策略：如果醒来时已经过了截止时间，直接把基准重置为"现在"，
//! 不做追赶（不会连续快速消费多块来补回时间）

use std::time::Duration;

use crate::audio::timing::{Clock, MonotonicClock};

/// 一次等待的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    /// 按时：实际睡眠了多久（可能为 0）
    OnTime(Duration),
    /// 迟到：落后截止时间多久，基准已重置
    Late(Duration),
}

impl Wakeup {
    #[inline]
    pub fn is_late(&self) -> bool {
        matches!(self, Self::Late(_))
    }
}

/// 节拍时钟
pub struct PacingClock<C: Clock = MonotonicClock> {
    clock: C,
    next_wakeup: Duration,
}

impl PacingClock<MonotonicClock> {
    /// 使用系统单调时钟，基准为当前时间
    pub fn monotonic() -> Self {
        Self::new(MonotonicClock)
    }
}

impl<C: Clock> PacingClock<C> {
    pub fn new(clock: C) -> Self {
        let next_wakeup = clock.now();
        Self { clock, next_wakeup }
    }

    /// 下一次唤醒的时间点
    #[inline]
    pub fn next_wakeup(&self) -> Duration {
        self.next_wakeup
    }

    /// 把基准重置为当前时间
    ///
    /// 消费者空等数据或暂停之后调用，空闲时间不算迟到
    pub fn reset(&mut self) {
        self.next_wakeup = self.clock.now();
    }

    /// 截止时间推后 `duration`
    #[inline]
    pub fn advance(&mut self, duration: Duration) {
        self.next_wakeup = self.next_wakeup.saturating_add(duration);
    }

    /// 睡到下一次截止时间
    pub fn sleep_until_next(&mut self) -> Wakeup {
        let now = self.clock.now();

        if now > self.next_wakeup {
            let behind = now - self.next_wakeup;
            self.next_wakeup = now;
            return Wakeup::Late(behind);
        }

        let remaining = self.next_wakeup - now;
        if !remaining.is_zero() {
            self.clock.sleep(remaining);
        }
        Wakeup::OnTime(remaining)
    }
}

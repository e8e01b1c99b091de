//! 消费线程
//!
//! 循环：等数据 → 消费一块（≤10ms 音频）→ 推进节拍时钟 → 睡到截止时间。
//! 锁只在记账时持有，睡眠永远在锁外进行

use std::sync::Arc;

use super::clock::{PacingClock, Wakeup};
use super::{PacerState, Shared};
use crate::audio::format::CHUNK_MILLIS;
use crate::audio::timing::Clock;

/// 一次取数的结果
enum Drain {
    /// 消费了 `bytes` 字节；`waited` 表示期间空等过（无数据或暂停）
    Chunk { bytes: usize, waited: bool },
    /// 状态变为 Stopped，线程退出
    Exit,
}

/// 消费线程入口
pub(super) fn run(shared: Arc<Shared>, realtime: bool) {
    if realtime {
        set_consumer_thread_priority();
    }

    drain_loop(&shared, PacingClock::monotonic());
}

/// 消费主循环，直到状态变为 Stopped
pub(super) fn drain_loop<C: Clock>(shared: &Shared, mut pacing: PacingClock<C>) {
    let format = shared.format;
    let chunk_bytes = format.chunk_bytes();

    log::info!(
        "Pacer consumer started: {} bytes per {}ms chunk ({})",
        chunk_bytes,
        CHUNK_MILLIS,
        format
    );

    loop {
        let drained = match next_chunk(shared, chunk_bytes) {
            Drain::Chunk { bytes, waited } => {
                // 空闲时间不算迟到，从现在重新计时
                if waited {
                    pacing.reset();
                }
                bytes
            }
            Drain::Exit => break,
        };

        pacing.advance(format.duration_of_bytes(drained));
        if let Wakeup::Late(behind) = pacing.sleep_until_next() {
            shared.stats.record_late_wakeup();
            log::trace!("Pacer consumer late by {}µs", behind.as_micros());
        }
    }

    log::info!("Pacer consumer exiting");
}

/// 持锁取一块数据
///
/// 无数据或暂停时在 not_empty 上等待，每次醒来都重新检查状态
fn next_chunk(shared: &Shared, chunk_bytes: usize) -> Drain {
    let mut inner = shared.lock();
    let mut waited = false;

    loop {
        match inner.state {
            PacerState::Stopped => return Drain::Exit,
            PacerState::Running if !inner.ring.is_empty() => break,
            PacerState::Running | PacerState::Paused => {
                waited = true;
                inner = shared.wait_not_empty(inner);
            }
        }
    }

    // 数据不足一块时消费剩余部分，不算 underrun
    let bytes = inner.ring.consume(chunk_bytes);
    shared.stats.add_drained(bytes);
    shared.not_full.notify_all();

    Drain::Chunk { bytes, waited }
}

/// 设置消费线程优先级
///
/// 优先尝试 SCHED_FIFO 最高优先级（通常需要权限），失败则回退到 nice 值。
/// 失败不影响正确性，只影响节拍抖动
#[cfg(unix)]
fn set_consumer_thread_priority() {
    unsafe {
        let max = libc::sched_get_priority_max(libc::SCHED_FIFO);
        if max >= 0 {
            let mut param: libc::sched_param = std::mem::zeroed();
            param.sched_priority = max;

            let result = libc::pthread_setschedparam(libc::pthread_self(), libc::SCHED_FIFO, &param);
            if result == 0 {
                log::debug!("Pacer consumer running with SCHED_FIFO priority {}", max);
                return;
            }
            log::debug!(
                "Failed to set SCHED_FIFO (errno: {}), falling back to nice -10",
                result
            );
        }

        if libc::setpriority(libc::PRIO_PROCESS, 0, -10) != 0 {
            log::debug!(
                "Failed to raise consumer priority: {}, using default scheduling",
                std::io::Error::last_os_error()
            );
        }
    }
}

#[cfg(not(unix))]
fn set_consumer_thread_priority() {
    log::debug!("Realtime priority not supported on this platform");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioFormat, SampleEncoding};
    use crate::pacer::clock::tests::ManualClock;
    use crate::pacer::{Pacer, PacerConfig};
    use std::thread;
    use std::time::Duration;

    fn idle_pacer() -> Pacer {
        let format = AudioFormat::new(SampleEncoding::S16Le, 2, 44100);
        let config = PacerConfig {
            realtime_priority: false,
            ..PacerConfig::default()
        };
        Pacer::with_config(format, 4410, config).unwrap()
    }

    /// 预先填好数据并置为 Running，再用手动时钟跑消费循环
    fn run_with_manual_clock(p: &Pacer, prefill: usize) -> ManualClock {
        {
            let mut inner = p.shared.lock();
            inner.ring.write(&vec![0u8; prefill]);
            inner.state = PacerState::Running;
        }

        let clock = ManualClock::default();
        let shared = Arc::clone(&p.shared);
        let pacing = PacingClock::new(clock.clone());
        let handle = thread::spawn(move || drain_loop(&shared, pacing));

        // 手动时钟下睡眠是瞬时的，等数据被消费完即可
        while p.available_bytes() > 0 {
            thread::sleep(Duration::from_millis(1));
        }

        p.shared.lock().state = PacerState::Stopped;
        p.shared.wake_all();
        handle.join().unwrap();
        clock
    }

    #[test]
    fn test_virtual_time_matches_audio_drained() {
        let p = idle_pacer();
        let clock = run_with_manual_clock(&p, 8820);

        assert_eq!(p.stats().drain_count(), 5);
        assert_eq!(p.stats().bytes_drained(), 8820);
        assert_eq!(p.stats().late_wakeups(), 0);
        assert_eq!(clock.now(), Duration::from_millis(50));
    }

    #[test]
    fn test_partial_chunk() {
        let p = idle_pacer();
        let clock = run_with_manual_clock(&p, 1764 + 400);

        assert_eq!(p.stats().drain_count(), 2);
        assert_eq!(p.stats().bytes_drained(), 2164);
        // 100 帧 @ 44100Hz
        assert_eq!(
            clock.now(),
            Duration::from_millis(10) + Duration::from_nanos(100 * 1_000_000_000 / 44100)
        );
    }

    #[test]
    fn test_exits_when_stopped() {
        let p = idle_pacer();
        let clock = ManualClock::default();
        let shared = Arc::clone(&p.shared);
        // 状态仍是 Stopped，循环立即返回
        drain_loop(&shared, PacingClock::new(clock.clone()));
        assert_eq!(p.stats().drain_count(), 0);
        assert_eq!(clock.now(), Duration::ZERO);
    }
}

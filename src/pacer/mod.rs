//! Pacer：模拟音频输出设备
//!
//! 没有可用的物理/虚拟声卡时，用一个定长环形缓冲区 + 专用消费线程
//! 按采样率"播放"数据，让上游生产者感受到与真实设备一致的背压。
//!
//! 同步纪律：
//! - 环形缓冲区和状态只由一把 Mutex 保护
//! - 写入者等待 not_full，消费者等待 not_empty，醒来后都重新检查状态
//! - 任何转入 Paused/Stopped 的状态变化都广播两个条件变量
//! - close 必须 join 消费线程之后才释放缓冲区

mod clock;
mod consumer;
mod registry;

pub use clock::{PacingClock, Wakeup};
pub use registry::{PacerId, PacerRegistry, WRITE_ERROR};

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use thiserror::Error;

use crate::audio::{AudioFormat, PacerStats, RingBuffer, SampleEncoding, StatsReport};

/// Pacer 错误
#[derive(Debug, Error)]
pub enum PacerError {
    /// 缓冲区内存无法分配
    #[error("failed to allocate {bytes} byte ring buffer")]
    Allocation { bytes: usize },
    #[error("invalid audio format: {0}")]
    InvalidFormat(&'static str),
    /// 写入时（进入或被唤醒时）状态不是 Running
    #[error("pacer is not running")]
    NotRunning,
    #[error("invalid or closed pacer handle")]
    InvalidHandle,
    #[error("invalid frame count: {0}")]
    InvalidFrameCount(i32),
    #[error("short buffer: {expected} bytes required, {actual} provided")]
    ShortBuffer { expected: usize, actual: usize },
    #[error("failed to spawn consumer thread: {0}")]
    SpawnFailed(#[source] std::io::Error),
}

/// Pacer 状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacerState {
    /// 消费线程未运行（从未启动或已退出）
    Stopped,
    /// 消费线程正在消费，接受写入
    Running,
    /// 消费线程存活但空闲，拒绝写入
    Paused,
}

/// Pacer 配置
#[derive(Clone, Debug)]
pub struct PacerConfig {
    /// 消费线程是否请求实时调度（SCHED_FIFO）
    pub realtime_priority: bool,
    /// 是否 mlock 环形缓冲区
    pub lock_memory: bool,
    /// 消费线程名称
    pub thread_name: String,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            realtime_priority: true,
            lock_memory: false,
            thread_name: "pacer-consumer".to_string(),
        }
    }
}

/// 锁内状态
struct Inner {
    ring: RingBuffer,
    state: PacerState,
    /// close 之后不允许再次 start
    closed: bool,
}

/// 生产者、消费者、控制方共享的部分
pub(crate) struct Shared {
    inner: Mutex<Inner>,
    not_full: Condvar,
    not_empty: Condvar,
    format: AudioFormat,
    stats: PacerStats,
}

impl Shared {
    // 锁内只有简单的指针运算和 memcpy，不会在持锁时 panic；
    // 即使 poison 也继续使用内部数据
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_not_full<'a>(&self, guard: MutexGuard<'a, Inner>) -> MutexGuard<'a, Inner> {
        self.not_full
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_not_empty<'a>(&self, guard: MutexGuard<'a, Inner>) -> MutexGuard<'a, Inner> {
        self.not_empty
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// 唤醒所有等待者，让它们观察新状态
    fn wake_all(&self) {
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }
}

/// 模拟音频输出设备
///
/// 所有操作都接受 `&self`，可以放进 `Arc` 在生产线程和控制线程之间共享
pub struct Pacer {
    shared: Arc<Shared>,
    consumer: Mutex<Option<JoinHandle<()>>>,
    config: PacerConfig,
    buffer_frames: usize,
}

impl Pacer {
    /// 创建 pacer（默认配置）
    ///
    /// 缓冲区大小 = `buffer_frames × 帧大小`，初始状态 Stopped，不启动线程
    pub fn new(format: AudioFormat, buffer_frames: usize) -> Result<Self, PacerError> {
        Self::with_config(format, buffer_frames, PacerConfig::default())
    }

    /// 按绑定层参数创建
    pub fn create(
        encoding: SampleEncoding,
        channels: u16,
        sample_rate: u32,
        buffer_frames: usize,
    ) -> Result<Self, PacerError> {
        Self::new(AudioFormat::new(encoding, channels, sample_rate), buffer_frames)
    }

    pub fn with_config(
        format: AudioFormat,
        buffer_frames: usize,
        config: PacerConfig,
    ) -> Result<Self, PacerError> {
        format.validate()?;
        if buffer_frames == 0 {
            return Err(PacerError::InvalidFormat("buffer frames must be positive"));
        }

        let capacity = buffer_frames
            .checked_mul(format.bytes_per_frame())
            .ok_or(PacerError::Allocation { bytes: usize::MAX })?;
        let mut ring = RingBuffer::new(capacity)?;
        if config.lock_memory {
            ring.lock_memory();
        }

        log::info!(
            "Pacer created: {} | buffer {} frames ({} bytes, {} ms)",
            format,
            buffer_frames,
            capacity,
            format.latency_millis(buffer_frames)
        );

        Ok(Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    ring,
                    state: PacerState::Stopped,
                    closed: false,
                }),
                not_full: Condvar::new(),
                not_empty: Condvar::new(),
                format,
                stats: PacerStats::new(),
            }),
            consumer: Mutex::new(None),
            config,
            buffer_frames,
        })
    }

    /// 开始/恢复消费
    ///
    /// - Stopped：启动消费线程，转入 Running
    /// - Paused：转入 Running 并唤醒消费线程
    /// - Running：无操作
    ///
    /// close 之后调用无效果
    pub fn start(&self) -> Result<(), PacerError> {
        // 锁顺序：consumer → inner
        let mut consumer = self.consumer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut inner = self.shared.lock();

        if inner.closed {
            log::debug!("start() on closed pacer ignored");
            return Ok(());
        }

        match inner.state {
            PacerState::Running => {}
            PacerState::Paused => {
                inner.state = PacerState::Running;
                self.shared.not_empty.notify_all();
                log::debug!("Pacer resumed");
            }
            PacerState::Stopped => {
                inner.state = PacerState::Running;
                drop(inner);

                let shared = Arc::clone(&self.shared);
                let realtime = self.config.realtime_priority;
                let spawned = thread::Builder::new()
                    .name(self.config.thread_name.clone())
                    .spawn(move || consumer::run(shared, realtime));

                match spawned {
                    Ok(handle) => *consumer = Some(handle),
                    Err(e) => {
                        log::warn!("Failed to spawn pacer consumer thread: {}", e);
                        self.shared.lock().state = PacerState::Stopped;
                        self.shared.wake_all();
                        return Err(PacerError::SpawnFailed(e));
                    }
                }
            }
        }
        Ok(())
    }

    /// 写入 `num_frames` 帧
    ///
    /// 空间不足时阻塞，直到消费者腾出空间或状态离开 Running。
    /// 超过缓冲区容量的写入按容量分段完成，每段都受背压约束；
    /// 中途离开 Running 时返回已提交的帧数，一段都没提交才返回 NotRunning。
    /// `data` 中超出 `num_frames` 的尾部字节被忽略
    pub fn write(&self, data: &[u8], num_frames: usize) -> Result<usize, PacerError> {
        let expected = num_frames.saturating_mul(self.shared.format.bytes_per_frame());
        if data.len() < expected {
            return Err(PacerError::ShortBuffer {
                expected,
                actual: data.len(),
            });
        }
        let data = &data[..expected];

        let shared = &*self.shared;
        let mut inner = shared.lock();

        if inner.state != PacerState::Running {
            shared.stats.record_rejected_write();
            return Err(PacerError::NotRunning);
        }

        // Running 时缓冲区一定未释放，容量 > 0
        // 容量是帧大小的整数倍，每段都是完整帧
        let capacity = inner.ring.capacity();
        let mut committed = 0;
        for piece in data.chunks(capacity) {
            let mut blocked = false;
            while inner.ring.free_space() < piece.len() && inner.state == PacerState::Running {
                blocked = true;
                inner = shared.wait_not_full(inner);
            }
            if blocked {
                shared.stats.record_blocked_write();
            }

            if inner.state != PacerState::Running {
                if committed > 0 {
                    return Ok(committed / shared.format.bytes_per_frame());
                }
                shared.stats.record_rejected_write();
                return Err(PacerError::NotRunning);
            }

            inner.ring.write(piece);
            committed += piece.len();
            shared.stats.add_written(piece.len());
            shared.not_empty.notify_one();
        }

        Ok(num_frames)
    }

    /// 暂停消费
    ///
    /// 只在 Running 时生效；阻塞中的写入返回 NotRunning，消费线程进入空闲
    pub fn pause(&self) {
        let mut inner = self.shared.lock();
        if inner.state != PacerState::Running {
            return;
        }
        inner.state = PacerState::Paused;
        self.shared.wake_all();
        log::debug!("Pacer paused ({} bytes buffered)", inner.ring.available());
    }

    /// 与 pause 完全相同：消费线程保持存活，之后可以再次 start。
    /// 真正的收尾只在 close 中进行
    pub fn stop(&self) {
        self.pause();
    }

    /// 丢弃缓冲区中的全部数据
    ///
    /// 不改变状态；唤醒等待空间的写入者
    pub fn flush(&self) {
        let mut inner = self.shared.lock();
        let discarded = inner.ring.available();
        inner.ring.reset();
        self.shared.stats.add_flushed(discarded);
        self.shared.not_full.notify_all();
        log::debug!("Pacer flushed, {} bytes discarded", discarded);
    }

    /// 关闭：停止并 join 消费线程，释放缓冲区
    ///
    /// 幂等，重复调用安全。并发调用时每个调用者都在消费线程退出后才返回
    pub fn close(&self) {
        // 锁顺序：consumer → inner；持有 consumer 直到 join 完成
        let mut consumer = self.consumer.lock().unwrap_or_else(PoisonError::into_inner);
        {
            let mut inner = self.shared.lock();
            if inner.closed {
                return;
            }
            inner.closed = true;
            inner.state = PacerState::Stopped;
            self.shared.wake_all();
        }

        if let Some(handle) = consumer.take() {
            if handle.join().is_err() {
                log::warn!("Pacer consumer thread panicked");
            }
        }

        // 消费线程已退出，之后不会再有人访问缓冲区内容
        let ring = std::mem::replace(&mut self.shared.lock().ring, RingBuffer::empty());
        drop(ring);
        drop(consumer);

        log::info!("Pacer closed");
    }

    /// 当前状态
    pub fn state(&self) -> PacerState {
        self.shared.lock().state
    }

    /// 是否已关闭
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// 缓冲区中尚未消费的字节数
    pub fn available_bytes(&self) -> usize {
        self.shared.lock().ring.available()
    }

    /// 缓冲区容量（字节），关闭后为 0
    pub fn capacity_bytes(&self) -> usize {
        self.shared.lock().ring.capacity()
    }

    /// 缓冲区填充比例
    pub fn fill_ratio(&self) -> f64 {
        self.shared.lock().ring.fill_ratio()
    }

    /// 缓冲区大小（帧）
    pub fn buffer_frames(&self) -> usize {
        self.buffer_frames
    }

    /// 缓冲区延迟（毫秒）
    pub fn latency_millis(&self) -> u32 {
        self.shared.format.latency_millis(self.buffer_frames)
    }

    pub fn format(&self) -> &AudioFormat {
        &self.shared.format
    }

    pub fn config(&self) -> &PacerConfig {
        &self.config
    }

    pub fn stats(&self) -> &PacerStats {
        &self.shared.stats
    }

    /// 生成统计报告
    ///
    /// 在锁内读取，报告满足守恒关系
    pub fn report(&self) -> StatsReport {
        let inner = self.shared.lock();
        self.shared
            .stats
            .report(&self.shared.format, inner.ring.available())
    }
}

impl Drop for Pacer {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    fn test_config() -> PacerConfig {
        // 测试环境通常没有实时调度权限
        PacerConfig {
            realtime_priority: false,
            ..PacerConfig::default()
        }
    }

    fn pacer(sample_rate: u32, buffer_frames: usize) -> Pacer {
        let format = AudioFormat::new(SampleEncoding::S16Le, 2, sample_rate);
        Pacer::with_config(format, buffer_frames, test_config()).unwrap()
    }

    /// 轮询直到条件成立或超时
    fn wait_for(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        cond()
    }

    #[test]
    fn test_create_validates() {
        let format = AudioFormat::new(SampleEncoding::S16Le, 2, 44100);
        assert!(matches!(
            Pacer::new(format, 0),
            Err(PacerError::InvalidFormat(_))
        ));
        assert!(matches!(
            Pacer::create(SampleEncoding::U8, 0, 44100, 10),
            Err(PacerError::InvalidFormat(_))
        ));
        assert!(matches!(
            Pacer::new(format, usize::MAX),
            Err(PacerError::Allocation { .. })
        ));
    }

    #[test]
    fn test_create_sizes_buffer() {
        let p = Pacer::create(SampleEncoding::FloatLe, 2, 48000, 480).unwrap();
        assert_eq!(p.capacity_bytes(), 480 * 8);
        assert_eq!(p.state(), PacerState::Stopped);
        assert_eq!(p.available_bytes(), 0);
        assert_eq!(p.latency_millis(), 10);
    }

    #[test]
    fn test_write_rejected_unless_running() {
        let p = pacer(44100, 4410);
        assert!(matches!(p.write(&[0; 16], 4), Err(PacerError::NotRunning)));

        p.start().unwrap();
        p.pause();
        assert_eq!(p.state(), PacerState::Paused);
        assert!(matches!(p.write(&[0; 16], 4), Err(PacerError::NotRunning)));
        assert_eq!(p.stats().rejected_writes(), 2);
    }

    #[test]
    fn test_write_short_buffer() {
        let p = pacer(44100, 4410);
        p.start().unwrap();
        assert!(matches!(
            p.write(&[0; 15], 4),
            Err(PacerError::ShortBuffer {
                expected: 16,
                actual: 15
            })
        ));
        assert_eq!(p.write(&[], 0).unwrap(), 0);
    }

    #[test]
    fn test_start_is_idempotent() {
        let p = pacer(44100, 4410);
        p.start().unwrap();
        p.start().unwrap();
        assert_eq!(p.state(), PacerState::Running);
        p.close();
        assert_eq!(p.state(), PacerState::Stopped);
    }

    #[test]
    fn test_written_data_drains() {
        let p = pacer(44100, 4410);
        p.start().unwrap();

        // 50ms 音频
        assert_eq!(p.write(&vec![1u8; 2205 * 4], 2205).unwrap(), 2205);
        assert!(wait_for(Duration::from_millis(500), || p.available_bytes() == 0));
        assert_eq!(p.stats().bytes_drained(), 2205 * 4);
    }

    #[test]
    fn test_back_pressure_paces_large_write() {
        // 容量 10ms，写入 100ms：至少要等消费者消费约 90ms
        let p = pacer(44100, 441);
        p.start().unwrap();

        let frames = 4410;
        let start = Instant::now();
        assert_eq!(p.write(&vec![0u8; frames * 4], frames).unwrap(), frames);
        let elapsed = start.elapsed();

        assert!(
            elapsed >= Duration::from_millis(70),
            "write returned too early: {:?}",
            elapsed
        );
        assert!(p.stats().blocked_writes() > 0);
        assert!(p.available_bytes() <= p.capacity_bytes());
    }

    #[test]
    fn test_pause_freezes_consumption() {
        let p = pacer(44100, 44100);
        p.start().unwrap();
        p.write(&vec![0u8; 44100 * 4], 44100).unwrap();
        thread::sleep(Duration::from_millis(30));

        p.pause();
        let frozen = p.available_bytes();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(p.available_bytes(), frozen);

        p.start().unwrap();
        assert!(wait_for(Duration::from_millis(500), || p.available_bytes() < frozen));
    }

    #[test]
    fn test_stop_behaves_like_pause() {
        let p = pacer(44100, 44100);
        p.start().unwrap();
        p.write(&vec![0u8; 4410 * 4], 4410).unwrap();

        p.stop();
        assert_eq!(p.state(), PacerState::Paused);
        let frozen = p.available_bytes();
        thread::sleep(Duration::from_millis(40));
        assert_eq!(p.available_bytes(), frozen);

        // 消费线程仍然存活，可以再次启动
        p.start().unwrap();
        assert!(wait_for(Duration::from_millis(500), || p.available_bytes() < frozen));
    }

    #[test]
    fn test_flush_discards_regardless_of_state() {
        let p = pacer(44100, 44100);
        p.start().unwrap();
        p.write(&vec![0u8; 8820], 2205).unwrap();
        p.pause();
        assert!(p.available_bytes() > 0);

        p.flush();
        assert_eq!(p.available_bytes(), 0);
        assert_eq!(p.state(), PacerState::Paused);
        assert!(p.report().is_balanced());
    }

    #[test]
    fn test_flush_unblocks_writer() {
        // 100Hz：每 10ms 只消费 1 帧，填满后写入者会长时间阻塞
        let p = Arc::new(pacer(100, 100));
        p.start().unwrap();
        p.write(&[0u8; 400], 100).unwrap();

        let (tx, rx) = mpsc::channel();
        let writer = {
            let p = Arc::clone(&p);
            thread::spawn(move || {
                let start = Instant::now();
                let result = p.write(&[0u8; 200], 50);
                tx.send(start.elapsed()).unwrap();
                result
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(rx.try_recv().is_err(), "writer should still be blocked");

        p.flush();
        let waited = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(waited < Duration::from_millis(400), "waited {:?}", waited);
        assert_eq!(writer.join().unwrap().unwrap(), 50);
    }

    #[test]
    fn test_pause_unblocks_writer() {
        let p = Arc::new(pacer(100, 100));
        p.start().unwrap();
        p.write(&[0u8; 400], 100).unwrap();

        let writer = {
            let p = Arc::clone(&p);
            thread::spawn(move || p.write(&[0u8; 400], 100))
        };

        thread::sleep(Duration::from_millis(30));
        p.pause();
        assert!(matches!(
            writer.join().unwrap(),
            Err(PacerError::NotRunning)
        ));
    }

    #[test]
    fn test_pause_mid_oversized_write_reports_committed_frames() {
        // 每 10ms 消费 1 帧，容量 100 帧
        let p = Arc::new(pacer(100, 100));
        p.start().unwrap();

        let writer = {
            let p = Arc::clone(&p);
            thread::spawn(move || p.write(&[0u8; 1000], 250))
        };

        // 第一段 100 帧立即提交，第二段在背压中等待
        assert!(wait_for(Duration::from_secs(1), || p.stats().bytes_written() == 400));
        thread::sleep(Duration::from_millis(50));
        p.pause();

        assert_eq!(writer.join().unwrap().unwrap(), 100);
        assert_eq!(p.stats().bytes_written(), 400);
        assert_eq!(p.stats().rejected_writes(), 0);
    }

    #[test]
    fn test_concurrent_close_waits_for_consumer_exit() {
        let p = Arc::new(pacer(44100, 4410));
        p.start().unwrap();
        p.write(&[0u8; 8820], 2205).unwrap();

        let closers: Vec<_> = (0..4)
            .map(|_| {
                let p = Arc::clone(&p);
                thread::spawn(move || {
                    p.close();
                    // 消费线程持有的 Shared 引用已随线程退出释放
                    Arc::strong_count(&p.shared)
                })
            })
            .collect();

        for closer in closers {
            assert_eq!(closer.join().unwrap(), 1);
        }
        assert!(p.is_closed());
    }

    #[test]
    fn test_close_unblocks_writer_and_joins_consumer() {
        let p = Arc::new(pacer(100, 100));
        p.start().unwrap();
        p.write(&[0u8; 400], 100).unwrap();

        let (tx, rx) = mpsc::channel();
        let writer = {
            let p = Arc::clone(&p);
            thread::spawn(move || {
                let result = p.write(&[0u8; 400], 100);
                tx.send(()).unwrap();
                result
            })
        };

        thread::sleep(Duration::from_millis(30));
        p.close();

        rx.recv_timeout(Duration::from_secs(1))
            .expect("writer still blocked after close");
        assert!(matches!(
            writer.join().unwrap(),
            Err(PacerError::NotRunning)
        ));
        assert_eq!(p.state(), PacerState::Stopped);
        assert!(p.consumer.lock().unwrap().is_none());
        assert_eq!(p.capacity_bytes(), 0);
    }

    #[test]
    fn test_close_is_idempotent() {
        let p = pacer(44100, 441);
        p.close();
        p.close();
        assert!(p.is_closed());

        // close 之后 start 无效，写入被拒绝
        p.start().unwrap();
        assert_eq!(p.state(), PacerState::Stopped);
        assert!(matches!(p.write(&[0; 4], 1), Err(PacerError::NotRunning)));
    }

    #[test]
    fn test_close_while_paused() {
        let p = pacer(44100, 441);
        p.start().unwrap();
        p.pause();
        let start = Instant::now();
        p.close();
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_conservation() {
        let p = pacer(44100, 4410);
        p.start().unwrap();

        for _ in 0..5 {
            p.write(&vec![0u8; 441 * 4], 441).unwrap();
            assert!(p.report().is_balanced());
        }
        p.flush();
        p.write(&vec![0u8; 882 * 4], 882).unwrap();
        thread::sleep(Duration::from_millis(15));
        p.pause();

        let report = p.report();
        assert!(report.is_balanced(), "{:?}", report);
        assert_eq!(report.bytes_written, (5 * 441 + 882) * 4);
    }

    #[test]
    fn test_drain_is_fifo() {
        // 1 个声道 u8：字节即帧，便于观察顺序
        let format = AudioFormat::new(SampleEncoding::U8, 1, 1000);
        let p = Pacer::with_config(format, 100, test_config()).unwrap();
        p.start().unwrap();

        let data: Vec<u8> = (0..50).collect();
        p.write(&data, 50).unwrap();
        p.pause();

        let inner = p.shared.lock();
        let mut head = vec![0u8; inner.ring.available()];
        inner.ring.peek_into(&mut head);
        let consumed = 50 - head.len();
        assert_eq!(head, data[consumed..].to_vec());
    }

    #[test]
    fn test_scenario_drain_pause_resume() {
        // 44100Hz，4 字节帧，4410 帧 = 17640 字节
        let p = pacer(44100, 4410);
        assert_eq!(p.capacity_bytes(), 17640);
        p.start().unwrap();

        // 写入半个缓冲区（50ms 音频）
        p.write(&vec![0u8; 8820], 2205).unwrap();
        assert!(p.available_bytes() <= 8820);

        // 每 10ms 消费 1764 字节，约 50ms 清空；留足余量
        assert!(wait_for(Duration::from_millis(300), || p.available_bytes() == 0));
        assert_eq!(p.stats().bytes_drained(), 8820);
        assert!(p.stats().drain_count() >= 5);

        p.write(&vec![0u8; 8820], 2205).unwrap();
        thread::sleep(Duration::from_millis(15));
        p.pause();
        let frozen = p.available_bytes();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(p.available_bytes(), frozen);

        p.start().unwrap();
        assert!(wait_for(Duration::from_millis(300), || p.available_bytes() == 0));

        p.close();
        assert_eq!(p.state(), PacerState::Stopped);
        assert_eq!(p.capacity_bytes(), 0);
    }
}

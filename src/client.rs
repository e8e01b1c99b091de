//! 音频流客户端
//!
//! 上游管线看到的"设备"。两种模式：
//! - 普通模式：只使用真实输出流；工厂不可用时回退到 pacer
//! - 反射模式：pacer 作为主流提供背压和时序，同时把数据镜像到真实输出流。
//!   设备变化时只重建镜像流，pacer 不受影响
//!
//! 真实输出流只通过 `AudioStream` / `StreamFactory` 接入，本 crate 不提供硬件实现

use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::audio::{AudioFormat, SampleEncoding};
use crate::pacer::{Pacer, PacerConfig, PacerError};

/// 客户端错误
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Pacer(#[from] PacerError),
    #[error("output stream error: {0}")]
    Stream(String),
    #[error("no output stream factory configured")]
    NoStreamFactory,
    #[error("failed to rebuild mirror stream after {0} attempts")]
    RebuildFailed(u32),
}

/// 输出流抽象
///
/// `Pacer` 实现了它；真实设备流由调用方提供
pub trait AudioStream: Send {
    /// 写入 `num_frames` 帧，返回写入的帧数
    fn write(&self, data: &[u8], num_frames: usize) -> Result<usize, ClientError>;
    fn start(&self) -> Result<(), ClientError>;
    fn pause(&self);
    fn stop(&self);
    fn flush(&self);
    fn close(&self);
}

impl AudioStream for Pacer {
    fn write(&self, data: &[u8], num_frames: usize) -> Result<usize, ClientError> {
        Ok(Pacer::write(self, data, num_frames)?)
    }

    fn start(&self) -> Result<(), ClientError> {
        Ok(Pacer::start(self)?)
    }

    fn pause(&self) {
        Pacer::pause(self);
    }

    fn stop(&self) {
        Pacer::stop(self);
    }

    fn flush(&self) {
        Pacer::flush(self);
    }

    fn close(&self) {
        Pacer::close(self);
    }
}

/// 真实输出流工厂
pub trait StreamFactory: Send {
    fn create(
        &mut self,
        format: &AudioFormat,
        buffer_frames: usize,
    ) -> Result<Box<dyn AudioStream>, ClientError>;
}

impl<F> StreamFactory for F
where
    F: FnMut(&AudioFormat, usize) -> Result<Box<dyn AudioStream>, ClientError> + Send,
{
    fn create(
        &mut self,
        format: &AudioFormat,
        buffer_frames: usize,
    ) -> Result<Box<dyn AudioStream>, ClientError> {
        self(format, buffer_frames)
    }
}

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub encoding: SampleEncoding,
    pub channels: u16,
    pub sample_rate: u32,
    /// 缓冲区大小（帧）
    pub buffer_frames: usize,
    /// 反射模式：pacer 为主，真实流为镜像
    pub reflector_mode: bool,
    /// 设备变化后重建镜像流的最大尝试次数
    pub rebuild_attempts: u32,
    /// 两次重建尝试之间的间隔
    pub rebuild_delay: Duration,
    pub pacer: PacerConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            encoding: SampleEncoding::U8,
            channels: 2,
            sample_rate: 44100,
            buffer_frames: 4410,
            reflector_mode: true,
            rebuild_attempts: 5,
            rebuild_delay: Duration::from_millis(200),
            pacer: PacerConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn format(&self) -> AudioFormat {
        AudioFormat::new(self.encoding, self.channels, self.sample_rate)
    }
}

/// 音频流客户端
pub struct SinkClient {
    config: ClientConfig,
    factory: Option<Box<dyn StreamFactory>>,
    primary: Option<Box<dyn AudioStream>>,
    mirror: Option<Box<dyn AudioStream>>,
    playing: bool,
    /// 已写入的帧数
    position: u64,
}

impl SinkClient {
    /// 创建客户端（无真实输出流）
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            factory: None,
            primary: None,
            mirror: None,
            playing: false,
            position: 0,
        }
    }

    /// 创建带真实输出流工厂的客户端
    pub fn with_factory(config: ClientConfig, factory: impl StreamFactory + 'static) -> Self {
        let mut client = Self::new(config);
        client.factory = Some(Box::new(factory));
        client
    }

    /// 按当前配置（重新）创建流并开始播放
    ///
    /// 缓冲区大小无效时保持未就绪状态
    pub fn prepare(&mut self) -> Result<(), ClientError> {
        self.position = 0;
        self.release();

        if !self.is_valid_buffer_size() {
            log::warn!(
                "Invalid buffer size: {} frames, stream not prepared",
                self.config.buffer_frames
            );
            return Ok(());
        }

        let format = self.config.format();
        let buffer_frames = self.config.buffer_frames;

        if self.config.reflector_mode {
            self.primary = Some(self.create_pacer()?);
            self.mirror = match self.create_real_stream() {
                Ok(stream) => Some(stream),
                Err(e) => {
                    log::warn!("Mirror stream unavailable, pacing only: {}", e);
                    None
                }
            };
        } else {
            self.primary = match self.create_real_stream() {
                Ok(stream) => Some(stream),
                Err(e) => {
                    log::warn!("Output stream unavailable, falling back to pacer: {}", e);
                    Some(self.create_pacer()?)
                }
            };
        }

        log::info!(
            "Stream prepared: {} | {} frames ({} ms){}",
            format,
            buffer_frames,
            self.latency_millis(),
            if self.mirror.is_some() { " | mirrored" } else { "" }
        );

        self.start()
    }

    fn create_pacer(&self) -> Result<Box<dyn AudioStream>, ClientError> {
        let pacer = Pacer::with_config(
            self.config.format(),
            self.config.buffer_frames,
            self.config.pacer.clone(),
        )?;
        Ok(Box::new(pacer))
    }

    fn create_real_stream(&mut self) -> Result<Box<dyn AudioStream>, ClientError> {
        let format = self.config.format();
        let buffer_frames = self.config.buffer_frames;
        match self.factory.as_mut() {
            Some(factory) => factory.create(&format, buffer_frames),
            None => Err(ClientError::NoStreamFactory),
        }
    }

    /// 开始播放
    pub fn start(&mut self) -> Result<(), ClientError> {
        let Some(primary) = self.primary.as_ref() else {
            return Ok(());
        };
        if self.playing {
            return Ok(());
        }

        primary.start()?;
        if let Some(mirror) = self.mirror.as_ref() {
            if let Err(e) = mirror.start() {
                log::warn!("Failed to start mirror stream: {}", e);
            }
        }
        self.playing = true;
        Ok(())
    }

    /// 停止播放
    pub fn stop(&mut self) {
        if let Some(primary) = self.primary.as_ref() {
            if self.playing {
                primary.stop();
                if let Some(mirror) = self.mirror.as_ref() {
                    mirror.stop();
                }
                self.playing = false;
            }
        }
    }

    /// 暂停播放
    pub fn pause(&mut self) {
        if let Some(primary) = self.primary.as_ref() {
            primary.pause();
            if let Some(mirror) = self.mirror.as_ref() {
                mirror.pause();
            }
            self.playing = false;
        }
    }

    /// 丢弃尚未播放的数据
    pub fn drain(&mut self) {
        if let Some(primary) = self.primary.as_ref() {
            primary.flush();
            if let Some(mirror) = self.mirror.as_ref() {
                mirror.flush();
            }
        }
    }

    /// 写入交织帧
    ///
    /// 帧数 = 字节数 / 帧大小，不足一帧的尾部被忽略。
    /// 未在播放时直接返回 0。主流的背压决定调用阻塞多久；
    /// 镜像流总会收到数据，其写入失败只记录日志。只有主流写入的帧数推进 position
    pub fn write_frames(&mut self, data: &[u8]) -> Result<usize, ClientError> {
        if !self.playing {
            return Ok(0);
        }
        let Some(primary) = self.primary.as_ref() else {
            return Ok(0);
        };

        let num_frames = data.len() / self.config.format().bytes_per_frame();
        let result = primary.write(data, num_frames);

        if let Some(mirror) = self.mirror.as_ref() {
            if let Err(e) = mirror.write(data, num_frames) {
                log::debug!("Mirror write failed: {}", e);
            }
        }

        let written = result?;
        self.position += written as u64;
        Ok(written)
    }

    /// 输出设备变化时重建镜像流
    ///
    /// 只在反射模式下生效；pacer 不受影响
    pub fn on_device_changed(&mut self) -> Result<(), ClientError> {
        if !self.config.reflector_mode {
            log::info!("Audio device change ignored: reflector mode is off");
            return Ok(());
        }
        if self.factory.is_none() {
            return Err(ClientError::NoStreamFactory);
        }

        if let Some(mirror) = self.mirror.take() {
            log::info!("Tearing down mirror stream");
            mirror.stop();
            mirror.close();
        }

        let attempts = self.config.rebuild_attempts;
        for attempt in 1..=attempts {
            log::info!("Rebuilding mirror stream (attempt {}/{})", attempt, attempts);

            match self.create_real_stream() {
                Ok(stream) => {
                    if !self.playing {
                        self.mirror = Some(stream);
                        log::info!("Mirror stream rebuilt while paused");
                        return Ok(());
                    }
                    match stream.start() {
                        Ok(()) => {
                            self.mirror = Some(stream);
                            log::info!("Mirror stream rebuilt and resumed");
                            return Ok(());
                        }
                        Err(e) => {
                            log::warn!("Failed to start rebuilt mirror stream: {}", e);
                            stream.close();
                        }
                    }
                }
                Err(e) => log::warn!("Failed to create mirror stream: {}", e),
            }

            if attempt < attempts {
                thread::sleep(self.config.rebuild_delay);
            }
        }

        Err(ClientError::RebuildFailed(attempts))
    }

    /// 停止并关闭所有流
    pub fn release(&mut self) {
        if let Some(primary) = self.primary.take() {
            primary.stop();
            if let Some(mirror) = self.mirror.as_ref() {
                mirror.stop();
            }
            primary.close();
        }
        if let Some(mirror) = self.mirror.take() {
            mirror.close();
        }
        self.playing = false;
    }

    /// 已写入的帧数
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_prepared(&self) -> bool {
        self.primary.is_some()
    }

    pub fn has_mirror(&self) -> bool {
        self.mirror.is_some()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 缓冲区延迟（毫秒）
    pub fn latency_millis(&self) -> u32 {
        self.config.format().latency_millis(self.config.buffer_frames)
    }

    /// 缓冲区大小（字节）
    pub fn buffer_size_bytes(&self) -> usize {
        self.config.buffer_frames * self.config.format().bytes_per_frame()
    }

    fn is_valid_buffer_size(&self) -> bool {
        self.config.buffer_frames > 0 && self.config.format().validate().is_ok()
    }
}

impl Drop for SinkClient {
    fn drop(&mut self) {
        self.release();
    }
}

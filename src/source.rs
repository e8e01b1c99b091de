//! 帧数据源
//!
//! 给 pacer 喂数据的生产者：
//! - `ToneSource`：正弦测试信号，任意编码
//! - `FileSource`：symphonia 解码音频文件（FLAC, WAV, AIFF, MP3），输出 f32le 交织帧

use std::f32::consts::TAU;
use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

use crate::audio::{AudioFormat, SampleEncoding};

/// 数据源错误
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open file: {0}")]
    FileOpen(#[from] std::io::Error),
    #[error("unsupported audio format")]
    UnsupportedFormat,
    #[error("no audio track found")]
    NoAudioTrack,
    #[error("failed to create decoder: {0}")]
    DecoderCreation(String),
    #[error("decode failed: {0}")]
    DecodeFailed(String),
}

/// 交织帧数据源
pub trait FrameSource {
    /// 输出数据的格式
    fn format(&self) -> AudioFormat;

    /// 读取至多 `max_frames` 帧的字节；`None` 表示结束
    fn read_frames(&mut self, max_frames: usize) -> Result<Option<Vec<u8>>, SourceError>;
}

/// 正弦测试信号
pub struct ToneSource {
    format: AudioFormat,
    frequency: f32,
    amplitude: f32,
    total_frames: u64,
    position: u64,
    phase: f32,
    /// 复用的样本缓冲
    samples: Vec<f32>,
}

impl ToneSource {
    pub fn new(format: AudioFormat, frequency: f32, seconds: f32) -> Self {
        let total_frames =
            (f64::from(seconds.max(0.0)) * f64::from(format.sample_rate)).round() as u64;
        Self {
            format,
            frequency,
            amplitude: 0.5,
            total_frames,
            position: 0,
            phase: 0.0,
            samples: Vec::new(),
        }
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude.clamp(0.0, 1.0);
        self
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn remaining_frames(&self) -> u64 {
        self.total_frames - self.position
    }
}

impl FrameSource for ToneSource {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn read_frames(&mut self, max_frames: usize) -> Result<Option<Vec<u8>>, SourceError> {
        let frames = self.remaining_frames().min(max_frames as u64) as usize;
        if frames == 0 {
            return Ok(None);
        }

        let channels = self.format.channels as usize;
        let step = TAU * self.frequency / self.format.sample_rate as f32;

        self.samples.clear();
        self.samples.reserve(frames * channels);
        for _ in 0..frames {
            let value = self.phase.sin() * self.amplitude;
            self.samples.extend(std::iter::repeat(value).take(channels));
            // 相位保持在 [0, 2π)，避免长时间运行后精度下降
            self.phase = (self.phase + step) % TAU;
        }

        let mut bytes = Vec::with_capacity(frames * self.format.bytes_per_frame());
        self.format.encode_f32(&self.samples, &mut bytes);
        self.position += frames as u64;
        Ok(Some(bytes))
    }
}

/// 解码后的音频文件
pub struct FileSource {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    format: AudioFormat,
    /// 已解码未读出的字节
    pending: Vec<u8>,
    sample_buffer: Option<SampleBuffer<f32>>,
    codec: String,
    total_frames: Option<u64>,
    finished: bool,
}

impl FileSource {
    /// 打开音频文件
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();

        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let format_opts = FormatOptions {
            enable_gapless: true,
            ..Default::default()
        };
        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &format_opts, &MetadataOptions::default())
            .map_err(|_| SourceError::UnsupportedFormat)?;
        let reader = probed.format;

        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(SourceError::NoAudioTrack)?;

        let track_id = track.id;
        let params = &track.codec_params;
        let sample_rate = params.sample_rate.ok_or(SourceError::NoAudioTrack)?;
        let channels = params.channels.map(|c| c.count() as u16).unwrap_or(2);
        let total_frames = params.n_frames;

        let codec = symphonia::default::get_codecs()
            .get_codec(params.codec)
            .map(|c| c.short_name.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let decoder = symphonia::default::get_codecs()
            .make(params, &DecoderOptions::default())
            .map_err(|e| SourceError::DecoderCreation(e.to_string()))?;

        let format = AudioFormat::new(SampleEncoding::FloatLe, channels, sample_rate);
        log::info!("Opened {} ({}, {})", path.display(), codec, format);

        Ok(Self {
            reader,
            decoder,
            track_id,
            format,
            pending: Vec::new(),
            sample_buffer: None,
            codec,
            total_frames,
            finished: false,
        })
    }

    pub fn codec(&self) -> &str {
        &self.codec
    }

    /// 总帧数（如果容器提供）
    pub fn total_frames(&self) -> Option<u64> {
        self.total_frames
    }

    /// 解码下一个包，追加到 pending；返回 false 表示文件结束
    fn decode_next(&mut self) -> Result<bool, SourceError> {
        loop {
            let packet = match self.reader.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(false);
                }
                Err(e) => return Err(SourceError::DecodeFailed(e.to_string())),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(d) => d,
                // 损坏的帧直接跳过
                Err(SymphoniaError::DecodeError(e)) => {
                    log::debug!("Skipping corrupt packet: {}", e);
                    continue;
                }
                Err(e) => return Err(SourceError::DecodeFailed(e.to_string())),
            };

            if decoded.frames() == 0 {
                continue;
            }

            let spec = *decoded.spec();
            let duration = decoded.capacity() as u64;
            let needs_realloc = self.sample_buffer.as_ref().map_or(true, |buf| {
                buf.capacity() < decoded.capacity() * spec.channels.count()
            });
            if needs_realloc {
                self.sample_buffer = Some(SampleBuffer::<f32>::new(duration, spec));
            }

            if let Some(buffer) = self.sample_buffer.as_mut() {
                buffer.copy_interleaved_ref(decoded);
                self.format.encode_f32(buffer.samples(), &mut self.pending);
            }
            return Ok(true);
        }
    }
}

impl FrameSource for FileSource {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn read_frames(&mut self, max_frames: usize) -> Result<Option<Vec<u8>>, SourceError> {
        let frame_bytes = self.format.bytes_per_frame();
        let wanted = max_frames.saturating_mul(frame_bytes);

        while !self.finished && self.pending.len() < wanted {
            if !self.decode_next()? {
                self.finished = true;
            }
        }

        // 只交出完整帧
        let take = wanted.min(self.pending.len()) / frame_bytes * frame_bytes;
        if take == 0 {
            return Ok(None);
        }
        let rest = self.pending.split_off(take);
        Ok(Some(std::mem::replace(&mut self.pending, rest)))
    }
}

//! 音频格式与帧大小计算
//!
//! Pacer 不解释样本内容，只关心：
//! - 每样本字节数 × 声道数 = 帧大小
//! - 采样率：决定消费速率
//!
//! 字节序由生产者负责，这里只在生成测试信号时才真正编码样本

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::pacer::PacerError;

/// 每次消费的音频时长（毫秒）
pub const CHUNK_MILLIS: u32 = 10;

/// 样本编码
///
/// 顺序即绑定层使用的序号（0..=4）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleEncoding {
    /// 8-bit 无符号
    U8,
    /// 16-bit 有符号，小端
    S16Le,
    /// 16-bit 有符号，大端
    S16Be,
    /// 32-bit 浮点，小端
    FloatLe,
    /// 32-bit 浮点，大端
    FloatBe,
}

impl SampleEncoding {
    pub const ALL: [SampleEncoding; 5] = [
        Self::U8,
        Self::S16Le,
        Self::S16Be,
        Self::FloatLe,
        Self::FloatBe,
    ];

    /// 从绑定层序号解析
    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    #[inline]
    pub fn ordinal(self) -> i32 {
        match self {
            Self::U8 => 0,
            Self::S16Le => 1,
            Self::S16Be => 2,
            Self::FloatLe => 3,
            Self::FloatBe => 4,
        }
    }

    /// 每样本的字节数
    #[inline]
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::S16Le | Self::S16Be => 2,
            Self::FloatLe | Self::FloatBe => 4,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::S16Le => "s16le",
            Self::S16Be => "s16be",
            Self::FloatLe => "f32le",
            Self::FloatBe => "f32be",
        }
    }
}

impl fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|e| e.name() == lower)
            .ok_or_else(|| {
                format!(
                    "unknown sample encoding '{}' (expected one of: u8, s16le, s16be, f32le, f32be)",
                    s
                )
            })
    }
}

/// 音频格式
///
/// 创建 pacer 后不可变
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioFormat {
    pub encoding: SampleEncoding,
    pub channels: u16,
    pub sample_rate: u32,
}

impl AudioFormat {
    pub fn new(encoding: SampleEncoding, channels: u16, sample_rate: u32) -> Self {
        Self {
            encoding,
            channels,
            sample_rate,
        }
    }

    /// 检查格式是否可用于创建 pacer
    pub fn validate(&self) -> Result<(), PacerError> {
        if self.channels == 0 {
            return Err(PacerError::InvalidFormat("channel count must be positive"));
        }
        if self.sample_rate == 0 {
            return Err(PacerError::InvalidFormat("sample rate must be positive"));
        }
        Ok(())
    }

    /// 每样本的字节数
    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        self.encoding.bytes_per_sample()
    }

    /// 每帧的字节数（交织）
    #[inline]
    pub fn bytes_per_frame(&self) -> usize {
        self.encoding.bytes_per_sample() * self.channels as usize
    }

    /// 一次消费的帧数：10ms 音频，至少 1 帧
    #[inline]
    pub fn chunk_frames(&self) -> usize {
        ((self.sample_rate / (1000 / CHUNK_MILLIS)) as usize).max(1)
    }

    /// 一次消费的字节数
    #[inline]
    pub fn chunk_bytes(&self) -> usize {
        self.chunk_frames() * self.bytes_per_frame()
    }

    /// 给定字节数对应的播放时长
    ///
    /// 不足一帧的尾部字节不计时
    pub fn duration_of_bytes(&self, bytes: usize) -> Duration {
        let frame = self.bytes_per_frame();
        if frame == 0 {
            return Duration::ZERO;
        }
        self.duration_of_frames((bytes / frame) as u64)
    }

    /// 给定帧数对应的播放时长
    ///
    /// 整秒和余数分开算，累计数天的帧数也不会溢出
    pub fn duration_of_frames(&self, frames: u64) -> Duration {
        let rate = u64::from(self.sample_rate);
        if rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs(frames / rate)
            + Duration::from_nanos(frames % rate * 1_000_000_000 / rate)
    }

    /// 缓冲区延迟（毫秒，截断）
    pub fn latency_millis(&self, buffer_frames: usize) -> u32 {
        if self.sample_rate == 0 {
            return 0;
        }
        (buffer_frames as u64 * 1000 / self.sample_rate as u64) as u32
    }

    /// 指定毫秒数对应的帧数
    pub fn frames_for_millis(&self, millis: u32) -> usize {
        (self.sample_rate as u64 * millis as u64 / 1000) as usize
    }

    /// 将 [-1.0, 1.0] 浮点样本按本格式编码追加到 `output`
    ///
    /// 仅用于生成测试信号和解码文件，pacer 本身从不转换格式
    pub fn encode_f32(&self, samples: &[f32], output: &mut Vec<u8>) {
        output.reserve(samples.len() * self.bytes_per_sample());
        for &sample in samples {
            let s = sample.clamp(-1.0, 1.0);
            match self.encoding {
                SampleEncoding::U8 => {
                    output.push((s * 127.0 + 128.0).round() as u8);
                }
                SampleEncoding::S16Le => {
                    output.extend_from_slice(&((s * i16::MAX as f32) as i16).to_le_bytes());
                }
                SampleEncoding::S16Be => {
                    output.extend_from_slice(&((s * i16::MAX as f32) as i16).to_be_bytes());
                }
                SampleEncoding::FloatLe => output.extend_from_slice(&s.to_le_bytes()),
                SampleEncoding::FloatBe => output.extend_from_slice(&s.to_be_bytes()),
            }
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Hz {}ch {}",
            self.sample_rate, self.channels, self.encoding
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size() {
        let cases = [
            (SampleEncoding::U8, 1, 1),
            (SampleEncoding::U8, 2, 2),
            (SampleEncoding::S16Le, 2, 4),
            (SampleEncoding::S16Be, 6, 12),
            (SampleEncoding::FloatLe, 2, 8),
            (SampleEncoding::FloatBe, 1, 4),
        ];
        for (encoding, channels, expected) in cases {
            let format = AudioFormat::new(encoding, channels, 48000);
            assert_eq!(format.bytes_per_frame(), expected, "{}", format);
        }
    }

    #[test]
    fn test_ordinal() {
        for (i, encoding) in SampleEncoding::ALL.iter().enumerate() {
            assert_eq!(encoding.ordinal(), i as i32);
            assert_eq!(SampleEncoding::from_ordinal(i as i32), Some(*encoding));
        }
        assert_eq!(SampleEncoding::from_ordinal(5), None);
        assert_eq!(SampleEncoding::from_ordinal(-1), None);
    }

    #[test]
    fn test_parse_encoding() {
        assert_eq!("S16LE".parse::<SampleEncoding>(), Ok(SampleEncoding::S16Le));
        assert_eq!("f32be".parse::<SampleEncoding>(), Ok(SampleEncoding::FloatBe));
        assert!("s24le".parse::<SampleEncoding>().is_err());
    }

    #[test]
    fn test_chunk_is_ten_millis() {
        let format = AudioFormat::new(SampleEncoding::S16Le, 2, 44100);
        assert_eq!(format.chunk_frames(), 441);
        assert_eq!(format.chunk_bytes(), 1764);
        assert_eq!(
            format.duration_of_bytes(format.chunk_bytes()),
            Duration::from_millis(10)
        );
    }

    #[test]
    fn test_duration_of_many_frames() {
        let format = AudioFormat::new(SampleEncoding::FloatLe, 2, 384000);
        let week = 384000u64 * 86400 * 7;
        assert_eq!(format.duration_of_frames(week), Duration::from_secs(86400 * 7));
        assert_eq!(
            format.duration_of_frames(week + 192000),
            Duration::from_secs(86400 * 7) + Duration::from_millis(500)
        );
        assert!(format.duration_of_frames(u64::MAX) > Duration::from_secs(86400 * 365 * 1000));
    }

    #[test]
    fn test_chunk_at_least_one_frame() {
        let format = AudioFormat::new(SampleEncoding::U8, 1, 50);
        assert_eq!(format.chunk_frames(), 1);
        assert_eq!(format.duration_of_bytes(1), Duration::from_millis(20));
    }

    #[test]
    fn test_validate() {
        assert!(AudioFormat::new(SampleEncoding::U8, 0, 44100).validate().is_err());
        assert!(AudioFormat::new(SampleEncoding::U8, 2, 0).validate().is_err());
        assert!(AudioFormat::new(SampleEncoding::U8, 2, 44100).validate().is_ok());
    }

    #[test]
    fn test_latency_millis() {
        let format = AudioFormat::new(SampleEncoding::S16Le, 2, 48000);
        assert_eq!(format.latency_millis(4800), 100);
        assert_eq!(format.latency_millis(100), 2);
        assert_eq!(format.frames_for_millis(250), 12000);
    }

    #[test]
    fn test_encode_f32() {
        let mut out = Vec::new();
        AudioFormat::new(SampleEncoding::S16Be, 1, 8000).encode_f32(&[1.0, -1.0], &mut out);
        assert_eq!(out, [0x7f, 0xff, 0x80, 0x01]);

        out.clear();
        AudioFormat::new(SampleEncoding::U8, 1, 8000).encode_f32(&[0.0, 2.0], &mut out);
        assert_eq!(out, [128, 255]);

        out.clear();
        AudioFormat::new(SampleEncoding::FloatLe, 1, 8000).encode_f32(&[0.5], &mut out);
        assert_eq!(out, 0.5f32.to_le_bytes());
    }
}

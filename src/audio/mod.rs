//! 音频核心模块
//!
//! 包含：
//! - Format: 样本编码与帧大小
//! - Ring Buffer: 定长字节环形缓冲区
//! - Timing: 单调时钟
//! - Stats: pacer 统计

pub mod format;
pub mod ring_buffer;
pub mod stats;
pub mod timing;

pub use format::{AudioFormat, SampleEncoding};
pub use ring_buffer::RingBuffer;
pub use stats::{PacerStats, StatsReport};
pub use timing::{Clock, MonotonicClock};

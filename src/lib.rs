//! Pacer Sink Library
//!
//! Simulated audio output with real-device back-pressure: a fixed-size ring
//! buffer drained at the sample rate by a dedicated consumer thread.

pub mod audio;
pub mod client;
pub mod pacer;
pub mod source;

pub use audio::{AudioFormat, SampleEncoding};
pub use client::{AudioStream, ClientConfig, ClientError, SinkClient, StreamFactory};
pub use pacer::{Pacer, PacerConfig, PacerError, PacerId, PacerRegistry, PacerState};
pub use source::{FileSource, FrameSource, SourceError, ToneSource};

//! Pacer - 模拟音频输出设备
//!
//! 用法：
//! - `pacer tone`：把正弦信号按实时速率"播放"进 pacer
//! - `pacer play <FILE>`：解码音频文件并按实时速率消费
//! - `pacer scenario`：跑一遍标准场景并打印观测值

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::Rng;

use pacer_sink::audio::{AudioFormat, SampleEncoding};
use pacer_sink::pacer::{Pacer, PacerConfig, PacerError};
use pacer_sink::source::{FileSource, FrameSource, ToneSource};

/// 状态行刷新间隔
const STATUS_INTERVAL: Duration = Duration::from_millis(250);

/// Pacer - simulated audio sink with real-time back-pressure
#[derive(Parser)]
#[command(name = "pacer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Buffer size in milliseconds
    #[arg(short, long, default_value = "100", global = true)]
    buffer_ms: u32,

    /// Do not request real-time scheduling for the consumer thread
    #[arg(long, global = true)]
    no_realtime: bool,

    /// Lock the ring buffer into physical memory
    #[arg(long, global = true)]
    lock_memory: bool,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed a sine tone through the pacer
    Tone {
        /// Sample rate in Hz
        #[arg(short, long, default_value = "44100")]
        rate: u32,

        /// Channel count
        #[arg(short, long, default_value = "2")]
        channels: u16,

        /// Sample encoding (u8, s16le, s16be, f32le, f32be)
        #[arg(short, long, default_value = "s16le")]
        encoding: SampleEncoding,

        /// Tone frequency in Hz
        #[arg(short, long, default_value = "440")]
        frequency: f32,

        /// Duration in seconds
        #[arg(short, long, default_value = "3")]
        seconds: f32,

        /// Write random-sized bursts instead of fixed chunks
        #[arg(long)]
        bursty: bool,
    },

    /// Decode an audio file and feed it through the pacer
    Play {
        /// Audio file to play
        file: PathBuf,
    },

    /// Run the reference pause/resume scenario and print observations
    Scenario,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match cli.command {
        Commands::Tone {
            rate,
            channels,
            encoding,
            frequency,
            seconds,
            bursty,
        } => {
            let format = AudioFormat::new(encoding, channels, rate);
            let mut source = ToneSource::new(format, frequency, seconds);
            println!("Pacer - Tone {:.0} Hz for {:.1}s", frequency, seconds);
            run_source(&mut source, &cli, bursty)?;
        }
        Commands::Play { ref file } => {
            play_file(file, &cli)?;
        }
        Commands::Scenario => {
            run_scenario(&cli)?;
        }
    }

    Ok(())
}

/// 从命令行参数构建 pacer 配置
fn create_pacer_config(cli: &Cli) -> PacerConfig {
    PacerConfig {
        realtime_priority: !cli.no_realtime,
        lock_memory: cli.lock_memory,
        ..PacerConfig::default()
    }
}

/// 按命令行缓冲时长创建 pacer
fn create_pacer(format: AudioFormat, cli: &Cli) -> anyhow::Result<Arc<Pacer>> {
    let buffer_frames = format.frames_for_millis(cli.buffer_ms);
    let pacer = Pacer::with_config(format, buffer_frames, create_pacer_config(cli))
        .with_context(|| format!("failed to create pacer ({}, {} frames)", format, buffer_frames))?;
    Ok(Arc::new(pacer))
}

fn play_file(path: &Path, cli: &Cli) -> anyhow::Result<()> {
    let mut source = FileSource::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    println!("Pacer - Playing: {}", path.display());
    if let Some(total) = source.total_frames() {
        let format = source.format();
        println!(
            "  {} | {:.1}s",
            source.codec(),
            total as f64 / format.sample_rate as f64
        );
    }

    run_source(&mut source, cli, false)
}

/// 把数据源喂进 pacer，直到数据源结束或 Ctrl+C
fn run_source(source: &mut dyn FrameSource, cli: &Cli, bursty: bool) -> anyhow::Result<()> {
    let format = source.format();
    let pacer = create_pacer(format, cli)?;

    println!(
        "  {} | buffer {} frames ({} ms)",
        format,
        pacer.buffer_frames(),
        pacer.latency_millis()
    );
    println!("Press Ctrl+C to stop.\n");

    // Ctrl+C：停止 pacer，阻塞中的写入立刻返回
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        let pacer = Arc::clone(&pacer);
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
            pacer.stop();
        })?;
    }

    pacer.start().context("failed to start pacer")?;

    let chunk_frames = format.chunk_frames();
    let mut rng = rand::thread_rng();
    let started = Instant::now();
    let mut last_status = Instant::now();
    let mut frames_fed = 0u64;

    while running.load(Ordering::SeqCst) {
        let max_frames = if bursty {
            rng.gen_range(1..=chunk_frames * 8)
        } else {
            chunk_frames * 4
        };

        let Some(bytes) = source.read_frames(max_frames).context("source read failed")? else {
            break;
        };
        let num_frames = bytes.len() / format.bytes_per_frame();

        match pacer.write(&bytes, num_frames) {
            Ok(written) => frames_fed += written as u64,
            Err(PacerError::NotRunning) if !running.load(Ordering::SeqCst) => break,
            Err(e) => return Err(e).context("pacer write failed"),
        }

        if last_status.elapsed() >= STATUS_INTERVAL {
            print_status(&pacer, started, frames_fed);
            last_status = Instant::now();
        }
    }

    // 数据源结束后等缓冲区放空
    while running.load(Ordering::SeqCst) && pacer.available_bytes() > 0 {
        thread::sleep(Duration::from_millis(10));
        if last_status.elapsed() >= STATUS_INTERVAL {
            print_status(&pacer, started, frames_fed);
            last_status = Instant::now();
        }
    }
    print_status(&pacer, started, frames_fed);
    println!();

    if !running.load(Ordering::SeqCst) {
        println!("\nPlayback interrupted.");
    }

    pacer.close();
    println!("\n{}", pacer.report());
    Ok(())
}

/// 打印单行状态
fn print_status(pacer: &Pacer, started: Instant, frames_fed: u64) {
    let format = pacer.format();
    let fed_secs = frames_fed as f64 / format.sample_rate as f64;
    print!(
        "\r  {:>6.1}s elapsed | {:>6.1}s fed | buffer {:>5.1}% | late {}",
        started.elapsed().as_secs_f64(),
        fed_secs,
        pacer.fill_ratio() * 100.0,
        pacer.stats().late_wakeups()
    );
    let _ = io::stdout().flush();
}

/// 标准场景：44100Hz、4 字节帧、4410 帧缓冲
fn run_scenario(cli: &Cli) -> anyhow::Result<()> {
    let format = AudioFormat::new(SampleEncoding::S16Le, 2, 44100);
    let pacer = Pacer::with_config(format, 4410, create_pacer_config(cli))
        .context("failed to create scenario pacer")?;

    println!("Pacer - Scenario");
    println!(
        "  {} | capacity {} bytes | chunk {} bytes / 10 ms\n",
        format,
        pacer.capacity_bytes(),
        format.chunk_bytes()
    );

    pacer.start().context("failed to start pacer")?;
    let data = vec![0u8; 8820];
    pacer.write(&data, 2205).context("scenario write failed")?;
    println!("  wrote 8820 bytes, available {}", pacer.available_bytes());

    // 观察放空过程
    let started = Instant::now();
    let mut samples = Vec::new();
    while pacer.available_bytes() > 0 && started.elapsed() < Duration::from_secs(1) {
        samples.push((started.elapsed(), pacer.available_bytes()));
        thread::sleep(Duration::from_millis(10));
    }
    let drained_in = started.elapsed();
    for (at, available) in samples.iter().step_by(2) {
        println!("  t={:>4}ms available {:>5}", at.as_millis(), available);
    }
    println!("  drained to 0 in {} ms", drained_in.as_millis());

    // 暂停期间不消费
    pacer.write(&data, 2205).context("scenario write failed")?;
    pacer.pause();
    let held = pacer.available_bytes();
    thread::sleep(Duration::from_millis(50));
    println!(
        "  paused: available {} -> {} after 50 ms ({:?})",
        held,
        pacer.available_bytes(),
        pacer.state()
    );

    pacer.start().context("failed to resume pacer")?;
    thread::sleep(Duration::from_millis(30));
    println!(
        "  resumed: available {} after 30 ms ({:?})",
        pacer.available_bytes(),
        pacer.state()
    );

    pacer.close();
    println!("  closed: state {:?}", pacer.state());

    println!("\n{}", pacer.report());
    Ok(())
}

//! 音频输出
//!
//! 使用 cpal 进行音频播放。解码线程直接写环形缓冲区，满了就等，
//! 不丢旧数据；设备回调按帧累计已播放位置。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use parking_lot::Mutex;

/// 音频输出错误
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    #[error("No output device available")]
    NoDevice,
    #[error("No supported config for {sample_rate} Hz / {channels} ch")]
    NoConfig { sample_rate: u32, channels: u16 },
    #[error("Stream error: {0}")]
    Stream(String),
}

/// 音频输出配置
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// 环形缓冲区容量（采样数，含所有声道）
    pub buffer_size: usize,
}

impl OutputConfig {
    /// 按缓冲时长计算容量
    pub fn with_buffer_ms(sample_rate: u32, channels: u16, buffer_ms: u32) -> Self {
        let samples = sample_rate as u64 * channels as u64 * buffer_ms as u64 / 1000;
        Self {
            sample_rate,
            channels,
            buffer_size: samples.max(1024) as usize,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            buffer_size: 4096,
        }
    }
}

/// 音频输出流
pub struct AudioOutput {
    _stream: Stream,
    ring: Arc<RingBuffer>,
    is_playing: Arc<AtomicBool>,
    frames_played: Arc<AtomicU64>,
    sample_rate: u32,
}

impl AudioOutput {
    /// 在默认设备上创建音频输出
    pub fn new(config: OutputConfig) -> Result<Self, OutputError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(OutputError::NoDevice)?;

        Self::with_device(&device, config)
    }

    /// 使用指定设备创建音频输出
    pub fn with_device(device: &Device, config: OutputConfig) -> Result<Self, OutputError> {
        let supported_config = device
            .supported_output_configs()
            .map_err(|e| OutputError::Stream(e.to_string()))?
            .find(|c| {
                c.channels() == config.channels
                    && c.min_sample_rate().0 <= config.sample_rate
                    && c.max_sample_rate().0 >= config.sample_rate
                    && c.sample_format() == SampleFormat::F32
            })
            .ok_or(OutputError::NoConfig {
                sample_rate: config.sample_rate,
                channels: config.channels,
            })?;

        let stream_config: StreamConfig = supported_config
            .with_sample_rate(cpal::SampleRate(config.sample_rate))
            .into();

        let ring = Arc::new(RingBuffer::new(config.buffer_size));
        let is_playing = Arc::new(AtomicBool::new(false));
        let frames_played = Arc::new(AtomicU64::new(0));

        let ring_cb = ring.clone();
        let playing_cb = is_playing.clone();
        let frames_cb = frames_played.clone();
        let channels = config.channels.max(1) as usize;

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if playing_cb.load(Ordering::Relaxed) {
                        let read = ring_cb.read(data);
                        for sample in &mut data[read..] {
                            *sample = 0.0;
                        }
                        frames_cb.fetch_add((read / channels) as u64, Ordering::Relaxed);
                    } else {
                        data.fill(0.0);
                    }
                },
                |err| {
                    log::error!("audio output error: {}", err);
                },
                None,
            )
            .map_err(|e| OutputError::Stream(e.to_string()))?;

        stream.play().map_err(|e| OutputError::Stream(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            ring,
            is_playing,
            frames_played,
            sample_rate: config.sample_rate,
        })
    }

    /// 写入采样，返回实际接受的数量（缓冲区满时可能小于输入）
    pub fn push(&self, samples: &[f32]) -> usize {
        self.ring.write(samples)
    }

    /// 尚未播放的采样数
    pub fn buffered(&self) -> usize {
        self.ring.len()
    }

    /// 设置播放状态
    pub fn set_playing(&self, playing: bool) {
        self.is_playing.store(playing, Ordering::Relaxed);
    }

    /// 清空缓冲并把已播放帧数归零（seek 后使用）
    pub fn clear(&self) {
        self.ring.clear();
        self.frames_played.store(0, Ordering::Relaxed);
    }

    /// 自上次 `clear` 以来播放的毫秒数
    pub fn played_ms(&self) -> u64 {
        let frames = self.frames_played.load(Ordering::Relaxed);
        frames * 1000 / self.sample_rate.max(1) as u64
    }
}

/// 有界环形缓冲区
struct RingBuffer {
    buffer: Mutex<VecDeque<f32>>,
    capacity: usize,
}

impl RingBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// 只写入剩余空间能容纳的部分
    fn write(&self, data: &[f32]) -> usize {
        let mut buf = self.buffer.lock();
        let free = self.capacity.saturating_sub(buf.len());
        let n = free.min(data.len());
        buf.extend(data[..n].iter().copied());
        n
    }

    fn read(&self, output: &mut [f32]) -> usize {
        let mut buf = self.buffer.lock();
        let to_read = output.len().min(buf.len());

        let (a, b) = buf.as_slices();
        let a_len = a.len().min(to_read);
        output[..a_len].copy_from_slice(&a[..a_len]);
        let b_len = to_read - a_len;
        if b_len > 0 {
            output[a_len..to_read].copy_from_slice(&b[..b_len]);
        }

        buf.drain(..to_read);
        to_read
    }

    fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    fn clear(&self) {
        self.buffer.lock().clear();
    }
}

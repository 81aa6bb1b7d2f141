//! Audio output on the default `cpal` device.
//!
//! The `cpal::Stream` is not `Send` on every host, so a dedicated thread
//! builds and owns it. Rendered tones travel to that thread over a channel
//! and are mixed into a shared buffer that the device callback drains.

use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, warn};

use chorus_core::error::{AppError, ErrorKind};
use chorus_core::result::AppResult;

use super::AudioSink;

/// At most one second of pending audio is buffered.
const MAX_BUFFER_SECONDS: usize = 1;

/// Plays tones on the system's default output device.
#[derive(Debug)]
pub struct CpalAudioSink {
    samples_tx: Mutex<std_mpsc::Sender<Arc<Vec<f32>>>>,
    sample_rate: u32,
}

impl CpalAudioSink {
    /// Open the default output device.
    ///
    /// Fails with a capability error when no device or stream is available.
    pub fn open() -> AppResult<Self> {
        let (samples_tx, samples_rx) = std_mpsc::channel::<Arc<Vec<f32>>>();
        let (ready_tx, ready_rx) = std_mpsc::sync_channel::<AppResult<u32>>(1);

        thread::Builder::new()
            .name("chorus-audio".to_string())
            .spawn(move || run_output(samples_rx, ready_tx))
            .map_err(|e| AppError::with_source(ErrorKind::Capability, "Failed to spawn audio thread", e))?;

        let sample_rate = ready_rx
            .recv()
            .map_err(|_| AppError::capability("Audio thread exited before reporting"))??;

        debug!(sample_rate, "Audio output opened");
        Ok(Self {
            samples_tx: Mutex::new(samples_tx),
            sample_rate,
        })
    }
}

impl AudioSink for CpalAudioSink {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn play(&self, samples: Arc<Vec<f32>>) -> AppResult<()> {
        self.samples_tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .send(samples)
            .map_err(|_| AppError::capability("Audio output thread has stopped"))
    }
}

/// Owns the stream until every sender is dropped.
fn run_output(
    samples_rx: std_mpsc::Receiver<Arc<Vec<f32>>>,
    ready_tx: std_mpsc::SyncSender<AppResult<u32>>,
) {
    let opened = open_stream();
    let (stream, buffer, channels, sample_rate) = match opened {
        Ok(parts) => parts,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    let _ = ready_tx.send(Ok(sample_rate));

    let capacity = sample_rate as usize * channels * MAX_BUFFER_SECONDS;
    while let Ok(samples) = samples_rx.recv() {
        let mut buf = buffer.lock().unwrap_or_else(|e| e.into_inner());
        let room = capacity.saturating_sub(buf.len()) / channels;
        if room < samples.len() {
            warn!(dropped = samples.len() - room, "Audio buffer full, truncating tone");
        }
        for sample in samples.iter().take(room) {
            for _ in 0..channels {
                buf.push(*sample);
            }
        }
    }

    drop(stream);
    debug!("Audio output closed");
}

type OpenedStream = (cpal::Stream, Arc<Mutex<Vec<f32>>>, usize, u32);

fn open_stream() -> AppResult<OpenedStream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AppError::capability("No audio output device found"))?;
    let supported = device
        .default_output_config()
        .map_err(|e| AppError::capability(format!("Failed to get audio config: {e}")))?;

    let format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();
    let channels = usize::from(config.channels.max(1));
    let sample_rate = config.sample_rate.0;
    let buffer = Arc::new(Mutex::new(Vec::new()));

    let stream = match format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, Arc::clone(&buffer))?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, Arc::clone(&buffer))?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, Arc::clone(&buffer))?,
        other => {
            return Err(AppError::capability(format!(
                "Unsupported audio sample format: {other:?}"
            )));
        }
    };
    stream
        .play()
        .map_err(|e| AppError::capability(format!("Failed to start audio stream: {e}")))?;

    Ok((stream, buffer, channels, sample_rate))
}

fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
) -> AppResult<cpal::Stream> {
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut buf = buffer.lock().unwrap_or_else(|e| e.into_inner());
                let available = data.len().min(buf.len());
                for (out, sample) in data.iter_mut().zip(buf.drain(..available)) {
                    *out = T::from_sample(sample.clamp(-1.0, 0.999_999_9));
                }
                for out in data.iter_mut().skip(available) {
                    *out = T::from_sample(0.0f32);
                }
            },
            |err| warn!(error = %err, "Audio output error"),
            None,
        )
        .map_err(|e| AppError::capability(format!("Failed to build audio stream: {e}")))
}

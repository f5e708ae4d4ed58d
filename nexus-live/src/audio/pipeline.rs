use crate::audio::error::{AudioError, AudioResult};
use crate::audio::{AudioCapture, AudioResampler};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Sample rate of capture blocks handed to the live endpoint
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;

/// Fixed number of samples per capture block
pub const BLOCK_SAMPLES: usize = 4096;

/// One fixed-size block of mono 16 kHz capture audio
pub type AudioBlock = Vec<f32>;

/// Microphone-to-blocks pipeline
///
/// Bridges however the hardware delivers samples to a steady stream of
/// fixed-size blocks:
///
/// 1. Captures interleaved audio from the microphone (`AudioCapture`)
/// 2. Downmixes to mono
/// 3. Resamples to 16 kHz (`AudioResampler`)
/// 4. Re-blocks into 4096-sample `AudioBlock`s
/// 5. Pushes each block on the output channel
///
/// The stream is push-based and unbounded; the consumer must keep pace
/// or blocks queue up in the channel.
pub struct CapturePipeline {
    capture: AudioCapture,
    processing_task: Option<JoinHandle<()>>,
    stop_signal: Option<tokio::sync::oneshot::Sender<()>>,
    is_running: bool,
}

impl CapturePipeline {
    /// Acquire the microphone (default device unless `device_id` names one).
    ///
    /// # Errors
    /// `AudioError::DeviceUnavailable` when no input device exists;
    /// `AudioError::PermissionDenied` surfaces later from `start` if the
    /// OS refuses the stream.
    pub fn new(device_id: Option<&str>) -> AudioResult<Self> {
        info!("Creating capture pipeline");

        let capture = AudioCapture::new(device_id)?;
        debug!("Capture device opened at {} Hz", capture.sample_rate());

        Ok(Self {
            capture,
            processing_task: None,
            stop_signal: None,
            is_running: false,
        })
    }

    /// Start producing blocks on `output`.
    ///
    /// # Errors
    /// Fails if the pipeline is already running or the input stream
    /// cannot be built.
    pub async fn start(&mut self, output: mpsc::Sender<AudioBlock>) -> AudioResult<()> {
        if self.is_running {
            return Err(AudioError::StreamBuildFailed(
                "Pipeline already running".to_string(),
            ));
        }

        info!("Starting capture pipeline");

        let (internal_tx, internal_rx) = mpsc::channel(100);
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();

        self.capture.start(internal_tx)?;

        let mut resampler = AudioResampler::new(self.capture.sample_rate(), CAPTURE_SAMPLE_RATE)?;
        let channels = self.capture.channels();

        let processing_task = tokio::spawn(async move {
            if let Err(e) =
                Self::processing_loop(internal_rx, output, stop_rx, &mut resampler, channels).await
            {
                error!("Capture processing loop error: {}", e);
            }
        });

        self.processing_task = Some(processing_task);
        self.stop_signal = Some(stop_tx);
        self.is_running = true;

        info!("Capture pipeline started");
        Ok(())
    }

    /// Stop capture and block production. Idempotent.
    pub async fn stop(&mut self) {
        if !self.is_running {
            return;
        }

        info!("Stopping capture pipeline");

        self.capture.stop();

        if let Some(stop_tx) = self.stop_signal.take() {
            let _ = stop_tx.send(());
        }
        if let Some(task) = self.processing_task.take() {
            let _ = task.await;
        }

        self.is_running = false;
        info!("Capture pipeline stopped");
    }

    /// True while blocks are being produced
    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// A handle that can release the microphone from another task.
    pub fn capture_stop_handle(&self) -> crate::audio::capture::CaptureStopHandle {
        self.capture.stop_handle()
    }

    /// Sample rate of the underlying device
    pub fn input_sample_rate(&self) -> u32 {
        self.capture.sample_rate()
    }

    async fn processing_loop(
        mut input_rx: mpsc::Receiver<Vec<f32>>,
        output_tx: mpsc::Sender<AudioBlock>,
        mut stop_rx: tokio::sync::oneshot::Receiver<()>,
        resampler: &mut AudioResampler,
        channels: u16,
    ) -> AudioResult<()> {
        // Leftover samples awaiting a full resampler chunk
        let mut resample_buffer = Vec::new();
        // Resampled samples awaiting a full output block
        let mut block_buffer: Vec<f32> = Vec::with_capacity(BLOCK_SAMPLES * 2);

        info!(
            "Capture processing loop started (block: {} samples @ {} Hz)",
            BLOCK_SAMPLES, CAPTURE_SAMPLE_RATE
        );

        loop {
            tokio::select! {
                Some(batch) = input_rx.recv() => {
                    let mono = downmix(&batch, channels);

                    match resampler.process_buffered(&mono, &mut resample_buffer) {
                        Ok(resampled) => {
                            if resampled.is_empty() {
                                continue;
                            }
                            block_buffer.extend(resampled);

                            while block_buffer.len() >= BLOCK_SAMPLES {
                                let block: AudioBlock =
                                    block_buffer.drain(..BLOCK_SAMPLES).collect();

                                if output_tx.send(block).await.is_err() {
                                    warn!("Block channel closed, stopping capture loop");
                                    return Ok(());
                                }
                            }
                        }
                        Err(e) => {
                            error!("Resampling error: {}", e);
                        }
                    }
                }

                _ = &mut stop_rx => {
                    info!("Capture stop signal received");
                    break;
                }

                else => {
                    info!("Capture input channel closed");
                    break;
                }
            }
        }

        info!("Capture processing loop finished");
        Ok(())
    }
}

impl Drop for CapturePipeline {
    fn drop(&mut self) {
        if self.is_running {
            // stop() is async; Drop can still release the device and
            // signal the task.
            self.capture.stop();
            if let Some(stop_tx) = self.stop_signal.take() {
                let _ = stop_tx.send(());
            }
        }
    }
}

/// Average interleaved channels down to mono
fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let ch = channels as usize;
    samples
        .chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

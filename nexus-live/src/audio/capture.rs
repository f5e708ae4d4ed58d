use crate::audio::device::default_or_named_input;
use crate::audio::error::{AudioError, AudioResult};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::StreamConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Microphone capture
///
/// Runs the cpal input stream on a dedicated thread (cpal streams are
/// not `Send`) and pushes raw hardware-rate sample batches through a
/// channel. The audio callback never blocks: when the channel is full
/// the batch is dropped.
pub struct AudioCapture {
    device_id: Option<String>,
    /// Sample rate of the input device
    sample_rate: u32,
    /// Number of channels delivered by the device
    channels: u16,
    /// Shared flag that keeps the stream thread alive
    running: Arc<AtomicBool>,
    /// Stream thread handle
    thread_handle: Option<JoinHandle<()>>,
}

/// Remote stop switch for a running capture.
///
/// Lets the session's event timeline release the microphone on remote
/// close without owning the capture itself. Stopping through the handle
/// is idempotent and races safely with `AudioCapture::stop`.
#[derive(Clone)]
pub struct CaptureStopHandle {
    running: Arc<AtomicBool>,
}

impl CaptureStopHandle {
    /// Request that the capture thread release the device and exit.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("Capture stop requested via handle");
        }
    }
}

impl AudioCapture {
    /// Open the default input device, or a named one.
    ///
    /// # Errors
    /// `AudioError::DeviceUnavailable` when no input device exists.
    pub fn new(device_id: Option<&str>) -> AudioResult<Self> {
        let device = default_or_named_input(device_id)?;

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Using audio input device: {}", device_name);

        let config = device.default_input_config()?;
        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        info!("Device config: {} Hz, {} channels", sample_rate, channels);

        Ok(Self {
            device_id: device_id.map(str::to_string),
            sample_rate,
            channels,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        })
    }

    /// Start capturing.
    ///
    /// Interleaved f32 batches arrive on `sender` at whatever cadence
    /// the hardware delivers them. Returns once the stream is live.
    ///
    /// # Errors
    /// `AudioError::PermissionDenied` when the OS refuses microphone
    /// access, `AudioError::DeviceUnavailable` if the device vanished,
    /// `AudioError::StreamBuildFailed` for other build failures.
    pub fn start(&mut self, sender: mpsc::Sender<Vec<f32>>) -> AudioResult<()> {
        if self.running.load(Ordering::SeqCst) {
            warn!("Audio capture already started");
            return Ok(());
        }

        info!("Starting audio capture");

        let device = default_or_named_input(self.device_id.as_deref())?;
        let config = StreamConfig {
            channels: self.channels,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let running = Arc::clone(&self.running);
        let running_for_loop = Arc::clone(&self.running);
        running.store(true, Ordering::SeqCst);

        // The stream must live on its own thread; report build success or
        // failure back synchronously so start() can surface it.
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<AudioResult<()>>();

        let handle = thread::Builder::new()
            .name("nexus-capture".to_string())
            .spawn(move || {
                let stream = device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if !running.load(Ordering::Relaxed) {
                            return;
                        }
                        // try_send keeps the audio thread non-blocking; a
                        // full channel means the consumer fell behind and
                        // this batch is dropped.
                        let _ = sender.try_send(data.to_vec());
                    },
                    move |err| {
                        error!("Audio stream error: {}", err);
                    },
                    None,
                );

                let stream = match stream {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(AudioError::from_build_error(e)));
                        return;
                    }
                };

                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(AudioError::StreamError(e.to_string())));
                    return;
                }

                let _ = ready_tx.send(Ok(()));

                while running_for_loop.load(Ordering::Relaxed) {
                    thread::sleep(Duration::from_millis(10));
                }

                // Stream dropped here, releasing the device
                debug!("Capture thread exiting");
            })
            .map_err(|e| AudioError::StreamError(e.to_string()))?;

        match ready_rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Ok(())) => {
                self.thread_handle = Some(handle);
                info!("Audio capture started");
                Ok(())
            }
            Ok(Err(e)) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                Err(AudioError::StreamError(
                    "timed out waiting for capture stream".to_string(),
                ))
            }
        }
    }

    /// Stop capturing and release the device. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.thread_handle.take() {
            info!("Stopping audio capture");
            let _ = handle.join();
            debug!("Audio capture stopped");
        }
    }

    /// A handle that can stop this capture from another task.
    pub fn stop_handle(&self) -> CaptureStopHandle {
        CaptureStopHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Sample rate of the input device in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels the device delivers
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// True while a stream is live
    pub fn is_capturing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

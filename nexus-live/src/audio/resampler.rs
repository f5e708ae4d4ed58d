use crate::audio::error::{AudioError, AudioResult};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::{debug, info};

/// Mono sample-rate converter
///
/// Sinc-interpolating resampler used to bring hardware-rate microphone
/// audio down to the 16 kHz the live endpoint expects. Consumes fixed
/// 10 ms input chunks; `process_buffered` handles arbitrary batch sizes
/// by accumulating into a caller-held buffer.
pub struct AudioResampler {
    resampler: SincFixedIn<f32>,
    /// Input buffer for rubato (channels x samples)
    input_buffer: Vec<Vec<f32>>,
    /// Output buffer for rubato (channels x samples)
    output_buffer: Vec<Vec<f32>>,
    input_rate: u32,
    output_rate: u32,
    /// Number of input samples per chunk
    chunk_size: usize,
}

impl AudioResampler {
    /// Create a resampler for the given rate pair.
    ///
    /// # Errors
    /// `AudioError::ResampleFailed` if the resampler cannot be created.
    pub fn new(input_rate: u32, output_rate: u32) -> AudioResult<Self> {
        info!("Creating resampler: {} Hz -> {} Hz", input_rate, output_rate);

        let ratio = output_rate as f64 / input_rate as f64;

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        // 10ms of input per chunk
        let chunk_size = (input_rate / 100) as usize;

        let resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1)
            .map_err(|e| AudioError::ResampleFailed(format!("Failed to create resampler: {}", e)))?;

        let input_buffer = resampler.input_buffer_allocate(true);
        let output_buffer = resampler.output_buffer_allocate(true);

        debug!(
            "Resampler ready: chunk_size={}, max_output={}",
            chunk_size,
            resampler.output_frames_max()
        );

        Ok(Self {
            resampler,
            input_buffer,
            output_buffer,
            input_rate,
            output_rate,
            chunk_size,
        })
    }

    /// Resample exactly one input chunk (`chunk_size` samples).
    ///
    /// # Errors
    /// `AudioError::ResampleFailed` on a size mismatch or rubato failure.
    pub fn process(&mut self, input: &[f32]) -> AudioResult<Vec<f32>> {
        if input.len() != self.chunk_size {
            return Err(AudioError::ResampleFailed(format!(
                "Input size mismatch: expected {} samples, got {}",
                self.chunk_size,
                input.len()
            )));
        }

        self.input_buffer[0].copy_from_slice(input);

        let (_consumed, generated) = self
            .resampler
            .process_into_buffer(&self.input_buffer, &mut self.output_buffer, None)
            .map_err(|e| AudioError::ResampleFailed(format!("Resampling failed: {}", e)))?;

        Ok(self.output_buffer[0][..generated].to_vec())
    }

    /// Resample a variable-length batch, accumulating leftover samples in
    /// `buffer` until a whole chunk is available.
    pub fn process_buffered(
        &mut self,
        input: &[f32],
        buffer: &mut Vec<f32>,
    ) -> AudioResult<Vec<f32>> {
        buffer.extend_from_slice(input);

        let mut output = Vec::new();
        while buffer.len() >= self.chunk_size {
            let chunk: Vec<f32> = buffer.drain(..self.chunk_size).collect();
            output.extend(self.process(&chunk)?);
        }

        Ok(output)
    }

    /// Clear internal filter state, for reuse across sessions.
    pub fn reset(&mut self) {
        debug!("Resetting resampler");
        self.resampler.reset();
        for channel in &mut self.input_buffer {
            channel.fill(0.0);
        }
        for channel in &mut self.output_buffer {
            channel.fill(0.0);
        }
    }

    /// Input sample rate in Hz
    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    /// Output sample rate in Hz
    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    /// Number of input samples consumed per `process` call
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_48k_to_16k() {
        let mut resampler = AudioResampler::new(48000, 16000).unwrap();
        assert_eq!(resampler.chunk_size(), 480);

        let input: Vec<f32> = (0..480)
            .map(|i| (i as f32 * 0.01 * std::f32::consts::PI).sin())
            .collect();
        let output = resampler.process(&input).unwrap();

        // SincFixedIn buffering makes exact sizes fuzzy; expect ~160.
        assert!(
            (output.len() as i32 - 160).abs() < 50,
            "expected ~160 samples, got {}",
            output.len()
        );
        for &sample in &output {
            assert!(sample.abs() <= 1.001);
        }
    }

    #[test]
    fn test_resample_wrong_input_size_fails() {
        let mut resampler = AudioResampler::new(48000, 16000).unwrap();
        assert!(resampler.process(&[0.0; 100]).is_err());
    }

    #[test]
    fn test_resample_buffered_accumulates() {
        let mut resampler = AudioResampler::new(48000, 16000).unwrap();
        let mut buffer = Vec::new();

        // 200 samples: not yet a full 480-sample chunk
        let out1 = resampler
            .process_buffered(&vec![0.5; 200], &mut buffer)
            .unwrap();
        assert!(out1.is_empty());

        let out2 = resampler
            .process_buffered(&vec![0.5; 400], &mut buffer)
            .unwrap();
        assert!(!out2.is_empty());
        assert_eq!(buffer.len(), 120); // 600 - 480 leftover
    }

    #[test]
    fn test_resample_reset_allows_reuse() {
        let mut resampler = AudioResampler::new(44100, 16000).unwrap();
        let input = vec![1.0f32; resampler.chunk_size()];

        let _ = resampler.process(&input).unwrap();
        resampler.reset();
        let output = resampler.process(&input).unwrap();
        assert!(!output.is_empty());
    }

    #[test]
    fn test_resample_signal_amplitude_preserved() {
        let mut resampler = AudioResampler::new(48000, 16000).unwrap();

        let freq = 440.0;
        let input: Vec<f32> = (0..480)
            .map(|i| {
                let t = i as f32 / 48000.0;
                (2.0 * std::f32::consts::PI * freq * t).sin()
            })
            .collect();

        let output = resampler.process(&input).unwrap();
        let max_amplitude = output.iter().map(|v| v.abs()).fold(0.0f32, f32::max);
        assert!(max_amplitude > 0.5 && max_amplitude <= 1.01);
    }
}

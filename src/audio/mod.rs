//! Audio output for the CLI frontend.
//!
//! Renders a simulated graph either to a 16-bit WAV file or as raw f32le
//! samples on stdout, for piping into ffmpeg or aplay.

use std::io::{self, Write};
use std::path::Path;

use crate::error::{DiscreteError, Result};
use crate::Simulator;

/// Buffer size for audio processing (in samples).
pub const BUFFER_SIZE: usize = 256;

/// Rescale samples so the loudest peak sits at 1.0. Leaves silence alone.
pub fn normalize_samples(samples: &mut [f64]) {
    let peak = samples.iter().fold(0.0f64, |p, s| p.max(s.abs()));
    if peak > 0.0 {
        for s in samples.iter_mut() {
            *s /= peak;
        }
    }
}

/// Run the simulator for `seconds` and collect the raw output samples.
pub fn render(sim: &mut Simulator, seconds: f64) -> Vec<f64> {
    let total = (seconds * sim.sample_rate()) as usize;
    let mut samples = vec![0.0; total];
    sim.process_block(&mut samples);
    samples
}

/// Write normalized samples to a mono 16-bit WAV file.
pub fn write_wav_file(path: &Path, samples: &[f64], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f64) as i16;
        writer.write_sample(sample_i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Raw f32le sample writer on stdout.
pub struct AudioOutput {
    buffer: Vec<u8>,
}

impl AudioOutput {
    pub fn new() -> Self {
        Self {
            buffer: vec![0u8; BUFFER_SIZE * 4],
        }
    }

    /// Write a block of samples to stdout.
    pub fn write_block(&mut self, samples: &[f64]) -> Result<()> {
        let bytes_needed = samples.len() * 4;
        if self.buffer.len() < bytes_needed {
            self.buffer.resize(bytes_needed, 0);
        }

        for (i, &sample) in samples.iter().enumerate() {
            let bytes = (sample as f32).to_le_bytes();
            self.buffer[i * 4..i * 4 + 4].copy_from_slice(&bytes);
        }

        io::stdout()
            .write_all(&self.buffer[..bytes_needed])
            .map_err(|e| DiscreteError::AudioOutputError {
                message: e.to_string(),
            })?;

        Ok(())
    }

    /// Flush the output stream.
    pub fn flush(&mut self) -> Result<()> {
        io::stdout()
            .flush()
            .map_err(|e| DiscreteError::AudioOutputError {
                message: e.to_string(),
            })
    }
}

impl Default for AudioOutput {
    fn default() -> Self {
        Self::new()
    }
}

/// Stream the simulator's output to stdout as raw f32le for `seconds`.
pub fn stream_raw(sim: &mut Simulator, seconds: f64) -> Result<()> {
    let mut output = AudioOutput::new();
    let mut block = [0.0f64; BUFFER_SIZE];
    let mut remaining = (seconds * sim.sample_rate()) as usize;

    while remaining > 0 {
        let n = remaining.min(BUFFER_SIZE);
        sim.process_block(&mut block[..n]);
        output.write_block(&block[..n])?;
        remaining -= n;
    }
    output.flush()
}

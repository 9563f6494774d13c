use crate::settings::{Sample, SignalSettings, WaveType};
use rand::rngs::ThreadRng;
use rand::Rng;
use std::f64::consts::PI;

/// The generator is the genesis of every acquisition tick. It renders a
/// time window of the configured waveform into a fresh sample vector.
///
/// # Behaviour
/// Sampling walks `t = start_time + i / sampling_rate` for
/// `floor(duration * sampling_rate)` steps and evaluates one of five
/// families at each step:
///
/// * **Sine**: `A * sin(2π * f * t)`
/// * **Square**: `A` while the position inside the period is below the
///   duty cycle, `-A` after
/// * **Triangle**: `2A * |2 * (φ - floor(φ + 0.5))| - A` with `φ` the
///   position inside the period
/// * **Sawtooth**: `2A * (t * f - floor(t * f + 0.5))`, centered on zero
/// * **Noise**: `(noise_level/10) * A * U(-1, 1)`
///
/// The deterministic families additionally receive a per-sample dither of
/// `(noise_level/10) * (A/10) * U(-1, 1)` whenever the noise level is set.
///
/// # Unproducible parameters
/// A non-positive sampling rate or duration, or (for every family but
/// noise) a non-positive frequency or amplitude, yields an **empty**
/// vector. That is a meaningful result, not an error: it tells the
/// acquisition loop that the current parameters cannot produce a
/// waveform.
///
/// # Randomness
/// The random source lives inside the generator and is shared across
/// calls, so successive ticks draw fresh noise instead of a repeating
/// pattern. Tests inject a seeded generator through [with_rng](fn@SignalGenerator::with_rng).
pub struct SignalGenerator<R: Rng = ThreadRng> {
    rng: R,
}

impl SignalGenerator<ThreadRng> {
    /// Creates a generator backed by the thread-local random source.
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for SignalGenerator<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> SignalGenerator<R> {
    /// Creates a generator with a caller-supplied random source. Handy
    /// for pinning a seed when exact noise sequences must be asserted.
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Renders `duration` seconds of the configured waveform starting at
    /// `start_time`, one sample every `1/sampling_rate` seconds.
    ///
    /// # Returns
    /// A time-ordered vector of exactly `floor(duration * sampling_rate)`
    /// samples, or an empty vector when the parameters cannot produce a
    /// waveform.
    pub fn generate(
        &mut self,
        settings: &SignalSettings,
        start_time: f64,
        duration: f64,
    ) -> Vec<Sample> {
        if settings.sampling_rate() <= 0.0 || duration <= 0.0 {
            return Vec::new();
        }
        if settings.wave_type() != WaveType::Noise
            && (settings.frequency() <= 0.0 || settings.amplitude() <= 0.0)
        {
            return Vec::new();
        }

        let dt = 1.0 / settings.sampling_rate();
        let count = (duration / dt) as usize;
        let amplitude = settings.amplitude();
        let noise_gain = f64::from(settings.noise_level()) / 10.0;

        let mut points = Vec::with_capacity(count);
        for i in 0..count {
            let t = start_time + i as f64 * dt;

            let mut value = match settings.wave_type() {
                WaveType::Sine => amplitude * (2.0 * PI * settings.frequency() * t).sin(),
                WaveType::Square => {
                    let period = 1.0 / settings.frequency();
                    let position = (t % period) / period;
                    if position < settings.duty_cycle() / 100.0 {
                        amplitude
                    } else {
                        -amplitude
                    }
                }
                WaveType::Triangle => {
                    let period = 1.0 / settings.frequency();
                    let position = (t % period) / period;
                    2.0 * amplitude * (2.0 * (position - (position + 0.5).floor())).abs()
                        - amplitude
                }
                WaveType::Sawtooth => {
                    let cycles = t * settings.frequency();
                    2.0 * amplitude * (cycles - (cycles + 0.5).floor())
                }
                WaveType::Noise => noise_gain * amplitude * self.rng.gen_range(-1.0..1.0),
            };

            if settings.wave_type() != WaveType::Noise && settings.noise_level() > 0 {
                value += noise_gain * (amplitude * 0.1) * self.rng.gen_range(-1.0..1.0);
            }

            points.push(Sample { time: t, value });
        }

        points
    }
}

use crate::engine::generator::SignalGenerator;
use crate::engine::measure::{measure, Measurements};
use crate::engine::trigger;
use crate::settings::{Sample, SignalSettings, TriggerMode};
use crossbeam::channel::{unbounded, Receiver, Sender};
use rand::rngs::ThreadRng;
use rand::Rng;
use simplelog::{info, warn};
use std::collections::VecDeque;

/// One screen spans ten time-base units, both as the synthesis duration
/// per tick and as the Roll-mode capacity basis.
const SCREEN_UNITS: f64 = 10.0;

/// Notifications the loop pushes to its host outside the read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeEvent {
    /// The current parameters cannot produce a waveform. Emitted once per
    /// failure streak; re-armed by [start](fn@AcquisitionLoop::start).
    InvalidSettings,
}

/// Acquisition state, driven by the host's Start/Stop actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    Stopped,
    Running,
}

/// The stateful driver of the instrument. An external scheduler delivers
/// ticks; each tick renders one screen of signal, aligns it to the
/// trigger (unless rolling), updates the held sample buffer and publishes
/// fresh [Measurements].
///
/// # Buffer lifecycle
/// * **Roll**: new samples are appended and the buffer is trimmed from
///   the front to one screen's worth (`sampling_rate * time_base * 10`),
///   oldest first.
/// * **Auto / Normal / Single**: the buffer is wholly replaced by the
///   trigger-aligned capture. **Single** stops the loop right after its
///   capture.
///
/// # Tick contract
/// Ticks must arrive strictly sequentially; the loop never spawns threads
/// of its own and finishes every buffer/measurement update before
/// returning, so a tick is all-or-nothing. Time bookkeeping is absolute
/// (`current_time` advances by exactly one screen per successful tick),
/// which keeps late or skipped host ticks harmless.
///
/// # Unproducible parameters
/// A tick whose generation comes back empty stops the loop and emits
/// [ScopeEvent::InvalidSettings], once. The latch stays set while the
/// host keeps the parameters broken and is cleared on the next `start()`.
pub struct AcquisitionLoop<R: Rng = ThreadRng> {
    generator: SignalGenerator<R>,
    state: ScopeState,
    current_time: f64,
    invalid_reported: bool,
    buffer: VecDeque<Sample>,
    measurements: Measurements,
    event_tx: Sender<ScopeEvent>,
    event_rx: Receiver<ScopeEvent>,
}

impl AcquisitionLoop<ThreadRng> {
    pub fn new() -> Self {
        Self::with_generator(SignalGenerator::new())
    }
}

impl Default for AcquisitionLoop<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> AcquisitionLoop<R> {
    /// Builds the loop around a caller-supplied generator, so tests can
    /// pin the random source.
    pub fn with_generator(generator: SignalGenerator<R>) -> Self {
        let (event_tx, event_rx) = unbounded();

        Self {
            generator,
            state: ScopeState::Stopped,
            current_time: 0.0,
            invalid_reported: false,
            buffer: VecDeque::new(),
            measurements: Measurements::default(),
            event_tx,
            event_rx,
        }
    }

    /// Starts acquiring and re-arms the invalid-parameter notification.
    pub fn start(&mut self) {
        info!("<b>Acquisition <green>started</>");
        self.state = ScopeState::Running;
        self.invalid_reported = false;
    }

    /// Stops acquiring. Takes effect before the next tick; the buffer and
    /// the last measurements stay readable.
    pub fn stop(&mut self) {
        if self.state == ScopeState::Running {
            info!("<b>Acquisition <yellow>stopped</>");
        }
        self.state = ScopeState::Stopped;
    }

    pub fn state(&self) -> ScopeState {
        self.state
    }

    /// Ordered read access to the held capture. Only stable between
    /// ticks; the host must not hold the iterator across `on_tick`.
    pub fn samples(&self) -> impl ExactSizeIterator<Item = &Sample> {
        self.buffer.iter()
    }

    /// The readouts published by the latest completed tick.
    pub fn measurements(&self) -> Measurements {
        self.measurements
    }

    /// A receiver for [ScopeEvent] notifications. Cloneable; the host
    /// typically drains it after each tick.
    pub fn events(&self) -> Receiver<ScopeEvent> {
        self.event_rx.clone()
    }

    /// Performs exactly one acquisition cycle. No-op unless running.
    pub fn on_tick(&mut self, settings: &SignalSettings) {
        if self.state != ScopeState::Running {
            return;
        }

        let duration = settings.time_base() * SCREEN_UNITS;
        let raw = self.generator.generate(settings, self.current_time, duration);

        if raw.is_empty() {
            self.stop();
            if !self.invalid_reported {
                self.invalid_reported = true;
                warn!("<b>Current parameters <red>cannot generate</> <b>a waveform.</>");
                warn!("  |_ frequency: {}", settings.frequency());
                warn!("  |_ amplitude: {}", settings.amplitude());
                warn!("  |_ sampling rate: {}", settings.sampling_rate());
                self.event_tx.send(ScopeEvent::InvalidSettings).ok();
            }
            return;
        }

        self.current_time += duration;

        if settings.trigger_mode() == TriggerMode::Roll {
            self.buffer.extend(raw);
            let capacity = settings.sampling_rate() * settings.time_base() * SCREEN_UNITS;
            while self.buffer.len() as f64 > capacity {
                self.buffer.pop_front();
            }
        } else {
            let aligned =
                trigger::align(raw, settings.trigger_edge(), settings.trigger_level());
            self.buffer = aligned.into();
        }

        self.measurements = measure(self.buffer.make_contiguous(), settings);

        if settings.trigger_mode() == TriggerMode::Single {
            self.stop();
        }
    }
}

#[cfg(test)]
mod acquisition_tests {
    use super::*;
    use crate::settings::{SettingsBuilder, TriggerEdge, WaveType};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded_loop() -> AcquisitionLoop<StdRng> {
        AcquisitionLoop::with_generator(SignalGenerator::with_rng(StdRng::seed_from_u64(1)))
    }

    fn sine_settings() -> crate::settings::SignalSettings {
        SettingsBuilder::new()
            .with_frequency(50.0)
            .with_amplitude(1.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_tick_ignored_while_stopped() {
        let mut scope = seeded_loop();
        let settings = sine_settings();

        scope.on_tick(&settings);

        assert_eq!(scope.state(), ScopeState::Stopped);
        assert_eq!(scope.samples().len(), 0, "A stopped loop must not acquire");
    }

    #[test]
    fn test_auto_mode_replaces_buffer_and_measures() {
        let mut scope = seeded_loop();
        let settings = sine_settings();

        scope.start();
        scope.on_tick(&settings);
        let first_len = scope.samples().len();
        let first_start = scope.samples().next().copied().unwrap();

        scope.on_tick(&settings);
        let second_start = scope.samples().next().copied().unwrap();

        assert!(first_len > 0);
        assert!(
            second_start.time > first_start.time,
            "Replacement capture must come from the advanced clock"
        );
        assert!((scope.measurements().vpp - 2.0).abs() < 0.1, "Vpp off a unit sine");
        assert_eq!(scope.state(), ScopeState::Running);
    }

    #[test]
    fn test_trigger_alignment_starts_at_level() {
        let mut settings = sine_settings();
        settings.set_trigger_level(0.5);
        settings.set_trigger_edge(TriggerEdge::Rising);
        let mut scope = seeded_loop();

        scope.start();
        scope.on_tick(&settings);

        let first = scope.samples().next().copied().unwrap();
        assert!(
            first.value >= 0.5,
            "Capture must open on the rising crossing, got {}",
            first.value
        );
    }

    #[test]
    fn test_single_mode_stops_after_capture() {
        let mut scope = seeded_loop();
        let mut settings = sine_settings();
        settings.set_trigger_mode(TriggerMode::Single);

        scope.start();
        scope.on_tick(&settings);

        assert_eq!(scope.state(), ScopeState::Stopped, "Single must be one-shot");
        assert!(scope.samples().len() > 0, "The one-shot capture must be held");

        // Further ticks change nothing.
        let held: Vec<_> = scope.samples().copied().collect();
        scope.on_tick(&settings);
        assert_eq!(scope.samples().copied().collect::<Vec<_>>(), held);
    }

    #[test]
    fn test_roll_mode_bounds_buffer_fifo() {
        let mut scope = seeded_loop();
        let mut settings = sine_settings();
        settings.set_trigger_mode(TriggerMode::Roll);

        // One screen: 1000 Hz * 0.01 s * 10 = 100 samples.
        scope.start();
        scope.on_tick(&settings);
        assert_eq!(scope.samples().len(), 100);
        let oldest_before = scope.samples().next().copied().unwrap();

        scope.on_tick(&settings);
        scope.on_tick(&settings);

        assert_eq!(scope.samples().len(), 100, "Roll buffer must stay bounded");
        let oldest_after = scope.samples().next().copied().unwrap();
        assert!(
            oldest_after.time > oldest_before.time,
            "Eviction must drop the oldest samples first"
        );
        for pair in scope.samples().copied().collect::<Vec<_>>().windows(2) {
            assert!(pair[0].time < pair[1].time, "Rolling window must stay ordered");
        }
    }

    #[test]
    fn test_roll_capacity_follows_time_base() {
        let mut settings = sine_settings();
        settings.set_trigger_mode(TriggerMode::Roll);
        settings.set_time_base(0.005);
        let mut scope = seeded_loop();

        scope.start();
        scope.on_tick(&settings);
        scope.on_tick(&settings);

        assert_eq!(
            scope.samples().len(),
            50,
            "Capacity must track rate * time base * 10"
        );
    }

    #[test]
    fn test_roll_mode_skips_trigger_alignment() {
        let mut settings = sine_settings();
        settings.set_trigger_mode(TriggerMode::Roll);
        settings.set_trigger_level(0.5);
        let mut scope = seeded_loop();

        scope.start();
        scope.on_tick(&settings);

        let first = scope.samples().next().copied().unwrap();
        assert_eq!(first.time, 0.0, "Rolling capture must keep the raw window");
    }

    #[test]
    fn test_invalid_settings_latch() {
        let mut scope = seeded_loop();
        let events = scope.events();
        let broken = SettingsBuilder::new().build().unwrap(); // frequency 0

        scope.start();
        scope.on_tick(&broken);

        assert_eq!(scope.state(), ScopeState::Stopped);
        assert_eq!(events.try_recv(), Ok(ScopeEvent::InvalidSettings));

        // A fresh start re-arms the one-shot notification.
        scope.start();
        scope.on_tick(&broken);
        assert_eq!(events.try_recv(), Ok(ScopeEvent::InvalidSettings));
        assert!(events.try_recv().is_err(), "Only one event per failure streak");
    }

    #[test]
    fn test_failed_tick_does_not_advance_time() {
        let mut scope = seeded_loop();
        let mut settings = sine_settings();
        settings.set_trigger_mode(TriggerMode::Roll);

        scope.start();
        settings.set_frequency(0.0);
        scope.on_tick(&settings);

        settings.set_frequency(50.0);
        scope.start();
        scope.on_tick(&settings);

        let first = scope.samples().next().copied().unwrap();
        assert_eq!(first.time, 0.0, "A failed tick must not consume acquisition time");
    }

    #[test]
    fn test_noise_roll_measures_over_whole_window() {
        let mut settings = SettingsBuilder::new()
            .with_wave_type(WaveType::Noise)
            .with_amplitude(1.0)
            .with_noise_level(10)
            .build()
            .unwrap();
        settings.set_trigger_mode(TriggerMode::Roll);
        let mut scope = seeded_loop();

        scope.start();
        scope.on_tick(&settings);

        let m = scope.measurements();
        assert!(m.vpp > 0.0, "Noise must show a nonzero swing");
        assert!(m.vrms > 0.0 && m.vrms < 1.0, "Noise Vrms {} out of range", m.vrms);
    }
}

use std::fmt;

/// The mathematical family used to synthesize samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveType {
    Sine,
    Square,
    Triangle,
    Sawtooth,
    Noise,
}

impl WaveType {
    /// Stable lowercase token, used by the settings store.
    pub fn as_str(&self) -> &'static str {
        match self {
            WaveType::Sine => "sine",
            WaveType::Square => "square",
            WaveType::Triangle => "triangle",
            WaveType::Sawtooth => "sawtooth",
            WaveType::Noise => "noise",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "sine" => Some(WaveType::Sine),
            "square" => Some(WaveType::Square),
            "triangle" => Some(WaveType::Triangle),
            "sawtooth" => Some(WaveType::Sawtooth),
            "noise" => Some(WaveType::Noise),
            _ => None,
        }
    }
}

impl fmt::Display for WaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy governing whether and how a capture window is aligned to a
/// level crossing (Auto/Normal/Single) or continuously appended (Roll).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    Auto,
    Normal,
    Single,
    Roll,
}

impl TriggerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerMode::Auto => "auto",
            TriggerMode::Normal => "normal",
            TriggerMode::Single => "single",
            TriggerMode::Roll => "roll",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "auto" => Some(TriggerMode::Auto),
            "normal" => Some(TriggerMode::Normal),
            "single" => Some(TriggerMode::Single),
            "roll" => Some(TriggerMode::Roll),
            _ => None,
        }
    }
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of the level crossing used to align a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEdge {
    Rising,
    Falling,
}

impl TriggerEdge {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerEdge::Rising => "rising",
            TriggerEdge::Falling => "falling",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "rising" => Some(TriggerEdge::Rising),
            "falling" => Some(TriggerEdge::Falling),
            _ => None,
        }
    }
}

impl fmt::Display for TriggerEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single point of a captured trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Absolute acquisition time in seconds.
    pub time: f64,
    /// Instantaneous voltage.
    pub value: f64,
}

impl Sample {
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// The full parameter set of the simulated instrument. One instance lives
/// with the host, gets mutated by user interaction and is read by every
/// acquisition tick.
///
/// # Usage
/// To create a settings instance with non-default values, use the
/// [SettingsBuilder]. To change a value on a live instance, use the
/// setter named after the field (right below).
///
/// # Invariant
/// `|trigger_level| <= amplitude` is restored on every amplitude write:
/// lowering the amplitude below the stored trigger level pulls the level
/// back to the new amplitude, keeping its sign. Writing `trigger_level`
/// itself is unchecked; the value is corrected on the next amplitude
/// write.
///
/// # Validity
/// A settings instance may describe a waveform that cannot be produced
/// (the defaults do: frequency and amplitude start at zero). That is not
/// an error here; the generator answers such parameters with an empty
/// capture and the acquisition loop reports it once per failure streak.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSettings {
    wave_type: WaveType,
    frequency: f64,
    amplitude: f64,
    duty_cycle: f64,
    noise_level: u32,
    sampling_rate: f64,
    time_base: f64,
    volt_div: f64,
    trigger_mode: TriggerMode,
    trigger_edge: TriggerEdge,
    trigger_level: f64,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            wave_type: WaveType::Sine,
            frequency: 0.0,
            amplitude: 0.0,
            duty_cycle: 0.0,
            noise_level: 0,
            sampling_rate: 1000.0,
            time_base: 0.01,
            volt_div: 50.0,
            trigger_mode: TriggerMode::Auto,
            trigger_edge: TriggerEdge::Rising,
            trigger_level: 0.0,
        }
    }
}

impl SignalSettings {
    pub fn wave_type(&self) -> WaveType {
        self.wave_type
    }

    pub fn set_wave_type(&mut self, wave_type: WaveType) {
        self.wave_type = wave_type;
    }

    /// Signal frequency in Hz. Must be positive for every wave type but
    /// noise; zero or negative values leave the generator silent.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
    }

    /// Peak amplitude in volts.
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Sets the amplitude and restores the trigger-level invariant: a
    /// stored level whose magnitude exceeds the new amplitude is clamped
    /// to the amplitude, sign preserved.
    pub fn set_amplitude(&mut self, amplitude: f64) {
        self.amplitude = amplitude;
        if self.trigger_level.abs() > amplitude {
            self.trigger_level = if self.trigger_level > 0.0 {
                amplitude
            } else if self.trigger_level < 0.0 {
                -amplitude
            } else {
                0.0
            };
        }
    }

    /// Fraction of each square-wave period spent at the high level, in
    /// percent. Only the square wave reads it.
    pub fn duty_cycle(&self) -> f64 {
        self.duty_cycle
    }

    pub fn set_duty_cycle(&mut self, duty_cycle: f64) {
        self.duty_cycle = duty_cycle;
    }

    /// Noise intensity step. Scales the noise wave itself and the dither
    /// added on top of the deterministic wave types.
    pub fn noise_level(&self) -> u32 {
        self.noise_level
    }

    pub fn set_noise_level(&mut self, noise_level: u32) {
        self.noise_level = noise_level;
    }

    /// Amount of samples in a second.
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn set_sampling_rate(&mut self, sampling_rate: f64) {
        self.sampling_rate = sampling_rate;
    }

    /// Seconds per acquisition unit; one screen spans ten of these.
    pub fn time_base(&self) -> f64 {
        self.time_base
    }

    pub fn set_time_base(&mut self, time_base: f64) {
        self.time_base = time_base;
    }

    /// Display scale only; the capture pipeline never reads it.
    pub fn volt_div(&self) -> f64 {
        self.volt_div
    }

    pub fn set_volt_div(&mut self, volt_div: f64) {
        self.volt_div = volt_div;
    }

    pub fn trigger_mode(&self) -> TriggerMode {
        self.trigger_mode
    }

    pub fn set_trigger_mode(&mut self, trigger_mode: TriggerMode) {
        self.trigger_mode = trigger_mode;
    }

    pub fn trigger_edge(&self) -> TriggerEdge {
        self.trigger_edge
    }

    pub fn set_trigger_edge(&mut self, trigger_edge: TriggerEdge) {
        self.trigger_edge = trigger_edge;
    }

    /// Voltage the trigger search compares against.
    pub fn trigger_level(&self) -> f64 {
        self.trigger_level
    }

    pub fn set_trigger_level(&mut self, trigger_level: f64) {
        self.trigger_level = trigger_level;
    }
}

/// The [SettingsBuilder] is the proper way of generating a non-default
/// [SignalSettings].
/// # Usage
/// ```rust
/// let settings = SettingsBuilder::new()
///     .with_wave_type(WaveType::Square)
///     .with_frequency(50.0)
///     .with_amplitude(2.0)
///     .with_duty_cycle(50.0)
///     .build()
///     .unwrap();
/// ```
pub struct SettingsBuilder {
    wave_type: Option<WaveType>,
    frequency: Option<f64>,
    amplitude: Option<f64>,
    duty_cycle: Option<f64>,
    noise_level: Option<u32>,
    sampling_rate: Option<f64>,
    time_base: Option<f64>,
    volt_div: Option<f64>,
    trigger_mode: Option<TriggerMode>,
    trigger_edge: Option<TriggerEdge>,
    trigger_level: Option<f64>,
}

impl SettingsBuilder {
    /// Sets the defaults for the settings (every field unset).
    pub fn new() -> Self {
        Self {
            wave_type: None,
            frequency: None,
            amplitude: None,
            duty_cycle: None,
            noise_level: None,
            sampling_rate: None,
            time_base: None,
            volt_div: None,
            trigger_mode: None,
            trigger_edge: None,
            trigger_level: None,
        }
    }

    pub fn with_wave_type(mut self, wave_type: WaveType) -> Self {
        self.wave_type = Some(wave_type);
        self
    }

    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = Some(amplitude);
        self
    }

    pub fn with_duty_cycle(mut self, duty_cycle: f64) -> Self {
        self.duty_cycle = Some(duty_cycle);
        self
    }

    pub fn with_noise_level(mut self, noise_level: u32) -> Self {
        self.noise_level = Some(noise_level);
        self
    }

    pub fn with_sampling_rate(mut self, sampling_rate: f64) -> Self {
        self.sampling_rate = Some(sampling_rate);
        self
    }

    pub fn with_time_base(mut self, time_base: f64) -> Self {
        self.time_base = Some(time_base);
        self
    }

    pub fn with_volt_div(mut self, volt_div: f64) -> Self {
        self.volt_div = Some(volt_div);
        self
    }

    pub fn with_trigger_mode(mut self, trigger_mode: TriggerMode) -> Self {
        self.trigger_mode = Some(trigger_mode);
        self
    }

    pub fn with_trigger_edge(mut self, trigger_edge: TriggerEdge) -> Self {
        self.trigger_edge = Some(trigger_edge);
        self
    }

    pub fn with_trigger_level(mut self, trigger_level: f64) -> Self {
        self.trigger_level = Some(trigger_level);
        self
    }

    /// Tries to generate a [SignalSettings] from the given configuration.
    ///
    /// Unset fields fall back to the first-run defaults: sine wave,
    /// frequency and amplitude at zero, 1 kHz sampling, 10 ms time base,
    /// auto trigger on the rising edge at level zero.
    ///
    /// # Expected errors
    /// * Duty cycle outside the [0, 100] percent range.
    pub fn build(self) -> Result<SignalSettings, String> {
        let duty_cycle = self.duty_cycle.unwrap_or(0.0);
        if !(0.0..=100.0).contains(&duty_cycle) {
            return Err(format!("duty cycle {} is not a percentage", duty_cycle));
        }

        let mut settings = SignalSettings {
            wave_type: self.wave_type.unwrap_or(WaveType::Sine),
            frequency: self.frequency.unwrap_or(0.0),
            amplitude: 0.0,
            duty_cycle,
            noise_level: self.noise_level.unwrap_or(0),
            sampling_rate: self.sampling_rate.unwrap_or(1000.0),
            time_base: self.time_base.unwrap_or(0.01),
            volt_div: self.volt_div.unwrap_or(50.0),
            trigger_mode: self.trigger_mode.unwrap_or(TriggerMode::Auto),
            trigger_edge: self.trigger_edge.unwrap_or(TriggerEdge::Rising),
            trigger_level: self.trigger_level.unwrap_or(0.0),
        };

        // Route the amplitude through the setter so the trigger-level
        // invariant holds from the first read.
        settings.set_amplitude(self.amplitude.unwrap_or(0.0));

        Ok(settings)
    }
}

#[cfg(test)]
mod settings_builder_tests {
    use super::*;

    #[test]
    fn test_empty() {
        let settings = SettingsBuilder::new().build().unwrap();

        assert_eq!(settings, SignalSettings::default(), "Defaults mismatch");
        assert_eq!(settings.wave_type(), WaveType::Sine, "Default wave differs");
        assert_eq!(settings.sampling_rate(), 1000.0, "Default rate differs");
        assert_eq!(settings.time_base(), 0.01, "Default time base differs");
        assert_eq!(settings.frequency(), 0.0, "Default frequency differs");
        assert_eq!(settings.amplitude(), 0.0, "Default amplitude differs");
    }

    #[test]
    fn test_all_fields() {
        let settings = SettingsBuilder::new()
            .with_wave_type(WaveType::Square)
            .with_frequency(50.0)
            .with_amplitude(2.0)
            .with_duty_cycle(25.0)
            .with_noise_level(3)
            .with_sampling_rate(5000.0)
            .with_time_base(0.002)
            .with_volt_div(5.0)
            .with_trigger_mode(TriggerMode::Normal)
            .with_trigger_edge(TriggerEdge::Falling)
            .with_trigger_level(0.5)
            .build()
            .unwrap();

        assert_eq!(settings.wave_type(), WaveType::Square);
        assert_eq!(settings.frequency(), 50.0);
        assert_eq!(settings.amplitude(), 2.0);
        assert_eq!(settings.duty_cycle(), 25.0);
        assert_eq!(settings.noise_level(), 3);
        assert_eq!(settings.sampling_rate(), 5000.0);
        assert_eq!(settings.time_base(), 0.002);
        assert_eq!(settings.volt_div(), 5.0);
        assert_eq!(settings.trigger_mode(), TriggerMode::Normal);
        assert_eq!(settings.trigger_edge(), TriggerEdge::Falling);
        assert_eq!(settings.trigger_level(), 0.5);
    }

    #[test]
    fn test_duty_cycle_out_of_range() {
        assert!(
            SettingsBuilder::new().with_duty_cycle(140.0).build().is_err(),
            "Duty cycle above 100 percent should be rejected"
        );
        assert!(
            SettingsBuilder::new().with_duty_cycle(-5.0).build().is_err(),
            "Negative duty cycle should be rejected"
        );
    }

    #[test]
    fn test_build_clamps_trigger_level() {
        let settings = SettingsBuilder::new()
            .with_amplitude(1.0)
            .with_trigger_level(4.0)
            .build()
            .unwrap();

        assert_eq!(
            settings.trigger_level(),
            1.0,
            "Builder should apply the amplitude clamp once"
        );
    }
}

#[cfg(test)]
mod settings_tests {
    use super::*;

    #[test]
    fn test_amplitude_clamps_trigger_level() {
        let mut settings = SignalSettings::default();

        settings.set_amplitude(5.0);
        settings.set_trigger_level(10.0);
        assert_eq!(
            settings.trigger_level(),
            10.0,
            "Writing the level alone must not clamp"
        );

        settings.set_amplitude(3.0);
        assert_eq!(
            settings.trigger_level(),
            3.0,
            "Lowering the amplitude must pull the level down"
        );
    }

    #[test]
    fn test_clamp_preserves_sign() {
        let mut settings = SignalSettings::default();

        settings.set_amplitude(5.0);
        settings.set_trigger_level(-4.0);
        settings.set_amplitude(2.0);

        assert_eq!(settings.trigger_level(), -2.0, "Negative sign lost");
    }

    #[test]
    fn test_clamp_leaves_level_within_amplitude() {
        let mut settings = SignalSettings::default();

        settings.set_amplitude(5.0);
        settings.set_trigger_level(1.0);
        settings.set_amplitude(3.0);

        assert_eq!(
            settings.trigger_level(),
            1.0,
            "A level inside the new amplitude must not move"
        );
    }

    #[test]
    fn test_plain_setters() {
        let mut settings = SignalSettings::default();

        settings.set_wave_type(WaveType::Square);
        settings.set_frequency(60.0);
        settings.set_duty_cycle(75.0);
        settings.set_noise_level(5);
        settings.set_sampling_rate(5000.0);
        settings.set_time_base(0.1);
        settings.set_volt_div(0.2);
        settings.set_trigger_mode(TriggerMode::Normal);
        settings.set_trigger_edge(TriggerEdge::Falling);

        assert_eq!(settings.wave_type(), WaveType::Square);
        assert_eq!(settings.frequency(), 60.0);
        assert_eq!(settings.duty_cycle(), 75.0);
        assert_eq!(settings.noise_level(), 5);
        assert_eq!(settings.sampling_rate(), 5000.0);
        assert_eq!(settings.time_base(), 0.1);
        assert_eq!(settings.volt_div(), 0.2);
        assert_eq!(settings.trigger_mode(), TriggerMode::Normal);
        assert_eq!(settings.trigger_edge(), TriggerEdge::Falling);
    }

    #[test]
    fn test_enum_tokens_round_trip() {
        assert_eq!(WaveType::parse(WaveType::Sawtooth.as_str()), Some(WaveType::Sawtooth));
        assert_eq!(TriggerMode::parse(TriggerMode::Roll.as_str()), Some(TriggerMode::Roll));
        assert_eq!(
            TriggerEdge::parse(TriggerEdge::Falling.as_str()),
            Some(TriggerEdge::Falling)
        );
        assert_eq!(WaveType::parse("harmonica"), None, "Unknown token accepted");
    }
}

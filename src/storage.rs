use crate::settings::{
    Sample, SettingsBuilder, SignalSettings, TriggerEdge, TriggerMode, WaveType,
};
use simplelog::{info, warn};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use yaml_rust::yaml::Hash;
use yaml_rust::{Yaml, YamlEmitter, YamlLoader};

const YAML_VERSION: f64 = 1.0;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("settings store unreachable: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings document is not valid YAML: {0}")]
    Scan(#[from] yaml_rust::ScanError),
    #[error("settings document could not be emitted: {0}")]
    Emit(#[from] yaml_rust::EmitError),
    #[error("settings document is empty")]
    EmptyDocument,
    #[error("settings document version {0} is not supported")]
    UnsupportedVersion(f64),
    #[error("missing or invalid field `{0}` in settings document")]
    MalformedField(&'static str),
    #[error("stored settings rejected: {0}")]
    Rejected(String),
    #[error("capture file write failed: {0}")]
    Wav(#[from] hound::Error),
}

/// Where the instrument parameters live between runs. The acquisition
/// core never touches this; the host loads on startup and saves on
/// demand, outside the tick path.
pub trait SettingsStore {
    fn load(&self) -> Result<SignalSettings, StorageError>;
    fn save(&self, settings: &SignalSettings) -> Result<(), StorageError>;
}

/// Where a captured trace goes when the user asks to keep it. Also
/// outside the tick path.
pub trait SampleSink {
    /// Persists one capture. The sampling rate travels along because the
    /// container records it; the samples alone do not carry it.
    fn save_samples(&self, sample_rate: f64, samples: &[Sample]) -> Result<(), StorageError>;
}

/// Single-document YAML settings store.
///
/// The document carries a top-level `version` key that must match the
/// writer's, and a `scope` mapping with one entry per settings field.
/// Numeric fields tolerate both YAML integers and reals, since a
/// hand-edited `frequency: 440` scans as an integer.
pub struct YamlSettingsStore {
    path: PathBuf,
}

impl YamlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the stored settings, falling back to the first-run defaults
    /// when the file is missing or does not parse. The fallback is the
    /// normal first-run path, so it only warns.
    pub fn load_or_default(&self) -> SignalSettings {
        match self.load() {
            Ok(settings) => {
                info!("<b>Loaded settings from <cyan>{}</>", self.path.display());
                settings
            }
            Err(err) => {
                warn!("<b>Settings store <yellow>unavailable</><b>, using defaults.</>");
                warn!("  |_ path: {}", self.path.display());
                warn!("  |_ cause: {}", err);
                SignalSettings::default()
            }
        }
    }
}

fn as_float(node: &Yaml) -> Option<f64> {
    match node {
        Yaml::Real(_) => node.as_f64(),
        Yaml::Integer(value) => Some(*value as f64),
        _ => None,
    }
}

fn float_field(scope: &Yaml, name: &'static str) -> Result<f64, StorageError> {
    as_float(&scope[name]).ok_or(StorageError::MalformedField(name))
}

impl SettingsStore for YamlSettingsStore {
    fn load(&self) -> Result<SignalSettings, StorageError> {
        let text = fs::read_to_string(&self.path)?;
        let docs = YamlLoader::load_from_str(&text)?;
        let doc = docs.first().ok_or(StorageError::EmptyDocument)?;

        let version = as_float(&doc["version"]).unwrap_or(0.0);
        if version != YAML_VERSION {
            return Err(StorageError::UnsupportedVersion(version));
        }

        let scope = &doc["scope"];

        let wave_type = scope["wave_type"]
            .as_str()
            .and_then(WaveType::parse)
            .ok_or(StorageError::MalformedField("wave_type"))?;
        let trigger_mode = scope["trigger_mode"]
            .as_str()
            .and_then(TriggerMode::parse)
            .ok_or(StorageError::MalformedField("trigger_mode"))?;
        let trigger_edge = scope["trigger_edge"]
            .as_str()
            .and_then(TriggerEdge::parse)
            .ok_or(StorageError::MalformedField("trigger_edge"))?;
        let noise_level = scope["noise_level"]
            .as_i64()
            .and_then(|value| u32::try_from(value).ok())
            .ok_or(StorageError::MalformedField("noise_level"))?;

        SettingsBuilder::new()
            .with_wave_type(wave_type)
            .with_frequency(float_field(scope, "frequency")?)
            .with_amplitude(float_field(scope, "amplitude")?)
            .with_duty_cycle(float_field(scope, "duty_cycle")?)
            .with_noise_level(noise_level)
            .with_sampling_rate(float_field(scope, "sampling_rate")?)
            .with_time_base(float_field(scope, "time_base")?)
            .with_volt_div(float_field(scope, "volt_div")?)
            .with_trigger_mode(trigger_mode)
            .with_trigger_edge(trigger_edge)
            .with_trigger_level(float_field(scope, "trigger_level")?)
            .build()
            .map_err(StorageError::Rejected)
    }

    fn save(&self, settings: &SignalSettings) -> Result<(), StorageError> {
        let mut scope = Hash::new();
        let mut put_str = |key: &str, value: String| {
            scope.insert(Yaml::String(key.to_string()), Yaml::String(value));
        };
        put_str("wave_type", settings.wave_type().as_str().to_string());
        put_str("trigger_mode", settings.trigger_mode().as_str().to_string());
        put_str("trigger_edge", settings.trigger_edge().as_str().to_string());

        let mut put_real = |key: &str, value: f64| {
            scope.insert(Yaml::String(key.to_string()), Yaml::Real(value.to_string()));
        };
        put_real("frequency", settings.frequency());
        put_real("amplitude", settings.amplitude());
        put_real("duty_cycle", settings.duty_cycle());
        put_real("sampling_rate", settings.sampling_rate());
        put_real("time_base", settings.time_base());
        put_real("volt_div", settings.volt_div());
        put_real("trigger_level", settings.trigger_level());

        scope.insert(
            Yaml::String("noise_level".to_string()),
            Yaml::Integer(i64::from(settings.noise_level())),
        );

        let mut root = Hash::new();
        root.insert(
            Yaml::String("version".to_string()),
            Yaml::Real(YAML_VERSION.to_string()),
        );
        root.insert(Yaml::String("scope".to_string()), Yaml::Hash(scope));

        let mut text = String::new();
        YamlEmitter::new(&mut text).dump(&Yaml::Hash(root))?;
        text.push('\n');

        fs::write(&self.path, text)?;
        Ok(())
    }
}

/// Capture sink writing one mono float32 WAV frame per sample.
pub struct WavSampleSink {
    path: PathBuf,
}

impl WavSampleSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SampleSink for WavSampleSink {
    fn save_samples(&self, sample_rate: f64, samples: &[Sample]) -> Result<(), StorageError> {
        let spec = hound::WavSpec {
            channels: 1,
            // The WAV header wants a nonzero integer rate even if the
            // capture came from degenerate settings.
            sample_rate: sample_rate.max(1.0) as u32,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut writer = hound::WavWriter::create(&self.path, spec)?;
        for sample in samples {
            writer.write_sample(sample.value as f32)?;
        }
        writer.finalize()?;

        Ok(())
    }
}

mod engine;
mod settings;
mod storage;

use std::time::Duration;

// DEBUGGING, LOGGING
use simplelog::*;

// MY STUFF
use engine::{AcquisitionLoop, ScopeEvent, ScopeState};
use settings::{Sample, WaveType};
use storage::{SampleSink, SettingsStore, WavSampleSink, YamlSettingsStore};

const SETTINGS_FILE: &str = "scope_settings.yaml";
const CAPTURE_FILE: &str = "capture.wav";
const TICK_INTERVAL: Duration = Duration::from_millis(50); // 20 FPS
const DEMO_TICKS: usize = 20;

fn main() -> Result<(), anyhow::Error> {
    // LOGGER INIT
    TermLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .expect("Failed to start simplelog");

    info!("<b>Running <blue>scope demo</>");

    let store = YamlSettingsStore::new(SETTINGS_FILE);
    let mut settings = store.load_or_default();

    // A fresh store starts with silent parameters; give the demo
    // something to show.
    if settings.frequency() <= 0.0 || settings.amplitude() <= 0.0 {
        warn!("<b>Stored parameters are silent, switching to the <cyan>demo signal</>");
        settings.set_wave_type(WaveType::Sine);
        settings.set_frequency(50.0);
        settings.set_amplitude(2.0);
        settings.set_noise_level(1);
        settings.set_trigger_level(0.5);
    }

    let mut scope = AcquisitionLoop::new();
    let events = scope.events();
    let ticker = crossbeam::channel::tick(TICK_INTERVAL);

    scope.start();
    let mut ticks = 0;
    while scope.state() == ScopeState::Running && ticks < DEMO_TICKS {
        ticker.recv()?;
        scope.on_tick(&settings);
        ticks += 1;

        while let Ok(event) = events.try_recv() {
            match event {
                ScopeEvent::InvalidSettings => {
                    warn!("<b><yellow>Cannot generate a waveform.</> <b>Check frequency, amplitude, sampling rate and time base.</>");
                }
            }
        }
    }
    scope.stop();

    let readout = scope.measurements();
    info!("<b>Vpp: <cyan>{:.3} V</>", readout.vpp);
    info!("<b>Vrms: <cyan>{:.3} V</>", readout.vrms);
    info!("<b>Period: <cyan>{:.6} s</>", readout.period);
    info!("<b>Frequency: <cyan>{:.3} Hz</>", readout.avg_frequency);

    let capture: Vec<Sample> = scope.samples().copied().collect();
    for line in render_trace(&capture, 64, 9) {
        println!("{}", line);
    }

    store.save(&settings)?;
    info!("<b>Settings saved to <cyan>{}</>", SETTINGS_FILE);

    if !capture.is_empty() {
        WavSampleSink::new(CAPTURE_FILE).save_samples(settings.sampling_rate(), &capture)?;
        info!("<b>Capture saved to <cyan>{}</>", CAPTURE_FILE);
    }

    info!("<green><tick></> <b>Program finished <green>successfully</>");
    Ok(())
}

/// Crude terminal rendering of a capture: one star per column, rows
/// spanning the window's own voltage range. Stands in for the charting
/// front end.
fn render_trace(samples: &[Sample], width: usize, height: usize) -> Vec<String> {
    if samples.len() < 2 || width < 2 || height < 2 {
        return Vec::new();
    }

    let max = samples.iter().map(|s| s.value).fold(f64::NEG_INFINITY, f64::max);
    let min = samples.iter().map(|s| s.value).fold(f64::INFINITY, f64::min);
    let span = (max - min).max(f64::EPSILON);

    let mut rows = vec![vec![' '; width]; height];
    for column in 0..width {
        let index = column * (samples.len() - 1) / (width - 1);
        let normalized = (samples[index].value - min) / span;
        let row = ((1.0 - normalized) * (height - 1) as f64).round() as usize;
        rows[row][column] = '*';
    }

    rows.into_iter().map(|row| row.into_iter().collect()).collect()
}

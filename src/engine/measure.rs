use crate::settings::{Sample, SignalSettings};

/// The standard scope readouts derived from one capture window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measurements {
    /// Peak-to-peak voltage over the window.
    pub vpp: f64,
    /// Root mean square voltage over the window.
    pub vrms: f64,
    /// Estimated signal period in seconds.
    pub period: f64,
    /// Estimated signal frequency in Hz.
    pub avg_frequency: f64,
}

/// Derives [Measurements] from a capture window.
///
/// Windows with fewer than two samples measure as all zeros.
///
/// # Frequency estimation
/// The period is taken from rising zero-crossings (`prev < 0 <= cur`):
/// with `n > 1` crossings it is the crossing span divided by `n - 1`, and
/// the frequency its reciprocal. With one crossing or none the window is
/// too short to measure, and the *configured* frequency is echoed back
/// instead (period `1/f` when the configuration is positive, else zero).
/// The echo is a deliberate discontinuity at the `n = 1` boundary: a
/// low-cycle-count readout reports configuration, not measurement.
pub fn measure(points: &[Sample], settings: &SignalSettings) -> Measurements {
    if points.len() < 2 {
        return Measurements::default();
    }

    let max = points.iter().map(|p| p.value).fold(f64::NEG_INFINITY, f64::max);
    let min = points.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
    let mean_square =
        points.iter().map(|p| p.value * p.value).sum::<f64>() / points.len() as f64;

    let mut crossings = 0usize;
    let mut first_crossing = f64::NAN;
    let mut last_crossing = f64::NAN;
    for pair in points.windows(2) {
        if pair[0].value < 0.0 && pair[1].value >= 0.0 {
            if crossings == 0 {
                first_crossing = pair[1].time;
            }
            last_crossing = pair[1].time;
            crossings += 1;
        }
    }

    let (period, avg_frequency) = if crossings > 1 {
        let period = (last_crossing - first_crossing) / (crossings - 1) as f64;
        (period, 1.0 / period)
    } else {
        let period = if settings.frequency() > 0.0 {
            1.0 / settings.frequency()
        } else {
            0.0
        };
        (period, settings.frequency())
    };

    Measurements {
        vpp: max - min,
        vrms: mean_square.sqrt(),
        period,
        avg_frequency,
    }
}

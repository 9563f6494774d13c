use crate::settings::{Sample, TriggerEdge};

/// Finds the first level crossing in a capture.
///
/// Consecutive pairs are scanned in order; a rising edge matches the
/// first pair with `prev < level <= cur`, a falling edge the first pair
/// with `prev > level >= cur`. The returned index points at the second
/// sample of the matching pair.
pub fn find_edge(points: &[Sample], edge: TriggerEdge, level: f64) -> Option<usize> {
    for i in 1..points.len() {
        let prev = points[i - 1].value;
        let cur = points[i].value;

        let crossed = match edge {
            TriggerEdge::Rising => prev < level && cur >= level,
            TriggerEdge::Falling => prev > level && cur <= level,
        };

        if crossed {
            return Some(i);
        }
    }

    None
}

/// Aligns a capture to its first level crossing by dropping everything
/// before it.
///
/// When no crossing exists the capture is returned **unchanged**: the
/// display falls back to the free-running trace instead of going blank.
/// Callers that need to distinguish a triggered capture from a free run
/// must consult [find_edge] directly.
pub fn align(mut points: Vec<Sample>, edge: TriggerEdge, level: f64) -> Vec<Sample> {
    match find_edge(&points, edge, level) {
        Some(index) => points.split_off(index),
        None => points,
    }
}

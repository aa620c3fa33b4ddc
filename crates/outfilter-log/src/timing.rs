use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Marker opening the resource line printed after most steps.
pub const TIME_MARKER: &str = "Time (s):";

static TIMING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"Time \(s\): cpu = (\d+):(\d+):(\d+(?:\.\d+)?) ; elapsed = (\d+):(\d+):(\d+(?:\.\d+)?)(?: \. Memory \(MB\): peak = (\d+(?:\.\d+)?) ; gain = (-?\d+(?:\.\d+)?))?",
    )
    .unwrap()
});

/// Resources reported by a `Time (s): cpu = ... ; elapsed = ...` line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Timing {
    pub cpu: Duration,
    pub elapsed: Duration,
    pub peak_memory_mb: Option<f64>,
    pub memory_gain_mb: Option<f64>,
}

impl Timing {
    /// Finds a timing record anywhere in `text`.
    pub fn find(text: &str) -> Option<Self> {
        let caps = TIMING_PATTERN.captures(text)?;
        let clock = |first: usize| -> Option<Duration> {
            let hours: f64 = caps[first].parse().ok()?;
            let minutes: f64 = caps[first + 1].parse().ok()?;
            let seconds: f64 = caps[first + 2].parse().ok()?;
            Duration::try_from_secs_f64(hours * 3600.0 + minutes * 60.0 + seconds).ok()
        };
        let memory = |index: usize| caps.get(index).and_then(|m| m.as_str().parse().ok());

        Some(Self {
            cpu: clock(1)?,
            elapsed: clock(4)?,
            peak_memory_mb: memory(7),
            memory_gain_mb: memory(8),
        })
    }
}

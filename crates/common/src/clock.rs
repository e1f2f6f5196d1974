//! Stage timing for render diagnostics.
//!
//! A render request is a chain of slow stages (encode, fetch, mux). The
//! stopwatch records how long each one took so results can report where the
//! time went.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Measures consecutive stages of one request.
#[derive(Debug, Clone)]
pub struct StageClock {
    /// The instant the request started.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339).
    epoch_wall: String,

    /// End of the previous lap.
    last_lap: Instant,

    stages: Vec<StageTiming>,
}

/// Duration of one named stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub stage: String,
    pub millis: u64,
}

/// Timing report attached to render results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
    /// Wall-clock start of the request.
    pub started_at: String,
    pub stages: Vec<StageTiming>,
    pub total_millis: u64,
}

impl StageClock {
    /// Create a clock anchored to now.
    pub fn start() -> Self {
        let now = Instant::now();
        Self {
            epoch: now,
            epoch_wall: chrono::Utc::now().to_rfc3339(),
            last_lap: now,
            stages: Vec::new(),
        }
    }

    /// Close the current stage under `stage`, returning its duration in ms.
    pub fn lap(&mut self, stage: impl Into<String>) -> u64 {
        let now = Instant::now();
        let millis = now.duration_since(self.last_lap).as_millis() as u64;
        self.last_lap = now;
        self.stages.push(StageTiming {
            stage: stage.into(),
            millis,
        });
        millis
    }

    /// Milliseconds since the clock started.
    pub fn elapsed_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Wall-clock time at start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Stages recorded so far.
    pub fn stages(&self) -> &[StageTiming] {
        &self.stages
    }

    /// Finish and produce the report.
    pub fn finish(self) -> Timings {
        let total_millis = self.elapsed_ms();
        Timings {
            started_at: self.epoch_wall,
            stages: self.stages,
            total_millis,
        }
    }
}

/// Convert seconds to whole milliseconds, clamping negatives to zero.
pub fn secs_to_ms(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * 1000.0).round() as u64
    } else {
        0
    }
}

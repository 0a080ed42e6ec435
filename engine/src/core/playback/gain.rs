//! Narration gain staging.
//!
//! Audio sinks only accept volumes in `[0, 1]`, so a gain above 1.0 is routed
//! through a separate amplification stage.

use serde::{Deserialize, Serialize};

use crate::core::timeline::MAX_NARRATION_GAIN;

/// Sink volume plus amplifier gain whose product is the requested gain
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GainStage {
    /// Sink volume (0.0 ~ 1.0)
    pub volume: f64,
    /// Amplifier gain (1.0 ~ MAX_NARRATION_GAIN)
    pub amplification: f64,
}

impl GainStage {
    pub fn split(gain: f64) -> Self {
        let gain = if gain.is_finite() {
            gain.clamp(0.0, MAX_NARRATION_GAIN)
        } else {
            1.0
        };

        if gain <= 1.0 {
            Self {
                volume: gain,
                amplification: 1.0,
            }
        } else {
            Self {
                volume: 1.0,
                amplification: gain,
            }
        }
    }

    pub fn effective(&self) -> f64 {
        self.volume * self.amplification
    }
}

//! Spin resolution: draws a landing slice and the rotation that animates onto it.
//!
//! A spin has two phases. [`SpinResolver::resolve`] draws a target index and
//! turns it into a rotation snapped to the configured increment. Once the
//! renderer reports the final wheel angle, [`SpinResolver::settle`] decides the
//! paying slice according to the [`OutcomePolicy`]. Under the default
//! [`OutcomePolicy::AngleAuthoritative`] the drawn index is only a hint: the
//! slice under the pointer at the final angle wins.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{OutcomePolicy, WheelConfig, WheelConfigError};
use crate::constants::FULL_TURN_DEGREES;
use crate::data::WheelPreset;
use crate::numbers::{i64_to_usize, round_even_f32_to_i64, u32_to_f32, usize_to_f32};

/// Rendering command produced for one spin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinOutcome {
    /// Index drawn (or forced) before animation.
    pub landing_index: usize,
    /// Total clockwise travel in degrees, snapped.
    pub rotation_magnitude: f32,
    pub duration_secs: f32,
}

impl SpinOutcome {
    /// Wheel angle the renderer animates to; the wheel turns clockwise.
    #[must_use]
    pub fn end_rotation(&self) -> f32 {
        -self.rotation_magnitude
    }
}

/// Stateless resolver; all randomness comes from the caller's source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinResolver {
    min_full_rotations: u32,
    jitter_degrees: u32,
    snap_degrees: f32,
    duration_secs: f32,
    policy: OutcomePolicy,
}

impl SpinResolver {
    /// Build a resolver from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot produce a usable spin.
    pub fn new(cfg: &WheelConfig) -> Result<Self, WheelConfigError> {
        cfg.validate()?;
        Ok(Self {
            min_full_rotations: cfg.min_full_rotations,
            jitter_degrees: cfg.jitter_degrees,
            snap_degrees: cfg.snap_degrees,
            duration_secs: cfg.spin_duration_secs,
            policy: cfg.outcome_policy,
        })
    }

    #[must_use]
    pub const fn policy(&self) -> OutcomePolicy {
        self.policy
    }

    /// Draw a landing index (unless forced) and the snapped rotation to reach it.
    ///
    /// A forced target outside the wheel wraps around. `slice_count` must be
    /// non-zero; the session guarantees this through configuration validation.
    pub fn resolve<R: Rng>(
        &self,
        preset: &WheelPreset,
        slice_count: usize,
        rng: &mut R,
        explicit_target: Option<usize>,
    ) -> SpinOutcome {
        let slice_count = slice_count.max(1);
        let landing_index = match explicit_target {
            Some(target) => target % slice_count,
            None => rng.gen_range(0..slice_count),
        };
        let jitter = if self.jitter_degrees > 0 {
            rng.gen_range(0..self.jitter_degrees)
        } else {
            0
        };

        let base = u32_to_f32(self.min_full_rotations) * FULL_TURN_DEGREES
            + usize_to_f32(landing_index) * angle_per_slice(slice_count)
            + u32_to_f32(jitter);
        let rotation_magnitude = self.snap(base);
        log::debug!(
            "spin on {} drew slice {landing_index} (jitter {jitter}), rotating {rotation_magnitude}",
            preset.id
        );

        SpinOutcome {
            landing_index,
            rotation_magnitude,
            duration_secs: self.duration_secs,
        }
    }

    /// Round `rotation` to the nearest snap increment.
    #[must_use]
    pub fn snap(&self, rotation: f32) -> f32 {
        (rotation / self.snap_degrees).round_ties_even() * self.snap_degrees
    }

    /// Decide the paying slice once the wheel has stopped at `final_angle`.
    #[must_use]
    pub fn settle(&self, outcome: &SpinOutcome, final_angle: f32, slice_count: usize) -> usize {
        match self.policy {
            OutcomePolicy::AngleAuthoritative => slice_index_at_angle(final_angle, slice_count),
            OutcomePolicy::DrawAuthoritative => outcome.landing_index,
        }
    }
}

#[must_use]
pub fn angle_per_slice(slice_count: usize) -> f32 {
    FULL_TURN_DEGREES / usize_to_f32(slice_count.max(1))
}

/// Wrap any angle into `[0, 360)`.
#[must_use]
pub fn normalize_rotation(rotation: f32) -> f32 {
    let wrapped = rotation % FULL_TURN_DEGREES;
    if wrapped < 0.0 {
        wrapped + FULL_TURN_DEGREES
    } else {
        wrapped
    }
}

/// Slice under the pointer for a wheel at `angle`; index 0 sits at 0° and indices grow clockwise.
#[must_use]
pub fn slice_index_at_angle(angle: f32, slice_count: usize) -> usize {
    let slice_count = slice_count.max(1);
    let steps = round_even_f32_to_i64(normalize_rotation(angle) / angle_per_slice(slice_count));
    i64_to_usize(steps) % slice_count
}

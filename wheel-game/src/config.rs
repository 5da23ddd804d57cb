//! Runtime tuning for the wheel session.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_JITTER_DEGREES, DEFAULT_MIN_FULL_ROTATIONS, DEFAULT_REVIVE_COST, DEFAULT_SAVE_SLOT,
    DEFAULT_SLICE_COUNT, DEFAULT_SNAP_DEGREES, DEFAULT_SPIN_DURATION_SECS, FULL_TURN_DEGREES,
};

/// Which value decides the slice a spin pays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutcomePolicy {
    /// The slice under the pointer at the final wheel angle wins.
    #[default]
    AngleAuthoritative,
    /// The drawn index wins; the rotation is cosmetic.
    DrawAuthoritative,
}

/// Errors raised when wheel configuration cannot produce a usable spin.
#[derive(Debug, Error, PartialEq)]
pub enum WheelConfigError {
    #[error("slice count must be at least 1 (got {0})")]
    NoSlices(usize),
    #[error("snap increment must be a positive finite angle (got {0})")]
    InvalidSnap(f32),
    #[error("snap increment {0} does not divide a full turn")]
    SnapNotDivisor(f32),
    #[error("spin duration must be a non-negative finite number of seconds (got {0})")]
    InvalidDuration(f32),
    #[error("save slot name must not be empty")]
    EmptySaveSlot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelConfig {
    #[serde(default = "WheelConfig::default_slice_count")]
    pub slice_count: usize,
    #[serde(default = "WheelConfig::default_min_full_rotations")]
    pub min_full_rotations: u32,
    /// Exclusive upper bound, in whole degrees, of the per-spin visual offset.
    #[serde(default = "WheelConfig::default_jitter_degrees")]
    pub jitter_degrees: u32,
    #[serde(default = "WheelConfig::default_snap_degrees")]
    pub snap_degrees: f32,
    /// Forwarded to the renderer with every resolved spin.
    #[serde(default = "WheelConfig::default_spin_duration_secs")]
    pub spin_duration_secs: f32,
    #[serde(default = "WheelConfig::default_revive_cost")]
    pub revive_cost: u64,
    #[serde(default = "WheelConfig::default_save_slot")]
    pub save_slot: String,
    #[serde(default)]
    pub outcome_policy: OutcomePolicy,
}

impl WheelConfig {
    const fn default_slice_count() -> usize {
        DEFAULT_SLICE_COUNT
    }

    const fn default_min_full_rotations() -> u32 {
        DEFAULT_MIN_FULL_ROTATIONS
    }

    const fn default_jitter_degrees() -> u32 {
        DEFAULT_JITTER_DEGREES
    }

    const fn default_snap_degrees() -> f32 {
        DEFAULT_SNAP_DEGREES
    }

    const fn default_spin_duration_secs() -> f32 {
        DEFAULT_SPIN_DURATION_SECS
    }

    const fn default_revive_cost() -> u64 {
        DEFAULT_REVIVE_COST
    }

    fn default_save_slot() -> String {
        String::from(DEFAULT_SAVE_SLOT)
    }

    /// Parse configuration from JSON, filling omitted fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn with_outcome_policy(mut self, policy: OutcomePolicy) -> Self {
        self.outcome_policy = policy;
        self
    }

    #[must_use]
    pub fn with_save_slot(mut self, slot: impl Into<String>) -> Self {
        self.save_slot = slot.into();
        self
    }

    /// Check that a spin can always be resolved with these settings.
    ///
    /// # Errors
    ///
    /// Returns the first invariant that does not hold.
    pub fn validate(&self) -> Result<(), WheelConfigError> {
        if self.slice_count == 0 {
            return Err(WheelConfigError::NoSlices(self.slice_count));
        }
        if !self.snap_degrees.is_finite() || self.snap_degrees <= 0.0 {
            return Err(WheelConfigError::InvalidSnap(self.snap_degrees));
        }
        if (FULL_TURN_DEGREES % self.snap_degrees).abs() > f32::EPSILON {
            return Err(WheelConfigError::SnapNotDivisor(self.snap_degrees));
        }
        if !self.spin_duration_secs.is_finite() || self.spin_duration_secs < 0.0 {
            return Err(WheelConfigError::InvalidDuration(self.spin_duration_secs));
        }
        if self.save_slot.trim().is_empty() {
            return Err(WheelConfigError::EmptySaveSlot);
        }
        Ok(())
    }
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            slice_count: Self::default_slice_count(),
            min_full_rotations: Self::default_min_full_rotations(),
            jitter_degrees: Self::default_jitter_degrees(),
            snap_degrees: Self::default_snap_degrees(),
            spin_duration_secs: Self::default_spin_duration_secs(),
            revive_cost: Self::default_revive_cost(),
            save_slot: Self::default_save_slot(),
            outcome_policy: OutcomePolicy::default(),
        }
    }
}

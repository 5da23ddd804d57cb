//! Centralized tuning constants for the risk wheel.
//!
//! These values define the defaults for the core state machine. Runtime
//! overrides go through [`crate::config::WheelConfig`]; the zone intervals are
//! fixed rules of the ladder and are not configurable.

// Wheel geometry -----------------------------------------------------------
pub const DEFAULT_SLICE_COUNT: usize = 8;
pub const FULL_TURN_DEGREES: f32 = 360.0;
pub(crate) const DEFAULT_SNAP_DEGREES: f32 = 45.0;
pub(crate) const DEFAULT_JITTER_DEGREES: u32 = 45;
pub(crate) const DEFAULT_MIN_FULL_ROTATIONS: u32 = 3;
pub(crate) const DEFAULT_SPIN_DURATION_SECS: f32 = 3.0;

// Zone ladder --------------------------------------------------------------
pub const FIRST_ZONE: u32 = 1;
pub const SAFE_ZONE_INTERVAL: u32 = 5;
pub const SUPER_ZONE_INTERVAL: u32 = 30;

// Economy ------------------------------------------------------------------
pub const DEFAULT_REVIVE_COST: u64 = 25;
pub const DEFAULT_ITEM_GOLD_CONVERSION: u32 = 100;

// Persistence --------------------------------------------------------------
pub const DEFAULT_SAVE_SLOT: &str = "WG_BANKED";

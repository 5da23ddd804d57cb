//! Immutable wheel content: slice definitions, presets and the authored catalog.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_ITEM_GOLD_CONVERSION, SAFE_ZONE_INTERVAL, SUPER_ZONE_INTERVAL};

const DEFAULT_CATALOG: &str = include_str!("../assets/wheel.json");

/// Reward carried by a single slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    Money,
    Gold,
    Chests,
    Item,
    Bomb,
}

impl RewardType {
    #[must_use]
    pub const fn is_bomb(self) -> bool {
        matches!(self, Self::Bomb)
    }

    /// Stackable rewards carry a meaningful `amount`.
    #[must_use]
    pub const fn is_stackable(self) -> bool {
        matches!(self, Self::Money | Self::Gold | Self::Chests)
    }
}

fn default_item_gold_conversion() -> u32 {
    DEFAULT_ITEM_GOLD_CONVERSION
}

/// One reward or bomb outcome on the wheel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceDefinition {
    pub reward_type: RewardType,
    /// Quantity granted; ignored for items and bombs.
    #[serde(default)]
    pub amount: u32,
    /// Gold granted when an identical item is earned a second time.
    #[serde(default = "default_item_gold_conversion")]
    pub item_gold_conversion_value: u32,
    /// Opaque presentation handle. Items are identified by it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub rarity: u32,
}

impl SliceDefinition {
    #[must_use]
    pub fn new(reward_type: RewardType, amount: u32) -> Self {
        Self {
            reward_type,
            amount,
            item_gold_conversion_value: DEFAULT_ITEM_GOLD_CONVERSION,
            icon: None,
            rarity: 0,
        }
    }

    #[must_use]
    pub fn bomb() -> Self {
        Self::new(RewardType::Bomb, 0)
    }

    #[must_use]
    pub fn item(icon: impl Into<String>, gold_conversion: u32) -> Self {
        Self {
            item_gold_conversion_value: gold_conversion,
            icon: Some(icon.into()),
            ..Self::new(RewardType::Item, 0)
        }
    }

    /// Amount as seen by consumers: zero for items and bombs.
    #[must_use]
    pub const fn effective_amount(&self) -> u32 {
        if self.reward_type.is_stackable() {
            self.amount
        } else {
            0
        }
    }

    /// Identity used to detect a repeated item, if this slice is a trackable item.
    #[must_use]
    pub fn item_key(&self) -> Option<&str> {
        match self.reward_type {
            RewardType::Item => self.icon.as_deref(),
            _ => None,
        }
    }
}

/// Wheel family; decides whether bombs may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WheelType {
    #[default]
    Normal,
    Safe,
    Super,
}

impl WheelType {
    /// Wheel type a zone must (or, for normal zones, should) use.
    #[must_use]
    pub const fn for_zone(zone: u32) -> Self {
        if zone % SUPER_ZONE_INTERVAL == 0 {
            Self::Super
        } else if zone % SAFE_ZONE_INTERVAL == 0 {
            Self::Safe
        } else {
            Self::Normal
        }
    }

    #[must_use]
    pub const fn allows_bomb(self) -> bool {
        matches!(self, Self::Normal)
    }
}

impl std::fmt::Display for WheelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Normal => "normal",
            Self::Safe => "safe",
            Self::Super => "super",
        };
        f.write_str(label)
    }
}

/// Preset as authored in the catalog, before slice-count normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetDef {
    pub id: String,
    #[serde(default)]
    pub wheel_type: WheelType,
    #[serde(default)]
    pub slices: Vec<SliceDefinition>,
}

/// Authored content: named presets and the per-zone assignment by preset id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WheelCatalog {
    pub presets: Vec<PresetDef>,
    /// Preset id for zone 1, 2, 3, ...
    pub zones: Vec<String>,
}

impl WheelCatalog {
    /// Load a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a catalog.
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load the catalog bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled JSON is malformed.
    pub fn load_from_static() -> Result<Self, ContentError> {
        Self::from_json(DEFAULT_CATALOG)
    }

    #[must_use]
    pub fn find_preset(&self, id: &str) -> Option<&PresetDef> {
        self.presets.iter().find(|preset| preset.id == id)
    }
}

/// Runtime preset with exactly `slice_count` slots. Missing content is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelPreset {
    pub id: String,
    pub wheel_type: WheelType,
    slices: Vec<Option<SliceDefinition>>,
}

impl WheelPreset {
    /// Normalize an authored preset to `slice_count` slots, reporting every authoring issue.
    #[must_use]
    pub fn from_def(def: &PresetDef, slice_count: usize) -> (Self, Vec<ContentIssue>) {
        let mut issues = Vec::new();
        if def.slices.len() != slice_count {
            issues.push(ContentIssue::SliceCountMismatch {
                preset: def.id.clone(),
                expected: slice_count,
                actual: def.slices.len(),
            });
        }

        let mut slices: Vec<Option<SliceDefinition>> = def
            .slices
            .iter()
            .take(slice_count)
            .cloned()
            .map(Some)
            .collect();
        slices.resize(slice_count, None);

        let preset = Self {
            id: def.id.clone(),
            wheel_type: def.wheel_type,
            slices,
        };
        issues.extend(preset.authoring_issues());
        (preset, issues)
    }

    /// Build a preset from slices already known to be well formed.
    #[must_use]
    pub fn new(id: impl Into<String>, wheel_type: WheelType, slices: Vec<SliceDefinition>) -> Self {
        Self {
            id: id.into(),
            wheel_type,
            slices: slices.into_iter().map(Some).collect(),
        }
    }

    /// Stand-in for a zone with no usable preset: every slot is empty.
    #[must_use]
    pub fn placeholder(id: impl Into<String>, wheel_type: WheelType, slice_count: usize) -> Self {
        Self {
            id: id.into(),
            wheel_type,
            slices: vec![None; slice_count],
        }
    }

    #[must_use]
    pub fn slice_count(&self) -> usize {
        self.slices.len()
    }

    #[must_use]
    pub fn slice(&self, index: usize) -> Option<&SliceDefinition> {
        self.slices.get(index).and_then(Option::as_ref)
    }

    pub fn slices(&self) -> impl Iterator<Item = Option<&SliceDefinition>> {
        self.slices.iter().map(Option::as_ref)
    }

    #[must_use]
    pub fn bomb_count(&self) -> usize {
        self.slices()
            .flatten()
            .filter(|slice| slice.reward_type.is_bomb())
            .count()
    }

    pub(crate) fn authoring_issues(&self) -> Vec<ContentIssue> {
        let mut issues = Vec::new();
        let bombs = self.bomb_count();
        if !self.wheel_type.allows_bomb() && bombs > 0 {
            issues.push(ContentIssue::BombOnProtectedWheel {
                preset: self.id.clone(),
                wheel_type: self.wheel_type,
                count: bombs,
            });
        }
        if self.wheel_type == WheelType::Normal && bombs != 1 {
            issues.push(ContentIssue::NormalBombCount {
                preset: self.id.clone(),
                count: bombs,
            });
        }
        for (index, slice) in self.slices.iter().enumerate() {
            if let Some(slice) = slice
                && slice.reward_type == RewardType::Item
                && slice.item_gold_conversion_value == 0
            {
                issues.push(ContentIssue::InvalidConversion {
                    preset: self.id.clone(),
                    index,
                });
            }
        }
        issues
    }
}

/// Non-fatal authoring problem found while loading content.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContentIssue {
    #[error("preset {preset} has {actual} slices, expected {expected}")]
    SliceCountMismatch {
        preset: String,
        expected: usize,
        actual: usize,
    },
    #[error("preset {preset} is a {wheel_type} wheel but holds {count} bomb slice(s)")]
    BombOnProtectedWheel {
        preset: String,
        wheel_type: WheelType,
        count: usize,
    },
    #[error("normal preset {preset} holds {count} bomb slices, expected exactly one")]
    NormalBombCount { preset: String, count: usize },
    #[error("item slice {index} of preset {preset} converts to zero gold")]
    InvalidConversion { preset: String, index: usize },
    #[error("preset id {preset} is defined more than once")]
    DuplicatePresetId { preset: String },
    #[error("zone {zone} has no wheel assigned")]
    MissingPreset { zone: u32 },
    #[error("zone {zone} references unknown preset {preset}")]
    UnknownPreset { zone: u32, preset: String },
    #[error("zone {zone} must use a {expected} preset, but {preset} is {actual}")]
    ZoneTypeMismatch {
        zone: u32,
        expected: WheelType,
        actual: WheelType,
        preset: String,
    },
}

impl ContentIssue {
    /// Conventions are reported but are not rule violations.
    #[must_use]
    pub const fn is_convention(&self) -> bool {
        matches!(self, Self::NormalBombCount { .. })
    }

    pub(crate) fn log(&self) {
        if self.is_convention() {
            log::info!("content: {self}");
        } else {
            log::warn!("content: {self}");
        }
    }
}

/// Content that cannot be used at all.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to parse wheel catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("zone ladder has no zones configured")]
    EmptyLadder,
}

//! Zone progression: maps each zone to its wheel preset and enforces placement rules.
use std::collections::HashMap;

use crate::constants::{FIRST_ZONE, SAFE_ZONE_INTERVAL, SUPER_ZONE_INTERVAL};
use crate::data::{ContentError, ContentIssue, WheelCatalog, WheelPreset, WheelType};

/// Ordered ladder of zones, each resolved to an immutable preset.
#[derive(Debug, Clone)]
pub struct ZoneLadder {
    presets: Vec<WheelPreset>,
    /// Index into `presets` for zone `i + 1`.
    zones: Vec<usize>,
    current: u32,
    active: usize,
    issues: Vec<ContentIssue>,
}

impl ZoneLadder {
    /// Build the ladder from authored content, normalizing presets to `slice_count` slots.
    ///
    /// Authoring problems are logged and kept in [`ZoneLadder::issues`]; zones
    /// whose preset is missing receive an empty placeholder of the expected type.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::EmptyLadder`] when the catalog assigns no zones.
    pub fn from_catalog(catalog: &WheelCatalog, slice_count: usize) -> Result<Self, ContentError> {
        if catalog.zones.is_empty() {
            log::error!("zone ladder: no wheels assigned");
            return Err(ContentError::EmptyLadder);
        }

        let mut issues = Vec::new();
        let mut presets = Vec::with_capacity(catalog.presets.len());
        let mut by_id: HashMap<&str, usize> = HashMap::new();
        for def in &catalog.presets {
            if by_id.contains_key(def.id.as_str()) {
                issues.push(ContentIssue::DuplicatePresetId {
                    preset: def.id.clone(),
                });
                continue;
            }
            let (preset, preset_issues) = WheelPreset::from_def(def, slice_count);
            issues.extend(preset_issues);
            by_id.insert(def.id.as_str(), presets.len());
            presets.push(preset);
        }

        let mut zones = Vec::with_capacity(catalog.zones.len());
        for (offset, preset_id) in catalog.zones.iter().enumerate() {
            let zone = zone_number(offset);
            let index = if preset_id.trim().is_empty() {
                issues.push(ContentIssue::MissingPreset { zone });
                None
            } else if let Some(index) = by_id.get(preset_id.as_str()) {
                Some(*index)
            } else {
                issues.push(ContentIssue::UnknownPreset {
                    zone,
                    preset: preset_id.clone(),
                });
                None
            };
            let index = index.unwrap_or_else(|| {
                presets.push(WheelPreset::placeholder(
                    format!("placeholder-{zone}"),
                    WheelType::for_zone(zone),
                    slice_count,
                ));
                presets.len() - 1
            });
            zones.push(index);
        }

        Ok(Self::assemble(presets, zones, issues))
    }

    /// Build the ladder from presets already in zone order.
    ///
    /// Each preset is checked for bomb placement and item conversions, the
    /// same as catalog presets.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::EmptyLadder`] when `presets` is empty.
    pub fn from_presets(presets: Vec<WheelPreset>) -> Result<Self, ContentError> {
        if presets.is_empty() {
            return Err(ContentError::EmptyLadder);
        }
        let zones = (0..presets.len()).collect();
        let issues = presets
            .iter()
            .flat_map(WheelPreset::authoring_issues)
            .collect();
        Ok(Self::assemble(presets, zones, issues))
    }

    fn assemble(presets: Vec<WheelPreset>, zones: Vec<usize>, mut issues: Vec<ContentIssue>) -> Self {
        let mut ladder = Self {
            presets,
            zones,
            current: FIRST_ZONE,
            active: 0,
            issues: Vec::new(),
        };
        issues.extend(ladder.zone_rule_violations());
        for issue in &issues {
            issue.log();
        }
        ladder.issues = issues;
        ladder.active = ladder.zones[0];
        ladder
    }

    /// Check every zone against the safe/super placement rule.
    #[must_use]
    pub fn zone_rule_violations(&self) -> Vec<ContentIssue> {
        self.zones
            .iter()
            .enumerate()
            .filter_map(|(offset, preset_index)| {
                let zone = zone_number(offset);
                let preset = &self.presets[*preset_index];
                let expected = WheelType::for_zone(zone);
                let enforced = expected != WheelType::Normal;
                (enforced && preset.wheel_type != expected).then(|| ContentIssue::ZoneTypeMismatch {
                    zone,
                    expected,
                    actual: preset.wheel_type,
                    preset: preset.id.clone(),
                })
            })
            .collect()
    }

    /// Report every preset on the ladder whose slot count differs from `expected`.
    ///
    /// Returns how many presets were reported.
    pub(crate) fn report_slice_counts(&mut self, expected: usize) -> usize {
        let mut seen = vec![false; self.presets.len()];
        let mut found = Vec::new();
        for index in &self.zones {
            let preset = &self.presets[*index];
            if !seen[*index] && preset.slice_count() != expected {
                found.push(ContentIssue::SliceCountMismatch {
                    preset: preset.id.clone(),
                    expected,
                    actual: preset.slice_count(),
                });
            }
            seen[*index] = true;
        }
        for issue in &found {
            issue.log();
        }
        let count = found.len();
        self.issues.extend(found);
        count
    }

    /// Clamp `target` into `[1, max_zone]`, make it current and return it.
    pub fn set_zone(&mut self, target: u32) -> u32 {
        let clamped = target.clamp(FIRST_ZONE, self.max_zone());
        if clamped != target {
            log::debug!("zone {target} out of range, clamped to {clamped}");
        }
        self.current = clamped;
        self.active = self.zones[zone_offset(clamped)];
        clamped
    }

    pub fn advance_zone(&mut self) -> u32 {
        self.set_zone(self.current.saturating_add(1))
    }

    #[must_use]
    pub const fn current_zone(&self) -> u32 {
        self.current
    }

    #[must_use]
    pub fn max_zone(&self) -> u32 {
        u32::try_from(self.zones.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn active_preset(&self) -> &WheelPreset {
        &self.presets[self.active]
    }

    /// Preset assigned to `zone`, if the zone exists.
    #[must_use]
    pub fn preset_for_zone(&self, zone: u32) -> Option<&WheelPreset> {
        if zone < FIRST_ZONE {
            return None;
        }
        self.zones
            .get(zone_offset(zone))
            .map(|index| &self.presets[*index])
    }

    #[must_use]
    pub const fn is_safe_zone(&self) -> bool {
        self.current % SAFE_ZONE_INTERVAL == 0 && self.current % SUPER_ZONE_INTERVAL != 0
    }

    #[must_use]
    pub const fn is_super_zone(&self) -> bool {
        self.current % SUPER_ZONE_INTERVAL == 0
    }

    /// Walking away is only offered on safe and super zones.
    #[must_use]
    pub const fn allows_walk_away(&self) -> bool {
        self.is_safe_zone() || self.is_super_zone()
    }

    /// Everything reported while building the ladder.
    #[must_use]
    pub fn issues(&self) -> &[ContentIssue] {
        &self.issues
    }
}

fn zone_number(offset: usize) -> u32 {
    u32::try_from(offset)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(FIRST_ZONE)
}

fn zone_offset(zone: u32) -> usize {
    usize::try_from(zone - FIRST_ZONE).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{PresetDef, RewardType, SliceDefinition};

    fn preset(id: &str, wheel_type: WheelType) -> PresetDef {
        let mut slices = vec![SliceDefinition::new(RewardType::Gold, 10); 3];
        if wheel_type == WheelType::Normal {
            slices.push(SliceDefinition::bomb());
        } else {
            slices.push(SliceDefinition::new(RewardType::Money, 5));
        }
        PresetDef {
            id: id.to_string(),
            wheel_type,
            slices,
        }
    }

    fn catalog(zones: &[&str]) -> WheelCatalog {
        WheelCatalog {
            presets: vec![
                preset("normal", WheelType::Normal),
                preset("safe", WheelType::Safe),
                preset("super", WheelType::Super),
            ],
            zones: zones.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn set_zone_clamps_into_range() {
        let mut ladder =
            ZoneLadder::from_catalog(&catalog(&["normal", "normal", "normal"]), 4).unwrap();
        assert_eq!(ladder.current_zone(), 1);
        assert_eq!(ladder.set_zone(0), 1);
        assert_eq!(ladder.set_zone(99), 3);
        assert_eq!(ladder.advance_zone(), 3);
        assert_eq!(ladder.set_zone(2), 2);
        assert_eq!(ladder.advance_zone(), 3);
    }

    #[test]
    fn safe_and_super_predicates_follow_intervals() {
        let mut zones = vec!["normal"; 30];
        for zone in [5, 10, 15, 20, 25] {
            zones[zone - 1] = "safe";
        }
        zones[29] = "super";
        let mut ladder = ZoneLadder::from_catalog(&catalog(&zones), 4).unwrap();
        assert!(ladder.issues().is_empty(), "{:?}", ladder.issues());

        ladder.set_zone(5);
        assert!(ladder.is_safe_zone());
        assert!(!ladder.is_super_zone());
        assert_eq!(ladder.active_preset().wheel_type, WheelType::Safe);

        ladder.set_zone(30);
        assert!(ladder.is_super_zone());
        assert!(!ladder.is_safe_zone());
        assert!(ladder.allows_walk_away());

        ladder.set_zone(7);
        assert!(!ladder.allows_walk_away());
    }

    #[test]
    fn rule_violations_are_all_reported() {
        let zones = vec!["normal"; 10];
        let ladder = ZoneLadder::from_catalog(&catalog(&zones), 4).unwrap();
        let mismatches: Vec<u32> = ladder
            .issues()
            .iter()
            .filter_map(|issue| match issue {
                ContentIssue::ZoneTypeMismatch { zone, .. } => Some(*zone),
                _ => None,
            })
            .collect();
        assert_eq!(mismatches, vec![5, 10]);
        assert_eq!(ladder.max_zone(), 10);
    }

    #[test]
    fn unknown_presets_fall_back_to_placeholders() {
        let ladder = ZoneLadder::from_catalog(&catalog(&["normal", "ghost", ""]), 4).unwrap();
        let ghost = ladder.preset_for_zone(2).unwrap();
        assert!(ghost.slices().all(|slot| slot.is_none()));
        assert_eq!(ghost.slice_count(), 4);
        assert!(ladder.issues().contains(&ContentIssue::UnknownPreset {
            zone: 2,
            preset: String::from("ghost"),
        }));
        assert!(ladder.issues().contains(&ContentIssue::MissingPreset { zone: 3 }));
        assert!(ladder.preset_for_zone(0).is_none());
        assert!(ladder.preset_for_zone(4).is_none());
    }

    #[test]
    fn empty_ladder_is_rejected() {
        assert!(matches!(
            ZoneLadder::from_catalog(&catalog(&[]), 4),
            Err(ContentError::EmptyLadder)
        ));
        assert!(matches!(
            ZoneLadder::from_presets(Vec::new()),
            Err(ContentError::EmptyLadder)
        ));
    }

    #[test]
    fn ordered_presets_are_checked_like_catalog_ones() {
        let mut presets: Vec<WheelPreset> = (0..4)
            .map(|zone| WheelPreset::from_def(&preset(&format!("n{zone}"), WheelType::Normal), 4).0)
            .collect();
        presets.push(WheelPreset::new(
            "boom",
            WheelType::Safe,
            vec![SliceDefinition::bomb(); 4],
        ));
        presets[1] = WheelPreset::new(
            "dud",
            WheelType::Normal,
            vec![
                SliceDefinition::bomb(),
                SliceDefinition::item("icon.shield", 0),
                SliceDefinition::new(RewardType::Gold, 5),
                SliceDefinition::new(RewardType::Gold, 5),
            ],
        );
        let ladder = ZoneLadder::from_presets(presets).unwrap();
        assert_eq!(
            ladder.issues(),
            &[
                ContentIssue::InvalidConversion {
                    preset: String::from("dud"),
                    index: 1,
                },
                ContentIssue::BombOnProtectedWheel {
                    preset: String::from("boom"),
                    wheel_type: WheelType::Safe,
                    count: 4,
                },
            ]
        );
    }

    #[test]
    fn slice_count_mismatches_are_reported_once_per_preset() {
        let mut ladder =
            ZoneLadder::from_catalog(&catalog(&["normal", "normal", "ghost"]), 4).unwrap();
        assert_eq!(ladder.report_slice_counts(4), 0);
        assert_eq!(ladder.report_slice_counts(8), 2);
        assert!(ladder.issues().contains(&ContentIssue::SliceCountMismatch {
            preset: String::from("normal"),
            expected: 8,
            actual: 4,
        }));
        assert!(ladder.issues().contains(&ContentIssue::SliceCountMismatch {
            preset: String::from("placeholder-3"),
            expected: 8,
            actual: 4,
        }));
    }

    #[test]
    fn duplicate_preset_ids_keep_the_first() {
        let mut content = catalog(&["normal"]);
        content.presets.push(preset("normal", WheelType::Safe));
        let ladder = ZoneLadder::from_catalog(&content, 4).unwrap();
        assert_eq!(ladder.active_preset().wheel_type, WheelType::Normal);
        assert!(ladder.issues().contains(&ContentIssue::DuplicatePresetId {
            preset: String::from("normal"),
        }));
    }
}

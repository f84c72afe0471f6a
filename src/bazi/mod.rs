//! Four-pillar (BaZi) chart derivation and five-element scoring.
//!
//! Stem/branch indexing follows the conventional order:
//! - stems: 甲(0) 乙(1) 丙(2) 丁(3) 戊(4) 己(5) 庚(6) 辛(7) 壬(8) 癸(9)
//! - branches: 子(0) 丑(1) 寅(2) 卯(3) 辰(4) 巳(5) 午(6) 未(7) 申(8) 酉(9) 戌(10) 亥(11)

use serde::Deserialize;
use serde::Serialize;

pub mod calendar;
pub mod chart;
pub mod elements;
pub mod fengshui;
pub mod fortune;

pub use chart::BirthChart;
pub use chart::Pillar;
pub use elements::ElementAnalysis;
pub use fengshui::FengShuiAdvice;
pub use fortune::FortuneScore;

/// The five elements, in the fixed iteration order used for tie-breaking.
/// The derived ordering follows declaration order and is relied upon by the
/// analysis map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FiveElement {
    #[serde(rename = "木")]
    Wood,
    #[serde(rename = "火")]
    Fire,
    #[serde(rename = "土")]
    Earth,
    #[serde(rename = "金")]
    Metal,
    #[serde(rename = "水")]
    Water,
}

impl FiveElement {
    pub const ALL: [FiveElement; 5] = [
        FiveElement::Wood,
        FiveElement::Fire,
        FiveElement::Earth,
        FiveElement::Metal,
        FiveElement::Water,
    ];

    pub fn chinese(self) -> &'static str {
        match self {
            FiveElement::Wood => "木",
            FiveElement::Fire => "火",
            FiveElement::Earth => "土",
            FiveElement::Metal => "金",
            FiveElement::Water => "水",
        }
    }

    pub fn from_chinese(s: &str) -> Option<Self> {
        match s {
            "木" => Some(FiveElement::Wood),
            "火" => Some(FiveElement::Fire),
            "土" => Some(FiveElement::Earth),
            "金" => Some(FiveElement::Metal),
            "水" => Some(FiveElement::Water),
            _ => None,
        }
    }

    /// Position in [`FiveElement::ALL`]
    pub fn index(self) -> usize {
        match self {
            FiveElement::Wood => 0,
            FiveElement::Fire => 1,
            FiveElement::Earth => 2,
            FiveElement::Metal => 3,
            FiveElement::Water => 4,
        }
    }
}

impl std::fmt::Display for FiveElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.chinese())
    }
}

/// Heavenly stem, indexed 0-9. Serialized by its Chinese name so stored
/// charts read the same as the source product's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeavenlyStem(pub u8);

const STEM_NAMES: [&str; 10] = ["甲", "乙", "丙", "丁", "戊", "己", "庚", "辛", "壬", "癸"];

impl HeavenlyStem {
    /// Each pair of consecutive stems shares one element (甲乙木, 丙丁火, ...)
    pub fn element(self) -> FiveElement {
        FiveElement::ALL[usize::from(self.0) / 2]
    }

    pub fn chinese(self) -> &'static str {
        STEM_NAMES[usize::from(self.0)]
    }
}

impl Serialize for HeavenlyStem {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.chinese())
    }
}

impl<'de> Deserialize<'de> for HeavenlyStem {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        STEM_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| HeavenlyStem(i as u8))
            .ok_or_else(|| serde::de::Error::custom(format!("unknown heavenly stem: {name}")))
    }
}

impl std::fmt::Display for HeavenlyStem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.chinese())
    }
}

/// Earthly branch, indexed 0-11. Serialized by its Chinese name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarthlyBranch(pub u8);

const BRANCH_NAMES: [&str; 12] = [
    "子", "丑", "寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌", "亥",
];

const ZODIAC_NAMES: [&str; 12] = [
    "鼠", "牛", "虎", "兔", "龙", "蛇", "马", "羊", "猴", "鸡", "狗", "猪",
];

impl EarthlyBranch {
    pub fn chinese(self) -> &'static str {
        BRANCH_NAMES[usize::from(self.0)]
    }

    /// Zodiac animal of this branch (applied to the year pillar only)
    pub fn zodiac(self) -> &'static str {
        ZODIAC_NAMES[usize::from(self.0)]
    }
}

impl std::fmt::Display for EarthlyBranch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.chinese())
    }
}

impl Serialize for EarthlyBranch {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.chinese())
    }
}

impl<'de> Deserialize<'de> for EarthlyBranch {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        BRANCH_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| EarthlyBranch(i as u8))
            .ok_or_else(|| serde::de::Error::custom(format!("unknown earthly branch: {name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_element_table() {
        // 甲乙木 丙丁火 戊己土 庚辛金 壬癸水
        assert_eq!(HeavenlyStem(0).element(), FiveElement::Wood);
        assert_eq!(HeavenlyStem(1).element(), FiveElement::Wood);
        assert_eq!(HeavenlyStem(2).element(), FiveElement::Fire);
        assert_eq!(HeavenlyStem(5).element(), FiveElement::Earth);
        assert_eq!(HeavenlyStem(7).element(), FiveElement::Metal);
        assert_eq!(HeavenlyStem(9).element(), FiveElement::Water);
    }

    #[test]
    fn test_zodiac_table() {
        assert_eq!(EarthlyBranch(0).zodiac(), "鼠");
        assert_eq!(EarthlyBranch(4).zodiac(), "龙");
        assert_eq!(EarthlyBranch(11).zodiac(), "猪");
    }

    #[test]
    fn test_element_serde_chinese() {
        let json = serde_json::to_string(&FiveElement::Wood).unwrap();
        assert_eq!(json, "\"木\"");
        let back: FiveElement = serde_json::from_str("\"水\"").unwrap();
        assert_eq!(back, FiveElement::Water);
    }

    #[test]
    fn test_stem_branch_serde_round_trip() {
        let stem_json = serde_json::to_string(&HeavenlyStem(4)).unwrap();
        assert_eq!(stem_json, "\"戊\"");
        let stem: HeavenlyStem = serde_json::from_str(&stem_json).unwrap();
        assert_eq!(stem, HeavenlyStem(4));

        let branch_json = serde_json::to_string(&EarthlyBranch(6)).unwrap();
        assert_eq!(branch_json, "\"午\"");
        let branch: EarthlyBranch = serde_json::from_str(&branch_json).unwrap();
        assert_eq!(branch, EarthlyBranch(6));

        assert!(serde_json::from_str::<HeavenlyStem>("\"鼠\"").is_err());
    }
}

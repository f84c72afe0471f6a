//! Fixed crystal lookup tables for the recommendation rules.

use crate::bazi::FiveElement;
use crate::bazi::fortune::FortuneDomain;

/// One fixed recommendation entry: names, reason and a 1-10 priority.
#[derive(Debug, Clone, Copy)]
pub struct CrystalEntry {
    pub chinese_name: &'static str,
    pub english_name: &'static str,
    pub reason: &'static str,
    pub priority: u32,
}

/// Crystals that replenish a missing element.
pub fn element_crystals(element: FiveElement) -> &'static [CrystalEntry] {
    match element {
        FiveElement::Wood => &[
            CrystalEntry {
                chinese_name: "绿东陵石",
                english_name: "Green Aventurine",
                reason: "增强木元素，促进事业发展和创造力",
                priority: 9,
            },
            CrystalEntry {
                chinese_name: "绿幽灵",
                english_name: "Green Phantom",
                reason: "激发成长潜能，帮助事业突破",
                priority: 8,
            },
        ],
        FiveElement::Fire => &[
            CrystalEntry {
                chinese_name: "红石榴石",
                english_name: "Garnet",
                reason: "增强火元素，提升热情和行动力",
                priority: 9,
            },
            CrystalEntry {
                chinese_name: "红宝石",
                english_name: "Ruby",
                reason: "激发内在能量，增强领导力",
                priority: 8,
            },
        ],
        FiveElement::Earth => &[
            CrystalEntry {
                chinese_name: "黄水晶",
                english_name: "Citrine",
                reason: "增强土元素，吸引财富和稳定性",
                priority: 10,
            },
            CrystalEntry {
                chinese_name: "黄玉",
                english_name: "Yellow Jade",
                reason: "带来健康和财运，稳定情绪",
                priority: 8,
            },
        ],
        FiveElement::Metal => &[
            CrystalEntry {
                chinese_name: "白水晶",
                english_name: "Clear Quartz",
                reason: "增强金元素，提升理性思维和决断力",
                priority: 9,
            },
            CrystalEntry {
                chinese_name: "白玉",
                english_name: "White Jade",
                reason: "净化心灵，增强智慧和清晰思维",
                priority: 8,
            },
        ],
        FiveElement::Water => &[
            CrystalEntry {
                chinese_name: "紫水晶",
                english_name: "Amethyst",
                reason: "增强水元素，开发直觉和智慧",
                priority: 10,
            },
            CrystalEntry {
                chinese_name: "海蓝宝",
                english_name: "Aquamarine",
                reason: "平静心灵，增强沟通能力",
                priority: 8,
            },
        ],
    }
}

/// Catalog names consulted for the weakest fortune domain.
pub fn domain_crystals(domain: FortuneDomain) -> &'static [&'static str] {
    match domain {
        FortuneDomain::Career => &["Citrine", "Tiger Eye", "Pyrite", "Carnelian"],
        FortuneDomain::Wealth => &["Citrine", "Green Aventurine", "Pyrite", "Jade"],
        FortuneDomain::Health => &["Amethyst", "Clear Quartz", "Rose Quartz", "Green Aventurine"],
        FortuneDomain::Relationship => &["Rose Quartz", "Moonstone", "Rhodonite", "Green Aventurine"],
    }
}

/// Single remedy crystal suggested when a domain scores below 70
/// (used by the local narrative fallback).
pub fn low_domain_crystal(domain: FortuneDomain) -> CrystalEntry {
    match domain {
        FortuneDomain::Career => CrystalEntry {
            chinese_name: "虎眼石",
            english_name: "Tiger Eye",
            reason: "增强事业运势，提升勇气和决断力",
            priority: 8,
        },
        FortuneDomain::Wealth => CrystalEntry {
            chinese_name: "黄水晶",
            english_name: "Citrine",
            reason: "提升财运，吸引财富和机遇",
            priority: 9,
        },
        FortuneDomain::Health => CrystalEntry {
            chinese_name: "绿东陵石",
            english_name: "Green Aventurine",
            reason: "增强健康运势，平衡身心能量",
            priority: 8,
        },
        FortuneDomain::Relationship => CrystalEntry {
            chinese_name: "粉水晶",
            english_name: "Rose Quartz",
            reason: "增强感情运势，促进人际关系和爱情",
            priority: 9,
        },
    }
}

/// What a missing element is felt to weaken (used by narrative text).
pub fn element_meaning(element: FiveElement) -> &'static str {
    match element {
        FiveElement::Wood => "创造力、成长力和事业发展",
        FiveElement::Fire => "热情、活力和人际关系",
        FiveElement::Earth => "稳定性、财运和健康基础",
        FiveElement::Metal => "理性思维、决断力和领导能力",
        FiveElement::Water => "智慧、直觉和适应能力",
    }
}

/// Home environment suggestion keyed on the day master.
pub fn environment_advice(element: FiveElement) -> &'static str {
    match element {
        FiveElement::Wood => "家中可多放置绿色植物，使用木质家具，选择东方或东南方向的住所。",
        FiveElement::Fire => "可使用温暖的照明，布置红色或橙色装饰，选择南方向的房间。",
        FiveElement::Earth => "使用土黄色调的装饰，可放置陶瓷制品，选择中央或西南方向的位置。",
        FiveElement::Metal => "使用金属装饰品，选择白色或银色主色调，住所宜选择西方或西北方向。",
        FiveElement::Water => "可设置水景或鱼缸，使用蓝色或黑色装饰，选择北方向的房间。",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_element_has_entries() {
        for element in FiveElement::ALL {
            let entries = element_crystals(element);
            assert_eq!(entries.len(), 2);
            for entry in entries {
                assert!((8..=10).contains(&entry.priority));
                assert!(!entry.english_name.is_empty());
            }
        }
    }

    #[test]
    fn test_every_domain_has_candidates() {
        for domain in FortuneDomain::ALL {
            assert_eq!(domain_crystals(domain).len(), 4);
            assert!(!low_domain_crystal(domain).chinese_name.is_empty());
        }
    }
}

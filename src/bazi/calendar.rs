//! Sexagenary (GanZhi) conversion from civil dates.
//!
//! Pure table arithmetic: the day pillar comes from the Julian day number,
//! the year pillar from the Lichun-bounded year, the month pillar from fixed
//! solar-term cutoffs plus the five-tigers rule, and the hour pillar from the
//! five-rats rule. Solar-term boundaries are approximated by their most
//! common civil dates, which can be off by one day in some years.

use chrono::Datelike;
use chrono::NaiveDate;

use super::EarthlyBranch;
use super::HeavenlyStem;

/// One stem/branch pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GanZhi {
    pub stem: HeavenlyStem,
    pub branch: EarthlyBranch,
}

impl GanZhi {
    fn from_index(index: i64) -> Self {
        let index = index.rem_euclid(60);
        Self {
            stem: HeavenlyStem((index % 10) as u8),
            branch: EarthlyBranch((index % 12) as u8),
        }
    }
}

/// Julian day number of a civil date.
///
/// chrono counts days from 0001-01-01 (= day 1); JDN(1970-01-01) = 2440588
/// fixes the offset.
fn julian_day_number(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) + 1_721_425
}

/// Day pillar. `(jdn + 49) % 60` maps the cycle onto the historical anchor
/// (1949-10-01 and 2000-01-01 are 甲子 and 戊午 days respectively).
pub fn day_ganzhi(date: NaiveDate) -> GanZhi {
    GanZhi::from_index(julian_day_number(date) + 49)
}

/// Year pillar. The BaZi year begins at Lichun (approx. Feb 4), not Jan 1.
pub fn year_ganzhi(date: NaiveDate) -> GanZhi {
    let mut year = i64::from(date.year());
    if (date.month(), date.day()) < (2, 4) {
        year -= 1;
    }
    GanZhi {
        stem: HeavenlyStem((year - 4).rem_euclid(10) as u8),
        branch: EarthlyBranch((year - 4).rem_euclid(12) as u8),
    }
}

/// Branch of the BaZi month containing `date`, from the fixed solar-term
/// cutoffs (立春 Feb 4 → 寅, 惊蛰 Mar 6 → 卯, ..., 小寒 Jan 6 → 丑).
fn month_branch(date: NaiveDate) -> EarthlyBranch {
    let day = date.day();
    let branch = match date.month() {
        1 => {
            if day >= 6 {
                1
            } else {
                0
            }
        }
        2 => {
            if day >= 4 {
                2
            } else {
                1
            }
        }
        3 => {
            if day >= 6 {
                3
            } else {
                2
            }
        }
        4 => {
            if day >= 5 {
                4
            } else {
                3
            }
        }
        5 => {
            if day >= 6 {
                5
            } else {
                4
            }
        }
        6 => {
            if day >= 6 {
                6
            } else {
                5
            }
        }
        7 => {
            if day >= 7 {
                7
            } else {
                6
            }
        }
        8 => {
            if day >= 8 {
                8
            } else {
                7
            }
        }
        9 => {
            if day >= 8 {
                9
            } else {
                8
            }
        }
        10 => {
            if day >= 8 {
                10
            } else {
                9
            }
        }
        11 => {
            if day >= 7 {
                11
            } else {
                10
            }
        }
        _ => {
            if day >= 7 {
                0
            } else {
                11
            }
        }
    };
    EarthlyBranch(branch)
}

/// Month pillar. The stem follows the five-tigers rule: the 寅 month of a
/// 甲/己 year starts at 丙, advancing two stems per year-stem class.
pub fn month_ganzhi(date: NaiveDate, year_stem: HeavenlyStem) -> GanZhi {
    let branch = month_branch(date);
    let first_stem = (year_stem.0 % 5) * 2 + 2;
    let months_from_yin = (i16::from(branch.0) - 2).rem_euclid(12) as u8;
    GanZhi {
        stem: HeavenlyStem((first_stem + months_from_yin) % 10),
        branch,
    }
}

/// Hour pillar. Branch changes every two hours starting at 23:00 (子); the
/// stem follows the five-rats rule anchored on the day stem.
pub fn hour_ganzhi(hour: u32, day_stem: HeavenlyStem) -> GanZhi {
    let branch = (((hour + 1) / 2) % 12) as u8;
    let zi_stem = (day_stem.0 % 5) * 2;
    GanZhi {
        stem: HeavenlyStem((zi_stem + branch) % 10),
        branch: EarthlyBranch(branch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_ganzhi_anchors() {
        // 1949-10-01 is the canonical 甲子 day anchor
        let gz = day_ganzhi(date(1949, 10, 1));
        assert_eq!(gz.stem, HeavenlyStem(0));
        assert_eq!(gz.branch, EarthlyBranch(0));

        // 2000-01-01 was a 戊午 day
        let gz = day_ganzhi(date(2000, 1, 1));
        assert_eq!(gz.stem, HeavenlyStem(4));
        assert_eq!(gz.branch, EarthlyBranch(6));
    }

    #[test]
    fn test_day_ganzhi_cycle() {
        let a = day_ganzhi(date(2000, 1, 1));
        let b = day_ganzhi(date(2000, 1, 1) + chrono::Duration::days(60));
        assert_eq!(a, b);
    }

    #[test]
    fn test_year_ganzhi() {
        // 1984 was the start of the current cycle: 甲子
        let gz = year_ganzhi(date(1984, 6, 1));
        assert_eq!(gz.stem, HeavenlyStem(0));
        assert_eq!(gz.branch, EarthlyBranch(0));

        // 2024 (after Lichun) is 甲辰
        let gz = year_ganzhi(date(2024, 6, 1));
        assert_eq!(gz.stem, HeavenlyStem(0));
        assert_eq!(gz.branch, EarthlyBranch(4));

        // January belongs to the previous BaZi year
        let gz = year_ganzhi(date(2024, 1, 15));
        assert_eq!(gz.stem, HeavenlyStem(9)); // 癸卯
        assert_eq!(gz.branch, EarthlyBranch(3));
    }

    #[test]
    fn test_month_ganzhi_five_tigers() {
        // 甲 year, first month (寅) begins with 丙
        let year_stem = HeavenlyStem(0);
        let gz = month_ganzhi(date(2024, 2, 20), year_stem);
        assert_eq!(gz.branch, EarthlyBranch(2)); // 寅
        assert_eq!(gz.stem, HeavenlyStem(2)); // 丙

        // one solar month later the stem advances by one
        let gz = month_ganzhi(date(2024, 3, 20), year_stem);
        assert_eq!(gz.branch, EarthlyBranch(3)); // 卯
        assert_eq!(gz.stem, HeavenlyStem(3)); // 丁
    }

    #[test]
    fn test_hour_ganzhi_five_rats() {
        // 甲 day: zi hour is 甲子
        let gz = hour_ganzhi(0, HeavenlyStem(0));
        assert_eq!(gz.stem, HeavenlyStem(0));
        assert_eq!(gz.branch, EarthlyBranch(0));

        // 乙 day: zi hour is 丙子
        let gz = hour_ganzhi(23, HeavenlyStem(1));
        assert_eq!(gz.stem, HeavenlyStem(2));
        assert_eq!(gz.branch, EarthlyBranch(0));

        // noon on a 甲 day is 庚午
        let gz = hour_ganzhi(12, HeavenlyStem(0));
        assert_eq!(gz.branch, EarthlyBranch(6));
        assert_eq!(gz.stem, HeavenlyStem(6));
    }
}

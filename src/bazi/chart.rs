//! Birth chart derivation from a birth date and time.

use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveTime;
use chrono::Timelike;
use serde::Deserialize;
use serde::Serialize;

use super::calendar;
use super::EarthlyBranch;
use super::FiveElement;
use super::HeavenlyStem;
use crate::errors::CrystalPathError;
use crate::Result;

/// One pillar of the chart. The year pillar additionally carries the zodiac
/// animal of its branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pillar {
    pub stem: HeavenlyStem,
    pub branch: EarthlyBranch,
    pub element: FiveElement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zodiac: Option<String>,
}

impl Pillar {
    fn new(ganzhi: calendar::GanZhi) -> Self {
        Self {
            stem: ganzhi.stem,
            branch: ganzhi.branch,
            element: ganzhi.stem.element(),
            zodiac: None,
        }
    }
}

/// Four-pillar birth chart. Derived once at prediction time; immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthChart {
    pub year: Pillar,
    pub month: Pillar,
    pub day: Pillar,
    pub hour: Pillar,
}

impl BirthChart {
    /// The day pillar's element (the "day master") anchors the fortune rules.
    pub fn day_master(&self) -> FiveElement {
        self.day.element
    }

    pub fn pillars(&self) -> [&Pillar; 4] {
        [&self.year, &self.month, &self.day, &self.hour]
    }

    /// Compact textual form, e.g. "甲子 丙寅 戊午 壬子"
    pub fn notation(&self) -> String {
        self.pillars()
            .iter()
            .map(|p| format!("{}{}", p.stem, p.branch))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Derive the four pillars from a birth date (`YYYY-MM-DD`) and time
/// (`HH:MM` or `HH:MM:SS`). The location is carried through for display only
/// and does not affect the calculation.
pub fn derive_chart(birth_date: &str, birth_time: &str) -> Result<BirthChart> {
    let date = NaiveDate::parse_from_str(birth_date, "%Y-%m-%d").map_err(|e| {
        CrystalPathError::ChartDerivation(format!("invalid birth date '{birth_date}': {e}"))
    })?;
    let time = NaiveTime::parse_from_str(birth_time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(birth_time, "%H:%M:%S"))
        .map_err(|e| {
            CrystalPathError::ChartDerivation(format!("invalid birth time '{birth_time}': {e}"))
        })?;

    let hour = time.hour();

    // 23:00-23:59 is the zi hour of the following day; the day pillar advances.
    let day_date = if hour == 23 {
        date + Duration::days(1)
    } else {
        date
    };

    let year_gz = calendar::year_ganzhi(date);
    let month_gz = calendar::month_ganzhi(date, year_gz.stem);
    let day_gz = calendar::day_ganzhi(day_date);
    let hour_gz = calendar::hour_ganzhi(hour, day_gz.stem);

    let mut year = Pillar::new(year_gz);
    year.zodiac = Some(year_gz.branch.zodiac().to_string());

    Ok(BirthChart {
        year,
        month: Pillar::new(month_gz),
        day: Pillar::new(day_gz),
        hour: Pillar::new(hour_gz),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_chart_known_date() {
        // 2000-01-01 12:00 — day pillar 戊午, year still 己卯 (before Lichun)
        let chart = derive_chart("2000-01-01", "12:00").unwrap();
        assert_eq!(chart.day.stem, HeavenlyStem(4));
        assert_eq!(chart.day.branch, EarthlyBranch(6));
        assert_eq!(chart.day_master(), FiveElement::Earth);
        assert_eq!(chart.year.stem, HeavenlyStem(5)); // 己
        assert_eq!(chart.year.branch, EarthlyBranch(3)); // 卯
        assert_eq!(chart.year.zodiac.as_deref(), Some("兔"));
        assert!(chart.month.zodiac.is_none());
    }

    #[test]
    fn test_hour_23_advances_day_pillar() {
        let before = derive_chart("2000-01-01", "22:30").unwrap();
        let after = derive_chart("2000-01-01", "23:30").unwrap();
        let next_day = derive_chart("2000-01-02", "01:00").unwrap();

        assert_eq!(after.day.stem, next_day.day.stem);
        assert_eq!(after.day.branch, next_day.day.branch);
        assert_ne!(before.day.stem, after.day.stem);
        // zi-hour branch
        assert_eq!(after.hour.branch, EarthlyBranch(0));
    }

    #[test]
    fn test_seconds_accepted() {
        assert!(derive_chart("1990-06-15", "08:30:00").is_ok());
    }

    #[test]
    fn test_invalid_input_is_chart_derivation_error() {
        let err = derive_chart("not-a-date", "12:00").unwrap_err();
        assert!(matches!(err, CrystalPathError::ChartDerivation(_)));

        let err = derive_chart("2000-01-01", "25:99").unwrap_err();
        assert!(matches!(err, CrystalPathError::ChartDerivation(_)));
    }

    #[test]
    fn test_notation_format() {
        let chart = derive_chart("2000-01-01", "12:00").unwrap();
        let notation = chart.notation();
        let parts: Vec<&str> = notation.split(' ').collect();
        assert_eq!(parts.len(), 4);
        for part in parts {
            assert_eq!(part.chars().count(), 2);
        }
    }
}

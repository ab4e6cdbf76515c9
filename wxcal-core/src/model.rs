use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Subset of a weather.gov `/gridpoints/{wfo}/{x},{y}/forecast` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub properties: ForecastProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastProperties {
    /// Last forecast update. Some API versions call it `updateTime`; absent in others.
    #[serde(default, alias = "updateTime")]
    pub updated: Option<DateTime<FixedOffset>>,
    pub periods: Vec<RawPeriod>,
}

impl ForecastResponse {
    pub fn updated(&self) -> Option<DateTime<FixedOffset>> {
        self.properties.updated
    }

    pub fn periods(&self) -> &[RawPeriod] {
        &self.properties.periods
    }
}

/// One forecast period exactly as the upstream API describes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPeriod {
    pub number: u32,
    pub name: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub is_daytime: bool,
    /// Usually a JSON integer, occasionally a string or null.
    pub temperature: serde_json::Value,
    pub temperature_unit: String,
    #[serde(default)]
    pub wind_speed: Option<String>,
    #[serde(default)]
    pub wind_direction: Option<String>,
    pub short_forecast: String,
    pub detailed_forecast: String,
}

/// The part of a period that ends up on the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastPeriod {
    pub name: String,
    pub short_forecast: String,
    pub detailed_forecast: String,
    pub temperature: i32,
    pub temperature_unit: String,
}

/// A forecast period with the timing information needed to place it on a date.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPeriod {
    pub number: u32,
    pub start: DateTime<FixedOffset>,
    pub is_daytime: bool,
    pub period: ForecastPeriod,
}

impl NormalizedPeriod {
    /// Local calendar date of the period start, in the start's own offset.
    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn utc_offset_hours(&self) -> f64 {
        f64::from(self.start.offset().local_minus_utc()) / 3600.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SunTimes {
    pub sunrise: DateTime<FixedOffset>,
    pub sunset: DateTime<FixedOffset>,
}

/// Everything known about a single calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct DayAggregate {
    pub date: NaiveDate,
    pub utc_offset: FixedOffset,
    pub daytime: Option<ForecastPeriod>,
    pub nighttime: Option<ForecastPeriod>,
    /// `None` until a sunrise/sunset computation for this date succeeds.
    pub sun_times: Option<SunTimes>,
}

impl DayAggregate {
    pub fn new(date: NaiveDate, utc_offset: FixedOffset) -> Self {
        Self {
            date,
            utc_offset,
            daytime: None,
            nighttime: None,
            sun_times: None,
        }
    }
}

/// Day aggregates in first-insertion (chronological) order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastCalendar {
    days: Vec<DayAggregate>,
}

impl ForecastCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the aggregate for `date`, compared by calendar date only.
    pub fn index_for_date(&self, date: NaiveDate) -> Option<usize> {
        self.days.iter().position(|d| d.date == date)
    }

    pub fn push(&mut self, day: DayAggregate) -> usize {
        self.days.push(day);
        self.days.len() - 1
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut DayAggregate> {
        self.days.get_mut(index)
    }

    pub fn days(&self) -> &[DayAggregate] {
        &self.days
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DayAggregate> {
        self.days.iter()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl<'a> IntoIterator for &'a ForecastCalendar {
    type Item = &'a DayAggregate;
    type IntoIter = std::slice::Iter<'a, DayAggregate>;

    fn into_iter(self) -> Self::IntoIter {
        self.days.iter()
    }
}

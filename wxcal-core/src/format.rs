//! Human-readable text for periods and days.

use chrono::{DateTime, Duration, FixedOffset};

use crate::model::{DayAggregate, ForecastPeriod};

impl ForecastPeriod {
    /// Brief, less-than-one-line summary, e.g. `72ºF Chance Showers; Fog`.
    pub fn summary_line(&self) -> String {
        let text = self
            .short_forecast
            .replace("Slight ", "")
            .replace(" then ", "; ")
            .replace("Areas Of ", "");
        format!("{}º{} {}", self.temperature, self.temperature_unit, text)
    }
}

fn period_summary(period: Option<&ForecastPeriod>) -> String {
    period.map(ForecastPeriod::summary_line).unwrap_or_default()
}

impl DayAggregate {
    /// One-line summary of the day's forecast.
    pub fn summary_line(&self) -> String {
        let day = period_summary(self.daytime.as_ref());
        let night = period_summary(self.nighttime.as_ref());

        match (&self.nighttime, day.is_empty(), night.is_empty()) {
            (_, false, false) => format!("{day} | {night}"),
            (Some(n), true, false) => format!("{}: {night}", n.name),
            _ => day,
        }
    }

    /// Longer description combining the daytime and overnight forecasts.
    pub fn detailed_forecast(&self) -> String {
        match (&self.daytime, &self.nighttime) {
            (Some(d), Some(n)) => format!(
                "{}\n\nOvernight: {}",
                d.detailed_forecast, n.detailed_forecast
            ),
            (None, Some(n)) => format!("{}: {}", n.name, n.detailed_forecast),
            (Some(d), None) => d.detailed_forecast.clone(),
            (None, None) => String::new(),
        }
    }
}

/// `6:01:02 AM`
pub fn precise_time(t: &DateTime<FixedOffset>) -> String {
    t.format("%-I:%M:%S %p").to_string()
}

/// `6:01 AM`, rounded to the nearest minute.
pub fn rounded_time(t: &DateTime<FixedOffset>) -> String {
    (*t + Duration::seconds(30)).format("%-I:%M %p").to_string()
}

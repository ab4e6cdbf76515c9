//! Calendar documents built from a [`ForecastCalendar`].
//!
//! Two independent documents are produced: the daily weather forecast and an
//! optional sunrise/sunset calendar. Event ids are derived only from the date,
//! location, coordinates and domain, so regenerating a calendar from the same
//! inputs yields the same ids.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use icalendar::{Calendar, Component, Event, EventLike, Property};
use tracing::debug;

use crate::{
    config::CalendarConfig,
    format::{precise_time, rounded_time},
    model::{DayAggregate, ForecastCalendar, SunTimes},
};

pub const PRODUCT_NAME: &str = "wxcal";
pub const PRODUCT_VERSION: &str = env!("CARGO_PKG_VERSION");

const REFRESH_INTERVAL: &str = "PT1H";

/// `-//wxcal//<version>//EN`
pub fn product_id() -> String {
    format!("-//{PRODUCT_NAME}//{PRODUCT_VERSION}//EN")
}

/// Stable identifier for a calendar, e.g. `ann-arbor-mi{42.27,-83.74}@ical.example.com`.
pub fn calendar_id(location: &str, domain: &str, lat: f64, lon: f64) -> String {
    let location = location.replace(' ', "-").replace(',', "");
    format!(
        "{}{{{:.2},{:.2}}}@{}",
        location.to_lowercase(),
        lat,
        lon,
        domain.to_lowercase()
    )
}

pub fn event_uid(date: NaiveDate, calendar_id: &str) -> String {
    format!("{}-{}", date.format("%Y%m%d"), calendar_id)
}

/// Human-facing weather.gov page for the forecast point.
pub fn forecast_link(lat: f64, lon: f64) -> String {
    format!("https://forecast.weather.gov/MapClick.php?textField1={lat:.2}&textField2={lon:.2}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Publish,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Publish => "PUBLISH",
        }
    }
}

/// One all-day calendar entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub uid: String,
    pub dt_stamp: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub all_day_start: NaiveDate,
    pub all_day_end: NaiveDate,
    pub location: String,
    pub summary: String,
    pub description: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDocument {
    pub name: String,
    pub description: String,
    pub product_id: String,
    pub method: Method,
    pub refresh_interval: String,
    pub last_modified: DateTime<Utc>,
    pub events: Vec<CalendarEvent>,
}

/// Builds both calendar documents for one run.
///
/// `now` is read once by the caller and stamped on every event, so all
/// events from a run share an identical DTSTAMP.
#[derive(Debug, Clone)]
pub struct CalendarBuilder<'a> {
    config: &'a CalendarConfig,
    now: DateTime<Utc>,
}

impl<'a> CalendarBuilder<'a> {
    pub fn new(config: &'a CalendarConfig, now: DateTime<Utc>) -> Self {
        Self { config, now }
    }

    pub fn weather_calendar_id(&self) -> String {
        calendar_id(
            &self.config.location,
            &self.config.domain,
            self.config.latitude,
            self.config.longitude,
        )
    }

    pub fn sun_calendar_id(&self) -> String {
        calendar_id(
            &format!("{}-Sun", self.config.location),
            &self.config.domain,
            self.config.latitude,
            self.config.longitude,
        )
    }

    /// Weather forecast document; `updated` is the source's last update time.
    pub fn weather_document(
        &self,
        forecast: &ForecastCalendar,
        updated: DateTime<Utc>,
    ) -> CalendarDocument {
        let cal_id = self.weather_calendar_id();
        let link = forecast_link(self.config.latitude, self.config.longitude);
        let location = &self.config.location;

        let events = forecast
            .iter()
            .map(|day| CalendarEvent {
                uid: event_uid(day.date, &cal_id),
                dt_stamp: self.now,
                last_modified: updated,
                all_day_start: day.date,
                all_day_end: day.date,
                location: location.clone(),
                summary: self.with_prefix(day.summary_line()),
                description: weather_description(day, &link),
                url: Some(link.clone()),
            })
            .collect();

        CalendarDocument {
            name: format!("{location} Weather"),
            description: format!(
                "Weather forecast for the next week in {location}, provided by weather.gov."
            ),
            product_id: product_id(),
            method: Method::Publish,
            refresh_interval: REFRESH_INTERVAL.to_string(),
            last_modified: updated,
            events,
        }
    }

    /// Sunrise/sunset document. Dates whose sun times could not be computed are left out.
    pub fn sun_document(&self, forecast: &ForecastCalendar) -> CalendarDocument {
        let cal_id = self.sun_calendar_id();
        let location = &self.config.location;

        let events = forecast
            .iter()
            .filter_map(|day| {
                let Some(times) = day.sun_times else {
                    debug!(date = %day.date, "no sun times; skipping sunrise/sunset event");
                    return None;
                };
                Some(CalendarEvent {
                    uid: event_uid(day.date, &cal_id),
                    dt_stamp: self.now,
                    last_modified: self.now,
                    all_day_start: day.date,
                    all_day_end: day.date,
                    location: location.clone(),
                    summary: self.with_prefix(sun_summary(&times, day.utc_offset)),
                    description: sun_lines(&times, day.utc_offset),
                    url: None,
                })
            })
            .collect();

        CalendarDocument {
            name: format!("{location} Sunrise/Sunset"),
            description: format!("Sunrise and sunset times for {location}."),
            product_id: product_id(),
            method: Method::Publish,
            refresh_interval: REFRESH_INTERVAL.to_string(),
            last_modified: self.now,
            events,
        }
    }

    fn with_prefix(&self, summary: String) -> String {
        match self.config.title_prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => format!("{prefix} {summary}"),
            _ => summary,
        }
    }
}

// Sun times are shown in the day's own offset, whatever offset the provider returned.
fn sun_summary(times: &SunTimes, offset: FixedOffset) -> String {
    format!(
        "☼ ↑ {} | ↓ {}",
        rounded_time(&times.sunrise.with_timezone(&offset)),
        rounded_time(&times.sunset.with_timezone(&offset))
    )
}

fn sun_lines(times: &SunTimes, offset: FixedOffset) -> String {
    format!(
        "Sunrise: {}\nSunset: {}",
        precise_time(&times.sunrise.with_timezone(&offset)),
        precise_time(&times.sunset.with_timezone(&offset))
    )
}

fn weather_description(day: &DayAggregate, link: &str) -> String {
    let mut description = day.detailed_forecast();
    if let Some(times) = &day.sun_times {
        description.push_str("\n\n");
        description.push_str(&sun_lines(times, day.utc_offset));
    }
    description.push_str("\n\nForecast Detail: ");
    description.push_str(link);
    description
}

/// RFC 5545 TEXT escaping, for properties `icalendar` does not type as TEXT.
fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

fn ical_timestamp(t: DateTime<Utc>) -> String {
    t.format("%Y%m%dT%H%M%SZ").to_string()
}

impl CalendarEvent {
    pub fn to_ical(&self) -> Event {
        let mut event = Event::new();
        event
            .uid(&self.uid)
            .timestamp(self.dt_stamp)
            .add_property("LAST-MODIFIED", ical_timestamp(self.last_modified).as_str())
            .starts(self.all_day_start)
            .ends(self.all_day_end)
            .location(&self.location)
            .summary(&self.summary)
            .description(&self.description);
        if let Some(url) = &self.url {
            event.add_property("URL", url.as_str());
        }
        event.done()
    }
}

impl CalendarDocument {
    pub fn to_ical(&self) -> Calendar {
        let mut calendar = Calendar::empty();
        let name = escape_text(&self.name);
        let description = escape_text(&self.description);
        for (key, value) in [
            ("VERSION", "2.0"),
            ("PRODID", self.product_id.as_str()),
            ("CALSCALE", "GREGORIAN"),
            ("METHOD", self.method.as_str()),
            ("NAME", name.as_str()),
            ("X-WR-CALNAME", name.as_str()),
            ("DESCRIPTION", self.description.as_str()),
            ("X-WR-CALDESC", description.as_str()),
            ("X-PUBLISHED-TTL", self.refresh_interval.as_str()),
        ] {
            calendar.append_property(Property::new(key, value));
        }
        calendar.append_property(
            Property::new("REFRESH-INTERVAL", self.refresh_interval.as_str())
                .add_parameter("VALUE", "DURATION")
                .done(),
        );
        calendar.append_property(Property::new(
            "LAST-MODIFIED",
            ical_timestamp(self.last_modified).as_str(),
        ));

        for event in &self.events {
            calendar.push(event.to_ical());
        }
        calendar.done()
    }
}

impl fmt::Display for CalendarDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ical())
    }
}

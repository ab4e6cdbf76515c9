use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use sunrise::{Coordinates, SolarDay, SolarEvent};

use crate::{error::SunTimeError, model::SunTimes};

/// Source of sunrise/sunset times for a date at a location.
pub trait SunTimeProvider {
    /// `utc_offset_hours` selects the offset the returned instants are expressed in.
    fn sun_times(
        &self,
        lat: f64,
        lon: f64,
        date: NaiveDate,
        utc_offset_hours: f64,
    ) -> Result<SunTimes, SunTimeError>;
}

/// Computes sun times astronomically with the `sunrise` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolarSunTimes;

impl SunTimeProvider for SolarSunTimes {
    fn sun_times(
        &self,
        lat: f64,
        lon: f64,
        date: NaiveDate,
        utc_offset_hours: f64,
    ) -> Result<SunTimes, SunTimeError> {
        let offset = offset_from_hours(utc_offset_hours)?;
        let coordinates =
            Coordinates::new(lat, lon).ok_or(SunTimeError::InvalidCoordinates { lat, lon })?;
        let day = SolarDay::new(coordinates, date);

        let sunrise = day
            .event_time(SolarEvent::Sunrise)
            .ok_or(SunTimeError::NoEvent { event: "rise", date })?;
        let sunset = day
            .event_time(SolarEvent::Sunset)
            .ok_or(SunTimeError::NoEvent { event: "set", date })?;

        Ok(SunTimes {
            sunrise: in_offset(sunrise, offset),
            sunset: in_offset(sunset, offset),
        })
    }
}

fn offset_from_hours(hours: f64) -> Result<FixedOffset, SunTimeError> {
    if !hours.is_finite() {
        return Err(SunTimeError::InvalidOffset(hours));
    }
    #[allow(clippy::cast_possible_truncation)]
    let seconds = (hours * 3600.0).round() as i32;
    FixedOffset::east_opt(seconds).ok_or(SunTimeError::InvalidOffset(hours))
}

fn in_offset(instant: DateTime<Utc>, offset: FixedOffset) -> DateTime<FixedOffset> {
    instant.with_timezone(&offset)
}

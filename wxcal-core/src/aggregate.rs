use tracing::{debug, warn};

use crate::{
    model::{DayAggregate, ForecastCalendar, NormalizedPeriod},
    sun::SunTimeProvider,
};

/// Fold chronologically ordered periods into one aggregate per calendar date.
///
/// Sun times are looked up for a date until one lookup succeeds; failures are
/// logged and retried by the next period that lands on the same date.
pub fn aggregate_periods<P>(
    periods: impl IntoIterator<Item = NormalizedPeriod>,
    lat: f64,
    lon: f64,
    sun: &P,
) -> ForecastCalendar
where
    P: SunTimeProvider + ?Sized,
{
    let mut calendar = ForecastCalendar::new();

    for period in periods {
        let date = period.date();
        let offset_hours = period.utc_offset_hours();

        let index = match calendar.index_for_date(date) {
            Some(i) => i,
            None => calendar.push(DayAggregate::new(date, *period.start.offset())),
        };
        let Some(day) = calendar.get_mut(index) else {
            continue;
        };

        debug!(
            number = period.number,
            name = %period.period.name,
            %date,
            daytime = period.is_daytime,
            "aggregating forecast period"
        );

        if period.is_daytime {
            day.daytime = Some(period.period);
        } else {
            day.nighttime = Some(period.period);
        }

        if day.sun_times.is_none() {
            match sun.sun_times(lat, lon, date, offset_hours) {
                Ok(times) => day.sun_times = Some(times),
                Err(err) => warn!(%date, error = %err, "failed to compute sunrise/sunset"),
            }
        }
    }

    calendar
}

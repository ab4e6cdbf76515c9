//! Fetch → normalize → aggregate → build → write.

use std::{fs, path::Path};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
    aggregate::aggregate_periods,
    calendar::{CalendarBuilder, CalendarDocument},
    config::CalendarConfig,
    error::WxCalError,
    model::ForecastCalendar,
    normalize::normalize_periods,
    provider::ForecastSource,
    retry::{RetryPolicy, retry},
    sun::SunTimeProvider,
};

/// Documents produced by one run, before they are written anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedCalendars {
    pub forecast: ForecastCalendar,
    pub weather: CalendarDocument,
    pub sun: Option<CalendarDocument>,
}

/// Fetch the forecast and build every requested calendar document.
///
/// `now` is the run's single clock reading; it becomes every event's DTSTAMP, and
/// stands in for the forecast's update time when the source omits one.
pub async fn generate<S, P>(
    config: &CalendarConfig,
    source: &S,
    sun: &P,
    retry_policy: &RetryPolicy,
    now: DateTime<Utc>,
) -> Result<GeneratedCalendars, WxCalError>
where
    S: ForecastSource + ?Sized,
    P: SunTimeProvider + ?Sized,
{
    let response = retry(retry_policy, || {
        source.get_forecast(config.latitude, config.longitude)
    })
    .await
    .map_err(WxCalError::Fetch)?;

    let periods = normalize_periods(response.periods())?;
    debug!(count = periods.len(), "normalized forecast periods");

    let forecast = aggregate_periods(periods, config.latitude, config.longitude, sun);
    debug!(days = forecast.len(), "aggregated forecast days");

    let updated = match response.updated() {
        Some(updated) => updated.with_timezone(&Utc),
        None => {
            debug!("forecast has no update time; using run time");
            now
        }
    };

    let builder = CalendarBuilder::new(config, now);
    let weather = builder.weather_document(&forecast, updated);
    let sun = config
        .sun_output
        .as_ref()
        .map(|_| builder.sun_document(&forecast));

    Ok(GeneratedCalendars {
        forecast,
        weather,
        sun,
    })
}

/// Write the generated documents to the configured paths.
///
/// The weather calendar is written first; if the sunrise/sunset write then fails,
/// the weather file stays in place.
pub fn write_calendars(
    config: &CalendarConfig,
    calendars: &GeneratedCalendars,
) -> Result<(), WxCalError> {
    write_document(&config.weather_output, &calendars.weather)?;
    if let (Some(path), Some(doc)) = (&config.sun_output, &calendars.sun) {
        write_document(path, doc)?;
    }
    Ok(())
}

/// Run the whole pipeline once.
pub async fn run<S, P>(
    config: &CalendarConfig,
    source: &S,
    sun: &P,
    retry_policy: &RetryPolicy,
    now: DateTime<Utc>,
) -> Result<GeneratedCalendars, WxCalError>
where
    S: ForecastSource + ?Sized,
    P: SunTimeProvider + ?Sized,
{
    let calendars = generate(config, source, sun, retry_policy, now).await?;
    write_calendars(config, &calendars)?;
    Ok(calendars)
}

fn write_document(path: &Path, doc: &CalendarDocument) -> Result<(), WxCalError> {
    fs::write(path, doc.to_string()).map_err(|source| WxCalError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), events = doc.events.len(), "wrote calendar");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{FetchError, SunTimeError},
        model::{ForecastResponse, SunTimes},
    };
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, FixedOffset, NaiveDate, TimeZone};
    use serde_json::json;
    use std::{
        path::PathBuf,
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    /// Serves a canned response, optionally failing the first `failures` calls.
    #[derive(Debug)]
    struct CannedSource {
        body: serde_json::Value,
        failures: u32,
        calls: AtomicU32,
    }

    impl CannedSource {
        fn new(body: serde_json::Value) -> Self {
            Self {
                body,
                failures: 0,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ForecastSource for CannedSource {
        async fn get_forecast(&self, _lat: f64, _lon: f64) -> Result<ForecastResponse, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(FetchError::Status {
                    url: "https://api.weather.gov/points".to_string(),
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                    body: String::new(),
                });
            }
            Ok(serde_json::from_value(self.body.clone()).expect("valid canned forecast"))
        }
    }

    struct FixedSun;

    impl SunTimeProvider for FixedSun {
        fn sun_times(
            &self,
            _lat: f64,
            _lon: f64,
            date: NaiveDate,
            utc_offset_hours: f64,
        ) -> Result<SunTimes, SunTimeError> {
            #[allow(clippy::cast_possible_truncation)]
            let offset = FixedOffset::east_opt((utc_offset_hours * 3600.0) as i32).unwrap();
            let sunrise = offset
                .from_local_datetime(&date.and_hms_opt(6, 2, 3).unwrap())
                .unwrap();
            Ok(SunTimes {
                sunrise,
                sunset: sunrise + ChronoDuration::hours(15),
            })
        }
    }

    fn body(temperature: serde_json::Value) -> serde_json::Value {
        json!({
            "properties": {
                "updated": "2024-06-01T10:30:00+00:00",
                "periods": [
                    {
                        "number": 1,
                        "name": "Today",
                        "startTime": "2024-06-01T06:00:00-04:00",
                        "endTime": "2024-06-01T18:00:00-04:00",
                        "isDaytime": true,
                        "temperature": 75,
                        "temperatureUnit": "F",
                        "shortForecast": "Sunny",
                        "detailedForecast": "Sunny, with a high near 75."
                    },
                    {
                        "number": 2,
                        "name": "Tonight",
                        "startTime": "2024-06-01T18:00:00-04:00",
                        "endTime": "2024-06-02T06:00:00-04:00",
                        "isDaytime": false,
                        "temperature": temperature,
                        "temperatureUnit": "F",
                        "shortForecast": "Slight Chance Showers",
                        "detailedForecast": "A slight chance of showers."
                    }
                ]
            }
        })
    }

    fn config(dir: &Path, with_sun: bool) -> CalendarConfig {
        CalendarConfig {
            location: "Ann Arbor, MI".to_string(),
            domain: "ical.example.com".to_string(),
            title_prefix: None,
            latitude: 42.27,
            longitude: -83.74,
            weather_output: dir.join("weather.ics"),
            sun_output: with_sun.then(|| dir.join("sun.ics")),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn no_wait() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn end_to_end_single_day() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), false);
        let source = CannedSource::new(body(json!(60)));

        let out = run(&cfg, &source, &FixedSun, &no_wait(), now())
            .await
            .expect("pipeline should succeed");

        assert_eq!(out.forecast.len(), 1);
        assert_eq!(out.forecast.days()[0].summary_line(), "75ºF Sunny | 60ºF Chance Showers");
        assert_eq!(out.weather.events.len(), 1);

        let event = &out.weather.events[0];
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(event.all_day_start, date);
        assert_eq!(event.all_day_end, date);
        assert!(event.uid.starts_with("20240601-"));
        assert_eq!(
            event.last_modified,
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 30, 0).unwrap()
        );

        let written = fs::read_to_string(&cfg.weather_output).unwrap();
        assert!(written.contains("BEGIN:VEVENT"));
        assert!(out.sun.is_none());
        assert!(!dir.path().join("sun.ics").exists());
    }

    #[tokio::test]
    async fn sun_calendar_written_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), true);
        let source = CannedSource::new(body(json!(60)));

        let out = run(&cfg, &source, &FixedSun, &no_wait(), now()).await.unwrap();

        let sun = out.sun.expect("sun document requested");
        assert_eq!(sun.events.len(), 1);
        assert_eq!(sun.events[0].summary, "☼ ↑ 6:02 AM | ↓ 9:02 PM");
        assert!(dir.path().join("sun.ics").exists());
    }

    #[tokio::test]
    async fn missing_update_time_falls_back_to_run_time() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), false);
        let mut forecast = body(json!(60));
        forecast["properties"]
            .as_object_mut()
            .unwrap()
            .remove("updated");
        let source = CannedSource::new(forecast);

        let out = run(&cfg, &source, &FixedSun, &no_wait(), now())
            .await
            .expect("missing update time should not be fatal");

        assert_eq!(out.weather.last_modified, now());
        assert!(out.weather.events.iter().all(|e| e.last_modified == now()));
    }

    #[tokio::test]
    async fn fetch_is_retried_then_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), false);
        let source = CannedSource {
            failures: 2,
            ..CannedSource::new(body(json!(60)))
        };

        run(&cfg, &source, &FixedSun, &no_wait(), now()).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fetch_failure_after_retries_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), false);
        let source = CannedSource {
            failures: u32::MAX,
            ..CannedSource::new(body(json!(60)))
        };

        let err = run(&cfg, &source, &FixedSun, &no_wait(), now()).await.unwrap_err();
        assert!(matches!(err, WxCalError::Fetch(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert!(!cfg.weather_output.exists());
    }

    #[tokio::test]
    async fn bad_temperature_aborts_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), true);
        let source = CannedSource::new(body(json!("sixty")));

        let err = run(&cfg, &source, &FixedSun, &no_wait(), now()).await.unwrap_err();
        assert!(matches!(err, WxCalError::Normalize(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(!cfg.weather_output.exists());
    }

    #[tokio::test]
    async fn write_failure_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), false);
        cfg.weather_output = PathBuf::from(dir.path()).join("missing").join("weather.ics");
        let source = CannedSource::new(body(json!(60)));

        let err = run(&cfg, &source, &FixedSun, &no_wait(), now()).await.unwrap_err();
        assert!(matches!(err, WxCalError::Write { .. }));
        assert!(err.to_string().contains("weather.ics"));
    }

    #[tokio::test]
    async fn identical_inputs_give_identical_output() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), true);
        let source = CannedSource::new(body(json!(60)));

        let a = generate(&cfg, &source, &FixedSun, &no_wait(), now()).await.unwrap();
        let b = generate(&cfg, &source, &FixedSun, &no_wait(), now()).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.weather.to_string(), b.weather.to_string());
    }
}

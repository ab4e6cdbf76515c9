//! Core library for the `wxcal` CLI.
//!
//! This crate defines:
//! - Forecast retrieval from weather.gov, behind the [`ForecastSource`] trait
//! - Folding day/night forecast periods into one record per date
//! - Sunrise/sunset lookup, behind the [`SunTimeProvider`] trait
//! - Building and serializing the weather and sunrise/sunset calendars
//!
//! It is used by `wxcal-cli`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod provider;
pub mod retry;
pub mod sun;

pub use calendar::{CalendarBuilder, CalendarDocument, CalendarEvent};
pub use config::{CalendarConfig, ClientOptions, Config};
pub use error::{FetchError, NormalizeError, SunTimeError, WxCalError};
pub use model::{DayAggregate, ForecastCalendar, ForecastPeriod, ForecastResponse, SunTimes};
pub use pipeline::{GeneratedCalendars, generate, run, write_calendars};
pub use provider::{ForecastSource, WeatherGovClient};
pub use retry::RetryPolicy;
pub use sun::{SolarSunTimes, SunTimeProvider};

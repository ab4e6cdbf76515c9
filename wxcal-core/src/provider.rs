use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::FetchError, model::ForecastResponse};

pub mod weathergov;

pub use weathergov::WeatherGovClient;

/// Anything that can produce a day/night period forecast for a point.
#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    async fn get_forecast(&self, lat: f64, lon: f64) -> Result<ForecastResponse, FetchError>;
}

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use serde::{Deserialize, de::DeserializeOwned};
use std::net::{IpAddr, Ipv4Addr};
use tracing::{debug, instrument};

use crate::{
    calendar::{PRODUCT_NAME, PRODUCT_VERSION},
    config::ClientOptions,
    error::FetchError,
    model::ForecastResponse,
};

use super::ForecastSource;

const GEO_JSON: &str = "application/geo+json";

/// Client for the subset of <https://www.weather.gov/documentation/services-web-api> we need.
#[derive(Debug, Clone)]
pub struct WeatherGovClient {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: PointsProperties,
}

#[derive(Debug, Deserialize)]
struct PointsProperties {
    forecast: String,
}

impl WeatherGovClient {
    pub fn new(options: &ClientOptions) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GEO_JSON));

        let mut builder = Client::builder()
            .timeout(options.timeout())
            .user_agent(user_agent(options.contact_email.as_deref()))
            .default_headers(headers);
        if options.force_ipv4 {
            // Binding to the IPv4 wildcard keeps the connector off IPv6 routes.
            builder = builder.local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        }

        Ok(Self {
            base_url: options.base_url.trim_end_matches('/').to_string(),
            http: builder.build().map_err(FetchError::ClientBuild)?,
        })
    }

    fn points_url(&self, lat: f64, lon: f64) -> String {
        format!("{}/points/{lat:.2},{lon:.2}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!(url, "GET");
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            body: truncate_body(&body),
            source,
        })
    }
}

#[async_trait]
impl ForecastSource for WeatherGovClient {
    #[instrument(skip(self))]
    async fn get_forecast(&self, lat: f64, lon: f64) -> Result<ForecastResponse, FetchError> {
        let points: PointsResponse = self.get_json(&self.points_url(lat, lon)).await?;
        let forecast: ForecastResponse = self.get_json(&points.properties.forecast).await?;
        debug!(
            periods = forecast.periods().len(),
            updated = ?forecast.updated(),
            "fetched forecast"
        );
        Ok(forecast)
    }
}

/// `wxcal/<version>`, plus a contact address when one is configured.
pub fn user_agent(contact_email: Option<&str>) -> String {
    match contact_email {
        Some(email) if !email.is_empty() => {
            format!("{PRODUCT_NAME}/{PRODUCT_VERSION} (contact: {email})")
        }
        _ => format!("{PRODUCT_NAME}/{PRODUCT_VERSION}"),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

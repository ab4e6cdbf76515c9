use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use wxcal_core::{CalendarConfig, Config, SolarSunTimes, WeatherGovClient, pipeline};

/// Generate iCalendar feeds of the weather.gov forecast for a location.
#[derive(Debug, Parser)]
#[command(name = "wxcal", version, about)]
pub struct Cli {
    /// The name of the calendar's location (eg. "Ann Arbor, MI").
    #[arg(long)]
    pub cal_location: String,

    /// The calendar's domain (eg. "ical.example.com").
    #[arg(long)]
    pub cal_domain: String,

    /// An optional prefix to be inserted before each event's title.
    #[arg(long)]
    pub evt_title_prefix: Option<String>,

    /// The forecast location's latitude.
    #[arg(long, default_value_t = 42.27, allow_negative_numbers = true)]
    pub lat: f64,

    /// The forecast location's longitude.
    #[arg(long, default_value_t = -83.74, allow_negative_numbers = true)]
    pub lon: f64,

    /// Path for the weather forecast iCal file.
    #[arg(long)]
    pub ical_file: PathBuf,

    /// Path for the sunrise/sunset iCal file; omitted if not given.
    #[arg(long)]
    pub sun_ical_file: Option<PathBuf>,

    /// Contact email to include in the User-Agent sent to weather.gov.
    #[arg(long)]
    pub ua_email: Option<String>,

    /// Only connect to weather.gov over IPv4.
    #[arg(long)]
    pub force_ipv4: bool,

    /// Config file to use instead of the platform default.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn calendar_config(&self) -> CalendarConfig {
        CalendarConfig {
            location: self.cal_location.clone(),
            domain: self.cal_domain.clone(),
            title_prefix: self.evt_title_prefix.clone(),
            latitude: self.lat,
            longitude: self.lon,
            weather_output: self.ical_file.clone(),
            sun_output: self.sun_ical_file.clone(),
        }
    }

    /// Load the config file and apply flag overrides on top.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        if let Some(email) = &self.ua_email {
            config.client.contact_email = Some(email.clone());
        }
        if self.force_ipv4 {
            config.client.force_ipv4 = true;
        }
        Ok(config)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.load_config().context("Failed to load configuration")?;
        let calendar = self.calendar_config();

        let client =
            WeatherGovClient::new(&config.client).context("Failed to set up weather.gov client")?;

        let now = Utc::now();
        let out = pipeline::run(
            &calendar,
            &client,
            &SolarSunTimes,
            &config.retry_policy(),
            now,
        )
        .await?;

        info!(
            days = out.forecast.len(),
            location = %calendar.location,
            "calendar generation complete"
        );
        Ok(())
    }
}

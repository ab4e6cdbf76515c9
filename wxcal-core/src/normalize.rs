use serde_json::Value;

use crate::{
    error::NormalizeError,
    model::{ForecastPeriod, NormalizedPeriod, RawPeriod},
};

/// Convert a raw upstream period into its typed form.
///
/// Only the temperature is validated; text fields are carried over as-is.
pub fn normalize_period(raw: &RawPeriod) -> Result<NormalizedPeriod, NormalizeError> {
    let temperature = coerce_temperature(&raw.temperature).ok_or_else(|| {
        NormalizeError::Temperature {
            period: raw.name.clone(),
            value: raw.temperature.to_string(),
        }
    })?;

    Ok(NormalizedPeriod {
        number: raw.number,
        start: raw.start_time,
        is_daytime: raw.is_daytime,
        period: ForecastPeriod {
            name: raw.name.clone(),
            short_forecast: raw.short_forecast.clone(),
            detailed_forecast: raw.detailed_forecast.clone(),
            temperature,
            temperature_unit: raw.temperature_unit.clone(),
        },
    })
}

/// Normalize every period, stopping at the first one that can't be coerced.
pub fn normalize_periods(raw: &[RawPeriod]) -> Result<Vec<NormalizedPeriod>, NormalizeError> {
    raw.iter().map(normalize_period).collect()
}

fn coerce_temperature(value: &Value) -> Option<i32> {
    let wide = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    i32::try_from(wide).ok()
}

use chrono::NaiveDate;
use log::{debug, warn};
use serde_json::{Map, Value};

use crate::error::FetchError;
use crate::series::{PriceBar, PriceSeries, Symbol};

use super::FetchResult;

const TIME_SERIES_PREFIX: &str = "Time Series";
const RATE_LIMIT_NOTE: &str = "Note";
const RATE_LIMIT_INFORMATION: &str = "Information";
const ERROR_MESSAGE: &str = "Error Message";

const UNKNOWN_PRICE_PAYLOAD: &str = "Unknown error occurred while fetching data.";

/// Turn a daily time-series response body into a [`PriceSeries`].
///
/// Provider-signalled conditions map onto the error taxonomy; rows that fail
/// to parse are dropped with a warning instead of failing the whole payload.
pub fn decode_price_payload(symbol: &Symbol, body: &str) -> FetchResult<PriceSeries> {
    let root = parse_object(body)?;
    debug!("provider payload for {symbol}: {root:?}");

    let Some(rows) = find_time_series(&root) else {
        return Err(classify_provider_error(&root)
            .unwrap_or_else(|| FetchError::Transport(UNKNOWN_PRICE_PAYLOAD.to_string())));
    };

    let rows = rows.as_object().ok_or_else(|| {
        FetchError::Transport("time series payload is not a JSON object".to_string())
    })?;

    let mut bars = Vec::with_capacity(rows.len());
    for (date, fields) in rows {
        match parse_row(date, fields) {
            Ok(bar) => bars.push(bar),
            Err(reason) => warn!("dropping {symbol} row `{date}`: {reason}"),
        }
    }

    if bars.is_empty() {
        return Err(FetchError::Transport(format!(
            "no usable rows in time series for {symbol}"
        )));
    }

    Ok(PriceSeries::new(symbol.clone(), bars))
}

/// Parse a body that must be a JSON object; anything else is a transport-level fault.
pub(crate) fn parse_object(body: &str) -> FetchResult<Map<String, Value>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::Transport(format!("malformed provider payload: {e}")))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(FetchError::Transport(format!(
            "expected a JSON object from provider, got {}",
            json_kind(&other)
        ))),
    }
}

/// Map the provider's signalling keys onto the error taxonomy, if present.
pub(crate) fn classify_provider_error(root: &Map<String, Value>) -> Option<FetchError> {
    if let Some(note) = root.get(RATE_LIMIT_NOTE) {
        warn!("provider rate limit: {}", value_to_string(note));
        return Some(FetchError::RateLimited(value_to_string(note)));
    }
    if let Some(info) = root.get(RATE_LIMIT_INFORMATION) {
        warn!("provider rate limit: {}", value_to_string(info));
        return Some(FetchError::RateLimited(value_to_string(info)));
    }
    if let Some(message) = root.get(ERROR_MESSAGE) {
        warn!("provider rejected symbol: {}", value_to_string(message));
        return Some(FetchError::InvalidSymbol(value_to_string(message)));
    }
    None
}

fn find_time_series(root: &Map<String, Value>) -> Option<&Value> {
    root.iter()
        .find(|(key, _)| key.starts_with(TIME_SERIES_PREFIX))
        .map(|(_, value)| value)
}

fn parse_row(date: &str, fields: &Value) -> Result<PriceBar, String> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid date: {e}"))?;

    let fields = fields
        .as_object()
        .ok_or_else(|| "row is not a JSON object".to_string())?;

    let open = number_field(fields, "1. open")?;
    let high = number_field(fields, "2. high")?;
    let low = number_field(fields, "3. low")?;
    let close = number_field(fields, "4. close")?;

    // TIME_SERIES_DAILY has no adjusted close and puts volume at position 5.
    let adjusted_close = match fields.get("5. adjusted close") {
        Some(_) => number_field(fields, "5. adjusted close")?,
        None => close,
    };
    let volume = match fields.get("6. volume") {
        Some(value) => parse_volume(value)?,
        None => match fields.get("5. volume") {
            Some(value) => parse_volume(value)?,
            None => return Err("missing field `volume`".to_string()),
        },
    };

    PriceBar::new(date, open, high, low, close, adjusted_close, volume)
}

fn number_field(fields: &Map<String, Value>, key: &str) -> Result<f64, String> {
    let value = fields
        .get(key)
        .ok_or_else(|| format!("missing field `{key}`"))?;
    let number = json_number_to_f64(value).ok_or_else(|| format!("field `{key}` is not a number"))?;
    if number.is_finite() {
        Ok(number)
    } else {
        Err(format!("field `{key}` is not finite"))
    }
}

pub(crate) fn json_number_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(num) => num.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn parse_volume(value: &Value) -> Result<u64, String> {
    if let Some(volume) = value.as_u64() {
        return Ok(volume);
    }
    if let Some(volume) = value.as_str().and_then(|raw| raw.trim().parse::<u64>().ok()) {
        return Ok(volume);
    }
    match json_number_to_f64(value) {
        Some(volume) if volume.is_finite() && volume >= 0.0 && volume.fract() == 0.0 => {
            Ok(volume as u64)
        }
        _ => Err("field `volume` is not a non-negative integer".to_string()),
    }
}

pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

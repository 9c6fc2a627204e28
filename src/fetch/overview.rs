use serde::Deserialize;
use serde_json::Value;

use crate::error::FetchError;
use crate::series::Symbol;

use super::decode::{classify_provider_error, json_number_to_f64, parse_object};
use super::FetchResult;

const SYMBOL_KEY: &str = "Symbol";
const UNKNOWN_OVERVIEW_PAYLOAD: &str = "Unknown error occurred while fetching company overview.";

/// Company profile as returned by the provider's overview endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyOverview {
    pub symbol: Symbol,
    pub name: Option<String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub sector: Option<String>,
    pub market_capitalization: Option<u64>,
    pub dividend_yield: Option<f64>,
    pub address: Option<String>,
}

impl CompanyOverview {
    /// Company name, falling back to the ticker.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.symbol.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct RawOverview {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Description", default)]
    description: Option<String>,
    #[serde(rename = "Industry", default)]
    industry: Option<String>,
    #[serde(rename = "Sector", default)]
    sector: Option<String>,
    #[serde(rename = "MarketCapitalization", default)]
    market_capitalization: Option<Value>,
    #[serde(rename = "DividendYield", default)]
    dividend_yield: Option<Value>,
    #[serde(rename = "Address", default)]
    address: Option<String>,
}

/// Decode an overview body. An object carrying `Symbol` is a profile; the
/// provider answers `{}` for tickers it does not cover.
pub fn decode_overview_payload(requested: &Symbol, body: &str) -> FetchResult<CompanyOverview> {
    let root = parse_object(body)?;
    log::debug!("overview payload for {requested}: {root:?}");

    if !root.contains_key(SYMBOL_KEY) {
        return Err(classify_provider_error(&root)
            .unwrap_or_else(|| FetchError::Transport(UNKNOWN_OVERVIEW_PAYLOAD.to_string())));
    }

    let raw: RawOverview = serde_json::from_value(Value::Object(root))
        .map_err(|e| FetchError::Transport(format!("malformed company overview: {e}")))?;

    let symbol = Symbol::parse(&raw.symbol).unwrap_or_else(|_| requested.clone());

    Ok(CompanyOverview {
        symbol,
        name: clean_text(raw.name),
        description: clean_text(raw.description),
        industry: clean_text(raw.industry),
        sector: clean_text(raw.sector),
        market_capitalization: raw
            .market_capitalization
            .as_ref()
            .and_then(json_number_to_f64)
            .filter(|cap| cap.is_finite() && *cap >= 0.0)
            .map(|cap| cap as u64),
        dividend_yield: raw
            .dividend_yield
            .as_ref()
            .and_then(json_number_to_f64)
            .filter(|value| value.is_finite()),
        address: clean_text(raw.address),
    })
}

/// The provider spells a missing value as `"None"` or `"-"`.
fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty() && text != "None" && text != "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ibm() -> Symbol {
        Symbol::parse("IBM").unwrap()
    }

    #[test]
    fn decodes_profile_fields() {
        let body = r#"{
            "Symbol": "IBM",
            "Name": "International Business Machines",
            "Description": "IBM is an American multinational technology company.",
            "Industry": "COMPUTER & OFFICE EQUIPMENT",
            "Sector": "TECHNOLOGY",
            "MarketCapitalization": "173588611000",
            "DividendYield": "0.0392",
            "Address": "1 NEW ORCHARD ROAD, ARMONK, NY, US"
        }"#;

        let overview = decode_overview_payload(&ibm(), body).unwrap();

        assert_eq!(overview.display_name(), "International Business Machines");
        assert_eq!(overview.market_capitalization, Some(173_588_611_000));
        assert_eq!(overview.dividend_yield, Some(0.0392));
        assert_eq!(overview.sector.as_deref(), Some("TECHNOLOGY"));
    }

    #[test]
    fn missing_values_become_none() {
        let body = r#"{"Symbol": "XYZ", "Name": "None", "DividendYield": "None", "Address": "-"}"#;
        let overview = decode_overview_payload(&ibm(), body).unwrap();

        assert_eq!(overview.symbol.as_str(), "XYZ");
        assert_eq!(overview.display_name(), "XYZ");
        assert_eq!(overview.dividend_yield, None);
        assert_eq!(overview.address, None);
        assert_eq!(overview.description, None);
    }

    #[test]
    fn empty_object_is_unknown_payload() {
        assert_eq!(
            decode_overview_payload(&ibm(), "{}"),
            Err(FetchError::Transport(UNKNOWN_OVERVIEW_PAYLOAD.to_string()))
        );
    }

    #[test]
    fn rate_limit_and_error_message_are_classified() {
        assert!(matches!(
            decode_overview_payload(&ibm(), r#"{"Note": "slow down"}"#),
            Err(FetchError::RateLimited(_))
        ));
        assert!(matches!(
            decode_overview_payload(&ibm(), r#"{"Error Message": "bad"}"#),
            Err(FetchError::InvalidSymbol(_))
        ));
    }
}

use std::fmt::Write as _;

use unicode_width::UnicodeWidthStr;

use crate::error::FetchError;
use crate::fetch::CompanyOverview;
use crate::indicators::Indicator;
use crate::portfolio::Allocation;
use crate::series::{IndicatorSeries, PriceSeries};

use super::table::{Align, TextTable};

pub const STOCK_DATA: &str = "stock data";
pub const COMPANY_OVERVIEW: &str = "company overview";

const NOT_AVAILABLE: &str = "N/A";

/// User-facing text for a failed fetch, with the follow-up hint when the
/// error kind has one.
pub fn render_fetch_error(subject: &str, err: &FetchError) -> String {
    let mut out = format!("Error fetching {subject}: {}", err.message());
    if let Some(hint) = err.hint() {
        out.push('\n');
        out.push_str(hint);
    }
    out
}

pub fn render_overview(overview: &CompanyOverview) -> String {
    let heading = format!("{} ({})", overview.display_name(), overview.symbol);
    let underline = "=".repeat(UnicodeWidthStr::width(heading.as_str()));
    let description = overview
        .description
        .as_deref()
        .unwrap_or("No company description available.");
    let market_cap = overview
        .market_capitalization
        .map(|cap| format!("${}", group_thousands(cap)))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let dividend_yield = overview
        .dividend_yield
        .map(|y| format!("{:.2}%", y * 100.0))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    format!(
        "{heading}\n{underline}\n{description}\n\n\
         Industry:      {}\n\
         Sector:        {}\n\
         Market Cap:    {market_cap}\n\
         Dividend Yield: {dividend_yield}\n\
         Headquarters:  {}\n",
        or_na(overview.industry.as_deref()),
        or_na(overview.sector.as_deref()),
        or_na(overview.address.as_deref()),
    )
}

/// Last `rows` bars with the columns `indicator` produces. Price-scale
/// indicators are shown next to the close; oscillators stand alone.
pub fn render_technical(series: &PriceSeries, indicator: &Indicator, rows: usize) -> String {
    let columns: Vec<&IndicatorSeries> = indicator
        .column_names()
        .iter()
        .filter_map(|name| series.column(name))
        .collect();
    let with_close = indicator.overlays_price();

    let mut headers = vec!["Date"];
    if with_close {
        headers.push("Close");
    }
    headers.extend(columns.iter().map(|c| c.name()));
    let mut table = TextTable::new(headers);

    let start = series.len().saturating_sub(rows);
    for (idx, bar) in series.bars().iter().enumerate().skip(start) {
        let mut cells = vec![bar.date.format("%Y-%m-%d").to_string()];
        if with_close {
            cells.push(format_price(bar.close));
        }
        cells.extend(columns.iter().map(|column| {
            column
                .get(idx)
                .map(format_price)
                .unwrap_or_else(|| "-".to_string())
        }));
        table.push_row(cells);
    }

    let mut out = format!(
        "{} {} over {} daily bars\n",
        series.symbol(),
        indicator,
        series.len()
    );
    if let Some(latest) = series.latest() {
        out.push_str(&format!(
            "Latest close {} on {}\n",
            format_price(latest.close),
            latest.date.format("%Y-%m-%d")
        ));
    }
    out.push('\n');
    out.push_str(&table.render());
    out
}

/// Allocation table. `latest_closes` lines up with `allocations`; a `None`
/// price leaves the price and share columns blank.
pub fn render_allocations(allocations: &[Allocation], latest_closes: &[Option<f64>]) -> String {
    let mut table = TextTable::new(["Symbol", "Weight", "Amount", "Last Close", "Shares"]);
    for (idx, allocation) in allocations.iter().enumerate() {
        let price = latest_closes.get(idx).copied().flatten();
        table.push_row([
            allocation.symbol.to_string(),
            format!("{:.2}%", allocation.weight_pct),
            format!("${:.2}", allocation.amount),
            price.map(format_price).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            price
                .and_then(|p| allocation.shares_at(p))
                .map(|shares| format!("{shares:.0}"))
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }

    let total: f64 = allocations.iter().map(|a| a.amount).sum();
    let mut out = table.align(0, Align::Left).render();
    let _ = writeln!(out, "Total invested: ${total:.2}");
    out
}

fn format_price(value: f64) -> String {
    format!("{value:.2}")
}

fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or(NOT_AVAILABLE)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

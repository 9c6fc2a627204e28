//! CSV persistence for price series and their indicator columns.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use log::{info, warn};

use crate::error::{AppError, Context, Result};
use crate::series::{IndicatorSeries, PriceBar, PriceSeries, Symbol};

pub const BASE_COLUMNS: [&str; 7] = [
    "date",
    "open",
    "high",
    "low",
    "close",
    "adjusted_close",
    "volume",
];

/// Write `series` as CSV: the bar columns followed by one column per
/// indicator. Warm-up values are written as empty fields.
pub fn write_csv<W: Write>(series: &PriceSeries, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header: Vec<&str> = BASE_COLUMNS.to_vec();
    header.extend(series.columns().iter().map(IndicatorSeries::name));
    writer.write_record(&header)?;

    for (idx, bar) in series.bars().iter().enumerate() {
        let mut record = vec![
            bar.date.format("%Y-%m-%d").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.adjusted_close.to_string(),
            bar.volume.to_string(),
        ];
        record.extend(
            series
                .columns()
                .iter()
                .map(|column| column.get(idx).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Persist `series` to `path`, replacing any existing file.
pub fn export_csv<P: AsRef<Path>>(series: &PriceSeries, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
    write_csv(series, file)?;
    info!(
        "exported {} rows for {} to {}",
        series.len(),
        series.symbol(),
        path.display()
    );
    Ok(())
}

/// Read a series previously written by [`export_csv`]. Indicator columns are
/// restored as-is; rows with unusable bar fields are skipped.
pub fn read_csv<R: Read>(symbol: Symbol, input: R) -> Result<PriceSeries> {
    let mut reader = csv::Reader::from_reader(input);
    let headers = reader.headers()?.clone();

    for (idx, expected) in BASE_COLUMNS.iter().enumerate() {
        if headers.get(idx).map(str::trim) != Some(*expected) {
            return Err(AppError::message(format!(
                "CSV header must start with {}",
                BASE_COLUMNS.join(",")
            )));
        }
    }
    let indicator_names: Vec<String> = headers
        .iter()
        .skip(BASE_COLUMNS.len())
        .map(|name| name.trim().to_string())
        .collect();

    let mut rows: Vec<(PriceBar, Vec<Option<f64>>)> = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.context("Failed to read CSV record")?;
        let bar = match parse_bar(&record) {
            Ok(bar) => bar,
            Err(reason) => {
                warn!("skipping CSV row {}: {reason}", line + 2);
                continue;
            }
        };
        let values = (0..indicator_names.len())
            .map(|offset| {
                record
                    .get(BASE_COLUMNS.len() + offset)
                    .map(str::trim)
                    .filter(|raw| !raw.is_empty())
                    .and_then(|raw| raw.parse::<f64>().ok())
            })
            .collect();
        rows.push((bar, values));
    }

    // Keep indicator values aligned with bars after date sorting.
    rows.sort_by_key(|(bar, _)| bar.date);
    rows.dedup_by_key(|(bar, _)| bar.date);

    let bars: Vec<PriceBar> = rows.iter().map(|(bar, _)| *bar).collect();
    let mut series = PriceSeries::new(symbol, bars);
    for (offset, name) in indicator_names.iter().enumerate() {
        let values = rows.iter().map(|(_, values)| values[offset]).collect();
        series.push_column(IndicatorSeries::new(name.clone(), values))?;
    }
    Ok(series)
}

pub fn load_csv<P: AsRef<Path>>(path: P, symbol: Symbol) -> Result<PriceSeries> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open CSV file {}", path.display()))?;
    let series = read_csv(symbol, file)?;
    if series.is_empty() {
        return Err(AppError::message(format!(
            "CSV file {} contains no usable rows",
            path.display()
        )));
    }
    Ok(series)
}

fn parse_bar(record: &csv::StringRecord) -> std::result::Result<PriceBar, String> {
    let field = |idx: usize| {
        record
            .get(idx)
            .map(str::trim)
            .ok_or_else(|| format!("missing column `{}`", BASE_COLUMNS[idx]))
    };
    let number = |idx: usize| -> std::result::Result<f64, String> {
        field(idx)?
            .parse::<f64>()
            .map_err(|_| format!("column `{}` is not a number", BASE_COLUMNS[idx]))
    };

    let date = NaiveDate::parse_from_str(field(0)?, "%Y-%m-%d")
        .map_err(|e| format!("invalid date: {e}"))?;
    let volume = field(6)?
        .parse::<u64>()
        .map_err(|_| "column `volume` is not a non-negative integer".to_string())?;

    PriceBar::new(date, number(1)?, number(2)?, number(3)?, number(4)?, number(5)?, volume)
}

//! Ingestion: raw CSV text to typed, normalized records.
//!
//! - Header names are normalized (trimmed, lower-cased, whitespace collapsed to `_`)
//!   and known alias spellings are folded onto one canonical key.
//! - Dates go through a fixed priority list of formats; rows whose date matches
//!   none of them are dropped.
//! - Numbers tolerate currency symbols, whitespace and either separator convention.
//!   Anything non-finite becomes the missing sentinel; a cell is never an error.

use crate::error::{ChartError, Result};
use crate::models::{
    DumbbellRow, MISSING, RawRecord, RegionMetric, Series, SeriesPoint, Table, TypedPoint,
    date_to_timestamp, is_present,
};
use chrono::{DateTime, NaiveDate};
use csv::ReaderBuilder;
use log::debug;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const DATE_KEY: &str = "date";
pub const RATE_KEY: &str = "annual_rate";
pub const METRIC_KEY: &str = "metric";
pub const NAME_KEY: &str = "la_name";
pub const CODE_KEY: &str = "la_code";
pub const YEAR_KEY: &str = "year";

/// Alias spelling (already normalized) -> canonical key.
const HEADER_ALIASES: &[(&str, &str)] = &[
    ("month", DATE_KEY),
    ("period", DATE_KEY),
    ("rate", RATE_KEY),
    ("inflation_rate", RATE_KEY),
    ("borough", NAME_KEY),
    ("name", NAME_KEY),
    ("region_name", NAME_KEY),
    ("code", CODE_KEY),
    ("gss_code", CODE_KEY),
    ("borough_code", CODE_KEY),
    ("affordability_ratio", "affordability"),
    ("ratio", "affordability"),
    ("price", "house_price"),
    ("median_house_price", "house_price"),
    ("earnings", "workplace"),
    ("workplace_earnings", "workplace"),
];

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));
static CURRENCY_AND_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[£$€¥%\s\u{00A0}\u{200B}]").expect("static regex"));
static THOUSANDS_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").expect("static regex"));

/// Canonical column key for a raw header.
pub fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('\u{feff}').trim();
    let lowered = trimmed.to_lowercase();
    let key = WHITESPACE.replace_all(&lowered, "_").into_owned();
    HEADER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(key)
}

/// Parse a date cell using the fixed format priority list; `None` when nothing matches.
///
/// Order: `31/01/2020`, `Jan-20`, `Jan 2020`, `2020-01-31`, `2020-01`, then a generic
/// fallback (RFC 3339, `2020/01/31`, `31 January 2020`, `January 2020`, bare year).
/// Month-only formats resolve to the first day of the month.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%d/%m/%Y")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(&format!("01-{s}"), "%d-%b-%y").ok())
        .or_else(|| NaiveDate::parse_from_str(&format!("01 {s}"), "%d %b %Y").ok())
        .or_else(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .or_else(|| NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok())
        .or_else(|| parse_date_fallback(s))
}

fn parse_date_fallback(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y/%m/%d", "%d %B %Y", "%d %b %Y", "%B %d, %Y", "%b %d, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(&format!("01 {s}"), "%d %B %Y") {
        return Some(d);
    }
    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        return s
            .parse::<i32>()
            .ok()
            .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1));
    }
    None
}

/// Parse a numeric cell; returns [`MISSING`] for anything that is not a finite number.
///
/// Separator rules:
/// - both `,` and `.` present: the one appearing last is the decimal separator;
/// - only `,`: grouped thousands when it matches `d{1,3}(,ddd)+`, otherwise a decimal comma.
pub fn parse_number(raw: &str) -> f64 {
    let stripped = CURRENCY_AND_SPACE.replace_all(raw.trim(), "");
    let s = stripped.as_ref();
    if s.is_empty() {
        return MISSING;
    }
    let normalized = match (s.rfind(','), s.rfind('.')) {
        (Some(c), Some(d)) if c > d => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) if THOUSANDS_COMMA.is_match(s) => s.replace(',', ""),
        (Some(_), None) => s.replacen(',', ".", 1),
        _ => s.to_string(),
    };
    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => MISSING,
    }
}

/// Read CSV text into raw records, keeping header order. Header names are left raw.
pub fn read_records(text: &str) -> Result<Vec<RawRecord>> {
    let text = text.trim_start_matches('\u{feff}');
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let fields = headers
            .iter()
            .zip(rec.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        out.push(RawRecord::new(fields));
    }
    Ok(out)
}

/// Same record with every column name normalized.
fn normalized(rec: &RawRecord) -> RawRecord {
    RawRecord::new(
        rec.fields
            .iter()
            .map(|(k, v)| (normalize_header(k), v.clone()))
            .collect(),
    )
}

/// Row-oriented ingest of a time-series file.
///
/// Fails with [`ChartError::NoValidRows`] when zero rows survive date parsing.
pub fn parse_table(raw: &[RawRecord]) -> Result<Table> {
    let mut keys: Vec<String> = Vec::new();
    let mut rows: Vec<TypedPoint> = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;

    for rec in raw.iter().map(normalized) {
        for (k, _) in &rec.fields {
            if k != DATE_KEY && !k.is_empty() && !keys.contains(k) {
                keys.push(k.clone());
            }
        }
        let Some(date) = rec.get(DATE_KEY).and_then(parse_date) else {
            dropped += 1;
            continue;
        };
        let mut row = TypedPoint::new(date_to_timestamp(date));
        for (k, v) in &rec.fields {
            if k == DATE_KEY || k.is_empty() {
                continue;
            }
            row.fields.insert(k.clone(), parse_number(v));
        }
        rows.push(row);
    }

    if dropped > 0 {
        debug!("dropped {dropped} row(s) with unparsable dates");
    }
    if rows.is_empty() {
        return Err(ChartError::NoValidRows("time series".into()));
    }
    // Stable: rows sharing a timestamp keep source order.
    rows.sort_by_key(|r| r.timestamp);
    Ok(Table { keys, rows })
}

/// Column-oriented ingest: one series per numeric column.
pub fn parse(raw: &[RawRecord]) -> Result<Vec<Series>> {
    parse_table(raw).map(|t| t.series())
}

/// Ingest the inflation file into its single annual-rate series.
pub fn parse_inflation(raw: &[RawRecord]) -> Result<Series> {
    let table = parse_table(raw)?;
    if !table.has_key(RATE_KEY) {
        return Err(ChartError::MissingColumn(RATE_KEY.into()));
    }
    let values = table
        .rows
        .iter()
        .map(|r| SeriesPoint {
            timestamp: r.timestamp,
            value: r.value(RATE_KEY),
        })
        .collect();
    Ok(Series {
        key: "inflation".into(),
        values,
    })
}

/// Ingest the salary file for the two compared years.
///
/// Only rows whose metric column reads "salary" are consumed. Rows come back sorted by
/// the later-year value, highest first.
pub fn parse_salaries(raw: &[RawRecord], from_year: i32, to_year: i32) -> Result<Vec<DumbbellRow>> {
    let (fy, ty) = (from_year.to_string(), to_year.to_string());
    let mut rows: Vec<DumbbellRow> = raw
        .iter()
        .map(normalized)
        .filter(|r| {
            r.get(METRIC_KEY)
                .map(|m| m.trim().eq_ignore_ascii_case("salary"))
                .unwrap_or(false)
        })
        .filter_map(|r| {
            let name = r.get(NAME_KEY).unwrap_or("").trim().to_string();
            let a = r.get(&fy).map(parse_number).unwrap_or(MISSING);
            let b = r.get(&ty).map(parse_number).unwrap_or(MISSING);
            (!name.is_empty() && is_present(a) && is_present(b)).then(|| DumbbellRow {
                name,
                a,
                b,
                diff: b - a,
            })
        })
        .collect();

    if rows.is_empty() {
        return Err(ChartError::NoValidRows(format!(
            "salary rows for {from_year} and {to_year}"
        )));
    }
    rows.sort_by(|x, y| y.b.total_cmp(&x.b));
    Ok(rows)
}

/// Ingest the regional metrics file: one entry per (year, region) row.
pub fn parse_region_metrics(raw: &[RawRecord]) -> Result<Vec<RegionMetric>> {
    let mut out = Vec::with_capacity(raw.len());
    for rec in raw.iter().map(normalized) {
        let Some(year) = rec.get(YEAR_KEY).and_then(|y| y.trim().parse::<i32>().ok()) else {
            debug!("dropping metrics row without a usable year");
            continue;
        };
        let code = rec.get(CODE_KEY).unwrap_or("").trim().to_string();
        let name = rec.get(NAME_KEY).unwrap_or("").trim().to_string();
        let fields: BTreeMap<String, f64> = rec
            .fields
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), YEAR_KEY | CODE_KEY | NAME_KEY) && !k.is_empty())
            .map(|(k, v)| (k.clone(), parse_number(v)))
            .collect();
        out.push(RegionMetric {
            year,
            code,
            name,
            fields,
        });
    }
    if out.is_empty() {
        return Err(ChartError::NoValidRows("regional metrics".into()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn headers_fold_case_spacing_and_aliases() {
        assert_eq!(normalize_header("  North   East "), "north_east");
        assert_eq!(normalize_header("UK_HPI"), "uk_hpi");
        assert_eq!(normalize_header("Date"), "date");
        assert_eq!(normalize_header("Borough"), "la_name");
        assert_eq!(normalize_header("LA name"), "la_name");
        assert_eq!(normalize_header("Rate"), "annual_rate");
        assert_eq!(normalize_header("East "), "east");
    }

    #[test]
    fn date_formats_in_priority_order() {
        assert_eq!(parse_date("23/03/2020"), Some(ymd(2020, 3, 23)));
        assert_eq!(parse_date("Mar-20"), Some(ymd(2020, 3, 1)));
        assert_eq!(parse_date("Mar 2020"), Some(ymd(2020, 3, 1)));
        assert_eq!(parse_date("2020-03-23"), Some(ymd(2020, 3, 23)));
        assert_eq!(parse_date("2020-03"), Some(ymd(2020, 3, 1)));
        assert_eq!(parse_date("2020/03/23"), Some(ymd(2020, 3, 23)));
        assert_eq!(parse_date("March 2020"), Some(ymd(2020, 3, 1)));
        assert_eq!(parse_date("2019"), Some(ymd(2019, 1, 1)));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn numbers_strip_currency_and_separators() {
        assert_eq!(parse_number("£35,000"), 35000.0);
        assert_eq!(parse_number(" 1 234 "), 1234.0);
        assert_eq!(parse_number("81,3"), 81.3);
        assert_eq!(parse_number("1.234,5"), 1234.5);
        assert_eq!(parse_number("1,234.5"), 1234.5);
        assert_eq!(parse_number("-2.4%"), -2.4);
        assert!(parse_number("").is_nan());
        assert!(parse_number("n/a").is_nan());
        assert!(parse_number("inf").is_nan());
    }

    #[test]
    fn table_drops_bad_dates_and_sorts() {
        let csv = "Date,UK,London\n01/02/2020,2,3\nbogus,9,9\n01/01/2020,1,\n";
        let raw = read_records(csv).unwrap();
        let t = parse_table(&raw).unwrap();
        assert_eq!(t.keys, vec!["uk".to_string(), "london".to_string()]);
        assert_eq!(t.rows.len(), 2);
        assert!(t.rows[0].timestamp < t.rows[1].timestamp);
        assert_eq!(t.rows[0].value("uk"), 1.0);
        assert!(t.rows[0].value("london").is_nan());
    }

    #[test]
    fn zero_surviving_rows_is_an_error() {
        let raw = read_records("date,a\nxx,1\n").unwrap();
        assert!(matches!(parse(&raw), Err(ChartError::NoValidRows(_))));
    }

    #[test]
    fn salaries_filter_metric_and_sort_descending() {
        let csv = "Metric,LA_name,2022,2024\n\
                   salary,Camden,\"40,000\",\"45,000\"\n\
                   jobs,Camden,1,2\n\
                   Salary,Hackney,\"38,000\",\"47,500\"\n\
                   salary,,1,2\n\
                   salary,Brent,n/a,\"30,000\"\n";
        let raw = read_records(csv).unwrap();
        let rows = parse_salaries(&raw, 2022, 2024).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Hackney");
        assert_eq!(rows[0].diff, 9500.0);
        assert_eq!(rows[1].name, "Camden");
    }

    #[test]
    fn region_metrics_keep_all_numeric_fields() {
        let csv = "year,LA_code,LA_name,workplace,house_price,affordability\n\
                   2023,E09000007,Camden,\"£45,000\",\"£850,000\",18.9\n\
                   ????,E09000012,Hackney,1,2,3\n";
        let raw = read_records(csv).unwrap();
        let m = parse_region_metrics(&raw).unwrap();
        assert_eq!(m.len(), 1);
        assert_eq!(m[0].code, "E09000007");
        assert_eq!(m[0].value("house_price"), 850000.0);
        assert_eq!(m[0].value("affordability"), 18.9);
    }
}

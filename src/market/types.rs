use crate::errors::FetchError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Trading days per year used to annualize realized volatility.
const TRADING_DAYS: f64 = 252.0;

// ── Domain ──

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Daily bars for one symbol, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub bars: Vec<DailyBar>,
    pub fetched_at: DateTime<Utc>,
}

impl PriceSeries {
    /// Sorts bars ascending by date and drops duplicate dates.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<DailyBar>, fetched_at: DateTime<Utc>) -> Self {
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);
        Self {
            symbol: symbol.into(),
            bars,
            fetched_at,
        }
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    #[inline]
    pub fn last_bar(&self) -> Option<&DailyBar> {
        self.bars.last()
    }

    #[inline]
    pub fn last_close(&self) -> Option<f64> {
        self.last_bar().map(|b| b.close)
    }

    pub fn summary(&self) -> Option<SeriesSummary> {
        let last = self.last_bar()?;
        let closes = self.closes();

        let min_close = closes.iter().copied().fold(f64::INFINITY, f64::min);
        let max_close = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean_close = closes.iter().mean();

        // Annualized standard deviation of daily log returns
        let log_returns: Vec<f64> = closes
            .windows(2)
            .filter(|w| w[0] > 0.0 && w[1] > 0.0)
            .map(|w| (w[1] / w[0]).ln())
            .collect();
        let realized_volatility = if log_returns.len() >= 2 {
            let sd = log_returns.iter().std_dev();
            sd.is_finite().then(|| sd * TRADING_DAYS.sqrt())
        } else {
            None
        };

        Some(SeriesSummary {
            bars: self.bars.len(),
            first_date: self.bars[0].date,
            last_date: last.date,
            last_close: last.close,
            min_close,
            max_close,
            mean_close,
            realized_volatility,
        })
    }
}

/// Descriptive figures for a chart header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub bars: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub last_close: f64,
    pub min_close: f64,
    pub max_close: f64,
    pub mean_close: f64,
    pub realized_volatility: Option<f64>,
}

// ── Alpha Vantage wire format ──
//
// {
//   "Meta Data": { "2. Symbol": "IBM", ... },
//   "Time Series (Daily)": {
//     "2026-10-15": {
//       "1. open": "231.4000",
//       "2. high": "233.0000",
//       "3. low": "230.1100",
//       "4. close": "232.7400",
//       "5. volume": "3611322"
//     },
//     ...
//   }
// }
//
// Failures come back as HTTP 200 with one of "Error Message", "Note" or
// "Information" instead of the series.

#[derive(Debug, Deserialize)]
pub struct DailySeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    pub time_series: Option<BTreeMap<String, RawBar>>,
    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,
    #[serde(rename = "Note")]
    pub note: Option<String>,
    #[serde(rename = "Information")]
    pub information: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawBar {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
}

impl DailySeriesResponse {
    pub fn into_series(self, symbol: &str, fetched_at: DateTime<Utc>) -> Result<PriceSeries, FetchError> {
        if let Some(msg) = self.error_message {
            // A bad or missing key comes back the same way as a bad symbol
            if rejects_api_key(&msg) {
                return Err(FetchError::MalformedResponse(format!(
                    "market data provider rejected the API key: {msg}"
                )));
            }
            return Err(FetchError::SymbolNotFound(format!("{symbol}: {msg}")));
        }

        let Some(raw) = self.time_series else {
            if let Some(msg) = self.note.or(self.information) {
                return Err(FetchError::RateLimited(msg));
            }
            return Err(FetchError::MalformedResponse(
                "missing \"Time Series (Daily)\"".into(),
            ));
        };

        let bars = raw
            .into_iter()
            .map(|(date, bar)| bar.parse(&date))
            .collect::<Result<Vec<_>, _>>()?;

        if bars.is_empty() {
            return Err(FetchError::MalformedResponse(format!("{symbol}: empty time series")));
        }

        Ok(PriceSeries::new(symbol, bars, fetched_at))
    }
}

impl RawBar {
    fn parse(&self, date: &str) -> Result<DailyBar, FetchError> {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| FetchError::MalformedResponse(format!("bad date {date:?}: {e}")))?;
        Ok(DailyBar {
            date,
            open: parse_price(&self.open, "open")?,
            high: parse_price(&self.high, "high")?,
            low: parse_price(&self.low, "low")?,
            close: parse_price(&self.close, "close")?,
        })
    }
}

fn rejects_api_key(msg: &str) -> bool {
    let msg = msg.to_ascii_lowercase();
    msg.contains("apikey") || msg.contains("api key")
}

#[inline]
fn parse_price(s: &str, field: &str) -> Result<f64, FetchError> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| FetchError::MalformedResponse(format!("bad {field} price {s:?}")))
}

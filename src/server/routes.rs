use crate::errors::{AppError, AppResult};
use crate::market::provider::normalize_symbol;
use crate::market::types::{DailyBar, SeriesSummary};
use crate::payoff::grid::{PriceGrid, MAX_GRID_POINTS};
use crate::payoff::summary::PayoffSummary;
use crate::payoff::{PayoffCurve, PayoffPoint};
use crate::state::{AppState, CounterSnapshot, PerfCounters};
use crate::strategy::validate::validate;
use crate::strategy::{StrategyKind, StrategyParameters, StrategySchema};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use chrono::{DateTime, NaiveDate, Utc};
use portable_atomic::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(serde::Deserialize)]
pub struct SymbolQuery {
    pub symbol: Option<String>,
}

#[derive(serde::Serialize)]
pub struct SchemaResponse {
    #[serde(flatten)]
    pub schema: StrategySchema,
    pub symbol: Option<String>,
    pub reference_price: Option<f64>,
    pub fetch_error: Option<String>,
}

#[derive(serde::Serialize)]
pub struct HistoryResponse {
    pub symbol: String,
    pub fetched_at: DateTime<Utc>,
    pub bars: Vec<DailyBar>,
    pub summary: Option<SeriesSummary>,
}

#[derive(Debug, serde::Deserialize)]
pub struct PayoffRequest {
    pub kind: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
    pub prices: Option<Vec<f64>>,
    pub grid: Option<PriceGrid>,
    pub symbol: Option<String>,
    /// Current underlying price, used to centre the default grid.
    pub reference_price: Option<f64>,
    pub expiration: Option<NaiveDate>,
}

/// Where the evaluated prices came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Prices,
    Grid,
    History,
    Strikes,
}

#[derive(serde::Serialize)]
pub struct PayoffResponse {
    pub kind: StrategyKind,
    pub label: &'static str,
    pub parameters: StrategyParameters,
    pub price_source: PriceSource,
    pub points: Vec<PayoffPoint>,
    pub summary: PayoffSummary,
    pub warnings: Vec<String>,
    pub days_to_expiration: Option<i64>,
}

/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "source": state.provider.source_name(),
    }))
}

/// GET /api/symbols -- configured ticker list
pub async fn get_symbols(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "symbols": state.config.symbols }))
}

/// GET /api/strategies -- every kind with its default form
pub async fn list_strategies() -> Json<serde_json::Value> {
    let schemas: Vec<StrategySchema> = StrategyKind::ALL
        .into_iter()
        .map(|k| StrategySchema::for_kind(k, None))
        .collect();
    Json(serde_json::json!({ "strategies": schemas }))
}

/// GET /api/strategies/{kind}?symbol= -- one form, strike seeded from the
/// latest close when a symbol is given. A failed fetch never blocks the form.
pub async fn get_strategy(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Query(query): Query<SymbolQuery>,
) -> AppResult<Json<SchemaResponse>> {
    let kind: StrategyKind = kind.parse()?;
    let symbol = query
        .symbol
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(normalize_symbol)
        .transpose()?;

    let (reference_price, fetch_error) = match symbol.as_deref() {
        Some(sym) => match state.provider.last_close(sym).await {
            Ok(close) => (close, None),
            Err(e) => {
                tracing::warn!(symbol = %sym, error = %e, "schema served with defaults");
                (None, Some(e.to_string()))
            }
        },
        None => (None, None),
    };

    PerfCounters::bump(&state.counters.schemas_served);
    Ok(Json(SchemaResponse {
        schema: StrategySchema::for_kind(kind, reference_price),
        symbol,
        reference_price,
        fetch_error,
    }))
}

/// GET /api/history/{symbol} -- daily bars, oldest first
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> AppResult<Json<HistoryResponse>> {
    let series = state.provider.daily_series(&symbol).await?;
    PerfCounters::bump(&state.counters.histories_served);
    Ok(Json(HistoryResponse {
        symbol: series.symbol.clone(),
        fetched_at: series.fetched_at,
        bars: series.bars.clone(),
        summary: series.summary(),
    }))
}

/// POST /api/payoff -- evaluate one strategy over a price vector
pub async fn compute_payoff(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<Json<PayoffResponse>> {
    let result = payoff_for(&state, &body).await;
    if result.is_err() {
        PerfCounters::bump(&state.counters.requests_rejected);
    }
    result.map(Json)
}

async fn payoff_for(state: &AppState, body: &[u8]) -> AppResult<PayoffResponse> {
    let req: PayoffRequest = serde_json::from_slice(body)?;
    let params = StrategyParameters::from_fields(req.kind.parse()?, &req.params)?;
    let kind = params.kind();
    let mut warnings = validate(&params)?;

    let (prices, price_source) = resolve_prices(state, &req, &params).await?;
    let curve = PayoffCurve::compute(&params, &prices);

    let days_to_expiration = req
        .expiration
        .map(|exp| (exp - Utc::now().date_naive()).num_days());
    if days_to_expiration.is_some_and(|d| d < 0) {
        warnings.push("expiration is in the past".into());
    }

    state.counters.curves_computed.fetch_add(1, Ordering::Relaxed);
    state
        .counters
        .points_evaluated
        .fetch_add(curve.len() as u64, Ordering::Relaxed);

    tracing::info!(
        kind = kind.slug(),
        source = ?price_source,
        points = curve.len(),
        warnings = warnings.len(),
        "payoff curve computed"
    );

    Ok(PayoffResponse {
        kind,
        label: kind.label(),
        parameters: params,
        price_source,
        points: curve.points,
        summary: PayoffSummary::analyze(&params),
        warnings,
        days_to_expiration,
    })
}

/// Explicit prices, then an explicit grid, then the symbol's closes, then a
/// grid spanning the strikes and the reference price.
async fn resolve_prices(
    state: &AppState,
    req: &PayoffRequest,
    params: &StrategyParameters,
) -> AppResult<(Vec<f64>, PriceSource)> {
    if let Some(prices) = &req.prices {
        if prices.len() > MAX_GRID_POINTS {
            return Err(AppError::InvalidRequest(format!(
                "at most {MAX_GRID_POINTS} prices per request"
            )));
        }
        if let Some(bad) = prices.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(AppError::InvalidRequest(format!(
                "prices must be finite and non-negative, got {bad}"
            )));
        }
        return Ok((prices.clone(), PriceSource::Prices));
    }

    if let Some(grid) = &req.grid {
        grid.check()?;
        return Ok((grid.prices_with_strikes(params), PriceSource::Grid));
    }

    if let Some(symbol) = &req.symbol {
        let closes = state.provider.daily_closes(symbol).await?;
        return Ok((closes, PriceSource::History));
    }

    let reference = match req.reference_price {
        Some(p) if !p.is_finite() || p < 0.0 => {
            return Err(AppError::InvalidRequest(format!(
                "reference_price must be finite and non-negative, got {p}"
            )));
        }
        other => other,
    };
    let grid = PriceGrid::around(params, reference, state.config.curve_points);
    Ok((grid.prices_with_strikes(params), PriceSource::Strikes))
}

/// GET /api/counters -- request and cache counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<CounterSnapshot> {
    Json(state.snapshot_counters())
}

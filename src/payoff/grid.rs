use super::Payoff;
use crate::errors::{AppError, AppResult};

/// Upper bound on requested grid size.
pub const MAX_GRID_POINTS: usize = 10_000;

/// Widening applied around the lowest / highest anchor when deriving a grid.
const LOWER_FACTOR: f64 = 0.5;
const UPPER_FACTOR: f64 = 1.5;

/// Range used when a strategy has no strike set and no market price.
const FALLBACK_RANGE: (f64, f64) = (0.0, 200.0);

/// Evenly spaced hypothetical prices at expiration.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PriceGrid {
    pub min: f64,
    pub max: f64,
    pub points: usize,
}

impl PriceGrid {
    /// Validate a grid that arrived from a client.
    pub fn check(&self) -> AppResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(AppError::InvalidRequest("grid bounds must be finite".into()));
        }
        if self.min < 0.0 {
            return Err(AppError::InvalidRequest("grid min must be non-negative".into()));
        }
        if self.max <= self.min {
            return Err(AppError::InvalidRequest("grid max must exceed min".into()));
        }
        if !(2..=MAX_GRID_POINTS).contains(&self.points) {
            return Err(AppError::InvalidRequest(format!(
                "grid points must be between 2 and {MAX_GRID_POINTS}"
            )));
        }
        Ok(())
    }

    /// Span the strategy's strikes (and the reference price when given),
    /// from half the lowest anchor to one and a half times the highest.
    pub fn around<P: Payoff + ?Sized>(payoff: &P, reference_price: Option<f64>, points: usize) -> Self {
        let anchors = payoff
            .strikes()
            .into_iter()
            .chain(reference_price)
            .filter(|v| v.is_finite() && *v > 0.0);

        let (lo, hi) = anchors.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

        let (min, max) = if lo.is_finite() && hi.is_finite() {
            (lo * LOWER_FACTOR, hi * UPPER_FACTOR)
        } else {
            FALLBACK_RANGE
        };

        // A strike near f64::MAX would widen to infinity
        Self {
            min: min.max(0.0),
            max: max.min(f64::MAX),
            points: points.clamp(2, MAX_GRID_POINTS),
        }
    }

    /// Evenly spaced prices, ascending, endpoints included.
    pub fn prices(&self) -> Vec<f64> {
        let n = self.points.max(2);
        let step = (self.max - self.min) / (n - 1) as f64;
        (0..n)
            .map(|i| if i + 1 == n { self.max } else { self.min + step * i as f64 })
            .collect()
    }

    /// Grid prices plus every strike inside the range, so the chart has a
    /// vertex exactly at each kink. Sorted ascending, duplicates removed.
    pub fn prices_with_strikes<P: Payoff + ?Sized>(&self, payoff: &P) -> Vec<f64> {
        let mut prices = self.prices();
        prices.extend(
            payoff
                .strikes()
                .into_iter()
                .filter(|k| k.is_finite() && *k > self.min && *k < self.max),
        );
        prices.sort_by(|a, b| a.total_cmp(b));
        prices.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
        prices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{CallParams, IronCondorParams, StrategyKind, StrategyParameters};

    fn checked(min: f64, max: f64, points: usize) -> AppResult<PriceGrid> {
        let grid = PriceGrid { min, max, points };
        grid.check().map(|_| grid)
    }

    #[test]
    fn test_prices_include_endpoints() {
        let grid = checked(50.0, 150.0, 5).expect("valid grid");
        assert_eq!(grid.prices(), vec![50.0, 75.0, 100.0, 125.0, 150.0]);
    }

    #[test]
    fn test_invalid_grids_rejected() {
        assert!(checked(-1.0, 10.0, 5).is_err());
        assert!(checked(10.0, 10.0, 5).is_err());
        assert!(checked(0.0, f64::INFINITY, 5).is_err());
        assert!(checked(0.0, 10.0, 1).is_err());
        assert!(checked(0.0, 10.0, MAX_GRID_POINTS + 1).is_err());
    }

    #[test]
    fn test_around_condor_strikes() {
        let p = IronCondorParams {
            put_buy_strike: 80.0,
            put_buy_premium: 1.0,
            put_sell_strike: 90.0,
            put_sell_premium: 2.0,
            call_sell_strike: 110.0,
            call_sell_premium: 2.0,
            call_buy_strike: 120.0,
            call_buy_premium: 1.0,
        };
        let grid = PriceGrid::around(&p, None, 101);
        assert_eq!(grid.min, 40.0);
        assert_eq!(grid.max, 180.0);
        assert_eq!(grid.points, 101);
    }

    #[test]
    fn test_around_uses_reference_price_when_strike_unset() {
        let p = StrategyParameters::defaults(StrategyKind::Call);
        let grid = PriceGrid::around(&p, Some(200.0), 11);
        assert_eq!((grid.min, grid.max), (100.0, 300.0));

        let grid = PriceGrid::around(&p, None, 11);
        assert_eq!((grid.min, grid.max), FALLBACK_RANGE);
    }

    #[test]
    fn test_around_huge_strike_stays_finite() {
        let p = CallParams { strike: f64::MAX, premium: 1.0 };
        let grid = PriceGrid::around(&p, None, 5);
        assert!(grid.max.is_finite());
        assert!(grid.prices().iter().all(|x| x.is_finite()), "{:?}", grid.prices());
        assert_eq!(grid.prices().last().copied(), Some(f64::MAX));
    }

    #[test]
    fn test_strikes_spliced_into_grid() {
        let p = CallParams { strike: 103.0, premium: 2.0 };
        let grid = checked(100.0, 110.0, 3).expect("valid grid");
        assert_eq!(grid.prices_with_strikes(&p), vec![100.0, 103.0, 105.0, 110.0]);

        // A strike already on the grid is not duplicated
        let p = CallParams { strike: 105.0, premium: 2.0 };
        assert_eq!(grid.prices_with_strikes(&p), vec![100.0, 105.0, 110.0]);
    }
}

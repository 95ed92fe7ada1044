pub mod grid;
pub mod legs;
pub mod strategies;
pub mod summary;

use serde::Serialize;
use smallvec::SmallVec;

/// Strike prices of a strategy: the only places its payoff can change slope.
pub type Strikes = SmallVec<[f64; 4]>;

/// Profit/loss at expiration as a function of the underlying price.
///
/// Implementations must be pure: `at` depends only on `s` and the receiver.
/// Send + Sync so a parameter record can be shared across tasks.
pub trait Payoff: Send + Sync {
    /// P/L at a single underlying price.
    fn at(&self, s: f64) -> f64;

    /// Strikes of every leg, unsorted, duplicates allowed.
    fn strikes(&self) -> Strikes;

    /// Element-wise P/L over `prices`. Same length and order as the input;
    /// each point is computed independently.
    fn evaluate(&self, prices: &[f64]) -> Vec<f64> {
        prices.iter().map(|&s| self.at(s)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PayoffPoint {
    pub price: f64,
    pub pnl: f64,
}

/// `(price, pnl)` pairs in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoffCurve {
    pub points: Vec<PayoffPoint>,
}

impl PayoffCurve {
    pub fn compute<P: Payoff + ?Sized>(payoff: &P, prices: &[f64]) -> Self {
        let points = prices
            .iter()
            .zip(payoff.evaluate(prices))
            .map(|(&price, pnl)| PayoffPoint { price, pnl })
            .collect();
        Self { points }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

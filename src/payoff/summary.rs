use super::Payoff;
use serde::Serialize;
use smallvec::SmallVec;

const SLOPE_EPS: f64 = 1e-9;

/// Key figures of a payoff profile over underlying prices in [0, inf).
///
/// Payoffs are piecewise linear with kinks only at strikes, so extremes sit
/// at zero, at a strike, or run off to infinity above the highest strike.
/// `None` for `max_profit` / `max_loss` means unbounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoffSummary {
    pub max_profit: Option<f64>,
    pub max_profit_at: Option<f64>,
    /// Most negative P/L, reported as a (usually negative) P/L value.
    pub max_loss: Option<f64>,
    pub max_loss_at: Option<f64>,
    pub breakevens: Vec<f64>,
    /// Slope above the highest strike.
    pub terminal_slope: f64,
}

impl PayoffSummary {
    pub fn analyze<P: Payoff + ?Sized>(payoff: &P) -> Self {
        let mut knots: SmallVec<[f64; 6]> = SmallVec::new();
        knots.push(0.0);
        knots.extend(payoff.strikes().into_iter().filter(|k| k.is_finite() && *k > 0.0));
        knots.sort_by(|a, b| a.total_cmp(b));
        knots.dedup();

        let values: SmallVec<[f64; 6]> = knots.iter().map(|&k| payoff.at(k)).collect();

        // knots always holds 0.0
        let last = knots[knots.len() - 1];
        let last_value = values[values.len() - 1];
        let terminal_slope = payoff.at(last + 1.0) - last_value;

        let (mut hi_at, mut hi) = (knots[0], values[0]);
        let (mut lo_at, mut lo) = (knots[0], values[0]);
        for (&k, &v) in knots.iter().zip(values.iter()) {
            if v > hi {
                hi = v;
                hi_at = k;
            }
            if v < lo {
                lo = v;
                lo_at = k;
            }
        }

        let upside_unbounded = terminal_slope > SLOPE_EPS;
        let downside_unbounded = terminal_slope < -SLOPE_EPS;

        Self {
            max_profit: (!upside_unbounded).then_some(hi),
            max_profit_at: (!upside_unbounded).then_some(hi_at),
            max_loss: (!downside_unbounded).then_some(lo),
            max_loss_at: (!downside_unbounded).then_some(lo_at),
            breakevens: breakevens(&knots, &values, terminal_slope),
            terminal_slope,
        }
    }
}

/// Zero crossings of the piecewise-linear profile through `(knots, values)`,
/// continued past the last knot with `terminal_slope`.
fn breakevens(knots: &[f64], values: &[f64], terminal_slope: f64) -> Vec<f64> {
    let mut out: Vec<f64> = Vec::new();
    let mut push = |x: f64| {
        if out.last().map_or(true, |prev| (x - prev).abs() > 1e-9) {
            out.push(x);
        }
    };

    for i in 0..knots.len() {
        let (k, v) = (knots[i], values[i]);
        if v.abs() < SLOPE_EPS {
            push(k);
            continue;
        }
        if let (Some(&k1), Some(&v1)) = (knots.get(i + 1), values.get(i + 1)) {
            if v.signum() != v1.signum() && v1.abs() >= SLOPE_EPS {
                push(k + (-v) * (k1 - k) / (v1 - v));
            }
        }
    }

    let (last_k, last_v) = (knots[knots.len() - 1], values[values.len() - 1]);
    if last_v.abs() >= SLOPE_EPS && terminal_slope.abs() > SLOPE_EPS {
        let dx = -last_v / terminal_slope;
        if dx > 0.0 {
            push(last_k + dx);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_long_call_unbounded_upside() {
        let s = PayoffSummary::analyze(&CallParams { strike: 100.0, premium: 5.0 });
        assert_eq!(s.max_profit, None);
        assert_eq!(s.max_loss, Some(-5.0));
        assert_eq!(s.breakevens, vec![105.0]);
        assert!(close(s.terminal_slope, 1.0));
    }

    #[test]
    fn test_long_put_bounded_both_ways() {
        let s = PayoffSummary::analyze(&PutParams { strike: 100.0, premium: 5.0 });
        assert_eq!(s.max_profit, Some(95.0));
        assert_eq!(s.max_profit_at, Some(0.0));
        assert_eq!(s.max_loss, Some(-5.0));
        assert_eq!(s.breakevens, vec![95.0]);
    }

    #[test]
    fn test_straddle_two_breakevens() {
        let s = PayoffSummary::analyze(&StraddleParams {
            strike: 100.0,
            call_premium: 5.0,
            put_premium: 5.0,
        });
        assert_eq!(s.breakevens, vec![90.0, 110.0]);
        assert_eq!(s.max_loss, Some(-10.0));
        assert_eq!(s.max_loss_at, Some(100.0));
        assert_eq!(s.max_profit, None);
    }

    #[test]
    fn test_iron_condor_bounded() {
        let s = PayoffSummary::analyze(&IronCondorParams {
            put_buy_strike: 80.0,
            put_buy_premium: 1.0,
            put_sell_strike: 90.0,
            put_sell_premium: 2.0,
            call_sell_strike: 110.0,
            call_sell_premium: 2.0,
            call_buy_strike: 120.0,
            call_buy_premium: 1.0,
        });
        assert_eq!(s.max_profit, Some(2.0));
        assert_eq!(s.max_loss, Some(-8.0));
        assert_eq!(s.breakevens, vec![88.0, 112.0]);
        assert!(close(s.terminal_slope, 0.0));
    }

    #[test]
    fn test_butterfly_peak() {
        let s = PayoffSummary::analyze(&ButterflyParams {
            low_strike: 90.0,
            low_premium: 3.0,
            mid_strike: 100.0,
            mid_premium: 4.0,
            high_strike: 110.0,
            high_premium: 8.0,
        });
        assert_eq!(s.max_profit, Some(7.0));
        assert_eq!(s.max_profit_at, Some(100.0));
        assert_eq!(s.max_loss, Some(-3.0));
        assert_eq!(s.breakevens, vec![93.0, 107.0]);
    }

    #[test]
    fn test_covered_call_capped() {
        let s = PayoffSummary::analyze(&CoveredCallParams {
            premium_received: 5.0,
            strike: 110.0,
            purchase_price: 100.0,
        });
        assert_eq!(s.max_profit, Some(15.0));
        assert_eq!(s.max_loss, Some(-95.0));
        assert_eq!(s.max_loss_at, Some(0.0));
        assert_eq!(s.breakevens, vec![95.0]);
    }

    #[test]
    fn test_flat_zero_profile_breakeven_at_knots() {
        // Zero premium call: P/L is exactly zero up to the strike
        let s = PayoffSummary::analyze(&CallParams { strike: 50.0, premium: 0.0 });
        assert_eq!(s.breakevens, vec![0.0, 50.0]);
    }
}

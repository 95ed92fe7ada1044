// Single-leg payoffs at expiration. A premium paid is subtracted and a
// premium received is added; short legs negate the matching long leg.

/// Long call: max(S - K, 0) - premium
#[inline]
pub fn long_call_leg(s: f64, strike: f64, premium: f64) -> f64 {
    (s - strike).max(0.0) - premium
}

/// Long put: max(K - S, 0) - premium
#[inline]
pub fn long_put_leg(s: f64, strike: f64, premium: f64) -> f64 {
    (strike - s).max(0.0) - premium
}

/// Short call: premium - max(S - K, 0)
#[inline]
pub fn short_call_leg(s: f64, strike: f64, premium: f64) -> f64 {
    -long_call_leg(s, strike, premium)
}

/// Short put: premium - max(K - S, 0)
#[inline]
pub fn short_put_leg(s: f64, strike: f64, premium: f64) -> f64 {
    -long_put_leg(s, strike, premium)
}

/// One share held from `purchase_price`.
#[inline]
pub fn stock_leg(s: f64, purchase_price: f64) -> f64 {
    s - purchase_price
}

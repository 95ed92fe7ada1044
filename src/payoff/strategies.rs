use super::legs::{long_call_leg, long_put_leg, short_call_leg, short_put_leg, stock_leg};
use super::{Payoff, Strikes};
use crate::strategy::*;
use smallvec::smallvec;

impl Payoff for CallParams {
    #[inline]
    fn at(&self, s: f64) -> f64 {
        long_call_leg(s, self.strike, self.premium)
    }

    fn strikes(&self) -> Strikes {
        smallvec![self.strike]
    }
}

impl Payoff for PutParams {
    #[inline]
    fn at(&self, s: f64) -> f64 {
        long_put_leg(s, self.strike, self.premium)
    }

    fn strikes(&self) -> Strikes {
        smallvec![self.strike]
    }
}

impl Payoff for StraddleParams {
    #[inline]
    fn at(&self, s: f64) -> f64 {
        long_call_leg(s, self.strike, self.call_premium) + long_put_leg(s, self.strike, self.put_premium)
    }

    fn strikes(&self) -> Strikes {
        smallvec![self.strike]
    }
}

impl Payoff for CoveredCallParams {
    #[inline]
    fn at(&self, s: f64) -> f64 {
        stock_leg(s, self.purchase_price) + short_call_leg(s, self.strike, self.premium_received)
    }

    fn strikes(&self) -> Strikes {
        smallvec![self.strike]
    }
}

impl Payoff for MarriedPutParams {
    #[inline]
    fn at(&self, s: f64) -> f64 {
        stock_leg(s, self.purchase_price) + long_put_leg(s, self.strike, self.premium_paid)
    }

    fn strikes(&self) -> Strikes {
        smallvec![self.strike]
    }
}

impl Payoff for BullCallSpreadParams {
    #[inline]
    fn at(&self, s: f64) -> f64 {
        long_call_leg(s, self.long_strike, self.long_premium)
            + short_call_leg(s, self.short_strike, self.short_premium)
    }

    fn strikes(&self) -> Strikes {
        smallvec![self.long_strike, self.short_strike]
    }
}

impl Payoff for BullPutSpreadParams {
    #[inline]
    fn at(&self, s: f64) -> f64 {
        short_put_leg(s, self.short_strike, self.short_premium)
            + long_put_leg(s, self.long_strike, self.long_premium)
    }

    fn strikes(&self) -> Strikes {
        smallvec![self.long_strike, self.short_strike]
    }
}

impl Payoff for ProtectiveCollarParams {
    #[inline]
    fn at(&self, s: f64) -> f64 {
        stock_leg(s, self.purchase_price)
            + long_put_leg(s, self.put_strike, self.put_premium)
            + short_call_leg(s, self.call_strike, self.call_premium)
    }

    fn strikes(&self) -> Strikes {
        smallvec![self.put_strike, self.call_strike]
    }
}

impl Payoff for ButterflyParams {
    #[inline]
    fn at(&self, s: f64) -> f64 {
        long_call_leg(s, self.low_strike, self.low_premium)
            + 2.0 * short_call_leg(s, self.mid_strike, self.mid_premium)
            + long_call_leg(s, self.high_strike, self.high_premium)
    }

    fn strikes(&self) -> Strikes {
        smallvec![self.low_strike, self.mid_strike, self.high_strike]
    }
}

impl Payoff for IronButterflyParams {
    #[inline]
    fn at(&self, s: f64) -> f64 {
        long_put_leg(s, self.otm_put_strike, self.otm_put_premium)
            + short_put_leg(s, self.atm_strike, self.atm_premium)
            + short_call_leg(s, self.atm_strike, self.atm_premium)
            + long_call_leg(s, self.otm_call_strike, self.otm_call_premium)
    }

    fn strikes(&self) -> Strikes {
        smallvec![self.otm_put_strike, self.atm_strike, self.otm_call_strike]
    }
}

impl Payoff for IronCondorParams {
    #[inline]
    fn at(&self, s: f64) -> f64 {
        long_put_leg(s, self.put_buy_strike, self.put_buy_premium)
            + short_put_leg(s, self.put_sell_strike, self.put_sell_premium)
            + short_call_leg(s, self.call_sell_strike, self.call_sell_premium)
            + long_call_leg(s, self.call_buy_strike, self.call_buy_premium)
    }

    fn strikes(&self) -> Strikes {
        smallvec![
            self.put_buy_strike,
            self.put_sell_strike,
            self.call_sell_strike,
            self.call_buy_strike
        ]
    }
}

impl Payoff for StrategyParameters {
    #[inline]
    fn at(&self, s: f64) -> f64 {
        match self {
            Self::Call(p) => p.at(s),
            Self::Put(p) => p.at(s),
            Self::Straddle(p) => p.at(s),
            Self::CoveredCall(p) => p.at(s),
            Self::MarriedPut(p) => p.at(s),
            Self::BullCallSpread(p) => p.at(s),
            Self::BullPutSpread(p) => p.at(s),
            Self::ProtectiveCollar(p) => p.at(s),
            Self::LongCallButterflySpread(p) => p.at(s),
            Self::IronButterfly(p) => p.at(s),
            Self::IronCondor(p) => p.at(s),
        }
    }

    fn strikes(&self) -> Strikes {
        match self {
            Self::Call(p) => p.strikes(),
            Self::Put(p) => p.strikes(),
            Self::Straddle(p) => p.strikes(),
            Self::CoveredCall(p) => p.strikes(),
            Self::MarriedPut(p) => p.strikes(),
            Self::BullCallSpread(p) => p.strikes(),
            Self::BullPutSpread(p) => p.strikes(),
            Self::ProtectiveCollar(p) => p.strikes(),
            Self::LongCallButterflySpread(p) => p.strikes(),
            Self::IronButterfly(p) => p.strikes(),
            Self::IronCondor(p) => p.strikes(),
        }
    }

    /// Dispatch once per vector rather than once per point.
    fn evaluate(&self, prices: &[f64]) -> Vec<f64> {
        match self {
            Self::Call(p) => p.evaluate(prices),
            Self::Put(p) => p.evaluate(prices),
            Self::Straddle(p) => p.evaluate(prices),
            Self::CoveredCall(p) => p.evaluate(prices),
            Self::MarriedPut(p) => p.evaluate(prices),
            Self::BullCallSpread(p) => p.evaluate(prices),
            Self::BullPutSpread(p) => p.evaluate(prices),
            Self::ProtectiveCollar(p) => p.evaluate(prices),
            Self::LongCallButterflySpread(p) => p.evaluate(prices),
            Self::IronButterfly(p) => p.evaluate(prices),
            Self::IronCondor(p) => p.evaluate(prices),
        }
    }
}

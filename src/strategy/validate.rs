use super::{StrategyKind, StrategyParameters};
use crate::errors::{AppError, AppResult};

/// Check submitted parameters before they reach the payoff engine.
///
/// Hard errors: any value that is not finite or is negative.
/// Warnings: unset (zero) strikes and strikes out of their expected order.
/// A curve is still computed for warnings; the client decides how loudly to
/// show them.
pub fn validate(params: &StrategyParameters) -> AppResult<Vec<String>> {
    let values = params.field_values();

    for (name, value) in values.iter() {
        if !value.is_finite() {
            return Err(AppError::InvalidParameter {
                field: name.to_string(),
                reason: "must be a finite number".into(),
            });
        }
        if *value < 0.0 {
            return Err(AppError::InvalidParameter {
                field: name.to_string(),
                reason: format!("must be non-negative, got {value}"),
            });
        }
    }

    let mut warnings: Vec<String> = values
        .iter()
        .filter(|(name, value)| StrategyKind::is_strike_field(name) && *value == 0.0)
        .map(|(name, _)| format!("{name} is not set (0)"))
        .collect();

    match params {
        StrategyParameters::BullCallSpread(p) => {
            ascending(&mut warnings, &[("long_strike", p.long_strike), ("short_strike", p.short_strike)]);
        }
        StrategyParameters::BullPutSpread(p) => {
            ascending(&mut warnings, &[("long_strike", p.long_strike), ("short_strike", p.short_strike)]);
        }
        StrategyParameters::ProtectiveCollar(p) => {
            ascending(&mut warnings, &[("put_strike", p.put_strike), ("call_strike", p.call_strike)]);
        }
        StrategyParameters::LongCallButterflySpread(p) => {
            ascending(
                &mut warnings,
                &[("low_strike", p.low_strike), ("mid_strike", p.mid_strike), ("high_strike", p.high_strike)],
            );
        }
        StrategyParameters::IronButterfly(p) => {
            ascending(
                &mut warnings,
                &[
                    ("otm_put_strike", p.otm_put_strike),
                    ("atm_strike", p.atm_strike),
                    ("otm_call_strike", p.otm_call_strike),
                ],
            );
        }
        StrategyParameters::IronCondor(p) => {
            ascending(
                &mut warnings,
                &[("put_buy_strike", p.put_buy_strike), ("put_sell_strike", p.put_sell_strike)],
            );
            // The two short strikes may coincide (that is an iron butterfly).
            if p.put_sell_strike > p.call_sell_strike {
                warnings.push(format!(
                    "put_sell_strike ({}) should not exceed call_sell_strike ({})",
                    p.put_sell_strike, p.call_sell_strike
                ));
            }
            ascending(
                &mut warnings,
                &[("call_sell_strike", p.call_sell_strike), ("call_buy_strike", p.call_buy_strike)],
            );
        }
        StrategyParameters::Call(_)
        | StrategyParameters::Put(_)
        | StrategyParameters::Straddle(_)
        | StrategyParameters::CoveredCall(_)
        | StrategyParameters::MarriedPut(_) => {}
    }

    Ok(warnings)
}

/// Push a warning for each adjacent pair that is not strictly increasing.
fn ascending(warnings: &mut Vec<String>, strikes: &[(&str, f64)]) {
    for pair in strikes.windows(2) {
        let (lo_name, lo) = pair[0];
        let (hi_name, hi) = pair[1];
        if lo >= hi {
            warnings.push(format!("{lo_name} ({lo}) should be below {hi_name} ({hi})"));
        }
    }
}

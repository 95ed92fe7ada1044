use super::StrategyKind;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

// ── Per-strategy parameter records ──
//
// Plain f64 fields only. Field names match `StrategyKind::fields()`.

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CallParams {
    pub strike: f64,
    pub premium: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PutParams {
    pub strike: f64,
    pub premium: f64,
}

/// Long call and long put at the same strike.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StraddleParams {
    pub strike: f64,
    pub call_premium: f64,
    pub put_premium: f64,
}

/// Long stock plus a short call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoveredCallParams {
    pub premium_received: f64,
    pub strike: f64,
    pub purchase_price: f64,
}

/// Long stock plus a long put.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarriedPutParams {
    pub strike: f64,
    pub purchase_price: f64,
    pub premium_paid: f64,
}

/// Long call at `long_strike`, short call at `short_strike` (expected higher).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BullCallSpreadParams {
    pub long_strike: f64,
    pub long_premium: f64,
    pub short_strike: f64,
    pub short_premium: f64,
}

/// Short put at `short_strike`, long put at `long_strike` (expected lower).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BullPutSpreadParams {
    pub short_strike: f64,
    pub short_premium: f64,
    pub long_strike: f64,
    pub long_premium: f64,
}

/// Long stock, long put below, short call above.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtectiveCollarParams {
    pub purchase_price: f64,
    pub put_strike: f64,
    pub put_premium: f64,
    pub call_strike: f64,
    pub call_premium: f64,
}

/// Long low call, two short mid calls, long high call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ButterflyParams {
    pub low_strike: f64,
    pub low_premium: f64,
    pub mid_strike: f64,
    pub mid_premium: f64,
    pub high_strike: f64,
    pub high_premium: f64,
}

/// Short ATM straddle (one premium for both legs) wrapped by long OTM wings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IronButterflyParams {
    pub atm_strike: f64,
    pub atm_premium: f64,
    pub otm_put_strike: f64,
    pub otm_put_premium: f64,
    pub otm_call_strike: f64,
    pub otm_call_premium: f64,
}

/// Bull put spread below, bear call spread above.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IronCondorParams {
    pub put_buy_strike: f64,
    pub put_buy_premium: f64,
    pub put_sell_strike: f64,
    pub put_sell_premium: f64,
    pub call_sell_strike: f64,
    pub call_sell_premium: f64,
    pub call_buy_strike: f64,
    pub call_buy_premium: f64,
}

/// One parameter shape per `StrategyKind`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyParameters {
    Call(CallParams),
    Put(PutParams),
    Straddle(StraddleParams),
    CoveredCall(CoveredCallParams),
    MarriedPut(MarriedPutParams),
    BullCallSpread(BullCallSpreadParams),
    BullPutSpread(BullPutSpreadParams),
    ProtectiveCollar(ProtectiveCollarParams),
    LongCallButterflySpread(ButterflyParams),
    IronButterfly(IronButterflyParams),
    IronCondor(IronCondorParams),
}

pub type FieldValues = SmallVec<[(&'static str, f64); 8]>;

impl StrategyParameters {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Call(_) => StrategyKind::Call,
            Self::Put(_) => StrategyKind::Put,
            Self::Straddle(_) => StrategyKind::Straddle,
            Self::CoveredCall(_) => StrategyKind::CoveredCall,
            Self::MarriedPut(_) => StrategyKind::MarriedPut,
            Self::BullCallSpread(_) => StrategyKind::BullCallSpread,
            Self::BullPutSpread(_) => StrategyKind::BullPutSpread,
            Self::ProtectiveCollar(_) => StrategyKind::ProtectiveCollar,
            Self::LongCallButterflySpread(_) => StrategyKind::LongCallButterflySpread,
            Self::IronButterfly(_) => StrategyKind::IronButterfly,
            Self::IronCondor(_) => StrategyKind::IronCondor,
        }
    }

    /// Build the typed record from named form values. Every schema field is
    /// required and names outside the schema are rejected.
    pub fn from_fields(kind: StrategyKind, values: &BTreeMap<String, f64>) -> AppResult<Self> {
        let unknown: Vec<&str> = values
            .keys()
            .map(String::as_str)
            .filter(|name| !kind.fields().iter().any(|f| f.name == *name))
            .collect();
        if !unknown.is_empty() {
            return Err(AppError::UnknownParameter {
                strategy: kind.slug().to_string(),
                fields: unknown.join(", "),
            });
        }

        let mut reader = FieldReader::strict(kind, values);
        let params = Self::read(kind, &mut reader);
        if !reader.missing.is_empty() {
            return Err(AppError::MissingParameter {
                strategy: kind.slug().to_string(),
                fields: reader.missing.join(", "),
            });
        }
        Ok(params)
    }

    /// The record a fresh form would submit.
    pub fn defaults(kind: StrategyKind) -> Self {
        let empty = BTreeMap::new();
        let mut reader = FieldReader::with_defaults(kind, &empty);
        Self::read(kind, &mut reader)
    }

    fn read(kind: StrategyKind, r: &mut FieldReader<'_>) -> Self {
        match kind {
            StrategyKind::Call => Self::Call(CallParams {
                strike: r.get("strike"),
                premium: r.get("premium"),
            }),
            StrategyKind::Put => Self::Put(PutParams {
                strike: r.get("strike"),
                premium: r.get("premium"),
            }),
            StrategyKind::Straddle => Self::Straddle(StraddleParams {
                strike: r.get("strike"),
                call_premium: r.get("call_premium"),
                put_premium: r.get("put_premium"),
            }),
            StrategyKind::CoveredCall => Self::CoveredCall(CoveredCallParams {
                premium_received: r.get("premium_received"),
                strike: r.get("strike"),
                purchase_price: r.get("purchase_price"),
            }),
            StrategyKind::MarriedPut => Self::MarriedPut(MarriedPutParams {
                strike: r.get("strike"),
                purchase_price: r.get("purchase_price"),
                premium_paid: r.get("premium_paid"),
            }),
            StrategyKind::BullCallSpread => Self::BullCallSpread(BullCallSpreadParams {
                long_strike: r.get("long_strike"),
                long_premium: r.get("long_premium"),
                short_strike: r.get("short_strike"),
                short_premium: r.get("short_premium"),
            }),
            StrategyKind::BullPutSpread => Self::BullPutSpread(BullPutSpreadParams {
                short_strike: r.get("short_strike"),
                short_premium: r.get("short_premium"),
                long_strike: r.get("long_strike"),
                long_premium: r.get("long_premium"),
            }),
            StrategyKind::ProtectiveCollar => Self::ProtectiveCollar(ProtectiveCollarParams {
                purchase_price: r.get("purchase_price"),
                put_strike: r.get("put_strike"),
                put_premium: r.get("put_premium"),
                call_strike: r.get("call_strike"),
                call_premium: r.get("call_premium"),
            }),
            StrategyKind::LongCallButterflySpread => Self::LongCallButterflySpread(ButterflyParams {
                low_strike: r.get("low_strike"),
                low_premium: r.get("low_premium"),
                mid_strike: r.get("mid_strike"),
                mid_premium: r.get("mid_premium"),
                high_strike: r.get("high_strike"),
                high_premium: r.get("high_premium"),
            }),
            StrategyKind::IronButterfly => Self::IronButterfly(IronButterflyParams {
                atm_strike: r.get("atm_strike"),
                atm_premium: r.get("atm_premium"),
                otm_put_strike: r.get("otm_put_strike"),
                otm_put_premium: r.get("otm_put_premium"),
                otm_call_strike: r.get("otm_call_strike"),
                otm_call_premium: r.get("otm_call_premium"),
            }),
            StrategyKind::IronCondor => Self::IronCondor(IronCondorParams {
                put_buy_strike: r.get("put_buy_strike"),
                put_buy_premium: r.get("put_buy_premium"),
                put_sell_strike: r.get("put_sell_strike"),
                put_sell_premium: r.get("put_sell_premium"),
                call_sell_strike: r.get("call_sell_strike"),
                call_sell_premium: r.get("call_sell_premium"),
                call_buy_strike: r.get("call_buy_strike"),
                call_buy_premium: r.get("call_buy_premium"),
            }),
        }
    }

    /// `(field_name, value)` pairs in schema order.
    pub fn field_values(&self) -> FieldValues {
        let mut out = FieldValues::new();
        let mut push = |name: &'static str, v: f64| out.push((name, v));
        match self {
            Self::Call(p) => {
                push("strike", p.strike);
                push("premium", p.premium);
            }
            Self::Put(p) => {
                push("strike", p.strike);
                push("premium", p.premium);
            }
            Self::Straddle(p) => {
                push("strike", p.strike);
                push("call_premium", p.call_premium);
                push("put_premium", p.put_premium);
            }
            Self::CoveredCall(p) => {
                push("premium_received", p.premium_received);
                push("strike", p.strike);
                push("purchase_price", p.purchase_price);
            }
            Self::MarriedPut(p) => {
                push("strike", p.strike);
                push("purchase_price", p.purchase_price);
                push("premium_paid", p.premium_paid);
            }
            Self::BullCallSpread(p) => {
                push("long_strike", p.long_strike);
                push("long_premium", p.long_premium);
                push("short_strike", p.short_strike);
                push("short_premium", p.short_premium);
            }
            Self::BullPutSpread(p) => {
                push("short_strike", p.short_strike);
                push("short_premium", p.short_premium);
                push("long_strike", p.long_strike);
                push("long_premium", p.long_premium);
            }
            Self::ProtectiveCollar(p) => {
                push("purchase_price", p.purchase_price);
                push("put_strike", p.put_strike);
                push("put_premium", p.put_premium);
                push("call_strike", p.call_strike);
                push("call_premium", p.call_premium);
            }
            Self::LongCallButterflySpread(p) => {
                push("low_strike", p.low_strike);
                push("low_premium", p.low_premium);
                push("mid_strike", p.mid_strike);
                push("mid_premium", p.mid_premium);
                push("high_strike", p.high_strike);
                push("high_premium", p.high_premium);
            }
            Self::IronButterfly(p) => {
                push("atm_strike", p.atm_strike);
                push("atm_premium", p.atm_premium);
                push("otm_put_strike", p.otm_put_strike);
                push("otm_put_premium", p.otm_put_premium);
                push("otm_call_strike", p.otm_call_strike);
                push("otm_call_premium", p.otm_call_premium);
            }
            Self::IronCondor(p) => {
                push("put_buy_strike", p.put_buy_strike);
                push("put_buy_premium", p.put_buy_premium);
                push("put_sell_strike", p.put_sell_strike);
                push("put_sell_premium", p.put_sell_premium);
                push("call_sell_strike", p.call_sell_strike);
                push("call_sell_premium", p.call_sell_premium);
                push("call_buy_strike", p.call_buy_strike);
                push("call_buy_premium", p.call_buy_premium);
            }
        }
        out
    }
}

/// Pulls named values out of a form map, either recording what is missing
/// or falling back to the schema default.
struct FieldReader<'a> {
    kind: StrategyKind,
    values: &'a BTreeMap<String, f64>,
    use_defaults: bool,
    missing: SmallVec<[&'static str; 8]>,
}

impl<'a> FieldReader<'a> {
    fn strict(kind: StrategyKind, values: &'a BTreeMap<String, f64>) -> Self {
        Self { kind, values, use_defaults: false, missing: SmallVec::new() }
    }

    fn with_defaults(kind: StrategyKind, values: &'a BTreeMap<String, f64>) -> Self {
        Self { kind, values, use_defaults: true, missing: SmallVec::new() }
    }

    fn get(&mut self, name: &'static str) -> f64 {
        if let Some(v) = self.values.get(name) {
            return *v;
        }
        if self.use_defaults {
            return self
                .kind
                .fields()
                .iter()
                .find(|f| f.name == name)
                .map(|f| f.default)
                .unwrap_or(0.0);
        }
        self.missing.push(name);
        0.0
    }
}

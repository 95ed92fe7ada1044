pub mod params;
pub mod validate;

pub use params::*;

use crate::errors::AppError;
use serde::Serialize;
use std::str::FromStr;

/// The closed set of supported strategies. Each has a typed parameter record
/// and an ordered field schema a form is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Call,
    Put,
    Straddle,
    CoveredCall,
    MarriedPut,
    BullCallSpread,
    BullPutSpread,
    ProtectiveCollar,
    LongCallButterflySpread,
    IronButterfly,
    IronCondor,
}

impl StrategyKind {
    /// Presentation order.
    pub const ALL: [StrategyKind; 11] = [
        Self::Call,
        Self::Put,
        Self::Straddle,
        Self::CoveredCall,
        Self::MarriedPut,
        Self::BullCallSpread,
        Self::BullPutSpread,
        Self::ProtectiveCollar,
        Self::LongCallButterflySpread,
        Self::IronButterfly,
        Self::IronCondor,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Call => "Call",
            Self::Put => "Put",
            Self::Straddle => "Straddle",
            Self::CoveredCall => "Covered Call",
            Self::MarriedPut => "Married Put",
            Self::BullCallSpread => "Bull Call Spread",
            Self::BullPutSpread => "Bull Put Spread",
            Self::ProtectiveCollar => "Protective Collar",
            Self::LongCallButterflySpread => "Long Call Butterfly Spread",
            Self::IronButterfly => "Iron Butterfly",
            Self::IronCondor => "Iron Condor",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Put => "put",
            Self::Straddle => "straddle",
            Self::CoveredCall => "covered_call",
            Self::MarriedPut => "married_put",
            Self::BullCallSpread => "bull_call_spread",
            Self::BullPutSpread => "bull_put_spread",
            Self::ProtectiveCollar => "protective_collar",
            Self::LongCallButterflySpread => "long_call_butterfly_spread",
            Self::IronButterfly => "iron_butterfly",
            Self::IronCondor => "iron_condor",
        }
    }

    /// Ordered input fields for this strategy. Defaults match the values the
    /// form starts from; a zero strike means "not set yet".
    pub fn fields(&self) -> &'static [ParamField] {
        match self {
            Self::Call | Self::Put => SINGLE_LEG_FIELDS,
            Self::Straddle => STRADDLE_FIELDS,
            Self::CoveredCall => COVERED_CALL_FIELDS,
            Self::MarriedPut => MARRIED_PUT_FIELDS,
            Self::BullCallSpread => BULL_CALL_SPREAD_FIELDS,
            Self::BullPutSpread => BULL_PUT_SPREAD_FIELDS,
            Self::ProtectiveCollar => PROTECTIVE_COLLAR_FIELDS,
            Self::LongCallButterflySpread => LONG_CALL_BUTTERFLY_SPREAD_FIELDS,
            Self::IronButterfly => IRON_BUTTERFLY_FIELDS,
            Self::IronCondor => IRON_CONDOR_FIELDS,
        }
    }

    /// Whether the single strike of this strategy should start at the most
    /// recent close when one is available.
    #[inline]
    fn seeds_strike_from_close(&self) -> bool {
        matches!(self, Self::Call | Self::Put | Self::CoveredCall | Self::MarriedPut)
    }

    /// Whether `name` is a strike (as opposed to a premium or purchase price).
    #[inline]
    pub fn is_strike_field(name: &str) -> bool {
        name == "strike" || name.ends_with("_strike")
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StrategyKind {
    type Err = AppError;

    /// Accepts the snake_case slug, the kebab-case form, or the display
    /// label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        Self::ALL
            .into_iter()
            .find(|k| normalize_name(k.slug()) == wanted)
            .ok_or_else(|| AppError::UnknownStrategy(s.to_string()))
    }
}

fn normalize_name(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

const SINGLE_LEG_FIELDS: &[ParamField] = &[
    ParamField::new("strike", "Strike Price", 0.0),
    ParamField::new("premium", "Premium", 10.0),
];

const STRADDLE_FIELDS: &[ParamField] = &[
    ParamField::new("strike", "Strike Price for Both Call and Put", 100.0),
    ParamField::new("call_premium", "Premium Paid for Call Option", 5.0),
    ParamField::new("put_premium", "Premium Paid for Put Option", 5.0),
];

const COVERED_CALL_FIELDS: &[ParamField] = &[
    ParamField::new("premium_received", "Premium Received for Call Option", 10.0),
    ParamField::new("strike", "Strike Price", 0.0),
    ParamField::new("purchase_price", "Purchase Price of Underlying Asset", 100.0),
];

const MARRIED_PUT_FIELDS: &[ParamField] = &[
    ParamField::new("strike", "Strike Price", 0.0),
    ParamField::new("purchase_price", "Purchase Price of Underlying Asset", 100.0),
    ParamField::new("premium_paid", "Premium Paid for Put Option", 10.0),
];

const BULL_CALL_SPREAD_FIELDS: &[ParamField] = &[
    ParamField::new("long_strike", "Strike Price for Long Call", 100.0),
    ParamField::new("long_premium", "Premium for Long Call", 10.0),
    ParamField::new("short_strike", "Strike Price for Short Call", 110.0),
    ParamField::new("short_premium", "Premium for Short Call", 5.0),
];

const BULL_PUT_SPREAD_FIELDS: &[ParamField] = &[
    ParamField::new("short_strike", "Strike Price for Short Put", 100.0),
    ParamField::new("short_premium", "Premium for Short Put", 10.0),
    ParamField::new("long_strike", "Strike Price for Long Put", 90.0),
    ParamField::new("long_premium", "Premium for Long Put", 5.0),
];

const PROTECTIVE_COLLAR_FIELDS: &[ParamField] = &[
    ParamField::new("purchase_price", "Purchase Price of Underlying Asset", 100.0),
    ParamField::new("put_strike", "Strike Price for Long Put", 95.0),
    ParamField::new("put_premium", "Premium for Long Put", 5.0),
    ParamField::new("call_strike", "Strike Price for Short Call", 110.0),
    ParamField::new("call_premium", "Premium for Short Call", 5.0),
];

const LONG_CALL_BUTTERFLY_SPREAD_FIELDS: &[ParamField] = &[
    ParamField::new("low_strike", "Strike Price for Low Call", 90.0),
    ParamField::new("low_premium", "Premium for Low Call", 3.0),
    ParamField::new("mid_strike", "Strike Price for Mid Call", 100.0),
    ParamField::new("mid_premium", "Premium for Mid Call", 4.0),
    ParamField::new("high_strike", "Strike Price for High Call", 110.0),
    ParamField::new("high_premium", "Premium for High Call", 8.0),
];

const IRON_BUTTERFLY_FIELDS: &[ParamField] = &[
    ParamField::new("atm_strike", "Strike Price for ATM Options", 100.0),
    ParamField::new("atm_premium", "Premium for ATM Options", 10.0),
    ParamField::new("otm_put_strike", "Strike Price for OTM Put", 90.0),
    ParamField::new("otm_put_premium", "Premium for OTM Put", 10.0),
    ParamField::new("otm_call_strike", "Strike Price for OTM Call", 110.0),
    ParamField::new("otm_call_premium", "Premium for OTM Call", 3.0),
];

const IRON_CONDOR_FIELDS: &[ParamField] = &[
    ParamField::new("put_buy_strike", "Strike Price for Buy Put", 80.0),
    ParamField::new("put_buy_premium", "Premium for Buy Put", 1.0),
    ParamField::new("put_sell_strike", "Strike Price for Sell Put", 90.0),
    ParamField::new("put_sell_premium", "Premium for Sell Put", 2.0),
    ParamField::new("call_sell_strike", "Strike Price for Sell Call", 110.0),
    ParamField::new("call_sell_premium", "Premium for Sell Call", 2.0),
    ParamField::new("call_buy_strike", "Strike Price for Buy Call", 120.0),
    ParamField::new("call_buy_premium", "Premium for Buy Call", 1.0),
];

/// One named numeric input of a strategy form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamField {
    pub name: &'static str,
    pub label: &'static str,
    pub default: f64,
}

impl ParamField {
    pub const fn new(name: &'static str, label: &'static str, default: f64) -> Self {
        Self { name, label, default }
    }
}

/// Form description for one strategy, possibly seeded with a market price.
#[derive(Debug, Clone, Serialize)]
pub struct StrategySchema {
    pub kind: StrategyKind,
    pub label: &'static str,
    pub fields: Vec<ParamField>,
}

impl StrategySchema {
    pub fn for_kind(kind: StrategyKind, reference_price: Option<f64>) -> Self {
        let seed = reference_price
            .filter(|p| p.is_finite() && *p > 0.0)
            .filter(|_| kind.seeds_strike_from_close());

        let fields = kind
            .fields()
            .iter()
            .map(|f| match seed {
                Some(price) if f.name == "strike" => ParamField { default: price, ..*f },
                _ => *f,
            })
            .collect();

        Self {
            kind,
            label: kind.label(),
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slug_label_and_kebab() {
        assert_eq!("iron_condor".parse::<StrategyKind>().ok(), Some(StrategyKind::IronCondor));
        assert_eq!(
            "Long Call Butterfly Spread".parse::<StrategyKind>().ok(),
            Some(StrategyKind::LongCallButterflySpread)
        );
        assert_eq!("bull-put-spread".parse::<StrategyKind>().ok(), Some(StrategyKind::BullPutSpread));
        assert!("strangle".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_slug_matches_serde_name() {
        for kind in StrategyKind::ALL {
            let json = serde_json::to_string(&kind).unwrap_or_default();
            assert_eq!(json, format!("\"{}\"", kind.slug()));
        }
    }

    #[test]
    fn test_field_names_unique_per_kind() {
        for kind in StrategyKind::ALL {
            let fields = kind.fields();
            assert!(!fields.is_empty(), "{kind} has no fields");
            for (i, a) in fields.iter().enumerate() {
                for b in &fields[i + 1..] {
                    assert_ne!(a.name, b.name, "duplicate field in {kind}");
                }
            }
        }
    }

    #[test]
    fn test_schema_seeds_single_strike_from_close() {
        let schema = StrategySchema::for_kind(StrategyKind::Call, Some(187.5));
        assert_eq!(schema.fields[0].name, "strike");
        assert_eq!(schema.fields[0].default, 187.5);
        assert_eq!(schema.fields[1].default, 10.0);

        // Multi-strike templates keep their own defaults
        let schema = StrategySchema::for_kind(StrategyKind::IronCondor, Some(187.5));
        assert_eq!(schema.fields[0].default, 80.0);

        // No price, or a nonsense one, leaves the strike unset
        let schema = StrategySchema::for_kind(StrategyKind::Put, None);
        assert_eq!(schema.fields[0].default, 0.0);
        let schema = StrategySchema::for_kind(StrategyKind::Put, Some(f64::NAN));
        assert_eq!(schema.fields[0].default, 0.0);
    }

    #[test]
    fn test_strike_field_detection() {
        assert!(StrategyKind::is_strike_field("strike"));
        assert!(StrategyKind::is_strike_field("put_buy_strike"));
        assert!(!StrategyKind::is_strike_field("purchase_price"));
        assert!(!StrategyKind::is_strike_field("put_buy_premium"));
    }
}

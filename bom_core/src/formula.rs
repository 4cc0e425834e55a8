//! # Material Formulas
//!
//! Derives the quantity of a raw material needed for one cable piece from the
//! product geometry. The rule is picked from the material's name
//! (case-insensitive substring match, first match wins):
//!
//! | Rule        | Name contains                         | Quantity per piece |
//! |-------------|---------------------------------------|--------------------|
//! | Copper      | `copper`                              | `0.703 · strands · copper² · cores · 1.02 · length / 100` |
//! | Core PVC    | `core` and `pvc`                      | `0.785 · (coreOD² − strands · copper²) · 0.00162 · length` |
//! | Outer PVC 70| `pvc` and `25`                        | `outer · 0.70` |
//! | Outer PVC 30| `pvc` and `12`                        | `outer · 0.30` |
//! | Sheath      | `sheath` and (`pvc` or `sheathing`)   | `outer` |
//!
//! where `outer = 0.785 · (sheathOD² − coreOD² − strands · copper²) · 0.00162 · length`.
//!
//! Any other name has no formula and the quantity must be entered by hand.
//! That case is `None`, never zero: a formula can legitimately produce zero
//! when the geometry is blank.
//!
//! ## Example
//!
//! ```rust
//! use bom_core::formula::compute;
//! use bom_core::product::SpecSnapshot;
//! use rust_decimal::Decimal;
//!
//! let snap = SpecSnapshot {
//!     strands: Decimal::from(7),
//!     copper: Decimal::new(5, 1),
//!     cores: Decimal::from(3),
//!     length: Decimal::from(100),
//!     ..SpecSnapshot::default()
//! };
//!
//! assert_eq!(compute("Copper Wire 0.5", &snap), Some(Decimal::new(376457, 5)));
//! assert_eq!(compute("Packing Bag", &snap), None);
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::product::SpecSnapshot;

/// Decimal places kept for every computed quantity
pub const QTY_DECIMALS: u32 = 5;

const COPPER_DENSITY: Decimal = Decimal::from_parts(703, 0, 0, false, 3);
const COPPER_ALLOWANCE: Decimal = Decimal::from_parts(102, 0, 0, false, 2);
const CIRCLE_FACTOR: Decimal = Decimal::from_parts(785, 0, 0, false, 3);
/// 0.162 / 100
const PVC_DENSITY: Decimal = Decimal::from_parts(162, 0, 0, false, 5);
const OUTER_SHARE_70: Decimal = Decimal::from_parts(70, 0, 0, false, 2);
const OUTER_SHARE_30: Decimal = Decimal::from_parts(30, 0, 0, false, 2);

/// Round to [`QTY_DECIMALS`] places, halves away from zero.
pub fn round5(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(QTY_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Render a quantity the way material lines store it (`"3.76457"`).
pub fn format_qty(value: Decimal) -> String {
    format!("{:.5}", round5(value))
}

/// The formula a material name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialRule {
    Copper,
    CorePvc,
    /// 70% share of the outer insulation
    OuterPvc70,
    /// 30% share of the outer insulation
    OuterPvc30,
    Sheath,
}

impl MaterialRule {
    /// Resolve a material name to its rule, if any.
    pub fn classify(material_name: &str) -> Option<MaterialRule> {
        let name = material_name.to_lowercase();
        let has = |needle: &str| name.contains(needle);

        if has("copper") {
            Some(MaterialRule::Copper)
        } else if has("core") && has("pvc") {
            Some(MaterialRule::CorePvc)
        } else if has("pvc") && has("25") {
            Some(MaterialRule::OuterPvc70)
        } else if has("pvc") && has("12") {
            Some(MaterialRule::OuterPvc30)
        } else if has("sheath") && (has("pvc") || has("sheathing")) {
            Some(MaterialRule::Sheath)
        } else {
            None
        }
    }

    /// Quantity per piece under this rule, rounded to 5 places.
    ///
    /// Returns `None` only when the geometry is too large to represent.
    pub fn evaluate(self, spec: &SpecSnapshot) -> Option<Decimal> {
        let raw = match self {
            MaterialRule::Copper => copper_weight(spec),
            MaterialRule::CorePvc => core_pvc_weight(spec),
            MaterialRule::OuterPvc70 => outer_weight(spec)?.checked_mul(OUTER_SHARE_70),
            MaterialRule::OuterPvc30 => outer_weight(spec)?.checked_mul(OUTER_SHARE_30),
            MaterialRule::Sheath => outer_weight(spec),
        }?;
        Some(round5(raw))
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MaterialRule::Copper => "Copper conductor",
            MaterialRule::CorePvc => "Core insulation PVC",
            MaterialRule::OuterPvc70 => "Outer PVC (70%)",
            MaterialRule::OuterPvc30 => "Outer PVC (30%)",
            MaterialRule::Sheath => "Sheath PVC",
        }
    }
}

/// Quantity per piece for `material_name`, or `None` when no formula applies
/// and the quantity must be entered manually.
pub fn compute(material_name: &str, spec: &SpecSnapshot) -> Option<Decimal> {
    MaterialRule::classify(material_name)?.evaluate(spec)
}

/// strands · copper²
fn conductor_area(spec: &SpecSnapshot) -> Option<Decimal> {
    spec.strands.checked_mul(spec.copper.checked_mul(spec.copper)?)
}

fn copper_weight(spec: &SpecSnapshot) -> Option<Decimal> {
    COPPER_DENSITY
        .checked_mul(conductor_area(spec)?)?
        .checked_mul(spec.cores)?
        .checked_mul(COPPER_ALLOWANCE)?
        .checked_mul(spec.length)?
        .checked_div(Decimal::ONE_HUNDRED)
}

fn core_pvc_weight(spec: &SpecSnapshot) -> Option<Decimal> {
    let ring = spec
        .core_od
        .checked_mul(spec.core_od)?
        .checked_sub(conductor_area(spec)?)?;
    pvc_weight(ring, spec.length)
}

fn outer_weight(spec: &SpecSnapshot) -> Option<Decimal> {
    let ring = spec
        .sheath_od
        .checked_mul(spec.sheath_od)?
        .checked_sub(spec.core_od.checked_mul(spec.core_od)?)?
        .checked_sub(conductor_area(spec)?)?;
    pvc_weight(ring, spec.length)
}

fn pvc_weight(ring: Decimal, length: Decimal) -> Option<Decimal> {
    CIRCLE_FACTOR
        .checked_mul(ring)?
        .checked_mul(PVC_DENSITY)?
        .checked_mul(length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn cable_spec() -> SpecSnapshot {
        SpecSnapshot {
            length: dec("100"),
            copper: dec("0.5"),
            strands: dec("7"),
            cores: dec("3"),
            core_od: dec("3.0"),
            sheath_od: dec("5.0"),
        }
    }

    #[test]
    fn test_copper_quantity() {
        // 0.703 * 7 * 0.25 * 3 * 1.02 * 100 / 100 = 3.764565
        assert_eq!(compute("Copper", &cable_spec()), Some(dec("3.76457")));
        assert_eq!(compute("BARE COPPER 0.5mm", &cable_spec()), Some(dec("3.76457")));
    }

    #[test]
    fn test_core_pvc_quantity() {
        // 0.785 * (9 - 1.75) * 0.00162 * 100 = 0.9219825
        assert_eq!(compute("Core PVC", &cable_spec()), Some(dec("0.92198")));
        assert_eq!(compute("pvc for core", &cable_spec()), Some(dec("0.92198")));
    }

    #[test]
    fn test_outer_variants() {
        // outer = 0.785 * (25 - 9 - 1.75) * 0.00162 * 100 = 1.8121725
        let spec = cable_spec();
        assert_eq!(compute("PVC 25", &spec), Some(dec("1.26852")));
        assert_eq!(compute("PVC 12", &spec), Some(dec("0.54365")));
        assert_eq!(compute("Sheath PVC", &spec), Some(dec("1.81217")));
        assert_eq!(compute("Sheathing Compound", &spec), Some(dec("1.81217")));
    }

    #[test]
    fn test_precedence() {
        // copper wins over everything else in the name
        assert_eq!(MaterialRule::classify("copper core pvc"), Some(MaterialRule::Copper));
        // core pvc wins over the outer variants
        assert_eq!(MaterialRule::classify("Core PVC 25"), Some(MaterialRule::CorePvc));
        // the 25 variant is checked before the 12 variant
        assert_eq!(MaterialRule::classify("PVC 1225"), Some(MaterialRule::OuterPvc70));
        // a sheath name with only "pvc" still resolves to the 70/30 variants first
        assert_eq!(MaterialRule::classify("Sheath PVC 12"), Some(MaterialRule::OuterPvc30));
    }

    #[test]
    fn test_no_rule_is_not_zero() {
        let spec = cable_spec();
        assert_eq!(compute("Packing Bag", &spec), None);
        assert_eq!(compute("Sheath", &spec), None);
        assert_eq!(compute("", &spec), None);

        // a matched rule over blank geometry is a real zero
        assert_eq!(compute("Copper", &SpecSnapshot::default()), Some(Decimal::ZERO));
    }

    #[test]
    fn test_compute_is_pure() {
        let spec = cable_spec();
        let first = compute("Sheath PVC", &spec);
        let _ = compute("Copper", &spec);
        let _ = compute("Core PVC", &SpecSnapshot::default());
        assert_eq!(compute("Sheath PVC", &spec), first);
    }

    #[test]
    fn test_format_qty() {
        assert_eq!(format_qty(dec("3.764565")), "3.76457");
        assert_eq!(format_qty(dec("2")), "2.00000");
        assert_eq!(format_qty(Decimal::ZERO), "0.00000");
    }

    #[test]
    fn test_overflow_falls_back_to_manual() {
        let spec = SpecSnapshot {
            copper: Decimal::MAX,
            strands: Decimal::MAX,
            ..cable_spec()
        };
        assert_eq!(compute("Copper", &spec), None);
    }
}

//! # Product Specification
//!
//! Product geometry as entered on the spec step of the BOM wizard. Fields are
//! kept as text so a half-typed value survives a round trip; the numeric view
//! used by the formulas is [`SpecSnapshot`], where anything missing or
//! non-numeric reads as zero.
//!
//! ## Example
//!
//! ```rust
//! use bom_core::product::{ProductSpec, SpecField};
//! use rust_decimal::Decimal;
//!
//! let mut spec = ProductSpec::default();
//! spec.set(SpecField::Strands, "7");
//! spec.set(SpecField::Copper, "abc");
//!
//! let snap = spec.snapshot();
//! assert_eq!(snap.strands, Decimal::from(7));
//! assert_eq!(snap.copper, Decimal::ZERO);
//! ```

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Parse a user-entered number, falling back to zero.
///
/// Only the leading numeric part counts, so `"0.5mm"` reads as 0.5 and
/// `"mm0.5"` as 0.
pub fn parse_decimal(raw: &str) -> Decimal {
    let Some(number) = numeric_prefix(raw.trim()) else {
        return Decimal::ZERO;
    };
    Decimal::from_str(&number)
        .or_else(|_| Decimal::from_scientific(&number))
        .unwrap_or(Decimal::ZERO)
}

/// Leading `[+-]digits[.digits][e[+-]digits]` of `text`, normalized so the
/// decimal parser accepts it (`".5"` -> `"0.5"`, `"+7."` -> `"7"`).
fn numeric_prefix(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut pos = 0;
    let negative = match bytes.first() {
        Some(b'-') => {
            pos = 1;
            true
        }
        Some(b'+') => {
            pos = 1;
            false
        }
        _ => false,
    };

    let int_len = digits_from(pos);
    let int_part = &text[pos..pos + int_len];
    pos += int_len;

    let mut frac_part = "";
    if bytes.get(pos) == Some(&b'.') {
        let frac_len = digits_from(pos + 1);
        frac_part = &text[pos + 1..pos + 1 + frac_len];
        pos += 1 + frac_len;
    }
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut number = String::new();
    if negative {
        number.push('-');
    }
    number.push_str(if int_part.is_empty() { "0" } else { int_part });
    if !frac_part.is_empty() {
        number.push('.');
        number.push_str(frac_part);
    }

    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mut exp = pos + 1;
        let exp_sign = match bytes.get(exp) {
            Some(b'-') => {
                exp += 1;
                "-"
            }
            Some(b'+') => {
                exp += 1;
                ""
            }
            _ => "",
        };
        let exp_len = digits_from(exp);
        if exp_len > 0 {
            number.push('e');
            number.push_str(exp_sign);
            number.push_str(&text[exp..exp + exp_len]);
        }
    }
    Some(number)
}

/// Editable fields of a [`ProductSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecField {
    ProductCode,
    ProductDescription,
    Length,
    Colour,
    Copper,
    Strands,
    CoreOd,
    SheathOd,
    CoreColour,
    NoOfCores,
    CorePvc,
    SheathPvcInner,
    SheathPvcOuter,
    Printing,
}

impl SpecField {
    /// All fields in form order
    pub const ALL: [SpecField; 14] = [
        SpecField::ProductCode,
        SpecField::ProductDescription,
        SpecField::Length,
        SpecField::Colour,
        SpecField::Copper,
        SpecField::Strands,
        SpecField::CoreOd,
        SpecField::SheathOd,
        SpecField::CoreColour,
        SpecField::NoOfCores,
        SpecField::CorePvc,
        SpecField::SheathPvcInner,
        SpecField::SheathPvcOuter,
        SpecField::Printing,
    ];

    /// Whether a change to this field re-runs the cable formulas.
    pub fn drives_formulas(self) -> bool {
        matches!(
            self,
            SpecField::Strands
                | SpecField::Copper
                | SpecField::Length
                | SpecField::NoOfCores
                | SpecField::CoreOd
                | SpecField::SheathOd
        )
    }

    /// Stored field name
    pub fn key(self) -> &'static str {
        match self {
            SpecField::ProductCode => "productCode",
            SpecField::ProductDescription => "productDescription",
            SpecField::Length => "length",
            SpecField::Colour => "colour",
            SpecField::Copper => "copper",
            SpecField::Strands => "strands",
            SpecField::CoreOd => "coreOD",
            SpecField::SheathOd => "sheathOD",
            SpecField::CoreColour => "coreColour",
            SpecField::NoOfCores => "noOfCores",
            SpecField::CorePvc => "corePVC",
            SpecField::SheathPvcInner => "sheathPVCInner",
            SpecField::SheathPvcOuter => "sheathPVCOuter",
            SpecField::Printing => "printing",
        }
    }

    /// Alternative names product catalogs use for the same field,
    /// the stored name first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            SpecField::ProductCode => &["productCode", "code", "itemCode"],
            SpecField::ProductDescription => &["productDescription", "description", "productName"],
            SpecField::Length => &["length", "totalLength"],
            SpecField::Copper => &["copper", "conductorSize", "gauge"],
            SpecField::Strands => &["strands", "noOfStrands"],
            SpecField::CoreOd => &["coreOD", "coreOd"],
            SpecField::SheathOd => &["sheathOD", "sheathOd"],
            SpecField::NoOfCores => &["noOfCores", "cores"],
            SpecField::CorePvc => &["corePVC", "corePvc"],
            SpecField::SheathPvcInner => &["sheathPVCInner", "sheathPvcInner"],
            SpecField::SheathPvcOuter => &["sheathPVCOuter", "sheathPvcOuter"],
            SpecField::Colour => &["colour", "color"],
            SpecField::CoreColour => &["coreColour", "coreColor"],
            SpecField::Printing => &["printing"],
        }
    }
}

/// Product geometry and descriptive fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductSpec {
    #[serde(rename = "productCode", deserialize_with = "lenient::text")]
    pub product_code: String,
    #[serde(rename = "productDescription", deserialize_with = "lenient::text")]
    pub product_description: String,
    #[serde(deserialize_with = "lenient::text")]
    pub length: String,
    #[serde(deserialize_with = "lenient::text")]
    pub colour: String,
    /// Conductor gauge
    #[serde(deserialize_with = "lenient::text")]
    pub copper: String,
    #[serde(deserialize_with = "lenient::text")]
    pub strands: String,
    #[serde(rename = "coreOD", deserialize_with = "lenient::text")]
    pub core_od: String,
    #[serde(rename = "sheathOD", deserialize_with = "lenient::text")]
    pub sheath_od: String,
    #[serde(rename = "coreColour", deserialize_with = "lenient::text")]
    pub core_colour: String,
    #[serde(rename = "noOfCores", deserialize_with = "lenient::text")]
    pub no_of_cores: String,
    #[serde(rename = "corePVC", deserialize_with = "lenient::text")]
    pub core_pvc: String,
    #[serde(rename = "sheathPVCInner", deserialize_with = "lenient::text")]
    pub sheath_pvc_inner: String,
    #[serde(rename = "sheathPVCOuter", deserialize_with = "lenient::text")]
    pub sheath_pvc_outer: String,
    #[serde(deserialize_with = "lenient::text")]
    pub printing: String,
}

impl ProductSpec {
    /// Read a field as entered
    pub fn get(&self, field: SpecField) -> &str {
        match field {
            SpecField::ProductCode => &self.product_code,
            SpecField::ProductDescription => &self.product_description,
            SpecField::Length => &self.length,
            SpecField::Colour => &self.colour,
            SpecField::Copper => &self.copper,
            SpecField::Strands => &self.strands,
            SpecField::CoreOd => &self.core_od,
            SpecField::SheathOd => &self.sheath_od,
            SpecField::CoreColour => &self.core_colour,
            SpecField::NoOfCores => &self.no_of_cores,
            SpecField::CorePvc => &self.core_pvc,
            SpecField::SheathPvcInner => &self.sheath_pvc_inner,
            SpecField::SheathPvcOuter => &self.sheath_pvc_outer,
            SpecField::Printing => &self.printing,
        }
    }

    /// Overwrite a field
    pub fn set(&mut self, field: SpecField, value: impl Into<String>) {
        let slot = match field {
            SpecField::ProductCode => &mut self.product_code,
            SpecField::ProductDescription => &mut self.product_description,
            SpecField::Length => &mut self.length,
            SpecField::Colour => &mut self.colour,
            SpecField::Copper => &mut self.copper,
            SpecField::Strands => &mut self.strands,
            SpecField::CoreOd => &mut self.core_od,
            SpecField::SheathOd => &mut self.sheath_od,
            SpecField::CoreColour => &mut self.core_colour,
            SpecField::NoOfCores => &mut self.no_of_cores,
            SpecField::CorePvc => &mut self.core_pvc,
            SpecField::SheathPvcInner => &mut self.sheath_pvc_inner,
            SpecField::SheathPvcOuter => &mut self.sheath_pvc_outer,
            SpecField::Printing => &mut self.printing,
        };
        *slot = value.into();
    }

    /// Field parsed as a number (0 when blank or invalid)
    pub fn number(&self, field: SpecField) -> Decimal {
        parse_decimal(self.get(field))
    }

    /// True when the field holds something other than whitespace
    pub fn is_present(&self, field: SpecField) -> bool {
        !self.get(field).trim().is_empty()
    }

    /// Numeric view consumed by the formula engine
    pub fn snapshot(&self) -> SpecSnapshot {
        SpecSnapshot {
            length: self.number(SpecField::Length),
            copper: self.number(SpecField::Copper),
            strands: self.number(SpecField::Strands),
            cores: self.number(SpecField::NoOfCores),
            core_od: self.number(SpecField::CoreOd),
            sheath_od: self.number(SpecField::SheathOd),
        }
    }
}

/// Numeric geometry the formulas read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecSnapshot {
    pub length: Decimal,
    pub copper: Decimal,
    pub strands: Decimal,
    pub cores: Decimal,
    pub core_od: Decimal,
    pub sheath_od: Decimal,
}

/// Number of pieces scheduled for a production run. Always >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanQuantity(u32);

impl PlanQuantity {
    /// Parse a plan as entered. Zero, negative, fractional and non-numeric
    /// input all yield `None`.
    pub fn parse(raw: &str) -> Option<PlanQuantity> {
        let trimmed = raw.trim();
        let count = match trimmed.parse::<u32>() {
            Ok(n) => n,
            Err(_) => {
                let value = Decimal::from_str(trimmed).ok()?;
                if !value.fract().is_zero() {
                    return None;
                }
                value.to_u32()?
            }
        };
        PlanQuantity::new(count)
    }

    pub fn new(count: u32) -> Option<PlanQuantity> {
        (count > 0).then_some(PlanQuantity(count))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Multiplier used for totals; an invalid plan multiplies by zero.
    pub fn factor(raw: &str) -> Decimal {
        PlanQuantity::parse(raw)
            .map(|plan| Decimal::from(plan.0))
            .unwrap_or(Decimal::ZERO)
    }
}

/// Deserializers that accept catalog and legacy values stored either as
/// strings or as bare JSON numbers.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn value_to_text(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => other.to_string(),
        }
    }

    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(value_to_text(&value))
    }

    pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).unwrap_or(0),
            Value::String(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_fallbacks() {
        assert_eq!(parse_decimal(" 0.5 "), Decimal::new(5, 1));
        assert_eq!(parse_decimal(""), Decimal::ZERO);
        assert_eq!(parse_decimal("n/a"), Decimal::ZERO);
        assert_eq!(parse_decimal("1e2"), Decimal::from(100));
    }

    #[test]
    fn test_parse_decimal_takes_leading_number() {
        assert_eq!(parse_decimal("0.5mm"), Decimal::new(5, 1));
        assert_eq!(parse_decimal("7 strands"), Decimal::from(7));
        assert_eq!(parse_decimal(".25"), Decimal::new(25, 2));
        assert_eq!(parse_decimal("-3.5x"), Decimal::new(-35, 1));
        assert_eq!(parse_decimal("+4."), Decimal::from(4));
        assert_eq!(parse_decimal("2.5e1kg"), Decimal::from(25));
        assert_eq!(parse_decimal("3e"), Decimal::from(3));
        assert_eq!(parse_decimal("mm0.5"), Decimal::ZERO);
        assert_eq!(parse_decimal("-"), Decimal::ZERO);
        assert_eq!(parse_decimal("."), Decimal::ZERO);
    }

    #[test]
    fn test_set_and_snapshot() {
        let mut spec = ProductSpec::default();
        spec.set(SpecField::Length, "100");
        spec.set(SpecField::CoreOd, "3.0");
        spec.set(SpecField::NoOfCores, "3");

        let snap = spec.snapshot();
        assert_eq!(snap.length, Decimal::from(100));
        assert_eq!(snap.core_od, Decimal::new(30, 1));
        assert_eq!(snap.cores, Decimal::from(3));
        assert_eq!(snap.sheath_od, Decimal::ZERO);
    }

    #[test]
    fn test_formula_driving_fields() {
        let driving: Vec<_> = SpecField::ALL
            .iter()
            .copied()
            .filter(|f| f.drives_formulas())
            .collect();
        assert_eq!(driving.len(), 6);
        assert!(!SpecField::Colour.drives_formulas());
        assert!(!SpecField::ProductDescription.drives_formulas());
    }

    #[test]
    fn test_plan_quantity_parse() {
        assert_eq!(PlanQuantity::parse("250").map(PlanQuantity::get), Some(250));
        assert_eq!(PlanQuantity::parse("10.0").map(PlanQuantity::get), Some(10));
        assert!(PlanQuantity::parse("0").is_none());
        assert!(PlanQuantity::parse("-3").is_none());
        assert!(PlanQuantity::parse("2.5").is_none());
        assert!(PlanQuantity::parse("").is_none());
        assert_eq!(PlanQuantity::factor("x"), Decimal::ZERO);
    }

    #[test]
    fn test_spec_accepts_numeric_json() {
        let spec: ProductSpec =
            serde_json::from_str(r#"{"productCode":"PC-1","length":100,"strands":"7"}"#).unwrap();
        assert_eq!(spec.length, "100");
        assert_eq!(spec.strands, "7");
        assert_eq!(spec.colour, "");
    }
}

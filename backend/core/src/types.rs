use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Nutrient fields the extractor knows how to quantify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NutrientField {
    Sugar,
    Sodium,
    Carbohydrate,
    Protein,
    Fat,
    SaturatedFat,
    TransFat,
    Cholesterol,
}

impl NutrientField {
    pub const ALL: [NutrientField; 8] = [
        NutrientField::Sugar,
        NutrientField::Sodium,
        NutrientField::Carbohydrate,
        NutrientField::Protein,
        NutrientField::Fat,
        NutrientField::SaturatedFat,
        NutrientField::TransFat,
        NutrientField::Cholesterol,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientField::Sugar => "SUGAR",
            NutrientField::Sodium => "SODIUM",
            NutrientField::Carbohydrate => "CARBOHYDRATE",
            NutrientField::Protein => "PROTEIN",
            NutrientField::Fat => "FAT",
            NutrientField::SaturatedFat => "SATURATED_FAT",
            NutrientField::TransFat => "TRANS_FAT",
            NutrientField::Cholesterol => "CHOLESTEROL",
        }
    }

    /// Unit values for this field are reported in unless configured otherwise.
    pub fn default_unit(&self) -> Unit {
        match self {
            NutrientField::Sodium | NutrientField::Cholesterol => Unit::Mg,
            _ => Unit::G,
        }
    }
}

impl fmt::Display for NutrientField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NutrientField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NutrientField::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown nutrient field: {s}"))
    }
}

/// Mass units a nutrient value can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Unit {
    G,
    Mg,
    Mcg,
}

impl Unit {
    pub const ALL: [Unit; 3] = [Unit::G, Unit::Mg, Unit::Mcg];

    /// Short lowercase symbol used as the canonical token in normalized text.
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::G => "g",
            Unit::Mg => "mg",
            Unit::Mcg => "mcg",
        }
    }

    fn micrograms(&self) -> f64 {
        match self {
            Unit::G => 1_000_000.0,
            Unit::Mg => 1_000.0,
            Unit::Mcg => 1.0,
        }
    }

    /// Convert `value` expressed in `self` into `target`.
    pub fn convert(&self, value: f64, target: Unit) -> f64 {
        let converted = value * self.micrograms() / target.micrograms();
        // Drop float noise from the multiplication (e.g. 1100.0000000000002)
        // without flooring small values: 40 mcg is 0.00004 g, not 0.
        round_significant(converted, 10)
    }
}

fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let scale = 10f64.powi(digits - 1 - magnitude);
    if !scale.is_finite() || scale == 0.0 {
        return value;
    }
    (value * scale).round() / scale
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Unit::G => "G",
            Unit::Mg => "MG",
            Unit::Mcg => "MCG",
        })
    }
}

/// Allergen categories reported on a label.
///
/// Covers the Korean mandatory allergen list plus the common international
/// groupings (tree nuts, fish, crustaceans, molluscs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllergenCategory {
    Milk,
    Egg,
    Peanut,
    TreeNut,
    Wheat,
    Soy,
    Fish,
    Crustacean,
    Mollusc,
    Sesame,
    Buckwheat,
}

impl AllergenCategory {
    pub const ALL: [AllergenCategory; 11] = [
        AllergenCategory::Milk,
        AllergenCategory::Egg,
        AllergenCategory::Peanut,
        AllergenCategory::TreeNut,
        AllergenCategory::Wheat,
        AllergenCategory::Soy,
        AllergenCategory::Fish,
        AllergenCategory::Crustacean,
        AllergenCategory::Mollusc,
        AllergenCategory::Sesame,
        AllergenCategory::Buckwheat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AllergenCategory::Milk => "MILK",
            AllergenCategory::Egg => "EGG",
            AllergenCategory::Peanut => "PEANUT",
            AllergenCategory::TreeNut => "TREE_NUT",
            AllergenCategory::Wheat => "WHEAT",
            AllergenCategory::Soy => "SOY",
            AllergenCategory::Fish => "FISH",
            AllergenCategory::Crustacean => "CRUSTACEAN",
            AllergenCategory::Mollusc => "MOLLUSC",
            AllergenCategory::Sesame => "SESAME",
            AllergenCategory::Buckwheat => "BUCKWHEAT",
        }
    }
}

impl fmt::Display for AllergenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllergenCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AllergenCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown allergen category: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_between_mass_units() {
        assert_eq!(Unit::G.convert(0.5, Unit::Mg), 500.0);
        assert_eq!(Unit::Mg.convert(500.0, Unit::G), 0.5);
        assert_eq!(Unit::Mcg.convert(1500.0, Unit::Mg), 1.5);
        assert_eq!(Unit::G.convert(1.1, Unit::Mg), 1100.0);
    }

    #[test]
    fn small_values_survive_conversion() {
        assert_eq!(Unit::Mcg.convert(40.0, Unit::G), 0.00004);
        assert_eq!(Unit::Mcg.convert(1.0, Unit::G), 0.000001);
        assert_eq!(Unit::Mcg.convert(2.5, Unit::Mg), 0.0025);
        assert_eq!(Unit::Mg.convert(0.0, Unit::G), 0.0);
        assert!(Unit::Mcg.convert(0.3, Unit::G) > 0.0);
    }

    #[test]
    fn field_names_round_trip_through_from_str() {
        for field in NutrientField::ALL {
            assert_eq!(field.as_str().parse::<NutrientField>().unwrap(), field);
        }
        assert!("vitamin_z".parse::<NutrientField>().is_err());
    }

    #[test]
    fn serializes_screaming_case() {
        let json = serde_json::to_string(&AllergenCategory::TreeNut).unwrap();
        assert_eq!(json, "\"TREE_NUT\"");
        let json = serde_json::to_string(&Unit::Mcg).unwrap();
        assert_eq!(json, "\"MCG\"");
    }
}

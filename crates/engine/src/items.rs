//! Recyclable item catalog.
//!
//! Quantities are always persisted as integers. Count items store the number
//! of pieces; weight items are entered in kilograms and stored in grams.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

const GRAMS_PER_KG: f64 = 1000.0;

/// How an item is measured at the counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    Count,
    Weight,
}

impl Measurement {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Weight => "weight",
        }
    }

    /// Converts a quantity typed by staff into the stored integer.
    ///
    /// Weight items are converted from kg to grams before rounding. Returns
    /// `Ok(None)` when the quantity is not positive after rounding.
    pub fn normalize_quantity(self, raw: f64) -> ResultEngine<Option<i64>> {
        if !raw.is_finite() {
            return Err(EngineError::InvalidInput(
                "quantity must be a finite number".to_string(),
            ));
        }
        if raw <= 0.0 {
            return Ok(None);
        }

        let scaled = match self {
            Self::Count => raw.round(),
            Self::Weight => (raw * GRAMS_PER_KG).round(),
        };
        if scaled >= i64::MAX as f64 {
            return Err(EngineError::InvalidInput("quantity is too large".to_string()));
        }

        let stored = scaled as i64;
        Ok((stored > 0).then_some(stored))
    }

    /// Converts a stored quantity back to the unit shown to users.
    pub fn display_quantity(self, stored: i64) -> f64 {
        match self {
            Self::Count => stored as f64,
            Self::Weight => stored as f64 / GRAMS_PER_KG,
        }
    }
}

impl TryFrom<&str> for Measurement {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "count" => Ok(Self::Count),
            "weight" => Ok(Self::Weight),
            other => Err(EngineError::InvalidInput(format!(
                "invalid measurement: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecyclableItem {
    pub id: i32,
    pub name: String,
    pub measurement: Measurement,
}

impl RecyclableItem {
    pub fn is_weight_based(&self) -> bool {
        self.measurement == Measurement::Weight
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recyclable_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub name_norm: String,
    pub measurement: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for RecyclableItem {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            measurement: Measurement::try_from(model.measurement.as_str())?,
            id: model.id,
            name: model.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_items_are_stored_in_grams() {
        assert_eq!(Measurement::Weight.normalize_quantity(2.5).unwrap(), Some(2500));
        assert_eq!(Measurement::Weight.normalize_quantity(1.2).unwrap(), Some(1200));
        assert_eq!(Measurement::Weight.normalize_quantity(0.0004).unwrap(), None);
        assert_eq!(Measurement::Weight.display_quantity(2500), 2.5);
        assert_eq!(Measurement::Weight.display_quantity(1200), 1.2);
    }

    #[test]
    fn count_items_round_to_nearest() {
        assert_eq!(Measurement::Count.normalize_quantity(3.0).unwrap(), Some(3));
        assert_eq!(Measurement::Count.normalize_quantity(2.5).unwrap(), Some(3));
        assert_eq!(Measurement::Count.normalize_quantity(0.4).unwrap(), None);
        assert_eq!(Measurement::Count.display_quantity(7), 7.0);
    }

    #[test]
    fn quantities_beyond_i64_are_rejected() {
        let err = Measurement::Count.normalize_quantity(2f64.powi(63)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
        assert!(Measurement::Weight.normalize_quantity(2f64.powi(54)).is_err());
        assert_eq!(
            Measurement::Count.normalize_quantity(2f64.powi(62)).unwrap(),
            Some(1 << 62)
        );
    }

    #[test]
    fn non_positive_quantities_are_skipped() {
        assert_eq!(Measurement::Count.normalize_quantity(0.0).unwrap(), None);
        assert_eq!(Measurement::Weight.normalize_quantity(-1.0).unwrap(), None);
    }

    #[test]
    fn non_finite_quantities_are_rejected() {
        assert!(Measurement::Count.normalize_quantity(f64::NAN).is_err());
        assert!(Measurement::Weight.normalize_quantity(f64::INFINITY).is_err());
    }
}

//! Data models for the crate dispatch service.
//!
//! This module defines the fundamental data structures for the allocation
//! engine:
//! - `ProductSize`: closed size-class enumeration
//! - `Product`: a catalog record with packing and size class
//! - `OrderLine`: one classified order line ready for reduction
//! - `CrateManifest`: the final per-category crate counts

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Size class of a product container.
///
/// The class decides which standard crate categories a unit may occupy and
/// at what effective capacity:
/// - `Small` units go into 20-slot crates.
/// - `Big` units go into 12-slot (or overflow 6-slot) crates.
/// - `Huge` units also go into the 12/6-slot categories, but their handling
///   overhead reduces the usable capacity to 10 (resp. 5) slots.
/// - `TwoInABig` units share a big-class slot in pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSize {
    Small,
    Big,
    Huge,
    TwoInABig,
}

/// A product as stored in the catalog.
///
/// `packing` is the supplier case size: when present, whole multiples of it
/// are shipped in supplier crates before any standard-crate packing. When
/// absent, the product is never bulk-packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Product {
    pub sku: String,
    pub brand: String,
    pub packing: Option<u32>,
    pub size: ProductSize,
}

/// One order line after catalog classification, ready for reduction.
///
/// # Examples
/// ```
/// use crate_dispatch::model::{OrderLine, ProductSize};
///
/// let line = OrderLine::new(20, Some(12), ProductSize::Huge);
/// assert_eq!(line.unit_count, 20);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderLine {
    pub unit_count: u64,
    pub packing: Option<u32>,
    pub size: ProductSize,
}

impl OrderLine {
    /// Creates a new order line.
    pub fn new(unit_count: u64, packing: Option<u32>, size: ProductSize) -> Self {
        Self {
            unit_count,
            packing,
            size,
        }
    }
}

/// The final crate manifest returned to the caller.
///
/// Each field counts opened category instances; a 12-slot instance may be a
/// full-capacity big crate or a reduced-capacity crate holding huge units,
/// the manifest does not distinguish the two.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CrateManifest {
    /// Number of supplier crates (full case-size multiples).
    #[serde(rename = "Supplier")]
    pub supplier: u64,
    /// Number of 6-slot crates.
    #[serde(rename = "Slot6")]
    pub slot6: u64,
    /// Number of 12-slot crates.
    #[serde(rename = "Slot12")]
    pub slot12: u64,
    /// Number of 20-slot crates.
    #[serde(rename = "Slot20")]
    pub slot20: u64,
}

impl CrateManifest {
    /// The all-zero manifest, produced by an empty order.
    pub const fn empty() -> Self {
        Self {
            supplier: 0,
            slot6: 0,
            slot12: 0,
            slot20: 0,
        }
    }

    /// Total number of standard (non-supplier) crates.
    pub fn standard_crate_count(&self) -> u64 {
        self.slot6 + self.slot12 + self.slot20
    }

    /// Total number of crates of any kind.
    pub fn total_crate_count(&self) -> u64 {
        self.supplier + self.standard_crate_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_size_serializes_with_snake_case_names() {
        assert_eq!(
            serde_json::to_string(&ProductSize::TwoInABig).unwrap(),
            "\"two_in_a_big\""
        );
        assert_eq!(
            serde_json::to_string(&ProductSize::Small).unwrap(),
            "\"small\""
        );
    }

    #[test]
    fn product_size_parses_catalog_values() {
        for (raw, expected) in [
            ("\"small\"", ProductSize::Small),
            ("\"big\"", ProductSize::Big),
            ("\"huge\"", ProductSize::Huge),
            ("\"two_in_a_big\"", ProductSize::TwoInABig),
        ] {
            let parsed: ProductSize = serde_json::from_str(raw).unwrap();
            assert_eq!(parsed, expected);
        }
    }

    #[test]
    fn manifest_serializes_with_legacy_field_names() {
        let manifest = CrateManifest {
            supplier: 1,
            slot6: 2,
            slot12: 3,
            slot20: 4,
        };
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"Supplier": 1, "Slot6": 2, "Slot12": 3, "Slot20": 4})
        );
    }

    #[test]
    fn manifest_crate_counts() {
        let manifest = CrateManifest {
            supplier: 2,
            slot6: 1,
            slot12: 3,
            slot20: 0,
        };
        assert_eq!(manifest.standard_crate_count(), 4);
        assert_eq!(manifest.total_crate_count(), 6);
        assert_eq!(CrateManifest::empty().total_crate_count(), 0);
    }
}

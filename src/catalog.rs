//! Product catalog: store ingestion, size classification and lookup.
//!
//! The catalog is loaded once from a JSON store file and kept as a plain
//! in-memory map. The allocation engine never touches it directly; callers
//! classify their order lines against a `ProductLookup` capability and hand
//! the engine fully classified lines, so the engine stays free of ambient
//! state.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::model::{OrderLine, Product, ProductSize};

/// Brands whose products are never bulk-packed in supplier crates.
const BRANDS_WITHOUT_SUPPLIER_CRATES: [&str; 2] = ["La Tournée", "Orangina"];
/// Brand whose products are all huge-class.
const HUGE_BRAND: &str = "La Tournée";
/// The one sku whose bottles pair up in a big-class slot.
const PAIRED_SKU: &str = "orangina-25";

/// Error while loading or classifying the product store.
#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    /// The deposit does not fall into any known size band.
    UnclassifiableDeposit { sku: String, deposit: f64 },
    /// A crate-prepared product declares a case size of zero.
    InvalidPacking { sku: String },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(err) => write!(f, "Could not read the product store: {}", err),
            CatalogError::Parse(err) => write!(f, "Could not parse the product store: {}", err),
            CatalogError::UnclassifiableDeposit { sku, deposit } => write!(
                f,
                "The {} product has a deposit of {} which doesn't fit into the predefined sizing",
                sku, deposit
            ),
            CatalogError::InvalidPacking { sku } => {
                write!(f, "The {} product has a case size of 0", sku)
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io(err) => Some(err),
            CatalogError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io(err)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Parse(err)
    }
}

/// One raw record of the JSON store file.
///
/// Unknown fields are rejected: a mismatching store file should fail loudly
/// at startup rather than silently misclassify products.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreRecord {
    pub sku: String,
    pub brand: String,
    pub packing: u32,
    pub deposit: f64,
    pub preparation_in_crate: bool,
}

impl StoreRecord {
    /// The effective supplier case size.
    ///
    /// Brands that are hand-prepared, and products not prepared in crates,
    /// never use supplier crates regardless of their declared packing.
    fn consolidated_packing(&self) -> Option<u32> {
        if BRANDS_WITHOUT_SUPPLIER_CRATES.contains(&self.brand.as_str()) {
            return None;
        }
        if !self.preparation_in_crate {
            return None;
        }
        Some(self.packing)
    }

    /// Derives the size class from the business attributes.
    fn size(&self) -> Result<ProductSize, CatalogError> {
        // One bottle of this sku does not fit a small slot, but two fit a
        // big one.
        if self.sku == PAIRED_SKU {
            return Ok(ProductSize::TwoInABig);
        }
        if self.brand == HUGE_BRAND {
            return Ok(ProductSize::Huge);
        }

        // Deposit bands tolerate the base-2 misrepresentation of 0.2/0.4.
        if 0.19 < self.deposit && self.deposit < 0.21 {
            return Ok(ProductSize::Small);
        }
        if 0.39 < self.deposit && self.deposit < 0.41 {
            return Ok(ProductSize::Big);
        }

        // The store data carries a bunch of zero deposits; those containers
        // are treated as big for safety.
        if self.deposit == 0.0 {
            return Ok(ProductSize::Big);
        }

        Err(CatalogError::UnclassifiableDeposit {
            sku: self.sku.clone(),
            deposit: self.deposit,
        })
    }

    /// Classifies the record into a catalog product.
    pub fn into_product(self) -> Result<Product, CatalogError> {
        let size = self.size()?;
        let packing = self.consolidated_packing();
        if packing == Some(0) {
            return Err(CatalogError::InvalidPacking { sku: self.sku });
        }
        Ok(Product {
            sku: self.sku,
            brand: self.brand,
            packing,
            size,
        })
    }
}

/// Read-only lookup capability handed to the classification step.
///
/// The engine receives this as an explicit parameter; there is no global
/// catalog.
pub trait ProductLookup {
    fn lookup(&self, sku: &str) -> Option<&Product>;
}

/// In-memory product catalog.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    products: HashMap<String, Product>,
}

impl Catalog {
    /// Builds a catalog from already classified products.
    ///
    /// A duplicate sku keeps the last record.
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: products
                .into_iter()
                .map(|product| (product.sku.clone(), product))
                .collect(),
        }
    }

    /// Loads and classifies the JSON store file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)?;
        let records: Vec<StoreRecord> = serde_json::from_str(&raw)?;
        let products = records
            .into_iter()
            .map(StoreRecord::into_product)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_products(products))
    }

    /// Number of products in the catalog.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl ProductLookup for Catalog {
    fn lookup(&self, sku: &str) -> Option<&Product> {
        self.products.get(sku)
    }
}

/// Result of classifying one order line: either a line the engine can
/// reduce, or the sku the catalog does not know.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassifiedLine {
    Known(OrderLine),
    Missing(String),
}

/// Classifies one (sku, unit count) pair against the catalog.
pub fn classify_line(lookup: &impl ProductLookup, sku: &str, unit_count: u64) -> ClassifiedLine {
    match lookup.lookup(sku) {
        Some(product) => {
            ClassifiedLine::Known(OrderLine::new(unit_count, product.packing, product.size))
        }
        None => ClassifiedLine::Missing(sku.to_string()),
    }
}

/// Classifies a whole batch.
///
/// Every sku is looked up before any failure surfaces, so the error carries
/// the complete set of unknown skus, not just the first.
pub fn classify_batch<'a>(
    lookup: &impl ProductLookup,
    items: impl IntoIterator<Item = (&'a str, u64)>,
) -> Result<Vec<OrderLine>, Vec<String>> {
    let mut lines = Vec::new();
    let mut missing = Vec::new();

    for (sku, unit_count) in items {
        match classify_line(lookup, sku, unit_count) {
            ClassifiedLine::Known(line) => lines.push(line),
            ClassifiedLine::Missing(sku) => missing.push(sku),
        }
    }

    if missing.is_empty() {
        Ok(lines)
    } else {
        Err(missing)
    }
}

//! Commerce catalog entries consumed by the command resolver.

use serde::{Deserialize, Serialize};

/// A payment method configured in the commerce backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentType {
    #[serde(default)]
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

/// A delivery method configured in the commerce backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryType {
    #[serde(default)]
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

/// Unit of measure attached to an offer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sym: String,
}

/// A sellable variant of a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub article: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub unit: Unit,
}

/// A catalog product with its offers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub offers: Vec<Offer>,
}

/// Name predicate for a product query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub name: String,
}

impl ProductFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

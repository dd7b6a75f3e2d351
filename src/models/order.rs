use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Currencies accepted on orders. Anything else is recorded as `other`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Currency {
    #[default]
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "BRL")]
    Brl,
    #[serde(rename = "other")]
    Other,
}

impl Currency {
    /// Missing values default to USD; unrecognized ones become `Other`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_uppercase()) {
            None => Currency::Usd,
            Some(code) => match code.as_str() {
                "USD" => Currency::Usd,
                "EUR" => Currency::Eur,
                "BRL" => Currency::Brl,
                _ => Currency::Other,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Brl => "BRL",
            Currency::Other => "other",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Electronics,
    Books,
    Clothing,
    Food,
    #[default]
    Other,
}

impl ProductCategory {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("electronics") => ProductCategory::Electronics,
            Some("books") => ProductCategory::Books,
            Some("clothing") => ProductCategory::Clothing,
            Some("food") => ProductCategory::Food,
            _ => ProductCategory::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Electronics => "electronics",
            ProductCategory::Books => "books",
            ProductCategory::Clothing => "clothing",
            ProductCategory::Food => "food",
            ProductCategory::Other => "other",
        }
    }
}

/// A validated order request, before it has an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub item: String,
    pub price: f64,
    pub currency: Currency,
    pub category: ProductCategory,
    pub customer: Option<String>,
}

/// An order as stored and returned by the API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Order {
    pub id: String,
    pub item: String,
    pub price: f64,
    pub currency: Currency,
    pub category: ProductCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Assigns a fresh UUID and creation timestamp.
    pub fn create(new: NewOrder) -> Self {
        Order {
            id: Uuid::new_v4().to_string(),
            item: new.item,
            price: new.price,
            currency: new.currency,
            category: new.category,
            customer: new.customer,
            created_at: Utc::now(),
        }
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::products::ProductDescriptor;

/// Placeholder for a text field that could not be determined from the page.
pub const NOT_AVAILABLE: &str = "N/A";

/// Dollar amount rounded to cents, or [`NOT_AVAILABLE`] when undetermined.
#[must_use]
pub fn format_price(price: Option<Decimal>) -> String {
    match price {
        Some(p) => {
            let mut p = p.round_dp(2);
            p.rescale(2);
            format!("${p}")
        }
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Facts a site parser recovered from one page, before they are stamped
/// with capture time and product identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFacts {
    /// Page title, or [`NOT_AVAILABLE`].
    pub title: String,
    /// `None` means the price could not be determined; never defaulted to zero.
    pub price: Option<Decimal>,
    /// Free-text availability status, or [`NOT_AVAILABLE`].
    pub availability: String,
}

impl Default for PageFacts {
    fn default() -> Self {
        Self {
            title: NOT_AVAILABLE.to_string(),
            price: None,
            availability: NOT_AVAILABLE.to_string(),
        }
    }
}

/// Normalized output of one successful scrape, handed to the persistence
/// layer and never retained by the extraction engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub captured_at: DateTime<Utc>,
    /// Display name echoed from the product descriptor.
    pub product_name: String,
    pub title: String,
    pub price: Option<Decimal>,
    pub availability: String,
    pub source_url: String,
}

impl ExtractionResult {
    /// Stamps parsed page facts with the descriptor identity and a capture time.
    #[must_use]
    pub fn from_facts(
        descriptor: &ProductDescriptor,
        facts: PageFacts,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            captured_at,
            product_name: descriptor.name.clone(),
            title: facts.title,
            price: facts.price,
            availability: facts.availability,
            source_url: descriptor.url.clone(),
        }
    }

    /// Returns `true` when both results describe the same page state,
    /// ignoring when they were captured.
    #[must_use]
    pub fn same_facts(&self, other: &Self) -> bool {
        self.product_name == other.product_name
            && self.title == other.title
            && self.price == other.price
            && self.availability == other.availability
            && self.source_url == other.source_url
    }
}

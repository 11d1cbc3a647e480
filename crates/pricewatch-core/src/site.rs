use serde::{Deserialize, Serialize};

/// Retailer a product page belongs to; selects the parsing strategy.
///
/// Identifiers without a registered parser deserialize into
/// [`SiteId::Unknown`] so that configuration loading never has to know the
/// full parser set. The extraction layer rejects them at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SiteId {
    Amazon,
    BestBuy,
    Unknown(String),
}

impl SiteId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            SiteId::Amazon => "amazon",
            SiteId::BestBuy => "bestbuy",
            SiteId::Unknown(raw) => raw,
        }
    }

    /// Whether this site is parsed purely from CSS selectors, which makes
    /// the full selector set mandatory in configuration.
    #[must_use]
    pub fn requires_selectors(&self) -> bool {
        matches!(self, SiteId::Amazon)
    }
}

impl From<String> for SiteId {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "amazon" => SiteId::Amazon,
            "bestbuy" => SiteId::BestBuy,
            _ => SiteId::Unknown(raw),
        }
    }
}

impl From<&str> for SiteId {
    fn from(raw: &str) -> Self {
        SiteId::from(raw.to_owned())
    }
}

impl From<SiteId> for String {
    fn from(site: SiteId) -> Self {
        site.as_str().to_owned()
    }
}

impl std::fmt::Display for SiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

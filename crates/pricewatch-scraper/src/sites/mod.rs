//! Per-retailer parsing strategies.

pub mod bestbuy;
pub mod selector;

use pricewatch_core::{PageFacts, ProductDescriptor, SiteId};

use crate::debug_sink::DebugSink;
use crate::error::ParseError;

/// Closed set of parsing strategies. Each supported [`SiteId`] maps to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteParser {
    /// Plain CSS selector queries against the rendered markup.
    Selectors,
    /// Recovery of the data object embedded in a server-rendered script.
    EmbeddedJson,
}

impl SiteParser {
    /// Returns `None` for sites without a registered parser.
    #[must_use]
    pub fn for_site(site: &SiteId) -> Option<Self> {
        match site {
            SiteId::Amazon => Some(SiteParser::Selectors),
            SiteId::BestBuy => Some(SiteParser::EmbeddedJson),
            SiteId::Unknown(_) => None,
        }
    }

    /// # Errors
    ///
    /// Only [`SiteParser::EmbeddedJson`] can fail, and only when the embedded
    /// payload is missing or cannot be decoded.
    pub fn parse(
        self,
        page: &str,
        descriptor: &ProductDescriptor,
        sink: &dyn DebugSink,
    ) -> Result<PageFacts, ParseError> {
        match self {
            SiteParser::Selectors => Ok(selector::parse_by_selectors(page, descriptor)),
            SiteParser::EmbeddedJson => bestbuy::parse_embedded_json(page, descriptor, sink),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_sites_have_parsers() {
        assert_eq!(
            SiteParser::for_site(&SiteId::Amazon),
            Some(SiteParser::Selectors)
        );
        assert_eq!(
            SiteParser::for_site(&SiteId::BestBuy),
            Some(SiteParser::EmbeddedJson)
        );
        assert_eq!(
            SiteParser::for_site(&SiteId::Unknown("newegg".to_owned())),
            None
        );
    }
}

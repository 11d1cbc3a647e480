use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::site::SiteId;
use crate::ConfigError;

/// Selector keys every selector-based site must define.
pub const REQUIRED_SELECTORS: [&str; 3] = ["title", "price", "availability"];

/// Configuration for one tracked product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDescriptor {
    pub name: String,
    pub url: String,
    pub site: SiteId,
    /// Semantic field name (`title`, `price`, `availability`) → CSS selector.
    #[serde(default)]
    pub selectors: HashMap<String, String>,
    /// Pinned local snapshot of the page, read instead of fetching `url`.
    #[serde(default)]
    pub capture: Option<PathBuf>,
}

impl ProductDescriptor {
    /// Returns the configured selector for `field`, ignoring blank entries.
    #[must_use]
    pub fn selector(&self, field: &str) -> Option<&str> {
        self.selectors
            .get(field)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// URL-safe slug of the product name. See [`slugify`].
    #[must_use]
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

/// Generate a URL-safe slug from a display name.
///
/// Whitespace becomes `-`, other non-alphanumeric characters are dropped and
/// runs of `-` collapse.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else if c.is_whitespace() {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductsFile {
    pub products: Vec<ProductDescriptor>,
}

impl ProductsFile {
    /// Finds a product by its slug.
    #[must_use]
    pub fn find_by_slug(&self, slug: &str) -> Option<&ProductDescriptor> {
        self.products.iter().find(|p| p.slug() == slug)
    }

    /// Finds a product by display name, ignoring ASCII case.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&ProductDescriptor> {
        self.products
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }
}

/// Load and validate the product list from a YAML file.
///
/// Relative `capture` paths are resolved against the directory containing
/// the products file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_products(path: &Path) -> Result<ProductsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProductsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut products_file = parse_products(&content)?;

    if let Some(base) = path.parent() {
        for product in &mut products_file.products {
            if let Some(capture) = product.capture.take() {
                product.capture = Some(if capture.is_relative() {
                    base.join(capture)
                } else {
                    capture
                });
            }
        }
    }

    Ok(products_file)
}

/// Parse and validate products YAML that has already been read into memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_products(content: &str) -> Result<ProductsFile, ConfigError> {
    let products_file: ProductsFile = serde_yaml::from_str(content)?;
    validate_products(&products_file)?;
    Ok(products_file)
}

fn validate_products(products_file: &ProductsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_slugs = HashSet::new();

    for product in &products_file.products {
        if product.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "product name must be non-empty".to_string(),
            ));
        }

        if !seen_names.insert(product.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate product name: '{}'",
                product.name
            )));
        }

        let slug = product.slug();
        if slug.is_empty() {
            return Err(ConfigError::Validation(format!(
                "product name '{}' produces an empty slug",
                product.name
            )));
        }
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate product slug: '{}' (from product '{}')",
                slug, product.name
            )));
        }

        validate_url(product)?;

        if product.site.requires_selectors() {
            let missing: Vec<&str> = REQUIRED_SELECTORS
                .iter()
                .copied()
                .filter(|field| product.selector(field).is_none())
                .collect();
            if !missing.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "product '{}' on site '{}' is missing selectors: {}",
                    product.name,
                    product.site,
                    missing.join(", ")
                )));
            }
        }
    }

    Ok(())
}

fn validate_url(product: &ProductDescriptor) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(&product.url).map_err(|e| {
        ConfigError::Validation(format!(
            "product '{}' has invalid url '{}': {e}",
            product.name, product.url
        ))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(format!(
            "product '{}' url must use http or https, got '{}'",
            product.name,
            parsed.scheme()
        )));
    }

    Ok(())
}

#[cfg(test)]
#[path = "products_test.rs"]
mod tests;

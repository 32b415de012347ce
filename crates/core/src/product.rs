//! Product shapes shared by the cart and sync layers.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::ProductId;
use crate::money::Price;

/// The minimal product payload a screen hands to cart/wishlist operations.
///
/// Catalog payloads are loosely shaped upstream, so every field the domain
/// depends on is validated before any mutation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    /// Logo of the product's brand, when the catalog attaches one.
    #[serde(default)]
    pub brand_logo: Option<String>,
}

impl ProductSummary {
    /// The image the cart should carry: brand logo when present, otherwise
    /// the product image.
    pub fn display_image(&self) -> Option<String> {
        self.brand_logo.clone().or_else(|| self.image.clone())
    }

    /// Reject payloads missing any field a mutation depends on.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("product name is empty"));
        }
        if !self.price.is_positive() {
            return Err(DomainError::validation(format!(
                "product '{}' has non-positive price",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn widget() -> ProductSummary {
        ProductSummary {
            id: "p-1".parse().unwrap(),
            name: "Widget".to_string(),
            price: Price::new(dec!(9.99)),
            image: Some("widget.png".to_string()),
            brand_logo: None,
        }
    }

    #[test]
    fn valid_product_passes_validation() {
        assert!(widget().validate().is_ok());
    }

    #[test]
    fn blank_name_fails_validation() {
        let mut product = widget();
        product.name = "  ".to_string();
        assert!(matches!(
            product.validate(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn zero_price_fails_validation() {
        let mut product = widget();
        product.price = Price::ZERO;
        assert!(product.validate().is_err());
    }

    #[test]
    fn brand_logo_wins_over_product_image() {
        let mut product = widget();
        product.brand_logo = Some("brand.png".to_string());
        assert_eq!(product.display_image().as_deref(), Some("brand.png"));

        product.brand_logo = None;
        assert_eq!(product.display_image().as_deref(), Some("widget.png"));
    }
}

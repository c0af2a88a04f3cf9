//! Catalog model: what the bakery sells and what it advertises.
//!
//! These types mirror the resources the bakery REST API exposes. Field names
//! are `snake_case` on the wire, but camelCase aliases are accepted because
//! older API builds emitted both.
//!
//! Promotions and banners are purely presentational. They never reach the
//! specials evaluator, which only accepts [`Special`] values.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::specials::Special;
use crate::types::{
    BannerId, BannerKind, CategoryId, DateWindow, DisplayLocation, ProductId, PromotionId,
    SpecialId,
};

/// Deserialize `null` as the type's default (APIs send `null` for empty lists).
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// Products & Categories
// =============================================================================

/// A product on the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default, alias = "categoryId")]
    pub category_id: Option<CategoryId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// First image, used as the cart thumbnail.
    #[must_use]
    pub fn image_ref(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Case-insensitive substring match on the name or description.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.name.to_lowercase().contains(&term)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&term))
    }
}

/// Menu ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    #[default]
    Name,
    PriceLow,
    PriceHigh,
    /// Most recently added first; products without a date go last.
    Newest,
}

impl ProductSort {
    /// Sort `products` in place. Stable, so ties keep catalog order.
    pub fn apply(self, products: &mut [&Product]) {
        match self {
            Self::Name => products.sort_by_cached_key(|p| p.name.to_lowercase()),
            Self::PriceLow => products.sort_by(|a, b| a.price.cmp(&b.price)),
            Self::PriceHigh => products.sort_by(|a, b| b.price.cmp(&a.price)),
            Self::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
    }
}

/// A menu category (cookies, cakes, breads...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub active: bool,
}

// =============================================================================
// Promotions & Banners
// =============================================================================

/// Marketing slide shown on the homepage or specials page. Carries no pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: PromotionId,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "buttonText")]
    pub button_text: Option<String>,
    #[serde(default, alias = "buttonLink")]
    pub button_link: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(alias = "displayLocation")]
    pub display_location: DisplayLocation,
    #[serde(default)]
    pub order: i32,
    #[serde(alias = "startDate")]
    pub start_date: DateTime<Utc>,
    #[serde(alias = "endDate")]
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub active: bool,
}

impl Promotion {
    /// Whether the promotion should be shown at `now`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active
            && DateWindow {
                start: self.start_date,
                end: self.end_date,
            }
            .contains(now)
    }
}

/// Site announcement strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: BannerKind,
    #[serde(default)]
    pub dismissible: bool,
    #[serde(alias = "displayLocation")]
    pub display_location: DisplayLocation,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, alias = "linkText")]
    pub link_text: Option<String>,
    #[serde(alias = "startDate")]
    pub start_date: DateTime<Utc>,
    #[serde(alias = "endDate")]
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub active: bool,
}

impl Banner {
    /// Whether the banner should be shown at `now`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active
            && DateWindow {
                start: self.start_date,
                end: self.end_date,
            }
            .contains(now)
    }
}

/// Store settings (hours, contact details, feature toggles) as loose JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(BTreeMap<String, serde_json::Value>);

impl Settings {
    /// Raw setting value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Setting as a string, if it is one.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(serde_json::Value::as_str)
    }

    /// Setting as a bool. Accepts `"true"`/`"false"` strings as stored by the admin form.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            serde_json::Value::Bool(b) => Some(*b),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Number of settings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no settings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, serde_json::Value)> for Settings {
    fn from_iter<I: IntoIterator<Item = (String, serde_json::Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Snapshot of every catalog list, as of the last completed fetch.
///
/// Each list is independent: a failed fetch of one leaves it empty without
/// affecting the others.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub specials: Vec<Special>,
    #[serde(default)]
    pub promotions: Vec<Promotion>,
    #[serde(default)]
    pub banners: Vec<Banner>,
    #[serde(default)]
    pub settings: Settings,
}

impl Catalog {
    /// Look up a product by ID, active or not.
    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Look up a special by ID, live or not.
    #[must_use]
    pub fn special(&self, id: SpecialId) -> Option<&Special> {
        self.specials.iter().find(|s| s.id == id)
    }

    /// Products currently for sale.
    pub fn active_products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.active)
    }

    /// Active product by id, or by slug when `key` is not a number.
    #[must_use]
    pub fn find_active_product(&self, key: &str) -> Option<&Product> {
        let key = key.trim();
        match key.parse::<i32>() {
            Ok(id) => self.active_products().find(|p| p.id == ProductId::new(id)),
            Err(_) => self
                .active_products()
                .find(|p| !p.slug.is_empty() && p.slug.eq_ignore_ascii_case(key)),
        }
    }

    /// Up to `limit` other active products from the same category.
    #[must_use]
    pub fn related_products(&self, product: &Product, limit: usize) -> Vec<&Product> {
        let Some(category_id) = product.category_id else {
            return Vec::new();
        };
        self.active_products()
            .filter(|p| p.id != product.id && p.category_id == Some(category_id))
            .take(limit)
            .collect()
    }

    /// Look up a category by ID.
    #[must_use]
    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Featured products currently for sale.
    pub fn featured_products(&self) -> impl Iterator<Item = &Product> {
        self.active_products().filter(|p| p.featured)
    }

    /// Specials that are switched on and inside their date window at `now`.
    #[must_use]
    pub fn active_specials(&self, now: DateTime<Utc>) -> Vec<&Special> {
        self.specials.iter().filter(|s| s.is_live(now)).collect()
    }

    /// Live promotions, optionally limited to one location, in display order.
    #[must_use]
    pub fn active_promotions(
        &self,
        now: DateTime<Utc>,
        location: Option<DisplayLocation>,
    ) -> Vec<&Promotion> {
        let mut live: Vec<_> = self
            .promotions
            .iter()
            .filter(|p| p.is_live(now))
            .filter(|p| location.is_none_or(|loc| p.display_location == loc))
            .collect();
        live.sort_by_key(|p| (p.order, p.id));
        live
    }

    /// Live banners, hiding dismissible ones the visitor already closed.
    #[must_use]
    pub fn active_banners(&self, now: DateTime<Utc>, dismissed: &[BannerId]) -> Vec<&Banner> {
        self.banners
            .iter()
            .filter(|b| b.is_live(now))
            .filter(|b| !(b.dismissible && dismissed.contains(&b.id)))
            .collect()
    }

    /// Names of the given categories, in catalog order.
    #[must_use]
    pub fn category_names(&self, ids: &[CategoryId]) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|c| ids.contains(&c.id))
            .map(|c| c.name.as_str())
            .collect()
    }
}

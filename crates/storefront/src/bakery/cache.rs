//! Cache types for bakery API responses.

use llama_treats_core::{Banner, Category, Product, Promotion, Settings, Special};

/// Cache key for catalog lists.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Categories,
    Specials,
    Promotions,
    Banners,
    Settings,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Vec<Product>),
    Categories(Vec<Category>),
    Specials(Vec<Special>),
    Promotions(Vec<Promotion>),
    Banners(Vec<Banner>),
    Settings(Settings),
}

//! The canonical special.
//!
//! The bakery API has shipped specials in several shapes over time: camelCase
//! and `snake_case` field names, `value` as a bare number or as an object, and
//! the legacy `discount_percentage` type tag. [`RawSpecial`] accepts all of
//! them; converting it into a [`Special`] validates the terms and settles the
//! shape once, so nothing downstream ever inspects field names.

use core::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::null_as_default;
use crate::types::{CategoryId, DateWindow, ProductId, SpecialId, format_price};

/// Errors raised while turning a [`RawSpecial`] into a [`Special`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecialError {
    #[error("{0} special has no value")]
    MissingValue(SpecialType),
    #[error("percentage must be above 0 and at most 100 (got {0})")]
    InvalidPercent(Decimal),
    #[error("discount amount must be positive (got {0})")]
    InvalidAmount(Decimal),
    #[error("special price cannot be negative (got {0})")]
    InvalidPrice(Decimal),
    #[error("buy and get quantities must be at least 1 (got {0})")]
    InvalidQuantity(i64),
    #[error("minimum purchase cannot be negative (got {0})")]
    InvalidMinPurchase(Decimal),
    #[error("start date is after end date")]
    InvertedWindow,
}

/// Discount rule family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialType {
    #[serde(alias = "discount_percentage")]
    PercentageDiscount,
    BundleDiscount,
    BuyXGetY,
    FixedPrice,
}

impl SpecialType {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PercentageDiscount => "percentage_discount",
            Self::BundleDiscount => "bundle_discount",
            Self::BuyXGetY => "buy_x_get_y",
            Self::FixedPrice => "fixed_price",
        }
    }
}

impl fmt::Display for SpecialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared set of qualifying items.
///
/// Explicit products win over categories; an empty scope means every active
/// product qualifies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub product_ids: Vec<ProductId>,
    pub category_ids: Vec<CategoryId>,
}

impl Scope {
    /// Whether the scope declares nothing and so covers the whole menu.
    #[must_use]
    pub fn is_blanket(&self) -> bool {
        self.product_ids.is_empty() && self.category_ids.is_empty()
    }
}

/// Where a buy-X-get-Y offer counts purchases and draws free items from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromoScopes {
    /// The special's own scope is both the count basis and the free pool.
    SingleScope,
    /// Purchases count against `buy`; free items come from `get`.
    TwoPart { buy: Scope, get: Scope },
}

/// Terms of a buy-X-get-Y offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyXGetY {
    pub buy_quantity: u32,
    pub get_quantity: u32,
    pub scopes: PromoScopes,
}

impl BuyXGetY {
    #[must_use]
    pub const fn is_two_part(&self) -> bool {
        matches!(self.scopes, PromoScopes::TwoPart { .. })
    }
}

/// What the special gives the buyer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialKind {
    /// Percent off qualifying items, `(0, 100]`.
    PercentageDiscount { percent: Decimal },
    /// Flat amount off when the bundle is in the cart.
    BundleDiscount { amount: Decimal },
    /// Qualifying items sell at this unit price.
    FixedPrice { price: Decimal },
    BuyXGetY(BuyXGetY),
}

/// A validated discount rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSpecial", into = "RawSpecial")]
pub struct Special {
    pub id: SpecialId,
    pub name: String,
    pub description: Option<String>,
    pub kind: SpecialKind,
    pub scope: Scope,
    pub window: DateWindow,
    pub active: bool,
    pub min_purchase: Option<Decimal>,
    pub max_uses: Option<u32>,
    pub used_count: u32,
    pub code: Option<String>,
    pub image: Option<String>,
}

impl Special {
    #[must_use]
    pub const fn special_type(&self) -> SpecialType {
        match self.kind {
            SpecialKind::PercentageDiscount { .. } => SpecialType::PercentageDiscount,
            SpecialKind::BundleDiscount { .. } => SpecialType::BundleDiscount,
            SpecialKind::FixedPrice { .. } => SpecialType::FixedPrice,
            SpecialKind::BuyXGetY(_) => SpecialType::BuyXGetY,
        }
    }

    /// Switched on and inside its date window.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active && self.window.contains(now)
    }

    /// Buy-X-get-Y terms, if this is one.
    #[must_use]
    pub const fn buy_x_get_y(&self) -> Option<&BuyXGetY> {
        match &self.kind {
            SpecialKind::BuyXGetY(terms) => Some(terms),
            _ => None,
        }
    }

    /// Whether `code` redeems this special (case-insensitive, trimmed).
    #[must_use]
    pub fn matches_code(&self, code: &str) -> bool {
        self.code
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(code.trim()))
    }

    /// Whether the usage limit has been reached.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.max_uses.is_some_and(|max| self.used_count >= max)
    }

    /// Badge text shown on the special's card.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.kind {
            SpecialKind::PercentageDiscount { percent } => format!("{}% OFF", percent.normalize()),
            SpecialKind::BundleDiscount { amount } => format!("{} OFF Bundle", short_price(*amount)),
            SpecialKind::FixedPrice { price } => format!("Special Price: {}", format_price(*price)),
            SpecialKind::BuyXGetY(terms) => {
                format!("Buy {}, Get {} Free", terms.buy_quantity, terms.get_quantity)
            }
        }
    }
}

/// `$5` for whole dollars, `$2.50` otherwise.
fn short_price(amount: Decimal) -> String {
    if amount.fract().is_zero() {
        format!("${}", amount.trunc().normalize())
    } else {
        format_price(amount)
    }
}

// =============================================================================
// Wire shape
// =============================================================================

/// A special exactly as the bakery API sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSpecial {
    pub id: SpecialId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub special_type: SpecialType,
    #[serde(default)]
    pub value: Option<RawValue>,
    #[serde(default, alias = "productIds", deserialize_with = "null_as_default")]
    pub product_ids: Vec<ProductId>,
    #[serde(default, alias = "categoryIds", deserialize_with = "null_as_default")]
    pub category_ids: Vec<CategoryId>,
    #[serde(alias = "startDate")]
    pub start_date: DateTime<Utc>,
    #[serde(alias = "endDate")]
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub active: bool,
    #[serde(default, alias = "minPurchase")]
    pub min_purchase: Option<Decimal>,
    #[serde(default, alias = "maxUses")]
    pub max_uses: Option<u32>,
    #[serde(default, alias = "usedCount", deserialize_with = "null_as_default")]
    pub used_count: u32,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// `value` is a bare amount for simple discounts, an object otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Amount(Decimal),
    Terms(RawTerms),
}

/// Object form of `value`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTerms {
    #[serde(default, alias = "buyQuantity", skip_serializing_if = "Option::is_none")]
    pub buy_quantity: Option<i64>,
    #[serde(default, alias = "getQuantity", skip_serializing_if = "Option::is_none")]
    pub get_quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Decimal>,
    #[serde(default, alias = "discount", skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(
        default,
        alias = "buyProductIds",
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub buy_product_ids: Vec<ProductId>,
    #[serde(
        default,
        alias = "buyCategoryIds",
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub buy_category_ids: Vec<CategoryId>,
    #[serde(
        default,
        alias = "getProductIds",
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub get_product_ids: Vec<ProductId>,
    #[serde(
        default,
        alias = "getCategoryIds",
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub get_category_ids: Vec<CategoryId>,
}

impl RawTerms {
    fn declares_sides(&self) -> bool {
        !(self.buy_product_ids.is_empty()
            && self.buy_category_ids.is_empty()
            && self.get_product_ids.is_empty()
            && self.get_category_ids.is_empty())
    }
}

impl RawValue {
    /// The amount, whether given bare or under one of the object keys.
    fn amount(&self, keys: impl Fn(&RawTerms) -> Option<Decimal>) -> Option<Decimal> {
        match self {
            Self::Amount(amount) => Some(*amount),
            Self::Terms(terms) => keys(terms),
        }
    }
}

fn parse_kind(special_type: SpecialType, value: Option<RawValue>) -> Result<SpecialKind, SpecialError> {
    let missing = || SpecialError::MissingValue(special_type);

    match special_type {
        SpecialType::PercentageDiscount => {
            let percent = value
                .and_then(|v| v.amount(|t| t.percentage.or(t.amount)))
                .ok_or_else(missing)?;
            if percent <= Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
                return Err(SpecialError::InvalidPercent(percent));
            }
            Ok(SpecialKind::PercentageDiscount { percent })
        }
        SpecialType::BundleDiscount => {
            let amount = value.and_then(|v| v.amount(|t| t.amount)).ok_or_else(missing)?;
            if amount <= Decimal::ZERO {
                return Err(SpecialError::InvalidAmount(amount));
            }
            Ok(SpecialKind::BundleDiscount { amount })
        }
        SpecialType::FixedPrice => {
            let price = value.and_then(|v| v.amount(|t| t.price)).ok_or_else(missing)?;
            if price.is_sign_negative() && !price.is_zero() {
                return Err(SpecialError::InvalidPrice(price));
            }
            Ok(SpecialKind::FixedPrice { price })
        }
        SpecialType::BuyXGetY => {
            let Some(RawValue::Terms(terms)) = value else {
                return Err(missing());
            };
            let quantity = |q: Option<i64>| -> Result<u32, SpecialError> {
                let q = q.unwrap_or(1);
                u32::try_from(q)
                    .ok()
                    .filter(|q| *q > 0)
                    .ok_or(SpecialError::InvalidQuantity(q))
            };
            let buy_quantity = quantity(terms.buy_quantity)?;
            let get_quantity = quantity(terms.get_quantity)?;

            let scopes = if terms.declares_sides() {
                PromoScopes::TwoPart {
                    buy: Scope {
                        product_ids: terms.buy_product_ids,
                        category_ids: terms.buy_category_ids,
                    },
                    get: Scope {
                        product_ids: terms.get_product_ids,
                        category_ids: terms.get_category_ids,
                    },
                }
            } else {
                PromoScopes::SingleScope
            };

            Ok(SpecialKind::BuyXGetY(BuyXGetY {
                buy_quantity,
                get_quantity,
                scopes,
            }))
        }
    }
}

impl TryFrom<RawSpecial> for Special {
    type Error = SpecialError;

    fn try_from(raw: RawSpecial) -> Result<Self, Self::Error> {
        let window =
            DateWindow::new(raw.start_date, raw.end_date).ok_or(SpecialError::InvertedWindow)?;
        if let Some(min) = raw
            .min_purchase
            .filter(|m| m.is_sign_negative() && !m.is_zero())
        {
            return Err(SpecialError::InvalidMinPurchase(min));
        }
        let kind = parse_kind(raw.special_type, raw.value)?;
        let code = raw
            .code
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty());

        Ok(Self {
            id: raw.id,
            name: raw.name,
            description: raw.description,
            kind,
            scope: Scope {
                product_ids: raw.product_ids,
                category_ids: raw.category_ids,
            },
            window,
            active: raw.active,
            min_purchase: raw.min_purchase,
            max_uses: raw.max_uses,
            used_count: raw.used_count,
            code,
            image: raw.image,
        })
    }
}

impl From<Special> for RawSpecial {
    fn from(special: Special) -> Self {
        let special_type = special.special_type();
        let value = match special.kind {
            SpecialKind::PercentageDiscount { percent } => RawValue::Amount(percent),
            SpecialKind::BundleDiscount { amount } => RawValue::Amount(amount),
            SpecialKind::FixedPrice { price } => RawValue::Amount(price),
            SpecialKind::BuyXGetY(terms) => {
                let mut raw = RawTerms {
                    buy_quantity: Some(i64::from(terms.buy_quantity)),
                    get_quantity: Some(i64::from(terms.get_quantity)),
                    ..RawTerms::default()
                };
                if let PromoScopes::TwoPart { buy, get } = terms.scopes {
                    raw.buy_product_ids = buy.product_ids;
                    raw.buy_category_ids = buy.category_ids;
                    raw.get_product_ids = get.product_ids;
                    raw.get_category_ids = get.category_ids;
                }
                RawValue::Terms(raw)
            }
        };

        Self {
            id: special.id,
            name: special.name,
            description: special.description,
            special_type,
            value: Some(value),
            product_ids: special.scope.product_ids,
            category_ids: special.scope.category_ids,
            start_date: special.window.start,
            end_date: special.window.end,
            active: special.active,
            min_purchase: special.min_purchase,
            max_uses: special.max_uses,
            used_count: special.used_count,
            code: special.code,
            image: special.image,
        }
    }
}

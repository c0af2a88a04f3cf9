//! Enums shared by the catalog and checkout.

use serde::{Deserialize, Serialize};

/// How the buyer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentType {
    /// Buyer collects from the bakery at a chosen date and time slot.
    #[default]
    Pickup,
    /// Bakery delivers to the buyer's address.
    Delivery,
}

impl FulfillmentType {
    /// Wire value (`pickup` / `delivery`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
        }
    }
}

impl std::fmt::Display for FulfillmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a promotion or banner is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayLocation {
    HomepageHero,
    HomepageBanner,
    SpecialsPage,
    SiteWide,
    /// Any location this build does not know about yet.
    #[serde(other)]
    Other,
}

impl DisplayLocation {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HomepageHero => "homepage_hero",
            Self::HomepageBanner => "homepage_banner",
            Self::SpecialsPage => "specials_page",
            Self::SiteWide => "site_wide",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for DisplayLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "homepage_hero" => Ok(Self::HomepageHero),
            "homepage_banner" => Ok(Self::HomepageBanner),
            "specials_page" => Ok(Self::SpecialsPage),
            "site_wide" => Ok(Self::SiteWide),
            _ => Err(format!("invalid display location: {s}")),
        }
    }
}

/// Visual severity of a site banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BannerKind {
    #[default]
    Info,
    Warning,
    Success,
    Error,
}

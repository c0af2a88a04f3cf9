//! Buyer details entered at checkout.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::checkout::error::CheckoutError;
use crate::types::{CustomerId, Email, FulfillmentType};

/// First and last pickup slot, in minutes after midnight.
const FIRST_PICKUP_MINUTE: u32 = 7 * 60;
const LAST_PICKUP_MINUTE: u32 = 17 * 60;
const PICKUP_SLOT_MINUTES: usize = 30;

/// Pickup times offered to the buyer: 7:00 AM to 5:00 PM every 30 minutes.
#[must_use]
pub fn pickup_time_slots() -> Vec<String> {
    (FIRST_PICKUP_MINUTE..=LAST_PICKUP_MINUTE)
        .step_by(PICKUP_SLOT_MINUTES)
        .map(|minute| {
            let (hour, minute) = (minute / 60, minute % 60);
            let suffix = if hour >= 12 { "PM" } else { "AM" };
            let hour = match hour % 12 {
                0 => 12,
                h => h,
            };
            format!("{hour}:{minute:02} {suffix}")
        })
        .collect()
}

/// The checkout form as submitted. Every field is free text until validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub email: String,
    pub phone: String,
    #[serde(alias = "orderType")]
    pub order_type: FulfillmentType,
    #[serde(alias = "customerId")]
    pub customer_id: Option<CustomerId>,
    #[serde(alias = "firstName")]
    pub first_name: String,
    #[serde(alias = "lastName")]
    pub last_name: String,
    #[serde(alias = "pickupDate")]
    pub pickup_date: String,
    #[serde(alias = "pickupTime")]
    pub pickup_time: String,
    pub address: String,
    pub apartment: String,
    pub city: String,
    pub state: String,
    #[serde(alias = "zipCode")]
    pub zip_code: String,
    #[serde(alias = "deliveryInstructions")]
    pub delivery_instructions: String,
}

/// Who is placing the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerInfo {
    pub email: Email,
    pub phone: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub customer_id: Option<CustomerId>,
}

impl BuyerInfo {
    /// "First Last", or whichever half was given.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        (!name.is_empty()).then_some(name)
    }
}

/// Where delivery orders go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub apartment: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub instructions: Option<String>,
}

/// How the order reaches the buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "order_type", rename_all = "snake_case")]
pub enum Fulfillment {
    Pickup { date: NaiveDate, time: String },
    Delivery { address: DeliveryAddress },
}

impl Fulfillment {
    #[must_use]
    pub const fn fulfillment_type(&self) -> FulfillmentType {
        match self {
            Self::Pickup { .. } => FulfillmentType::Pickup,
            Self::Delivery { .. } => FulfillmentType::Delivery,
        }
    }
}

fn required(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

fn trimmed(value: &str) -> String {
    value.trim().to_owned()
}

impl CheckoutForm {
    /// Fields that must be filled in for the chosen order type.
    fn required_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![("email", self.email.as_str()), ("phone", self.phone.as_str())];
        match self.order_type {
            FulfillmentType::Pickup => fields.extend([
                ("pickup_date", self.pickup_date.as_str()),
                ("pickup_time", self.pickup_time.as_str()),
            ]),
            FulfillmentType::Delivery => fields.extend([
                ("first_name", self.first_name.as_str()),
                ("last_name", self.last_name.as_str()),
                ("address", self.address.as_str()),
                ("city", self.city.as_str()),
                ("state", self.state.as_str()),
                ("zip_code", self.zip_code.as_str()),
            ]),
        }
        fields
    }

    /// Check the form and split it into buyer and fulfillment details.
    ///
    /// Blank required fields are reported together, before any format check,
    /// so the buyer sees every missing field at once.
    ///
    /// # Errors
    ///
    /// Returns `MissingFulfillmentDetails` listing blank required fields,
    /// `InvalidEmail` for a malformed address, and `InvalidPickupDate` /
    /// `InvalidPickupTime` for pickups not after `today` or off the slot list.
    pub fn validate(&self, today: NaiveDate) -> Result<(BuyerInfo, Fulfillment), CheckoutError> {
        let missing: Vec<_> = self
            .required_fields()
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field)
            .collect();
        if !missing.is_empty() {
            return Err(CheckoutError::MissingFulfillmentDetails { fields: missing });
        }

        let buyer = BuyerInfo {
            email: Email::parse(&self.email)?,
            phone: trimmed(&self.phone),
            first_name: required(&self.first_name),
            last_name: required(&self.last_name),
            customer_id: self.customer_id,
        };

        let fulfillment = match self.order_type {
            FulfillmentType::Pickup => {
                let earliest = today.checked_add_days(Days::new(1)).unwrap_or(today);
                let date = NaiveDate::parse_from_str(self.pickup_date.trim(), "%Y-%m-%d")
                    .ok()
                    .filter(|d| *d >= earliest)
                    .ok_or(CheckoutError::InvalidPickupDate { earliest })?;
                let time = trimmed(&self.pickup_time);
                if !pickup_time_slots().contains(&time) {
                    return Err(CheckoutError::InvalidPickupTime(time));
                }
                Fulfillment::Pickup { date, time }
            }
            FulfillmentType::Delivery => Fulfillment::Delivery {
                address: DeliveryAddress {
                    first_name: trimmed(&self.first_name),
                    last_name: trimmed(&self.last_name),
                    street: trimmed(&self.address),
                    apartment: required(&self.apartment),
                    city: trimmed(&self.city),
                    state: trimmed(&self.state),
                    zip_code: trimmed(&self.zip_code),
                    instructions: required(&self.delivery_instructions),
                },
            },
        };

        Ok((buyer, fulfillment))
    }
}

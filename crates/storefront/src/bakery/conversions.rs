//! Conversions between bakery API wire types and domain types.

use llama_treats_core::{CheckoutSession, Fulfillment, Special, round_cents};
use serde_json::Value;

use super::types::{CreateSessionRequest, CustomerInfo, FulfillmentDetails, SessionItem};

/// Parse raw special records, dropping the ones that are malformed.
///
/// A bad record is logged and skipped so the rest of the specials still show.
pub fn parse_specials(values: Vec<Value>) -> Vec<Special> {
    values
        .into_iter()
        .filter_map(|value| {
            let id = value.get("id").cloned();
            match serde_json::from_value::<Special>(value) {
                Ok(special) => Some(special),
                Err(e) => {
                    tracing::warn!(special_id = ?id, error = %e, "Dropping malformed special");
                    None
                }
            }
        })
        .collect()
}

/// Build the `create-session` payload from an assembled checkout.
pub fn create_session_request(
    session: &CheckoutSession,
    success_url: String,
    cancel_url: String,
) -> CreateSessionRequest {
    let items = session
        .lines
        .iter()
        .map(|line| SessionItem {
            id: line.product_id,
            name: line.name.clone(),
            price: round_cents(line.unit_price),
            quantity: line.quantity,
            image: line.image_ref.clone(),
        })
        .collect();

    let details = match &session.fulfillment {
        Fulfillment::Pickup { date, time } => FulfillmentDetails::Pickup {
            pickup_date: *date,
            pickup_time: time.clone(),
        },
        Fulfillment::Delivery { address } => FulfillmentDetails::Delivery {
            address: address.street.clone(),
            apartment: address.apartment.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            zip_code: address.zip_code.clone(),
            delivery_instructions: address.instructions.clone(),
        },
    };

    let buyer = &session.buyer;
    CreateSessionRequest {
        items,
        customer_info: CustomerInfo {
            email: buyer.email.to_string(),
            phone: buyer.phone.clone(),
            order_type: session.fulfillment_type(),
            customer_id: buyer.customer_id,
            first_name: buyer.first_name.clone(),
            last_name: buyer.last_name.clone(),
            name: buyer.display_name(),
            details,
        },
        special_code: session.special_code.clone(),
        special_id: session.special_id,
        free_items: session.free_items.clone(),
        success_url,
        cancel_url,
    }
}

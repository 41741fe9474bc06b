//! Wire types for the events exchanged with the outside world.
//!
//! Both inbound streams carry JSON with camelCase field names, so every struct here renames its fields accordingly.
//! Decoding goes through [`TryFrom<&str>`] rather than bare `serde_json` so that payloads without a usable order id
//! are rejected before they reach the correlator.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use ops_common::Cents;
use serde::{Deserialize, Serialize};

use crate::errors::EventDecodeError;

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

//--------------------------------------       FoodOrder       ---------------------------------------------------------
/// A single line item on an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodOrder {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub toppings: Vec<String>,
    pub quantity: u32,
    pub price: Cents,
}

//--------------------------------------       OrderEvent       ---------------------------------------------------------
/// An order as announced on the order-created channel.
///
/// The full payload is carried through the correlator untouched and forwarded verbatim once the matching payment
/// arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEvent {
    pub order_id: OrderId,
    pub user_id: String,
    pub address: String,
    #[serde(default)]
    pub food: Option<FoodOrder>,
    pub total_amount: Cents,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
}

impl TryFrom<&str> for OrderEvent {
    type Error = EventDecodeError;

    fn try_from(payload: &str) -> Result<Self, Self::Error> {
        let event: OrderEvent = serde_json::from_str(payload)?;
        if event.order_id.is_empty() {
            return Err(EventDecodeError::MissingOrderId);
        }
        Ok(event)
    }
}

//--------------------------------------      PaymentEvent      ---------------------------------------------------------
/// A payment confirmation as announced on the payment-completed channel.
///
/// Only the order id is consulted downstream; the remaining fields are carried for logging and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
    pub order_id: OrderId,
    pub user_id: String,
    pub status: String,
    pub amount: f64,
}

impl TryFrom<&str> for PaymentEvent {
    type Error = EventDecodeError;

    fn try_from(payload: &str) -> Result<Self, Self::Error> {
        let event: PaymentEvent = serde_json::from_str(payload)?;
        if event.order_id.is_empty() {
            return Err(EventDecodeError::MissingOrderId);
        }
        Ok(event)
    }
}

//! # Order/payment correlator
//!
//! The [`Correlator`] joins the two inbound event streams on the order id. Orders and payments arrive independently
//! and in any order, possibly more than once, and possibly concurrently from several consumers. The correlator
//! accumulates what it has seen so far per order id and, the moment both halves are present, removes the entry and
//! fires the order-processed hook with the stored order payload. Removal and emission happen as one step, so the
//! hook fires exactly once per completed match no matter how the inbound calls interleave.
//!
//! State lives in a sharded concurrent map. Updates to one order id are atomic; updates to different order ids do
//! not contend. An order id whose second half never arrives keeps its entry for the lifetime of the process; there
//! is no expiry.

use dashmap::DashMap;
use log::*;

use crate::{
    events::{EventProducers, OrderProcessedEvent},
    order_types::{OrderEvent, OrderId},
};

//--------------------------------------      JoinState       ---------------------------------------------------------
/// What has been seen so far for a single order id.
#[derive(Debug, Clone, Default)]
struct JoinState {
    order: Option<OrderEvent>,
    payment_done: bool,
}

impl JoinState {
    fn is_complete(&self) -> bool {
        self.payment_done && self.order.is_some()
    }
}

//--------------------------------------      Correlator      ---------------------------------------------------------
pub struct Correlator {
    store: DashMap<OrderId, JoinState>,
    producers: EventProducers,
}

impl Correlator {
    pub fn new(producers: EventProducers) -> Self {
        Self { store: DashMap::new(), producers }
    }

    /// Record an order-created event.
    ///
    /// Creates the tracking entry for the order id if this is the first fact seen for it. A repeated order event for
    /// the same id is not an error; the payload is simply replaced. If the payment confirmation has already arrived,
    /// the order is finalized immediately.
    pub async fn process_new_order(&self, order: OrderEvent) {
        let order_id = order.order_id.clone();
        self.store.entry(order_id.clone()).or_default().order = Some(order);
        debug!("🔄️📦️ Order [{order_id}] recorded, waiting on payment");
        self.try_finalize(&order_id).await;
    }

    /// Record a payment-completed event for the given order id.
    ///
    /// Creates the tracking entry if the payment beat the order data here. If the order data is already present, the
    /// order is finalized immediately.
    pub async fn process_payment(&self, order_id: OrderId) {
        self.store.entry(order_id.clone()).or_default().payment_done = true;
        debug!("🔄️💰️ Payment recorded for order [{order_id}]");
        self.try_finalize(&order_id).await;
    }

    /// Forward the order for fulfilment if both halves have arrived.
    ///
    /// The completeness check and the removal of the entry are a single atomic operation on the store, so two
    /// concurrent callers can never both observe a complete entry: one wins the removal and emits, the other sees
    /// nothing. Returns true if this call emitted the order.
    pub async fn try_finalize(&self, order_id: &OrderId) -> bool {
        let Some((_, state)) = self.store.remove_if(order_id, |_, state| state.is_complete()) else {
            trace!("🔄️ Order [{order_id}] is not ready yet");
            return false;
        };
        if let Some(order) = state.order {
            info!("🔄️ Order [{order_id}] has been matched with its payment and sent for processing");
            self.call_order_processed_hook(order).await;
            true
        } else {
            false
        }
    }

    async fn call_order_processed_hook(&self, order: OrderEvent) {
        for producer in &self.producers.order_processed_producer {
            debug!("🔄️ Notifying order processed hook subscribers");
            let event = OrderProcessedEvent::new(order.clone());
            producer.publish_event(event).await;
        }
    }

    /// Number of order ids still waiting for their second half.
    pub fn pending_count(&self) -> usize {
        self.store.len()
    }

    /// True if the given order id has an entry that has not been finalized yet.
    pub fn is_pending(&self, order_id: &OrderId) -> bool {
        self.store.contains_key(order_id)
    }
}

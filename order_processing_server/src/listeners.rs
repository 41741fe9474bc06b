//! Channel listeners.
//!
//! One loop per consumer. Each loop pulls deliveries off its broker subscription, decodes the payload, hands the
//! event to the correlator and acknowledges the delivery once the correlator call has returned, whether or not
//! that call completed a match. A payload that fails to decode is logged and left unacknowledged; it affects
//! nothing beyond its own message.

use std::sync::Arc;

use log::*;
use order_processing_engine::{
    broker::{Delivery, MessageBroker},
    order_types::{OrderEvent, PaymentEvent},
    Correlator,
};
use tokio::task::JoinHandle;

pub fn spawn_order_created_listener(
    broker: &MessageBroker,
    correlator: Arc<Correlator>,
    channel: &str,
    worker: usize,
    buffer_size: usize,
) -> JoinHandle<()> {
    let client_name = format!("order-created-{worker}");
    let mut receiver = broker.subscribe(channel, &client_name, buffer_size);
    tokio::spawn(async move {
        debug!("🛒 {client_name} started");
        while let Some(delivery) = receiver.recv().await {
            on_order_created(&correlator, delivery, &client_name).await;
        }
        debug!("🛒 {client_name} stopped");
    })
}

pub fn spawn_payment_completed_listener(
    broker: &MessageBroker,
    correlator: Arc<Correlator>,
    channel: &str,
    worker: usize,
    buffer_size: usize,
) -> JoinHandle<()> {
    let client_name = format!("payment-completed-{worker}");
    let mut receiver = broker.subscribe(channel, &client_name, buffer_size);
    tokio::spawn(async move {
        debug!("🤑 {client_name} started");
        while let Some(delivery) = receiver.recv().await {
            on_payment_completed(&correlator, delivery, &client_name).await;
        }
        debug!("🤑 {client_name} stopped");
    })
}

async fn on_order_created(correlator: &Correlator, delivery: Delivery, client_name: &str) {
    let Delivery { payload, ack } = delivery;
    let order = match OrderEvent::try_from(payload.as_str()) {
        Ok(order) => order,
        Err(e) => {
            error!("🛒 {client_name} could not decode an order payload. {e}");
            return;
        },
    };
    let order_id = order.order_id.clone();
    info!("🛒 Order [{order_id}] received by {client_name} and sent for processing");
    correlator.process_new_order(order).await;
    ack.acknowledge();
    trace!("🛒 Order [{order_id}] delivery acknowledged");
}

async fn on_payment_completed(correlator: &Correlator, delivery: Delivery, client_name: &str) {
    let Delivery { payload, ack } = delivery;
    let payment = match PaymentEvent::try_from(payload.as_str()) {
        Ok(payment) => payment,
        Err(e) => {
            error!("🤑 {client_name} could not decode a payment payload. {e}");
            return;
        },
    };
    let order_id = payment.order_id.clone();
    info!("🤑 Payment completed for order [{order_id}]");
    correlator.process_payment(order_id.clone()).await;
    ack.acknowledge();
    trace!("🤑 Payment [{order_id}] delivery acknowledged");
}

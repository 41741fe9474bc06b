//! End-to-end tests that drive the service through the broker, the way the outside world would.

use std::time::Duration;

use order_processing_engine::{
    order_types::{OrderEvent, PaymentEvent},
    test_utils::{prepare_test_env, OrderBuilder},
};
use tokio::time::{sleep, timeout, Instant};

use crate::{config::ServerConfig, errors::ServerError, server::spawn_service};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);
const QUIET_PERIOD: Duration = Duration::from_millis(300);

fn single_consumer_config() -> ServerConfig {
    ServerConfig { order_consumers: 1, payment_consumers: 1, event_buffer_size: 16, ..Default::default() }
}

fn payment_for(order: &OrderEvent) -> String {
    let payment = PaymentEvent {
        order_id: order.order_id.clone(),
        user_id: order.user_id.clone(),
        status: "PAID".to_string(),
        amount: order.total_amount.value() as f64,
    };
    serde_json::to_string(&payment).unwrap()
}

async fn wait_until<F: Fn() -> bool>(cond: F) -> bool {
    let deadline = Instant::now() + RECV_TIMEOUT;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    cond()
}

#[tokio::test]
async fn order_then_payment_is_forwarded_once() -> anyhow::Result<()> {
    prepare_test_env();
    let config = single_consumer_config();
    let outbound = config.channels.order_processed.clone();
    let inbound_orders = config.channels.order_created.clone();
    let inbound_payments = config.channels.payment_completed.clone();
    let service = spawn_service(config).await?;
    let mut sink = service.broker.subscribe(&outbound, "test-sink", 16);

    let order = OrderBuilder::random_order();
    service.broker.publish(&inbound_orders, serde_json::to_string(&order)?).await;
    service.broker.publish(&inbound_payments, payment_for(&order)).await;

    let delivery = timeout(RECV_TIMEOUT, sink.recv()).await?.expect("sink closed unexpectedly");
    let forwarded = OrderEvent::try_from(delivery.payload.as_str())?;
    assert_eq!(forwarded, order);
    delivery.ack.acknowledge();

    assert!(timeout(QUIET_PERIOD, sink.recv()).await.is_err(), "the order was forwarded more than once");
    assert!(!service.correlator.is_pending(&order.order_id));

    let broker = std::sync::Arc::clone(&service.broker);
    let orders = inbound_orders.clone();
    assert!(wait_until(move || broker.counters(&orders).acknowledged == 1).await);
    let broker = std::sync::Arc::clone(&service.broker);
    let payments = inbound_payments.clone();
    assert!(wait_until(move || broker.counters(&payments).acknowledged == 1).await);

    service.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn payment_before_order_is_forwarded_once() -> anyhow::Result<()> {
    prepare_test_env();
    let config = single_consumer_config();
    let outbound = config.channels.order_processed.clone();
    let inbound_orders = config.channels.order_created.clone();
    let inbound_payments = config.channels.payment_completed.clone();
    let service = spawn_service(config).await?;
    let mut sink = service.broker.subscribe(&outbound, "test-sink", 16);

    let order = OrderBuilder::random_order();
    service.broker.publish(&inbound_payments, payment_for(&order)).await;
    service.broker.publish(&inbound_orders, serde_json::to_string(&order)?).await;

    let delivery = timeout(RECV_TIMEOUT, sink.recv()).await?.expect("sink closed unexpectedly");
    let forwarded = OrderEvent::try_from(delivery.payload.as_str())?;
    assert_eq!(forwarded, order);
    delivery.ack.acknowledge();

    assert!(timeout(QUIET_PERIOD, sink.recv()).await.is_err(), "the order was forwarded more than once");
    assert!(!service.correlator.is_pending(&order.order_id));

    service.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn parallel_order_consumers_still_forward_once() -> anyhow::Result<()> {
    prepare_test_env();
    // The default configuration runs three consumers on the order-created channel, so every order is delivered
    // and processed three times.
    let config = ServerConfig::default();
    let outbound = config.channels.order_processed.clone();
    let inbound_orders = config.channels.order_created.clone();
    let inbound_payments = config.channels.payment_completed.clone();
    let service = spawn_service(config).await?;
    let mut sink = service.broker.subscribe(&outbound, "test-sink", 16);

    let order = OrderBuilder::random_order();
    service.broker.publish(&inbound_orders, serde_json::to_string(&order)?).await;
    service.broker.publish(&inbound_payments, payment_for(&order)).await;

    let delivery = timeout(RECV_TIMEOUT, sink.recv()).await?.expect("sink closed unexpectedly");
    let forwarded = OrderEvent::try_from(delivery.payload.as_str())?;
    assert_eq!(forwarded, order);
    delivery.ack.acknowledge();

    assert!(timeout(QUIET_PERIOD, sink.recv()).await.is_err(), "the order was forwarded more than once");

    let broker = std::sync::Arc::clone(&service.broker);
    let orders = inbound_orders.clone();
    // Three consumers, three deliveries, three acknowledgments.
    assert!(wait_until(move || broker.counters(&orders).acknowledged == 3).await);

    service.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn unmatched_order_is_acknowledged_but_not_forwarded() -> anyhow::Result<()> {
    prepare_test_env();
    let config = single_consumer_config();
    let outbound = config.channels.order_processed.clone();
    let inbound_orders = config.channels.order_created.clone();
    let service = spawn_service(config).await?;
    let mut sink = service.broker.subscribe(&outbound, "test-sink", 16);

    let order = OrderBuilder::random_order();
    service.broker.publish(&inbound_orders, serde_json::to_string(&order)?).await;

    let broker = std::sync::Arc::clone(&service.broker);
    let orders = inbound_orders.clone();
    assert!(wait_until(move || broker.counters(&orders).acknowledged == 1).await);
    assert!(timeout(QUIET_PERIOD, sink.recv()).await.is_err(), "an unpaid order must not be forwarded");
    assert!(service.correlator.is_pending(&order.order_id));

    service.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn bad_payloads_do_not_disturb_other_orders() -> anyhow::Result<()> {
    prepare_test_env();
    let config = single_consumer_config();
    let outbound = config.channels.order_processed.clone();
    let inbound_orders = config.channels.order_created.clone();
    let inbound_payments = config.channels.payment_completed.clone();
    let service = spawn_service(config).await?;
    let mut sink = service.broker.subscribe(&outbound, "test-sink", 16);

    service.broker.publish(&inbound_orders, "not even json".to_string()).await;
    service
        .broker
        .publish(&inbound_payments, r#"{"orderId": "", "userId": "u-1", "status": "PAID", "amount": 1.0}"#.to_string())
        .await;

    let order = OrderBuilder::random_order();
    service.broker.publish(&inbound_orders, serde_json::to_string(&order)?).await;
    service.broker.publish(&inbound_payments, payment_for(&order)).await;

    let delivery = timeout(RECV_TIMEOUT, sink.recv()).await?.expect("sink closed unexpectedly");
    let forwarded = OrderEvent::try_from(delivery.payload.as_str())?;
    assert_eq!(forwarded, order);
    delivery.ack.acknowledge();

    // The malformed payloads were delivered but never acknowledged.
    assert_eq!(service.broker.counters(&inbound_orders).delivered, 2);
    assert_eq!(service.broker.counters(&inbound_payments).delivered, 2);
    let broker = std::sync::Arc::clone(&service.broker);
    let orders = inbound_orders.clone();
    assert!(wait_until(move || broker.counters(&orders).acknowledged == 1).await);
    let broker = std::sync::Arc::clone(&service.broker);
    let payments = inbound_payments.clone();
    assert!(wait_until(move || broker.counters(&payments).acknowledged == 1).await);
    sleep(QUIET_PERIOD).await;
    assert_eq!(service.broker.counters(&inbound_orders).acknowledged, 1);
    assert_eq!(service.broker.counters(&inbound_payments).acknowledged, 1);

    service.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn service_requires_a_consumer_on_each_inbound_channel() {
    prepare_test_env();
    let config = ServerConfig { order_consumers: 0, ..Default::default() };
    let result = spawn_service(config).await;
    assert!(matches!(result, Err(ServerError::InitializeError(_))));
}

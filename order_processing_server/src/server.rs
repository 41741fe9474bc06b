use std::{future::Future, pin::Pin, sync::Arc};

use futures::future::join_all;
use log::*;
use order_processing_engine::{
    broker::MessageBroker,
    events::{EventHandlers, EventHooks},
    Correlator,
};
use tokio::task::JoinHandle;

use crate::{config::ServerConfig, errors::ServerError, listeners};

/// A running instance of the order processing service.
///
/// Holds the broker (the way in and out for messages), the correlator and the listener tasks. Dropping the handle
/// leaves the tasks running on the runtime; call [`OrderProcessingService::shutdown`] for an orderly wind-down.
pub struct OrderProcessingService {
    pub broker: Arc<MessageBroker>,
    pub correlator: Arc<Correlator>,
    listeners: Vec<JoinHandle<()>>,
}

impl OrderProcessingService {
    /// Close all broker subscriptions and wait for the listener loops to finish.
    pub async fn shutdown(self) {
        self.broker.shutdown();
        join_all(self.listeners).await;
        info!("🚀️ Order processing service has shut down");
    }
}

/// Wire up and start the service: broker, order-processed hook, correlator and channel listeners.
pub async fn spawn_service(config: ServerConfig) -> Result<OrderProcessingService, ServerError> {
    if config.order_consumers == 0 || config.payment_consumers == 0 {
        return Err(ServerError::InitializeError(
            "At least one consumer is required on each inbound channel.".to_string(),
        ));
    }
    let broker = Arc::new(MessageBroker::new());

    let mut hooks = EventHooks::default();
    let outbound = config.channels.order_processed.clone();
    let publisher = Arc::clone(&broker);
    hooks.on_order_processed(move |event| {
        let broker = Arc::clone(&publisher);
        let channel = outbound.clone();
        Box::pin(async move {
            match serde_json::to_string(&event.order) {
                Ok(payload) => broker.publish(&channel, payload).await,
                Err(e) => error!("🚀️ Could not serialize processed order [{}]. {e}", event.order.order_id),
            }
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handlers = EventHandlers::new(config.event_buffer_size, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let correlator = Arc::new(Correlator::new(producers));

    let mut listener_handles = Vec::with_capacity(config.order_consumers + config.payment_consumers);
    for worker in 0..config.order_consumers {
        listener_handles.push(listeners::spawn_order_created_listener(
            &broker,
            Arc::clone(&correlator),
            &config.channels.order_created,
            worker,
            config.event_buffer_size,
        ));
    }
    for worker in 0..config.payment_consumers {
        listener_handles.push(listeners::spawn_payment_completed_listener(
            &broker,
            Arc::clone(&correlator),
            &config.channels.payment_completed,
            worker,
            config.event_buffer_size,
        ));
    }

    info!(
        "🚀️ Order processing service started. {} order consumers on '{}', {} payment consumers on '{}', forwarding \
         to '{}'.",
        config.order_consumers,
        config.channels.order_created,
        config.payment_consumers,
        config.channels.payment_completed,
        config.channels.order_processed
    );
    Ok(OrderProcessingService { broker, correlator, listeners: listener_handles })
}

/// Run the service until a shutdown signal arrives.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let service = spawn_service(config).await?;
    tokio::signal::ctrl_c().await?;
    info!("🚀️ Shutdown signal received");
    service.shutdown().await;
    Ok(())
}

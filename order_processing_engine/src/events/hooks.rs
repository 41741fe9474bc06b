use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderProcessedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_processed_producer: Vec<EventProducer<OrderProcessedEvent>>,
}

pub struct EventHandlers {
    pub on_order_processed: Option<EventHandler<OrderProcessedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_processed = hooks.on_order_processed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_processed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_processed {
            result.order_processed_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_processed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_processed: Option<Handler<OrderProcessedEvent>>,
}

impl EventHooks {
    pub fn on_order_processed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderProcessedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_processed = Some(Arc::new(f));
        self
    }
}

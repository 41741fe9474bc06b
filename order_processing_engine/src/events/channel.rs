//! Simple stateless pub-sub event plumbing.
//!
//! Components that want to react to engine events register an async handler. Each event is dispatched on its own
//! task, so a slow handler invocation never holds up the next event. The handler loop shuts down once every
//! producer has been dropped, after draining the tasks still in flight.

use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // The internal sender is dropped here so that the loop ends as soon as the last producer goes away.
        drop(self.sender);
        let mut jobs = JoinSet::new();
        loop {
            tokio::select! {
                event = self.listener.recv() => match event {
                    Some(event) => {
                        trace!("📬️ Handling event");
                        let handler = Arc::clone(&self.handler);
                        jobs.spawn(async move {
                            (handler)(event).await;
                            trace!("📬️ Event handled");
                        });
                    },
                    None => break,
                },
                Some(result) = jobs.join_next(), if !jobs.is_empty() => {
                    if let Err(e) = result {
                        warn!("📬️ An event handler task did not run to completion: {e}");
                    }
                },
            }
        }
        while let Some(result) = jobs.join_next().await {
            if let Err(e) = result {
                warn!("📬️ An event handler task did not run to completion: {e}");
            }
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}

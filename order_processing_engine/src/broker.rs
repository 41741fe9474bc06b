//! In-process message broker.
//!
//! A small stand-in for the external broker the service would talk to in production, exposing the same narrow
//! surface: named channels, publish, subscribe and manual acknowledgment. Payloads are opaque strings; whatever
//! serialization the producers use is none of the broker's business.
//!
//! Every message published on a channel is delivered to every live subscriber of that channel. Running several
//! subscribers on one inbound channel therefore produces duplicate deliveries, which is exactly the at-least-once
//! behaviour the correlator has to cope with.
//!
//! Acknowledgment is decoupled from downstream processing: consumers ack as soon as they have handed the message
//! over, whether or not that completed a match. The broker only counts acks; it keeps no redelivery queue. A
//! delivery dropped without an ack is logged as a would-be redelivery candidate.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
        RwLock,
    },
};

use futures_util::future::join_all;
use log::*;
use tokio::sync::mpsc;

//--------------------------------------    ChannelStats      ---------------------------------------------------------
#[derive(Debug, Default)]
struct ChannelStats {
    published: AtomicU64,
    delivered: AtomicU64,
    acknowledged: AtomicU64,
}

/// A point-in-time snapshot of a channel's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelCounters {
    pub published: u64,
    pub delivered: u64,
    pub acknowledged: u64,
}

//--------------------------------------    Acknowledgment    ---------------------------------------------------------
/// Handle a consumer uses to confirm that a delivery has been processed.
pub struct Acknowledgment {
    stats: Arc<ChannelStats>,
    done: bool,
}

impl Acknowledgment {
    fn new(stats: Arc<ChannelStats>) -> Self {
        Self { stats, done: false }
    }

    /// Confirm this delivery. Consumes the handle; a delivery can only be acknowledged once.
    pub fn acknowledge(mut self) {
        self.stats.acknowledged.fetch_add(1, Ordering::SeqCst);
        self.done = true;
    }

    // Consume the handle without counting an ack. Used by the broker itself when a delivery could not be handed to
    // its subscriber in the first place.
    fn dismiss(mut self) {
        self.done = true;
    }
}

impl Drop for Acknowledgment {
    fn drop(&mut self) {
        if !self.done {
            warn!("📬️ A delivery was dropped without being acknowledged. A real broker would redeliver it.");
        }
    }
}

//--------------------------------------       Delivery       ---------------------------------------------------------
/// One message as handed to one subscriber.
pub struct Delivery {
    pub payload: String,
    pub ack: Acknowledgment,
}

//--------------------------------------     MessageBroker    ---------------------------------------------------------
struct Subscriber {
    client_name: String,
    sender: mpsc::Sender<Delivery>,
}

#[derive(Default)]
pub struct MessageBroker {
    subscribers: RwLock<HashMap<String, Vec<Subscriber>>>,
    stats: RwLock<HashMap<String, Arc<ChannelStats>>>,
}

impl MessageBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber on `channel` and return the receiving end of its delivery queue.
    pub fn subscribe(&self, channel: &str, client_name: &str, buffer_size: usize) -> mpsc::Receiver<Delivery> {
        let (sender, receiver) = mpsc::channel(buffer_size);
        match self.subscribers.write() {
            Ok(mut subscribers) => {
                let entry = subscribers.entry(channel.to_string()).or_default();
                entry.push(Subscriber { client_name: client_name.to_string(), sender });
                debug!("📬️ '{client_name}' has subscribed to channel '{channel}'");
                debug!("📬️ Channel '{channel}' now has {} subscribers", entry.len());
            },
            Err(e) => {
                error!("📬️ Error getting lock on subscriber map: {e}");
            },
        }
        receiver
    }

    /// Publish a payload on `channel`, delivering a copy to every live subscriber.
    pub async fn publish(&self, channel: &str, payload: String) {
        let stats = self.channel_stats(channel);
        stats.published.fetch_add(1, Ordering::SeqCst);
        let targets: Vec<(String, mpsc::Sender<Delivery>)> = match self.subscribers.read() {
            Ok(subscribers) => subscribers
                .get(channel)
                .map(|subs| subs.iter().map(|s| (s.client_name.clone(), s.sender.clone())).collect())
                .unwrap_or_default(),
            Err(e) => {
                error!("📬️ Error getting lock on subscriber map: {e}");
                return;
            },
        };
        if targets.is_empty() {
            warn!("📬️ No subscribers on channel '{channel}'. The message has been dropped.");
            return;
        }
        trace!("📬️ Broadcasting on '{channel}' to {} subscribers", targets.len());
        let sends = targets.into_iter().map(|(client_name, sender)| {
            let delivery = Delivery { payload: payload.clone(), ack: Acknowledgment::new(Arc::clone(&stats)) };
            let stats = Arc::clone(&stats);
            async move {
                match sender.send(delivery).await {
                    Ok(()) => {
                        stats.delivered.fetch_add(1, Ordering::SeqCst);
                        trace!("📬️ Delivered to '{client_name}' on '{channel}'");
                    },
                    Err(e) => {
                        e.0.ack.dismiss();
                        warn!("📬️ Subscriber '{client_name}' on channel '{channel}' is gone. Delivery skipped.");
                    },
                }
            }
        });
        join_all(sends).await;
        self.remove_dead_subscribers(channel);
    }

    /// Snapshot of the published/delivered/acknowledged counters for `channel`.
    pub fn counters(&self, channel: &str) -> ChannelCounters {
        match self.stats.read() {
            Ok(stats) => stats
                .get(channel)
                .map(|s| ChannelCounters {
                    published: s.published.load(Ordering::SeqCst),
                    delivered: s.delivered.load(Ordering::SeqCst),
                    acknowledged: s.acknowledged.load(Ordering::SeqCst),
                })
                .unwrap_or_default(),
            Err(e) => {
                error!("📬️ Error getting lock on channel statistics: {e}");
                ChannelCounters::default()
            },
        }
    }

    /// Number of live subscribers on `channel`.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        match self.subscribers.read() {
            Ok(subscribers) => subscribers.get(channel).map(Vec::len).unwrap_or_default(),
            Err(e) => {
                error!("📬️ Error getting lock on subscriber map: {e}");
                0
            },
        }
    }

    /// Drop every subscription, closing all delivery queues. Consumers see their receivers end and wind down.
    pub fn shutdown(&self) {
        match self.subscribers.write() {
            Ok(mut subscribers) => {
                let n: usize = subscribers.values().map(Vec::len).sum();
                subscribers.clear();
                debug!("📬️ Broker shut down. {n} subscriptions closed.");
            },
            Err(e) => {
                error!("📬️ Error getting lock on subscriber map: {e}");
            },
        }
    }

    fn channel_stats(&self, channel: &str) -> Arc<ChannelStats> {
        match self.stats.write() {
            Ok(mut stats) => Arc::clone(stats.entry(channel.to_string()).or_default()),
            Err(e) => {
                error!("📬️ Error getting lock on channel statistics: {e}");
                Arc::new(ChannelStats::default())
            },
        }
    }

    fn remove_dead_subscribers(&self, channel: &str) {
        let mut subscribers = match self.subscribers.write() {
            Ok(subscribers) => subscribers,
            Err(e) => {
                error!("📬️ Error getting lock on subscriber map: {e}");
                return;
            },
        };
        if let Some(subs) = subscribers.get_mut(channel) {
            let before = subs.len();
            subs.retain(|s| !s.sender.is_closed());
            if subs.len() < before {
                debug!("📬️ Removed {} dead subscribers from '{channel}'. {} left.", before - subs.len(), subs.len());
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn messages_fan_out_to_every_subscriber() {
        let _ = env_logger::try_init();
        let broker = MessageBroker::new();
        let mut first = broker.subscribe("orders", "first", 4);
        let mut second = broker.subscribe("orders", "second", 4);
        assert_eq!(broker.subscriber_count("orders"), 2);

        broker.publish("orders", "a".to_string()).await;
        broker.publish("orders", "b".to_string()).await;

        for receiver in [&mut first, &mut second] {
            let delivery = receiver.recv().await.unwrap();
            assert_eq!(delivery.payload, "a");
            delivery.ack.acknowledge();
            let delivery = receiver.recv().await.unwrap();
            assert_eq!(delivery.payload, "b");
            delivery.ack.acknowledge();
        }

        let counters = broker.counters("orders");
        assert_eq!(counters, ChannelCounters { published: 2, delivered: 4, acknowledged: 4 });
    }

    #[tokio::test]
    async fn publishing_without_subscribers_drops_the_message() {
        let _ = env_logger::try_init();
        let broker = MessageBroker::new();
        broker.publish("empty", "lost".to_string()).await;
        let counters = broker.counters("empty");
        assert_eq!(counters, ChannelCounters { published: 1, delivered: 0, acknowledged: 0 });
    }

    #[tokio::test]
    async fn dead_subscribers_are_pruned() {
        let _ = env_logger::try_init();
        let broker = MessageBroker::new();
        let receiver = broker.subscribe("orders", "short-lived", 4);
        drop(receiver);

        broker.publish("orders", "x".to_string()).await;
        assert_eq!(broker.subscriber_count("orders"), 0);
        let counters = broker.counters("orders");
        assert_eq!(counters.published, 1);
        assert_eq!(counters.delivered, 0);
    }

    #[tokio::test]
    async fn unacknowledged_deliveries_are_not_counted() {
        let _ = env_logger::try_init();
        let broker = MessageBroker::new();
        let mut receiver = broker.subscribe("orders", "lazy", 4);
        broker.publish("orders", "y".to_string()).await;
        let delivery = receiver.recv().await.unwrap();
        drop(delivery);
        let counters = broker.counters("orders");
        assert_eq!(counters.delivered, 1);
        assert_eq!(counters.acknowledged, 0);
    }

    #[tokio::test]
    async fn shutdown_closes_subscriber_queues() {
        let _ = env_logger::try_init();
        let broker = MessageBroker::new();
        let mut receiver = broker.subscribe("orders", "worker", 4);
        broker.shutdown();
        assert!(receiver.recv().await.is_none());
        assert_eq!(broker.subscriber_count("orders"), 0);
    }
}

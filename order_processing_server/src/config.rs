use std::env;

use log::*;
use order_processing_engine::channels;

const DEFAULT_EVENT_BUFFER_SIZE: usize = 128;
const DEFAULT_ORDER_CONSUMERS: usize = 3;
const DEFAULT_PAYMENT_CONSUMERS: usize = 1;

/// Names of the channels the service talks to. Opaque strings as far as the rest of the code is concerned.
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    pub order_created: String,
    pub payment_completed: String,
    pub order_processed: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            order_created: channels::ORDER_CREATED.to_string(),
            payment_completed: channels::PAYMENT_COMPLETED.to_string(),
            order_processed: channels::ORDER_PROCESSED.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Capacity of every internal delivery queue (broker subscriptions and the order-processed hook).
    pub event_buffer_size: usize,
    /// Number of parallel consumers on the order-created channel. Each consumer receives every message, so values
    /// above one deliberately produce duplicate deliveries.
    pub order_consumers: usize,
    /// Number of parallel consumers on the payment-completed channel.
    pub payment_consumers: usize,
    pub channels: ChannelConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            order_consumers: DEFAULT_ORDER_CONSUMERS,
            payment_consumers: DEFAULT_PAYMENT_CONSUMERS,
            channels: ChannelConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let event_buffer_size =
            parse_count("OPS_EVENT_BUFFER_SIZE", env::var("OPS_EVENT_BUFFER_SIZE").ok(), DEFAULT_EVENT_BUFFER_SIZE);
        let order_consumers =
            parse_count("OPS_ORDER_CONSUMERS", env::var("OPS_ORDER_CONSUMERS").ok(), DEFAULT_ORDER_CONSUMERS);
        let payment_consumers =
            parse_count("OPS_PAYMENT_CONSUMERS", env::var("OPS_PAYMENT_CONSUMERS").ok(), DEFAULT_PAYMENT_CONSUMERS);
        let channels = ChannelConfig {
            order_created: env::var("OPS_ORDER_CREATED_CHANNEL")
                .ok()
                .unwrap_or_else(|| channels::ORDER_CREATED.to_string()),
            payment_completed: env::var("OPS_PAYMENT_COMPLETED_CHANNEL")
                .ok()
                .unwrap_or_else(|| channels::PAYMENT_COMPLETED.to_string()),
            order_processed: env::var("OPS_ORDER_PROCESSED_CHANNEL")
                .ok()
                .unwrap_or_else(|| channels::ORDER_PROCESSED.to_string()),
        };
        Self { event_buffer_size, order_consumers, payment_consumers, channels }
    }
}

fn parse_count(var: &str, value: Option<String>, default: usize) -> usize {
    match value {
        Some(s) => s.parse::<usize>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {var}. {e} Using the default, {default}, instead.");
            default
        }),
        None => default,
    }
}

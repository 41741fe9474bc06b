//! Order Processing Engine
//!
//! This library contains the core logic for the order processing service. The service listens to two independent
//! event streams (orders placed by customers, and payments confirmed by the payment provider) and forwards an order
//! for fulfilment once both halves have been seen for the same order id.
//!
//! The library is divided into three main sections:
//! 1. The correlation core ([`mod@correlator`]). The [`Correlator`] accumulates partial facts per order id in a
//!    concurrent store and fires the order-processed hook exactly once per order when both the order data and its
//!    payment confirmation have arrived. It performs no I/O of its own.
//! 2. The message plumbing ([`mod@broker`] and [`mod@events`]). The broker is a small in-process stand-in for an
//!    external message broker: named channels, fan-out delivery and manual acknowledgments. The events module
//!    provides the async hook system through which the correlator hands finished orders to whoever wants them.
//! 3. The wire types ([`mod@order_types`]). Serde definitions for the JSON events exchanged with the outside world,
//!    plus the validating decoders that reject payloads without an order id.
//!
//! Channel names are defined in [`mod@channels`] and treated as opaque configuration everywhere else.

pub mod broker;
pub mod channels;
pub mod correlator;
pub mod errors;
pub mod events;
pub mod order_types;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use correlator::Correlator;
pub use errors::EventDecodeError;

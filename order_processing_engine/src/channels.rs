//! Names of the channels the service exchanges events on. Everything downstream of configuration treats these as
//! opaque strings.

pub const ORDER_CREATED: &str = "order-created";
pub const PAYMENT_COMPLETED: &str = "payment-completed";
pub const ORDER_PROCESSED: &str = "order-processed";

mod cents;

pub use cents::{Cents, CentsConversionError};

pub mod webhook;

pub use webhook::{parse_event, verify_signature, StripeEvent};

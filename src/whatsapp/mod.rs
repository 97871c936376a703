pub mod evolution;
pub mod meta;
pub mod models;
pub mod outbound;
pub mod templates;

pub use models::{InboundMessage, InvalidPayload, NormalizedInbound};

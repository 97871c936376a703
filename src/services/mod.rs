pub mod cancellation;
pub mod conversation_fsm;
pub mod extras;
pub mod folio;
pub mod holds;
pub mod messaging;
pub mod outbox;
pub mod parsing;
pub mod payments;
pub mod pii_vault;
pub mod pricing;
pub mod reservations;
pub mod room_conflict;
pub mod stripe_client;
pub mod tasks;

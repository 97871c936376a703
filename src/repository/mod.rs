pub mod ari;
pub mod child_buckets;
pub mod contact_refs;
pub mod conversations;
pub mod folio;
pub mod guests;
pub mod holds;
pub mod inbound_messages;
pub mod outbox;
pub mod payments;
pub mod processed_events;
pub mod properties;
pub mod rates;
pub mod refunds;
pub mod reservations;
pub mod rooms;
pub mod whatsapp_channels;

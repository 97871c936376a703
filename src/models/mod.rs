pub mod ari;
pub mod conversation;
pub mod guest;
pub mod hold;
pub mod intent;
pub mod outbox;
pub mod payment;
pub mod property;
pub mod reservation;
pub mod room;
pub mod task;

pub mod outbox;
pub mod render;
pub mod thehive;

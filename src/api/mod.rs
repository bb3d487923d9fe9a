pub mod events;
pub mod search;

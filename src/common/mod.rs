pub mod eref;
pub mod events;

pub mod cards;
pub mod ops;
pub mod push;
pub mod snapshot;
pub mod targets;

#![forbid(unsafe_code)]

pub use hashbrown;
pub use indexmap;

pub mod air;
pub mod behavior;
pub mod collection;
pub mod control;
pub mod edge;
pub mod error;
pub mod event;
pub mod hooks;
pub mod inbox;
pub mod message;
pub mod models;
pub mod node;
pub mod packet;
pub mod position;
pub mod project;
pub mod registry;
pub mod simulation;
pub mod statistics;
pub mod time;
pub mod timer;

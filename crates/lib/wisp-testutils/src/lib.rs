pub mod behavior;
pub mod models;
pub mod sim;

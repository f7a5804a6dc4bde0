pub mod hooks;
pub mod message;
pub mod relay;

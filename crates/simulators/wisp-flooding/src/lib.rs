#![forbid(unsafe_code)]

pub mod flooding;
pub mod simulation;

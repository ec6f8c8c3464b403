// src/lib.rs

pub mod application;
pub mod blockchain;
pub mod bridge;
pub mod cli;
pub mod core;
pub mod deploy;
pub mod storage;

pub use bridge::TransactionBridge;
pub use core::errors::BridgeError;

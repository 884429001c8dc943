#![doc = include_str!("../readme.md")]

pub mod common;
pub mod config;
pub mod pe;
pub mod policies;
pub mod policy;
pub mod scheduler;
pub mod state;

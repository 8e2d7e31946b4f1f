mod common;

pub mod cli;
pub mod netwalk;

pub use common::*;

// SSR Bench - Library root

pub mod adapters;
pub mod bench;
pub mod config;
pub mod error;
pub mod registry;

//! CLI command implementations.

pub mod certified;
pub mod common;
pub mod dump;
pub mod sample;
pub mod shuffle;
pub mod speedtest;
pub mod status;
pub mod version;

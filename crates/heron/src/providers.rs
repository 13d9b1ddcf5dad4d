pub mod anthropic;
pub mod base;
pub mod configs;
pub mod mock;
pub mod utils;

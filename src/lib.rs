pub mod client;
pub mod common;
pub mod protocol;

mod client;
pub mod keys;
pub mod types;
mod writes;

pub use client::ApiClient;
pub use writes::Write;

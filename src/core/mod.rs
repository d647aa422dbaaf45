pub mod error;
pub mod message;
pub mod store_client;

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod keyring;
pub mod params;
pub mod preferences;
pub mod request;
pub mod session;
pub mod sse;
pub mod stream_parser;
pub mod transport;

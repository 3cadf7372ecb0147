//! quickgpt sends a single prompt to an OpenAI-compatible chat completion API
//! and prints the reply.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] validates chat parameters, encodes the request, talks to the
//!   HTTP endpoint, and turns streamed frames into text fragments. It also
//!   owns the keyring credential store and the config-backed preferences.
//! - [`api`] defines the request and response payloads exchanged with the API.
//! - [`cli`] parses arguments and prints replies to the terminal.
//! - [`utils`] holds URL helpers and logging setup.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod utils;

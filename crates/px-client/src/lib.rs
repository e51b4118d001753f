//! px-client: Interactive client for pipe-exec
//!
//! Reads operator commands, forwards them to the server over the request
//! pipe and prints the server's answer from the response pipe.

pub mod client;
pub mod output;

pub use client::{await_response, Client, ExitReason, ResponseSource, PROMPT};

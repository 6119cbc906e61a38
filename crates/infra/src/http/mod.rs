//! HTTP plumbing shared by the network adapters

mod client;

pub use client::{HttpClient, HttpClientBuilder};

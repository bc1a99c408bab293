//! Shared building blocks for the Apple Pay onramp relay.
//!
//! - [`objects`] – wire types exchanged between the mobile flow, the relay
//!   and the embedded payment page.
//! - [`jwt`] – short-lived bearer tokens for the upstream onramp API.
//! - `client` – typed HTTP clients (behind the `client` cargo feature).

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod jwt;
pub mod objects;

#[cfg(feature = "client")]
pub mod client;

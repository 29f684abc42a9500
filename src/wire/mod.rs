//! Wire Protocol Module
//!
//! A RESP front end that recognizes only `GET key` and answers from the
//! backing store directly.

mod server;

pub use server::{spawn_wire_server, WireServer};

//! # Integration Flows
//!
//! End-to-end checks over a real socket:
//!
//! - `auth`: the connection lifecycle (initial state, deadline, bad credentials)
//! - `relay`: subscription handling and delivery gating
//! - `runtime`: the assembled hub with its built-in domain modules

pub mod auth;
pub mod relay;
pub mod runtime;

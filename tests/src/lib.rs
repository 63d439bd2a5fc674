//! # Hearth Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Dispatch and fan-out throughput
//! └── src/
//!     ├── harness.rs    # In-process hub + WebSocket client
//!     └── integration/  # End-to-end gateway flows
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p hub-tests
//!
//! # By category
//! cargo test -p hub-tests integration::auth
//! cargo test -p hub-tests integration::relay
//!
//! # Benchmarks
//! cargo bench -p hub-tests
//! ```

pub mod harness;
pub mod integration;

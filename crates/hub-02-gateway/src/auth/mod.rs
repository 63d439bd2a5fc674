//! Connection authentication.
//!
//! Every connection starts PENDING and must present a signed token before
//! its deadline. Until then it receives no broadcasts.
//!
//! ```text
//!             credential ok
//!   PENDING ─────────────────► AUTHENTICATED
//!      │
//!      │ bad credential / deadline / disconnect
//!      ▼
//!   CLOSED
//! ```

pub mod gate;
pub mod verifier;

pub use gate::{AuthGate, AuthPhase, Transition, UnauthorizedReason};
pub use verifier::{Claims, CredentialVerifier, JwtVerifier};

//! Token lifecycle for sessiongate
//!
//! This module implements the signing plane with:
//! - HMAC secrets and Ed25519 key pairs
//! - A compact signed token codec with standard claim checks
//! - A reusable generator for sign, verify and refresh
//! - The session binding behind the authentication cookie

pub mod claims;
pub mod codec;
pub mod generator;
pub mod keys;
pub mod options;
pub mod session;

pub use claims::*;
pub use generator::*;
pub use keys::*;
pub use options::*;
pub use session::*;

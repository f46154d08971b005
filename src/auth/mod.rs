//! Identity and authorization.
//!
//! [`token`] is the leaf codec for signed, expiring identity claims;
//! [`permission`] derives the role lattice; [`extract`] wires both into
//! axum as request extractors.

pub mod extract;
pub mod permission;
pub mod token;

pub use extract::{OptionalPrincipal, Principal, AUTH_COOKIE_NAME};
pub use permission::{Permission, Role};

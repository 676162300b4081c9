//! Core Components
//!
//! Infrastructure for the tenant OAuth flows.

pub mod launcher;
pub mod listener;
pub mod pkce;
pub mod transport;

pub use launcher::*;
pub use listener::*;
pub use pkce::*;
pub use transport::*;

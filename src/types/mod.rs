//! Types
//!
//! Core type definitions for the tenant OAuth flows.

pub mod grant;
pub mod session;
pub mod token;

pub use grant::*;
pub use session::*;
pub use token::*;

//! Credential material, account payloads, and JWT claim inspection.

pub mod account;
pub mod claims;
pub mod credentials;
pub mod token;

pub use account::*;
pub use claims::*;
pub use credentials::*;
pub use token::{pair::*, secret::*};

//! Wire types shared by the form binding and the config API client
//!
//! - configuration: the record returned by `/api/config`
//! - change_set: ordered partial updates sent as query parameters

pub mod change_set;
pub mod configuration;

pub use change_set::*;
pub use configuration::*;

pub mod api;
pub mod binding;
pub mod config;
pub mod form;
pub mod http_client;
pub mod services;
pub mod types;

pub use binding::{ConfigFormBinding, ResponseOrdering};
pub use form::{ConfigForm, FormControl, TextInput};
pub use http_client::{ConfigApi, ConfigApiClient};
pub use types::{ChangeSet, Configuration, FieldValue};

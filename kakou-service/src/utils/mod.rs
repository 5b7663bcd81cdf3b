pub mod json;
pub mod pagination;
pub mod password;
pub mod query;
pub mod time;
pub mod validation;

pub use json::JsonBody;
pub use pagination::{Page, PageRequest};
pub use password::{CredentialHasher, Password};
pub use query::QueryParams;
pub use validation::{decode_fields, validate_fields};

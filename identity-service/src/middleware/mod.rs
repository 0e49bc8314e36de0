pub mod auth;
pub mod meta;

pub use auth::{auth_middleware, CurrentUser};
pub use meta::RequestMeta;

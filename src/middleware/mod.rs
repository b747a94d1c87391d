pub mod auth;

pub use auth::{
    auth_context_middleware, require_family_admin, require_global_admin, SESSION_COOKIE,
};

mod admin;
mod login;
mod session;

pub use admin::admin_login_post;
pub use login::login_post;
pub use session::{session_logout, session_whoami};

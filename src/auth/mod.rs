//! Registration, log-in and log-out, and the middleware that resolves the
//! caller's identity from the auth cookie.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register;
mod token;
mod user;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{LogInRequest, get_log_in_page, post_log_in};
pub use log_out::post_log_out;
pub use middleware::{auth_guard, auth_guard_api};
pub use password::{PasswordHash, ValidatedPassword};
pub use redirect::normalize_redirect_url;
pub use register::{RegisterRequest, get_register_page, register_user};
pub(crate) use cookie::COOKIE_TOKEN;
pub(crate) use token::Token;
pub use user::{User, UserID, UserProfile, create_user, create_user_table, get_user_by_id};


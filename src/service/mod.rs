pub mod credentials;
pub mod signin;
pub mod validation;

pub use signin::{find_or_create_user, SignInError, SignInOutcome, SignInPolicy};
pub use validation::{CancelRequest, RequestValidator};

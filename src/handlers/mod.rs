//! HTTP handlers for sign-in, booking and cancellation, plus the catch-all.

pub mod booking;
pub mod cancel;
pub mod fallback;
pub mod signin;

pub use booking::book;
pub use cancel::cancel;
pub use fallback::unrouted;
pub use signin::sign_in;

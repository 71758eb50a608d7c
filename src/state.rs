//! Shared application state for all routes.

use crate::service::SignInPolicy;
use crate::store::BookingStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookingStore>,
    pub sign_in: SignInPolicy,
}

impl AppState {
    pub fn new(store: Arc<dyn BookingStore>, sign_in: SignInPolicy) -> Self {
        AppState { store, sign_in }
    }
}

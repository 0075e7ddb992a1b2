use std::sync::Arc;

use crate::db::Database;
use crate::engine::PaymentEngine;

use super::auth::PrincipalResolver;

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PaymentEngine>,
    pub auth: Arc<dyn PrincipalResolver>,
    pub db: Arc<Database>,
}

impl AppState {
    pub fn new(
        engine: Arc<PaymentEngine>,
        auth: Arc<dyn PrincipalResolver>,
        db: Arc<Database>,
    ) -> Self {
        Self { engine, auth, db }
    }
}

use std::sync::Arc;

use crate::services::AbandonmentService;

pub struct AppState {
    pub abandonment_service: Arc<AbandonmentService>,
}

use std::sync::Arc;

use crate::sync::HistorySync;

#[derive(Clone)]
pub struct AppState {
    pub sync: Arc<HistorySync>,
    pub cors_origin: String,
}

use std::sync::Arc;

use crate::config::AppConfig;
use crate::screen::BookingScreen;

pub struct AppState {
    pub screen: Arc<BookingScreen>,
    pub config: AppConfig,
}

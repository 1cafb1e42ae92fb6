use crate::pow::PowGuard;
use domain::CommentsConfig;
use std::sync::Arc;
use storage::Db;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Arc<CommentsConfig>,
    pub pow: PowGuard,
    pub admin_token: String,
}

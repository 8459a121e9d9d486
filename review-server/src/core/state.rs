use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::services::{
    CompletionService, LogNotifier, QueryFacade, RatingService, ReviewInviteNotifier,
    ReviewService,
};

/// Server state - shared handles to every service
///
/// Cloning is shallow (`Arc` all the way down), so handlers receive it by
/// value.
///
/// | Field | Description |
/// |-------|-------------|
/// | config | Immutable configuration |
/// | pool | SQLite connection pool |
/// | ratings | Rating aggregate store |
/// | reviews | Guide review aggregator |
/// | completions | Completion lifecycle machine |
/// | queries | Read-only facade for UI collaborators |
/// | jwt_service | Token validation |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub ratings: Arc<RatingService>,
    pub reviews: Arc<ReviewService>,
    pub completions: Arc<CompletionService>,
    pub queries: Arc<QueryFacade>,
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// Initialize state from configuration: ensure the work directory,
    /// open the database and wire the services together.
    ///
    /// # Panics
    ///
    /// Panics when the work directory or database cannot be initialized.
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("reviews.db");
        let db = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize database");

        Self::with_pool(config.clone(), db.pool, Arc::new(LogNotifier))
    }

    /// Build state over an existing pool; used by tests and embedders
    /// that bring their own notifier.
    pub fn with_pool(
        config: Config,
        pool: SqlitePool,
        notifier: Arc<dyn ReviewInviteNotifier>,
    ) -> Self {
        let ratings = Arc::new(RatingService::new(pool.clone(), config.txn_max_retries));
        let completions = Arc::new(CompletionService::new(pool.clone(), notifier));
        let reviews = Arc::new(ReviewService::new(
            pool.clone(),
            (*completions).clone(),
            &config,
        ));
        let queries = Arc::new(QueryFacade::new(
            ratings.clone(),
            reviews.clone(),
            completions.clone(),
        ));
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        Self {
            config,
            pool,
            ratings,
            reviews,
            completions,
            queries,
            jwt_service,
        }
    }
}

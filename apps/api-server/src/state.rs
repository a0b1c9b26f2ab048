//! Application state - shared across all handlers.

use std::sync::Arc;

use gofera_core::ports::{
    PasswordResetNotifier, PasswordService, RatingRepository, RateLimiter, ResetTokenService,
    RideRepository, TokenService, UserRepository,
};
use gofera_core::services::{AuthService, RideService, UserService};
use gofera_infra::{
    Argon2PasswordService, InMemoryStore, JwtTokenService, LoggingResetNotifier,
    Sha256ResetTokenService,
};

#[cfg(feature = "postgres")]
use gofera_infra::{
    DatabaseConfig, DatabaseConnections, PostgresRatingRepository, PostgresRideRepository,
    PostgresUserRepository,
};

#[cfg(feature = "rate-limit")]
use gofera_infra::InMemoryRateLimiter;

use crate::config::AppConfig;

/// How the `jwt` cookie is issued.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cookie_expires_days: i64,
    /// Send the cookie over HTTPS only.
    pub secure: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_expires_days: 90,
            secure: false,
        }
    }
}

/// The three repository ports, backed by one storage engine.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub rides: Arc<dyn RideRepository>,
    pub ratings: Arc<dyn RatingRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            rides: store.clone(),
            ratings: store,
        }
    }

    #[cfg(feature = "postgres")]
    fn postgres(connections: &DatabaseConnections) -> Self {
        let conn = connections.main.clone();
        Self {
            users: Arc::new(PostgresUserRepository::new(conn.clone())),
            rides: Arc::new(PostgresRideRepository::new(conn.clone())),
            ratings: Arc::new(PostgresRatingRepository::new(conn)),
        }
    }
}

/// Adapters for the non-storage ports.
pub struct AuthAdapters {
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub reset_tokens: Arc<dyn ResetTokenService>,
    pub notifier: Arc<dyn PasswordResetNotifier>,
    pub reset_ttl: chrono::Duration,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub rides: Arc<RideService>,
    pub users: Arc<UserService>,
    pub session: SessionSettings,
    pub rate_limiter: Option<Arc<dyn RateLimiter>>,
    /// Whether the limiter may read client addresses from proxy headers.
    pub trust_proxy: bool,
    #[cfg(feature = "postgres")]
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Wire services over the given adapters.
    pub fn from_parts(repos: Repositories, adapters: AuthAdapters, session: SessionSettings) -> Self {
        let auth = AuthService::new(
            repos.users.clone(),
            adapters.tokens,
            adapters.passwords,
            adapters.reset_tokens,
            adapters.notifier,
            adapters.reset_ttl,
        );
        let rides = RideService::new(repos.rides.clone(), repos.users.clone());
        let users = UserService::new(repos.users, repos.rides, repos.ratings);

        Self {
            auth: Arc::new(auth),
            rides: Arc::new(rides),
            users: Arc::new(users),
            session,
            rate_limiter: None,
            trust_proxy: false,
            #[cfg(feature = "postgres")]
            db: None,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Build the application state from configuration, falling back to the
    /// in-memory store when no database is reachable.
    pub async fn new(config: &AppConfig) -> Self {
        let adapters = AuthAdapters {
            tokens: Arc::new(JwtTokenService::from_env()),
            passwords: Arc::new(Argon2PasswordService::new()),
            reset_tokens: Arc::new(Sha256ResetTokenService),
            notifier: Arc::new(LoggingResetNotifier::new(config.reset_url_base.clone())),
            reset_ttl: chrono::Duration::minutes(config.password_reset_ttl_minutes),
        };
        let session = SessionSettings {
            cookie_expires_days: config.cookie_expires_days,
            secure: !config.environment.is_development(),
        };

        #[cfg(feature = "postgres")]
        let (repos, db) = match &config.database {
            Some(settings) => {
                let db_config = DatabaseConfig {
                    url: settings.url.clone(),
                    max_connections: settings.max_connections,
                    min_connections: settings.min_connections,
                };
                match DatabaseConnections::init(&db_config).await {
                    Ok(connections) => {
                        let repos = Repositories::postgres(&connections);
                        (repos, Some(Arc::new(connections)))
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            "Failed to connect to database. Using in-memory fallback."
                        );
                        (Repositories::in_memory(), None)
                    }
                }
            }
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                (Repositories::in_memory(), None)
            }
        };

        #[cfg(not(feature = "postgres"))]
        let repos = {
            if config.database.is_some() {
                tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
            }
            tracing::info!("Running with the in-memory store");
            Repositories::in_memory()
        };

        #[allow(unused_mut)]
        let mut state = Self::from_parts(repos, adapters, session);
        state.trust_proxy = config.trust_proxy;

        #[cfg(feature = "postgres")]
        {
            state.db = db;
        }

        #[cfg(feature = "rate-limit")]
        {
            state = state.with_rate_limiter(Arc::new(InMemoryRateLimiter::from_env()));
        }

        tracing::info!("Application state initialized");
        state
    }
}

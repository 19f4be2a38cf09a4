/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use agora_api::{app::AppState, config::Config};
/// use agora_shared::integrations::media::DisabledMediaStore;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config, None, Arc::new(DisabledMediaStore));
/// let app = agora_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use agora_shared::auth::middleware::{
    optional_session_middleware, session_auth_middleware, SessionAuth,
};
use agora_shared::integrations::media::MediaStore;
use agora_shared::notifications::Notifier;
use agora_shared::redis::RedisClient;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Multipart framing on top of the raw file size
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Redis client for rate limiting; `None` disables it
    pub redis: Option<RedisClient>,

    /// Media hosting client
    pub media: Arc<dyn MediaStore>,

    /// Queues notification emails in the outbox
    pub notifier: Notifier,

    /// Session validation settings
    pub session: SessionAuth,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        config: Config,
        redis: Option<RedisClient>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        let session = SessionAuth::new(db.clone(), &config.auth.session_secret, &config.auth.issuer);
        let notifier = Notifier::new(db.clone(), config.mail.link_base_url.clone());

        Self {
            db,
            redis,
            media,
            notifier,
            session,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                               # Health check (public)
/// └── /v1/
///     ├── /users/me, /users/:username
///     ├── /feed
///     ├── /pages/...                        # Pages, members, company profile,
///     │                                     # posts, contributions (+ SSE stream)
///     ├── /posts/:id[/reactions]
///     ├── /sports/{categories,academies,talents}/...
///     ├── /reviews/:id
///     ├── /inquiries/...
///     ├── /conversations/...
///     ├── /contributions/:id/{accept,reject}
///     └── /media
/// ```
///
/// # Authentication
///
/// Paths used only by signed-in users sit behind `session_auth_middleware`.
/// Paths that also serve anonymous readers sit behind
/// `optional_session_middleware`; their mutating handlers take an
/// [`AuthContext`](agora_shared::auth::middleware::AuthContext) extractor and
/// answer `401` without a session.
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Session authentication (per router)
/// 5. Rate limiting of mutations (per user)
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{
        company, contributions, conversations, health, inquiries, media, members, pages, posts,
        sports::{academies, categories, reviews, talents},
        users,
    };

    let upload_limit = state.config.media.max_bytes + MULTIPART_OVERHEAD_BYTES;

    // Session required for every method on these paths
    let protected_routes = Router::new()
        .route(
            "/users/me",
            get(users::get_me).patch(users::update_me).delete(users::delete_me),
        )
        .route("/feed", get(posts::feed))
        .route("/pages/:id/join", post(members::join_page))
        .route(
            "/pages/:id/members/me",
            axum::routing::delete(members::leave_page),
        )
        .route(
            "/pages/:id/members/:user_id",
            axum::routing::patch(members::update_member_role),
        )
        .route(
            "/pages/:id/members/:user_id/accept",
            post(members::accept_member),
        )
        .route(
            "/pages/:id/members/:user_id/reject",
            post(members::reject_member),
        )
        .route("/posts/:id/reactions", post(posts::react))
        .route(
            "/sports/categories/:id",
            axum::routing::patch(categories::update_category).delete(categories::delete_category),
        )
        .route(
            "/reviews/:id",
            axum::routing::patch(reviews::update_review).delete(reviews::delete_review),
        )
        .route(
            "/inquiries",
            get(inquiries::list_inquiries).post(inquiries::create_inquiry),
        )
        .route("/inquiries/:id/accept", post(inquiries::accept_inquiry))
        .route("/inquiries/:id/reject", post(inquiries::reject_inquiry))
        .route(
            "/conversations",
            get(conversations::list_conversations).post(conversations::start_conversation),
        )
        .route("/conversations/unread", get(conversations::unread_count))
        .route(
            "/conversations/:id/messages",
            get(conversations::list_messages).post(conversations::send_message),
        )
        .route(
            "/contributions/:id/accept",
            post(contributions::accept_contribution),
        )
        .route(
            "/contributions/:id/reject",
            post(contributions::reject_contribution),
        )
        .route(
            "/media",
            post(media::upload_media).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::rate_limit::rate_limit_layer,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.session.clone(),
            session_auth_middleware,
        ));

    // Public reads; writes on the same paths check the session in the handler
    let public_routes = Router::new()
        .route("/users/:username", get(users::get_profile))
        .route("/pages", get(pages::list_pages).post(pages::create_page))
        .route(
            "/pages/:id",
            get(pages::get_page).patch(pages::update_page).delete(pages::delete_page),
        )
        .route("/pages/:id/members", get(members::list_members))
        .route(
            "/pages/:id/company-profile",
            get(company::get_company_profile).put(company::put_company_profile),
        )
        .route(
            "/pages/:id/posts",
            get(posts::list_page_posts).post(posts::create_post),
        )
        .route(
            "/pages/:id/contributions",
            get(contributions::list_contributions).post(contributions::create_contribution),
        )
        .route(
            "/pages/:id/contributions/total",
            get(contributions::contribution_total),
        )
        .route(
            "/pages/:id/contributions/stream",
            get(contributions::stream_totals),
        )
        .route(
            "/posts/:id",
            get(posts::get_post).patch(posts::update_post).delete(posts::delete_post),
        )
        .route(
            "/sports/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/sports/academies",
            get(academies::list_academies).post(academies::create_academy),
        )
        .route(
            "/sports/academies/:id",
            get(academies::get_academy)
                .patch(academies::update_academy)
                .delete(academies::delete_academy),
        )
        .route(
            "/sports/academies/:id/reviews",
            get(reviews::list_academy_reviews).post(reviews::create_academy_review),
        )
        .route(
            "/sports/talents",
            get(talents::list_talents).post(talents::create_talent),
        )
        .route(
            "/sports/talents/:id",
            get(talents::get_talent)
                .patch(talents::update_talent)
                .delete(talents::delete_talent),
        )
        .route(
            "/sports/talents/:id/reviews",
            get(reviews::list_talent_reviews).post(reviews::create_talent_review),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::rate_limit::rate_limit_layer,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.session.clone(),
            optional_session_middleware,
        ));

    let v1_routes = Router::new().merge(protected_routes).merge(public_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

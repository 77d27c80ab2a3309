use crate::handlers::{
    accounts::{
        create_account, delete_account, get_account, get_account_operations, get_accounts,
        import_statement, update_account,
    },
    budgets::{create_budget, delete_budget, get_budget, get_budgets},
    currencies::{get_currency, list_currencies},
    follows::{
        approve_follower, create_follow, list_followers, list_following, reject_follower, unfollow,
    },
    health::health_check,
    images::{delete_image, download_image, list_images, upload_image},
    users::{delete_me, get_me, get_user, sign_in, sign_up, update_me},
};
use crate::middleware::auth_middleware;
use crate::schemas::{ApiDoc, AppState};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/currencies", get(list_currencies))
        .route("/api/v1/currencies/:iso_code", get(get_currency))
        .route("/api/v1/users/sign-up", post(sign_up))
        .route("/api/v1/users/sign-in", post(sign_in));

    let protected = Router::new()
        // Current user and other users
        .route("/api/v1/users/me", get(get_me).put(update_me).delete(delete_me))
        .route("/api/v1/users/:user_id", get(get_user))
        // Images
        .route("/api/v1/users/me/images", get(list_images).post(upload_image))
        .route(
            "/api/v1/users/me/images/:image_id",
            get(download_image).delete(delete_image),
        )
        // Follows
        .route("/api/v1/follows", post(create_follow))
        .route("/api/v1/follows/following", get(list_following))
        .route("/api/v1/follows/followers", get(list_followers))
        .route(
            "/api/v1/follows/followers/:follow_id/approve",
            put(approve_follower),
        )
        .route("/api/v1/follows/followers/:follow_id", delete(reject_follower))
        .route("/api/v1/follows/following/:follow_id", delete(unfollow))
        // Accounts
        .route("/api/v1/accounts", get(get_accounts).post(create_account))
        .route(
            "/api/v1/accounts/:account_id",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route("/api/v1/accounts/:account_id/import", post(import_statement))
        .route(
            "/api/v1/accounts/:account_id/operations",
            get(get_account_operations),
        )
        // Budgets
        .route("/api/v1/budgets", get(get_budgets).post(create_budget))
        .route("/api/v1/budgets/:budget_id", get(get_budget).delete(delete_budget))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ));

    let body_limit = state.max_upload_bytes;

    Router::new()
        .merge(public)
        .merge(protected)
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

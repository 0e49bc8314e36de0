pub mod config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    extract::State,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Json, Router,
};
use service_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::SecurityScheme,
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::IdentityConfig;
use crate::services::{
    ActivityService, AuthService, Database, JwtService, StaffService, UserService,
};
use service_core::error::AppError;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::refresh,
        handlers::user::create_user,
        handlers::user::get_me,
        handlers::user::update_me,
        handlers::user::get_user,
        handlers::user::list_users,
        handlers::user::update_user,
        handlers::user::delete_user,
        handlers::staff::create_staff,
        handlers::staff::get_staff,
        handlers::staff::list_staff,
        handlers::staff::update_staff,
        handlers::staff::delete_staff,
        handlers::staff::assign_permission,
        handlers::staff::revoke_permission,
        handlers::activity::list_activity,
    ),
    components(
        schemas(
            models::LoginRequest,
            models::LoginResponse,
            models::RefreshRequest,
            models::RefreshResponse,
            models::CreateUserRequest,
            models::UpdateUserRequest,
            models::UserResponse,
            models::UserStatus,
            models::CreateStaffRequest,
            models::UpdateStaffRequest,
            models::StaffResponse,
            models::StaffRole,
            models::Department,
            models::ActivityLogResponse,
            handlers::staff::PermissionGrantRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login, logout and token refresh"),
        (name = "Users", description = "User account management"),
        (name = "Staff", description = "Staff profiles, roles and permissions"),
        (name = "Activity", description = "Audit trail access"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: IdentityConfig,
    pub db: Database,
    pub jwt: JwtService,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub staff_service: StaffService,
    pub activity_service: ActivityService,
}

impl AppState {
    /// Wire up all services over one database handle.
    pub fn new(config: IdentityConfig, db: Database, jwt: JwtService) -> Self {
        Self {
            auth_service: AuthService::new(db.clone(), jwt.clone()),
            user_service: UserService::new(db.clone()),
            staff_service: StaffService::new(db.clone()),
            activity_service: ActivityService::new(db.clone()),
            config,
            db,
            jwt,
        }
    }
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    // Every privileged route sits behind the actor resolver; the permission
    // gate and audit calls run inside the services in that fixed order.
    let protected = Router::new()
        .route("/auth/logout", post(handlers::auth::logout))
        .route(
            "/users",
            post(handlers::user::create_user).get(handlers::user::list_users),
        )
        .route(
            "/users/me",
            get(handlers::user::get_me).patch(handlers::user::update_me),
        )
        .route(
            "/users/:user_id",
            get(handlers::user::get_user)
                .put(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
        .route(
            "/staff",
            post(handlers::staff::create_staff).get(handlers::staff::list_staff),
        )
        .route(
            "/staff/:staff_id",
            get(handlers::staff::get_staff)
                .put(handlers::staff::update_staff)
                .delete(handlers::staff::delete_staff),
        )
        .route(
            "/staff/:staff_id/permissions",
            post(handlers::staff::assign_permission),
        )
        .route(
            "/staff/:staff_id/permissions/:permission",
            delete(handlers::staff::revoke_permission),
        )
        .route("/activity", get(handlers::activity::list_activity))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh));

    if state.config.swagger_enabled {
        app =
            app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    }

    let app = app
        .merge(protected)
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .map(|o| {
                            o.parse::<axum::http::HeaderValue>().unwrap_or_else(|e| {
                                tracing::error!(
                                    "Invalid CORS origin '{}': {}. Using fallback.",
                                    o,
                                    e
                                );
                                axum::http::HeaderValue::from_static("*")
                            })
                        })
                        .collect::<Vec<axum::http::HeaderValue>>(),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::PATCH,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::HeaderName::from_static("x-refresh-token"),
                ]),
        );

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Service is unhealthy")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.db.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        AppError::from(e)
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "postgres": "up"
        }
    })))
}

use axum::{middleware, routing::get, Router};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::database::manager::DatabaseManager;
use crate::middleware::jwt_auth_middleware;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
}

/// Build the full application router over the given pool
pub fn app(pool: SqlitePool) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { pool })
}

fn auth_public_routes() -> Router<AppState> {
    use axum::routing::post;

    use crate::handlers::auth;

    Router::new()
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
}

fn protected_routes() -> Router<AppState> {
    use axum::routing::{delete, put};

    use crate::handlers::{
        attendance, auth, classes, expenses, grades, parents, payments, schedule, stats, students,
        subjects, teachers,
    };

    Router::new()
        // Session / password management
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/auth/password", put(auth::change_password))
        .route("/api/auth/accounts/:id/password", put(auth::reset_password))
        // Enrollment
        .route("/api/students", get(students::list).post(students::create))
        .route(
            "/api/students/:id",
            get(students::get).put(students::update).delete(students::delete),
        )
        // Teaching staff
        .route("/api/teachers", get(teachers::list).post(teachers::create))
        .route(
            "/api/teachers/:id",
            get(teachers::get).put(teachers::update).delete(teachers::delete),
        )
        // Guardians
        .route("/api/parents", get(parents::list))
        .route("/api/parents/:id", delete(parents::delete))
        .route("/api/parents/:id/children", get(parents::children))
        // Academic graph
        .route("/api/classes", get(classes::list).post(classes::create))
        .route(
            "/api/classes/:id",
            get(classes::get).put(classes::update).delete(classes::delete),
        )
        .route("/api/subjects", get(subjects::list).post(subjects::create))
        .route(
            "/api/subjects/:id",
            get(subjects::get).put(subjects::update).delete(subjects::delete),
        )
        .route("/api/schedule", get(schedule::list).post(schedule::create))
        .route("/api/schedule/class/:class_id", get(schedule::list_by_class))
        .route(
            "/api/schedule/:id",
            get(schedule::get).put(schedule::update).delete(schedule::delete),
        )
        .route("/api/grades", get(grades::list).post(grades::create))
        .route(
            "/api/grades/:id",
            get(grades::get).put(grades::update).delete(grades::delete),
        )
        .route("/api/attendance", get(attendance::list).post(attendance::create))
        .route(
            "/api/attendance/:id",
            get(attendance::get).put(attendance::update).delete(attendance::delete),
        )
        // Financial ledger
        .route("/api/payments", get(payments::list).post(payments::create))
        .route(
            "/api/payments/:id",
            get(payments::get).put(payments::update).delete(payments::delete),
        )
        .route("/api/expenses", get(expenses::list).post(expenses::create))
        .route(
            "/api/expenses/:id",
            get(expenses::get).put(expenses::update).delete(expenses::delete),
        )
        // Dashboard
        .route("/api/stats", get(stats::overview))
        .route_layer(middleware::from_fn(jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "School API",
            "version": version,
            "description": "School administration backend built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/api/auth/signup, /api/auth/login (public - token acquisition)",
                "auth": "/api/auth/* (protected - account management)",
                "students": "/api/students[/:id] (protected)",
                "teachers": "/api/teachers[/:id] (protected)",
                "parents": "/api/parents[/:id] (protected)",
                "classes": "/api/classes[/:id] (protected)",
                "subjects": "/api/subjects[/:id] (protected)",
                "schedule": "/api/schedule[/:id] (protected)",
                "grades": "/api/grades[/:id] (protected)",
                "attendance": "/api/attendance[/:id] (protected)",
                "payments": "/api/payments[/:id] (protected)",
                "expenses": "/api/expenses[/:id] (protected)",
                "stats": "/api/stats (protected)",
            }
        }
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}

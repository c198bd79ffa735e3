use anyhow::Context;
use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use miga_api::database::manager::DatabaseManager;
use miga_api::{handlers, middleware, rules};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECRET_JWT_SEED, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = miga_api::config::config();
    tracing::info!("Starting MIGA API in {:?} mode", config.environment);

    // A contradictory eligibility rule would reject every candidate; refuse
    // to serve instead.
    rules::validar_catalogos()
        .map_err(|err| anyhow::anyhow!("catálogo de reglas inválido: {}", err))?;

    let app = app();

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("MIGA API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(usuarios_public_routes())
        // Protected API
        .merge(protected_routes())
        // Global middleware
        .layer(axum::middleware::from_fn(middleware::correlacionar_peticion))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn protected_routes() -> Router {
    Router::new()
        .merge(personas_routes())
        .merge(sacramentos_routes())
        .merge(usuarios_routes())
        .merge(parroquias_routes())
        .merge(tipos_sacramento_routes())
        .merge(roles_sacramento_routes())
        .merge(persona_sacramentos_routes())
        .merge(matrimonio_detalles_routes())
        .merge(propuestas_routes())
        .merge(busqueda_routes())
        .route_layer(axum::middleware::from_fn(middleware::validar_jwt))
}

fn usuarios_public_routes() -> Router {
    use axum::routing::post;
    use handlers::usuarios;

    Router::new()
        .route("/api/usuarios/login", post(usuarios::login))
        .route("/api/usuarios/new", post(usuarios::crear))
}

fn usuarios_routes() -> Router {
    use handlers::usuarios;

    Router::new()
        .route("/api/usuarios", get(usuarios::listar))
        .route("/api/usuarios/all", get(usuarios::listar_todos))
        .route("/api/usuarios/renew", get(usuarios::renovar))
        .route(
            "/api/usuarios/:id",
            get(usuarios::obtener)
                .put(usuarios::actualizar)
                .patch(usuarios::eliminar),
        )
}

fn personas_routes() -> Router {
    use axum::routing::post;
    use handlers::personas;

    Router::new()
        .route("/api/personas", get(personas::listar))
        .route("/api/personas/all", get(personas::listar_todas))
        .route("/api/personas/new", post(personas::crear))
        .route(
            "/api/personas/buscar-sacramento",
            get(personas::buscar_para_sacramento),
        )
        .route(
            "/api/personas/:id",
            get(personas::obtener)
                .put(personas::actualizar)
                .patch(personas::eliminar),
        )
}

fn sacramentos_routes() -> Router {
    use axum::routing::post;
    use handlers::sacramentos;

    Router::new()
        .route("/api/sacramentos", get(sacramentos::listar))
        .route("/api/sacramentos/all", get(sacramentos::listar_todos))
        .route("/api/sacramentos/new", post(sacramentos::crear))
        // Complete aggregate: sacrament plus participant roster in one unit
        .route(
            "/api/sacramentos/completo",
            post(sacramentos::crear_sacramento_completo),
        )
        .route(
            "/api/sacramentos/completo/:id",
            get(sacramentos::obtener_sacramento_completo)
                .put(sacramentos::actualizar_sacramento_completo),
        )
        .route(
            "/api/sacramentos/busqueda-persona",
            get(sacramentos::busqueda_por_persona),
        )
        .route(
            "/api/sacramentos/:id",
            get(sacramentos::obtener)
                .put(sacramentos::actualizar)
                .patch(sacramentos::eliminar),
        )
}

fn parroquias_routes() -> Router {
    use axum::routing::post;
    use handlers::parroquias;

    Router::new()
        .route("/api/parroquias", get(parroquias::listar))
        .route("/api/parroquias/new", post(parroquias::crear))
        .route(
            "/api/parroquias/:id",
            get(parroquias::obtener).put(parroquias::actualizar),
        )
}

fn tipos_sacramento_routes() -> Router {
    use axum::routing::post;
    use handlers::tipos_sacramento;

    Router::new()
        .route("/api/tiposacramentos", get(tipos_sacramento::listar))
        .route("/api/tiposacramentos/new", post(tipos_sacramento::crear))
        .route(
            "/api/tiposacramentos/:id",
            get(tipos_sacramento::obtener).put(tipos_sacramento::actualizar),
        )
}

fn roles_sacramento_routes() -> Router {
    use axum::routing::post;
    use handlers::roles_sacramento;

    Router::new()
        .route("/api/rolsacramentos", get(roles_sacramento::listar))
        .route("/api/rolsacramentos/new", post(roles_sacramento::crear))
        .route(
            "/api/rolsacramentos/:id",
            get(roles_sacramento::obtener).put(roles_sacramento::actualizar),
        )
}

fn persona_sacramentos_routes() -> Router {
    use axum::routing::post;
    use handlers::persona_sacramentos;

    Router::new()
        .route("/api/personasacramentos", get(persona_sacramentos::listar))
        .route("/api/personasacramentos/new", post(persona_sacramentos::crear))
        .route(
            "/api/personasacramentos/sacramento/:id",
            get(persona_sacramentos::por_sacramento),
        )
        .route(
            "/api/personasacramentos/persona/:id",
            get(persona_sacramentos::por_persona),
        )
}

fn matrimonio_detalles_routes() -> Router {
    use axum::routing::post;
    use handlers::matrimonio_detalles;

    Router::new()
        .route("/api/matrimoniodetalles", get(matrimonio_detalles::listar))
        .route("/api/matrimoniodetalles/new", post(matrimonio_detalles::crear))
        .route(
            "/api/matrimoniodetalles/:id",
            get(matrimonio_detalles::obtener).put(matrimonio_detalles::actualizar),
        )
}

fn propuestas_routes() -> Router {
    use axum::routing::{patch, post};
    use handlers::propuestas;

    Router::new()
        .route("/api/propuestas", get(propuestas::listar))
        .route("/api/propuestas/new", post(propuestas::crear))
        .route("/api/propuestas/:id/publicar", patch(propuestas::publicar))
        .route("/api/propuestas/:id", patch(propuestas::eliminar))
}

fn busqueda_routes() -> Router {
    use handlers::busqueda;

    Router::new().route("/api/busqueda", get(busqueda::busqueda_global))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "ok": true,
        "name": "MIGA API",
        "version": version,
        "description": "Registro parroquial: personas, sacramentos, parroquias y participaciones",
        "endpoints": {
            "home": "/ (public)",
            "login": "/api/usuarios/login (public)",
            "usuarios": "/api/usuarios (protected)",
            "personas": "/api/personas (protected)",
            "sacramentos": "/api/sacramentos (protected)",
            "parroquias": "/api/parroquias (protected)",
            "tiposacramentos": "/api/tiposacramentos (protected)",
            "rolsacramentos": "/api/rolsacramentos (protected)",
            "personasacramentos": "/api/personasacramentos (protected)",
            "matrimoniodetalles": "/api/matrimoniodetalles (protected)",
            "propuestas": "/api/propuestas (protected)",
            "busqueda": "/api/busqueda (protected)",
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "ok": true,
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "ok": false,
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}

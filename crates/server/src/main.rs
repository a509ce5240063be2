// lecternd: HTTP server entry point.

use anyhow::{Context, Result};
use tracing::info;

use lectern_server::api::{router, ApiState};
use lectern_server::config::ServerConfig;
use lectern_server::store::course_db::CourseDb;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::load();
    let db_path = config
        .database_path()
        .context("could not determine a database path (no home directory?)")?;

    info!(path = %db_path.display(), "opening course database");
    let db = CourseDb::open(&db_path).context("failed to open course database")?;

    let app = router(ApiState::new(db));
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    info!(addr = %config.listen_addr, "lectern server listening");
    axum::serve(listener, app).await.context("server terminated unexpectedly")
}

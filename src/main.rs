//! Market Tracker: binary entrypoint.
//! Boots the Axum HTTP server with the refresh scheduler running.

use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    market_tracker::init_tracing();

    let router = market_tracker::app().await?;
    Ok(router.into())
}

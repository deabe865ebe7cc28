//! # Onyx Shop
//!
//! Storefront order, cart, and payment service.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export GOKWIK_API_KEY=gk_live_...
//! export GOKWIK_API_SECRET=...
//! export GOKWIK_PUBLIC_KEY=gk_pub_...
//! export GOKWIK_WEBHOOK_SECRET=whsec_...
//!
//! # Run the server
//! onyx-shop
//! ```

use shop_api::{routes, state::AppState};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    print_banner();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Products loaded: {}", state.catalog.products.len());
    info!("Payment gateway: {}", state.gateway.gateway_name());
    if state.webhook_secret.is_none() {
        warn!("GOKWIK_WEBHOOK_SECRET not set; webhook signatures will not be verified");
    }

    let app = routes::create_router(state);

    info!("🛍️  Onyx Shop starting on http://{}", addr);

    if !is_prod {
        info!("📦 Catalog: GET http://{}/api/v1/products", addr);
        info!("💳 Payments: POST http://{}/api/v1/payments/initiate", addr);
        info!("🔔 Webhook: POST http://{}/webhook/gokwik", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  🖤 Onyx Shop 🖤
  ━━━━━━━━━━━━━━━
  Storefront order & payment service
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}

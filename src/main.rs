use std::net::SocketAddr;
use std::sync::Arc;

use secrecy::SecretString;
use tokio::net::TcpListener;
use tokio::signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use apk_market::adapters::auth::JwtSessionValidator;
use apk_market::adapters::http::middleware::{AuthState, RateLimitState};
use apk_market::adapters::http::{app_router, HttpSettings, PaymentAppState};
use apk_market::adapters::midtrans::{SnapConfig, SnapGateway};
use apk_market::adapters::postgres::{
    PostgresAdminDirectory, PostgresAppCatalog, PostgresPaymentRepository,
    PostgresPurchaseRepository,
};
use apk_market::adapters::rate_limiter::{InMemoryRateLimiter, RedisRateLimiter};
use apk_market::application::CheckoutSettings;
use apk_market::config::{AppConfig, RedisConfig};
use apk_market::domain::payment::NotificationVerifier;
use apk_market::ports::RateLimiter;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Server exited with error");
        eprintln!("apk-market: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    info!(
        environment = ?config.server.environment,
        gateway_production = config.payment.is_production,
        "Starting apk-market"
    );

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");
    }

    let limiter = build_rate_limiter(&config).await;

    let server_key: SecretString = config.payment.midtrans_server_key.clone();
    let gateway = SnapGateway::new(
        SnapConfig::new(server_key.clone(), config.payment.is_production)
            .with_timeout(config.payment.gateway_timeout()),
    );

    let state = PaymentAppState {
        apps: Arc::new(PostgresAppCatalog::new(pool.clone())),
        payments: Arc::new(PostgresPaymentRepository::new(pool.clone())),
        purchases: Arc::new(PostgresPurchaseRepository::new(pool.clone())),
        admins: Arc::new(PostgresAdminDirectory::new(pool.clone())),
        gateway: Arc::new(gateway),
        verifier: Arc::new(NotificationVerifier::new(server_key)),
        checkout: CheckoutSettings {
            public_base_url: config.server.public_base_url().to_string(),
            merchant_name: config.payment.merchant_name.clone(),
            enabled_payments: config.payment.enabled_payments_list(),
            token_ttl_hours: config.payment.token_ttl_hours,
        },
    };

    let auth = AuthState::new(Arc::new(JwtSessionValidator::new(&config.auth.jwt_secret)))
        .with_cookie_name(config.auth.cookie_name.clone());

    let settings = HttpSettings {
        request_timeout: config.server.request_timeout(),
        cors_origins: config.server.cors_origins_list(),
    };

    let app = app_router(state, auth, RateLimitState::new(limiter), &settings);

    let address = config.server.socket_addr()?;
    let listener = TcpListener::bind(address).await?;
    info!(%address, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    pool.close().await;
    info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

async fn build_rate_limiter(config: &AppConfig) -> Arc<dyn RateLimiter> {
    let limits = config.rate_limit.to_limiter_config();

    let Some(redis) = &config.redis else {
        warn!("No Redis configured; rate limits are per process");
        return Arc::new(InMemoryRateLimiter::new(limits));
    };

    match connect_redis(redis, limits.clone()).await {
        Ok(limiter) => {
            info!("Rate limiting backed by Redis");
            Arc::new(limiter)
        }
        Err(e) => {
            warn!(error = %e, "Redis unavailable; falling back to in-memory rate limits");
            Arc::new(InMemoryRateLimiter::new(limits))
        }
    }
}

async fn connect_redis(
    redis: &RedisConfig,
    limits: apk_market::adapters::rate_limiter::RateLimitConfig,
) -> Result<RedisRateLimiter, BoxError> {
    let limiter =
        tokio::time::timeout(redis.timeout(), RedisRateLimiter::connect(&redis.url, limits))
            .await??;
    Ok(limiter)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

//! API server entry point.

use api::config::Config;
use common::{Money, ProductId, Role, UserId};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use store::{MemoryStore, PostgresStore, Product, Store, UserProfile};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use uuid::Uuid;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let config = Config::from_env();

    // 3. Pick the storage backend and start serving
    match config.database_url.clone() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(&url)
                .await
                .expect("failed to connect to database");
            let store = PostgresStore::new(pool);
            store.run_migrations().await.expect("migrations failed");
            serve(store, &config, metrics_handle).await;
        }
        None => {
            tracing::info!("DATABASE_URL not set, using in-memory store with demo data");
            let store = MemoryStore::new();
            seed_demo_data(&store).await;
            serve(store, &config, metrics_handle).await;
        }
    }
}

async fn serve<S: Store + Clone + 'static>(store: S, config: &Config, metrics_handle: PrometheusHandle) {
    let state = api::create_state(store);
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

/// Seeds fixed demo identities and a small catalog so the dev server is
/// usable without a database. The logged ids go into the `x-user-id` and
/// `x-user-role` headers normally injected by the auth layer.
async fn seed_demo_data(store: &MemoryStore) {
    let admin = UserProfile {
        id: UserId::from_uuid(
            Uuid::parse_str("00000000-0000-0000-0000-000000000001").expect("fixed uuid"),
        ),
        name: "Admin".to_string(),
        email: "admin@example.com".to_string(),
        role: Role::Admin,
    };
    let customer = UserProfile {
        id: UserId::from_uuid(
            Uuid::parse_str("00000000-0000-0000-0000-000000000002").expect("fixed uuid"),
        ),
        name: "Demo Customer".to_string(),
        email: "customer@example.com".to_string(),
        role: Role::Customer,
    };
    tracing::info!(admin = %admin.id, customer = %customer.id, "seeded demo identities");
    store.insert_user(admin).await.expect("seed admin");
    store.insert_user(customer).await.expect("seed customer");

    let catalog = [
        ("Mechanical Keyboard", "KB-100", 8_900, 42, 10, "A-01"),
        ("4K Monitor", "MN-270", 34_900, 15, 5, "A-02"),
        ("Mirrorless Camera", "CM-900", 150_000, 5, 2, "B-01"),
        ("USB-C Dock", "DK-040", 6_500, 80, 20, "B-02"),
    ];
    for (name, sku, price_cents, stock, min_stock, location) in catalog {
        store
            .insert_product(Product {
                id: ProductId::new(),
                name: name.to_string(),
                sku: sku.to_string(),
                price: Money::from_cents(price_cents),
                stock_quantity: stock,
                min_stock,
                location: location.to_string(),
            })
            .await
            .expect("seed product");
    }
}

/// Application state and router builder
///
/// Wires the managers to their collaborators (store, mailer, token codec)
/// from the loaded configuration, and mounts the route tree with the
/// authentication layers.
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                              # Health check (public)
/// └── /api/v1/
///     ├── POST  /register                  # Account lifecycle (public)
///     ├── POST  /login
///     ├── GET   /verify-email?token=...
///     ├── POST  /forgot-password
///     ├── PUT   /reset-password            # Bearer: reset token
///     ├── GET   /users                     # Admin
///     ├── /addresses/...                   # Authenticated
///     ├── /orders/...                      # Authenticated / admin
///     └── /products/...                    # Public reads, admin writes
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http `TraceLayer`)
/// 2. CORS from the configured origins
/// 3. Authentication and admin gates (per-route-group)

use crate::{config::Config, routes};
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use solestore_shared::accounts::AccountManager;
use solestore_shared::addresses::AddressBook;
use solestore_shared::auth::authenticator::{admin_middleware, create_auth_middleware, Authenticator};
use solestore_shared::auth::token::TokenCodec;
use solestore_shared::mailer::{EmailBuilder, EmailSender, LogMailer};
use solestore_shared::orders::OrderManager;
use solestore_shared::store::memory::MemoryStore;
use solestore_shared::store::{AccountStore, OrderStore, ProductStore};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned per request via Axum's `State` extractor; all fields are cheap to
/// clone (`Arc`s inside).
#[derive(Clone)]
pub struct AppState {
    /// Account lifecycle manager
    pub accounts: AccountManager,

    /// Address book manager
    pub address_book: AddressBook,

    /// Order fulfillment manager
    pub orders: OrderManager,

    /// Product collection (thin CRUD, no manager needed)
    pub products: Arc<dyn ProductStore>,

    /// Bearer-credential resolver
    pub authenticator: Authenticator,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates state with the default collaborators (in-memory store, log mailer)
    pub fn new(config: Config) -> Self {
        Self::with_collaborators(config, MemoryStore::new(), Arc::new(LogMailer))
    }

    /// Creates state over explicit store and mailer implementations
    ///
    /// Tests inject a shared [`MemoryStore`] and a capturing mailer here.
    pub fn with_collaborators<S>(config: Config, store: S, mailer: Arc<dyn EmailSender>) -> Self
    where
        S: AccountStore + ProductStore + OrderStore + Clone + 'static,
    {
        let codec = TokenCodec::new(config.token_config());
        let emails = EmailBuilder::new(config.sender_identity(), config.mail.base_url.clone());

        let account_store: Arc<dyn AccountStore> = Arc::new(store.clone());
        let product_store: Arc<dyn ProductStore> = Arc::new(store.clone());
        let order_store: Arc<dyn OrderStore> = Arc::new(store);

        AppState {
            accounts: AccountManager::new(
                account_store.clone(),
                codec.clone(),
                mailer.clone(),
                emails.clone(),
            ),
            address_book: AddressBook::new(account_store),
            orders: OrderManager::new(order_store, product_store.clone(), mailer, emails),
            products: product_store,
            authenticator: Authenticator::new(codec),
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let auth_layer = middleware::from_fn(create_auth_middleware(state.authenticator.clone()));
    let admin_layer = middleware::from_fn(admin_middleware);

    // Public account lifecycle endpoints; reset-password checks its bearer
    // token in the handler because the credential is a purpose token, not a
    // session token.
    let public_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/verify-email", get(routes::auth::verify_email))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/reset-password", put(routes::auth::reset_password));

    let user_admin_routes = Router::new()
        .route("/users", get(routes::auth::list_users))
        .layer(admin_layer.clone())
        .layer(auth_layer.clone());

    let address_routes = Router::new()
        .route(
            "/addresses",
            get(routes::addresses::list_addresses).post(routes::addresses::add_address),
        )
        .route("/addresses/:id/default", put(routes::addresses::set_default))
        .route("/addresses/:id", delete(routes::addresses::remove_address))
        .layer(auth_layer.clone());

    let order_routes = Router::new()
        .route(
            "/orders",
            get(routes::orders::list_orders).post(routes::orders::create_order),
        )
        .route("/orders/:id", get(routes::orders::get_order))
        .layer(auth_layer.clone());

    let order_admin_routes = Router::new()
        .route("/orders/all", get(routes::orders::list_all_orders))
        .route("/orders/:id/status", patch(routes::orders::update_status))
        .route("/orders/:id", delete(routes::orders::delete_order))
        .layer(admin_layer.clone())
        .layer(auth_layer.clone());

    let product_public_routes = Router::new()
        .route("/products", get(routes::products::list_products))
        .route("/products/:id", get(routes::products::get_product))
        .route(
            "/products/:id/sizes/decrement",
            post(routes::products::decrement_sizes).layer(auth_layer),
        );

    let product_admin_routes = Router::new()
        .route("/products", post(routes::products::create_product))
        .route(
            "/products/:id",
            patch(routes::products::update_product).delete(routes::products::delete_product),
        )
        .layer(admin_layer)
        .layer(middleware::from_fn(create_auth_middleware(
            state.authenticator.clone(),
        )));

    let api_v1 = Router::new()
        .merge(public_routes)
        .merge(user_admin_routes)
        .merge(address_routes)
        .merge(order_routes)
        .merge(order_admin_routes)
        .merge(product_public_routes)
        .merge(product_admin_routes);

    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1", api_v1)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
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
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

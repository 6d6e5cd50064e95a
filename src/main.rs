//! Stashbox - multi-tenant file storage API.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stashbox::{
    config::{CheckConfig, Cli, Command, ServeConfig},
    create_router, create_s3_client,
    server::RouterConfig,
    storage::S3ObjectStore,
    store::PgCredentialStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(config) => run_serve(config).await,
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Configuration:");
    info!("  S3 region: {}", config.s3_region);
    if let Some(ref endpoint) = config.s3_endpoint {
        info!("  S3 endpoint: {}", endpoint);
    }
    info!("  Token expiry: 1h, signed URL expiry: 5m");

    // Connect to the credential store
    info!("");
    info!("Connecting to database...");
    let pool = match connect_database(&config.database_url).await {
        Ok(pool) => {
            info!("  Connected successfully");
            pool
        }
        Err(e) => {
            error!("  Failed to connect to database: {}", e);
            error!("");
            error!("  Please check:");
            error!("    - The database URL is correct");
            error!("    - The database is running and reachable");
            error!("    - The users table has been provisioned");
            return ExitCode::FAILURE;
        }
    };

    // Create S3 client
    let s3_client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;
    let storage = S3ObjectStore::new(s3_client, config.s3_region.clone());
    let users = PgCredentialStore::new(pool);

    // Build router
    let router_config = build_router_config(&config);
    let router = create_router(storage, users, router_config);

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!(
        "    curl -X POST http://{}/api/login -d '{{\"username\":\"...\",\"password\":\"...\"}}'",
        addr
    );
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Connect to Postgres and verify the connection with a trivial query.
async fn connect_database(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "stashbox=debug,tower_http=debug"
    } else {
        "stashbox=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new(&config.jwt_secret, &config.early_access_secret);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    // Initialize minimal logging for check command
    if config.verbose {
        init_logging(true);
    }

    println!("Stashbox Configuration Check");
    println!("═════════════════════════════════");
    println!();

    if let Some(ref endpoint) = config.s3_endpoint {
        println!("✓ Endpoint: {}", endpoint);
    }
    println!("✓ Region: {}", config.s3_region);
    println!();

    // Test database connectivity
    print!("Testing database connection... ");

    match connect_database(&config.database_url).await {
        Ok(pool) => {
            println!("✓ success");

            print!("Checking users table... ");
            match sqlx::query("SELECT COUNT(*) FROM users").execute(&pool).await {
                Ok(_) => println!("✓ present"),
                Err(e) => {
                    println!("✗ missing");
                    println!();
                    println!("Error: {}", e);
                    println!();
                    println!("The users table has not been provisioned.");
                    return ExitCode::FAILURE;
                }
            }
        }
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            println!();
            println!("Please check:");
            println!("  - The database URL is correct");
            println!("  - The database is running and reachable");
            return ExitCode::FAILURE;
        }
    }

    // Test S3 connectivity
    print!("Testing S3 connection... ");

    let s3_client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;

    match s3_client.list_buckets().send().await {
        Ok(result) => {
            println!("✓ success");
            println!("  Found {} bucket(s)", result.buckets().len());
        }
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            println!();
            println!("Please check:");
            println!("  - Your AWS credentials are configured correctly");
            if config.s3_endpoint.is_some() {
                println!("  - The S3 endpoint is correct and reachable");
            }
            return ExitCode::FAILURE;
        }
    }

    println!();
    println!("═════════════════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}

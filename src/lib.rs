pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod services;

use std::sync::Arc;

use anyhow::Context;
pub use config::Config;
use db::Store;
use serde::Serialize;
use services::{
    IdentityService, SeaOrmIdentityService, ServiceResponse, SystemClock, TokenIssuer,
    notification::create_sender,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Opens the store (running migrations) and wires the identity service.
pub async fn build_identity_service(config: &Config) -> anyhow::Result<SeaOrmIdentityService> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let tokens = Arc::new(TokenIssuer::from_config(&config.security));
    let notifier = create_sender(&config.notification).context("Failed to set up notifications")?;

    SeaOrmIdentityService::new(store, config, tokens, notifier, Arc::new(SystemClock))
}

pub async fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    if matches!(args[1].as_str(), "init" | "--init") {
        if Config::create_default_if_missing()? {
            println!("✓ Config file created. Edit config.toml and run again.");
        } else {
            println!("Config file already exists.");
        }
        return Ok(());
    }

    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match args[1].as_str() {
        "migrate" => cmd_migrate(&config).await,

        "login" => {
            if args.len() < 4 {
                println!("Usage: orgid login <username> <password>");
                return Ok(());
            }
            let service = build_identity_service(&config).await?;
            let result = service.login(&args[2], &args[3]).await;
            report(ServiceResponse::from_result(result, "Login successful"))
        }

        "forgot-password" => {
            if args.len() < 3 {
                println!("Usage: orgid forgot-password <email>");
                return Ok(());
            }
            let service = build_identity_service(&config).await?;
            let result = service.forgot_password(&args[2]).await;
            report(ServiceResponse::from_result(
                result,
                "An OTP has been sent to your email",
            ))
        }

        "verify" => {
            if args.len() < 4 {
                println!("Usage: orgid verify <email> <code>");
                return Ok(());
            }
            let service = build_identity_service(&config).await?;
            let result = service.verify(&args[2], &args[3]).await;
            report(ServiceResponse::from_result(
                result,
                "Email verified successfully",
            ))
        }

        "resend-otp" => {
            if args.len() < 3 {
                println!("Usage: orgid resend-otp <email>");
                return Ok(());
            }
            let service = build_identity_service(&config).await?;
            let result = service.resend_otp(&args[2]).await;
            report(ServiceResponse::from_result(result, "A new OTP has been sent"))
        }

        "reset-password" => {
            if args.len() < 4 {
                println!("Usage: orgid reset-password <email> <new_password>");
                return Ok(());
            }
            let service = build_identity_service(&config).await?;
            let result = service.reset_password(Some(&args[2]), &args[3]).await;
            report(ServiceResponse::from_result(
                result,
                "Password reset successfully",
            ))
        }

        "users" | "ls" => {
            let service = build_identity_service(&config).await?;
            let result = service.list_accounts().await;
            report(ServiceResponse::from_result(result, "Accounts"))
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        _ => {
            println!("Unknown command: {}", args[1]);
            println!();
            print_help();
            Ok(())
        }
    };

    if let Some(handle) = prometheus_handle {
        debug!(metrics = %handle.render(), "Metrics snapshot");
    }

    result
}

fn report<T: Serialize>(response: ServiceResponse<T>) -> anyhow::Result<()> {
    let rendered =
        serde_json::to_string_pretty(&response).context("Failed to render response")?;
    println!("{rendered}");
    Ok(())
}

async fn cmd_migrate(config: &Config) -> anyhow::Result<()> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;
    store.ping().await?;

    println!("✓ Database is up to date: {}", config.general.database_path);
    Ok(())
}

fn print_help() {
    println!("orgid - Organization identity service");
    println!();
    println!("USAGE:");
    println!("  orgid <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("  migrate                          Create/upgrade the database schema");
    println!("  login <username> <password>      Authenticate and print a session token");
    println!("  forgot-password <email>          Send a password reset code");
    println!("  verify <email> <code>            Verify a one-time code");
    println!("  resend-otp <email>               Send a fresh code (limited)");
    println!("  reset-password <email> <pass>    Set a new password after verification");
    println!("  users, ls                        List accounts");
    println!("  init                             Create default config file");
    println!("  help                             Show this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("  {}                 Token signing secret", config::JWT_SECRET_ENV);
    println!("  RUST_LOG                         Log filter (overrides general.log_level)");
}

use clap::Parser;
use reelauth::cli::{
    Args, build_auth_config, handle_create_user, init_logging, load_jwt_secret, open_database,
};
use reelauth::{ServerConfig, init_cleanup, run_server};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some(jwt_secret) = load_jwt_secret(args.jwt_secret_file.as_deref()) else {
        std::process::exit(1);
    };

    let Some(auth) = build_auth_config(&args, jwt_secret) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    if let (Some(email), Some(first_name), Some(last_name)) =
        (&args.create_user, &args.first_name, &args.last_name)
    {
        handle_create_user(&db, email, first_name, last_name).await;
    }

    if args.single_use_refresh {
        init_cleanup(&db).await;
    }

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    match listener.local_addr() {
        Ok(local_addr) => info!(address = %local_addr, "Listening"),
        Err(e) => error!(error = %e, "Failed to get local address"),
    }

    let config = ServerConfig {
        db,
        auth,
        single_use_refresh: args.single_use_refresh,
    };

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

// src/main.rs
use crate_dispatch::api;
use crate_dispatch::catalog::Catalog;
use crate_dispatch::config::AppConfig;

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let store_path = app_config.catalog.store_path();

    let catalog = match Catalog::load_from_path(store_path) {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!(
                "❌ Could not load product store from {}: {}",
                store_path.display(),
                err
            );
            std::process::exit(1);
        }
    };
    println!(
        "🚀 Crate dispatch service starting with {} products...",
        catalog.len()
    );

    api::start_api_server(
        app_config.api.clone(),
        catalog,
        app_config.packer.dispatch_config(),
    )
    .await;
}

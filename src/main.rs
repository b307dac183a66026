use anyhow::Context;
use gomate::{init_logging, App, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::load(None).context("loading configuration")?;
    let app = App::build(&config).context("starting GoMate")?;
    let store = &app.store;

    match store.hydrate().await {
        Some(user) => tracing::info!(user = %user.display_name(), "Welcome back"),
        None => tracing::info!("No saved session"),
    }

    if let Err(e) = store.destinations.fetch().await {
        tracing::error!(error = %e, "Destinations unavailable");
    }

    let snapshot = store.snapshot();
    tracing::info!(
        authenticated = snapshot.session.is_authenticated,
        destinations = snapshot.destinations.items.len(),
        favourites = snapshot.favourites.items.len(),
        dark = snapshot.theme.is_dark,
        "GoMate ready"
    );

    app.flush().context("flushing storage")?;
    Ok(())
}

use anyhow::{Context, Result};
use env_logger::Env;
use log::info;
use matchbot_store::auth::AuthorizedStates;
use matchbot_store::config::Config;
use matchbot_store::{store, MatchService};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    let pool = store::connect(&config.database)
        .await
        .context("could not open the match database")?;
    store::migrate(&pool)
        .await
        .context("could not migrate the match database")?;

    let service = MatchService::new(pool.clone());
    let states = AuthorizedStates::new(config.auth.state_ttl);
    let sweeper = states.spawn_sweeper(config.auth.sweep_period);

    let running = service.list_running_matches().await?;
    let awaiting = service.list_matches_awaiting_votes().await?;
    info!(
        "Match store ready: {} running, {} awaiting votes",
        running.len(),
        awaiting.len()
    );

    tokio::signal::ctrl_c()
        .await
        .context("could not listen for shutdown")?;
    info!("Shutting down");
    sweeper.abort();
    pool.close().await;
    Ok(())
}

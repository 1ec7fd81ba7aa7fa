use coinquote_server::{api::app_router, build_state, config::Config, init_tracing, scheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();
    let state = build_state(&config).await?;

    // Drop expired tickers for pairs nobody asks for anymore
    scheduler::start_cache_sweeper(
        state.ticker_cache.clone(),
        config.ticker_ttl,
        config.cache_sweep_interval,
    );

    let router = app_router(state, &config);
    tracing::info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

use concilia_dashboard::{build_context, init_tracing, scheduler, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    init_tracing();

    let ctx = build_context(config)?;
    let scheduler = scheduler::start(ctx.clone());
    tracing::info!(
        "dashboard pipeline running against {} (poll every {:?})",
        ctx.config.base_url,
        ctx.config.poll_interval
    );

    tokio::signal::ctrl_c().await?;
    scheduler.shutdown();
    ctx.teardown();
    Ok(())
}

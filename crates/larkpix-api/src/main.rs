use larkpix_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();
    larkpix_api::telemetry::init_tracing();

    // Fails fast when a required credential is absent.
    let config = Config::from_env()?;

    let (state, router) = larkpix_api::setup::initialize_app(config)?;
    larkpix_api::setup::server::start_server(&state.config, router).await?;

    Ok(())
}

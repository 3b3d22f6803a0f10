use skydrive_api::setup;
use skydrive_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    skydrive_api::init_telemetry()?;

    let config = Config::from_env()?;
    let (_state, router) = setup::initialize_app(config.clone()).await?;
    setup::server::start_server(&config, router).await?;

    Ok(())
}

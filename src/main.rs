use anyhow::Context;
use bookapi_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookapi settings")?;
    bookapi_telemetry::init_tracing(&settings.telemetry)?;

    bookapi_app::bootstrap::serve(&settings).await
}

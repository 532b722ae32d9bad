use kabaddi_live_service::api;
use kabaddi_live_service::common::init;
use kabaddi_live_service::settings::AppSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = AppSettings::get();
    init::initialize_logging(settings);
    match settings.app_component.as_str() {
        "api" => api::serve(settings).await,
        _ => panic!("Unknown app component"),
    }
}

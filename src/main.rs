use tracing::Level;
use vision_console::config::Settings;
use vision_console::error::AppError;
use vision_console::ConsoleApp;

fn init_logging(level: Level) {
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let settings = Settings::load()?;
    init_logging(settings.max_level()?);
    ConsoleApp::start_gui(&settings)
}

use stable_pairing::config::Settings;
use stable_pairing::core::Pipeline;
use stable_pairing::services::{load_request, write_json, TableError};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str, format: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

fn run(settings: &Settings) -> Result<(), TableError> {
    let request = load_request(&settings.input.request)?;
    let pipeline = Pipeline::new(settings.pairing.clone());
    let output = settings.output.path.as_deref();

    if settings.rounds.enabled() {
        info!(
            "Scheduling {} rounds and {} bonus rounds",
            settings.rounds.num_pairs, settings.rounds.num_bonus
        );
        let response = pipeline.schedule(&request, settings.rounds)?;
        write_json(&response, output)
    } else {
        let response = pipeline.pair(&request, settings.output.orientation)?;
        write_json(&response, output)
    }
}

fn main() {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    init_logging(&settings.logging.level, &settings.logging.format);
    info!("Starting stable pairing run...");

    if let Err(e) = run(&settings) {
        error!("Pairing failed: {}", e);
        std::process::exit(1);
    }
}

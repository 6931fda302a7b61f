use shelterline_server::{init_tracing, AppConfig, ShelterServer};

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(1);
        }
    };
    if let Err(err) = config.validate() {
        eprintln!("configuration error: {err}");
        std::process::exit(1);
    }

    init_tracing(&config.logging.level);

    if let Err(err) = ShelterServer::new(config).run().await {
        eprintln!("server error: {err}");
        std::process::exit(1);
    }
}

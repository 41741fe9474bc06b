use dotenvy::dotenv;
use log::info;
use order_processing_server::{config::ServerConfig, server::run_server};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let config = ServerConfig::from_env_or_default();

    info!("🚀️ Starting the order processing service");
    match run_server(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}

use dotenvy::dotenv;
use shipbot::{bot::run_bot, config::BotConfig};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        },
    };
    match run_bot(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}

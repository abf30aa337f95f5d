use std::path::PathBuf;
use std::process::exit;
use std::time::Duration;

use log::{error, info};

use error::ClientError;
use quote::Config;

mod error;
mod quote;

const SERVER_URL: &str = "http://localhost:8080/cotacao";
const OUTPUT_FILE: &str = "cotacao.txt";
const REQUEST_TIMEOUT: Duration = Duration::from_millis(300);

fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let config = Config {
        server_url: SERVER_URL.to_string(),
        output_path: PathBuf::from(OUTPUT_FILE),
        timeout: REQUEST_TIMEOUT,
    };

    info!("Requesting quote from {}", config.server_url);
    match quote::run(&config) {
        Ok(_) => {}
        Err(ClientError::Timeout(t)) => {
            error!("Timeout: server did not answer within {:?}", t);
            exit(1);
        }
        Err(e) => {
            error!("{}", e);
            exit(1);
        }
    }
}

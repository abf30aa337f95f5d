use std::process::exit;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, middleware::Logger, web};
use awesome_api::AwesomeAPI;
use log::{error, info};
use quote_store::SqliteQuoteStore;

use context::{QuoteContext, StageTimeouts};

mod context;
mod handlers;

const BIND_ADDR: (&str, u16) = ("0.0.0.0", 8080);
const DB_PATH: &str = "./cotacoes.db";
const API_TIMEOUT: Duration = Duration::from_millis(200);
const DB_TIMEOUT: Duration = Duration::from_millis(10);

struct Config {
    bind_addr: (&'static str, u16),
    db_path: &'static str,
    timeouts: StageTimeouts,
}

impl Config {
    fn new() -> Config {
        Config {
            bind_addr: BIND_ADDR,
            db_path: DB_PATH,
            timeouts: StageTimeouts {
                fetch: API_TIMEOUT,
                store: DB_TIMEOUT,
            },
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let config = Config::new();

    let store = match SqliteQuoteStore::open(config.db_path) {
        Ok(store) => store,
        Err(e) => {
            error!("Could not open database {}: {}", config.db_path, e);
            exit(1);
        }
    };
    match store.count().and_then(|count| store.latest().map(|last| (count, last))) {
        Ok((count, Some(last))) => info!(
            "Database ready, {} quotes stored, last bid {} at {}",
            count, last.bid, last.timestamp
        ),
        Ok((_, None)) => info!("Database ready, no quotes stored yet"),
        Err(e) => {
            error!("Database unusable: {}", e);
            exit(1);
        }
    }

    let ctx = web::Data::new(QuoteContext::new(
        Arc::new(AwesomeAPI::new()),
        Arc::new(store),
        config.timeouts,
    ));

    info!(
        "Listening on {}:{} | fetch timeout {:?} | store timeout {:?}",
        config.bind_addr.0, config.bind_addr.1, config.timeouts.fetch, config.timeouts.store
    );

    HttpServer::new(move || {
        App::new()
            .app_data(ctx.clone())
            .configure(handlers::configure)
            .wrap(Logger::default())
    })
    .bind(config.bind_addr)?
    .run()
    .await
}

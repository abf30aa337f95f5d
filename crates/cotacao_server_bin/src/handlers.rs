use actix_web::{HttpResponse, Responder, get, web};
use awesome_api::ApiError;
use log::{error, info, warn};
use quote_model::BidResponse;
use quote_store::StoreError;
use tokio::time;

use crate::context::QuoteContext;

#[get("/cotacao")]
pub async fn get_cotacao(ctx: web::Data<QuoteContext>) -> impl Responder {
    let fetch_timeout = ctx.timeouts.fetch;
    let fetched = time::timeout(fetch_timeout, ctx.source.get_rate(fetch_timeout))
        .await
        .unwrap_or_else(|_| Err(ApiError::Timeout(fetch_timeout)));

    let rate = match fetched {
        Ok(rate) => rate,
        Err(e) if e.is_timeout() => {
            error!("get_cotacao | exchange rate not fetched within {:?}", fetch_timeout);
            return HttpResponse::InternalServerError().body("exchange rate request timed out");
        }
        Err(e) => {
            error!("get_cotacao | could not fetch exchange rate: {}", e);
            return HttpResponse::InternalServerError().body("could not fetch exchange rate");
        }
    };

    // Persistence is best-effort: the bid is already in hand.
    let store_timeout = ctx.timeouts.store;
    let saved = time::timeout(store_timeout, ctx.store.save_bid(&rate.bid, store_timeout))
        .await
        .unwrap_or_else(|_| Err(StoreError::Timeout(store_timeout)));

    match saved {
        Ok(id) => info!("get_cotacao | stored bid {} as id {}", rate.bid, id),
        Err(e) if e.is_timeout() => {
            warn!("get_cotacao | bid not stored within {:?}", store_timeout)
        }
        Err(e) => error!("get_cotacao | could not store bid: {}", e),
    }

    HttpResponse::Ok().json(BidResponse { bid: rate.bid })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_cotacao);
}

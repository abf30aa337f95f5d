use std::sync::Arc;
use std::time::Duration;

use awesome_api::RateSource;
use quote_store::QuoteStore;

/// Independent deadlines for each stage of a quote request.
#[derive(Debug, Clone, Copy)]
pub struct StageTimeouts {
    pub fetch: Duration,
    pub store: Duration,
}

pub struct QuoteContext {
    pub source: Arc<dyn RateSource>,
    pub store: Arc<dyn QuoteStore>,
    pub timeouts: StageTimeouts,
}

impl QuoteContext {
    pub fn new(
        source: Arc<dyn RateSource>,
        store: Arc<dyn QuoteStore>,
        timeouts: StageTimeouts,
    ) -> Self {
        QuoteContext {
            source,
            store,
            timeouts,
        }
    }
}

//! Fans out one fetch per configured feed source, isolates per-source
//! failures, and merges the extracted arrivals into the response served to
//! clients.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use tracing::{debug, error};

use crate::config::{Direction, FeedSource, StationConfig};
use crate::extract::{Arrival, extract_arrivals};
use crate::fetch::{HttpClient, fetch_bytes};
use crate::parser::parse_feed;

/// Cap on arrivals returned per direction.
pub const MAX_PER_DIRECTION: usize = 10;

/// Upcoming arrivals split by travel direction, each sorted ascending by
/// arrival time and capped at [`MAX_PER_DIRECTION`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionalArrivals {
    pub uptown: Vec<Arrival>,
    pub downtown: Vec<Arrival>,
}

/// The payload served by `GET /api/arrivals`. Built fresh per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResponse {
    pub station: String,
    pub updated_at: DateTime<Utc>,
    pub arrivals: DirectionalArrivals,
}

/// Fetches all configured feeds concurrently and merges their arrivals.
pub struct Aggregator<C> {
    client: Arc<C>,
    config: Arc<StationConfig>,
}

impl<C: HttpClient + 'static> Aggregator<C> {
    pub fn new(client: C, config: StationConfig) -> Self {
        Aggregator {
            client: Arc::new(client),
            config: Arc::new(config),
        }
    }

    /// Runs one full aggregation cycle: one task per feed source, wait for
    /// all, merge, sort, partition by direction, cap.
    ///
    /// Individual source failures degrade to "no arrivals from this source"
    /// and are logged, never propagated. The only error this returns is a
    /// panicked task, which indicates a bug rather than a bad feed.
    pub async fn fetch_arrivals(&self) -> Result<AggregateResponse> {
        let now = Utc::now().timestamp();

        let mut tasks = Vec::with_capacity(self.config.feeds.len());
        for source in &self.config.feeds {
            let client = Arc::clone(&self.client);
            let config = Arc::clone(&self.config);
            let source = source.clone();

            let span = tracing::info_span!("fetch_feed", feed_id = %source.id);
            tasks.push(tokio::spawn(
                async move { fetch_source(client.as_ref(), &config, &source, now).await }
                    .instrument(span),
            ));
        }

        // Wait for all sources; no early exit on a slow or failing feed
        let mut merged = Vec::new();
        for task in tasks {
            merged.extend(task.await?);
        }

        merged.sort_by_key(|a| a.arrival_time);

        let (uptown, downtown): (Vec<Arrival>, Vec<Arrival>) = merged
            .into_iter()
            .partition(|a| a.direction == Direction::Uptown);

        let mut arrivals = DirectionalArrivals { uptown, downtown };
        arrivals.uptown.truncate(MAX_PER_DIRECTION);
        arrivals.downtown.truncate(MAX_PER_DIRECTION);

        Ok(AggregateResponse {
            station: self.config.station.clone(),
            updated_at: Utc::now(),
            arrivals,
        })
    }
}

/// Fetches, decodes, and extracts one source. Every failure mode maps to an
/// empty list plus a logged diagnostic.
async fn fetch_source<C: HttpClient>(
    client: &C,
    config: &StationConfig,
    source: &FeedSource,
    now: i64,
) -> Vec<Arrival> {
    match fetch_bytes(client, &source.url).await {
        Ok(bytes) => {
            debug!(bytes = bytes.len(), "Feed bytes received, parsing");
            match parse_feed(&bytes) {
                Ok(feed) => {
                    let arrivals = extract_arrivals(Some(&feed), config, now);
                    debug!(
                        entity_count = feed.entity.len(),
                        arrival_count = arrivals.len(),
                        "Feed processed"
                    );
                    arrivals
                }
                Err(e) => {
                    error!(error = %e, "Feed parse failed");
                    Vec::new()
                }
            }
        }
        Err(e) => {
            error!(error = %e, "Feed fetch failed");
            Vec::new()
        }
    }
}

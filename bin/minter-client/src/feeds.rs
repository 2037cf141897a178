//! Pollers pushing the external feeds into the [`FeedChannel`].

use std::time::Duration;

use anyhow::Context;
use minter_primitives::prelude::*;
use minter_status::FeedChannel;
use minter_tasks::{ShutdownGuard, TaskExecutor};
use serde::de::DeserializeOwned;
use tokio::time::{self, MissedTickBehavior};
use tracing::*;

use crate::config::FeedsConfig;

pub(crate) fn spawn_feed_pollers(
    executor: &TaskExecutor,
    client: reqwest::Client,
    config: &FeedsConfig,
    feeds: FeedChannel,
) {
    let interval = config.poll_interval();

    let (url, fc, cl) = (
        config.eth_finality_url.clone(),
        feeds.clone(),
        client.clone(),
    );
    executor.spawn_critical_async_with_shutdown("eth_finality_poller", move |shutdown| {
        poll_feed(shutdown, cl, url, interval, move |state: EthFinalityState| {
            fc.update_eth_finality(state)
        })
    });

    let (url, fc, cl) = (
        config.bridge_state_url.clone(),
        feeds.clone(),
        client.clone(),
    );
    executor.spawn_critical_async_with_shutdown("bridge_state_poller", move |shutdown| {
        poll_feed(shutdown, cl, url, interval, move |state: BridgeJobState| {
            fc.update_bridge_state(state)
        })
    });

    let url = config.bridge_timings_url.clone();
    executor.spawn_critical_async_with_shutdown("bridge_timings_poller", move |shutdown| {
        poll_feed(shutdown, client, url, interval, move |timings: TimingsExtension| {
            feeds.update_bridge_timings(timings)
        })
    });
}

/// Fetches `url` every `interval` until shutdown and hands each parsed value to `publish`.
///
/// Failures never stop the poller, the feed is simply tried again on the next tick.
async fn poll_feed<T, F>(
    shutdown: ShutdownGuard,
    client: reqwest::Client,
    url: String,
    interval: Duration,
    publish: F,
) -> anyhow::Result<()>
where
    T: DeserializeOwned,
    F: Fn(T) -> bool,
{
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.wait_for_shutdown() => break,
            _ = ticker.tick() => {}
        }

        match fetch_feed::<T>(&client, &url).await {
            Ok(value) => {
                if publish(value) {
                    trace!(%url, "feed updated");
                }
            }
            Err(err) => warn!(%url, err = %format!("{err:#}"), "failed to poll feed"),
        }
    }

    debug!(%url, "feed poller exiting");
    Ok(())
}

async fn fetch_feed<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> anyhow::Result<T> {
    let value = client
        .get(url)
        .send()
        .await
        .context("requesting feed")?
        .error_for_status()
        .context("feed responded with error")?
        .json::<T>()
        .await
        .context("decoding feed")?;
    Ok(value)
}

//! The poll cycle and the loop that drives it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::classifier::classify;
use super::source::{NotionSource, RecordSource};
use super::ticker::Ticker;
use crate::config::AppConfig;
use crate::notification::{
    DiscordChannel, DiscordConfig, NotificationRouter, render_next_poll_notice,
};
use crate::snapshot::{JsonFileStore, PropertyNames, SnapshotStore, normalize_all};
use crate::utils::http_client;
use crate::Result;

/// Behavior knobs for [`TaskMonitor`].
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub property_names: PropertyNames,
    pub poll_interval: Duration,
    /// When set, a "next update" notice in this timezone follows every cycle
    /// that delivered at least one notification.
    pub next_poll_notice: Option<Tz>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            property_names: PropertyNames::default(),
            poll_interval: Duration::from_secs(60),
            next_poll_notice: None,
        }
    }
}

/// What one poll cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub records: usize,
    pub events: usize,
    pub delivered: usize,
    pub failed: usize,
    pub unroutable: usize,
    /// The snapshot differed from the stored one and was written.
    pub persisted: bool,
}

/// Fetch, diff, notify, persist.
pub struct TaskMonitor {
    source: Arc<dyn RecordSource>,
    store: Arc<dyn SnapshotStore>,
    router: NotificationRouter,
    settings: MonitorSettings,
}

impl TaskMonitor {
    pub fn new(
        source: Arc<dyn RecordSource>,
        store: Arc<dyn SnapshotStore>,
        router: NotificationRouter,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            source,
            store,
            router,
            settings,
        }
    }

    /// Wire up the production source, store and webhook channels.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = http_client::build_client(config.request_timeout);

        let notion = notion_source::NotionClient::new(client.clone(), config.notion.token.clone())
            .with_api_base(&config.notion.api_base)?;
        let source = NotionSource::new(notion, config.notion.database_id.clone());

        let mut router = NotificationRouter::new(config.webhooks.routing_table())
            .with_notice_endpoint(config.webhooks.notice_endpoint());
        for (endpoint, url) in config.webhooks.endpoints() {
            let channel = DiscordChannel::new(
                DiscordConfig {
                    webhook_url: url.to_string(),
                    username: config.webhook_username.clone(),
                    avatar_url: config.webhook_avatar_url.clone(),
                },
                client.clone(),
            );
            router = router.with_channel(endpoint, Arc::new(channel));
        }

        let settings = MonitorSettings {
            property_names: PropertyNames::default(),
            poll_interval: config.poll_interval,
            next_poll_notice: config.announce_next_poll.then_some(config.notice_timezone),
        };

        Ok(Self::new(
            Arc::new(source),
            Arc::new(JsonFileStore::new(&config.state_path)),
            router,
            settings,
        ))
    }

    /// Run one full poll cycle.
    ///
    /// A fetch failure aborts the cycle before anything is loaded, sent or
    /// written. Delivery and save failures are logged and reported but do
    /// not fail the cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let pages = self.source.fetch().await?;
        let current = normalize_all(&pages, &self.settings.property_names);
        let previous = self.store.load().await;

        if previous.is_empty() && !current.is_empty() {
            warn!(
                records = current.len(),
                "No previous snapshot; every record will be reported as created"
            );
        }

        let events = classify(&previous, &current);
        let summary = self.router.dispatch_all(&events).await;

        let mut report = CycleReport {
            records: current.len(),
            events: events.len(),
            delivered: summary.delivered,
            failed: summary.failed,
            unroutable: summary.unroutable,
            persisted: false,
        };

        if current != previous {
            match self.store.save(&current).await {
                Ok(()) => report.persisted = true,
                Err(e) => warn!(error = %e, "Failed to persist snapshot; changes will be reported again"),
            }
        }

        if report.delivered > 0
            && let Some(tz) = self.settings.next_poll_notice
        {
            self.announce_next_poll(tz).await;
        }

        Ok(report)
    }

    async fn announce_next_poll(&self, tz: Tz) {
        let step = chrono::Duration::from_std(self.settings.poll_interval).unwrap_or_default();
        let next = (Utc::now() + step).with_timezone(&tz);
        let result = self.router.announce(&render_next_poll_notice(next)).await;
        debug!(?result, "Next poll notice");
    }

    /// Poll on every tick until cancelled.
    ///
    /// Cancellation is observed between cycles; a running cycle finishes.
    pub async fn run<T: Ticker>(&self, mut ticker: T, cancel: CancellationToken) {
        info!(
            interval_secs = self.settings.poll_interval.as_secs(),
            "Task monitor started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Task monitor shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    match self.run_cycle().await {
                        Ok(report) if report.events > 0 => {
                            info!(
                                records = report.records,
                                events = report.events,
                                delivered = report.delivered,
                                failed = report.failed,
                                unroutable = report.unroutable,
                                persisted = report.persisted,
                                "Poll cycle completed"
                            );
                        }
                        Ok(report) => {
                            debug!(records = report.records, persisted = report.persisted, "Poll cycle completed, no changes");
                        }
                        Err(e) => {
                            warn!(error = %e, transient = e.is_transient(), "Poll cycle failed; keeping previous snapshot");
                        }
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for TaskMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskMonitor")
            .field("settings", &self.settings)
            .field("notice_endpoint", &self.router.notice_endpoint())
            .finish_non_exhaustive()
    }
}


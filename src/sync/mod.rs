//! Sync orchestration.
//!
//! A single spawned actor owns every piece of mutable state: the source
//! list, the selection, the displayed items, per-source statuses, the
//! read-state ledger and the cache engine. Commands and fetch completions
//! arrive on one channel, so no two completions ever mutate the cache
//! concurrently. After each handled message the actor publishes an
//! immutable [`Snapshot`] on a watch channel; UI layers render from the
//! latest snapshot and never reach into live state.

mod orchestrator;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::app::{FreshetError, Result};
use crate::domain::{FeedItem, FeedSource, FeedStatus, SourceId};
use crate::fetcher::Fetcher;
use crate::store::Store;
use orchestrator::{Msg, Orchestrator};

/// How often the background refresh round fires while the process lives.
pub const REFRESH_INTERVAL_SECS: u64 = 900;

/// Upper bound on concurrent in-flight feed fetches.
pub const MAX_IN_FLIGHT_FETCHES: usize = 10;

/// Immutable view of the orchestrator state, published on every change.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Bumped once per handled message; lets consumers order snapshots.
    pub revision: u64,
    pub sources: Vec<FeedSource>,
    pub selected: Option<SourceId>,
    /// Items of the selected source, newest-known-first.
    pub items: Vec<FeedItem>,
    /// True while a foreground refresh-all round is in flight.
    pub refreshing: bool,
    pub statuses: HashMap<SourceId, FeedStatus>,
    /// Sources holding at least one item absent from the read ledger.
    pub unread_sources: HashSet<SourceId>,
    pub read_links: HashSet<String>,
}

impl Snapshot {
    pub fn source_status(&self, id: SourceId) -> FeedStatus {
        self.statuses.get(&id).copied().unwrap_or_default()
    }

    pub fn selected_source(&self) -> Option<&FeedSource> {
        let id = self.selected?;
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn source_by_url(&self, url: &str) -> Option<&FeedSource> {
        self.sources.iter().find(|s| s.url == url)
    }
}

#[derive(Debug)]
pub(crate) enum Command {
    AddSource { name: String, url: String },
    UpdateSource { id: SourceId, name: String, url: String },
    DeleteSource { id: SourceId },
    SelectSource { id: Option<SourceId> },
    RefreshAll { background: bool },
    ForceRefreshSelected,
    MarkRead { link: String },
    MarkUnread { link: String },
    MarkAllRead,
    Shutdown,
}

/// Cloneable handle to a running orchestrator.
///
/// Commands are fire-and-forget messages; observable results land in the
/// snapshot stream. Only URL validation fails synchronously, before
/// anything reaches the network.
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::Sender<Msg>,
    snapshot_rx: watch::Receiver<Snapshot>,
}

impl SyncHandle {
    /// Spawn the orchestrator actor and its periodic refresh timer.
    ///
    /// The timer sends a background refresh-all every
    /// [`REFRESH_INTERVAL_SECS`] and is aborted when the actor shuts down.
    pub fn spawn(store: Arc<dyn Store>, fetcher: Arc<dyn Fetcher>) -> SyncHandle {
        let (tx, rx) = mpsc::channel(64);
        let orchestrator = Orchestrator::load(store, fetcher, tx.clone());
        let (snapshot_tx, snapshot_rx) = watch::channel(orchestrator.snapshot());

        let tick_tx = tx.clone();
        let timer = tokio::spawn(async move {
            let mut timer = tokio::time::interval(Duration::from_secs(REFRESH_INTERVAL_SECS));
            timer.tick().await; // consume the immediate first tick
            loop {
                timer.tick().await;
                let refresh = Msg::Command(Command::RefreshAll { background: true });
                if tick_tx.send(refresh).await.is_err() {
                    break;
                }
            }
        });

        tokio::spawn(orchestrator.run(rx, snapshot_tx, timer));

        SyncHandle { tx, snapshot_rx }
    }

    /// Add a feed source and trigger its validation fetch. A URL already
    /// present among the sources is silently ignored by the orchestrator.
    pub async fn add_source(&self, name: &str, url: &str) -> Result<()> {
        url::Url::parse(url)?;
        self.send(Command::AddSource {
            name: name.to_string(),
            url: url.to_string(),
        })
        .await
    }

    /// Replace a source's name and URL in place, keeping its id. If the
    /// source is selected this triggers an immediate fetch of the new URL.
    pub async fn update_source(&self, id: SourceId, name: &str, url: &str) -> Result<()> {
        url::Url::parse(url)?;
        self.send(Command::UpdateSource {
            id,
            name: name.to_string(),
            url: url.to_string(),
        })
        .await
    }

    pub async fn delete_source(&self, id: SourceId) -> Result<()> {
        self.send(Command::DeleteSource { id }).await
    }

    pub async fn select_source(&self, id: Option<SourceId>) -> Result<()> {
        self.send(Command::SelectSource { id }).await
    }

    /// Force-fetch every source, bypassing the cache-duration check. A
    /// foreground refresh raises the global refreshing flag until the
    /// whole round has completed.
    pub async fn refresh_all(&self, background: bool) -> Result<()> {
        self.send(Command::RefreshAll { background }).await
    }

    pub async fn force_refresh_selected(&self) -> Result<()> {
        self.send(Command::ForceRefreshSelected).await
    }

    pub async fn mark_read(&self, link: &str) -> Result<()> {
        self.send(Command::MarkRead {
            link: link.to_string(),
        })
        .await
    }

    pub async fn mark_unread(&self, link: &str) -> Result<()> {
        self.send(Command::MarkUnread {
            link: link.to_string(),
        })
        .await
    }

    /// Mark every cached item of every current source read.
    pub async fn mark_all_read(&self) -> Result<()> {
        self.send(Command::MarkAllRead).await
    }

    pub fn is_read(&self, link: &str) -> bool {
        self.snapshot_rx.borrow().read_links.contains(link)
    }

    pub fn source_has_unread(&self, id: SourceId) -> bool {
        self.snapshot_rx.borrow().unread_sources.contains(&id)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    /// Wait until the published snapshot satisfies `pred`.
    pub async fn wait_until<F>(&self, pred: F) -> Result<()>
    where
        F: Fn(&Snapshot) -> bool,
    {
        let mut rx = self.snapshot_rx.clone();
        loop {
            if pred(&rx.borrow_and_update()) {
                return Ok(());
            }
            rx.changed().await.map_err(|_| FreshetError::EngineStopped)?;
        }
    }

    /// Stop the actor and its periodic timer.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Msg::Command(Command::Shutdown)).await;
    }

    async fn send(&self, cmd: Command) -> Result<()> {
        self.tx
            .send(Msg::Command(cmd))
            .await
            .map_err(|_| FreshetError::EngineStopped)
    }
}

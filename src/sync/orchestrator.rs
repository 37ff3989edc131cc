use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::JoinHandle;

use crate::app::Result;
use crate::domain::{FeedItem, FeedSource, FeedStatus, ReadState, SourceId};
use crate::engine::{CacheEngine, FetchPlan};
use crate::fetcher::Fetcher;
use crate::parser;
use crate::store::Store;
use crate::sync::{Command, Snapshot, MAX_IN_FLIGHT_FETCHES};

pub(crate) enum Msg {
    Command(Command),
    FetchDone {
        url: String,
        outcome: Result<Vec<FeedItem>>,
        completed_at: DateTime<Utc>,
        /// Set when this is the add-time validation fetch of a new source.
        validating: Option<SourceId>,
        /// Foreground refresh-all round this fetch belongs to, if any.
        round: Option<u64>,
    },
}

pub(crate) struct Orchestrator {
    sources: Vec<FeedSource>,
    next_id: SourceId,
    selected: Option<SourceId>,
    items: Vec<FeedItem>,
    statuses: HashMap<SourceId, FeedStatus>,
    read_state: ReadState,
    cache: CacheEngine,
    store: Arc<dyn Store>,
    fetcher: Arc<dyn Fetcher>,
    tx: mpsc::Sender<Msg>,
    fetch_slots: Arc<Semaphore>,
    revision: u64,
    refreshing: bool,
    round: u64,
    round_pending: usize,
}

impl Orchestrator {
    pub(crate) fn load(
        store: Arc<dyn Store>,
        fetcher: Arc<dyn Fetcher>,
        tx: mpsc::Sender<Msg>,
    ) -> Self {
        let sources = store.load_sources();
        let next_id = sources.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let read_state = store.load_read_state();
        let cache = CacheEngine::load(store.clone());

        Self {
            sources,
            next_id,
            selected: None,
            items: Vec::new(),
            statuses: HashMap::new(),
            read_state,
            cache,
            store,
            fetcher,
            tx,
            fetch_slots: Arc::new(Semaphore::new(MAX_IN_FLIGHT_FETCHES)),
            revision: 0,
            refreshing: false,
            round: 0,
            round_pending: 0,
        }
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            revision: self.revision,
            sources: self.sources.clone(),
            selected: self.selected,
            items: self.items.clone(),
            refreshing: self.refreshing,
            statuses: self.statuses.clone(),
            unread_sources: self.unread_sources(),
            read_links: self.read_state.read_links.clone(),
        }
    }

    pub(crate) async fn run(
        mut self,
        mut rx: mpsc::Receiver<Msg>,
        snapshot_tx: watch::Sender<Snapshot>,
        timer: JoinHandle<()>,
    ) {
        while let Some(msg) = rx.recv().await {
            let stop = matches!(&msg, Msg::Command(Command::Shutdown));
            self.handle(msg);
            self.revision += 1;
            let _ = snapshot_tx.send(self.snapshot());
            if stop {
                break;
            }
        }
        timer.abort();
    }

    fn handle(&mut self, msg: Msg) {
        match msg {
            Msg::Command(cmd) => self.handle_command(cmd),
            Msg::FetchDone {
                url,
                outcome,
                completed_at,
                validating,
                round,
            } => self.handle_fetch_done(url, outcome, completed_at, validating, round),
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::AddSource { name, url } => self.add_source(name, url),
            Command::UpdateSource { id, name, url } => self.update_source(id, name, url),
            Command::DeleteSource { id } => self.delete_source(id),
            Command::SelectSource { id } => self.select_source(id),
            Command::RefreshAll { background } => self.refresh_all(background),
            Command::ForceRefreshSelected => self.force_refresh_selected(),
            Command::MarkRead { link } => {
                self.read_state.mark_read(&link, Utc::now());
                self.persist_read_state();
            }
            Command::MarkUnread { link } => {
                self.read_state.mark_unread(&link);
                self.persist_read_state();
            }
            Command::MarkAllRead => self.mark_all_read(),
            Command::Shutdown => {}
        }
    }

    fn add_source(&mut self, name: String, url: String) {
        if self.sources.iter().any(|s| s.url == url) {
            tracing::debug!(%url, "duplicate source url, ignoring add");
            return;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.sources.push(FeedSource::new(id, name, url.clone()));
        self.persist_sources();

        self.selected = Some(id);
        self.items.clear();
        self.statuses.insert(id, FeedStatus::Loading);
        self.spawn_fetch(url, Some(id), None);
    }

    fn update_source(&mut self, id: SourceId, name: String, url: String) {
        let Some(source) = self.sources.iter_mut().find(|s| s.id == id) else {
            tracing::warn!(id, "update for unknown source");
            return;
        };
        source.name = name;
        source.url = url.clone();
        self.persist_sources();

        // the cache entry at the old URL is left in place, orphaned
        if self.selected == Some(id) {
            self.statuses.insert(id, FeedStatus::Loading);
            self.spawn_fetch(url, None, None);
        }
    }

    fn delete_source(&mut self, id: SourceId) {
        let before = self.sources.len();
        self.sources.retain(|s| s.id != id);
        if self.sources.len() == before {
            tracing::warn!(id, "delete for unknown source");
            return;
        }

        self.statuses.remove(&id);
        if self.selected == Some(id) {
            self.selected = None;
            self.items.clear();
        }
        // the cache entry for the deleted source's URL is not purged
        self.persist_sources();
    }

    fn select_source(&mut self, id: Option<SourceId>) {
        let Some(id) = id else {
            self.selected = None;
            self.items.clear();
            return;
        };
        let Some(source) = self.sources.iter().find(|s| s.id == id) else {
            tracing::warn!(id, "select for unknown source");
            return;
        };
        let url = source.url.clone();
        self.selected = Some(id);

        match self.cache.resolve(&url, false, Utc::now()) {
            FetchPlan::ServeCache(items) => {
                self.items = items;
                self.statuses.insert(id, FeedStatus::Ready);
            }
            FetchPlan::Fetch => {
                // keep whatever is cached on screen while the fetch runs
                self.items = self.cache.items(&url).to_vec();
                self.statuses.insert(id, FeedStatus::Loading);
                self.spawn_fetch(url, None, None);
            }
        }
    }

    fn refresh_all(&mut self, background: bool) {
        if self.sources.is_empty() {
            return;
        }

        let round = if background {
            None
        } else {
            self.round += 1;
            self.round_pending = self.sources.len();
            self.refreshing = true;
            Some(self.round)
        };

        let targets: Vec<(SourceId, String)> = self
            .sources
            .iter()
            .map(|s| (s.id, s.url.clone()))
            .collect();
        for (id, url) in targets {
            self.statuses.insert(id, FeedStatus::Loading);
            self.spawn_fetch(url, None, round);
        }
    }

    fn force_refresh_selected(&mut self) {
        let Some(id) = self.selected else {
            return;
        };
        let Some(source) = self.sources.iter().find(|s| s.id == id) else {
            return;
        };
        let url = source.url.clone();
        self.statuses.insert(id, FeedStatus::Loading);
        self.spawn_fetch(url, None, None);
    }

    fn mark_all_read(&mut self) {
        let links: Vec<String> = self
            .sources
            .iter()
            .flat_map(|s| self.cache.items(&s.url))
            .map(|i| i.link.clone())
            .collect();

        let now = Utc::now();
        for link in links {
            self.read_state.mark_read(&link, now);
        }
        self.persist_read_state();
    }

    fn handle_fetch_done(
        &mut self,
        url: String,
        outcome: Result<Vec<FeedItem>>,
        completed_at: DateTime<Utc>,
        validating: Option<SourceId>,
        round: Option<u64>,
    ) {
        // at most one source can hold a URL via add, but an edit may alias
        // another source's URL, so resolve all holders
        let holders: Vec<SourceId> = self
            .sources
            .iter()
            .filter(|s| s.url == url)
            .map(|s| s.id)
            .collect();

        match outcome {
            Ok(items) => {
                if let Some(id) = validating {
                    if holders.contains(&id) && items.is_empty() && !self.cache.has_entry(&url) {
                        // first-time validation: a feed with no items is
                        // rejected rather than kept as a dead source
                        tracing::warn!(%url, "feed produced no items, rejecting new source");
                        self.delete_source(id);
                        self.finish_round(round);
                        return;
                    }
                }
                if holders.is_empty() {
                    // source deleted or re-pointed while the fetch was in
                    // flight; the result no longer has a home
                    tracing::debug!(%url, "dropping fetch result for unreferenced url");
                    self.finish_round(round);
                    return;
                }

                self.cache.apply_fetch(&url, items, completed_at);
                for id in &holders {
                    self.statuses.insert(*id, FeedStatus::Ready);
                }
                if self.selected.is_some_and(|sel| holders.contains(&sel)) {
                    self.items = self.cache.items(&url).to_vec();
                }
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "feed fetch failed");
                let stale = self.cache.has_entry(&url);
                for id in &holders {
                    let status = if stale {
                        FeedStatus::ErrorStaleCache
                    } else {
                        FeedStatus::Error
                    };
                    self.statuses.insert(*id, status);
                }
                if self.selected.is_some_and(|sel| holders.contains(&sel)) {
                    self.items = if stale {
                        self.cache.items(&url).to_vec()
                    } else {
                        Vec::new()
                    };
                }
            }
        }

        self.finish_round(round);
    }

    fn finish_round(&mut self, round: Option<u64>) {
        if round != Some(self.round) || !self.refreshing {
            return;
        }
        self.round_pending = self.round_pending.saturating_sub(1);
        if self.round_pending == 0 {
            self.refreshing = false;
            // the selection survives the round; repopulate it from the
            // now-updated cache
            if let Some(source) = self
                .selected
                .and_then(|sel| self.sources.iter().find(|s| s.id == sel))
            {
                self.items = self.cache.items(&source.url).to_vec();
            }
        }
    }

    /// Fetch and parse on a worker task, then marshal the outcome back to
    /// the actor. The semaphore bounds how many fetches run at once.
    fn spawn_fetch(&self, url: String, validating: Option<SourceId>, round: Option<u64>) {
        let fetcher = self.fetcher.clone();
        let tx = self.tx.clone();
        let slots = self.fetch_slots.clone();

        tokio::spawn(async move {
            let _permit = slots.acquire_owned().await.expect("Semaphore closed");

            let outcome = match fetcher.fetch(&url).await {
                Ok(bytes) => Ok(parser::parse(&bytes)),
                Err(e) => Err(e),
            };

            let _ = tx
                .send(Msg::FetchDone {
                    url,
                    outcome,
                    completed_at: Utc::now(),
                    validating,
                    round,
                })
                .await;
        });
    }

    fn unread_sources(&self) -> HashSet<SourceId> {
        self.sources
            .iter()
            .filter(|s| self.cache.has_unread(&s.url, &self.read_state.read_links))
            .map(|s| s.id)
            .collect()
    }

    fn persist_sources(&self) {
        if let Err(e) = self.store.save_sources(&self.sources) {
            tracing::warn!(error = %e, "failed to persist source list");
        }
    }

    fn persist_read_state(&self) {
        if let Err(e) = self.store.save_read_state(&self.read_state) {
            tracing::warn!(error = %e, "failed to persist read state");
        }
    }
}

//! Tab manager coordinating the normal and incognito tab strips

use super::{
    ObserverId, ObserverRegistry, RecentlyClosed, Tab, TabEvent, TabGroup, TabId, TabObserver,
    derive_groups,
};
use crate::screenshot::ScreenshotStore;
use crate::session::capture::{capture_closing_tab, capture_partition};
use crate::session::restore::{prepare_records, selection_hint};
use crate::session::storage::SessionStore;
use crate::session::{Persister, SavedTab, SessionState};
use skiff_config::Config;
use skiff_surface::{SurfaceFactory, UserAgentPolicy};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Parameters for opening a tab.
#[derive(Debug, Clone, Default)]
pub struct AddTabRequest {
    /// Initial URL; None opens an empty tab awaiting input
    pub url: Option<Url>,
    /// Which partition the tab joins
    pub incognito: bool,
    /// Tab this one was opened out of (link in new tab, window.open)
    pub opener: Option<TabId>,
    /// Workspace to tag the tab with
    pub space_id: Option<String>,
    /// Whether the new tab becomes the visible one
    pub select: bool,
}

/// Ticket for completing a restore started with [`TabManager::begin_restore`].
///
/// Starting another restore on the same partition invalidates older tokens;
/// completing with a stale one is discarded.
#[derive(Debug, Clone, Copy)]
pub struct RestoreToken {
    epoch: u64,
    incognito: bool,
}

/// An add that arrived while its partition was mid-restore. The tab is built
/// immediately (so the caller gets a real id) and inserted when the restore
/// settles.
struct QueuedAdd {
    tab: Tab,
    opener: Option<TabId>,
    select: bool,
}

/// One ordered strip of tabs plus its selection and closed-tab archive.
struct Partition {
    incognito: bool,
    tabs: Vec<Tab>,
    /// Id of the selected tab; always a member of `tabs` when set
    selected: Option<TabId>,
    recently_closed: RecentlyClosed,
    /// Bumped by `begin_restore`; completions quoting an older epoch are stale
    restore_epoch: u64,
    restoring: bool,
    queued: Vec<QueuedAdd>,
}

impl Partition {
    fn new(incognito: bool) -> Self {
        Self {
            incognito,
            tabs: Vec::new(),
            selected: None,
            recently_closed: RecentlyClosed::new(),
            restore_epoch: 0,
            restoring: false,
            queued: Vec::new(),
        }
    }

    /// Where a new tab lands: right after its opener, else the end.
    fn insert_index(&self, opener: Option<TabId>) -> usize {
        opener
            .and_then(|op| self.tabs.iter().position(|t| t.id == op).map(|i| i + 1))
            .unwrap_or(self.tabs.len())
    }

    /// Group root for an opener id, looking through queued adds too.
    fn find_root(&self, opener: TabId) -> Option<TabId> {
        self.tabs
            .iter()
            .find(|t| t.id == opener)
            .map(|t| t.root_id)
            .or_else(|| {
                self.queued
                    .iter()
                    .find(|q| q.tab.id == opener)
                    .map(|q| q.tab.root_id)
            })
    }
}

/// Owns every tab in both partitions and coordinates lifecycle, selection,
/// grouping, restore, and persistence hand-off.
///
/// All mutation happens on the owner's thread; the manager is deliberately
/// not shared. Surface engines queue their callbacks internally and the host
/// folds them in via [`pump_surface_events`](Self::pump_surface_events), so
/// cached tab state only ever changes here. Only persistence leaves this
/// thread, through [`Persister`].
pub struct TabManager {
    normal: Partition,
    incognito: Partition,
    /// Which strip is frontmost
    active_incognito: bool,
    config: Config,
    factory: Box<dyn SurfaceFactory>,
    ua_policy: Box<dyn UserAgentPolicy>,
    observers: ObserverRegistry,
}

impl TabManager {
    pub fn new(
        config: Config,
        factory: Box<dyn SurfaceFactory>,
        ua_policy: Box<dyn UserAgentPolicy>,
    ) -> Self {
        Self {
            normal: Partition::new(false),
            incognito: Partition::new(true),
            active_incognito: false,
            config,
            factory,
            ua_policy,
            observers: ObserverRegistry::new(),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Open a tab and return its id.
    ///
    /// Returns None only when the `max_tabs` limit refuses the add. While the
    /// target partition is mid-restore the tab is created but held back, then
    /// inserted in arrival order once the restore completes; the returned id
    /// is valid either way.
    pub fn add_tab(&mut self, request: AddTabRequest) -> Option<TabId> {
        let AddTabRequest {
            url,
            incognito,
            opener,
            space_id,
            select,
        } = request;

        if self.config.max_tabs > 0 && self.total_count() >= self.config.max_tabs {
            log::warn!(
                "Cannot create new tab: max_tabs limit ({}) reached",
                self.config.max_tabs
            );
            return None;
        }

        let id = Uuid::new_v4();
        // Tabs opened out of another tab share its group root; an opener that
        // is no longer around degrades to a fresh root.
        let partition = if incognito {
            &self.incognito
        } else {
            &self.normal
        };
        let root_id = opener.and_then(|op| partition.find_root(op)).unwrap_or(id);

        let desktop_site = url
            .as_ref()
            .and_then(|u| u.host_str())
            .map(|host| self.ua_policy.desktop_mode(host))
            .unwrap_or(false);

        let surface = self.factory.create(incognito);
        let mut tab = Tab::new(id, root_id, opener, space_id, incognito, desktop_site, surface);
        if let Some(url) = url {
            tab.load(url);
        }

        let partition = if incognito {
            &mut self.incognito
        } else {
            &mut self.normal
        };
        if partition.restoring {
            debug_log!("tab", "Partition mid-restore, queueing add of tab {}", id);
            partition.queued.push(QueuedAdd { tab, opener, select });
            return Some(id);
        }

        let index = partition.insert_index(opener);
        partition.tabs.insert(index, tab);
        if select {
            partition.selected = Some(id);
            self.active_incognito = incognito;
        }
        log::info!("Created new tab {} (total: {})", id, partition.tabs.len());
        self.observers.notify(&TabEvent::TabAdded {
            id,
            incognito,
            selected: select,
        });
        Some(id)
    }

    /// Close a tab by id. Unknown ids are a no-op.
    ///
    /// The tab is snapshotted into its partition's recently-closed archive
    /// first (tabs that never committed a load vanish without a record). If
    /// it was the selected tab, selection falls back to its parent when the
    /// config asks for that and the parent is still in the partition, else
    /// the right-hand neighbor, else the left, else none.
    pub fn remove_tab(&mut self, id: TabId) {
        let capacity = self.config.recently_closed_capacity;
        let prefer_parent = self.config.select_parent_on_close;

        let Some((partition, idx)) = self.locate_mut(id) else {
            return;
        };
        log::info!("Closing tab {} (index {})", id, idx);

        if let Some(record) = capture_closing_tab(&partition.tabs[idx], idx) {
            partition.recently_closed.push(record, capacity);
        }
        let removed = partition.tabs.remove(idx);
        let incognito = removed.incognito;
        let previously_selected = partition.selected;

        if partition.selected == Some(id) {
            partition.selected = if prefer_parent
                && let Some(parent) = removed.parent_id
                && partition.tabs.iter().any(|t| t.id == parent)
            {
                Some(parent)
            } else if partition.tabs.is_empty() {
                None
            } else {
                Some(partition.tabs[idx.min(partition.tabs.len() - 1)].id)
            };
        }
        let new_selection = partition.selected;

        if new_selection != previously_selected {
            self.materialize_selection(incognito);
        }
        self.observers.notify(&TabEvent::TabRemoved {
            id,
            incognito,
            new_selection,
        });
    }

    /// Close several tabs in one operation.
    ///
    /// Selection is recomputed once after all removals and observers get one
    /// aggregate event per affected partition. Ids that are not present are
    /// skipped.
    pub fn remove_tabs(&mut self, ids: &[TabId]) {
        for incognito in [false, true] {
            let targets: HashSet<TabId> = {
                let partition = if incognito {
                    &self.incognito
                } else {
                    &self.normal
                };
                ids.iter()
                    .copied()
                    .filter(|id| partition.tabs.iter().any(|t| t.id == *id))
                    .collect()
            };
            if targets.is_empty() {
                continue;
            }
            let (removed, new_selection) = self.remove_batch(incognito, &targets, true);
            self.materialize_selection(incognito);
            self.observers.notify(&TabEvent::TabsRemoved {
                ids: removed,
                incognito,
                new_selection,
            });
        }
    }

    /// Close every tab of one partition matching a predicate, atomically.
    ///
    /// Observers never see a partial strip: the whole wipe lands before the
    /// single aggregate event. Returns the removed ids in strip order.
    pub fn remove_tabs_matching<F>(&mut self, incognito: bool, predicate: F) -> Vec<TabId>
    where
        F: Fn(&Tab) -> bool,
    {
        let targets: HashSet<TabId> = {
            let partition = if incognito {
                &self.incognito
            } else {
                &self.normal
            };
            partition
                .tabs
                .iter()
                .filter(|t| predicate(t))
                .map(|t| t.id)
                .collect()
        };
        if targets.is_empty() {
            return Vec::new();
        }
        let (removed, new_selection) = self.remove_batch(incognito, &targets, true);
        self.materialize_selection(incognito);
        self.observers.notify(&TabEvent::TabsRemoved {
            ids: removed.clone(),
            incognito,
            new_selection,
        });
        removed
    }

    /// Wipe a partition.
    ///
    /// Normal tabs are archived on the way out so the wipe is undoable.
    /// Incognito tabs are not archived and the incognito archive itself is
    /// discarded with the partition; when the incognito strip was frontmost
    /// the manager falls back to the normal one. Empty partitions are a
    /// no-op.
    pub fn close_all_tabs(&mut self, incognito: bool) {
        let targets: HashSet<TabId> = {
            let partition = if incognito {
                &self.incognito
            } else {
                &self.normal
            };
            partition.tabs.iter().map(|t| t.id).collect()
        };
        if targets.is_empty() {
            return;
        }

        let (removed, _) = self.remove_batch(incognito, &targets, !incognito);
        let partition = if incognito {
            &mut self.incognito
        } else {
            &mut self.normal
        };
        partition.selected = None;
        if incognito {
            partition.recently_closed.clear();
            if self.active_incognito {
                self.active_incognito = false;
            }
        }
        log::info!(
            "Closed all {} {} tab(s)",
            removed.len(),
            if incognito { "incognito" } else { "normal" }
        );
        self.observers.notify(&TabEvent::AllTabsRemoved {
            was_incognito: incognito,
        });
    }

    /// Shared batch-removal path. Removes every target, archives them when
    /// asked, and resolves the partition's selection once. Returns the
    /// removed ids in strip order and the settled selection.
    fn remove_batch(
        &mut self,
        incognito: bool,
        targets: &HashSet<TabId>,
        archive: bool,
    ) -> (Vec<TabId>, Option<TabId>) {
        let capacity = self.config.recently_closed_capacity;
        let prefer_parent = self.config.select_parent_on_close;
        let partition = if incognito {
            &mut self.incognito
        } else {
            &mut self.normal
        };

        // Selection context captured before the strip changes.
        let selected_info = partition
            .selected
            .filter(|sid| targets.contains(sid))
            .map(|sid| {
                let idx = partition
                    .tabs
                    .iter()
                    .position(|t| t.id == sid)
                    .unwrap_or(0);
                let parent = partition.tabs[idx].parent_id;
                (idx, parent)
            });

        let previous = std::mem::take(&mut partition.tabs);
        let mut removed = Vec::new();
        let mut survivors_before_selected = 0usize;
        for (idx, tab) in previous.into_iter().enumerate() {
            if targets.contains(&tab.id) {
                if archive && let Some(record) = capture_closing_tab(&tab, idx) {
                    partition.recently_closed.push(record, capacity);
                }
                removed.push(tab.id);
            } else {
                if let Some((sel_idx, _)) = selected_info
                    && idx < sel_idx
                {
                    survivors_before_selected += 1;
                }
                partition.tabs.push(tab);
            }
        }

        if let Some((_, parent)) = selected_info {
            partition.selected = if prefer_parent
                && let Some(p) = parent
                && partition.tabs.iter().any(|t| t.id == p)
            {
                Some(p)
            } else if partition.tabs.is_empty() {
                None
            } else {
                let idx = survivors_before_selected.min(partition.tabs.len() - 1);
                Some(partition.tabs[idx].id)
            };
        }
        (removed, partition.selected)
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Make a tab the visible one, switching partitions if needed.
    ///
    /// A dormant tab gets its engine attached here. Selecting the already
    /// visible tab, or an unknown id, is a no-op.
    pub fn select_tab(&mut self, id: TabId) {
        let Some(incognito) = self.partition_of(id) else {
            return;
        };
        if incognito == self.active_incognito && self.active().selected == Some(id) {
            return;
        }
        let previous = self.active().selected;

        let factory = self.factory.as_ref();
        let partition = if incognito {
            &mut self.incognito
        } else {
            &mut self.normal
        };
        if let Some(tab) = partition.tabs.iter_mut().find(|t| t.id == id) {
            tab.materialize(factory);
        }
        partition.selected = Some(id);
        self.active_incognito = incognito;
        log::debug!("Switched to tab {}", id);
        self.observers.notify(&TabEvent::SelectionChanged {
            previous,
            current: Some(id),
        });
    }

    /// Select the next tab in the active partition (wraps around).
    pub fn select_next(&mut self) {
        let next = {
            let partition = self.active();
            if partition.tabs.len() <= 1 {
                return;
            }
            let current_idx = partition
                .selected
                .and_then(|id| partition.tabs.iter().position(|t| t.id == id))
                .unwrap_or(0);
            partition.tabs[(current_idx + 1) % partition.tabs.len()].id
        };
        self.select_tab(next);
    }

    /// Select the previous tab in the active partition (wraps around).
    pub fn select_previous(&mut self) {
        let previous = {
            let partition = self.active();
            if partition.tabs.len() <= 1 {
                return;
            }
            let current_idx = partition
                .selected
                .and_then(|id| partition.tabs.iter().position(|t| t.id == id))
                .unwrap_or(0);
            let prev_idx = if current_idx == 0 {
                partition.tabs.len() - 1
            } else {
                current_idx - 1
            };
            partition.tabs[prev_idx].id
        };
        self.select_tab(previous);
    }

    /// Move a tab to a specific index within its partition (drag reorder).
    /// The target is clamped. Returns true if the tab actually moved.
    pub fn move_tab(&mut self, id: TabId, target_index: usize) -> bool {
        let Some((partition, current_idx)) = self.locate_mut(id) else {
            return false;
        };
        let clamped = target_index.min(partition.tabs.len().saturating_sub(1));
        if clamped == current_idx {
            return false;
        }
        let tab = partition.tabs.remove(current_idx);
        partition.tabs.insert(clamped, tab);
        log::debug!("Moved tab {} from index {} to {}", id, current_idx, clamped);
        true
    }

    // =========================================================================
    // Restore
    // =========================================================================

    /// Start a restore on one partition and get the token to complete it
    /// with. Any restore already in flight there is superseded.
    pub fn begin_restore(&mut self, incognito: bool) -> RestoreToken {
        let partition = if incognito {
            &mut self.incognito
        } else {
            &mut self.normal
        };
        partition.restore_epoch += 1;
        partition.restoring = true;
        debug_log!(
            "tab",
            "Restore epoch {} begun ({})",
            partition.restore_epoch,
            if incognito { "incognito" } else { "normal" }
        );
        RestoreToken {
            epoch: partition.restore_epoch,
            incognito,
        }
    }

    /// Complete a restore: rebuild tabs from saved records and return the ids
    /// actually restored, in strip order.
    ///
    /// Records are validated, deduplicated against tabs already present (so
    /// replaying the same batch is harmless) and ordered by their saved
    /// index. Restored tabs are dormant until selected. Adds queued during
    /// the restore are inserted afterwards in arrival order. An empty batch
    /// still completes the restore, which is how a restore is cancelled. A
    /// stale token discards everything.
    pub fn restore_saved_tabs(
        &mut self,
        token: &RestoreToken,
        records: Vec<SavedTab>,
        select: bool,
    ) -> Vec<TabId> {
        let incognito = token.incognito;
        let existing: HashSet<TabId> = {
            let partition = if incognito {
                &self.incognito
            } else {
                &self.normal
            };
            if token.epoch != partition.restore_epoch {
                log::info!(
                    "Discarding superseded restore (epoch {} < {})",
                    token.epoch,
                    partition.restore_epoch
                );
                return Vec::new();
            }
            partition
                .tabs
                .iter()
                .map(|t| t.id)
                .chain(partition.queued.iter().map(|q| q.tab.id))
                .collect()
        };

        let records = prepare_records(records, &existing);
        let hint = selection_hint(&records);
        let mut events: Vec<TabEvent> = Vec::new();

        let factory = self.factory.as_ref();
        let partition = if incognito {
            &mut self.incognito
        } else {
            &mut self.normal
        };

        let mut ids = Vec::with_capacity(records.len());
        for record in &records {
            let tab = Tab::from_saved(record);
            ids.push(tab.id);
            partition.tabs.push(tab);
        }
        partition.restoring = false;

        if select && let Some(sel) = hint {
            partition.selected = Some(sel);
            if let Some(tab) = partition.tabs.iter_mut().find(|t| t.id == sel) {
                tab.materialize(factory);
            }
            self.active_incognito = incognito;
        }
        events.push(TabEvent::TabsRestored {
            ids: ids.clone(),
            incognito,
        });

        // Adds held back during the restore land now, in arrival order. The
        // queued tabs are already live; they just join the strip.
        let queued = std::mem::take(&mut partition.queued);
        for q in queued {
            let id = q.tab.id;
            let index = partition.insert_index(q.opener);
            partition.tabs.insert(index, q.tab);
            if q.select {
                partition.selected = Some(id);
                self.active_incognito = incognito;
            }
            log::info!("Created new tab {} (total: {})", id, partition.tabs.len());
            events.push(TabEvent::TabAdded {
                id,
                incognito,
                selected: q.select,
            });
        }

        debug_info!("tab", "Restored {} tab(s)", ids.len());
        for event in &events {
            self.observers.notify(event);
        }
        ids
    }

    /// Pop the most recently closed tab of the active partition and put it
    /// back at its original index, selected. None when the archive is empty
    /// or `max_tabs` refuses the add (the record is kept for a later retry).
    pub fn reopen_recently_closed(&mut self) -> Option<TabId> {
        let incognito = self.active_incognito;
        if self.config.max_tabs > 0 && self.total_count() >= self.config.max_tabs {
            log::warn!(
                "Cannot reopen closed tab: max_tabs limit ({}) reached",
                self.config.max_tabs
            );
            return None;
        }

        let factory = self.factory.as_ref();
        let partition = if incognito {
            &mut self.incognito
        } else {
            &mut self.normal
        };
        let record = partition.recently_closed.pop()?;
        let mut tab = Tab::from_saved(&record);
        tab.materialize(factory);
        let id = tab.id;
        let index = record.tab_index.min(partition.tabs.len());
        partition.tabs.insert(index, tab);
        partition.selected = Some(id);
        log::info!("Reopened tab {} at index {}", id, index);
        self.observers.notify(&TabEvent::TabAdded {
            id,
            incognito,
            selected: true,
        });
        Some(id)
    }

    // =========================================================================
    // Persistence hand-off
    // =========================================================================

    /// Snapshot the normal partition for persistence. Incognito tabs are
    /// never part of the snapshot.
    pub fn session_state(&self) -> SessionState {
        capture_partition(&self.normal.tabs, self.normal.selected)
    }

    /// Queue a background save of the normal partition. Safe to call
    /// redundantly; stale writes are dropped by the persister.
    pub fn preserve_tabs(&self, persister: &Persister) {
        persister.spawn_save(self.session_state());
    }

    /// Load the saved normal-partition session and restore it.
    ///
    /// Missing or empty files are a clean no-op; an unreadable file is
    /// logged and treated as empty. Either way the restore completes, so
    /// queued adds are never stranded.
    pub fn restore_from_disk(&mut self, store: &SessionStore) -> Vec<TabId> {
        let token = self.begin_restore(false);
        let records = match store.load(false) {
            Ok(Some(state)) => state.tabs,
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("Discarding unreadable session file: {}", e);
                Vec::new()
            }
        };
        let select = !records.is_empty();
        self.restore_saved_tabs(&token, records, select)
    }

    // =========================================================================
    // Surface plumbing
    // =========================================================================

    /// Fold queued engine callbacks into cached tab state. Returns how many
    /// events were handled. The host calls this from its main context, which
    /// is what keeps all tab mutation single-threaded.
    pub fn pump_surface_events(&mut self) -> usize {
        let Self {
            normal,
            incognito,
            ua_policy,
            ..
        } = self;
        let policy = ua_policy.as_ref();
        pump_partition(&mut normal.tabs, policy) + pump_partition(&mut incognito.tabs, policy)
    }

    /// Capture a fresh thumbnail for a tab and store it, replacing the old
    /// one. None when the tab is unknown, dormant, or the capture or store
    /// failed; a failed thumbnail never blocks anything else.
    pub fn capture_screenshot_for(
        &mut self,
        id: TabId,
        store: &ScreenshotStore,
    ) -> Option<Uuid> {
        let (partition, idx) = self.locate_mut(id)?;
        let tab = &mut partition.tabs[idx];
        let bytes = tab.capture_screenshot()?;
        let previous = tab.screenshot_id;
        match store.put(bytes) {
            Ok(shot) => {
                tab.screenshot_id = Some(shot);
                if let Some(old) = previous
                    && let Err(e) = store.remove(old)
                {
                    log::debug!("Failed to drop replaced screenshot {}: {}", old, e);
                }
                Some(shot)
            }
            Err(e) => {
                log::error!("Failed to store screenshot for tab {}: {}", id, e);
                None
            }
        }
    }

    /// Screenshot ids still referenced by a live tab, for pruning orphans.
    pub fn live_screenshot_ids(&self) -> HashSet<Uuid> {
        self.normal
            .tabs
            .iter()
            .chain(self.incognito.tabs.iter())
            .filter_map(|t| t.screenshot_id)
            .collect()
    }

    /// Flip a tab between mobile and desktop user agent, remember the choice
    /// for its host, and reload. Returns the new state, None for unknown ids.
    pub fn toggle_desktop_site(&mut self, id: TabId) -> Option<bool> {
        let Self {
            normal,
            incognito,
            ua_policy,
            ..
        } = self;
        let tab = normal
            .tabs
            .iter_mut()
            .chain(incognito.tabs.iter_mut())
            .find(|t| t.id == id)?;
        let desktop = !tab.desktop_site;
        tab.desktop_site = desktop;
        if let Some(host) = tab.host() {
            ua_policy.set_desktop_mode(host, desktop);
        }
        tab.reload();
        Some(desktop)
    }

    /// Navigate a tab. Returns false for unknown ids.
    pub fn load_url(&mut self, id: TabId, url: Url) -> bool {
        match self.locate_mut(id) {
            Some((partition, idx)) => {
                partition.tabs[idx].load(url);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All tabs of one partition, in strip order.
    pub fn tabs(&self, incognito: bool) -> &[Tab] {
        if incognito {
            &self.incognito.tabs
        } else {
            &self.normal.tabs
        }
    }

    /// The visible tab, if the active partition has a selection.
    pub fn selected_tab(&self) -> Option<&Tab> {
        let partition = self.active();
        partition
            .selected
            .and_then(|id| partition.tabs.iter().find(|t| t.id == id))
    }

    pub fn selected_tab_id(&self) -> Option<TabId> {
        self.active().selected
    }

    /// Selected tab of one partition, which need not be the active one.
    pub fn selected_in(&self, incognito: bool) -> Option<TabId> {
        if incognito {
            self.incognito.selected
        } else {
            self.normal.selected
        }
    }

    /// Look up a tab in either partition.
    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.normal
            .tabs
            .iter()
            .chain(self.incognito.tabs.iter())
            .find(|t| t.id == id)
    }

    /// Mutable tab access, for navigation calls on a specific tab.
    pub fn get_mut(&mut self, id: TabId) -> Option<&mut Tab> {
        self.normal
            .tabs
            .iter_mut()
            .chain(self.incognito.tabs.iter_mut())
            .find(|t| t.id == id)
    }

    /// Total number of visible tabs across both partitions.
    pub fn tab_count(&self) -> usize {
        self.normal.tabs.len() + self.incognito.tabs.len()
    }

    /// True when the incognito strip is frontmost.
    pub fn active_partition(&self) -> bool {
        self.active_incognito
    }

    /// Groups of the active partition, derived fresh from the strip.
    pub fn tab_groups(&self) -> Vec<TabGroup> {
        derive_groups(&self.active().tabs, true)
    }

    /// Recently closed records of one partition, most recent first.
    pub fn recently_closed(&self, incognito: bool) -> impl Iterator<Item = &SavedTab> {
        let partition = if incognito {
            &self.incognito
        } else {
            &self.normal
        };
        partition.recently_closed.iter()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Observers
    // =========================================================================

    pub fn add_observer<T: TabObserver + 'static>(&self, observer: &Arc<T>) -> ObserverId {
        self.observers.add(observer)
    }

    pub fn remove_observer(&self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn active(&self) -> &Partition {
        if self.active_incognito {
            &self.incognito
        } else {
            &self.normal
        }
    }

    /// Which partition holds this id, if any.
    fn partition_of(&self, id: TabId) -> Option<bool> {
        if self.normal.tabs.iter().any(|t| t.id == id) {
            Some(false)
        } else if self.incognito.tabs.iter().any(|t| t.id == id) {
            Some(true)
        } else {
            None
        }
    }

    fn locate_mut(&mut self, id: TabId) -> Option<(&mut Partition, usize)> {
        if let Some(idx) = self.normal.tabs.iter().position(|t| t.id == id) {
            return Some((&mut self.normal, idx));
        }
        if let Some(idx) = self.incognito.tabs.iter().position(|t| t.id == id) {
            return Some((&mut self.incognito, idx));
        }
        None
    }

    /// Attach an engine to the partition's selected tab if it is dormant.
    fn materialize_selection(&mut self, incognito: bool) {
        let factory = self.factory.as_ref();
        let partition = if incognito {
            &mut self.incognito
        } else {
            &mut self.normal
        };
        if let Some(sel) = partition.selected
            && let Some(tab) = partition.tabs.iter_mut().find(|t| t.id == sel)
        {
            tab.materialize(factory);
        }
    }

    /// Visible plus queued tabs, for the max_tabs check.
    fn total_count(&self) -> usize {
        self.normal.tabs.len()
            + self.normal.queued.len()
            + self.incognito.tabs.len()
            + self.incognito.queued.len()
    }
}

fn pump_partition(tabs: &mut [Tab], policy: &dyn UserAgentPolicy) -> usize {
    let mut handled = 0;
    for tab in tabs.iter_mut() {
        let events = tab.drain_surface_events();
        if events.is_empty() {
            continue;
        }
        for event in events {
            tab.handle_surface_event(event);
            handled += 1;
        }
        // Navigation may have changed the host; the policy decides the agent.
        let desktop = tab.host().map(|host| policy.desktop_mode(host));
        if let Some(desktop) = desktop {
            tab.desktop_site = desktop;
        }
    }
    handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use skiff_surface::{HeadlessFactory, MemoryUserAgentPolicy};

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn test_manager() -> TabManager {
        TabManager::new(
            Config::default(),
            Box::new(HeadlessFactory),
            Box::new(MemoryUserAgentPolicy::new()),
        )
    }

    fn manager_with_config(config: Config) -> TabManager {
        TabManager::new(
            config,
            Box::new(HeadlessFactory),
            Box::new(MemoryUserAgentPolicy::new()),
        )
    }

    fn add(mgr: &mut TabManager, url_str: &str, incognito: bool, select: bool) -> TabId {
        let id = mgr
            .add_tab(AddTabRequest {
                url: Some(url(url_str)),
                incognito,
                select,
                ..Default::default()
            })
            .unwrap();
        mgr.pump_surface_events();
        id
    }

    fn add_child(mgr: &mut TabManager, url_str: &str, opener: TabId, select: bool) -> TabId {
        let id = mgr
            .add_tab(AddTabRequest {
                url: Some(url(url_str)),
                opener: Some(opener),
                select,
                ..Default::default()
            })
            .unwrap();
        mgr.pump_surface_events();
        id
    }

    fn ids(mgr: &TabManager, incognito: bool) -> Vec<TabId> {
        mgr.tabs(incognito).iter().map(|t| t.id).collect()
    }

    /// Buffers every received event for later assertion.
    struct RecordingObserver {
        events: Mutex<Vec<TabEvent>>,
    }

    impl RecordingObserver {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
            })
        }

        fn drain(&self) -> Vec<TabEvent> {
            std::mem::take(&mut *self.events.lock())
        }
    }

    impl TabObserver for RecordingObserver {
        fn on_tab_event(&self, event: &TabEvent) {
            self.events.lock().push(event.clone());
        }
    }

    fn saved(url_str: &str, tab_index: usize, selected: bool) -> SavedTab {
        let id = Uuid::new_v4();
        SavedTab {
            id,
            root_id: id,
            parent_id: None,
            space_id: None,
            incognito: false,
            title: String::new(),
            favicon_url: None,
            history: vec![url(url_str)],
            current_index: 0,
            selected,
            tab_index,
        }
    }

    #[test]
    fn add_tab_selects_and_orders() {
        let mut mgr = test_manager();
        let a = add(&mut mgr, "https://a.example/", false, true);
        let b = add(&mut mgr, "https://b.example/", false, true);
        let c = add(&mut mgr, "https://c.example/", false, false);

        assert_eq!(ids(&mgr, false), vec![a, b, c]);
        assert_eq!(mgr.selected_tab_id(), Some(b), "unselected add keeps selection");
    }

    #[test]
    fn opener_child_sits_adjacent_and_inherits_root() {
        let mut mgr = test_manager();
        let a = add(&mut mgr, "https://a.example/", false, true);
        let b = add(&mut mgr, "https://b.example/", false, false);
        let child = add_child(&mut mgr, "https://a.example/sub", a, false);

        assert_eq!(ids(&mgr, false), vec![a, child, b]);
        let child_tab = mgr.get(child).unwrap();
        assert_eq!(child_tab.root_id, a);
        assert_eq!(child_tab.parent_id, Some(a));

        let grandchild = add_child(&mut mgr, "https://a.example/sub2", child, false);
        assert_eq!(
            mgr.get(grandchild).unwrap().root_id,
            a,
            "root propagates through generations"
        );
    }

    #[test]
    fn vanished_opener_degrades_to_fresh_root() {
        let mut mgr = test_manager();
        let ghost = Uuid::new_v4();
        let id = mgr
            .add_tab(AddTabRequest {
                url: Some(url("https://a.example/")),
                opener: Some(ghost),
                select: true,
                ..Default::default()
            })
            .unwrap();
        let tab = mgr.get(id).unwrap();
        assert_eq!(tab.root_id, id);
        assert_eq!(tab.parent_id, Some(ghost), "lineage is kept even when stale");
    }

    #[test]
    fn max_tabs_refuses_add() {
        let mut config = Config::default();
        config.max_tabs = 2;
        let mut mgr = manager_with_config(config);

        add(&mut mgr, "https://a.example/", false, true);
        add(&mut mgr, "https://b.example/", false, true);
        let refused = mgr.add_tab(AddTabRequest {
            url: Some(url("https://c.example/")),
            ..Default::default()
        });
        assert!(refused.is_none());
        assert_eq!(mgr.tab_count(), 2);
    }

    #[test]
    fn partitions_are_disjoint() {
        let mut mgr = test_manager();
        let a = add(&mut mgr, "https://a.example/", false, true);
        let p = add(&mut mgr, "https://p.example/", true, true);

        assert_eq!(ids(&mgr, false), vec![a]);
        assert_eq!(ids(&mgr, true), vec![p]);
        assert!(mgr.active_partition());
        assert_eq!(mgr.selected_tab_id(), Some(p));

        mgr.select_tab(a);
        assert!(!mgr.active_partition());
        assert_eq!(mgr.selected_tab_id(), Some(a));
    }

    #[test]
    fn remove_selected_prefers_parent() {
        let mut mgr = test_manager();
        let parent = add(&mut mgr, "https://a.example/", false, true);
        add(&mut mgr, "https://b.example/", false, false);
        let child = add_child(&mut mgr, "https://a.example/sub", parent, true);

        mgr.remove_tab(child);
        assert_eq!(mgr.selected_tab_id(), Some(parent));
    }

    #[test]
    fn remove_selected_falls_to_right_then_left() {
        let mut config = Config::default();
        config.select_parent_on_close = false;
        let mut mgr = manager_with_config(config);
        let a = add(&mut mgr, "https://a.example/", false, false);
        let b = add(&mut mgr, "https://b.example/", false, false);
        let c = add(&mut mgr, "https://c.example/", false, false);
        mgr.select_tab(b);

        mgr.remove_tab(b);
        assert_eq!(mgr.selected_tab_id(), Some(c), "right neighbor first");

        mgr.remove_tab(c);
        assert_eq!(mgr.selected_tab_id(), Some(a), "left neighbor at the end");

        mgr.remove_tab(a);
        assert_eq!(mgr.selected_tab_id(), None);
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let mut mgr = test_manager();
        let a = add(&mut mgr, "https://a.example/", false, true);
        mgr.remove_tab(Uuid::new_v4());
        assert_eq!(ids(&mgr, false), vec![a]);
        assert_eq!(mgr.selected_tab_id(), Some(a));
    }

    #[test]
    fn removed_tab_is_archived_with_its_index() {
        let mut mgr = test_manager();
        add(&mut mgr, "https://a.example/", false, true);
        let b = add(&mut mgr, "https://b.example/", false, true);

        mgr.remove_tab(b);
        let records: Vec<&SavedTab> = mgr.recently_closed(false).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, b);
        assert_eq!(records[0].tab_index, 1);
    }

    #[test]
    fn batch_remove_emits_one_aggregate_event() {
        let mut mgr = test_manager();
        let observer = RecordingObserver::new();
        mgr.add_observer(&observer);

        let a = add(&mut mgr, "https://a.example/", false, false);
        let b = add(&mut mgr, "https://b.example/", false, false);
        let c = add(&mut mgr, "https://c.example/", false, false);
        mgr.select_tab(a);
        observer.drain();

        mgr.remove_tabs(&[a, b]);
        let events = observer.drain();
        assert_eq!(events.len(), 1, "batched close must not fan out per tab");
        match &events[0] {
            TabEvent::TabsRemoved {
                ids,
                incognito,
                new_selection,
            } => {
                assert_eq!(ids, &vec![a, b]);
                assert!(!incognito);
                assert_eq!(*new_selection, Some(c));
            }
            other => panic!("expected TabsRemoved, got {:?}", other),
        }
        assert_eq!(mgr.selected_tab_id(), Some(c));
    }

    #[test]
    fn remove_tabs_matching_wipes_by_host() {
        let mut mgr = test_manager();
        let a = add(&mut mgr, "https://app.example/login", false, true);
        let b = add(&mut mgr, "https://other.example/", false, false);
        let c = add(&mut mgr, "https://app.example/settings", false, false);

        let removed = mgr.remove_tabs_matching(false, |tab| {
            tab.host().is_some_and(|h| h == "app.example")
        });
        assert_eq!(removed, vec![a, c]);
        assert_eq!(ids(&mgr, false), vec![b]);
        assert_eq!(mgr.selected_tab_id(), Some(b));
    }

    #[test]
    fn close_all_incognito_drops_archive_and_returns_to_normal() {
        let mut mgr = test_manager();
        let observer = RecordingObserver::new();
        mgr.add_observer(&observer);

        let a = add(&mut mgr, "https://a.example/", false, true);
        let _p = add(&mut mgr, "https://p.example/", true, true);
        let q = add(&mut mgr, "https://q.example/", true, false);
        mgr.remove_tab(q);
        assert_eq!(mgr.recently_closed(true).count(), 1);
        observer.drain();

        mgr.close_all_tabs(true);
        assert!(ids(&mgr, true).is_empty());
        assert_eq!(
            mgr.recently_closed(true).count(),
            0,
            "incognito archive dies with the partition"
        );
        assert!(!mgr.active_partition());
        assert_eq!(mgr.selected_tab_id(), Some(a));
        assert_eq!(
            observer.drain(),
            vec![TabEvent::AllTabsRemoved { was_incognito: true }]
        );
    }

    #[test]
    fn close_all_on_empty_partition_is_noop() {
        let mut mgr = test_manager();
        let observer = RecordingObserver::new();
        mgr.add_observer(&observer);
        mgr.close_all_tabs(true);
        assert!(observer.drain().is_empty());
    }

    #[test]
    fn recently_closed_is_bounded() {
        let mut config = Config::default();
        config.recently_closed_capacity = 2;
        let mut mgr = manager_with_config(config);

        let a = add(&mut mgr, "https://a.example/", false, true);
        let b = add(&mut mgr, "https://b.example/", false, true);
        let c = add(&mut mgr, "https://c.example/", false, true);
        mgr.remove_tab(a);
        mgr.remove_tab(b);
        mgr.remove_tab(c);

        let archived: Vec<TabId> = mgr.recently_closed(false).map(|r| r.id).collect();
        assert_eq!(archived, vec![c, b], "most recent first, oldest evicted");
    }

    #[test]
    fn select_tab_materializes_dormant() {
        let mut mgr = test_manager();
        let token = mgr.begin_restore(false);
        let restored = mgr.restore_saved_tabs(
            &token,
            vec![saved("https://a.example/", 0, false), saved("https://b.example/", 1, false)],
            false,
        );
        assert!(mgr.tabs(false).iter().all(|t| t.is_dormant()));

        mgr.select_tab(restored[1]);
        let tab = mgr.get(restored[1]).unwrap();
        assert!(!tab.is_dormant());
        assert!(mgr.get(restored[0]).unwrap().is_dormant());
    }

    #[test]
    fn select_next_and_previous_wrap_within_partition() {
        let mut mgr = test_manager();
        let a = add(&mut mgr, "https://a.example/", false, true);
        let b = add(&mut mgr, "https://b.example/", false, false);
        add(&mut mgr, "https://p.example/", true, false);
        mgr.select_tab(a);

        mgr.select_next();
        assert_eq!(mgr.selected_tab_id(), Some(b));
        mgr.select_next();
        assert_eq!(mgr.selected_tab_id(), Some(a), "wraps without leaving the partition");
        mgr.select_previous();
        assert_eq!(mgr.selected_tab_id(), Some(b));
    }

    #[test]
    fn move_tab_clamps_and_reorders() {
        let mut mgr = test_manager();
        let a = add(&mut mgr, "https://a.example/", false, true);
        let b = add(&mut mgr, "https://b.example/", false, false);
        let c = add(&mut mgr, "https://c.example/", false, false);

        assert!(mgr.move_tab(a, 100));
        assert_eq!(ids(&mgr, false), vec![b, c, a]);
        assert!(!mgr.move_tab(a, 2), "already at target");
        assert!(!mgr.move_tab(Uuid::new_v4(), 0));
        assert_eq!(mgr.selected_tab_id(), Some(a), "reorder keeps selection");
    }

    #[test]
    fn add_during_restore_is_queued_until_completion() {
        let mut mgr = test_manager();
        let observer = RecordingObserver::new();
        mgr.add_observer(&observer);

        let token = mgr.begin_restore(false);
        let queued = mgr
            .add_tab(AddTabRequest {
                url: Some(url("https://new.example/")),
                select: true,
                ..Default::default()
            })
            .unwrap();
        assert!(ids(&mgr, false).is_empty(), "queued add must not land early");
        assert!(observer.drain().is_empty());

        let restored = mgr.restore_saved_tabs(
            &token,
            vec![saved("https://a.example/", 0, true)],
            true,
        );
        let strip = ids(&mgr, false);
        assert_eq!(strip, vec![restored[0], queued]);
        assert_eq!(mgr.selected_tab_id(), Some(queued), "user's add wins selection");

        let events = observer.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], TabEvent::TabsRestored { ids, .. } if ids == &restored));
        assert!(matches!(&events[1], TabEvent::TabAdded { id, .. } if *id == queued));
    }

    #[test]
    fn stale_restore_token_is_discarded() {
        let mut mgr = test_manager();
        let first = mgr.begin_restore(false);
        let second = mgr.begin_restore(false);

        let ignored = mgr.restore_saved_tabs(&first, vec![saved("https://old.example/", 0, false)], false);
        assert!(ignored.is_empty());
        assert!(ids(&mgr, false).is_empty());

        let applied = mgr.restore_saved_tabs(&second, vec![saved("https://new.example/", 0, false)], false);
        assert_eq!(applied.len(), 1);
        assert_eq!(ids(&mgr, false), applied);
    }

    #[test]
    fn restore_is_idempotent_per_id() {
        let mut mgr = test_manager();
        let records = vec![saved("https://a.example/", 0, true), saved("https://b.example/", 1, false)];

        let token = mgr.begin_restore(false);
        let first = mgr.restore_saved_tabs(&token, records.clone(), true);
        assert_eq!(first.len(), 2);

        let again = mgr.restore_saved_tabs(&token, records, true);
        assert!(again.is_empty(), "same ids must not restore twice");
        assert_eq!(mgr.tab_count(), 2);
    }

    #[test]
    fn reopen_recently_closed_restores_at_original_index() {
        let mut mgr = test_manager();
        let a = add(&mut mgr, "https://a.example/", false, true);
        let b = add(&mut mgr, "https://b.example/", false, false);
        let c = add(&mut mgr, "https://c.example/", false, false);
        mgr.remove_tab(b);
        assert_eq!(ids(&mgr, false), vec![a, c]);

        let reopened = mgr.reopen_recently_closed().unwrap();
        let strip = ids(&mgr, false);
        assert_eq!(strip[1], reopened, "back at its old slot");
        assert_eq!(mgr.selected_tab_id(), Some(reopened));
        let tab = mgr.get(reopened).unwrap();
        assert_eq!(tab.id, b);
        assert!(!tab.is_dormant());
        assert!(mgr.reopen_recently_closed().is_none(), "archive drained");
    }

    #[test]
    fn pump_folds_surface_state_into_tabs() {
        let mut mgr = test_manager();
        let a = mgr
            .add_tab(AddTabRequest {
                url: Some(url("https://a.example/page")),
                select: true,
                ..Default::default()
            })
            .unwrap();
        assert!(mgr.get(a).unwrap().url.is_none(), "state waits for the pump");

        let handled = mgr.pump_surface_events();
        assert!(handled > 0);
        let tab = mgr.get(a).unwrap();
        assert_eq!(tab.url.as_ref().map(|u| u.as_str()), Some("https://a.example/page"));
        assert!(tab.security.secure);
        assert!(!tab.title.is_empty());
    }

    #[test]
    fn toggle_desktop_site_sticks_for_host() {
        let mut mgr = test_manager();
        let a = add(&mut mgr, "https://a.example/", false, true);
        assert_eq!(mgr.toggle_desktop_site(a), Some(true));

        // A later tab on the same host starts in desktop mode.
        let b = add(&mut mgr, "https://a.example/other", false, false);
        assert!(mgr.get(b).unwrap().desktop_site);

        // And a navigation elsewhere drops back to mobile after the pump.
        mgr.load_url(a, url("https://other.example/"));
        mgr.pump_surface_events();
        assert!(!mgr.get(a).unwrap().desktop_site);
    }

    #[test]
    fn session_state_skips_incognito() {
        let mut mgr = test_manager();
        add(&mut mgr, "https://a.example/", false, true);
        add(&mut mgr, "https://p.example/", true, false);

        let state = mgr.session_state();
        assert_eq!(state.tabs.len(), 1);
        assert!(!state.tabs[0].incognito);
    }
}

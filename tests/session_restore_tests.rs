//! Session capture, persistence, and restore integration tests.
//!
//! Exercises the full round trip: live strip -> `SessionState` -> JSON on
//! disk -> fresh manager ("process restart") -> dormant tabs, plus the
//! recovery paths for malformed records, corrupt files, and superseded
//! restores.

mod common;

use common::{open, open_from, saved_tab, strip_ids, test_manager, url};
use skiff::session::{Persister, SessionStore};
use tempfile::tempdir;

#[test]
fn session_survives_a_process_restart() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path().to_path_buf());

    let mut first = test_manager();
    let a = open(&mut first, "https://a.example/", false, true);
    let b = open_from(&mut first, "https://a.example/article", a, false);
    // Give tab A some depth so current_index is meaningful.
    first.load_url(a, url("https://a.example/second"));
    first.pump_surface_events();
    first.select_tab(b);

    store.save(&first.session_state(), false).unwrap();
    drop(first);

    let mut second = test_manager();
    let restored = second.restore_from_disk(&store);
    assert_eq!(restored, vec![a, b], "ids survive the restart");
    assert_eq!(strip_ids(&second, false), vec![a, b]);
    assert_eq!(second.selected_tab_id(), Some(b));

    let tab_a = second.get(a).unwrap();
    assert_eq!(
        tab_a.url.as_ref().map(|u| u.as_str()),
        Some("https://a.example/second"),
        "restored tab shows its committed entry"
    );
    assert_eq!(tab_a.root_id, a);
    let tab_b = second.get(b).unwrap();
    assert_eq!(tab_b.root_id, a, "lineage survives the restart");
    assert_eq!(tab_b.parent_id, Some(a));
    assert!(tab_a.is_dormant(), "unselected restored tab stays dormant");
    assert!(!tab_b.is_dormant(), "selected restored tab is materialized");
}

#[test]
fn restored_tab_keeps_back_forward_depth() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path().to_path_buf());

    let mut first = test_manager();
    let a = open(&mut first, "https://a.example/one", false, true);
    first.load_url(a, url("https://a.example/two"));
    first.pump_surface_events();
    first.get_mut(a).unwrap().go_back();
    first.pump_surface_events();
    store.save(&first.session_state(), false).unwrap();

    let mut second = test_manager();
    second.restore_from_disk(&store);
    // Selecting the tab materializes it; the surface adopts the saved list.
    second.select_tab(a);
    let history = second.get(a).unwrap().session_snapshot().unwrap();
    assert_eq!(history.entries.len(), 2);
    assert_eq!(history.current_index, 0, "back position survives");
    assert_eq!(
        history.current().map(|u| u.as_str()),
        Some("https://a.example/one")
    );
}

#[test]
fn restoring_the_same_session_twice_does_not_duplicate_tabs() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path().to_path_buf());

    let mut first = test_manager();
    open(&mut first, "https://a.example/", false, true);
    open(&mut first, "https://b.example/", false, false);
    store.save(&first.session_state(), false).unwrap();

    let mut second = test_manager();
    let once = second.restore_from_disk(&store);
    assert_eq!(once.len(), 2);

    let again = second.restore_from_disk(&store);
    assert!(again.is_empty(), "replayed snapshot must not restore again");
    assert_eq!(second.tab_count(), 2);
}

#[test]
fn malformed_records_are_dropped_without_aborting_the_batch() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path().to_path_buf());

    let good = saved_tab("https://good.example/", 0, true);
    let mut empty_history = saved_tab("https://dead.example/", 1, false);
    empty_history.history.clear();
    let mut bad_index = saved_tab("https://skew.example/", 2, false);
    bad_index.current_index = 5;
    let also_good = saved_tab("https://also.example/", 3, false);

    let state = skiff::session::SessionState {
        saved_at: chrono::Utc::now().to_rfc3339(),
        tabs: vec![good.clone(), empty_history, bad_index, also_good.clone()],
    };
    store.save(&state, false).unwrap();

    let mut mgr = test_manager();
    let restored = mgr.restore_from_disk(&store);
    assert_eq!(restored, vec![good.id, also_good.id]);
    assert_eq!(mgr.selected_tab_id(), Some(good.id));
}

#[test]
fn corrupt_session_file_recovers_as_empty() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path().to_path_buf());
    std::fs::write(store.path_for(false), "{definitely not json").unwrap();

    let mut mgr = test_manager();
    let restored = mgr.restore_from_disk(&store);
    assert!(restored.is_empty());

    // The manager is fully usable afterwards: the restore completed, so
    // interactive adds are not stuck in the queue.
    let a = open(&mut mgr, "https://a.example/", false, true);
    assert_eq!(strip_ids(&mgr, false), vec![a]);
}

#[test]
fn missing_session_file_is_a_clean_first_run() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("never-written"));

    let mut mgr = test_manager();
    assert!(mgr.restore_from_disk(&store).is_empty());
    assert_eq!(mgr.tab_count(), 0);
}

#[test]
fn newer_restore_supersedes_an_older_in_flight_one() {
    let mut mgr = test_manager();

    // Scene reconnects twice in quick succession; the first restore is still
    // "in flight" when the second begins.
    let stale = mgr.begin_restore(false);
    let fresh = mgr.begin_restore(false);

    let from_stale = mgr.restore_saved_tabs(
        &stale,
        vec![saved_tab("https://old.example/", 0, false)],
        false,
    );
    assert!(from_stale.is_empty(), "superseded results are discarded, not merged");

    let from_fresh = mgr.restore_saved_tabs(
        &fresh,
        vec![saved_tab("https://new.example/", 0, true)],
        true,
    );
    assert_eq!(from_fresh.len(), 1);
    assert_eq!(strip_ids(&mgr, false), from_fresh);
    assert_eq!(
        mgr.selected_tab().unwrap().url.as_ref().map(|u| u.as_str()),
        Some("https://new.example/")
    );
}

#[test]
fn incognito_tabs_never_reach_the_session_file() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path().to_path_buf());

    let mut mgr = test_manager();
    open(&mut mgr, "https://public.example/", false, true);
    open(&mut mgr, "https://secret.example/", true, true);

    store.save(&mgr.session_state(), false).unwrap();

    let raw = std::fs::read_to_string(store.path_for(false)).unwrap();
    assert!(raw.contains("public.example"));
    assert!(
        !raw.contains("secret.example"),
        "incognito state must not be written to disk"
    );
    assert!(!store.path_for(true).exists());
}

#[test]
fn preserve_tabs_flushes_through_the_persister() {
    let dir = tempdir().unwrap();
    let store = SessionStore::new(dir.path().to_path_buf());
    let rt = tokio::runtime::Runtime::new().unwrap();
    let persister = Persister::new(store.clone(), rt.handle().clone());

    let mut mgr = test_manager();
    open(&mut mgr, "https://a.example/", false, true);

    // Redundant calls are the normal pattern (every background event).
    mgr.preserve_tabs(&persister);
    mgr.preserve_tabs(&persister);
    persister.save_now(&mgr.session_state());

    let state = store.load(false).unwrap().unwrap();
    assert_eq!(state.tabs.len(), 1);
    assert!(chrono::DateTime::parse_from_rfc3339(&state.saved_at).is_ok());
}

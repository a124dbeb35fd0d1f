//! Default values for skiff configuration fields.

pub fn max_tabs() -> usize {
    0 // 0 = unlimited
}

pub fn select_parent_on_close() -> bool {
    true
}

pub fn recently_closed_capacity() -> usize {
    25
}

pub fn session_autosave_secs() -> u64 {
    30
}

pub fn screenshot_cache_entries() -> usize {
    32
}

pub fn new_tab_url() -> Option<String> {
    None // None = blank new-tab page
}

pub fn app_host() -> String {
    "skiff.app".to_string()
}

pub fn search_url_template() -> String {
    "https://duckduckgo.com/?q={query}".to_string()
}

pub fn data_dir() -> Option<String> {
    None // None = platform data directory
}

//! Applies parsed navigation intents to the tab manager.

use super::NavigationPath;
use crate::tab::{AddTabRequest, TabManager};
use skiff_config::Config;
use url::Url;

pub struct Router;

impl Router {
    /// Apply one intent. Side-effecting, no return value; anything that
    /// cannot be applied as parsed degrades to opening the URL we have.
    pub fn handle(path: NavigationPath, manager: &mut TabManager) {
        match path {
            NavigationPath::Url { url, incognito } => {
                Self::navigate(manager, url, incognito);
            }
            NavigationPath::OpenInNewTab { url, incognito } => {
                manager.add_tab(AddTabRequest {
                    url: Some(url),
                    incognito,
                    select: true,
                    ..Default::default()
                });
            }
            NavigationPath::Space { space_id } => {
                let url = space_url(manager.config(), &space_id);
                manager.add_tab(AddTabRequest {
                    url,
                    space_id: Some(space_id),
                    select: true,
                    ..Default::default()
                });
            }
            NavigationPath::Search { query } => {
                let incognito = manager.active_partition();
                match search_url(manager.config(), &query) {
                    Some(url) => Self::navigate(manager, url, incognito),
                    None => log::warn!("Search URL template produced nothing for {:?}", query),
                }
            }
        }
    }

    /// Load a URL in the partition's current tab, creating one when the
    /// partition has no selection, and bring it to the front.
    fn navigate(manager: &mut TabManager, url: Url, incognito: bool) {
        if let Some(id) = manager.selected_in(incognito) {
            manager.load_url(id, url);
            manager.select_tab(id);
        } else {
            manager.add_tab(AddTabRequest {
                url: Some(url),
                incognito,
                select: true,
                ..Default::default()
            });
        }
    }
}

fn space_url(config: &Config, space_id: &str) -> Option<Url> {
    let raw = format!("https://{}/space/{}", config.app_host, space_id);
    match Url::parse(&raw) {
        Ok(url) => Some(url),
        Err(e) => {
            log::warn!("Space id {:?} does not form a URL: {}", space_id, e);
            None
        }
    }
}

fn search_url(config: &Config, query: &str) -> Option<Url> {
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    let raw = config.search_url_template.replace("{query}", &encoded);
    Url::parse(&raw).ok()
}

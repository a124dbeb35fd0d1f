//! Interactive driver for the tab/session core.
//!
//! Runs the whole stack (config, manager, router, persistence, screenshots)
//! against the headless surface so lifecycle behavior can be exercised from a
//! terminal or a script file. Type `help` at the prompt for the command list.

use anyhow::Result;
use clap::Parser;
use skiff::routing::{NavigationPath, Router};
use skiff::screenshot::ScreenshotStore;
use skiff::session::{Persister, SessionStore};
use skiff::tab::{AddTabRequest, TabEvent, TabId, TabManager, TabObserver};
use skiff_config::Config;
use skiff_surface::{HeadlessFactory, MemoryUserAgentPolicy};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// skiff-session-harness - drive the tab core from a terminal
#[derive(Parser)]
#[command(name = "skiff-session-harness")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Read commands from a file instead of stdin
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Override the data directory for session and screenshot files
    #[arg(long, value_name = "DIR")]
    data_dir: Option<String>,

    /// Skip restoring the saved session at startup
    #[arg(long)]
    no_restore: bool,

    /// Set debug log level (overrides RUST_LOG)
    #[arg(long, value_enum, value_name = "LEVEL")]
    log_level: Option<LogLevelArg>,
}

/// Log level argument for CLI
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevelArg::Off => log::LevelFilter::Off,
            LogLevelArg::Error => log::LevelFilter::Error,
            LogLevelArg::Warn => log::LevelFilter::Warn,
            LogLevelArg::Info => log::LevelFilter::Info,
            LogLevelArg::Debug => log::LevelFilter::Debug,
            LogLevelArg::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Prints every tab event as it is delivered.
struct EventPrinter;

impl TabObserver for EventPrinter {
    fn on_tab_event(&self, event: &TabEvent) {
        println!("  [event] {event:?}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    skiff::debug::init_log_bridge(cli.log_level.map(|l| l.to_level_filter()));

    log::info!("Starting skiff session harness");

    let mut config = Config::load().unwrap_or_else(|e| {
        log::error!("Failed to load config, using defaults: {e:#}");
        Config::default()
    });
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    let store = SessionStore::new(config.data_dir());
    let screenshots = ScreenshotStore::new(config.screenshot_dir(), config.screenshot_cache_entries);
    let persister = Persister::new(store.clone(), tokio::runtime::Handle::current());
    let autosave_secs = config.session_autosave_secs;

    let mut manager = TabManager::new(
        config,
        Box::new(HeadlessFactory),
        Box::new(MemoryUserAgentPolicy::new()),
    );
    let printer = Arc::new(EventPrinter);
    manager.add_observer(&printer);

    if !cli.no_restore {
        let restored = manager.restore_from_disk(&store);
        if !restored.is_empty() {
            println!("restored {} tab(s) from previous session", restored.len());
        }
        if let Err(e) = screenshots.prune(&manager.live_screenshot_ids()) {
            log::warn!("Screenshot prune failed: {e}");
        }
    }

    let input: Box<dyn BufRead> = match cli.script {
        Some(path) => Box::new(std::io::BufReader::new(std::fs::File::open(path)?)),
        None => {
            println!("skiff session harness (type 'help' for commands)");
            Box::new(std::io::BufReader::new(std::io::stdin()))
        }
    };

    let mut last_route: Option<NavigationPath> = None;
    let mut last_save = Instant::now();

    print_prompt(&manager);
    for line in input.lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            print_prompt(&manager);
            continue;
        };
        let args: Vec<&str> = parts.collect();

        match command {
            "open" => cmd_open(&mut manager, &args),
            "close" => cmd_close(&mut manager, &args),
            "closeall" => {
                let incognito = args.first().is_some_and(|a| *a == "incognito");
                manager.close_all_tabs(incognito);
            }
            "select" => {
                if let Some(id) = resolve_id(&manager, args.first().copied()) {
                    manager.select_tab(id);
                }
            }
            "next" => manager.select_next(),
            "prev" => manager.select_previous(),
            "move" => cmd_move(&mut manager, &args),
            "list" => print_tabs(&manager),
            "groups" => print_groups(&manager),
            "closed" => print_closed(&manager),
            "reopen" => {
                if manager.reopen_recently_closed().is_none() {
                    println!("nothing to reopen");
                }
            }
            "back" | "forward" | "reloadtab" | "stoptab" => {
                cmd_navigate(&mut manager, command);
            }
            "desktop" => {
                if let Some(id) = resolve_id(&manager, args.first().copied()) {
                    match manager.toggle_desktop_site(id) {
                        Some(state) => println!("desktop mode: {state}"),
                        None => println!("unknown tab"),
                    }
                }
            }
            "shot" => cmd_shot(&mut manager, &screenshots, &args),
            "save" => {
                manager.preserve_tabs(&persister);
                println!("save queued");
            }
            "restore" => {
                let restored = manager.restore_from_disk(&store);
                println!("restored {} tab(s)", restored.len());
            }
            "route" => cmd_route(&mut manager, &mut last_route, &line),
            "help" => print_help(),
            "quit" | "exit" => break,
            other => println!("unknown command {other:?} (try 'help')"),
        }

        let handled = manager.pump_surface_events();
        if handled > 0 {
            log::debug!("Pumped {handled} surface event(s)");
        }

        if autosave_secs > 0 && last_save.elapsed().as_secs() >= autosave_secs {
            manager.preserve_tabs(&persister);
            last_save = Instant::now();
        }

        print_prompt(&manager);
    }

    // Final synchronous flush so a quit right after a mutation is not lost.
    persister.save_now(&manager.session_state());
    log::info!("Harness exiting");
    Ok(())
}

fn cmd_open(manager: &mut TabManager, args: &[&str]) {
    let incognito = args.contains(&"incognito");
    let raw = args.iter().find(|a| **a != "incognito").copied();
    let url = match raw {
        Some(raw) => match parse_navigable(raw) {
            Some(url) => Some(url),
            None => {
                println!("not a URL: {raw:?}");
                return;
            }
        },
        None => manager
            .config()
            .new_tab_url
            .as_ref()
            .and_then(|raw| Url::parse(raw).ok()),
    };
    let opener = manager.selected_tab_id().filter(|_| !incognito);
    manager.add_tab(AddTabRequest {
        url,
        incognito,
        opener,
        select: true,
        ..Default::default()
    });
}

fn cmd_close(manager: &mut TabManager, args: &[&str]) {
    let target = match args.first() {
        Some(prefix) => resolve_id(manager, Some(prefix)),
        None => manager.selected_tab_id(),
    };
    match target {
        Some(id) => manager.remove_tab(id),
        None => println!("no tab to close"),
    }
}

fn cmd_move(manager: &mut TabManager, args: &[&str]) {
    let (Some(prefix), Some(index)) = (args.first(), args.get(1)) else {
        println!("usage: move <id-prefix> <index>");
        return;
    };
    let Ok(index) = index.parse::<usize>() else {
        println!("bad index {index:?}");
        return;
    };
    if let Some(id) = resolve_id(manager, Some(prefix)) {
        manager.move_tab(id, index);
    }
}

fn cmd_navigate(manager: &mut TabManager, command: &str) {
    let Some(id) = manager.selected_tab_id() else {
        println!("no selected tab");
        return;
    };
    if let Some(tab) = manager.get_mut(id) {
        match command {
            "back" => tab.go_back(),
            "forward" => tab.go_forward(),
            "reloadtab" => tab.reload(),
            _ => tab.stop(),
        }
    }
}

fn cmd_shot(manager: &mut TabManager, screenshots: &ScreenshotStore, args: &[&str]) {
    let target = match args.first() {
        Some(prefix) => resolve_id(manager, Some(prefix)),
        None => manager.selected_tab_id(),
    };
    let Some(id) = target else {
        println!("no tab to capture");
        return;
    };
    match manager.capture_screenshot_for(id, screenshots) {
        Some(shot) => println!("captured screenshot {}", short(shot)),
        None => println!("capture failed (dormant tab?)"),
    }
}

fn cmd_route(manager: &mut TabManager, last_route: &mut Option<NavigationPath>, line: &str) {
    let Some(raw) = line.split_whitespace().nth(1) else {
        println!("usage: route <url>");
        return;
    };
    match NavigationPath::parse(raw, manager.config()) {
        Some(path) => {
            // The same intent often arrives twice (cold launch + OS open).
            if last_route.as_ref() == Some(&path) {
                println!("duplicate intent, ignored");
                return;
            }
            println!("routing {path:?}");
            *last_route = Some(path.clone());
            Router::handle(path, manager);
        }
        None => match parse_navigable(raw) {
            Some(url) => {
                println!("no intent matched, opening as plain URL");
                Router::handle(
                    NavigationPath::Url {
                        url,
                        incognito: manager.active_partition(),
                    },
                    manager,
                );
            }
            None => println!("not a URL: {raw:?}"),
        },
    }
}

/// Accept scheme-less input the way a URL bar does.
fn parse_navigable(raw: &str) -> Option<Url> {
    Url::parse(raw)
        .ok()
        .or_else(|| Url::parse(&format!("https://{raw}")).ok())
        .filter(|u| u.host_str().is_some())
}

fn resolve_id(manager: &TabManager, prefix: Option<&str>) -> Option<TabId> {
    let prefix = match prefix {
        Some(p) => p,
        None => {
            println!("usage: <command> <id-prefix>");
            return None;
        }
    };
    let matches: Vec<TabId> = manager
        .tabs(false)
        .iter()
        .chain(manager.tabs(true).iter())
        .map(|t| t.id)
        .filter(|id| id.to_string().starts_with(prefix))
        .collect();
    match matches.as_slice() {
        [id] => Some(*id),
        [] => {
            println!("no tab matches {prefix:?}");
            None
        }
        _ => {
            println!("ambiguous prefix {prefix:?} ({} matches)", matches.len());
            None
        }
    }
}

fn short(id: TabId) -> String {
    id.to_string()[..8].to_string()
}

fn print_prompt(manager: &TabManager) {
    let partition = if manager.active_partition() {
        "incognito"
    } else {
        "normal"
    };
    print!("[{partition} {} tabs]> ", manager.tab_count());
    let _ = std::io::stdout().flush();
}

fn print_tabs(manager: &TabManager) {
    for incognito in [false, true] {
        let tabs = manager.tabs(incognito);
        if tabs.is_empty() {
            continue;
        }
        println!("{}:", if incognito { "incognito" } else { "normal" });
        let selected = manager.selected_in(incognito);
        for (idx, tab) in tabs.iter().enumerate() {
            let marker = if selected == Some(tab.id) { '*' } else { ' ' };
            let state = if tab.is_dormant() { '~' } else { ' ' };
            let url = tab.url.as_ref().map(|u| u.as_str()).unwrap_or("-");
            println!(
                " {marker}{state}[{idx}] {} {} {}",
                short(tab.id),
                if tab.title.is_empty() { "(untitled)" } else { &tab.title },
                url
            );
        }
    }
    if manager.tab_count() == 0 {
        println!("no tabs");
    }
}

fn print_groups(manager: &TabManager) {
    let groups = manager.tab_groups();
    if groups.is_empty() {
        println!("no groups");
        return;
    }
    for group in groups {
        let members: Vec<String> = group.tab_ids.iter().map(|id| short(*id)).collect();
        println!("root {}: {}", short(group.root_id), members.join(", "));
    }
}

fn print_closed(manager: &TabManager) {
    let incognito = manager.active_partition();
    let mut any = false;
    for record in manager.recently_closed(incognito) {
        any = true;
        let url = record
            .current_url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(" {} {} {}", short(record.id), record.title, url);
    }
    if !any {
        println!("archive empty");
    }
}

fn print_help() {
    println!(
        "commands:\n\
         \x20 open <url> [incognito]   open a tab (uses new_tab_url when no URL given)\n\
         \x20 close [id-prefix]        close the selected tab, or one by id\n\
         \x20 closeall [incognito]     wipe a partition\n\
         \x20 select <id-prefix>       select a tab (switches partition if needed)\n\
         \x20 next | prev              cycle selection in the active partition\n\
         \x20 move <id-prefix> <idx>   reorder within the partition\n\
         \x20 list | groups | closed   show tabs, groups, recently closed\n\
         \x20 reopen                   restore the most recently closed tab\n\
         \x20 back | forward | reloadtab | stoptab\n\
         \x20 desktop <id-prefix>      toggle desktop user agent for the tab's host\n\
         \x20 shot [id-prefix]         capture a screenshot into the store\n\
         \x20 save | restore           persist / reload the normal partition\n\
         \x20 route <url>              run a deep link through the router\n\
         \x20 quit"
    );
}

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::{FileStore, StatusStore};
use crate::io::config_io::{self, LoadedConfig};
use crate::ops::export::ExportError;
use crate::ops::{ImportOptions, Tracker};
use crate::parse::parse_csv;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// How often `watch` polls the store for changes from other processes
const WATCH_INTERVAL: Duration = Duration::from_millis(200);

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let start = match cli.project_dir {
        Some(ref dir) => std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
        None => std::env::current_dir()?,
    };

    match cli.command {
        // Read commands
        Commands::Status(args) => cmd_status(&start, args, json),
        Commands::Stats => cmd_stats(&start, json),
        Commands::Watch => cmd_watch(&start, json),

        // Write commands
        Commands::Mark(args) => cmd_mark(&start, args, true, json),
        Commands::Unmark(args) => cmd_mark(&start, args, false, json),
        Commands::MarkAll(args) => cmd_mark_all(&start, args, json),
        Commands::Import(args) => cmd_import(&start, args, json),
        Commands::Export(args) => cmd_export(&start, args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Library {
    loaded: LoadedConfig,
    tracker: Tracker<FileStore>,
}

/// Load the config, open its store and register every configured section.
fn open_library(start: &Path, watch: bool) -> Result<Library, Box<dyn std::error::Error>> {
    let loaded = config_io::load_config(start)?;
    let mut store = FileStore::open(&loaded.store_path())?;
    if watch {
        store = store.watch()?;
    }

    let mut tracker = Tracker::new(store);
    for section in &loaded.config.sections {
        tracker.discover(&section.id, section.name.as_deref(), &section.items);
    }
    debug!(
        root = %loaded.root.display(),
        items = tracker.index().len(),
        "library loaded"
    );
    Ok(Library { loaded, tracker })
}

fn require_section(tracker: &Tracker<FileStore>, section_id: &str) -> CmdResult {
    if tracker.index().section(section_id).is_none() {
        return Err(format!("section not found: {}", section_id).into());
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_status(start: &Path, args: StatusArgs, json: bool) -> CmdResult {
    let lib = open_library(start, false)?;
    let tracker = &lib.tracker;
    let read_filter = parse_read_filter(&args.filter)?;

    if let Some(ref id) = args.section {
        require_section(tracker, id)?;
    }
    let sections: Vec<_> = tracker
        .index()
        .sections()
        .filter(|s| args.section.as_ref().is_none_or(|id| &s.id == id))
        .collect();

    if json {
        let output: Vec<SectionStatusJson> = sections
            .iter()
            .map(|s| {
                let counts = tracker.counts(&s.id);
                SectionStatusJson {
                    id: s.id.clone(),
                    name: s.name.clone(),
                    read: counts.read,
                    total: counts.total,
                    items: tracker
                        .filter(&s.id, read_filter)
                        .into_iter()
                        .map(item_to_json)
                        .collect(),
                }
            })
            .collect();
        return print_json(&output);
    }

    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", format_section_header(section, tracker.counts(&section.id)));
        for item in tracker.filter(&section.id, read_filter) {
            println!("{}", format_item_line(item));
        }
    }
    Ok(())
}

fn cmd_stats(start: &Path, json: bool) -> CmdResult {
    let lib = open_library(start, false)?;
    let tracker = &lib.tracker;
    let untracked = tracker
        .store()
        .read_ids()?
        .iter()
        .filter(|id| !tracker.index().contains(id))
        .count();

    if json {
        let output = StatsJson {
            sections: tracker
                .index()
                .sections()
                .map(|s| section_stats_to_json(s, tracker.counts(&s.id)))
                .collect(),
            totals: tracker.totals(),
            untracked,
        };
        return print_json(&output);
    }

    let name = &lib.loaded.config.library.name;
    if !name.is_empty() {
        println!("{}", name);
    }
    for section in tracker.index().sections() {
        println!("{}", format_stats_line(section, tracker.counts(&section.id)));
    }
    println!("total: {}", tracker.totals());
    if untracked > 0 {
        println!("not in library: {}", untracked);
    }
    Ok(())
}

fn cmd_watch(start: &Path, json: bool) -> CmdResult {
    let mut lib = open_library(start, true)?;
    let tracker = &mut lib.tracker;

    tracker.on_change(move |section, counts| {
        if json {
            let change = ChangeJson {
                section: section.to_string(),
                read: counts.read,
                total: counts.total,
            };
            if let Ok(line) = serde_json::to_string(&change) {
                println!("{}", line);
            }
        } else {
            println!("{} {}", section, counts);
        }
    });
    if !json {
        tracker.on_global_change(|totals| println!("total {}", totals));
        println!("watching {} (total {})", tracker.store().path().display(), tracker.totals());
    }

    loop {
        thread::sleep(WATCH_INTERVAL);
        tracker.sync();
    }
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_mark(start: &Path, args: IdsArgs, read: bool, json: bool) -> CmdResult {
    let mut lib = open_library(start, false)?;
    let tracker = &mut lib.tracker;

    if let Some(missing) = args.ids.iter().find(|id| !tracker.index().contains(id)) {
        return Err(format!("item not found: {}", missing).into());
    }
    for id in &args.ids {
        tracker.set_status(id, read)?;
    }

    if json {
        let items: Vec<ItemJson> = args
            .ids
            .iter()
            .filter_map(|id| tracker.index().get(id))
            .map(item_to_json)
            .collect();
        return print_json(&items);
    }
    let verb = if read { "marked" } else { "unmarked" };
    for id in &args.ids {
        println!("{} {}", verb, id);
    }
    Ok(())
}

fn cmd_mark_all(start: &Path, args: MarkAllArgs, json: bool) -> CmdResult {
    let mut lib = open_library(start, false)?;
    let tracker = &mut lib.tracker;

    let undo = tracker.mark_all(&args.section, !args.unread)?;
    let counts = tracker.counts(&args.section);

    if json {
        let section = tracker
            .index()
            .section(&args.section)
            .ok_or_else(|| format!("section not found: {}", args.section))?;
        return print_json(&section_stats_to_json(section, counts));
    }
    let verb = if args.unread { "unmarked" } else { "marked" };
    println!(
        "{} {} items in {} ({})",
        verb,
        undo.len(),
        args.section,
        counts
    );
    Ok(())
}

fn cmd_import(start: &Path, args: ImportArgs, json: bool) -> CmdResult {
    let mut lib = open_library(start, false)?;
    if let Some(ref section) = args.section {
        require_section(&lib.tracker, section)?;
    }

    let text = std::fs::read_to_string(&args.file)
        .map_err(|e| format!("could not read {}: {}", args.file, e))?;
    let records = parse_csv(&text).map_err(|e| format!("{}: {}", args.file, e))?;

    let options = ImportOptions {
        dry_run: !args.apply,
        section_scope: args.section.clone(),
        extra_truthy: lib.loaded.config.import.truthy.clone(),
    };
    let outcome = lib.tracker.reconcile(&records, &options);

    if json {
        return print_json(&import_to_json(&outcome));
    }
    for line in format_import(&outcome) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_export(start: &Path, args: ExportArgs, json: bool) -> CmdResult {
    let lib = open_library(start, false)?;

    let csv = match lib.tracker.export() {
        Ok(csv) => csv,
        Err(ExportError::NothingToExport) => {
            if json {
                return print_json(&serde_json::json!({ "exported": 0 }));
            }
            println!("nothing to export");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let path = args
        .output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_export_path(&lib.loaded.root));
    std::fs::write(&path, csv).map_err(|e| format!("could not write {}: {}", path.display(), e))?;

    let count = lib.tracker.totals().read;
    if json {
        return print_json(&serde_json::json!({
            "exported": count,
            "path": path.display().to_string(),
        }));
    }
    println!("exported {} items to {}", count, path.display());
    Ok(())
}

/// `readmark-<date>.csv` in the library root
fn default_export_path(root: &Path) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d");
    root.join(format!("readmark-{}.csv", date))
}

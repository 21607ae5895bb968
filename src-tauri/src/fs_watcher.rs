use crate::events;
use crate::state::AppState;
use log::{debug, info, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Result as NotifyResult, Watcher};
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::channel,
    Arc,
};
use tauri::{AppHandle, Manager};

/// Control handle for the macro directory watcher
///
/// Dropping it stops the watcher.
pub struct WatcherControl {
    enabled: Arc<AtomicBool>,
    _watcher: RecommendedWatcher,
}

impl WatcherControl {
    /// Stop hot reloading until [`resume`](Self::resume)
    pub fn pause(&self) {
        debug!("⏸️  Pausing macro file watcher");
        self.enabled.store(false, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        debug!("▶️  Resuming macro file watcher");
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

/// Watch the context directories and hot-reload the active context's file
///
/// The first directory must be watchable; the others are skipped with a
/// warning when they are missing.
pub fn watch_macro_files(app: AppHandle, dirs: Vec<PathBuf>) -> NotifyResult<WatcherControl> {
    info!("📁 Starting macro file watcher for: {:?}", dirs);

    let (tx, rx) = channel();

    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    // Editors often replace the file, so watch directories rather than files
    for (i, dir) in dirs.iter().enumerate() {
        match watcher.watch(dir, RecursiveMode::NonRecursive) {
            Ok(()) => debug!("Watching {:?}", dir),
            Err(e) if i > 0 => warn!("⚠️  Not watching {:?}: {}", dir, e),
            Err(e) => return Err(e),
        }
    }

    let enabled = Arc::new(AtomicBool::new(true));
    let enabled_clone = enabled.clone();

    std::thread::spawn(move || {
        while let Ok(event) = rx.recv() {
            if !enabled_clone.load(Ordering::SeqCst) {
                debug!("📂 Filesystem event received but PAUSED: {:?}", event);
                continue;
            }

            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                continue;
            }

            let state = app.state::<AppState>();
            let active_path = state.active_path();
            if !touches(&event.paths, &active_path) {
                continue;
            }

            debug!("📂 Active macro file changed: {:?}", active_path);
            match state.reload_if_changed() {
                Ok(Some(summary)) => {
                    info!("🔄 Reloaded {} after file change", summary.name);
                    if let Err(e) = events::emit_context_changed(&app, &summary) {
                        debug!("{}", e);
                    }
                }
                Ok(None) => debug!("   ⏭️  Content unchanged, skipping reload"),
                // half-written files are common mid-save; the next event retries
                Err(e) => warn!("⚠️  Keeping previous macros: {}", e),
            }
        }
    });

    info!("✅ Macro file watcher started successfully");
    Ok(WatcherControl {
        enabled,
        _watcher: watcher,
    })
}

/// Whether any of the event paths is the watched file
///
/// Directories are compared canonically: events carry absolute paths while
/// the configured macro directory may be relative, and the file itself may
/// not exist mid-save.
fn touches(paths: &[PathBuf], target: &Path) -> bool {
    let Some(name) = target.file_name() else {
        return false;
    };
    let target_dir = canonical_parent(target);
    paths
        .iter()
        .any(|p| p.file_name() == Some(name) && canonical_parent(p) == target_dir)
}

fn canonical_parent(path: &Path) -> Option<PathBuf> {
    let parent = path.parent()?;
    Some(std::fs::canonicalize(parent).unwrap_or_else(|_| parent.to_path_buf()))
}

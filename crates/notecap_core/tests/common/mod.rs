//! Shared host fakes and fixtures for capture integration tests.

#![allow(dead_code)]

use notecap_core::db::open_db;
use notecap_core::{
    CaptureCoordinator, CaptureLauncher, CaptureTarget, Clock, EntryFormConfig, HostBindings,
    LaunchError, MediaLocationFactory, Permission, PermissionApi, ShareableUriProvider,
    SqliteCaptureStateRepository, UriMintError, UserNotice, UserNotifier,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Everything the fake host observed.
#[derive(Debug, Default)]
pub struct HostRecord {
    pub camera_granted: bool,
    pub permission_requests: usize,
    pub launches: Vec<CaptureTarget>,
    pub notices: Vec<UserNotice>,
    pub launch_error: Option<LaunchError>,
}

#[derive(Clone, Default)]
pub struct HostLog(Arc<Mutex<HostRecord>>);

impl HostLog {
    pub fn with_permission(granted: bool) -> Self {
        let log = Self::default();
        log.lock().camera_granted = granted;
        log
    }

    pub fn lock(&self) -> std::sync::MutexGuard<'_, HostRecord> {
        self.0.lock().expect("host log lock")
    }

    pub fn bindings(&self) -> HostBindings {
        HostBindings {
            permissions: Box::new(FakePermissions(self.clone())),
            launcher: Box::new(FakeLauncher(self.clone())),
            notifier: Box::new(FakeNotifier(self.clone())),
        }
    }

    pub fn notices(&self) -> Vec<UserNotice> {
        self.lock().notices.clone()
    }

    pub fn launches(&self) -> Vec<CaptureTarget> {
        self.lock().launches.clone()
    }

    pub fn permission_requests(&self) -> usize {
        self.lock().permission_requests
    }
}

struct FakePermissions(HostLog);

impl PermissionApi for FakePermissions {
    fn is_granted(&self, _permission: Permission) -> bool {
        self.0.lock().camera_granted
    }

    fn request(&mut self, _permission: Permission) {
        self.0.lock().permission_requests += 1;
    }
}

struct FakeLauncher(HostLog);

impl CaptureLauncher for FakeLauncher {
    fn launch(&mut self, target: &CaptureTarget) -> Result<(), LaunchError> {
        let mut record = self.0.lock();
        if let Some(err) = record.launch_error.clone() {
            return Err(err);
        }
        record.launches.push(target.clone());
        Ok(())
    }
}

struct FakeNotifier(HostLog);

impl UserNotifier for FakeNotifier {
    fn notify(&mut self, notice: UserNotice) {
        self.0.lock().notices.push(notice);
    }
}

/// Clock pinned by the test.
#[derive(Clone)]
pub struct FixedClock(pub Arc<Mutex<i64>>);

impl FixedClock {
    pub fn at(epoch_ms: i64) -> Self {
        Self(Arc::new(Mutex::new(epoch_ms)))
    }

    pub fn set(&self, epoch_ms: i64) {
        *self.0.lock().expect("clock lock") = epoch_ms;
    }
}

impl Clock for FixedClock {
    fn now_epoch_ms(&self) -> i64 {
        *self.0.lock().expect("clock lock")
    }
}

/// URI provider returning scripted URIs first, then `file://<path>`.
#[derive(Clone, Default)]
pub struct ScriptedUris {
    pub scripted: Arc<Mutex<VecDeque<String>>>,
    pub mint_calls: Arc<Mutex<usize>>,
}

impl ScriptedUris {
    pub fn with(uris: &[&str]) -> Self {
        let provider = Self::default();
        provider
            .scripted
            .lock()
            .expect("uri lock")
            .extend(uris.iter().map(|uri| uri.to_string()));
        provider
    }

    pub fn mint_calls(&self) -> usize {
        *self.mint_calls.lock().expect("uri lock")
    }
}

impl ShareableUriProvider for ScriptedUris {
    fn mint(&self, file_path: &Path) -> Result<String, UriMintError> {
        *self.mint_calls.lock().expect("uri lock") += 1;
        if let Some(uri) = self.scripted.lock().expect("uri lock").pop_front() {
            return Ok(uri);
        }
        Ok(format!("file://{}", file_path.display()))
    }
}

/// Coordinator wired to a temp media root and a temp SQLite file.
pub struct Harness {
    pub coordinator: CaptureCoordinator,
    pub host: HostLog,
    pub uris: ScriptedUris,
    pub clock: FixedClock,
    pub form: EntryFormConfig,
    pub dir: TempDir,
}

impl Harness {
    pub fn new(granted: bool) -> Self {
        Self::with(granted, EntryFormConfig::note(), ScriptedUris::default())
    }

    pub fn with(granted: bool, form: EntryFormConfig, uris: ScriptedUris) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let host = HostLog::with_permission(granted);
        let clock = FixedClock::at(1_700_000_000_000);
        let coordinator = build(&dir, &form, &host, &uris, &clock);
        Self {
            coordinator,
            host,
            uris,
            clock,
            form,
            dir,
        }
    }

    pub fn media_root(&self) -> PathBuf {
        self.dir.path().join("media")
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("state").join("capture.sqlite3")
    }

    /// Simulates process death: volatile state is dropped, the database and
    /// media directory survive. The new process has a fresh host.
    pub fn restart(self, granted: bool) -> Self {
        let Self {
            coordinator,
            uris,
            clock,
            form,
            dir,
            ..
        } = self;
        drop(coordinator);
        let host = HostLog::with_permission(granted);
        let coordinator = build(&dir, &form, &host, &uris, &clock);
        Self {
            coordinator,
            host,
            uris,
            clock,
            form,
            dir,
        }
    }
}

fn build(
    dir: &TempDir,
    form: &EntryFormConfig,
    host: &HostLog,
    uris: &ScriptedUris,
    clock: &FixedClock,
) -> CaptureCoordinator {
    let conn = open_db(dir.path().join("state").join("capture.sqlite3")).expect("open db");
    let locations = MediaLocationFactory::new(
        dir.path().join("media"),
        Box::new(uris.clone()),
        Box::new(clock.clone()),
    );
    CaptureCoordinator::restore(
        form.clone(),
        locations,
        Box::new(SqliteCaptureStateRepository::new(conn)),
        host.bindings(),
    )
    .expect("restore coordinator")
}

/// Counts regular files below `root`.
pub fn count_files(root: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(root) else {
        return 0;
    };
    entries
        .filter_map(Result::ok)
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, SystemTime},
};

use async_trait::async_trait;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{error, info};

/// Relative path of the cache worker script, resolved against the runtime
/// root.
pub const WORKER_SCRIPT: &str = "service-worker.js";

const UPDATE_POLL_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

/// A new worker version picked up by the runtime; `states` streams every
/// lifecycle transition of that version, in order and without loss.
pub struct WorkerUpdate {
    pub states: mpsc::Receiver<WorkerState>,
}

#[derive(Debug)]
pub struct Registration {
    pub updates: mpsc::Receiver<WorkerUpdate>,
}

#[derive(Debug)]
pub enum RegistrationError {
    Script(String),
}

impl std::fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RegistrationError::Script(e) => write!(f, "Script error: {}", e),
        }
    }
}

#[async_trait]
pub trait WorkerRuntime: Send + Sync + 'static {
    /// Whether this runtime can host a background cache worker at all.
    fn supported(&self) -> bool;

    /// Whether a previously activated worker version is already in control.
    /// False until the very first registered version finishes activating.
    fn controller(&self) -> bool;

    async fn register(&self, script: &str) -> Result<Registration, RegistrationError>;
}

/// Registers the offline cache worker when the environment allows it and
/// supervises version updates from then on. Registration failures are
/// logged, never propagated. The very first install is not reported; a
/// later replacement version that reaches `Redundant` is logged as an error
/// without taking the service down.
pub async fn bootstrap<R: WorkerRuntime>(runtime: R, origin: &str) -> Option<JoinHandle<()>> {
    if !runtime.supported() || !is_secure_origin(origin) {
        info!("Skipping cache worker registration for origin {}", origin);
        return None;
    }

    let registration = match runtime.register(WORKER_SCRIPT).await {
        Ok(registration) => registration,
        Err(e) => {
            error!("Error during cache worker registration: {}", e);
            return None;
        }
    };

    Some(tokio::spawn(supervise(runtime, registration)))
}

async fn supervise<R: WorkerRuntime>(runtime: R, mut registration: Registration) {
    while let Some(update) = registration.updates.recv().await {
        // An update before anything is in control is the very first
        // install, not a replacement; nothing to report for it.
        if !runtime.controller() {
            continue;
        }
        follow_update(update).await;
    }
}

async fn follow_update(mut update: WorkerUpdate) {
    while let Some(state) = update.states.recv().await {
        match state {
            WorkerState::Installed => {
                info!("New cache worker installed; fresh content is ready");
            }
            WorkerState::Redundant => {
                error!("The installing cache worker became redundant");
                return;
            }
            _ => {}
        }
    }
}

/// `https` anywhere, or plain `http` on a loopback host.
pub fn is_secure_origin(origin: &str) -> bool {
    let Some((scheme, rest)) = origin.split_once("://") else {
        return false;
    };
    if scheme.eq_ignore_ascii_case("https") {
        return true;
    }

    let authority = rest.split('/').next().unwrap_or(rest);
    is_loopback_host(strip_port(authority))
}

fn is_loopback_host(host: &str) -> bool {
    if host == "localhost" || host == "[::1]" {
        return true;
    }

    // 127.0.0.0/8 as a dotted quad.
    match host
        .split('.')
        .map(|octet| octet.parse::<u8>())
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(octets) if octets.len() == 4 => octets[0] == 127,
        _ => false,
    }
}

fn strip_port(authority: &str) -> &str {
    if let Some(rest) = authority.strip_prefix('[') {
        // Bracketed IPv6 literal, with or without a port.
        return match rest.split_once(']') {
            Some((host, _)) => &authority[..host.len() + 2],
            None => authority,
        };
    }

    match authority.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => authority,
    }
}

/// Hosts the cache worker script from the local filesystem. The first
/// version is registered immediately; a new version is spawned whenever the
/// script's mtime changes. The script body itself drives the cache strategy
/// and is not interpreted here.
pub struct LocalWorkerRuntime {
    root: PathBuf,
    controller: Arc<AtomicBool>,
}

impl LocalWorkerRuntime {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            controller: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl WorkerRuntime for LocalWorkerRuntime {
    fn supported(&self) -> bool {
        true
    }

    fn controller(&self) -> bool {
        self.controller.load(Ordering::Acquire)
    }

    async fn register(&self, script: &str) -> Result<Registration, RegistrationError> {
        let path = self.root.join(script);
        let mut modified = script_modified(&path).await?;

        let (updates_tx, updates_rx) = mpsc::channel(4);
        let controller = Arc::clone(&self.controller);

        tokio::spawn(async move {
            // The first registered version counts as an update too.
            spawn_version(&path, &updates_tx, &controller).await;

            loop {
                tokio::time::sleep(UPDATE_POLL_INTERVAL).await;
                if updates_tx.is_closed() {
                    return;
                }
                match script_modified(&path).await {
                    Ok(m) if m != modified => {
                        modified = m;
                        spawn_version(&path, &updates_tx, &controller).await;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("Lost track of cache worker script: {}", e);
                        return;
                    }
                }
            }
        });

        Ok(Registration { updates: updates_rx })
    }
}

async fn script_modified(path: &Path) -> Result<SystemTime, RegistrationError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| RegistrationError::Script(format!("{}: {}", path.display(), e)))?;
    metadata
        .modified()
        .map_err(|e| RegistrationError::Script(format!("{}: {}", path.display(), e)))
}

async fn spawn_version(
    path: &Path,
    updates: &mpsc::Sender<WorkerUpdate>,
    controller: &Arc<AtomicBool>,
) {
    // Buffered wide enough for the whole lifecycle, so transitions are
    // never dropped when the observer lags behind the version task.
    let (state_tx, state_rx) = mpsc::channel(8);
    if updates.send(WorkerUpdate { states: state_rx }).await.is_err() {
        return;
    }

    let path = path.to_path_buf();
    let controller = Arc::clone(controller);
    tokio::spawn(async move {
        let _ = state_tx.send(WorkerState::Installing).await;
        // Install is a readability check on the script.
        match tokio::fs::read(&path).await {
            Ok(_) => {
                let _ = state_tx.send(WorkerState::Installed).await;
                let _ = state_tx.send(WorkerState::Activating).await;
                controller.store(true, Ordering::Release);
                let _ = state_tx.send(WorkerState::Activated).await;
            }
            Err(_) => {
                let _ = state_tx.send(WorkerState::Redundant).await;
            }
        }
    });
}

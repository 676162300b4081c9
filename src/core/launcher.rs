//! Browser Launching
//!
//! The authorize URL is opened in an external user-agent. Launching is an
//! injected capability so flows can be driven without a real browser; the
//! spawned process is never waited on or terminated, only its handle is
//! dropped once the callback resolves.

use std::path::PathBuf;
use std::process::{Child, Command};
use tracing::debug;

use crate::error::{NetworkError, OAuthError};

/// Which user-agent to launch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BrowserSelector {
    /// The OS default URL handler.
    Default,
    /// A well-known browser resolved through PATH, e.g. `firefox`.
    Named(String),
    /// An explicit executable path.
    Path(PathBuf),
}

impl BrowserSelector {
    pub fn chrome() -> Self {
        Self::Named("chrome".to_string())
    }

    pub fn firefox() -> Self {
        Self::Named("firefox".to_string())
    }

    pub fn edge() -> Self {
        Self::Named("msedge".to_string())
    }
}

/// Handle to a launched browser process.
///
/// The process outlives the flow; dropping the handle detaches it without
/// killing anything.
pub struct BrowserHandle {
    _child: Option<Child>,
}

impl BrowserHandle {
    /// A handle with no process attached (OS shell handoff, test doubles).
    pub fn detached() -> Self {
        Self { _child: None }
    }
}

impl From<Child> for BrowserHandle {
    fn from(child: Child) -> Self {
        Self {
            _child: Some(child),
        }
    }
}

/// Browser launcher interface (for dependency injection).
pub trait BrowserLauncher: Send + Sync {
    /// Launch the selected user-agent pointed at `url`, fire-and-forget.
    fn launch(&self, url: &str, selector: &BrowserSelector) -> Result<BrowserHandle, OAuthError>;
}

/// Launcher that spawns real OS processes.
#[derive(Default)]
pub struct ProcessBrowserLauncher;

impl ProcessBrowserLauncher {
    pub fn new() -> Self {
        Self
    }

    fn spawn(&self, mut command: Command) -> Result<BrowserHandle, OAuthError> {
        let child = command.spawn().map_err(|e| {
            OAuthError::Network(NetworkError::RequestFailed {
                message: format!("failed to launch browser: {}", e),
            })
        })?;
        Ok(BrowserHandle::from(child))
    }
}

impl BrowserLauncher for ProcessBrowserLauncher {
    fn launch(&self, url: &str, selector: &BrowserSelector) -> Result<BrowserHandle, OAuthError> {
        debug!(?selector, "launching external browser");
        match selector {
            BrowserSelector::Default => {
                #[cfg(target_os = "macos")]
                {
                    let mut command = Command::new("open");
                    command.arg(url);
                    self.spawn(command)
                }
                #[cfg(target_os = "windows")]
                {
                    let mut command = Command::new("cmd");
                    command.args(["/C", "start", "", url]);
                    self.spawn(command)
                }
                #[cfg(all(unix, not(target_os = "macos")))]
                {
                    let mut command = Command::new("xdg-open");
                    command.arg(url);
                    self.spawn(command)
                }
            }
            BrowserSelector::Named(name) => {
                let mut command = Command::new(name);
                command.arg(url);
                self.spawn(command)
            }
            BrowserSelector::Path(path) => {
                let mut command = Command::new(path);
                command.arg(url);
                self.spawn(command)
            }
        }
    }
}

/// Mock launcher for testing.
#[derive(Default)]
pub struct MockBrowserLauncher {
    launch_history: std::sync::Mutex<Vec<(String, BrowserSelector)>>,
    fail_next: std::sync::Mutex<bool>,
}

impl MockBrowserLauncher {
    /// Create a new mock launcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next launch fail.
    pub fn fail_next_launch(&self) -> &Self {
        *self.fail_next.lock().unwrap() = true;
        self
    }

    /// Get launch history.
    pub fn get_launches(&self) -> Vec<(String, BrowserSelector)> {
        self.launch_history.lock().unwrap().clone()
    }

    /// Get the last launched URL.
    pub fn last_url(&self) -> Option<String> {
        self.launch_history
            .lock()
            .unwrap()
            .last()
            .map(|(url, _)| url.clone())
    }
}

impl BrowserLauncher for MockBrowserLauncher {
    fn launch(&self, url: &str, selector: &BrowserSelector) -> Result<BrowserHandle, OAuthError> {
        self.launch_history
            .lock()
            .unwrap()
            .push((url.to_string(), selector.clone()));

        if std::mem::take(&mut *self.fail_next.lock().unwrap()) {
            return Err(OAuthError::Network(NetworkError::RequestFailed {
                message: "mock launch failure".to_string(),
            }));
        }

        Ok(BrowserHandle::detached())
    }
}

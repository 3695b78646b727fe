use std::{path::PathBuf, sync::Arc};

use regsync_config::config::Config;
use regsync_registry::blacklist::Blacklist;
use regsync_remote::{GithubGateway, RemoteSource};

use crate::error::Result;

/// Directories and limits an operation runs with.
#[derive(Debug, Clone)]
pub struct Settings {
    pub modules_dir: PathBuf,
    pub providers_dir: PathBuf,
    pub keys_dir: PathBuf,
    pub entry_concurrency: usize,
    pub version_concurrency: usize,
    pub feed_shortcut: bool,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            modules_dir: config.modules_path(),
            providers_dir: config.providers_path(),
            keys_dir: config.keys_path(),
            entry_concurrency: config.entry_concurrency,
            version_concurrency: config.version_concurrency,
            feed_shortcut: config.feed_shortcut,
        }
    }
}

struct Inner {
    settings: Settings,
    remote: Arc<dyn RemoteSource>,
    blacklist: Blacklist,
}

/// Shared state handed to every operation: settings, the remote source and the blacklist.
///
/// Cloning is cheap, every clone refers to the same gateway and throttles.
#[derive(Clone)]
pub struct RegsyncContext {
    inner: Arc<Inner>,
}

impl RegsyncContext {
    pub fn new(settings: Settings, remote: Arc<dyn RemoteSource>, blacklist: Blacklist) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                remote,
                blacklist,
            }),
        }
    }

    /// Builds the GitHub gateway and loads the blacklist named by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let gateway = GithubGateway::from_config(config)?;
        let blacklist = Blacklist::load(config.blacklist_path().as_deref())?;
        Ok(Self::new(
            Settings::from_config(config),
            Arc::new(gateway),
            blacklist,
        ))
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn remote(&self) -> &dyn RemoteSource {
        self.inner.remote.as_ref()
    }

    pub fn blacklist(&self) -> &Blacklist {
        &self.inner.blacklist
    }
}

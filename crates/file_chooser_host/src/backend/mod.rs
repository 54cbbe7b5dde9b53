//! Backend contract and the closed set of platform variants.

mod browser;
mod native_bridge;

use std::{future::Future, pin::Pin, rc::Rc};

use futures::task::{LocalSpawn, LocalSpawnExt};
use leptos::logging;
use serde_json::Value;

pub use browser::BrowserBackend;
pub use native_bridge::NativeBridgeBackend;

use crate::{
    ChooserCallbacks, ChooserError, ChooserFile, ChooserHandle, ChooserOptions, ChooserServices,
    ChooserTarget, PlatformKind,
};

/// Object-safe boxed future used by [`FileChooserBackend`].
pub type ChooserFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Clone)]
/// Successful acquisition: the processed files plus the caller payload.
pub struct ChangeResult {
    /// Echo of [`ChooserOptions::data`].
    pub data: Option<Value>,
    /// Files in selection order.
    pub files: Vec<ChooserFile>,
}

impl ChangeResult {
    pub(crate) fn new(options: &ChooserOptions, files: Vec<ChooserFile>) -> Self {
        Self {
            data: options.data.clone(),
            files,
        }
    }

    /// Returns the file names in selection order.
    pub fn file_names(&self) -> Vec<String> {
        self.files.iter().map(|file| file.name()).collect()
    }
}

/// File chooser capability implemented by every platform variant.
pub trait FileChooserBackend {
    /// Runs one acquisition and resolves with its result.
    fn open_file_chooser<'a>(
        &'a self,
        options: ChooserOptions,
    ) -> ChooserFuture<'a, Result<ChangeResult, ChooserError>>;

    /// Binds a repeating chooser to `target`.
    fn create_file_chooser<'a>(
        &'a self,
        target: Rc<dyn ChooserTarget>,
        options: ChooserOptions,
        callbacks: ChooserCallbacks,
    ) -> ChooserFuture<'a, Result<ChooserHandle, ChooserError>>;
}

/// Backend enum that erases the concrete variant behind [`FileChooserBackend`].
pub enum ChooserBackend {
    /// File-input based browser backend.
    GenericBrowser(BrowserBackend),
    /// Native image bridge backend.
    NativeBridge(NativeBridgeBackend),
}

impl ChooserBackend {
    /// Instantiates the backend for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `Other` when the native bridge is requested but the host provides none.
    pub fn build(kind: PlatformKind, services: &ChooserServices) -> Result<Self, ChooserError> {
        match kind {
            PlatformKind::GenericBrowser => {
                Ok(Self::GenericBrowser(BrowserBackend::new(services.clone())))
            }
            PlatformKind::NativeBridge => {
                let bridge = services.native_bridge.clone().ok_or_else(|| {
                    ChooserError::other("native image bridge is unavailable in this runtime")
                })?;
                Ok(Self::NativeBridge(NativeBridgeBackend::new(
                    services.clone(),
                    bridge,
                )))
            }
        }
    }

    /// Returns the variant token.
    pub const fn platform(&self) -> PlatformKind {
        match self {
            Self::GenericBrowser(_) => PlatformKind::GenericBrowser,
            Self::NativeBridge(_) => PlatformKind::NativeBridge,
        }
    }
}

impl FileChooserBackend for ChooserBackend {
    fn open_file_chooser<'a>(
        &'a self,
        options: ChooserOptions,
    ) -> ChooserFuture<'a, Result<ChangeResult, ChooserError>> {
        match self {
            Self::GenericBrowser(backend) => backend.open_file_chooser(options),
            Self::NativeBridge(backend) => backend.open_file_chooser(options),
        }
    }

    fn create_file_chooser<'a>(
        &'a self,
        target: Rc<dyn ChooserTarget>,
        options: ChooserOptions,
        callbacks: ChooserCallbacks,
    ) -> ChooserFuture<'a, Result<ChooserHandle, ChooserError>> {
        match self {
            Self::GenericBrowser(backend) => {
                backend.create_file_chooser(target, options, callbacks)
            }
            Self::NativeBridge(backend) => {
                backend.create_file_chooser(target, options, callbacks)
            }
        }
    }
}

fn spawn_task(spawner: &Rc<dyn LocalSpawn>, task: impl Future<Output = ()> + 'static) {
    if let Err(err) = spawner.as_ref().spawn_local(task) {
        logging::warn!("file chooser task could not be spawned: {err}");
    }
}

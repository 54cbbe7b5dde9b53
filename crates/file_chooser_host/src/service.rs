//! Process-wide dispatcher: default options, platform selection, and the lazy backend.

use std::{
    cell::{OnceCell, RefCell},
    rc::Rc,
};

use leptos::logging;
use serde::{Deserialize, Serialize};

use crate::{
    backend::{ChangeResult, ChooserBackend, FileChooserBackend},
    ChooserCallbacks, ChooserError, ChooserHandle, ChooserOptions, ChooserServices, ChooserTarget,
    PlatformKind,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ChooserConfigPatch")]
/// Configuration shared by every chooser call.
///
/// A deserialized `defaultOptions` is a patch deep-merged over [`ChooserOptions::defaults`].
pub struct ChooserConfig {
    /// Options every call is merged over.
    pub default_options: ChooserOptions,
    /// Pinned platform; detected from the runtime when `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<PlatformKind>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChooserConfigPatch {
    #[serde(default)]
    default_options: ChooserOptions,
    #[serde(default)]
    platform: Option<PlatformKind>,
}

impl From<ChooserConfigPatch> for ChooserConfig {
    fn from(patch: ChooserConfigPatch) -> Self {
        Self {
            default_options: ChooserOptions::defaults().merged_with(&patch.default_options),
            platform: patch.platform,
        }
    }
}

impl Default for ChooserConfig {
    fn default() -> Self {
        Self {
            default_options: ChooserOptions::defaults(),
            platform: None,
        }
    }
}

impl ChooserConfig {
    /// Parses a configuration from JSON, keeping built-in defaults for omitted options.
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON does not match the configuration shape.
    pub fn from_json(raw: &str) -> Result<Self, String> {
        serde_json::from_str(raw).map_err(|e| e.to_string())
    }
}

/// Dispatcher that merges options and forwards to a lazily built backend.
///
/// The backend is built on the first chooser call and reused afterwards. Configuration is
/// not isolated per caller: [`FileChooserService::configure`] affects every later call.
pub struct FileChooserService {
    services: ChooserServices,
    config: RefCell<ChooserConfig>,
    backend: OnceCell<ChooserBackend>,
}

impl FileChooserService {
    /// Creates a service with the built-in defaults.
    pub fn new(services: ChooserServices) -> Self {
        Self::with_config(services, ChooserConfig::default())
    }

    /// Creates a service with an explicit configuration.
    pub fn with_config(services: ChooserServices, config: ChooserConfig) -> Self {
        Self {
            services,
            config: RefCell::new(config),
            backend: OnceCell::new(),
        }
    }

    /// Deep-merges `options` into the default options.
    pub fn configure(&self, options: &ChooserOptions) {
        let mut config = self.config.borrow_mut();
        config.default_options = config.default_options.merged_with(options);
    }

    /// Pins the platform used when the backend is first built.
    ///
    /// Has no effect once a backend exists.
    pub fn select_platform(&self, platform: PlatformKind) {
        if let Some(backend) = self.backend.get() {
            logging::warn!(
                "file chooser platform `{}` ignored; `{}` backend already initialized",
                platform.as_str(),
                backend.platform().as_str()
            );
            return;
        }
        self.config.borrow_mut().platform = Some(platform);
    }

    /// Returns a snapshot of the configuration.
    pub fn config(&self) -> ChooserConfig {
        self.config.borrow().clone()
    }

    /// Returns `options` merged over the current defaults.
    pub fn effective_options(&self, options: &ChooserOptions) -> ChooserOptions {
        self.config.borrow().default_options.merged_with(options)
    }

    /// Platform of the built backend, `None` before first use.
    pub fn active_platform(&self) -> Option<PlatformKind> {
        self.backend.get().map(ChooserBackend::platform)
    }

    fn backend(&self) -> Result<&ChooserBackend, ChooserError> {
        if let Some(backend) = self.backend.get() {
            return Ok(backend);
        }
        let platform = self
            .config
            .borrow()
            .platform
            .unwrap_or_else(|| self.services.detected_platform());
        let backend = ChooserBackend::build(platform, &self.services)?;
        logging::log!("file chooser backend initialized: {}", platform.as_str());
        Ok(self.backend.get_or_init(|| backend))
    }

    /// Runs one acquisition with `options` merged over the defaults.
    ///
    /// # Errors
    ///
    /// Returns the validation, compression, or backend error of the attempt.
    pub async fn open_file_chooser(
        &self,
        options: &ChooserOptions,
    ) -> Result<ChangeResult, ChooserError> {
        let effective = self.effective_options(options);
        self.backend()?.open_file_chooser(effective).await
    }

    /// Binds a repeating chooser to `target` with `options` merged over the defaults.
    ///
    /// # Errors
    ///
    /// Returns `Other` when the backend cannot be built or the target rejects the binding.
    pub async fn create_file_chooser(
        &self,
        target: Rc<dyn ChooserTarget>,
        options: &ChooserOptions,
        callbacks: ChooserCallbacks,
    ) -> Result<ChooserHandle, ChooserError> {
        let effective = self.effective_options(options);
        self.backend()?
            .create_file_chooser(target, effective, callbacks)
            .await
    }
}

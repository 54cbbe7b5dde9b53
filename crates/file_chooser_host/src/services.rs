//! Platform selection and the collaborator bundle injected into backends.

use std::rc::Rc;

use futures::task::LocalSpawn;
use serde::{Deserialize, Serialize};

use crate::{ChooserDocument, FileFactory, ImageCompressor, NativeImageBridge};

/// Stable backend variant selected for the current runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformKind {
    /// Plain browser with file-input elements.
    GenericBrowser,
    /// Embedded webview/miniapp with a native image bridge.
    NativeBridge,
}

impl PlatformKind {
    /// Returns a stable string token for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GenericBrowser => "generic-browser",
            Self::NativeBridge => "native-bridge",
        }
    }
}

/// Runtime-selected collaborators shared by both backend variants.
///
/// Environment detection happens before this bundle is built: `native_bridge` is only
/// populated when the native host is present.
#[derive(Clone)]
pub struct ChooserServices {
    /// Black-box image compressor.
    pub compressor: Rc<dyn ImageCompressor>,
    /// Constructor for file/blob representations.
    pub files: Rc<dyn FileFactory>,
    /// Document access for the one-shot hidden surface.
    pub document: Rc<dyn ChooserDocument>,
    /// Native image bridge, when the host provides one.
    pub native_bridge: Option<Rc<dyn NativeImageBridge>>,
    /// Executor for change processing started from event listeners.
    pub spawner: Rc<dyn LocalSpawn>,
}

impl ChooserServices {
    /// Returns the platform implied by the bundle when none is configured.
    pub fn detected_platform(&self) -> PlatformKind {
        if self.native_bridge.is_some() {
            PlatformKind::NativeBridge
        } else {
            PlatformKind::GenericBrowser
        }
    }
}

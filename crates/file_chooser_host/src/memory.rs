//! In-memory collaborators for tests and non-browser hosts.

use std::{
    any::Any,
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
    future::Future,
    rc::Rc,
};

use futures::executor::{LocalPool, LocalSpawner};

use crate::{
    compress::{CompressFuture, CompressedImage},
    file::{FileFuture, FileLikeKind},
    handle::HandleSlot,
    surface::{ClickListener, ListenerKey},
    AcquisitionSurface, BridgeFuture, ChangeListener, ChooseImageRequest, ChooserDocument,
    ChooserFile, ChooserServices, ChooserTarget, CompressOptions, FileFactory, FileLike,
    ImageCompressor, NativeImageBridge, SurfaceSpec,
};

#[derive(Debug, Clone)]
/// File held entirely in memory.
pub struct MemoryFile {
    name: String,
    mime_type: String,
    bytes: Vec<u8>,
    last_modified_ms: u64,
    kind: FileLikeKind,
}

impl MemoryFile {
    /// Creates a native-file representation.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
            last_modified_ms: 0,
            kind: FileLikeKind::File,
        }
    }

    /// Returns the content.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl FileLike for MemoryFile {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn mime_type(&self) -> String {
        self.mime_type.clone()
    }

    fn last_modified_ms(&self) -> u64 {
        self.last_modified_ms
    }

    fn kind(&self) -> FileLikeKind {
        self.kind
    }

    fn read_bytes(&self) -> FileFuture<'_, Result<Vec<u8>, String>> {
        Box::pin(async move { Ok(self.bytes.clone()) })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn as_memory_file(source: &ChooserFile) -> Result<&MemoryFile, String> {
    source
        .as_any()
        .downcast_ref::<MemoryFile>()
        .ok_or_else(|| format!("`{}` is not an in-memory file", source.name()))
}

#[derive(Debug, Clone, Default)]
/// [`FileFactory`] producing [`MemoryFile`] values.
pub struct MemoryFileFactory {
    fail_files: Rc<Cell<bool>>,
}

impl MemoryFileFactory {
    /// Makes native-file construction fail so callers fall back to blobs.
    pub fn fail_file_construction(&self, fail: bool) {
        self.fail_files.set(fail);
    }
}

impl FileFactory for MemoryFileFactory {
    fn from_bytes(
        &self,
        bytes: Vec<u8>,
        name: &str,
        mime_type: &str,
    ) -> Result<ChooserFile, String> {
        Ok(Rc::new(MemoryFile::new(name, mime_type, bytes)))
    }

    fn to_file(&self, source: &ChooserFile, name: &str) -> Result<ChooserFile, String> {
        if self.fail_files.get() {
            return Err("file constructor is unavailable".to_string());
        }
        let file = as_memory_file(source)?;
        Ok(Rc::new(MemoryFile {
            name: name.to_string(),
            ..file.clone()
        }))
    }

    fn to_blob(
        &self,
        source: &ChooserFile,
        name: &str,
        last_modified_ms: u64,
    ) -> Result<ChooserFile, String> {
        let file = as_memory_file(source)?;
        Ok(Rc::new(MemoryFile {
            name: name.to_string(),
            last_modified_ms,
            kind: FileLikeKind::Blob,
            ..file.clone()
        }))
    }
}

#[derive(Debug, Default)]
struct CompressorState {
    calls: Vec<String>,
    last_quality: Option<f64>,
    failures: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
/// Compressor that halves content and renames outputs to `.jpg`.
pub struct MemoryCompressor {
    state: Rc<RefCell<CompressorState>>,
}

impl MemoryCompressor {
    /// Input names seen so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    /// Quality passed to the most recent call.
    pub fn last_quality(&self) -> Option<f64> {
        self.state.borrow().last_quality
    }

    /// Makes calls for `name` fail with `message`.
    pub fn fail_on(&self, name: impl Into<String>, message: impl Into<String>) {
        self.state
            .borrow_mut()
            .failures
            .insert(name.into(), message.into());
    }
}

impl ImageCompressor for MemoryCompressor {
    fn compress<'a>(
        &'a self,
        file: &'a ChooserFile,
        options: &'a CompressOptions,
    ) -> CompressFuture<'a, Result<CompressedImage, String>> {
        Box::pin(async move {
            let name = file.name();
            let failure = {
                let mut state = self.state.borrow_mut();
                state.calls.push(name.clone());
                state.last_quality = options.quality;
                state.failures.get(&name).cloned()
            };
            if let Some(message) = failure {
                return Err(message);
            }

            let mut bytes = file.read_bytes().await?;
            bytes.truncate(bytes.len() / 2);
            let stem = name.rsplit_once('.').map_or(name.as_str(), |(stem, _)| stem);
            let origin_name = format!("{stem}.jpg");
            let output: ChooserFile =
                Rc::new(MemoryFile::new(origin_name.as_str(), "image/jpeg", bytes));
            Ok(CompressedImage {
                file: output,
                origin_name,
            })
        })
    }
}

type SelectionQueue = Rc<RefCell<Option<Vec<ChooserFile>>>>;

/// File-input double that records activations and resets.
pub struct MemorySurface {
    spec: RefCell<SurfaceSpec>,
    listener: RefCell<Option<ChangeListener>>,
    value: RefCell<Vec<ChooserFile>>,
    queued: SelectionQueue,
    activations: Cell<usize>,
    resets: Cell<usize>,
    removed: Cell<bool>,
}

impl MemorySurface {
    fn new(spec: &SurfaceSpec, queued: SelectionQueue) -> Self {
        Self {
            spec: RefCell::new(spec.clone()),
            listener: RefCell::new(None),
            value: RefCell::new(Vec::new()),
            queued,
            activations: Cell::new(0),
            resets: Cell::new(0),
            removed: Cell::new(false),
        }
    }

    /// Selection the next [`AcquisitionSurface::activate`] picks.
    pub fn queue_selection(&self, files: Vec<ChooserFile>) {
        *self.queued.borrow_mut() = Some(files);
    }

    /// Simulates the user picking `files`.
    ///
    /// Returns `false` without notifying when the selection equals the current value.
    pub fn select(&self, files: Vec<ChooserFile>) -> bool {
        let unchanged = {
            let value = self.value.borrow();
            value.len() == files.len()
                && value
                    .iter()
                    .zip(&files)
                    .all(|(a, b)| a.name() == b.name() && a.size() == b.size())
        };
        if unchanged {
            return false;
        }
        *self.value.borrow_mut() = files.clone();
        let listener = self.listener.borrow().clone();
        if let Some(listener) = listener {
            listener(files);
        }
        true
    }

    /// Names of the currently selected files.
    pub fn value_names(&self) -> Vec<String> {
        self.value.borrow().iter().map(|file| file.name()).collect()
    }

    /// Current attributes.
    pub fn spec(&self) -> SurfaceSpec {
        self.spec.borrow().clone()
    }

    /// Number of programmatic opens.
    pub fn activations(&self) -> usize {
        self.activations.get()
    }

    /// Number of value resets.
    pub fn resets(&self) -> usize {
        self.resets.get()
    }

    /// Whether the surface was removed from its parent.
    pub fn is_removed(&self) -> bool {
        self.removed.get()
    }
}

impl AcquisitionSurface for MemorySurface {
    fn id(&self) -> String {
        self.spec.borrow().id.clone()
    }

    fn apply_spec(&self, spec: &SurfaceSpec) {
        let mut current = self.spec.borrow_mut();
        current.accept = spec.accept.clone();
        current.multiple = spec.multiple;
        current.capture = spec.capture;
    }

    fn set_change_listener(&self, listener: Option<ChangeListener>) {
        *self.listener.borrow_mut() = listener;
    }

    fn activate(&self) {
        self.activations.set(self.activations.get() + 1);
        let queued = self.queued.borrow_mut().take();
        if let Some(files) = queued {
            self.select(files);
        }
    }

    fn reset(&self) {
        self.value.borrow_mut().clear();
        self.resets.set(self.resets.get() + 1);
    }

    fn remove(&self) {
        self.removed.set(true);
    }
}

#[derive(Default)]
/// Target element double.
pub struct MemoryTarget {
    surfaces: RefCell<Vec<Rc<MemorySurface>>>,
    listeners: RefCell<Vec<(ListenerKey, ClickListener)>>,
    next_key: Cell<u64>,
    fail_mounts: Cell<bool>,
    slot: HandleSlot,
}

impl MemoryTarget {
    /// Makes every subsequent mount fail.
    pub fn fail_mounts(&self, fail: bool) {
        self.fail_mounts.set(fail);
    }

    /// Looks up a mounted surface by id.
    pub fn surface(&self, id: &str) -> Option<Rc<MemorySurface>> {
        self.surfaces
            .borrow()
            .iter()
            .find(|surface| surface.id() == id)
            .cloned()
    }

    /// Ids of surfaces still attached.
    pub fn surface_ids(&self) -> Vec<String> {
        self.surfaces
            .borrow()
            .iter()
            .filter(|surface| !surface.is_removed())
            .map(|surface| surface.id())
            .collect()
    }

    /// Simulates a click on the element.
    pub fn click(&self) {
        let listeners: Vec<ClickListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }

    /// Number of registered click listeners.
    pub fn click_listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl ChooserTarget for MemoryTarget {
    fn mount_surface(&self, spec: &SurfaceSpec) -> Result<Rc<dyn AcquisitionSurface>, String> {
        if self.fail_mounts.get() {
            return Err("target element rejected the file input".to_string());
        }
        let surface = Rc::new(MemorySurface::new(spec, Rc::new(RefCell::new(None))));
        self.surfaces.borrow_mut().push(surface.clone());
        Ok(surface)
    }

    fn add_click_listener(&self, listener: ClickListener) -> Result<ListenerKey, String> {
        let key = ListenerKey(self.next_key.get());
        self.next_key.set(key.0 + 1);
        self.listeners.borrow_mut().push((key, listener));
        Ok(key)
    }

    fn remove_click_listener(&self, key: ListenerKey) {
        self.listeners
            .borrow_mut()
            .retain(|(existing, _)| *existing != key);
    }

    fn handle_slot(&self) -> &HandleSlot {
        &self.slot
    }
}

#[derive(Default)]
/// Document double owning the one-shot hidden surface.
pub struct MemoryDocument {
    hidden: RefCell<Option<Rc<MemorySurface>>>,
    queued: SelectionQueue,
    mounts: Cell<usize>,
}

impl MemoryDocument {
    /// Selection the hidden surface picks on its next activation.
    pub fn queue_hidden_selection(&self, files: Vec<ChooserFile>) {
        *self.queued.borrow_mut() = Some(files);
    }

    /// Number of hidden-surface mounts.
    pub fn hidden_mounts(&self) -> usize {
        self.mounts.get()
    }

    /// The hidden surface, once mounted.
    pub fn hidden_memory_surface(&self) -> Option<Rc<MemorySurface>> {
        self.hidden.borrow().clone()
    }
}

impl ChooserDocument for MemoryDocument {
    fn hidden_surface(&self) -> Option<Rc<dyn AcquisitionSurface>> {
        self.hidden
            .borrow()
            .clone()
            .map(|surface| surface as Rc<dyn AcquisitionSurface>)
    }

    fn mount_hidden_surface(
        &self,
        spec: &SurfaceSpec,
    ) -> Result<Rc<dyn AcquisitionSurface>, String> {
        let surface = Rc::new(MemorySurface::new(spec, self.queued.clone()));
        *self.hidden.borrow_mut() = Some(surface.clone());
        self.mounts.set(self.mounts.get() + 1);
        Ok(surface)
    }
}

#[derive(Debug, Default)]
struct BridgeState {
    selections: VecDeque<Result<Vec<String>, String>>,
    images: HashMap<String, String>,
    requests: Vec<ChooseImageRequest>,
}

#[derive(Debug, Clone, Default)]
/// Scripted native image bridge.
pub struct MemoryNativeBridge {
    state: Rc<RefCell<BridgeState>>,
}

impl MemoryNativeBridge {
    /// Queues the local ids the next pick returns.
    pub fn push_selection<I, S>(&self, local_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = local_ids.into_iter().map(Into::into).collect();
        self.state.borrow_mut().selections.push_back(Ok(ids));
    }

    /// Queues a failed pick.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.state
            .borrow_mut()
            .selections
            .push_back(Err(message.into()));
    }

    /// Registers base64 data (raw or data URL) for `local_id`.
    pub fn insert_image(&self, local_id: impl Into<String>, data: impl Into<String>) {
        self.state
            .borrow_mut()
            .images
            .insert(local_id.into(), data.into());
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ChooseImageRequest> {
        self.state.borrow().requests.clone()
    }
}

impl NativeImageBridge for MemoryNativeBridge {
    fn choose_images<'a>(
        &'a self,
        request: &'a ChooseImageRequest,
    ) -> BridgeFuture<'a, Result<Vec<String>, String>> {
        Box::pin(async move {
            let mut state = self.state.borrow_mut();
            state.requests.push(request.clone());
            state
                .selections
                .pop_front()
                .unwrap_or_else(|| Err("chooseImage:fail no selection queued".to_string()))
        })
    }

    fn local_image_data<'a>(
        &'a self,
        local_id: &'a str,
    ) -> BridgeFuture<'a, Result<String, String>> {
        Box::pin(async move {
            self.state
                .borrow()
                .images
                .get(local_id)
                .cloned()
                .ok_or_else(|| format!("getLocalImgData:fail unknown local id `{local_id}`"))
        })
    }
}

/// Single-threaded host wiring every in-memory collaborator to a [`LocalPool`].
pub struct MemoryHost {
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
    compressor: MemoryCompressor,
    files: MemoryFileFactory,
    document: Rc<MemoryDocument>,
    bridge: MemoryNativeBridge,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Creates a host with an empty document and an idle bridge.
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            pool: RefCell::new(pool),
            spawner,
            compressor: MemoryCompressor::default(),
            files: MemoryFileFactory::default(),
            document: Rc::new(MemoryDocument::default()),
            bridge: MemoryNativeBridge::default(),
        }
    }

    /// Collaborators for a plain browser runtime.
    pub fn services(&self) -> ChooserServices {
        ChooserServices {
            compressor: Rc::new(self.compressor.clone()),
            files: Rc::new(self.files.clone()),
            document: self.document.clone(),
            native_bridge: None,
            spawner: Rc::new(self.spawner.clone()),
        }
    }

    /// Collaborators for a runtime that exposes the native bridge.
    pub fn bridged_services(&self) -> ChooserServices {
        ChooserServices {
            native_bridge: Some(Rc::new(self.bridge.clone())),
            ..self.services()
        }
    }

    /// Shared compressor.
    pub fn compressor(&self) -> MemoryCompressor {
        self.compressor.clone()
    }

    /// Shared file factory.
    pub fn files(&self) -> MemoryFileFactory {
        self.files.clone()
    }

    /// Shared document.
    pub fn document(&self) -> Rc<MemoryDocument> {
        self.document.clone()
    }

    /// Shared native bridge.
    pub fn bridge(&self) -> MemoryNativeBridge {
        self.bridge.clone()
    }

    /// Runs spawned tasks until none can make progress.
    pub fn run_until_stalled(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    /// Drives `future` to completion, running spawned tasks alongside it.
    pub fn run_until<F: Future>(&self, future: F) -> F::Output {
        self.pool.borrow_mut().run_until(future)
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn surface_suppresses_identical_selection_until_reset() {
        let surface = MemorySurface::new(
            &SurfaceSpec::scoped(&crate::ChooserOptions::defaults()),
            Rc::new(RefCell::new(None)),
        );
        let file: ChooserFile = Rc::new(MemoryFile::new("a.txt", "", vec![1]));
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        surface.set_change_listener(Some(Rc::new(move |_files: Vec<ChooserFile>| {
            counter.set(counter.get() + 1)
        })));

        assert!(surface.select(vec![file.clone()]));
        assert!(!surface.select(vec![file.clone()]));
        surface.reset();
        assert!(surface.select(vec![file]));
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn bridge_replays_scripted_picks_in_order() {
        let bridge = MemoryNativeBridge::default();
        bridge.push_selection(["a"]);
        bridge.push_failure("cancel");
        let request = ChooseImageRequest::from_options(&crate::ChooserOptions::defaults());

        assert_eq!(
            block_on(bridge.choose_images(&request)),
            Ok(vec!["a".to_string()])
        );
        assert_eq!(
            block_on(bridge.choose_images(&request)),
            Err("cancel".to_string())
        );
        assert_eq!(bridge.requests().len(), 2);
    }
}

//! Object registry: the runtime that owns every display, context and
//! window-surface association handed out by the dispatch layer.
//!
//! The process-wide instance lives in [`crate::c_api`]; everything else
//! takes a `&DispatchRuntime`, so tests build their own against a fake
//! driver.

use std::collections::{HashMap, HashSet};
use std::ffi::{c_char, c_void, CStr, CString};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use tracing::warn;

use crate::config::Config;
use crate::extensions::GlExtensionCache;
use crate::ffi::{EGLenum, EGLint};
use crate::gralloc::BufferAllocator;
use crate::hooks::{GlesVersion, Hooks};
use crate::loader::Driver;
use crate::platform::{DefaultPlatforms, PlatformAdapter, PlatformFactory};
use crate::wlegl::{WleglServer, WleglTransport};

/// Opaque EGL or native handle, compared by address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Handle(pub usize);

impl Handle {
    pub const NULL: Handle = Handle(0);

    pub fn from_ptr<T>(ptr: *const T) -> Self {
        Handle(ptr as usize)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0 as *mut c_void
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Lock a registry map, recovering from poisoning
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// =============================================================================
// Display
// =============================================================================

#[derive(Default)]
struct DisplayState {
    major: EGLint,
    minor: EGLint,
    initialized: bool,
    wlegl: Option<Arc<WleglServer>>,
}

/// One opened connection to the driver
pub struct Display {
    native: Handle,
    driver: Handle,
    platform: EGLenum,
    adapter: Option<Arc<dyn PlatformAdapter>>,
    state: Mutex<DisplayState>,
}

impl Display {
    pub(crate) fn new(
        native: Handle,
        driver: Handle,
        platform: EGLenum,
        adapter: Option<Arc<dyn PlatformAdapter>>,
    ) -> Self {
        Self {
            native,
            driver,
            platform,
            adapter,
            state: Mutex::new(DisplayState::default()),
        }
    }

    /// Native display the application asked for
    pub fn native(&self) -> Handle {
        self.native
    }

    /// Display handle of the driver, which is also what the application sees
    pub fn handle(&self) -> Handle {
        self.driver
    }

    pub fn platform(&self) -> EGLenum {
        self.platform
    }

    pub fn adapter(&self) -> Option<&Arc<dyn PlatformAdapter>> {
        self.adapter.as_ref()
    }

    pub fn version(&self) -> (EGLint, EGLint) {
        let state = lock(&self.state);
        (state.major, state.minor)
    }

    pub fn is_initialized(&self) -> bool {
        lock(&self.state).initialized
    }

    pub(crate) fn set_initialized(&self, version: Option<(EGLint, EGLint)>) {
        let mut state = lock(&self.state);
        match version {
            Some((major, minor)) => {
                state.major = major;
                state.minor = minor;
                state.initialized = true;
            }
            None => state.initialized = false,
        }
    }

    /// `android_wlegl` server bound by `eglBindWaylandDisplayWL`
    pub fn wlegl(&self) -> Option<Arc<WleglServer>> {
        lock(&self.state).wlegl.clone()
    }

    /// Install `server` unless one is already bound
    pub(crate) fn bind_wlegl(&self, server: Arc<WleglServer>) -> bool {
        let mut state = lock(&self.state);
        if state.wlegl.is_some() {
            return false;
        }
        state.wlegl = Some(server);
        true
    }

    pub(crate) fn unbind_wlegl(&self, wl_display: Handle) -> Option<Arc<WleglServer>> {
        let mut state = lock(&self.state);
        match &state.wlegl {
            Some(server) if server.display() == wl_display => state.wlegl.take(),
            _ => None,
        }
    }
}

// =============================================================================
// Context
// =============================================================================

pub struct Context {
    display: Handle,
    handle: Handle,
    version: GlesVersion,
    extensions: OnceLock<GlExtensionCache>,
}

impl Context {
    pub(crate) fn new(display: Handle, handle: Handle, version: GlesVersion) -> Self {
        Self {
            display,
            handle,
            version,
            extensions: OnceLock::new(),
        }
    }

    pub fn display(&self) -> Handle {
        self.display
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Which hook table this context dispatches through
    pub fn version(&self) -> GlesVersion {
        self.version
    }

    /// Extension answers cached at first `eglMakeCurrent`
    pub fn extensions(&self) -> Option<&GlExtensionCache> {
        self.extensions.get()
    }

    pub(crate) fn cache_extensions(
        &self,
        build: impl FnOnce() -> GlExtensionCache,
    ) -> &GlExtensionCache {
        self.extensions.get_or_init(build)
    }
}

// =============================================================================
// Runtime
// =============================================================================

/// Owner of the driver, the registry maps and the per-process probes
pub struct DispatchRuntime {
    driver: Arc<Driver>,
    config: Config,
    platforms: Box<dyn PlatformFactory>,
    allocator: Option<Arc<dyn BufferAllocator>>,
    wlegl_transport: Mutex<Option<Arc<dyn WleglTransport>>>,
    display: Mutex<Option<Arc<Display>>>,
    contexts: Mutex<HashMap<Handle, Arc<Context>>>,
    surfaces: Mutex<HashMap<Handle, Handle>>,
    bgra_valid: OnceLock<bool>,
    strings: Mutex<HashSet<CString>>,
}

impl DispatchRuntime {
    pub fn new(driver: Driver, config: Config) -> Self {
        Self {
            driver: Arc::new(driver),
            config,
            platforms: Box::new(DefaultPlatforms::new(None, None)),
            allocator: None,
            wlegl_transport: Mutex::new(None),
            display: Mutex::new(None),
            contexts: Mutex::new(HashMap::new()),
            surfaces: Mutex::new(HashMap::new()),
            bgra_valid: OnceLock::new(),
            strings: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_platforms(mut self, platforms: Box<dyn PlatformFactory>) -> Self {
        self.platforms = platforms;
        self
    }

    /// Gralloc backend used to import buffers shared over `android_wlegl`
    pub fn with_allocator(mut self, allocator: Option<Arc<dyn BufferAllocator>>) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn with_wlegl_transport(self, transport: Option<Arc<dyn WleglTransport>>) -> Self {
        self.set_wlegl_transport(transport);
        self
    }

    /// Transport that publishes `android_wlegl` for `eglBindWaylandDisplayWL`
    pub fn set_wlegl_transport(&self, transport: Option<Arc<dyn WleglTransport>>) {
        *lock(&self.wlegl_transport) = transport;
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn hooks(&self) -> &Arc<Hooks> {
        self.driver.hooks()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn platforms(&self) -> &dyn PlatformFactory {
        self.platforms.as_ref()
    }

    pub(crate) fn allocator(&self) -> Option<Arc<dyn BufferAllocator>> {
        self.allocator.clone()
    }

    pub(crate) fn wlegl_transport(&self) -> Option<Arc<dyn WleglTransport>> {
        lock(&self.wlegl_transport).clone()
    }

    pub(crate) fn bgra_probe(&self) -> &OnceLock<bool> {
        &self.bgra_valid
    }

    // --- displays ---

    /// The display whose driver handle is `handle`
    pub fn display(&self, handle: Handle) -> Option<Arc<Display>> {
        if handle.is_null() {
            return None;
        }
        lock(&self.display)
            .as_ref()
            .filter(|display| display.handle() == handle)
            .cloned()
    }

    pub fn current_display(&self) -> Option<Arc<Display>> {
        lock(&self.display).clone()
    }

    /// Register `display`, or return the one that won a concurrent race
    pub(crate) fn install_display(&self, display: Arc<Display>) -> Arc<Display> {
        let mut slot = lock(&self.display);
        match slot.as_ref() {
            Some(existing) => {
                warn!("display created concurrently, keeping {:?}", existing.handle());
                existing.clone()
            }
            None => {
                *slot = Some(display.clone());
                display
            }
        }
    }

    // --- contexts ---

    pub fn context(&self, handle: Handle) -> Option<Arc<Context>> {
        lock(&self.contexts).get(&handle).cloned()
    }

    pub(crate) fn insert_context(&self, context: Context) {
        lock(&self.contexts).insert(context.handle(), Arc::new(context));
    }

    pub(crate) fn remove_context(&self, handle: Handle) -> Option<Arc<Context>> {
        lock(&self.contexts).remove(&handle)
    }

    pub fn context_count(&self) -> usize {
        lock(&self.contexts).len()
    }

    // --- window surfaces ---

    /// Native window (as given to the driver) behind a window surface
    pub fn surface_window(&self, surface: Handle) -> Option<Handle> {
        lock(&self.surfaces).get(&surface).copied()
    }

    pub(crate) fn insert_surface(&self, surface: Handle, window: Handle) {
        lock(&self.surfaces).insert(surface, window);
    }

    pub(crate) fn remove_surface(&self, surface: Handle) -> Option<Handle> {
        lock(&self.surfaces).remove(&surface)
    }

    pub fn surface_count(&self) -> usize {
        lock(&self.surfaces).len()
    }

    /// Keep `value` alive for the life of the runtime and return a stable
    /// pointer to it. Equal strings share one allocation.
    pub(crate) fn intern(&self, value: &str) -> *const c_char {
        let Ok(value) = CString::new(value) else {
            return std::ptr::null();
        };
        let mut strings = lock(&self.strings);
        if let Some(existing) = strings.get(value.as_c_str()) {
            return existing.as_ptr();
        }
        let ptr = value.as_ptr();
        strings.insert(value);
        ptr
    }
}

/// Borrow a driver string, treating null as empty
///
/// # Safety
/// `ptr` must be null or a valid NUL-terminated string.
pub(crate) unsafe fn driver_str<'a>(ptr: *const c_char) -> std::borrow::Cow<'a, str> {
    if ptr.is_null() {
        return std::borrow::Cow::Borrowed("");
    }
    CStr::from_ptr(ptr).to_string_lossy()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> DispatchRuntime {
        DispatchRuntime::new(Driver::unloaded(), Config::default())
    }

    #[test]
    fn test_handle_conversions() {
        let value = 7u32;
        let handle = Handle::from_ptr(&value as *const u32);
        assert!(!handle.is_null());
        assert_eq!(handle.as_ptr() as *const u32, &value as *const u32);
        assert!(Handle::NULL.is_null());
        assert!(Handle::NULL.as_ptr().is_null());
    }

    #[test]
    fn test_single_display_slot() {
        let runtime = runtime();
        assert!(runtime.display(Handle(1)).is_none());

        let first = Arc::new(Display::new(Handle::NULL, Handle(1), 0, None));
        let installed = runtime.install_display(first.clone());
        assert!(Arc::ptr_eq(&installed, &first));

        let second = Arc::new(Display::new(Handle(5), Handle(2), 0, None));
        let kept = runtime.install_display(second);
        assert!(Arc::ptr_eq(&kept, &first));

        assert!(runtime.display(Handle(1)).is_some());
        assert!(runtime.display(Handle(2)).is_none());
        assert!(runtime.display(Handle::NULL).is_none());
    }

    #[test]
    fn test_display_state() {
        let display = Display::new(Handle::NULL, Handle(1), 0, None);
        assert!(!display.is_initialized());
        display.set_initialized(Some((1, 5)));
        assert!(display.is_initialized());
        assert_eq!(display.version(), (1, 5));
        display.set_initialized(None);
        assert!(!display.is_initialized());
        assert_eq!(display.version(), (1, 5));
    }

    #[test]
    fn test_wlegl_binding() {
        let display = Display::new(Handle::NULL, Handle(1), 0, None);
        let server = Arc::new(WleglServer::new(Handle(0x30), None));
        assert!(display.bind_wlegl(server.clone()));
        assert!(!display.bind_wlegl(server));
        assert!(display.unbind_wlegl(Handle(0x31)).is_none());
        assert!(display.unbind_wlegl(Handle(0x30)).is_some());
        assert!(display.wlegl().is_none());
    }

    #[test]
    fn test_context_and_surface_maps() {
        let runtime = runtime();
        runtime.insert_context(Context::new(Handle(1), Handle(10), GlesVersion::Es2));
        assert_eq!(runtime.context(Handle(10)).map(|c| c.version()), Some(GlesVersion::Es2));
        assert_eq!(runtime.context_count(), 1);
        assert!(runtime.remove_context(Handle(10)).is_some());
        assert!(runtime.context(Handle(10)).is_none());

        runtime.insert_surface(Handle(20), Handle(21));
        assert_eq!(runtime.surface_window(Handle(20)), Some(Handle(21)));
        assert_eq!(runtime.remove_surface(Handle(20)), Some(Handle(21)));
        assert_eq!(runtime.surface_count(), 0);
    }

    #[test]
    fn test_intern_is_stable() {
        let runtime = runtime();
        let first = runtime.intern("EGL_KHR_image_base");
        let second = runtime.intern("EGL_KHR_image_base");
        assert_eq!(first, second);
        let other = runtime.intern("EGL_KHR_fence_sync");
        assert_ne!(first, other);
        assert_eq!(
            unsafe { CStr::from_ptr(first) }.to_str().unwrap(),
            "EGL_KHR_image_base"
        );
    }

    #[test]
    fn test_context_extension_cache_once() {
        let context = Context::new(Handle(1), Handle(2), GlesVersion::Legacy);
        assert!(context.extensions().is_none());
        context.cache_extensions(|| GlExtensionCache::new("GL_A GL_B", true));
        context.cache_extensions(|| GlExtensionCache::new("GL_C", true));
        assert_eq!(context.extensions().map(|e| e.count()), Some(2));
    }
}

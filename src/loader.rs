//! Symbol loader
//!
//! Opens the system EGL and GLES libraries and fills the hook tables. Core
//! entry points are looked up directly in their library first and through
//! `eglGetProcAddress` second; extension slots only ever come from
//! `eglGetProcAddress`.

use std::collections::HashMap;
use std::ffi::{c_void, CStr, CString};
use std::sync::{Arc, Mutex};

use tracing::{debug, error, info};

use crate::dynlib::{DynLib, LibraryPathGuard};
use crate::error::Error;
use crate::ffi::EglGetProcAddressFn;
use crate::hooks::{GlesVersion, Hooks, GLES1_NAMES};
use crate::Result;

/// The three driver libraries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverLib {
    Egl,
    Gles1,
    Gles2,
}

impl DriverLib {
    pub fn file_name(self) -> &'static str {
        match self {
            DriverLib::Egl => "libEGL.so",
            DriverLib::Gles1 => "libGLESv1_CM.so",
            DriverLib::Gles2 => "libGLESv2.so",
        }
    }
}

/// Where driver symbols come from
pub trait SymbolSource: Send + Sync {
    /// Direct lookup in one library, null when absent
    fn symbol(&self, lib: DriverLib, name: &CStr) -> *mut c_void;

    /// The driver's own `eglGetProcAddress`
    fn proc_address(&self, name: &CStr) -> *mut c_void;
}

pub fn system_lib_dir() -> &'static str {
    if cfg!(target_pointer_width = "64") {
        "/system/lib64"
    } else {
        "/system/lib"
    }
}

/// The opened system driver
pub struct SystemLibraries {
    egl: DynLib,
    gles1: DynLib,
    gles2: DynLib,
    get_proc_address: EglGetProcAddressFn,
}

impl SystemLibraries {
    /// Open all three libraries. Any failure, or a libEGL without
    /// `eglGetProcAddress`, is fatal.
    pub fn open() -> Result<Self> {
        let _path_guard = LibraryPathGuard::suspend();
        let dir = system_lib_dir();
        let open = |lib: DriverLib| DynLib::open(&format!("{}/{}", dir, lib.file_name()));

        let egl = open(DriverLib::Egl)?;
        let gles1 = open(DriverLib::Gles1)?;
        let gles2 = open(DriverLib::Gles2)?;

        let get_proc_address = unsafe { egl.lookup::<EglGetProcAddressFn>(c"eglGetProcAddress") }
            .ok_or(Error::MissingProcAddress)?;

        info!("Opened system driver from {}", dir);
        Ok(Self {
            egl,
            gles1,
            gles2,
            get_proc_address,
        })
    }

    fn lib(&self, lib: DriverLib) -> &DynLib {
        match lib {
            DriverLib::Egl => &self.egl,
            DriverLib::Gles1 => &self.gles1,
            DriverLib::Gles2 => &self.gles2,
        }
    }
}

impl SymbolSource for SystemLibraries {
    fn symbol(&self, lib: DriverLib, name: &CStr) -> *mut c_void {
        self.lib(lib).symbol(name)
    }

    fn proc_address(&self, name: &CStr) -> *mut c_void {
        unsafe { (self.get_proc_address)(name.as_ptr()) }
    }
}

fn symbol_or_proc(source: &dyn SymbolSource, lib: DriverLib, name: &CStr) -> *mut c_void {
    let addr = source.symbol(lib, name);
    let addr = if addr.is_null() {
        source.proc_address(name)
    } else {
        addr
    };
    if addr.is_null() {
        debug!("{:?}: {} not found", lib, name.to_string_lossy());
    }
    addr
}

fn proc_only(source: &dyn SymbolSource, name: &CStr) -> *mut c_void {
    let addr = source.proc_address(name);
    if addr.is_null() {
        debug!("extension {} not found", name.to_string_lossy());
    }
    addr
}

/// Populate every hook table from `source`
pub fn load_hooks(source: &dyn SymbolSource) -> Hooks {
    let mut hooks = Hooks::empty();

    let egl = hooks
        .egl
        .fill(|name| symbol_or_proc(source, DriverLib::Egl, name));
    let egl_ext = hooks.egl_ext.fill(|name| proc_only(source, name));

    let gles2 = hooks.gl[GlesVersion::Es2.index()]
        .fill(|name| symbol_or_proc(source, DriverLib::Gles2, name));

    // GLES1 names are an ordered subsequence of the table, so one pass over
    // both lists finds every slot libGLESv1_CM provides
    let mut legacy_names = GLES1_NAMES.iter().peekable();
    let gles1 = hooks.gl[GlesVersion::Legacy.index()].fill(|name| {
        if legacy_names.peek().is_some_and(|next| **next == name) {
            legacy_names.next();
            symbol_or_proc(source, DriverLib::Gles1, name)
        } else {
            std::ptr::null_mut()
        }
    });

    let gl_ext = hooks.gl_ext.fill(|name| proc_only(source, name));

    info!(
        "Resolved EGL {}+{} ext, GLES1 {}, GLES2 {}, GL ext {}",
        egl, egl_ext, gles1, gles2, gl_ext
    );
    hooks
}

/// Loaded driver: the hook tables plus the symbol source they came from
pub struct Driver {
    hooks: Arc<Hooks>,
    source: Option<Arc<dyn SymbolSource>>,
    extensions: Mutex<HashMap<CString, usize>>,
}

impl Driver {
    /// Open the system libraries. A fatal loader error leaves every table
    /// empty so callers see unimplemented entry points instead of a crash.
    pub fn load() -> Self {
        match SystemLibraries::open() {
            Ok(libraries) => Self::from_source(Arc::new(libraries)),
            Err(e) => {
                error!("Failed to load system driver: {}", e);
                Self::unloaded()
            }
        }
    }

    pub fn from_source(source: Arc<dyn SymbolSource>) -> Self {
        let hooks = load_hooks(source.as_ref());
        Self {
            hooks: Arc::new(hooks),
            source: Some(source),
            extensions: Mutex::new(HashMap::new()),
        }
    }

    /// Driver with prebuilt tables and no library behind them
    pub fn from_hooks(hooks: Hooks) -> Self {
        Self {
            hooks: Arc::new(hooks),
            source: None,
            extensions: Mutex::new(HashMap::new()),
        }
    }

    pub fn unloaded() -> Self {
        Self::from_hooks(Hooks::empty())
    }

    pub fn hooks(&self) -> &Arc<Hooks> {
        &self.hooks
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    /// Direct symbol in libEGL, libGLESv2 or libGLESv1_CM, in that order
    pub fn library_symbol(&self, name: &CStr) -> *mut c_void {
        let Some(source) = &self.source else {
            return std::ptr::null_mut();
        };
        [DriverLib::Egl, DriverLib::Gles2, DriverLib::Gles1]
            .into_iter()
            .map(|lib| source.symbol(lib, name))
            .find(|addr| !addr.is_null())
            .unwrap_or(std::ptr::null_mut())
    }

    /// `eglGetProcAddress` of the driver, cached per name
    pub fn proc_address(&self, name: &CStr) -> *mut c_void {
        let Some(source) = &self.source else {
            return std::ptr::null_mut();
        };

        let mut cache = match self.extensions.lock() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(addr) = cache.get(name) {
            return *addr as *mut c_void;
        }

        let addr = source.proc_address(name);
        if !addr.is_null() {
            cache.insert(name.to_owned(), addr as usize);
        }
        addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const EGL_ADDR: usize = 0x1000;
    const GLES1_ADDR: usize = 0x2000;
    const GLES2_ADDR: usize = 0x3000;
    const PROC_ADDR: usize = 0x4000;

    /// Resolves a fixed set of names and counts proc-address queries
    struct FakeSource {
        proc_queries: AtomicUsize,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                proc_queries: AtomicUsize::new(0),
            }
        }
    }

    impl SymbolSource for FakeSource {
        fn symbol(&self, lib: DriverLib, name: &CStr) -> *mut c_void {
            let found = match (lib, name.to_bytes()) {
                (DriverLib::Egl, b"eglInitialize") => EGL_ADDR,
                (DriverLib::Gles1, b"glClear") | (DriverLib::Gles1, b"glLoadIdentity") => GLES1_ADDR,
                (DriverLib::Gles2, b"glClear") | (DriverLib::Gles2, b"glCreateProgram") => GLES2_ADDR,
                // present in the library but must not land in the GLES1 table
                (DriverLib::Gles1, b"glCreateProgram") => GLES1_ADDR,
                _ => 0,
            };
            found as *mut c_void
        }

        fn proc_address(&self, name: &CStr) -> *mut c_void {
            self.proc_queries.fetch_add(1, Ordering::SeqCst);
            match name.to_bytes() {
                b"eglCreateImageKHR" | b"eglTerminate" | b"glEGLImageTargetTexture2DOES" => {
                    PROC_ADDR as *mut c_void
                }
                _ => std::ptr::null_mut(),
            }
        }
    }

    fn addr<T: Copy>(slot: Option<T>) -> Option<usize> {
        slot.map(|f| unsafe { std::mem::transmute_copy::<T, usize>(&f) })
    }

    #[test]
    fn test_symbol_then_proc_address() {
        let hooks = load_hooks(&FakeSource::new());
        assert_eq!(addr(hooks.egl.eglInitialize), Some(EGL_ADDR));
        assert_eq!(addr(hooks.egl.eglTerminate), Some(PROC_ADDR));
        assert_eq!(addr(hooks.egl.eglSwapBuffers), None);
        assert_eq!(addr(hooks.egl_ext.eglCreateImageKHR), Some(PROC_ADDR));
        assert_eq!(addr(hooks.gl_ext.glEGLImageTargetTexture2DOES), Some(PROC_ADDR));
    }

    #[test]
    fn test_gles1_table_only_holds_gles1_names() {
        let hooks = load_hooks(&FakeSource::new());
        let legacy = hooks.gl(GlesVersion::Legacy);
        let modern = hooks.gl(GlesVersion::Es2);

        assert_eq!(addr(legacy.glClear), Some(GLES1_ADDR));
        assert_eq!(addr(legacy.glLoadIdentity), Some(GLES1_ADDR));
        assert_eq!(addr(legacy.glCreateProgram), None);

        assert_eq!(addr(modern.glClear), Some(GLES2_ADDR));
        assert_eq!(addr(modern.glCreateProgram), Some(GLES2_ADDR));
        assert_eq!(addr(modern.glLoadIdentity), None);
    }

    #[test]
    fn test_proc_address_cache() {
        let source = Arc::new(FakeSource::new());
        let driver = Driver::from_source(source.clone());
        let before = source.proc_queries.load(Ordering::SeqCst);

        assert_eq!(driver.proc_address(c"eglCreateImageKHR") as usize, PROC_ADDR);
        assert_eq!(driver.proc_address(c"eglCreateImageKHR") as usize, PROC_ADDR);
        assert_eq!(source.proc_queries.load(Ordering::SeqCst), before + 1);

        assert_eq!(driver.library_symbol(c"glCreateProgram") as usize, GLES2_ADDR);
        assert!(driver.library_symbol(c"glMissing").is_null());
    }

    #[test]
    fn test_unloaded_driver() {
        let driver = Driver::unloaded();
        assert!(!driver.is_loaded());
        assert!(driver.hooks().is_empty());
        assert!(driver.proc_address(c"eglCreateImageKHR").is_null());
    }
}

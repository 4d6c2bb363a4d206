//! Thin `dlopen`/`dlsym` wrapper
//!
//! With the `hybris` feature every lookup goes through libhybris so bionic
//! driver libraries can be loaded from a glibc process.

use std::ffi::{CStr, CString, OsString};
use std::mem::transmute_copy;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr::NonNull;

use tracing::{debug, warn};

use crate::error::Error;
use crate::Result;

#[cfg(feature = "hybris")]
mod sys {
    use std::os::raw::{c_char, c_int, c_void};

    #[link(name = "hybris-common")]
    extern "C" {
        fn hybris_dlopen(filename: *const c_char, flag: c_int) -> *mut c_void;
        fn hybris_dlsym(handle: *mut c_void, symbol: *const c_char) -> *mut c_void;
        fn hybris_dlclose(handle: *mut c_void) -> c_int;
        fn hybris_dlerror() -> *const c_char;
    }

    pub unsafe fn dlopen(filename: *const c_char, flag: c_int) -> *mut c_void {
        hybris_dlopen(filename, flag)
    }
    pub unsafe fn dlsym(handle: *mut c_void, symbol: *const c_char) -> *mut c_void {
        hybris_dlsym(handle, symbol)
    }
    pub unsafe fn dlclose(handle: *mut c_void) -> c_int {
        hybris_dlclose(handle)
    }
    pub unsafe fn dlerror() -> *const c_char {
        hybris_dlerror()
    }
}

#[cfg(not(feature = "hybris"))]
mod sys {
    use std::os::raw::{c_char, c_int, c_void};

    pub unsafe fn dlopen(filename: *const c_char, flag: c_int) -> *mut c_void {
        libc::dlopen(filename, flag)
    }
    pub unsafe fn dlsym(handle: *mut c_void, symbol: *const c_char) -> *mut c_void {
        libc::dlsym(handle, symbol)
    }
    pub unsafe fn dlclose(handle: *mut c_void) -> c_int {
        libc::dlclose(handle)
    }
    pub unsafe fn dlerror() -> *const c_char {
        libc::dlerror()
    }
}

fn last_error() -> String {
    unsafe {
        let err = sys::dlerror();
        if err.is_null() {
            "unknown dynamic linker error".to_string()
        } else {
            CStr::from_ptr(err).to_string_lossy().into_owned()
        }
    }
}

/// An opened shared object, closed on drop
pub struct DynLib {
    handle: NonNull<c_void>,
    path: String,
}

// dlopen handles are process-global and safe to share
unsafe impl Send for DynLib {}
unsafe impl Sync for DynLib {}

impl DynLib {
    /// Open `path` with `RTLD_NOW`
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with_flags(path, libc::RTLD_NOW)
    }

    pub fn open_with_flags(path: &str, flags: c_int) -> Result<Self> {
        let c_path = CString::new(path).map_err(|_| Error::LibraryOpen {
            path: path.to_string(),
            reason: "path contains a NUL byte".to_string(),
        })?;

        let handle = unsafe { sys::dlopen(c_path.as_ptr(), flags) };
        match NonNull::new(handle) {
            Some(handle) => {
                debug!("opened {}", path);
                Ok(Self {
                    handle,
                    path: path.to_string(),
                })
            }
            None => Err(Error::LibraryOpen {
                path: path.to_string(),
                reason: last_error(),
            }),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw symbol address, null when absent
    pub fn symbol(&self, name: &CStr) -> *mut c_void {
        unsafe { sys::dlsym(self.handle.as_ptr(), name.as_ptr()) }
    }

    /// Typed lookup of a function pointer.
    ///
    /// # Safety
    /// `F` must be a function pointer type whose signature matches the
    /// exported symbol.
    pub unsafe fn lookup<F: Copy>(&self, name: &CStr) -> Option<F> {
        debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<*mut c_void>());
        let addr = self.symbol(name);
        if addr.is_null() {
            None
        } else {
            Some(transmute_copy(&addr))
        }
    }
}

impl Drop for DynLib {
    fn drop(&mut self) {
        unsafe {
            sys::dlclose(self.handle.as_ptr());
        }
    }
}

/// Look a symbol up in the global namespace of the process
pub fn global_symbol(name: &CStr) -> *mut c_void {
    unsafe { libc::dlsym(libc::RTLD_DEFAULT, name.as_ptr()) }
}

type UpdateLibraryPathFn = unsafe extern "C" fn(*const c_char);

/// Suspends any inherited dynamic-linker search-path override for as long
/// as it is alive.
///
/// `LD_LIBRARY_PATH` is cleared and, when the Android linker exposes it, the
/// linker's own search path is reset too. Both are put back on drop, so early
/// returns restore them as well.
pub struct LibraryPathGuard {
    saved: Option<OsString>,
    update: Option<UpdateLibraryPathFn>,
}

impl LibraryPathGuard {
    pub fn suspend() -> Self {
        let saved = std::env::var_os("LD_LIBRARY_PATH");

        let update = [
            c"__loader_android_update_LD_LIBRARY_PATH",
            c"android_update_LD_LIBRARY_PATH",
        ]
        .into_iter()
        .map(global_symbol)
        .find(|addr| !addr.is_null())
        .map(|addr| unsafe { std::mem::transmute::<*mut c_void, UpdateLibraryPathFn>(addr) });

        if let Some(path) = &saved {
            debug!("suspending LD_LIBRARY_PATH={:?}", path);
            std::env::remove_var("LD_LIBRARY_PATH");
            if let Some(update) = update {
                unsafe { update(c"".as_ptr()) };
            }
        }

        Self { saved, update }
    }
}

impl Drop for LibraryPathGuard {
    fn drop(&mut self) {
        let Some(path) = self.saved.take() else {
            return;
        };

        std::env::set_var("LD_LIBRARY_PATH", &path);
        if let Some(update) = self.update {
            match CString::new(path.to_string_lossy().into_owned()) {
                Ok(c_path) => unsafe { update(c_path.as_ptr()) },
                Err(_) => warn!("LD_LIBRARY_PATH contains a NUL byte, linker path not restored"),
            }
        }
        debug!("restored LD_LIBRARY_PATH");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_library() {
        let err = DynLib::open("/nonexistent/libnothing.so").err();
        assert!(matches!(err, Some(Error::LibraryOpen { .. })));
    }

    #[test]
    fn test_global_symbol() {
        assert!(!global_symbol(c"malloc").is_null());
        assert!(global_symbol(c"definitely_not_a_symbol_42").is_null());
    }

    #[test]
    fn test_library_path_guard_restores() {
        std::env::set_var("LD_LIBRARY_PATH", "/opt/override/lib");
        {
            let _guard = LibraryPathGuard::suspend();
            assert!(std::env::var_os("LD_LIBRARY_PATH").is_none());
        }
        assert_eq!(
            std::env::var("LD_LIBRARY_PATH").ok().as_deref(),
            Some("/opt/override/lib")
        );
        std::env::remove_var("LD_LIBRARY_PATH");
    }
}

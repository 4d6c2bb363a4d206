//! Windowing-system integration
//!
//! A display created for a windowing system other than Android owns a
//! [`PlatformAdapter`]. The adapter turns application windows into
//! `ANativeWindow`s the driver can render to and takes part in every swap.

pub mod libwayland;
pub mod native_window;
pub mod wayland;

use std::ffi::{c_char, c_void};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::ffi::{
    EGLenum, EGLint, EGL_PLATFORM_ANDROID_KHR, EGL_PLATFORM_GBM_KHR, EGL_PLATFORM_SURFACELESS_MESA,
    EGL_PLATFORM_WAYLAND_EXT,
};
use crate::gralloc::BufferAllocator;
use crate::registry::Handle;

pub use libwayland::LibWaylandConnector;
pub use wayland::{WaylandAdapter, WaylandConnector};

/// `x, y, width, height` in GL window coordinates (origin bottom-left)
pub type DamageRect = [EGLint; 4];

pub trait PlatformAdapter: Send + Sync {
    fn initialize(&self) -> bool;
    fn terminate(&self);
    fn is_initialized(&self) -> bool;

    /// Wrap an application window. The returned handle is what the driver
    /// receives as its native window.
    fn create_window(&self, native: Handle) -> Option<Handle>;
    fn destroy_window(&self, window: Handle);

    fn prepare_swap(&self, window: Handle, damage: &[DamageRect]);
    fn finish_swap(&self, window: Handle);
}

/// Builds the adapter for a newly created display, if its platform needs one
pub trait PlatformFactory: Send + Sync {
    fn create(&self, platform: EGLenum, native: Handle) -> Option<Arc<dyn PlatformAdapter>>;
}

/// Adapters for the windowing systems this crate supports
pub struct DefaultPlatforms {
    wayland: Option<Arc<dyn WaylandConnector>>,
    allocator: Option<Arc<dyn BufferAllocator>>,
}

impl DefaultPlatforms {
    pub fn new(
        wayland: Option<Arc<dyn WaylandConnector>>,
        allocator: Option<Arc<dyn BufferAllocator>>,
    ) -> Self {
        Self { wayland, allocator }
    }
}

impl PlatformFactory for DefaultPlatforms {
    fn create(&self, platform: EGLenum, native: Handle) -> Option<Arc<dyn PlatformAdapter>> {
        match platform {
            EGL_PLATFORM_WAYLAND_EXT => {
                if self.wayland.is_none() {
                    warn!("Wayland display requested but no Wayland connector is installed");
                }
                Some(Arc::new(WaylandAdapter::new(
                    native,
                    self.wayland.clone(),
                    self.allocator.clone(),
                )))
            }
            _ => None,
        }
    }
}

// =============================================================================
// Platform detection
// =============================================================================

/// Platform implied by a native display handle passed to `eglGetDisplay`
pub fn native_platform(native: Handle, wayland_env: bool) -> EGLenum {
    if native.is_null() {
        return if wayland_env {
            EGL_PLATFORM_WAYLAND_EXT
        } else {
            EGL_PLATFORM_ANDROID_KHR
        };
    }

    if unsafe { check_wayland_display(native.as_ptr()) } {
        EGL_PLATFORM_WAYLAND_EXT
    } else {
        EGL_PLATFORM_ANDROID_KHR
    }
}

/// Whether an explicitly requested platform is acceptable for `native`.
/// Surfaceless and GBM need no native display of their own.
pub fn platform_matches(platform: EGLenum, native: Handle, wayland_env: bool) -> bool {
    match platform {
        EGL_PLATFORM_SURFACELESS_MESA | EGL_PLATFORM_GBM_KHR => true,
        _ => native_platform(native, wayland_env) == platform,
    }
}

/// Whether `len` bytes at `ptr` can be read without faulting
///
/// The kernel validates the source buffer of `write(2)`, so copying into a
/// pipe fails with `EFAULT` instead of crashing.
pub fn check_memory_is_readable(ptr: *const c_void, len: usize) -> bool {
    if ptr.is_null() {
        return false;
    }
    let mut fds = [0; 2];
    if unsafe { libc::pipe(fds.as_mut_ptr()) } < 0 {
        return false;
    }
    let readable = unsafe {
        let flags = libc::fcntl(fds[1], libc::F_GETFL);
        libc::fcntl(fds[1], libc::F_SETFL, flags | libc::O_NONBLOCK);
        libc::write(fds[1], ptr, len) != -1
    };
    unsafe {
        libc::close(fds[0]);
        libc::close(fds[1]);
    }
    readable
}

/// Whether `display` looks like a client `wl_display`
///
/// # Safety
/// `display` must be null or a pointer the caller is allowed to pass to the
/// kernel for reading; unreadable memory is detected, not dereferenced.
pub unsafe fn check_wayland_display(display: *mut c_void) -> bool {
    const NAME: &[u8] = b"wl_display\0";

    if !check_memory_is_readable(display, std::mem::size_of::<*const c_void>()) {
        return false;
    }
    // A wl_display proxy starts with its wl_interface, whose first field is
    // the interface name
    let interface = *(display as *const *const *const c_char);
    if !check_memory_is_readable(interface as *const c_void, std::mem::size_of::<*const c_char>()) {
        return false;
    }
    let name = *interface;
    if !check_memory_is_readable(name as *const c_void, NAME.len()) {
        return false;
    }
    let matches = std::slice::from_raw_parts(name as *const u8, NAME.len()) == NAME;
    let dpy = display;
    debug!("native display {:p} is wl_display: {}", dpy, matches);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C)]
    struct FakeInterface {
        name: *const c_char,
    }

    #[repr(C)]
    struct FakeProxy {
        interface: *const FakeInterface,
    }

    #[test]
    fn test_default_display_follows_environment() {
        assert_eq!(native_platform(Handle::NULL, true), EGL_PLATFORM_WAYLAND_EXT);
        assert_eq!(native_platform(Handle::NULL, false), EGL_PLATFORM_ANDROID_KHR);
    }

    #[test]
    fn test_wayland_display_sniffing() {
        let interface = FakeInterface {
            name: c"wl_display".as_ptr(),
        };
        let mut proxy = FakeProxy {
            interface: &interface,
        };
        let handle = Handle::from_ptr(&mut proxy as *mut FakeProxy as *mut c_void);
        assert!(unsafe { check_wayland_display(handle.as_ptr()) });
        assert_eq!(native_platform(handle, false), EGL_PLATFORM_WAYLAND_EXT);

        let other = FakeInterface {
            name: c"wl_surface".as_ptr(),
        };
        let mut proxy = FakeProxy { interface: &other };
        let handle = Handle::from_ptr(&mut proxy as *mut FakeProxy as *mut c_void);
        assert_eq!(native_platform(handle, true), EGL_PLATFORM_ANDROID_KHR);
    }

    #[test]
    fn test_unreadable_memory() {
        assert!(!check_memory_is_readable(std::ptr::null(), 8));
        assert!(!check_memory_is_readable(8 as *const c_void, 8));
        let value = 42u64;
        assert!(check_memory_is_readable(&value as *const u64 as *const c_void, 8));

        // First word points nowhere
        let mut bogus: usize = 16;
        assert!(!unsafe { check_wayland_display(&mut bogus as *mut usize as *mut c_void) });
    }

    #[test]
    fn test_platform_matches() {
        assert!(platform_matches(EGL_PLATFORM_SURFACELESS_MESA, Handle(0x1234), false));
        assert!(platform_matches(EGL_PLATFORM_GBM_KHR, Handle(0x1234), true));
        assert!(platform_matches(EGL_PLATFORM_ANDROID_KHR, Handle::NULL, false));
        assert!(!platform_matches(EGL_PLATFORM_WAYLAND_EXT, Handle::NULL, false));
    }
}

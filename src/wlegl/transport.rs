//! `android_wlegl` global on a compositor's `wl_display`, through the
//! system libwayland-server
//!
//! Every resource carries a strong reference to its [`WleglServer`] as user
//! data, released by the resource destructor, so resources outlive a
//! withdrawn global safely.

use std::collections::HashMap;
use std::ffi::{c_int, c_void, CString};
use std::os::fd::{FromRawFd, OwnedFd};
use std::ptr;
use std::slice;
use std::sync::{Arc, Mutex};

use tracing::{debug, error, info, warn};
use wayland_sys::common::{wl_argument, wl_array, wl_dispatcher_func_t, wl_message};
use wayland_sys::ffi_dispatch;
use wayland_sys::server::{wayland_server_option, wl_client, wl_global, wl_resource, WaylandServer};

use super::protocol::{
    android_wlegl_handle_interface, android_wlegl_interface, interface, wl_buffer_interface,
    ANDROID_WLEGL_CREATE_BUFFER, ANDROID_WLEGL_CREATE_HANDLE, ANDROID_WLEGL_HANDLE_ADD_FD,
    ANDROID_WLEGL_HANDLE_DESTROY, ANDROID_WLEGL_VERSION, WL_BUFFER_DESTROY,
};
use super::{ProtocolError, ResourceId, WleglServer, WleglTransport};
use crate::registry::{lock, Handle};

struct Global {
    global: *mut wl_global,
    server: *const WleglServer,
}

// Only touched under the transport's lock
unsafe impl Send for Global {}

/// [`WleglTransport`] over the system libwayland-server
#[derive(Default)]
pub struct LibWaylandTransport {
    globals: Mutex<HashMap<Handle, Global>>,
}

impl LibWaylandTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_available() -> bool {
        wayland_server_option().is_some()
    }

    pub fn global_count(&self) -> usize {
        lock(&self.globals).len()
    }
}

impl WleglTransport for LibWaylandTransport {
    fn advertise(&self, display: Handle, server: Arc<WleglServer>) -> bool {
        let Some(lib) = wayland_server_option() else {
            error!("libwayland-server is not loadable, cannot create android_wlegl");
            return false;
        };
        let mut globals = lock(&self.globals);
        if globals.contains_key(&display) {
            let dpy = display;
            warn!("android_wlegl already advertised on {:?}", dpy);
            return true;
        }

        let data = Arc::into_raw(server);
        let global = unsafe {
            ffi_dispatch!(
                lib,
                wl_global_create,
                display.as_ptr().cast(),
                interface(&android_wlegl_interface),
                ANDROID_WLEGL_VERSION as c_int,
                data as *mut c_void,
                bind_wlegl
            )
        };
        if global.is_null() {
            unsafe { drop(Arc::from_raw(data)) };
            let dpy = display;
            error!("wl_global_create(android_wlegl) failed on {:?}", dpy);
            return false;
        }

        globals.insert(display, Global { global, server: data });
        let dpy = display;
        info!("android_wlegl global created on {:?}", dpy);
        true
    }

    fn withdraw(&self, display: Handle) {
        let Some(global) = lock(&self.globals).remove(&display) else {
            return;
        };
        if let Some(lib) = wayland_server_option() {
            unsafe { ffi_dispatch!(lib, wl_global_destroy, global.global) };
        }
        unsafe { drop(Arc::from_raw(global.server)) };
        let dpy = display;
        debug!("android_wlegl global destroyed on {:?}", dpy);
    }
}

// =============================================================================
// Resources
// =============================================================================

unsafe fn server_of<'a>(lib: &WaylandServer, resource: *mut wl_resource) -> &'a WleglServer {
    &*(ffi_dispatch!(lib, wl_resource_get_user_data, resource) as *const WleglServer)
}

fn post_error(lib: &WaylandServer, resource: *mut wl_resource, err: &ProtocolError) {
    warn!("android_wlegl: {}", err);
    let message = CString::new(err.message.as_str()).unwrap_or_default();
    unsafe {
        ffi_dispatch!(
            lib,
            wl_resource_post_error,
            resource,
            err.code,
            c"%s".as_ptr(),
            message.as_ptr()
        )
    };
}

/// Give `resource` a reference to `server` and route its requests
unsafe fn attach(
    lib: &WaylandServer,
    resource: *mut wl_resource,
    server: *const WleglServer,
    dispatcher: wl_dispatcher_func_t,
    destroy: unsafe extern "C" fn(*mut wl_resource),
) {
    Arc::increment_strong_count(server);
    ffi_dispatch!(
        lib,
        wl_resource_set_dispatcher,
        resource,
        dispatcher,
        ptr::null(),
        server as *mut c_void,
        Some(destroy)
    );
}

unsafe extern "C" fn bind_wlegl(client: *mut wl_client, data: *mut c_void, version: u32, id: u32) {
    let Some(lib) = wayland_server_option() else {
        return;
    };
    let version = version.min(ANDROID_WLEGL_VERSION) as c_int;
    let resource = ffi_dispatch!(lib, wl_resource_create, client, interface(&android_wlegl_interface), version, id);
    if resource.is_null() {
        ffi_dispatch!(lib, wl_client_post_no_memory, client);
        return;
    }
    attach(lib, resource, data as *const WleglServer, dispatch_wlegl, release_wlegl);
    debug!("client bound android_wlegl v{}", version);
}

unsafe extern "C" fn release_wlegl(resource: *mut wl_resource) {
    if let Some(lib) = wayland_server_option() {
        Arc::decrement_strong_count(server_of(lib, resource) as *const WleglServer);
    }
}

unsafe extern "C" fn release_handle(resource: *mut wl_resource) {
    if let Some(lib) = wayland_server_option() {
        let server = server_of(lib, resource);
        server.destroy_handle(ResourceId(resource as usize));
        Arc::decrement_strong_count(server as *const WleglServer);
    }
}

unsafe extern "C" fn release_buffer(resource: *mut wl_resource) {
    if let Some(lib) = wayland_server_option() {
        let server = server_of(lib, resource);
        server.destroy_buffer(ResourceId(resource as usize));
        Arc::decrement_strong_count(server as *const WleglServer);
    }
}

unsafe fn array_ints<'a>(array: *const wl_array) -> &'a [c_int] {
    if array.is_null() || (*array).size == 0 || (*array).data.is_null() {
        return &[];
    }
    slice::from_raw_parts((*array).data as *const c_int, (*array).size / std::mem::size_of::<c_int>())
}

unsafe extern "C" fn dispatch_wlegl(
    _implementation: *const c_void,
    target: *mut c_void,
    opcode: u32,
    _message: *const wl_message,
    args: *const wl_argument,
) -> c_int {
    let Some(lib) = wayland_server_option() else {
        return 0;
    };
    let resource: *mut wl_resource = target.cast();
    let server = server_of(lib, resource);
    let client = ffi_dispatch!(lib, wl_resource_get_client, resource);
    let version = ffi_dispatch!(lib, wl_resource_get_version, resource);

    match opcode {
        ANDROID_WLEGL_CREATE_HANDLE => {
            let args = slice::from_raw_parts(args, 3);
            let (id, num_fds, ints) = (args[0].n, args[1].i, array_ints(args[2].a));
            let handle = ffi_dispatch!(
                lib,
                wl_resource_create,
                client,
                interface(&android_wlegl_handle_interface),
                version,
                id
            );
            if handle.is_null() {
                ffi_dispatch!(lib, wl_client_post_no_memory, client);
                return 0;
            }
            match server.create_handle(ResourceId(handle as usize), num_fds, ints) {
                Ok(()) => attach(lib, handle, server, dispatch_handle, release_handle),
                Err(err) => {
                    ffi_dispatch!(lib, wl_resource_destroy, handle);
                    post_error(lib, resource, &err);
                }
            }
        }
        ANDROID_WLEGL_CREATE_BUFFER => {
            let args = slice::from_raw_parts(args, 7);
            let id = args[0].n;
            let (width, height, stride) = (args[1].i, args[2].i, args[3].i);
            let (format, usage) = (args[4].i, args[5].i);
            let handle = ResourceId(args[6].o as usize);

            let buffer = ffi_dispatch!(lib, wl_resource_create, client, interface(&wl_buffer_interface), 1, id);
            if buffer.is_null() {
                ffi_dispatch!(lib, wl_client_post_no_memory, client);
                return 0;
            }
            let created = server.create_buffer(
                ResourceId(buffer as usize),
                width,
                height,
                stride,
                format,
                usage,
                handle,
            );
            match created {
                Ok(Some(_)) => attach(lib, buffer, server, dispatch_buffer, release_buffer),
                Ok(None) => ffi_dispatch!(lib, wl_resource_destroy, buffer),
                Err(err) => {
                    ffi_dispatch!(lib, wl_resource_destroy, buffer);
                    post_error(lib, resource, &err);
                }
            }
        }
        _ => warn!("android_wlegl: unknown request {}", opcode),
    }
    0
}

unsafe extern "C" fn dispatch_handle(
    _implementation: *const c_void,
    target: *mut c_void,
    opcode: u32,
    _message: *const wl_message,
    args: *const wl_argument,
) -> c_int {
    let Some(lib) = wayland_server_option() else {
        return 0;
    };
    let resource: *mut wl_resource = target.cast();
    match opcode {
        ANDROID_WLEGL_HANDLE_ADD_FD => {
            // The request hands us the received fd
            let fd = OwnedFd::from_raw_fd((*args).h);
            if let Err(err) = server_of(lib, resource).add_fd(ResourceId(resource as usize), fd) {
                post_error(lib, resource, &err);
            }
        }
        ANDROID_WLEGL_HANDLE_DESTROY => ffi_dispatch!(lib, wl_resource_destroy, resource),
        _ => warn!("android_wlegl_handle: unknown request {}", opcode),
    }
    0
}

unsafe extern "C" fn dispatch_buffer(
    _implementation: *const c_void,
    target: *mut c_void,
    opcode: u32,
    _message: *const wl_message,
    _args: *const wl_argument,
) -> c_int {
    if opcode == WL_BUFFER_DESTROY {
        if let Some(lib) = wayland_server_option() {
            ffi_dispatch!(lib, wl_resource_destroy, target.cast());
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::fd::IntoRawFd;
    use std::os::unix::net::UnixStream;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc::channel;
    use std::thread;
    use std::time::{Duration, Instant};

    use wayland_sys::client::{wayland_client_option, wl_display};

    use crate::gralloc::BufferDesc;
    use crate::platform::libwayland::{LibWaylandConnector, WlEglWindow};
    use crate::platform::wayland::{WaylandConnection, WaylandConnector};
    use crate::wlegl::tests::MemoryAllocator;

    /// Compositor side of a socketpair, dispatched on its own thread
    struct TestCompositor {
        stop: Arc<AtomicBool>,
        thread: Option<thread::JoinHandle<()>>,
    }

    impl TestCompositor {
        fn start(fd: OwnedFd, server: Option<Arc<WleglServer>>) -> Self {
            let stop = Arc::new(AtomicBool::new(false));
            let (ready_tx, ready_rx) = channel();
            let thread = {
                let stop = stop.clone();
                thread::spawn(move || unsafe {
                    let lib = wayland_server_option().unwrap();
                    let display = (lib.wl_display_create)();
                    let client = ffi_dispatch!(lib, wl_client_create, display, fd.into_raw_fd());
                    assert!(!client.is_null());
                    let transport = LibWaylandTransport::new();
                    if let Some(server) = server {
                        assert!(transport.advertise(Handle::from_ptr(display), server));
                    }
                    ready_tx.send(()).unwrap();

                    let event_loop = ffi_dispatch!(lib, wl_display_get_event_loop, display);
                    let deadline = Instant::now() + Duration::from_secs(10);
                    while !stop.load(Ordering::SeqCst) && Instant::now() < deadline {
                        ffi_dispatch!(lib, wl_event_loop_dispatch, event_loop, 10);
                        ffi_dispatch!(lib, wl_display_flush_clients, display);
                    }
                    transport.withdraw(Handle::from_ptr(display));
                    ffi_dispatch!(lib, wl_display_destroy, display);
                })
            };
            ready_rx.recv().unwrap();
            Self {
                stop,
                thread: Some(thread),
            }
        }
    }

    impl Drop for TestCompositor {
        fn drop(&mut self) {
            self.stop.store(true, Ordering::SeqCst);
            if let Some(thread) = self.thread.take() {
                let _ = thread.join();
            }
        }
    }

    fn libs_available() -> bool {
        wayland_client_option().is_some() && wayland_server_option().is_some()
    }

    fn client_display(fd: OwnedFd) -> *mut wl_display {
        let lib = wayland_client_option().unwrap();
        unsafe { ffi_dispatch!(lib, wl_display_connect_to_fd, fd.into_raw_fd()) }
    }

    fn wait_for(what: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if what() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_withdraw_unknown_display_is_noop() {
        let transport = LibWaylandTransport::new();
        transport.withdraw(Handle(0x1234));
        assert_eq!(transport.global_count(), 0);
    }

    #[test]
    fn test_connect_binds_advertised_global() {
        if !libs_available() {
            return;
        }
        let (server_fd, client_fd) = UnixStream::pair().unwrap();
        let server = Arc::new(WleglServer::new(Handle(0x10), Some(Arc::new(MemoryAllocator { fail: false }))));
        let _compositor = TestCompositor::start(server_fd.into(), Some(server.clone()));

        let display = client_display(client_fd.into());
        assert!(!display.is_null());
        let connector = LibWaylandConnector::new();
        connector.connect(Handle::from_ptr(display)).unwrap();
        assert!(connector.is_connected());

        // The display proxy stands in for a surface; only wlegl requests go out
        let mut native = WlEglWindow {
            version: 3,
            width: 64,
            height: 32,
            dx: 0,
            dy: 0,
            attached_width: 0,
            attached_height: 0,
            driver_private: ptr::null_mut(),
            resize_callback: None,
            destroy_window_callback: None,
            surface: display.cast(),
        };
        let mut window = connector.open_window(Handle::from_ptr(&mut native)).unwrap();
        assert_eq!((window.width, window.height), (64, 32));
        assert!(native.resize_callback.is_some());

        let conn = &mut window.connection;
        let (kept, _peer) = UnixStream::pair().unwrap();
        let handle = conn.create_handle(1, &[3, 4, 5]).unwrap();
        conn.handle_add_fd(handle, std::os::fd::AsFd::as_fd(&kept));
        let desc = BufferDesc {
            width: 64,
            height: 32,
            stride: 64,
            format: 1,
            usage: 0x300,
        };
        let wire = conn.create_buffer(&desc, handle).unwrap();
        conn.handle_destroy(handle);
        conn.flush().unwrap();
        assert!(wait_for(|| server.buffer_count() == 1 && server.handle_count() == 0));

        conn.buffer_destroy(wire);
        conn.flush().unwrap();
        assert!(wait_for(|| server.buffer_count() == 0));

        drop(window);
        assert!(native.driver_private.is_null());
        connector.disconnect();
        let lib = wayland_client_option().unwrap();
        unsafe { ffi_dispatch!(lib, wl_display_disconnect, display) };
    }

    #[test]
    fn test_connect_fails_without_global() {
        if !libs_available() {
            return;
        }
        let (server_fd, client_fd) = UnixStream::pair().unwrap();
        let _compositor = TestCompositor::start(server_fd.into(), None);

        let display = client_display(client_fd.into());
        let connector = LibWaylandConnector::new();
        let err = connector.connect(Handle::from_ptr(display)).unwrap_err();
        assert!(err.to_string().contains("cannot find android_wlegl"));
        assert!(!connector.is_connected());
        let lib = wayland_client_option().unwrap();
        unsafe { ffi_dispatch!(lib, wl_display_disconnect, display) };
    }
}

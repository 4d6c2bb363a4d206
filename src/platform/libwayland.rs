//! Wayland client connection over the system libwayland-client
//!
//! The connector binds `android_wlegl` on the application's display. Each
//! `wl_egl_window` then gets a private event queue with wrappers for the
//! display, `android_wlegl` and its surface, so buffer releases and frame
//! callbacks are only dispatched by the thread that swaps that window.

use std::collections::HashMap;
use std::ffi::{c_int, c_void, CStr};
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd};
use std::ptr;
use std::slice;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::{debug, error, info};
use wayland_sys::client::{wayland_client_option, wl_display, wl_event_queue, wl_proxy, WaylandClient};
use wayland_sys::common::{wl_argument, wl_array, wl_dispatcher_func_t, wl_interface, wl_message};
use wayland_sys::ffi_dispatch;

use super::wayland::{ClientEvent, ObjectId, WaylandConnection, WaylandConnector, WindowConnection};
use crate::error::Error;
use crate::gralloc::BufferDesc;
use crate::registry::{lock, Handle};
use crate::wlegl::protocol::{
    android_wlegl_handle_interface, android_wlegl_interface, interface, wl_buffer_interface,
    wl_callback_interface, wl_registry_interface, ANDROID_WLEGL_CREATE_BUFFER,
    ANDROID_WLEGL_CREATE_HANDLE, ANDROID_WLEGL_HANDLE_ADD_FD, ANDROID_WLEGL_HANDLE_DESTROY,
    ANDROID_WLEGL_NAME, ANDROID_WLEGL_VERSION, WL_BUFFER_DESTROY, WL_BUFFER_RELEASE,
    WL_CALLBACK_DONE, WL_DISPLAY_GET_REGISTRY, WL_DISPLAY_SYNC, WL_REGISTRY_BIND,
    WL_REGISTRY_GLOBAL, WL_SURFACE_ATTACH, WL_SURFACE_COMMIT, WL_SURFACE_DAMAGE, WL_SURFACE_FRAME,
};
use crate::Result;

/// `struct wl_egl_window` as laid out by libwayland-egl
#[repr(C)]
pub struct WlEglWindow {
    pub version: isize,
    pub width: c_int,
    pub height: c_int,
    pub dx: c_int,
    pub dy: c_int,
    pub attached_width: c_int,
    pub attached_height: c_int,
    pub driver_private: *mut c_void,
    pub resize_callback: Option<unsafe extern "C" fn(*mut WlEglWindow, *mut c_void)>,
    pub destroy_window_callback: Option<unsafe extern "C" fn(*mut c_void)>,
    pub surface: *mut c_void,
}

fn client_lib() -> Result<&'static WaylandClient> {
    wayland_client_option().ok_or_else(|| Error::LibraryOpen {
        path: "libwayland-client.so".into(),
        reason: "not loadable".into(),
    })
}

/// Wrapper of `proxy` whose events go to `queue`, or null
unsafe fn wrap(lib: &WaylandClient, proxy: *mut wl_proxy, queue: *mut wl_event_queue) -> *mut wl_proxy {
    if proxy.is_null() {
        return ptr::null_mut();
    }
    let wrapper: *mut wl_proxy = ffi_dispatch!(lib, wl_proxy_create_wrapper, proxy.cast()).cast();
    if !wrapper.is_null() {
        ffi_dispatch!(lib, wl_proxy_set_queue, wrapper, queue);
    }
    wrapper
}

// =============================================================================
// Display connection
// =============================================================================

struct Connection {
    display: *mut wl_display,
    own_display: bool,
    queue: *mut wl_event_queue,
    wrapper: *mut wl_proxy,
    wlegl: *mut wl_proxy,
}

// Only used under the connector's lock
unsafe impl Send for Connection {}

struct RegistryScan {
    lib: &'static WaylandClient,
    wlegl: *mut wl_proxy,
}

unsafe extern "C" fn registry_event(
    _implementation: *const c_void,
    target: *mut c_void,
    opcode: u32,
    _message: *const wl_message,
    args: *const wl_argument,
) -> c_int {
    if opcode != WL_REGISTRY_GLOBAL {
        return 0;
    }
    let registry: *mut wl_proxy = target.cast();
    let Some(lib) = wayland_client_option() else {
        return 0;
    };
    let scan = &mut *(ffi_dispatch!(lib, wl_proxy_get_user_data, registry) as *mut RegistryScan);

    let args = slice::from_raw_parts(args, 3);
    let (name, advertised, version) = (args[0].u, CStr::from_ptr(args[1].s), args[2].u);
    if advertised != ANDROID_WLEGL_NAME || !scan.wlegl.is_null() {
        return 0;
    }

    let version = version.min(ANDROID_WLEGL_VERSION);
    let mut bind = [
        wl_argument { u: name },
        wl_argument { s: ANDROID_WLEGL_NAME.as_ptr() },
        wl_argument { u: version },
        wl_argument { n: 0 },
    ];
    scan.wlegl = ffi_dispatch!(
        scan.lib,
        wl_proxy_marshal_array_constructor_versioned,
        registry,
        WL_REGISTRY_BIND,
        bind.as_mut_ptr(),
        interface(&android_wlegl_interface),
        version
    )
    .cast();
    debug!("bound android_wlegl v{} (global {})", version, name);
    0
}

impl Connection {
    /// Connect (null: the default display) and bind `android_wlegl` on a
    /// private queue
    unsafe fn open(lib: &'static WaylandClient, display: Handle) -> Result<Self> {
        let own_display = display.is_null();
        let display: *mut wl_display = if own_display {
            ffi_dispatch!(lib, wl_display_connect, ptr::null())
        } else {
            display.as_ptr().cast()
        };
        if display.is_null() {
            return Err(Error::Wayland("cannot connect to the default display".into()));
        }

        let queue = ffi_dispatch!(lib, wl_display_create_queue, display);
        let mut conn = Connection {
            display,
            own_display,
            queue,
            wrapper: ptr::null_mut(),
            wlegl: ptr::null_mut(),
        };
        if queue.is_null() {
            conn.close(lib);
            return Err(Error::Wayland("cannot create the display queue".into()));
        }
        conn.wrapper = wrap(lib, display.cast(), queue);
        if conn.wrapper.is_null() {
            conn.close(lib);
            return Err(Error::Wayland("cannot wrap the display".into()));
        }

        let mut args = [wl_argument { n: 0 }];
        let registry: *mut wl_proxy = ffi_dispatch!(
            lib,
            wl_proxy_marshal_array_constructor,
            conn.wrapper,
            WL_DISPLAY_GET_REGISTRY,
            args.as_mut_ptr(),
            interface(&wl_registry_interface)
        )
        .cast();
        if registry.is_null() {
            conn.close(lib);
            return Err(Error::Wayland("cannot get the registry".into()));
        }

        let mut scan = RegistryScan {
            lib,
            wlegl: ptr::null_mut(),
        };
        ffi_dispatch!(
            lib,
            wl_proxy_add_dispatcher,
            registry,
            registry_event,
            ptr::null(),
            &mut scan as *mut RegistryScan as *mut c_void
        );
        let rval = ffi_dispatch!(lib, wl_display_roundtrip_queue, display, queue);
        let roundtrip = io::Error::last_os_error();
        // The scan lives on this stack frame; no registry events after here
        ffi_dispatch!(lib, wl_proxy_destroy, registry);
        conn.wlegl = scan.wlegl;

        if rval < 0 {
            conn.close(lib);
            return Err(Error::Io(roundtrip));
        }
        if conn.wlegl.is_null() {
            conn.close(lib);
            return Err(Error::Wayland("cannot find android_wlegl".into()));
        }
        Ok(conn)
    }

    unsafe fn close(self, lib: &WaylandClient) {
        if !self.wlegl.is_null() {
            ffi_dispatch!(lib, wl_proxy_destroy, self.wlegl);
        }
        if !self.wrapper.is_null() {
            ffi_dispatch!(lib, wl_proxy_wrapper_destroy, self.wrapper.cast());
        }
        if !self.queue.is_null() {
            ffi_dispatch!(lib, wl_event_queue_destroy, self.queue);
        }
        if self.own_display {
            ffi_dispatch!(lib, wl_display_disconnect, self.display);
        }
    }
}

/// [`WaylandConnector`] over the system libwayland-client, one per display
#[derive(Default)]
pub struct LibWaylandConnector {
    connection: Mutex<Option<Connection>>,
}

impl LibWaylandConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.connection).is_some()
    }
}

impl WaylandConnector for LibWaylandConnector {
    fn connect(&self, display: Handle) -> Result<()> {
        let lib = client_lib()?;
        let mut connection = lock(&self.connection);
        if connection.is_some() {
            return Ok(());
        }
        *connection = Some(unsafe { Connection::open(lib, display)? });
        let dpy = display;
        info!("android_wlegl bound on wayland display {:?}", dpy);
        Ok(())
    }

    fn disconnect(&self) {
        let Some(conn) = lock(&self.connection).take() else {
            return;
        };
        if let Some(lib) = wayland_client_option() {
            unsafe { conn.close(lib) };
        }
    }

    fn open_window(&self, native: Handle) -> Option<WindowConnection> {
        let lib = wayland_client_option()?;
        let connection = lock(&self.connection);
        let Some(conn) = connection.as_ref() else {
            error!("open_window on a display that is not connected");
            return None;
        };
        if native.is_null() {
            return None;
        }
        unsafe { LibWaylandWindow::open(lib, conn, native.as_ptr().cast()) }
    }
}

impl Drop for LibWaylandConnector {
    fn drop(&mut self) {
        self.disconnect();
    }
}

// =============================================================================
// Window queue
// =============================================================================

/// Events collected by the dispatchers until the window thread takes them
#[derive(Default)]
struct WindowHooks {
    events: Mutex<Vec<ClientEvent>>,
    /// The application destroyed its `wl_egl_window`
    gone: AtomicBool,
}

impl WindowHooks {
    fn push(&self, event: ClientEvent) {
        lock(&self.events).push(event);
    }
}

unsafe extern "C" fn window_resized(window: *mut WlEglWindow, private: *mut c_void) {
    let hooks = &*(private as *const WindowHooks);
    hooks.push(ClientEvent::Resized {
        width: (*window).width,
        height: (*window).height,
    });
}

unsafe extern "C" fn window_destroyed(private: *mut c_void) {
    let hooks = &*(private as *const WindowHooks);
    hooks.gone.store(true, Ordering::SeqCst);
    hooks.push(ClientEvent::WindowDestroyed);
}

unsafe fn object_event(target: *mut c_void, event: fn(ObjectId) -> ClientEvent) {
    let Some(lib) = wayland_client_option() else {
        return;
    };
    let proxy: *mut wl_proxy = target.cast();
    let hooks = &*(ffi_dispatch!(lib, wl_proxy_get_user_data, proxy) as *const WindowHooks);
    hooks.push(event(ObjectId(ffi_dispatch!(lib, wl_proxy_get_id, proxy))));
}

unsafe extern "C" fn buffer_event(
    _implementation: *const c_void,
    target: *mut c_void,
    opcode: u32,
    _message: *const wl_message,
    _args: *const wl_argument,
) -> c_int {
    if opcode == WL_BUFFER_RELEASE {
        object_event(target, ClientEvent::BufferRelease);
    }
    0
}

unsafe extern "C" fn callback_event(
    _implementation: *const c_void,
    target: *mut c_void,
    opcode: u32,
    _message: *const wl_message,
    _args: *const wl_argument,
) -> c_int {
    if opcode == WL_CALLBACK_DONE {
        object_event(target, ClientEvent::CallbackDone);
    }
    0
}

/// One `wl_egl_window` bound to its own event queue
pub struct LibWaylandWindow {
    lib: &'static WaylandClient,
    display: *mut wl_display,
    queue: *mut wl_event_queue,
    display_wrapper: *mut wl_proxy,
    wlegl: *mut wl_proxy,
    surface: *mut wl_proxy,
    window: *mut WlEglWindow,
    hooks: Box<WindowHooks>,
    objects: HashMap<ObjectId, *mut wl_proxy>,
}

// Owned by one WaylandWindow and only used under its connection lock
unsafe impl Send for LibWaylandWindow {}

impl LibWaylandWindow {
    unsafe fn open(
        lib: &'static WaylandClient,
        conn: &Connection,
        window: *mut WlEglWindow,
    ) -> Option<WindowConnection> {
        let queue = ffi_dispatch!(lib, wl_display_create_queue, conn.display);
        if queue.is_null() {
            error!("cannot create the surface queue");
            return None;
        }
        let this = LibWaylandWindow {
            lib,
            display: conn.display,
            queue,
            display_wrapper: wrap(lib, conn.display.cast(), queue),
            wlegl: wrap(lib, conn.wlegl, queue),
            surface: wrap(lib, (*window).surface.cast(), queue),
            window,
            hooks: Box::default(),
            objects: HashMap::new(),
        };
        if this.display_wrapper.is_null() || this.wlegl.is_null() || this.surface.is_null() {
            error!("cannot wrap the proxies of wl_egl_window {:p}", window);
            return None;
        }

        (*window).driver_private = &*this.hooks as *const WindowHooks as *mut c_void;
        (*window).resize_callback = Some(window_resized);
        (*window).destroy_window_callback = Some(window_destroyed);

        let (width, height) = ((*window).width, (*window).height);
        debug!("wl_egl_window {:p} on its own queue, {}x{}", window, width, height);
        Some(WindowConnection {
            connection: Box::new(this),
            width,
            height,
        })
    }

    unsafe fn request(&self, proxy: *mut wl_proxy, opcode: u32, args: &mut [wl_argument]) {
        ffi_dispatch!(self.lib, wl_proxy_marshal_array, proxy, opcode, args.as_mut_ptr());
    }

    unsafe fn create(
        &mut self,
        proxy: *mut wl_proxy,
        opcode: u32,
        args: &mut [wl_argument],
        iface: *const wl_interface,
        dispatcher: Option<wl_dispatcher_func_t>,
    ) -> Option<ObjectId> {
        let object: *mut wl_proxy = ffi_dispatch!(
            self.lib,
            wl_proxy_marshal_array_constructor,
            proxy,
            opcode,
            args.as_mut_ptr(),
            iface
        )
        .cast();
        if object.is_null() {
            return None;
        }
        if let Some(dispatcher) = dispatcher {
            let hooks = &*self.hooks as *const WindowHooks as *mut c_void;
            ffi_dispatch!(self.lib, wl_proxy_add_dispatcher, object, dispatcher, ptr::null(), hooks);
        }
        let id = ObjectId(ffi_dispatch!(self.lib, wl_proxy_get_id, object));
        self.objects.insert(id, object);
        Some(id)
    }

    fn destroy_object(&mut self, id: ObjectId) {
        if let Some(proxy) = self.objects.remove(&id) {
            unsafe { ffi_dispatch!(self.lib, wl_proxy_destroy, proxy) };
        }
    }

    fn object(&self, id: ObjectId) -> *mut wl_proxy {
        self.objects.get(&id).copied().unwrap_or(ptr::null_mut())
    }

    /// Collected events; finished callbacks are destroyed here
    fn take_events(&mut self) -> Vec<ClientEvent> {
        let events = std::mem::take(&mut *lock(&self.hooks.events));
        for event in &events {
            if let ClientEvent::CallbackDone(callback) = event {
                self.destroy_object(*callback);
            }
        }
        events
    }

    fn callback(&mut self, proxy: *mut wl_proxy, opcode: u32) -> ObjectId {
        let mut args = [wl_argument { n: 0 }];
        let iface = interface(&wl_callback_interface);
        match unsafe { self.create(proxy, opcode, &mut args, iface, Some(callback_event)) } {
            Some(id) => id,
            None => {
                error!("cannot create wl_callback (opcode {})", opcode);
                ObjectId(0)
            }
        }
    }
}

impl WaylandConnection for LibWaylandWindow {
    fn dispatch(&mut self) -> io::Result<Vec<ClientEvent>> {
        let pending = self.take_events();
        if !pending.is_empty() {
            return Ok(pending);
        }
        if unsafe { ffi_dispatch!(self.lib, wl_display_dispatch_queue, self.display, self.queue) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(self.take_events())
    }

    fn dispatch_pending(&mut self) -> io::Result<Vec<ClientEvent>> {
        if unsafe { ffi_dispatch!(self.lib, wl_display_dispatch_queue_pending, self.display, self.queue) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(self.take_events())
    }

    fn create_handle(&mut self, num_fds: i32, ints: &[c_int]) -> Option<ObjectId> {
        let mut array = wl_array {
            size: std::mem::size_of_val(ints),
            alloc: std::mem::size_of_val(ints),
            data: ints.as_ptr() as *mut c_void,
        };
        let mut args = [
            wl_argument { n: 0 },
            wl_argument { i: num_fds },
            wl_argument { a: &mut array },
        ];
        let iface = interface(&android_wlegl_handle_interface);
        unsafe { self.create(self.wlegl, ANDROID_WLEGL_CREATE_HANDLE, &mut args, iface, None) }
    }

    fn handle_add_fd(&mut self, handle: ObjectId, fd: BorrowedFd<'_>) {
        let proxy = self.object(handle);
        if proxy.is_null() {
            return;
        }
        // libwayland duplicates the fd while marshalling
        let mut args = [wl_argument { h: fd.as_raw_fd() }];
        unsafe { self.request(proxy, ANDROID_WLEGL_HANDLE_ADD_FD, &mut args) };
    }

    fn handle_destroy(&mut self, handle: ObjectId) {
        let proxy = self.object(handle);
        if proxy.is_null() {
            return;
        }
        unsafe { self.request(proxy, ANDROID_WLEGL_HANDLE_DESTROY, &mut []) };
        self.destroy_object(handle);
    }

    fn create_buffer(&mut self, desc: &BufferDesc, handle: ObjectId) -> Option<ObjectId> {
        let handle = self.object(handle);
        if handle.is_null() {
            return None;
        }
        let mut args = [
            wl_argument { n: 0 },
            wl_argument { i: desc.width as i32 },
            wl_argument { i: desc.height as i32 },
            wl_argument { i: desc.stride as i32 },
            wl_argument { i: desc.format as i32 },
            wl_argument { i: desc.usage as i32 },
            wl_argument { o: handle as *const c_void },
        ];
        let iface = interface(&wl_buffer_interface);
        unsafe {
            self.create(self.wlegl, ANDROID_WLEGL_CREATE_BUFFER, &mut args, iface, Some(buffer_event))
        }
    }

    fn buffer_destroy(&mut self, buffer: ObjectId) {
        let proxy = self.object(buffer);
        if proxy.is_null() {
            return;
        }
        unsafe { self.request(proxy, WL_BUFFER_DESTROY, &mut []) };
        self.destroy_object(buffer);
    }

    fn surface_attach(&mut self, buffer: ObjectId, x: i32, y: i32) {
        let mut args = [
            wl_argument { o: self.object(buffer) as *const c_void },
            wl_argument { i: x },
            wl_argument { i: y },
        ];
        unsafe { self.request(self.surface, WL_SURFACE_ATTACH, &mut args) };
    }

    fn surface_damage(&mut self, x: i32, y: i32, width: i32, height: i32) {
        let mut args = [
            wl_argument { i: x },
            wl_argument { i: y },
            wl_argument { i: width },
            wl_argument { i: height },
        ];
        unsafe { self.request(self.surface, WL_SURFACE_DAMAGE, &mut args) };
    }

    fn surface_frame(&mut self) -> ObjectId {
        self.callback(self.surface, WL_SURFACE_FRAME)
    }

    fn surface_commit(&mut self) {
        unsafe { self.request(self.surface, WL_SURFACE_COMMIT, &mut []) };
    }

    fn display_sync(&mut self) -> ObjectId {
        self.callback(self.display_wrapper, WL_DISPLAY_SYNC)
    }

    fn set_attached_size(&mut self, width: i32, height: i32) {
        if self.hooks.gone.load(Ordering::SeqCst) {
            return;
        }
        unsafe {
            (*self.window).attached_width = width;
            (*self.window).attached_height = height;
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if unsafe { ffi_dispatch!(self.lib, wl_display_flush, self.display) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl Drop for LibWaylandWindow {
    fn drop(&mut self) {
        let objects: Vec<ObjectId> = self.objects.keys().copied().collect();
        for id in objects {
            self.destroy_object(id);
        }
        unsafe {
            for wrapper in [self.surface, self.wlegl, self.display_wrapper] {
                if !wrapper.is_null() {
                    ffi_dispatch!(self.lib, wl_proxy_wrapper_destroy, wrapper.cast());
                }
            }
            ffi_dispatch!(self.lib, wl_event_queue_destroy, self.queue);

            if self.hooks.gone.load(Ordering::SeqCst) {
                return;
            }
            let window = &mut *self.window;
            if window.driver_private == &*self.hooks as *const WindowHooks as *mut c_void {
                window.driver_private = ptr::null_mut();
                window.resize_callback = None;
                window.destroy_window_callback = None;
            }
        }
        debug!("surface queue of wl_egl_window {:p} closed", self.window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    fn window(width: c_int, height: c_int) -> WlEglWindow {
        WlEglWindow {
            version: 3,
            width,
            height,
            dx: 0,
            dy: 0,
            attached_width: 0,
            attached_height: 0,
            driver_private: ptr::null_mut(),
            resize_callback: None,
            destroy_window_callback: None,
            surface: ptr::null_mut(),
        }
    }

    #[test]
    fn test_wl_egl_window_layout() {
        let word = std::mem::size_of::<usize>();
        assert_eq!(offset_of!(WlEglWindow, width), word);
        assert_eq!(offset_of!(WlEglWindow, attached_height), word + 20);
        assert_eq!(offset_of!(WlEglWindow, driver_private), (word + 24).next_multiple_of(word));
        assert_eq!(
            offset_of!(WlEglWindow, surface),
            offset_of!(WlEglWindow, driver_private) + 3 * word
        );
    }

    #[test]
    fn test_window_hooks_record_events() {
        let hooks = WindowHooks::default();
        let private = &hooks as *const WindowHooks as *mut c_void;
        let mut native = window(10, 20);
        native.width = 300;
        native.height = 200;
        unsafe {
            window_resized(&mut native, private);
            window_destroyed(private);
        }
        assert!(hooks.gone.load(Ordering::SeqCst));
        assert_eq!(
            *hooks.events.lock().unwrap(),
            vec![
                ClientEvent::Resized {
                    width: 300,
                    height: 200
                },
                ClientEvent::WindowDestroyed
            ]
        );
    }

    #[test]
    fn test_open_window_requires_connection() {
        let connector = LibWaylandConnector::new();
        let mut native = window(16, 16);
        assert!(connector.open_window(Handle::from_ptr(&mut native)).is_none());
        assert!(native.driver_private.is_null());
        assert!(!connector.is_connected());
        connector.disconnect();
    }
}

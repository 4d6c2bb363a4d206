//! `wl_interface` tables for `android_wlegl` and the core interfaces its
//! requests create, laid out for libwayland's closure marshaller
//!
//! Both halves go through libwayland directly: the client marshals on
//! proxies owned by the application's `wl_display`, the server registers
//! on the compositor's `wl_display`. Neither connection is ours to wrap in
//! a Rust backend, so the tables are declared here.

#![allow(non_upper_case_globals)]

use std::ffi::CStr;
use std::ptr;

use wayland_sys::common::{wl_interface, wl_message};

/// Static table shared with libwayland, which only ever reads it
#[repr(transparent)]
pub struct Shared<T>(pub T);

unsafe impl<T> Sync for Shared<T> {}

const NONE: *const wl_interface = ptr::null();

pub const ANDROID_WLEGL_NAME: &CStr = c"android_wlegl";
pub const ANDROID_WLEGL_VERSION: u32 = 1;

// android_wlegl requests
pub const ANDROID_WLEGL_CREATE_HANDLE: u32 = 0;
pub const ANDROID_WLEGL_CREATE_BUFFER: u32 = 1;
// android_wlegl_handle requests
pub const ANDROID_WLEGL_HANDLE_ADD_FD: u32 = 0;
pub const ANDROID_WLEGL_HANDLE_DESTROY: u32 = 1;
// wl_buffer
pub const WL_BUFFER_DESTROY: u32 = 0;
pub const WL_BUFFER_RELEASE: u32 = 0;
// wl_callback
pub const WL_CALLBACK_DONE: u32 = 0;
// wl_display
pub const WL_DISPLAY_SYNC: u32 = 0;
pub const WL_DISPLAY_GET_REGISTRY: u32 = 1;
// wl_registry
pub const WL_REGISTRY_BIND: u32 = 0;
pub const WL_REGISTRY_GLOBAL: u32 = 0;
// wl_surface
pub const WL_SURFACE_ATTACH: u32 = 1;
pub const WL_SURFACE_DAMAGE: u32 = 2;
pub const WL_SURFACE_FRAME: u32 = 3;
pub const WL_SURFACE_COMMIT: u32 = 6;

const fn message(name: &'static CStr, signature: &'static CStr, types: *const *const wl_interface) -> wl_message {
    wl_message {
        name: name.as_ptr(),
        signature: signature.as_ptr(),
        types,
    }
}

static NULL_TYPES: Shared<[*const wl_interface; 6]> = Shared([NONE; 6]);

// =============================================================================
// android_wlegl
// =============================================================================

static CREATE_HANDLE_TYPES: Shared<[*const wl_interface; 3]> =
    Shared([&android_wlegl_handle_interface.0 as *const wl_interface, NONE, NONE]);

static CREATE_BUFFER_TYPES: Shared<[*const wl_interface; 7]> = Shared([
    &wl_buffer_interface.0 as *const wl_interface,
    NONE,
    NONE,
    NONE,
    NONE,
    NONE,
    &android_wlegl_handle_interface.0 as *const wl_interface,
]);

static ANDROID_WLEGL_REQUESTS: Shared<[wl_message; 2]> = Shared([
    message(c"create_handle", c"nia", CREATE_HANDLE_TYPES.0.as_ptr()),
    message(c"create_buffer", c"niiiiio", CREATE_BUFFER_TYPES.0.as_ptr()),
]);

pub static android_wlegl_interface: Shared<wl_interface> = Shared(wl_interface {
    name: ANDROID_WLEGL_NAME.as_ptr(),
    version: ANDROID_WLEGL_VERSION as i32,
    request_count: 2,
    requests: ANDROID_WLEGL_REQUESTS.0.as_ptr(),
    event_count: 0,
    events: ptr::null(),
});

static ANDROID_WLEGL_HANDLE_REQUESTS: Shared<[wl_message; 2]> = Shared([
    message(c"add_fd", c"h", NULL_TYPES.0.as_ptr()),
    message(c"destroy", c"", NULL_TYPES.0.as_ptr()),
]);

pub static android_wlegl_handle_interface: Shared<wl_interface> = Shared(wl_interface {
    name: c"android_wlegl_handle".as_ptr(),
    version: ANDROID_WLEGL_VERSION as i32,
    request_count: 2,
    requests: ANDROID_WLEGL_HANDLE_REQUESTS.0.as_ptr(),
    event_count: 0,
    events: ptr::null(),
});

// =============================================================================
// Core interfaces created by our requests
// =============================================================================

static WL_BUFFER_REQUESTS: Shared<[wl_message; 1]> = Shared([message(c"destroy", c"", NULL_TYPES.0.as_ptr())]);
static WL_BUFFER_EVENTS: Shared<[wl_message; 1]> = Shared([message(c"release", c"", NULL_TYPES.0.as_ptr())]);

pub static wl_buffer_interface: Shared<wl_interface> = Shared(wl_interface {
    name: c"wl_buffer".as_ptr(),
    version: 1,
    request_count: 1,
    requests: WL_BUFFER_REQUESTS.0.as_ptr(),
    event_count: 1,
    events: WL_BUFFER_EVENTS.0.as_ptr(),
});

static WL_CALLBACK_EVENTS: Shared<[wl_message; 1]> = Shared([message(c"done", c"u", NULL_TYPES.0.as_ptr())]);

pub static wl_callback_interface: Shared<wl_interface> = Shared(wl_interface {
    name: c"wl_callback".as_ptr(),
    version: 1,
    request_count: 0,
    requests: ptr::null(),
    event_count: 1,
    events: WL_CALLBACK_EVENTS.0.as_ptr(),
});

static WL_REGISTRY_REQUESTS: Shared<[wl_message; 1]> = Shared([message(c"bind", c"usun", NULL_TYPES.0.as_ptr())]);
static WL_REGISTRY_EVENTS: Shared<[wl_message; 2]> = Shared([
    message(c"global", c"usu", NULL_TYPES.0.as_ptr()),
    message(c"global_remove", c"u", NULL_TYPES.0.as_ptr()),
]);

pub static wl_registry_interface: Shared<wl_interface> = Shared(wl_interface {
    name: c"wl_registry".as_ptr(),
    version: 1,
    request_count: 1,
    requests: WL_REGISTRY_REQUESTS.0.as_ptr(),
    event_count: 2,
    events: WL_REGISTRY_EVENTS.0.as_ptr(),
});

/// Interface pointer as libwayland takes it
pub fn interface(table: &'static Shared<wl_interface>) -> *const wl_interface {
    &table.0
}

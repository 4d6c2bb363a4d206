//! C API: the EGL entry points applications link against
//!
//! Every export forwards to the process-wide [`DispatchRuntime`], created
//! on first use from the environment configuration and the system driver.
//! Attribute lists are decoded here so the runtime only sees [`AttribList`].

#![allow(non_snake_case)]

use std::ffi::{c_char, c_void, CStr};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::{debug, info};

use crate::attribs::AttribList;
use crate::config::Config;
use crate::dispatch::WindowSurfaceCall;
use crate::ffi::*;
use crate::gl_api;
use crate::gralloc;
use crate::loader::Driver;
use crate::logging;
use crate::platform::{DefaultPlatforms, LibWaylandConnector, PlatformAdapter, PlatformFactory, WaylandConnector};
use crate::registry::{lock, DispatchRuntime, Handle};
use crate::wlegl::{LibWaylandTransport, WleglTransport};

/// Library constructor, runs when the shim is loaded
#[used]
#[link_section = ".init_array"]
static LIBRARY_INIT: unsafe extern "C" fn() = library_init;

unsafe extern "C" fn library_init() {
    logging::init(Config::global());
    debug!("egl-wrapper-shim loaded");
}

// =============================================================================
// Process-wide runtime
// =============================================================================

static RUNTIME: OnceLock<DispatchRuntime> = OnceLock::new();
static WAYLAND_CONNECTOR: Mutex<Option<Arc<dyn WaylandConnector>>> = Mutex::new(None);

/// Platform factory backed by the connector installed when a display is
/// created, or a libwayland-client connection of its own
struct InstalledPlatforms;

impl InstalledPlatforms {
    fn connector() -> Arc<dyn WaylandConnector> {
        lock(&WAYLAND_CONNECTOR)
            .clone()
            .unwrap_or_else(|| Arc::new(LibWaylandConnector::new()))
    }
}

impl PlatformFactory for InstalledPlatforms {
    fn create(&self, platform: EGLenum, native: Handle) -> Option<Arc<dyn PlatformAdapter>> {
        DefaultPlatforms::new(Some(Self::connector()), gralloc::global()).create(platform, native)
    }
}

pub(crate) fn runtime() -> &'static DispatchRuntime {
    RUNTIME.get_or_init(|| {
        info!("loading system EGL driver");
        DispatchRuntime::new(Driver::load(), Config::global().clone())
            .with_platforms(Box::new(InstalledPlatforms))
            .with_allocator(gralloc::global())
            .with_wlegl_transport(Some(Arc::new(LibWaylandTransport::new())))
    })
}

/// Connect Wayland displays through `connector` instead of the system
/// libwayland-client. Applies to displays created after the call.
pub fn install_wayland_connector(connector: Arc<dyn WaylandConnector>) {
    *lock(&WAYLAND_CONNECTOR) = Some(connector);
}

/// Publish `android_wlegl` through `transport` instead of the system
/// libwayland-server on `eglBindWaylandDisplayWL`
pub fn install_wlegl_transport(transport: Arc<dyn WleglTransport>) {
    runtime().set_wlegl_transport(Some(transport));
}

// =============================================================================
// EGL 1.0 - 1.4
// =============================================================================

#[no_mangle]
pub unsafe extern "C" fn eglGetDisplay(display_id: EGLNativeDisplayType) -> EGLDisplay {
    runtime().get_display(display_id)
}

#[no_mangle]
pub unsafe extern "C" fn eglInitialize(dpy: EGLDisplay, major: *mut EGLint, minor: *mut EGLint) -> EGLBoolean {
    runtime().initialize(dpy, major, minor)
}

#[no_mangle]
pub unsafe extern "C" fn eglTerminate(dpy: EGLDisplay) -> EGLBoolean {
    runtime().terminate(dpy)
}

#[no_mangle]
pub unsafe extern "C" fn eglGetError() -> EGLint {
    runtime().get_error()
}

#[no_mangle]
pub unsafe extern "C" fn eglQueryString(dpy: EGLDisplay, name: EGLint) -> *const c_char {
    runtime().query_string(dpy, name)
}

#[no_mangle]
pub unsafe extern "C" fn eglGetProcAddress(procname: *const c_char) -> EGLFuncPtr {
    if procname.is_null() {
        return std::ptr::null_mut();
    }
    let name = CStr::from_ptr(procname);
    if let Some(addr) = builtin_proc_address(name) {
        return addr;
    }
    runtime().driver_proc_address(name)
}

#[no_mangle]
pub unsafe extern "C" fn eglGetConfigs(
    dpy: EGLDisplay,
    configs: *mut EGLConfig,
    config_size: EGLint,
    num_config: *mut EGLint,
) -> EGLBoolean {
    runtime().get_configs(dpy, configs, config_size, num_config)
}

#[no_mangle]
pub unsafe extern "C" fn eglChooseConfig(
    dpy: EGLDisplay,
    attrib_list: *const EGLint,
    configs: *mut EGLConfig,
    config_size: EGLint,
    num_config: *mut EGLint,
) -> EGLBoolean {
    runtime().choose_config(dpy, attrib_list, configs, config_size, num_config)
}

#[no_mangle]
pub unsafe extern "C" fn eglGetConfigAttrib(
    dpy: EGLDisplay,
    config: EGLConfig,
    attribute: EGLint,
    value: *mut EGLint,
) -> EGLBoolean {
    runtime().get_config_attrib(dpy, config, attribute, value)
}

#[no_mangle]
pub unsafe extern "C" fn eglCreateWindowSurface(
    dpy: EGLDisplay,
    config: EGLConfig,
    win: EGLNativeWindowType,
    attrib_list: *const EGLint,
) -> EGLSurface {
    let attribs = AttribList::from_ints(attrib_list);
    runtime().create_window_surface(dpy, config, win, &attribs, WindowSurfaceCall::Legacy)
}

#[no_mangle]
pub unsafe extern "C" fn eglCreatePbufferSurface(
    dpy: EGLDisplay,
    config: EGLConfig,
    attrib_list: *const EGLint,
) -> EGLSurface {
    runtime().create_pbuffer_surface(dpy, config, attrib_list)
}

#[no_mangle]
pub unsafe extern "C" fn eglCreatePixmapSurface(
    dpy: EGLDisplay,
    config: EGLConfig,
    pixmap: EGLNativePixmapType,
    attrib_list: *const EGLint,
) -> EGLSurface {
    runtime().create_pixmap_surface(dpy, config, pixmap, attrib_list)
}

#[no_mangle]
pub unsafe extern "C" fn eglDestroySurface(dpy: EGLDisplay, surface: EGLSurface) -> EGLBoolean {
    runtime().destroy_surface(dpy, surface)
}

#[no_mangle]
pub unsafe extern "C" fn eglQuerySurface(
    dpy: EGLDisplay,
    surface: EGLSurface,
    attribute: EGLint,
    value: *mut EGLint,
) -> EGLBoolean {
    runtime().query_surface(dpy, surface, attribute, value)
}

#[no_mangle]
pub unsafe extern "C" fn eglCreateContext(
    dpy: EGLDisplay,
    config: EGLConfig,
    share_context: EGLContext,
    attrib_list: *const EGLint,
) -> EGLContext {
    let attribs = AttribList::from_ints(attrib_list);
    runtime().create_context(dpy, config, share_context, &attribs)
}

#[no_mangle]
pub unsafe extern "C" fn eglDestroyContext(dpy: EGLDisplay, ctx: EGLContext) -> EGLBoolean {
    runtime().destroy_context(dpy, ctx)
}

#[no_mangle]
pub unsafe extern "C" fn eglMakeCurrent(
    dpy: EGLDisplay,
    draw: EGLSurface,
    read: EGLSurface,
    ctx: EGLContext,
) -> EGLBoolean {
    runtime().make_current(dpy, draw, read, ctx)
}

#[no_mangle]
pub unsafe extern "C" fn eglGetCurrentContext() -> EGLContext {
    runtime().get_current_context()
}

#[no_mangle]
pub unsafe extern "C" fn eglGetCurrentSurface(readdraw: EGLint) -> EGLSurface {
    runtime().get_current_surface(readdraw)
}

#[no_mangle]
pub unsafe extern "C" fn eglGetCurrentDisplay() -> EGLDisplay {
    runtime().get_current_display()
}

#[no_mangle]
pub unsafe extern "C" fn eglQueryContext(
    dpy: EGLDisplay,
    ctx: EGLContext,
    attribute: EGLint,
    value: *mut EGLint,
) -> EGLBoolean {
    runtime().query_context(dpy, ctx, attribute, value)
}

#[no_mangle]
pub unsafe extern "C" fn eglWaitGL() -> EGLBoolean {
    runtime().wait_gl()
}

#[no_mangle]
pub unsafe extern "C" fn eglWaitNative(engine: EGLint) -> EGLBoolean {
    runtime().wait_native(engine)
}

#[no_mangle]
pub unsafe extern "C" fn eglSwapBuffers(dpy: EGLDisplay, surface: EGLSurface) -> EGLBoolean {
    runtime().swap_buffers(dpy, surface)
}

#[no_mangle]
pub unsafe extern "C" fn eglCopyBuffers(
    dpy: EGLDisplay,
    surface: EGLSurface,
    target: EGLNativePixmapType,
) -> EGLBoolean {
    runtime().copy_buffers(dpy, surface, target)
}

#[no_mangle]
pub unsafe extern "C" fn eglSurfaceAttrib(
    dpy: EGLDisplay,
    surface: EGLSurface,
    attribute: EGLint,
    value: EGLint,
) -> EGLBoolean {
    runtime().surface_attrib(dpy, surface, attribute, value)
}

#[no_mangle]
pub unsafe extern "C" fn eglBindTexImage(dpy: EGLDisplay, surface: EGLSurface, buffer: EGLint) -> EGLBoolean {
    runtime().bind_tex_image(dpy, surface, buffer)
}

#[no_mangle]
pub unsafe extern "C" fn eglReleaseTexImage(dpy: EGLDisplay, surface: EGLSurface, buffer: EGLint) -> EGLBoolean {
    runtime().release_tex_image(dpy, surface, buffer)
}

#[no_mangle]
pub unsafe extern "C" fn eglSwapInterval(dpy: EGLDisplay, interval: EGLint) -> EGLBoolean {
    runtime().swap_interval(dpy, interval)
}

#[no_mangle]
pub unsafe extern "C" fn eglBindAPI(api: EGLenum) -> EGLBoolean {
    runtime().bind_api(api)
}

#[no_mangle]
pub unsafe extern "C" fn eglQueryAPI() -> EGLenum {
    runtime().query_api()
}

#[no_mangle]
pub unsafe extern "C" fn eglWaitClient() -> EGLBoolean {
    runtime().wait_client()
}

#[no_mangle]
pub unsafe extern "C" fn eglReleaseThread() -> EGLBoolean {
    runtime().release_thread()
}

#[no_mangle]
pub unsafe extern "C" fn eglCreatePbufferFromClientBuffer(
    dpy: EGLDisplay,
    buftype: EGLenum,
    buffer: EGLClientBuffer,
    config: EGLConfig,
    attrib_list: *const EGLint,
) -> EGLSurface {
    runtime().create_pbuffer_from_client_buffer(dpy, buftype, buffer, config, attrib_list)
}

// =============================================================================
// EGL 1.5
// =============================================================================

#[no_mangle]
pub unsafe extern "C" fn eglGetPlatformDisplay(
    platform: EGLenum,
    native_display: *mut c_void,
    attrib_list: *const EGLAttrib,
) -> EGLDisplay {
    let attribs = AttribList::from_attribs(attrib_list);
    runtime().get_platform_display(platform, native_display, &attribs)
}

#[no_mangle]
pub unsafe extern "C" fn eglCreatePlatformWindowSurface(
    dpy: EGLDisplay,
    config: EGLConfig,
    native_window: *mut c_void,
    attrib_list: *const EGLAttrib,
) -> EGLSurface {
    let attribs = AttribList::from_attribs(attrib_list);
    runtime().create_window_surface(dpy, config, native_window, &attribs, WindowSurfaceCall::Platform)
}

#[no_mangle]
pub unsafe extern "C" fn eglCreatePlatformPixmapSurface(
    dpy: EGLDisplay,
    config: EGLConfig,
    native_pixmap: *mut c_void,
    attrib_list: *const EGLAttrib,
) -> EGLSurface {
    runtime().create_platform_pixmap_surface(dpy, config, native_pixmap, attrib_list)
}

#[no_mangle]
pub unsafe extern "C" fn eglCreateSync(dpy: EGLDisplay, type_: EGLenum, attrib_list: *const EGLAttrib) -> EGLSync {
    let attribs = AttribList::from_attribs(attrib_list);
    runtime().create_sync(dpy, type_, &attribs)
}

#[no_mangle]
pub unsafe extern "C" fn eglDestroySync(dpy: EGLDisplay, sync: EGLSync) -> EGLBoolean {
    runtime().destroy_sync(dpy, sync)
}

#[no_mangle]
pub unsafe extern "C" fn eglClientWaitSync(dpy: EGLDisplay, sync: EGLSync, flags: EGLint, timeout: EGLTime) -> EGLint {
    runtime().client_wait_sync(dpy, sync, flags, timeout)
}

#[no_mangle]
pub unsafe extern "C" fn eglGetSyncAttrib(
    dpy: EGLDisplay,
    sync: EGLSync,
    attribute: EGLint,
    value: *mut EGLAttrib,
) -> EGLBoolean {
    runtime().get_sync_attrib(dpy, sync, attribute, value)
}

#[no_mangle]
pub unsafe extern "C" fn eglWaitSync(dpy: EGLDisplay, sync: EGLSync, flags: EGLint) -> EGLBoolean {
    runtime().wait_sync(dpy, sync, flags)
}

#[no_mangle]
pub unsafe extern "C" fn eglCreateImage(
    dpy: EGLDisplay,
    ctx: EGLContext,
    target: EGLenum,
    buffer: EGLClientBuffer,
    attrib_list: *const EGLAttrib,
) -> EGLImage {
    let attribs = AttribList::from_attribs(attrib_list);
    runtime().create_image(dpy, ctx, target, buffer, &attribs)
}

#[no_mangle]
pub unsafe extern "C" fn eglDestroyImage(dpy: EGLDisplay, image: EGLImage) -> EGLBoolean {
    runtime().destroy_image(dpy, image)
}

// =============================================================================
// Extensions
// =============================================================================

#[no_mangle]
pub unsafe extern "C" fn eglGetPlatformDisplayEXT(
    platform: EGLenum,
    native_display: *mut c_void,
    attrib_list: *const EGLint,
) -> EGLDisplay {
    let attribs = AttribList::from_ints(attrib_list);
    runtime().get_platform_display(platform, native_display, &attribs)
}

#[no_mangle]
pub unsafe extern "C" fn eglCreatePlatformWindowSurfaceEXT(
    dpy: EGLDisplay,
    config: EGLConfig,
    native_window: *mut c_void,
    attrib_list: *const EGLint,
) -> EGLSurface {
    let attribs = AttribList::from_ints(attrib_list);
    runtime().create_window_surface(dpy, config, native_window, &attribs, WindowSurfaceCall::Platform)
}

#[no_mangle]
pub unsafe extern "C" fn eglCreatePlatformPixmapSurfaceEXT(
    dpy: EGLDisplay,
    config: EGLConfig,
    native_pixmap: *mut c_void,
    attrib_list: *const EGLint,
) -> EGLSurface {
    runtime().create_platform_pixmap_surface_ext(dpy, config, native_pixmap, attrib_list)
}

#[no_mangle]
pub unsafe extern "C" fn eglLockSurfaceKHR(
    dpy: EGLDisplay,
    surface: EGLSurface,
    attrib_list: *const EGLint,
) -> EGLBoolean {
    runtime().lock_surface(dpy, surface, attrib_list)
}

#[no_mangle]
pub unsafe extern "C" fn eglUnlockSurfaceKHR(dpy: EGLDisplay, surface: EGLSurface) -> EGLBoolean {
    runtime().unlock_surface(dpy, surface)
}

#[no_mangle]
pub unsafe extern "C" fn eglCreateImageKHR(
    dpy: EGLDisplay,
    ctx: EGLContext,
    target: EGLenum,
    buffer: EGLClientBuffer,
    attrib_list: *const EGLint,
) -> EGLImageKHR {
    let attribs = AttribList::from_ints(attrib_list);
    runtime().create_image(dpy, ctx, target, buffer, &attribs)
}

#[no_mangle]
pub unsafe extern "C" fn eglDestroyImageKHR(dpy: EGLDisplay, image: EGLImageKHR) -> EGLBoolean {
    runtime().destroy_image(dpy, image)
}

#[no_mangle]
pub unsafe extern "C" fn eglCreateSyncKHR(dpy: EGLDisplay, type_: EGLenum, attrib_list: *const EGLint) -> EGLSyncKHR {
    let attribs = AttribList::from_ints(attrib_list);
    runtime().create_sync(dpy, type_, &attribs)
}

#[no_mangle]
pub unsafe extern "C" fn eglDestroySyncKHR(dpy: EGLDisplay, sync: EGLSyncKHR) -> EGLBoolean {
    runtime().destroy_sync(dpy, sync)
}

#[no_mangle]
pub unsafe extern "C" fn eglClientWaitSyncKHR(
    dpy: EGLDisplay,
    sync: EGLSyncKHR,
    flags: EGLint,
    timeout: EGLTimeKHR,
) -> EGLint {
    runtime().client_wait_sync(dpy, sync, flags, timeout)
}

#[no_mangle]
pub unsafe extern "C" fn eglSignalSyncKHR(dpy: EGLDisplay, sync: EGLSyncKHR, mode: EGLenum) -> EGLBoolean {
    runtime().signal_sync(dpy, sync, mode)
}

#[no_mangle]
pub unsafe extern "C" fn eglGetSyncAttribKHR(
    dpy: EGLDisplay,
    sync: EGLSyncKHR,
    attribute: EGLint,
    value: *mut EGLint,
) -> EGLBoolean {
    runtime().get_sync_attrib_khr(dpy, sync, attribute, value)
}

#[no_mangle]
pub unsafe extern "C" fn eglWaitSyncKHR(dpy: EGLDisplay, sync: EGLSyncKHR, flags: EGLint) -> EGLint {
    runtime().wait_sync(dpy, sync, flags) as EGLint
}

#[no_mangle]
pub unsafe extern "C" fn eglDupNativeFenceFDANDROID(dpy: EGLDisplay, sync: EGLSyncKHR) -> EGLint {
    runtime().dup_native_fence_fd(dpy, sync)
}

#[no_mangle]
pub unsafe extern "C" fn eglCreateStreamKHR(dpy: EGLDisplay, attrib_list: *const EGLint) -> EGLStreamKHR {
    runtime().create_stream(dpy, attrib_list)
}

#[no_mangle]
pub unsafe extern "C" fn eglDestroyStreamKHR(dpy: EGLDisplay, stream: EGLStreamKHR) -> EGLBoolean {
    runtime().destroy_stream(dpy, stream)
}

#[no_mangle]
pub unsafe extern "C" fn eglStreamAttribKHR(
    dpy: EGLDisplay,
    stream: EGLStreamKHR,
    attribute: EGLenum,
    value: EGLint,
) -> EGLBoolean {
    runtime().stream_attrib(dpy, stream, attribute, value)
}

#[no_mangle]
pub unsafe extern "C" fn eglQueryStreamKHR(
    dpy: EGLDisplay,
    stream: EGLStreamKHR,
    attribute: EGLenum,
    value: *mut EGLint,
) -> EGLBoolean {
    runtime().query_stream(dpy, stream, attribute, value)
}

#[no_mangle]
pub unsafe extern "C" fn eglQueryStreamu64KHR(
    dpy: EGLDisplay,
    stream: EGLStreamKHR,
    attribute: EGLenum,
    value: *mut EGLuint64KHR,
) -> EGLBoolean {
    runtime().query_stream_u64(dpy, stream, attribute, value)
}

#[no_mangle]
pub unsafe extern "C" fn eglQueryStreamTimeKHR(
    dpy: EGLDisplay,
    stream: EGLStreamKHR,
    attribute: EGLenum,
    value: *mut EGLTimeKHR,
) -> EGLBoolean {
    runtime().query_stream_time(dpy, stream, attribute, value)
}

#[no_mangle]
pub unsafe extern "C" fn eglCreateStreamProducerSurfaceKHR(
    dpy: EGLDisplay,
    config: EGLConfig,
    stream: EGLStreamKHR,
    attrib_list: *const EGLint,
) -> EGLSurface {
    runtime().create_stream_producer_surface(dpy, config, stream, attrib_list)
}

#[no_mangle]
pub unsafe extern "C" fn eglStreamConsumerGLTextureExternalKHR(dpy: EGLDisplay, stream: EGLStreamKHR) -> EGLBoolean {
    runtime().stream_consumer_gl_texture_external(dpy, stream)
}

#[no_mangle]
pub unsafe extern "C" fn eglStreamConsumerAcquireKHR(dpy: EGLDisplay, stream: EGLStreamKHR) -> EGLBoolean {
    runtime().stream_consumer_acquire(dpy, stream)
}

#[no_mangle]
pub unsafe extern "C" fn eglStreamConsumerReleaseKHR(dpy: EGLDisplay, stream: EGLStreamKHR) -> EGLBoolean {
    runtime().stream_consumer_release(dpy, stream)
}

#[no_mangle]
pub unsafe extern "C" fn eglGetStreamFileDescriptorKHR(
    dpy: EGLDisplay,
    stream: EGLStreamKHR,
) -> EGLNativeFileDescriptorKHR {
    runtime().stream_file_descriptor(dpy, stream)
}

#[no_mangle]
pub unsafe extern "C" fn eglCreateStreamFromFileDescriptorKHR(
    dpy: EGLDisplay,
    file_descriptor: EGLNativeFileDescriptorKHR,
) -> EGLStreamKHR {
    runtime().create_stream_from_file_descriptor(dpy, file_descriptor)
}

#[no_mangle]
pub unsafe extern "C" fn eglGetSystemTimeFrequencyNV() -> EGLuint64NV {
    runtime().system_time_frequency()
}

#[no_mangle]
pub unsafe extern "C" fn eglGetSystemTimeNV() -> EGLuint64NV {
    runtime().system_time()
}

#[no_mangle]
pub unsafe extern "C" fn eglPresentationTimeANDROID(
    dpy: EGLDisplay,
    surface: EGLSurface,
    time: EGLnsecsANDROID,
) -> EGLBoolean {
    runtime().presentation_time(dpy, surface, time)
}

#[no_mangle]
pub unsafe extern "C" fn eglGetNativeClientBufferANDROID(buffer: *const AHardwareBuffer) -> EGLClientBuffer {
    runtime().native_client_buffer(buffer)
}

#[no_mangle]
pub unsafe extern "C" fn eglSetDamageRegionKHR(
    dpy: EGLDisplay,
    surface: EGLSurface,
    rects: *mut EGLint,
    n_rects: EGLint,
) -> EGLBoolean {
    runtime().set_damage_region(dpy, surface, rects, n_rects)
}

#[no_mangle]
pub unsafe extern "C" fn eglSwapBuffersWithDamageKHR(
    dpy: EGLDisplay,
    surface: EGLSurface,
    rects: *mut EGLint,
    n_rects: EGLint,
) -> EGLBoolean {
    runtime().swap_buffers_with_damage(dpy, surface, rects, n_rects)
}

#[no_mangle]
pub unsafe extern "C" fn eglSwapBuffersWithDamageEXT(
    dpy: EGLDisplay,
    surface: EGLSurface,
    rects: *mut EGLint,
    n_rects: EGLint,
) -> EGLBoolean {
    runtime().swap_buffers_with_damage(dpy, surface, rects, n_rects)
}

#[no_mangle]
pub unsafe extern "C" fn eglBindWaylandDisplayWL(dpy: EGLDisplay, display: *mut c_void) -> EGLBoolean {
    runtime().bind_wayland_display(dpy, display)
}

#[no_mangle]
pub unsafe extern "C" fn eglUnbindWaylandDisplayWL(dpy: EGLDisplay, display: *mut c_void) -> EGLBoolean {
    runtime().unbind_wayland_display(dpy, display)
}

#[no_mangle]
pub unsafe extern "C" fn eglQueryWaylandBufferWL(
    dpy: EGLDisplay,
    buffer: *mut c_void,
    attribute: EGLint,
    value: *mut EGLint,
) -> EGLBoolean {
    runtime().query_wayland_buffer(dpy, buffer, attribute, value)
}

// =============================================================================
// eglGetProcAddress builtins
// =============================================================================

macro_rules! builtin_table {
    ($name:expr; $($func:path),* $(,)?) => {{
        let name: &[u8] = $name;
        $(
            if name == last_segment(stringify!($func)).as_bytes() {
                return Some($func as *mut c_void);
            }
        )*
        None
    }};
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path).trim()
}

/// Entry points the shim implements itself, which shadow any driver
/// implementation of the same name
pub fn builtin_proc_address(name: &CStr) -> Option<*mut c_void> {
    builtin_table!(name.to_bytes();
        eglLockSurfaceKHR,
        eglUnlockSurfaceKHR,
        eglCreateImageKHR,
        eglDestroyImageKHR,
        eglCreateSyncKHR,
        eglDestroySyncKHR,
        eglClientWaitSyncKHR,
        eglSignalSyncKHR,
        eglGetSyncAttribKHR,
        eglWaitSyncKHR,
        eglDupNativeFenceFDANDROID,
        eglCreateStreamKHR,
        eglDestroyStreamKHR,
        eglStreamAttribKHR,
        eglQueryStreamKHR,
        eglQueryStreamu64KHR,
        eglQueryStreamTimeKHR,
        eglCreateStreamProducerSurfaceKHR,
        eglStreamConsumerGLTextureExternalKHR,
        eglStreamConsumerAcquireKHR,
        eglStreamConsumerReleaseKHR,
        eglGetStreamFileDescriptorKHR,
        eglCreateStreamFromFileDescriptorKHR,
        eglGetSystemTimeFrequencyNV,
        eglGetSystemTimeNV,
        eglPresentationTimeANDROID,
        eglGetNativeClientBufferANDROID,
        eglSetDamageRegionKHR,
        eglSwapBuffersWithDamageKHR,
        eglSwapBuffersWithDamageEXT,
        eglGetPlatformDisplayEXT,
        eglCreatePlatformWindowSurfaceEXT,
        eglCreatePlatformPixmapSurfaceEXT,
        eglBindWaylandDisplayWL,
        eglUnbindWaylandDisplayWL,
        eglQueryWaylandBufferWL,
        gl_api::glGetString,
        gl_api::glGetStringi,
        gl_api::glGetIntegerv,
        gl_api::glGetInteger64v,
        gl_api::glGetFloatv,
        gl_api::glGetBooleanv,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_shadow_driver() {
        let addr = builtin_proc_address(c"eglBindWaylandDisplayWL");
        assert_eq!(addr, Some(eglBindWaylandDisplayWL as *mut c_void));

        let addr = builtin_proc_address(c"glGetString");
        assert_eq!(addr, Some(gl_api::glGetString as *mut c_void));

        assert_eq!(
            builtin_proc_address(c"eglCreateSyncKHR"),
            Some(eglCreateSyncKHR as *mut c_void)
        );
    }

    #[test]
    fn test_non_builtins() {
        assert!(builtin_proc_address(c"eglMakeCurrent").is_none());
        assert!(builtin_proc_address(c"glDrawArrays").is_none());
        assert!(builtin_proc_address(c"eglGetSyncAttrib").is_none());
        assert!(builtin_proc_address(c"").is_none());
    }

    #[test]
    fn test_wayland_displays_get_a_connector_by_default() {
        let first = InstalledPlatforms::connector();
        let second = InstalledPlatforms::connector();
        assert!(!Arc::ptr_eq(&first, &second));

        let adapter = InstalledPlatforms
            .create(EGL_PLATFORM_WAYLAND_EXT, Handle::NULL)
            .unwrap();
        assert!(!adapter.is_initialized());
        // Not connected yet: the window is refused before it is touched
        assert!(adapter.create_window(Handle(0x44)).is_none());
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("gl_api :: glGetString"), "glGetString");
        assert_eq!(last_segment("eglWaitSyncKHR"), "eglWaitSyncKHR");
    }
}

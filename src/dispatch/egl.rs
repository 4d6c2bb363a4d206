//! Swap, query, image, sync, stream and `EGL_WL_bind_wayland_display`
//! entry points, plus the plain passthroughs

use std::ffi::{c_char, c_void, CStr};
use std::ptr;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::fail;
use crate::attribs::AttribList;
use crate::error::EglError;
use crate::extensions::{client_extensions, display_extensions};
use crate::ffi::*;
use crate::platform::DamageRect;
use crate::registry::{driver_str, DispatchRuntime, Handle};
use crate::tls;
use crate::wlegl::{ResourceId, WleglServer};

/// `EGL_TEXTURE_FORMAT` answer for a buffer of `format`
pub fn texture_format(format: u32) -> EGLint {
    match format {
        AHARDWAREBUFFER_FORMAT_R5G6B5_UNORM => EGL_TEXTURE_RGB,
        AHARDWAREBUFFER_FORMAT_R8G8B8A8_UNORM | AHARDWAREBUFFER_FORMAT_R8G8B8X8_UNORM => {
            EGL_TEXTURE_RGBA
        }
        _ => EGL_TEXTURE_EXTERNAL_WL,
    }
}

unsafe fn damage_rects(rects: *const EGLint, n_rects: EGLint) -> Vec<DamageRect> {
    if rects.is_null() || n_rects <= 0 {
        return Vec::new();
    }
    std::slice::from_raw_parts(rects, n_rects as usize * 4)
        .chunks_exact(4)
        .map(|rect| [rect[0], rect[1], rect[2], rect[3]])
        .collect()
}

impl DispatchRuntime {
    // =========================================================================
    // Presentation
    // =========================================================================

    pub unsafe fn swap_buffers(&self, dpy: EGLDisplay, surface: EGLSurface) -> EGLBoolean {
        self.swap_buffers_with_damage(dpy, surface, ptr::null(), 0)
    }

    pub unsafe fn swap_buffers_with_damage(
        &self,
        dpy: EGLDisplay,
        surface: EGLSurface,
        rects: *const EGLint,
        n_rects: EGLint,
    ) -> EGLBoolean {
        tls::clear_error();
        let Some(display) = self.display(Handle::from_ptr(dpy)) else {
            return fail(EglError::BadDisplay, EGL_FALSE);
        };

        let target = display
            .adapter()
            .cloned()
            .zip(self.surface_window(Handle::from_ptr(surface)));
        if let Some((adapter, window)) = &target {
            adapter.prepare_swap(*window, &damage_rects(rects, n_rects));
        }

        let hooks = self.hooks();
        let ok = match hooks.egl_ext.eglSwapBuffersWithDamageKHR {
            Some(swap) => swap(dpy, surface, rects as *mut EGLint, n_rects),
            None => call_hook!(hooks.egl, eglSwapBuffers(dpy, surface) else EGL_FALSE),
        };
        if ok != EGL_TRUE {
            error!("swap of surface {:?} failed", surface);
            return ok;
        }

        self.flush_after_swap(dpy);
        if let Some((adapter, window)) = target {
            adapter.finish_swap(window);
        }
        ok
    }

    /// Fence and wait with `EGL_SYNC_FLUSH_COMMANDS_BIT_KHR` so work queued
    /// before the swap reaches the GPU
    unsafe fn flush_after_swap(&self, dpy: EGLDisplay) {
        let hooks = self.hooks();
        if let (Some(create), Some(wait), Some(destroy)) = (
            hooks.egl.eglCreateSync,
            hooks.egl.eglWaitSync,
            hooks.egl.eglDestroySync,
        ) {
            let sync = create(dpy, EGL_SYNC_FENCE_KHR, ptr::null());
            if !sync.is_null() {
                wait(dpy, sync, EGL_SYNC_FLUSH_COMMANDS_BIT_KHR);
                destroy(dpy, sync);
            }
            return;
        }

        let ext = &hooks.egl_ext;
        if let (Some(create), Some(wait), Some(destroy)) =
            (ext.eglCreateSyncKHR, ext.eglWaitSyncKHR, ext.eglDestroySyncKHR)
        {
            let sync = create(dpy, EGL_SYNC_FENCE_KHR, ptr::null());
            if !sync.is_null() {
                wait(dpy, sync, EGL_SYNC_FLUSH_COMMANDS_BIT_KHR);
                destroy(dpy, sync);
            }
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// `eglQueryString`, with the wrapper's extensions merged into the
    /// extension strings. Returned pointers stay valid for the life of the
    /// runtime.
    pub unsafe fn query_string(&self, dpy: EGLDisplay, name: EGLint) -> *const c_char {
        tls::clear_error();
        let hooks = self.hooks();

        if dpy.is_null() {
            let raw = call_hook!(hooks.egl, eglQueryString(EGL_NO_DISPLAY, name) else ptr::null());
            if name != EGL_EXTENSIONS {
                return raw;
            }
            return self.intern(&client_extensions(&driver_str(raw)));
        }

        if self.display(Handle::from_ptr(dpy)).is_none() {
            return fail(EglError::BadDisplay, ptr::null());
        }
        let raw = call_hook!(hooks.egl, eglQueryString(dpy, name) else ptr::null());
        if name != EGL_EXTENSIONS || raw.is_null() {
            return raw;
        }
        self.intern(&display_extensions(&driver_str(raw)))
    }

    /// The driver's pending error wins over the wrapper's. Reading resets both.
    pub unsafe fn get_error(&self) -> EGLint {
        let driver = self.hooks().egl.eglGetError.map_or(EGL_SUCCESS, |get| get());
        let wrapper = tls::error();
        tls::clear_error();
        if driver != EGL_SUCCESS {
            driver
        } else {
            wrapper
        }
    }

    /// Driver address of `name`: direct symbol first, then the driver's
    /// own `eglGetProcAddress`
    pub fn driver_proc_address(&self, name: &CStr) -> *mut c_void {
        let addr = self.driver().library_symbol(name);
        if !addr.is_null() {
            return addr;
        }
        let addr = self.driver().proc_address(name);
        if addr.is_null() {
            debug!("no driver address for {:?}", name);
        }
        addr
    }

    pub unsafe fn release_thread(&self) -> EGLBoolean {
        if let Some(release) = self.hooks().egl.eglReleaseThread {
            release();
        }
        tls::reset();
        EGL_TRUE
    }

    pub unsafe fn wait_client(&self) -> EGLBoolean {
        tls::clear_error();
        let egl = &self.hooks().egl;
        match egl.eglWaitClient {
            Some(wait) => wait(),
            None => call_hook!(egl, eglWaitGL() else EGL_TRUE),
        }
    }

    pub unsafe fn bind_api(&self, api: EGLenum) -> EGLBoolean {
        tls::clear_error();
        self.hooks().egl.eglBindAPI.map_or(EGL_TRUE, |bind| bind(api))
    }

    pub unsafe fn query_api(&self) -> EGLenum {
        tls::clear_error();
        self.hooks().egl.eglQueryAPI.map_or(EGL_OPENGL_ES_API, |query| query())
    }

    // =========================================================================
    // Images
    // =========================================================================

    /// `eglCreateImage`/`eglCreateImageKHR`. A `wl_buffer` target is
    /// resolved through the bound `android_wlegl` server first.
    pub unsafe fn create_image(
        &self,
        dpy: EGLDisplay,
        ctx: EGLContext,
        target: EGLenum,
        buffer: EGLClientBuffer,
        attribs: &AttribList,
    ) -> EGLImage {
        tls::clear_error();
        let Some(display) = self.display(Handle::from_ptr(dpy)) else {
            return fail(EglError::BadDisplay, EGL_NO_IMAGE);
        };

        let empty = AttribList::new();
        let (ctx, target, buffer, attribs) = if target == EGL_WAYLAND_BUFFER_WL {
            let native = display
                .wlegl()
                .map_or(ptr::null_mut(), |server| server.client_buffer(ResourceId(buffer as usize)));
            if native.is_null() {
                warn!("eglCreateImage: {:?} is not an android_wlegl buffer", buffer);
                return fail(EglError::BadParameter, EGL_NO_IMAGE);
            }
            (EGL_NO_CONTEXT, EGL_NATIVE_BUFFER_ANDROID, native, &empty)
        } else {
            (ctx, target, buffer, attribs)
        };

        let hooks = self.hooks();
        if let Some(create) = hooks.egl.eglCreateImage {
            let list = attribs.to_attribs();
            return create(dpy, ctx, target, buffer, list.as_ptr());
        }
        let list = attribs.to_ints();
        call_hook!(
            hooks.egl_ext,
            eglCreateImageKHR(dpy, ctx, target, buffer, list.as_ptr())
            else EGL_NO_IMAGE
        )
    }

    pub unsafe fn destroy_image(&self, dpy: EGLDisplay, image: EGLImage) -> EGLBoolean {
        tls::clear_error();
        let hooks = self.hooks();
        match hooks.egl.eglDestroyImage {
            Some(destroy) => destroy(dpy, image),
            None => call_hook!(hooks.egl_ext, eglDestroyImageKHR(dpy, image) else EGL_FALSE),
        }
    }

    // =========================================================================
    // Syncs
    // =========================================================================

    pub unsafe fn create_sync(&self, dpy: EGLDisplay, type_: EGLenum, attribs: &AttribList) -> EGLSync {
        tls::clear_error();
        let hooks = self.hooks();
        if let Some(create) = hooks.egl.eglCreateSync {
            let list = attribs.to_attribs();
            return create(dpy, type_, list.as_ptr());
        }
        let list = attribs.to_ints();
        call_hook!(hooks.egl_ext, eglCreateSyncKHR(dpy, type_, list.as_ptr()) else EGL_NO_SYNC)
    }

    pub unsafe fn destroy_sync(&self, dpy: EGLDisplay, sync: EGLSync) -> EGLBoolean {
        tls::clear_error();
        let hooks = self.hooks();
        match hooks.egl.eglDestroySync {
            Some(destroy) => destroy(dpy, sync),
            None => call_hook!(hooks.egl_ext, eglDestroySyncKHR(dpy, sync) else EGL_FALSE),
        }
    }

    pub unsafe fn client_wait_sync(
        &self,
        dpy: EGLDisplay,
        sync: EGLSync,
        flags: EGLint,
        timeout: EGLTime,
    ) -> EGLint {
        tls::clear_error();
        let hooks = self.hooks();
        match hooks.egl.eglClientWaitSync {
            Some(wait) => wait(dpy, sync, flags, timeout),
            None => call_hook!(
                hooks.egl_ext,
                eglClientWaitSyncKHR(dpy, sync, flags, timeout)
                else EGL_FALSE as EGLint
            ),
        }
    }

    pub unsafe fn wait_sync(&self, dpy: EGLDisplay, sync: EGLSync, flags: EGLint) -> EGLBoolean {
        tls::clear_error();
        let hooks = self.hooks();
        match hooks.egl.eglWaitSync {
            Some(wait) => wait(dpy, sync, flags),
            None => call_hook!(
                hooks.egl_ext,
                eglWaitSyncKHR(dpy, sync, flags)
                else EGL_FALSE as EGLint
            ) as EGLBoolean,
        }
    }

    pub unsafe fn get_sync_attrib(
        &self,
        dpy: EGLDisplay,
        sync: EGLSync,
        attribute: EGLint,
        value: *mut EGLAttrib,
    ) -> EGLBoolean {
        tls::clear_error();
        let hooks = self.hooks();
        if let Some(get) = hooks.egl.eglGetSyncAttrib {
            return get(dpy, sync, attribute, value);
        }
        let mut narrow: EGLint = 0;
        let ok = call_hook!(
            hooks.egl_ext,
            eglGetSyncAttribKHR(dpy, sync, attribute, &mut narrow)
            else EGL_FALSE
        );
        if ok == EGL_TRUE && !value.is_null() {
            *value = narrow as EGLAttrib;
        }
        ok
    }

    pub unsafe fn get_sync_attrib_khr(
        &self,
        dpy: EGLDisplay,
        sync: EGLSyncKHR,
        attribute: EGLint,
        value: *mut EGLint,
    ) -> EGLBoolean {
        tls::clear_error();
        let hooks = self.hooks();
        if let Some(get) = hooks.egl.eglGetSyncAttrib {
            let mut wide: EGLAttrib = 0;
            let ok = get(dpy, sync, attribute, &mut wide);
            if ok == EGL_TRUE && !value.is_null() {
                *value = wide as EGLint;
            }
            return ok;
        }
        call_hook!(hooks.egl_ext, eglGetSyncAttribKHR(dpy, sync, attribute, value) else EGL_FALSE)
    }

    // =========================================================================
    // EGL_WL_bind_wayland_display
    // =========================================================================

    pub unsafe fn bind_wayland_display(&self, dpy: EGLDisplay, wl_display: *mut c_void) -> EGLBoolean {
        tls::clear_error();
        let Some(display) = self.display(Handle::from_ptr(dpy)) else {
            return fail(EglError::BadDisplay, EGL_FALSE);
        };
        let wl_display = Handle::from_ptr(wl_display);
        if display.wlegl().is_some() {
            warn!("eglBindWaylandDisplayWL: display {:?} is already bound", dpy);
            return fail(EglError::BadAccess, EGL_FALSE);
        }

        let server = Arc::new(WleglServer::new(wl_display, self.allocator()));
        if !display.bind_wlegl(server.clone()) {
            return fail(EglError::BadAccess, EGL_FALSE);
        }

        match self.wlegl_transport() {
            Some(transport) => {
                if !transport.advertise(wl_display, server) {
                    display.unbind_wlegl(wl_display);
                    error!("could not advertise android_wlegl on {:?}", wl_display);
                    return fail(EglError::BadAlloc, EGL_FALSE);
                }
            }
            None => warn!("no android_wlegl transport installed, clients cannot share buffers"),
        }
        info!("android_wlegl bound to {:?}", wl_display);
        EGL_TRUE
    }

    pub unsafe fn unbind_wayland_display(&self, dpy: EGLDisplay, wl_display: *mut c_void) -> EGLBoolean {
        tls::clear_error();
        let Some(display) = self.display(Handle::from_ptr(dpy)) else {
            return fail(EglError::BadDisplay, EGL_FALSE);
        };
        let wl_display = Handle::from_ptr(wl_display);
        if display.unbind_wlegl(wl_display).is_none() {
            warn!("eglUnbindWaylandDisplayWL: {:?} is not bound", wl_display);
            return fail(EglError::BadParameter, EGL_FALSE);
        }
        if let Some(transport) = self.wlegl_transport() {
            transport.withdraw(wl_display);
        }
        EGL_TRUE
    }

    pub unsafe fn query_wayland_buffer(
        &self,
        dpy: EGLDisplay,
        resource: *mut c_void,
        attribute: EGLint,
        value: *mut EGLint,
    ) -> EGLBoolean {
        tls::clear_error();
        let Some(display) = self.display(Handle::from_ptr(dpy)) else {
            return fail(EglError::BadDisplay, EGL_FALSE);
        };
        let Some(buffer) = display
            .wlegl()
            .and_then(|server| server.buffer(ResourceId(resource as usize)))
        else {
            return EGL_FALSE;
        };

        let desc = buffer.desc();
        let answer = match attribute {
            EGL_TEXTURE_FORMAT => texture_format(desc.format),
            EGL_WIDTH => desc.width as EGLint,
            EGL_HEIGHT => desc.height as EGLint,
            _ => return EGL_FALSE,
        };
        if !value.is_null() {
            *value = answer;
        }
        EGL_TRUE
    }
}

// =============================================================================
// Passthroughs
// =============================================================================

/// Entry points that need nothing but error clearing and a driver call
macro_rules! passthroughs {
    ($(
        $(#[$meta:meta])*
        fn $name:ident($($arg:ident: $ty:ty),* $(,)?) -> $ret:ty = $table:ident.$func:ident else $default:expr;
    )*) => {
        impl DispatchRuntime {
            $(
                $(#[$meta])*
                pub unsafe fn $name(&self, $($arg: $ty),*) -> $ret {
                    tls::clear_error();
                    call_hook!(self.hooks().$table, $func($($arg),*) else $default)
                }
            )*
        }
    };
}

passthroughs! {
    fn choose_config(dpy: EGLDisplay, attrib_list: *const EGLint, configs: *mut EGLConfig, config_size: EGLint, num_config: *mut EGLint) -> EGLBoolean = egl.eglChooseConfig else EGL_FALSE;
    fn copy_buffers(dpy: EGLDisplay, surface: EGLSurface, target: EGLNativePixmapType) -> EGLBoolean = egl.eglCopyBuffers else EGL_FALSE;
    fn create_pbuffer_surface(dpy: EGLDisplay, config: EGLConfig, attrib_list: *const EGLint) -> EGLSurface = egl.eglCreatePbufferSurface else EGL_NO_SURFACE;
    fn create_pixmap_surface(dpy: EGLDisplay, config: EGLConfig, pixmap: EGLNativePixmapType, attrib_list: *const EGLint) -> EGLSurface = egl.eglCreatePixmapSurface else EGL_NO_SURFACE;
    fn create_platform_pixmap_surface(dpy: EGLDisplay, config: EGLConfig, pixmap: *mut c_void, attrib_list: *const EGLAttrib) -> EGLSurface = egl.eglCreatePlatformPixmapSurface else EGL_NO_SURFACE;
    fn create_platform_pixmap_surface_ext(dpy: EGLDisplay, config: EGLConfig, pixmap: *mut c_void, attrib_list: *const EGLint) -> EGLSurface = egl_ext.eglCreatePlatformPixmapSurfaceEXT else EGL_NO_SURFACE;
    fn get_config_attrib(dpy: EGLDisplay, config: EGLConfig, attribute: EGLint, value: *mut EGLint) -> EGLBoolean = egl.eglGetConfigAttrib else EGL_FALSE;
    fn get_configs(dpy: EGLDisplay, configs: *mut EGLConfig, config_size: EGLint, num_config: *mut EGLint) -> EGLBoolean = egl.eglGetConfigs else EGL_FALSE;
    fn get_current_display() -> EGLDisplay = egl.eglGetCurrentDisplay else EGL_NO_DISPLAY;
    fn get_current_surface(readdraw: EGLint) -> EGLSurface = egl.eglGetCurrentSurface else EGL_NO_SURFACE;
    fn get_current_context() -> EGLContext = egl.eglGetCurrentContext else EGL_NO_CONTEXT;
    fn query_context(dpy: EGLDisplay, ctx: EGLContext, attribute: EGLint, value: *mut EGLint) -> EGLBoolean = egl.eglQueryContext else EGL_FALSE;
    fn query_surface(dpy: EGLDisplay, surface: EGLSurface, attribute: EGLint, value: *mut EGLint) -> EGLBoolean = egl.eglQuerySurface else EGL_FALSE;
    fn wait_gl() -> EGLBoolean = egl.eglWaitGL else EGL_TRUE;
    fn wait_native(engine: EGLint) -> EGLBoolean = egl.eglWaitNative else EGL_TRUE;
    fn bind_tex_image(dpy: EGLDisplay, surface: EGLSurface, buffer: EGLint) -> EGLBoolean = egl.eglBindTexImage else EGL_FALSE;
    fn release_tex_image(dpy: EGLDisplay, surface: EGLSurface, buffer: EGLint) -> EGLBoolean = egl.eglReleaseTexImage else EGL_FALSE;
    fn surface_attrib(dpy: EGLDisplay, surface: EGLSurface, attribute: EGLint, value: EGLint) -> EGLBoolean = egl.eglSurfaceAttrib else EGL_FALSE;
    fn swap_interval(dpy: EGLDisplay, interval: EGLint) -> EGLBoolean = egl.eglSwapInterval else EGL_FALSE;
    fn create_pbuffer_from_client_buffer(dpy: EGLDisplay, buftype: EGLenum, buffer: EGLClientBuffer, config: EGLConfig, attrib_list: *const EGLint) -> EGLSurface = egl.eglCreatePbufferFromClientBuffer else super::fail(EglError::BadConfig, EGL_NO_SURFACE);

    fn lock_surface(dpy: EGLDisplay, surface: EGLSurface, attrib_list: *const EGLint) -> EGLBoolean = egl_ext.eglLockSurfaceKHR else EGL_FALSE;
    fn unlock_surface(dpy: EGLDisplay, surface: EGLSurface) -> EGLBoolean = egl_ext.eglUnlockSurfaceKHR else super::fail(EglError::BadDisplay, EGL_FALSE);
    fn signal_sync(dpy: EGLDisplay, sync: EGLSyncKHR, mode: EGLenum) -> EGLBoolean = egl_ext.eglSignalSyncKHR else EGL_FALSE;
    fn dup_native_fence_fd(dpy: EGLDisplay, sync: EGLSyncKHR) -> EGLint = egl_ext.eglDupNativeFenceFDANDROID else EGL_NO_FILE_DESCRIPTOR_KHR;
    fn set_damage_region(dpy: EGLDisplay, surface: EGLSurface, rects: *mut EGLint, n_rects: EGLint) -> EGLBoolean = egl_ext.eglSetDamageRegionKHR else EGL_FALSE;
    fn presentation_time(dpy: EGLDisplay, surface: EGLSurface, time: EGLnsecsANDROID) -> EGLBoolean = egl_ext.eglPresentationTimeANDROID else EGL_FALSE;
    fn native_client_buffer(buffer: *const AHardwareBuffer) -> EGLClientBuffer = egl_ext.eglGetNativeClientBufferANDROID else ptr::null_mut();
    fn system_time_frequency() -> EGLuint64NV = egl_ext.eglGetSystemTimeFrequencyNV else 0;
    fn system_time() -> EGLuint64NV = egl_ext.eglGetSystemTimeNV else 0;

    fn create_stream(dpy: EGLDisplay, attrib_list: *const EGLint) -> EGLStreamKHR = egl_ext.eglCreateStreamKHR else EGL_NO_STREAM_KHR;
    fn destroy_stream(dpy: EGLDisplay, stream: EGLStreamKHR) -> EGLBoolean = egl_ext.eglDestroyStreamKHR else EGL_FALSE;
    fn stream_attrib(dpy: EGLDisplay, stream: EGLStreamKHR, attribute: EGLenum, value: EGLint) -> EGLBoolean = egl_ext.eglStreamAttribKHR else EGL_FALSE;
    fn query_stream(dpy: EGLDisplay, stream: EGLStreamKHR, attribute: EGLenum, value: *mut EGLint) -> EGLBoolean = egl_ext.eglQueryStreamKHR else EGL_FALSE;
    fn query_stream_u64(dpy: EGLDisplay, stream: EGLStreamKHR, attribute: EGLenum, value: *mut EGLuint64KHR) -> EGLBoolean = egl_ext.eglQueryStreamu64KHR else EGL_FALSE;
    fn query_stream_time(dpy: EGLDisplay, stream: EGLStreamKHR, attribute: EGLenum, value: *mut EGLTimeKHR) -> EGLBoolean = egl_ext.eglQueryStreamTimeKHR else EGL_FALSE;
    fn create_stream_producer_surface(dpy: EGLDisplay, config: EGLConfig, stream: EGLStreamKHR, attrib_list: *const EGLint) -> EGLSurface = egl_ext.eglCreateStreamProducerSurfaceKHR else EGL_NO_SURFACE;
    fn stream_consumer_gl_texture_external(dpy: EGLDisplay, stream: EGLStreamKHR) -> EGLBoolean = egl_ext.eglStreamConsumerGLTextureExternalKHR else EGL_FALSE;
    fn stream_consumer_acquire(dpy: EGLDisplay, stream: EGLStreamKHR) -> EGLBoolean = egl_ext.eglStreamConsumerAcquireKHR else EGL_FALSE;
    fn stream_consumer_release(dpy: EGLDisplay, stream: EGLStreamKHR) -> EGLBoolean = egl_ext.eglStreamConsumerReleaseKHR else EGL_FALSE;
    fn stream_file_descriptor(dpy: EGLDisplay, stream: EGLStreamKHR) -> EGLNativeFileDescriptorKHR = egl_ext.eglGetStreamFileDescriptorKHR else EGL_NO_FILE_DESCRIPTOR_KHR;
    fn create_stream_from_file_descriptor(dpy: EGLDisplay, file_descriptor: EGLNativeFileDescriptorKHR) -> EGLStreamKHR = egl_ext.eglCreateStreamFromFileDescriptorKHR else EGL_NO_STREAM_KHR;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    use crate::dispatch::fake::{self, RecordingAdapter, RecordingPlatforms};
    use crate::dispatch::WindowSurfaceCall;
    use crate::extensions::WL_BIND_DISPLAY;
    use crate::gralloc::BufferDesc;
    use crate::wlegl::tests::MemoryAllocator;
    use crate::wlegl::WleglTransport;

    fn open(runtime: &DispatchRuntime) -> EGLDisplay {
        unsafe {
            let dpy = runtime.get_display(EGL_DEFAULT_DISPLAY);
            runtime.initialize(dpy, ptr::null_mut(), ptr::null_mut());
            dpy
        }
    }

    #[derive(Default)]
    struct RecordingTransport {
        events: Mutex<Vec<String>>,
    }

    impl WleglTransport for RecordingTransport {
        fn advertise(&self, display: Handle, _server: Arc<WleglServer>) -> bool {
            self.events.lock().unwrap().push(format!("advertise {:?}", display));
            true
        }

        fn withdraw(&self, display: Handle) {
            self.events.lock().unwrap().push(format!("withdraw {:?}", display));
        }
    }

    #[test]
    fn test_texture_format_mapping() {
        assert_eq!(texture_format(AHARDWAREBUFFER_FORMAT_R5G6B5_UNORM), EGL_TEXTURE_RGB);
        assert_eq!(texture_format(AHARDWAREBUFFER_FORMAT_R8G8B8A8_UNORM), EGL_TEXTURE_RGBA);
        assert_eq!(texture_format(AHARDWAREBUFFER_FORMAT_R8G8B8X8_UNORM), EGL_TEXTURE_RGBA);
        // BGRA has no plain RGBA view; compositors sample it as external
        assert_eq!(texture_format(HAL_PIXEL_FORMAT_BGRA_8888), EGL_TEXTURE_EXTERNAL_WL);
        assert_eq!(texture_format(AHARDWAREBUFFER_FORMAT_R8G8B8_UNORM), EGL_TEXTURE_EXTERNAL_WL);
        assert_eq!(texture_format(0x32315659), EGL_TEXTURE_EXTERNAL_WL);
    }

    #[test]
    fn test_client_extensions_deterministic() {
        let runtime = fake::runtime();
        unsafe {
            let first = runtime.query_string(EGL_NO_DISPLAY, EGL_EXTENSIONS);
            let second = runtime.query_string(EGL_NO_DISPLAY, EGL_EXTENSIONS);
            assert_eq!(CStr::from_ptr(first), CStr::from_ptr(second));
            let text = CStr::from_ptr(first).to_string_lossy();
            assert!(text.starts_with("EGL_KHR_client_get_all_proc_addresses"));
            assert!(text.contains("EGL_EXT_platform_base"));
        }
    }

    #[test]
    fn test_display_extensions_carry_wl_bind() {
        let runtime = fake::runtime();
        let dpy = open(&runtime);
        unsafe {
            let exts = CStr::from_ptr(runtime.query_string(dpy, EGL_EXTENSIONS)).to_string_lossy();
            assert!(exts.starts_with("EGL_KHR_image_base EGL_KHR_fence_sync"));
            assert!(exts.contains(WL_BIND_DISPLAY));

            let vendor = CStr::from_ptr(runtime.query_string(dpy, EGL_VENDOR));
            assert_eq!(vendor, c"Fake");

            assert!(runtime.query_string(0x99 as EGLDisplay, EGL_EXTENSIONS).is_null());
            assert_eq!(tls::error(), EGL_BAD_DISPLAY);
        }
    }

    #[test]
    fn test_get_error_precedence() {
        let runtime = fake::runtime();
        unsafe {
            tls::set_error(EglError::BadDisplay);
            assert_eq!(runtime.get_error(), EGL_BAD_DISPLAY);
            assert_eq!(runtime.get_error(), EGL_SUCCESS);

            tls::set_error(EglError::BadDisplay);
            fake::with_state(|state| state.error = EGL_BAD_SURFACE);
            assert_eq!(runtime.get_error(), EGL_BAD_SURFACE);
        }
    }

    #[test]
    fn test_swap_drives_adapter_and_flushes() {
        let adapter = Arc::new(RecordingAdapter::default());
        let runtime = fake::runtime().with_platforms(Box::new(RecordingPlatforms(adapter.clone())));
        unsafe {
            let dpy = runtime.get_platform_display(EGL_PLATFORM_WAYLAND_EXT, ptr::null_mut(), &AttribList::new());
            runtime.initialize(dpy, ptr::null_mut(), ptr::null_mut());
            let surface = runtime.create_window_surface(
                dpy,
                ptr::null_mut(),
                0x4000 as *mut c_void,
                &AttribList::new(),
                WindowSurfaceCall::Legacy,
            );

            let rects = [0, 0, 8, 8];
            assert_eq!(runtime.swap_buffers_with_damage(dpy, surface, rects.as_ptr(), 1), EGL_TRUE);
            assert_eq!(adapter.prepared.load(Ordering::SeqCst), 1);
            assert_eq!(adapter.finished.load(Ordering::SeqCst), 1);

            let calls = fake::calls();
            let swap = calls.iter().position(|c| c == "eglSwapBuffersWithDamageKHR(1)").unwrap();
            let fence = calls.iter().position(|c| c.starts_with("eglCreateSyncKHR")).unwrap();
            assert!(swap < fence);
            assert!(calls.contains(&format!("eglWaitSyncKHR({})", EGL_SYNC_FLUSH_COMMANDS_BIT_KHR)));
            assert!(calls.contains(&"eglDestroySyncKHR".to_string()));
        }
    }

    #[test]
    fn test_swap_of_pbuffer_skips_adapter() {
        let adapter = Arc::new(RecordingAdapter::default());
        let runtime = fake::runtime().with_platforms(Box::new(RecordingPlatforms(adapter.clone())));
        unsafe {
            let dpy = runtime.get_platform_display(EGL_PLATFORM_WAYLAND_EXT, ptr::null_mut(), &AttribList::new());
            assert_eq!(runtime.swap_buffers(dpy, 0x9999 as EGLSurface), EGL_TRUE);
            assert_eq!(adapter.prepared.load(Ordering::SeqCst), 0);
            assert!(fake::calls().contains(&"eglSwapBuffersWithDamageKHR(0)".to_string()));
        }
    }

    #[test]
    fn test_wayland_bind_lifecycle() {
        let transport = Arc::new(RecordingTransport::default());
        let runtime = fake::runtime()
            .with_allocator(Some(Arc::new(MemoryAllocator { fail: false })))
            .with_wlegl_transport(Some(transport.clone()));
        let dpy = open(&runtime);
        let wl = 0x7070 as *mut c_void;
        unsafe {
            assert_eq!(runtime.unbind_wayland_display(dpy, wl), EGL_FALSE);
            assert_eq!(tls::error(), EGL_BAD_PARAMETER);

            assert_eq!(runtime.bind_wayland_display(dpy, wl), EGL_TRUE);
            assert_eq!(runtime.bind_wayland_display(dpy, wl), EGL_FALSE);
            assert_eq!(tls::error(), EGL_BAD_ACCESS);

            assert_eq!(runtime.unbind_wayland_display(dpy, wl), EGL_TRUE);
            assert_eq!(runtime.unbind_wayland_display(dpy, wl), EGL_FALSE);
        }
        let events = transport.events.lock().unwrap().clone();
        assert_eq!(events, vec!["advertise Handle(28784)", "withdraw Handle(28784)"]);
    }

    #[test]
    fn test_query_wayland_buffer_and_image() {
        let runtime = fake::runtime().with_allocator(Some(Arc::new(MemoryAllocator { fail: false })));
        let dpy = open(&runtime);
        unsafe {
            assert_eq!(runtime.bind_wayland_display(dpy, 0x7070 as *mut c_void), EGL_TRUE);
            let server = runtime.display(Handle::from_ptr(dpy)).unwrap().wlegl().unwrap();
            server.create_handle(ResourceId(1), 0, &[1, 2]).unwrap();
            let buffer = server
                .create_buffer(
                    ResourceId(2),
                    64,
                    32,
                    64,
                    AHARDWAREBUFFER_FORMAT_R5G6B5_UNORM as i32,
                    0x100,
                    ResourceId(1),
                )
                .unwrap()
                .unwrap();
            assert!(buffer
                .desc()
                .matches(&BufferDesc::new(64, 32, AHARDWAREBUFFER_FORMAT_R5G6B5_UNORM, 0x100)));

            let resource = 2usize as *mut c_void;
            let mut value = 0;
            assert_eq!(runtime.query_wayland_buffer(dpy, resource, EGL_WIDTH, &mut value), EGL_TRUE);
            assert_eq!(value, 64);
            assert_eq!(runtime.query_wayland_buffer(dpy, resource, EGL_HEIGHT, &mut value), EGL_TRUE);
            assert_eq!(value, 32);
            assert_eq!(runtime.query_wayland_buffer(dpy, resource, EGL_TEXTURE_FORMAT, &mut value), EGL_TRUE);
            assert_eq!(value, EGL_TEXTURE_RGB);
            assert_eq!(runtime.query_wayland_buffer(dpy, 9usize as *mut c_void, EGL_WIDTH, &mut value), EGL_FALSE);

            let image = runtime.create_image(
                dpy,
                0x5 as EGLContext,
                EGL_WAYLAND_BUFFER_WL,
                resource,
                &AttribList::new(),
            );
            assert!(!image.is_null());
            let args = fake::with_state(|state| state.image_args.clone());
            assert_eq!(
                args,
                vec![(0, EGL_NATIVE_BUFFER_ANDROID, buffer.client_buffer() as usize)]
            );

            let missing = runtime.create_image(
                dpy,
                EGL_NO_CONTEXT,
                EGL_WAYLAND_BUFFER_WL,
                9usize as *mut c_void,
                &AttribList::new(),
            );
            assert!(missing.is_null());
            assert_eq!(tls::error(), EGL_BAD_PARAMETER);
        }
    }

    #[test]
    fn test_missing_hooks_return_sentinels() {
        let runtime = fake::runtime();
        unsafe {
            assert_eq!(runtime.create_stream(ptr::null_mut(), ptr::null()), EGL_NO_STREAM_KHR);
            assert_eq!(
                runtime.stream_file_descriptor(ptr::null_mut(), ptr::null_mut()),
                EGL_NO_FILE_DESCRIPTOR_KHR
            );
            assert_eq!(runtime.unlock_surface(ptr::null_mut(), ptr::null_mut()), EGL_FALSE);
            assert_eq!(tls::error(), EGL_BAD_DISPLAY);
            assert!(runtime
                .create_pbuffer_from_client_buffer(ptr::null_mut(), 0, ptr::null_mut(), ptr::null_mut(), ptr::null())
                .is_null());
            assert_eq!(tls::error(), EGL_BAD_CONFIG);
            assert_eq!(runtime.bind_api(EGL_OPENGL_ES_API), EGL_TRUE);
            assert_eq!(runtime.query_api(), EGL_OPENGL_ES_API);
            assert_eq!(runtime.wait_client(), EGL_TRUE);
            assert_eq!(runtime.system_time(), 0);
        }
    }

    #[test]
    fn test_release_thread_clears_state() {
        let runtime = fake::runtime();
        tls::set_error(EglError::BadSurface);
        tls::set_current(runtime.hooks().clone(), crate::hooks::GlesVersion::Legacy);
        unsafe {
            assert_eq!(runtime.release_thread(), EGL_TRUE);
        }
        assert_eq!(tls::error(), EGL_SUCCESS);
        assert_eq!(tls::current_version(), None);
    }
}

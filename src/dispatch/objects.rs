//! Display, context and window-surface flows

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::fail;
use crate::attribs::AttribList;
use crate::error::EglError;
use crate::ffi::*;
use crate::hooks::GlesVersion;
use crate::platform::{native_platform, platform_matches};
use crate::registry::{Context, DispatchRuntime, Display, Handle};
use crate::tls;

/// Which public entry point created a window surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSurfaceCall {
    /// `eglCreateWindowSurface`
    Legacy,
    /// `eglCreatePlatformWindowSurface` and its `EXT` variant
    Platform,
}

impl DispatchRuntime {
    // =========================================================================
    // Displays
    // =========================================================================

    pub unsafe fn get_display(&self, native: EGLNativeDisplayType) -> EGLDisplay {
        tls::clear_error();
        let native = Handle::from_ptr(native);
        let platform = native_platform(native, self.config().wayland_display);
        self.create_display(platform, native, &AttribList::new())
    }

    pub unsafe fn get_platform_display(
        &self,
        platform: EGLenum,
        native: *mut std::ffi::c_void,
        attribs: &AttribList,
    ) -> EGLDisplay {
        tls::clear_error();
        self.create_display(platform, Handle::from_ptr(native), attribs)
    }

    unsafe fn create_display(&self, platform: EGLenum, native: Handle, attribs: &AttribList) -> EGLDisplay {
        if let Some(existing) = self.current_display() {
            if existing.native() == native {
                return existing.handle().as_ptr();
            }
            warn!(
                "only one display is supported: {:?} is open, {:?} requested",
                existing.native(),
                native
            );
            return fail(EglError::BadAlloc, EGL_NO_DISPLAY);
        }

        if !native.is_null() && !platform_matches(platform, native, self.config().wayland_display) {
            warn!("platform {:#x} does not match native display {:?}", platform, native);
            return fail(EglError::BadParameter, EGL_NO_DISPLAY);
        }

        // The driver only knows Android; every platform maps onto its default display
        let hooks = self.hooks();
        let list = attribs.to_attribs();
        let driver = match hooks.egl.eglGetPlatformDisplay {
            Some(get) => get(EGL_PLATFORM_ANDROID_KHR, EGL_DEFAULT_DISPLAY, list.as_ptr()),
            None => call_hook!(hooks.egl, eglGetDisplay(EGL_DEFAULT_DISPLAY) else EGL_NO_DISPLAY),
        };
        if driver.is_null() {
            warn!("driver returned no display for platform {:#x}", platform);
            return EGL_NO_DISPLAY;
        }

        let adapter = self.platforms().create(platform, native);
        let display = Arc::new(Display::new(native, Handle::from_ptr(driver), platform, adapter));
        let display = self.install_display(display);
        if display.native() != native {
            return fail(EglError::BadAlloc, EGL_NO_DISPLAY);
        }

        let dpy = &display;
        info!(
            "display {:?} for native {:?} (platform {:#x}, adapter: {})",
            dpy.handle(),
            native,
            platform,
            dpy.adapter().is_some()
        );
        display.handle().as_ptr()
    }

    pub unsafe fn initialize(&self, dpy: EGLDisplay, major: *mut EGLint, minor: *mut EGLint) -> EGLBoolean {
        tls::clear_error();
        let Some(display) = self.display(Handle::from_ptr(dpy)) else {
            return fail(EglError::BadDisplay, EGL_FALSE);
        };

        if let Some(adapter) = display.adapter() {
            if !adapter.is_initialized() && !adapter.initialize() {
                adapter.terminate();
                return fail(EglError::NotInitialized, EGL_FALSE);
            }
        }

        let (mut driver_major, mut driver_minor) = (0, 0);
        let ok = call_hook!(
            self.hooks().egl,
            eglInitialize(dpy, &mut driver_major, &mut driver_minor)
            else fail(EglError::NotInitialized, EGL_FALSE)
        );
        if ok != EGL_TRUE {
            if let Some(adapter) = display.adapter() {
                adapter.terminate();
            }
            display.set_initialized(None);
            return EGL_FALSE;
        }

        display.set_initialized(Some((driver_major, driver_minor)));
        if !major.is_null() {
            *major = driver_major;
        }
        if !minor.is_null() {
            *minor = driver_minor;
        }
        debug!("display {:?} initialized, EGL {}.{}", dpy, driver_major, driver_minor);
        EGL_TRUE
    }

    pub unsafe fn terminate(&self, dpy: EGLDisplay) -> EGLBoolean {
        tls::clear_error();
        let Some(display) = self.display(Handle::from_ptr(dpy)) else {
            return fail(EglError::BadDisplay, EGL_FALSE);
        };

        if let Some(adapter) = display.adapter() {
            if adapter.is_initialized() {
                adapter.terminate();
            }
        }
        display.set_initialized(None);
        call_hook!(self.hooks().egl, eglTerminate(dpy) else EGL_TRUE)
    }

    // =========================================================================
    // Contexts
    // =========================================================================

    pub unsafe fn create_context(
        &self,
        dpy: EGLDisplay,
        config: EGLConfig,
        share: EGLContext,
        attribs: &AttribList,
    ) -> EGLContext {
        tls::clear_error();
        if self.display(Handle::from_ptr(dpy)).is_none() {
            return fail(EglError::BadDisplay, EGL_NO_CONTEXT);
        }

        let list = attribs.to_ints();
        let ctx = call_hook!(
            self.hooks().egl,
            eglCreateContext(dpy, config, share, list.as_ptr())
            else EGL_NO_CONTEXT
        );
        if ctx.is_null() {
            return EGL_NO_CONTEXT;
        }

        let version = GlesVersion::from_client_version(
            attribs.get(EGL_CONTEXT_CLIENT_VERSION).map(|v| v as i64),
        );
        self.insert_context(Context::new(Handle::from_ptr(dpy), Handle::from_ptr(ctx), version));
        debug!("context {:?} created, {:?}", ctx, version);
        ctx
    }

    pub unsafe fn destroy_context(&self, dpy: EGLDisplay, ctx: EGLContext) -> EGLBoolean {
        tls::clear_error();
        if self.display(Handle::from_ptr(dpy)).is_none() {
            return fail(EglError::BadDisplay, EGL_FALSE);
        }
        let handle = Handle::from_ptr(ctx);
        if self.context(handle).is_none() {
            return fail(EglError::BadContext, EGL_FALSE);
        }

        let ok = call_hook!(self.hooks().egl, eglDestroyContext(dpy, ctx) else EGL_FALSE);
        if ok == EGL_TRUE {
            self.remove_context(handle);
        } else {
            warn!("driver refused to destroy context {:?}, keeping it", ctx);
        }
        ok
    }

    pub unsafe fn make_current(
        &self,
        dpy: EGLDisplay,
        draw: EGLSurface,
        read: EGLSurface,
        ctx: EGLContext,
    ) -> EGLBoolean {
        tls::clear_error();

        if ctx.is_null() {
            tls::clear_current();
            if self.display(Handle::from_ptr(dpy)).is_none() {
                return EGL_TRUE;
            }
            return call_hook!(
                self.hooks().egl,
                eglMakeCurrent(dpy, EGL_NO_SURFACE, EGL_NO_SURFACE, EGL_NO_CONTEXT)
                else EGL_TRUE
            );
        }

        let Some(display) = self.display(Handle::from_ptr(dpy)) else {
            return fail(EglError::BadDisplay, EGL_FALSE);
        };
        let Some(context) = self
            .context(Handle::from_ptr(ctx))
            .filter(|context| context.display() == display.handle())
        else {
            return fail(EglError::BadContext, EGL_FALSE);
        };

        let ok = call_hook!(self.hooks().egl, eglMakeCurrent(dpy, draw, read, ctx) else EGL_FALSE);
        if ok != EGL_TRUE {
            return ok;
        }

        tls::set_current(self.hooks().clone(), context.version());
        self.cache_extensions(&context);
        EGL_TRUE
    }

    // =========================================================================
    // Window surfaces
    // =========================================================================

    pub unsafe fn create_window_surface(
        &self,
        dpy: EGLDisplay,
        config: EGLConfig,
        win: *mut std::ffi::c_void,
        attribs: &AttribList,
        call: WindowSurfaceCall,
    ) -> EGLSurface {
        tls::clear_error();
        let Some(display) = self.display(Handle::from_ptr(dpy)) else {
            return fail(EglError::BadDisplay, EGL_NO_SURFACE);
        };

        let requested = Handle::from_ptr(win);
        let native = match display.adapter() {
            Some(adapter) => match adapter.create_window(requested) {
                Some(wrapped) => wrapped,
                None => {
                    warn!("platform could not wrap native window {:?}", requested);
                    return fail(EglError::BadNativeWindow, EGL_NO_SURFACE);
                }
            },
            None => requested,
        };

        let hooks = self.hooks();
        let ints = attribs.to_ints();
        let surface = match (
            call,
            hooks.egl_ext.eglCreatePlatformWindowSurfaceEXT,
            hooks.egl.eglCreatePlatformWindowSurface,
        ) {
            (WindowSurfaceCall::Platform, Some(create), _) => {
                create(dpy, config, native.as_ptr(), ints.as_ptr())
            }
            (WindowSurfaceCall::Platform, None, Some(create)) => {
                let wide = attribs.to_attribs();
                create(dpy, config, native.as_ptr(), wide.as_ptr())
            }
            _ => call_hook!(
                hooks.egl,
                eglCreateWindowSurface(dpy, config, native.as_ptr(), ints.as_ptr())
                else EGL_NO_SURFACE
            ),
        };

        if surface.is_null() {
            if let Some(adapter) = display.adapter() {
                adapter.destroy_window(native);
            }
            return EGL_NO_SURFACE;
        }

        self.insert_surface(Handle::from_ptr(surface), native);
        debug!("window surface {:?} for {:?} (as {:?})", surface, requested, native);
        surface
    }

    pub unsafe fn destroy_surface(&self, dpy: EGLDisplay, surface: EGLSurface) -> EGLBoolean {
        tls::clear_error();
        let Some(display) = self.display(Handle::from_ptr(dpy)) else {
            return fail(EglError::BadDisplay, EGL_FALSE);
        };

        let ok = call_hook!(self.hooks().egl, eglDestroySurface(dpy, surface) else EGL_FALSE);
        if ok != EGL_TRUE {
            return ok;
        }

        if let Some(window) = self.remove_surface(Handle::from_ptr(surface)) {
            if let Some(adapter) = display.adapter() {
                adapter.destroy_window(window);
            }
        }
        ok
    }
}

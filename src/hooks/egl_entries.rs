// EGL entry-point manifests

use std::ffi::{c_char, c_void};

use crate::ffi::*;

hook_table! {
    /// EGL 1.5 core entry points of the system libEGL
    pub struct EglTable {
        fn eglChooseConfig(dpy: EGLDisplay, attrib_list: *const EGLint, configs: *mut EGLConfig, config_size: EGLint, num_config: *mut EGLint) -> EGLBoolean;
        fn eglCopyBuffers(dpy: EGLDisplay, surface: EGLSurface, target: EGLNativePixmapType) -> EGLBoolean;
        fn eglCreateContext(dpy: EGLDisplay, config: EGLConfig, share_context: EGLContext, attrib_list: *const EGLint) -> EGLContext;
        fn eglCreatePbufferSurface(dpy: EGLDisplay, config: EGLConfig, attrib_list: *const EGLint) -> EGLSurface;
        fn eglCreatePixmapSurface(dpy: EGLDisplay, config: EGLConfig, pixmap: EGLNativePixmapType, attrib_list: *const EGLint) -> EGLSurface;
        fn eglCreateWindowSurface(dpy: EGLDisplay, config: EGLConfig, win: EGLNativeWindowType, attrib_list: *const EGLint) -> EGLSurface;
        fn eglDestroyContext(dpy: EGLDisplay, ctx: EGLContext) -> EGLBoolean;
        fn eglDestroySurface(dpy: EGLDisplay, surface: EGLSurface) -> EGLBoolean;
        fn eglGetConfigAttrib(dpy: EGLDisplay, config: EGLConfig, attribute: EGLint, value: *mut EGLint) -> EGLBoolean;
        fn eglGetConfigs(dpy: EGLDisplay, configs: *mut EGLConfig, config_size: EGLint, num_config: *mut EGLint) -> EGLBoolean;
        fn eglGetCurrentDisplay() -> EGLDisplay;
        fn eglGetCurrentSurface(readdraw: EGLint) -> EGLSurface;
        fn eglGetDisplay(display_id: EGLNativeDisplayType) -> EGLDisplay;
        fn eglGetError() -> EGLint;
        fn eglGetProcAddress(procname: *const c_char) -> EGLFuncPtr;
        fn eglInitialize(dpy: EGLDisplay, major: *mut EGLint, minor: *mut EGLint) -> EGLBoolean;
        fn eglMakeCurrent(dpy: EGLDisplay, draw: EGLSurface, read: EGLSurface, ctx: EGLContext) -> EGLBoolean;
        fn eglQueryContext(dpy: EGLDisplay, ctx: EGLContext, attribute: EGLint, value: *mut EGLint) -> EGLBoolean;
        fn eglQueryString(dpy: EGLDisplay, name: EGLint) -> *const c_char;
        fn eglQuerySurface(dpy: EGLDisplay, surface: EGLSurface, attribute: EGLint, value: *mut EGLint) -> EGLBoolean;
        fn eglSwapBuffers(dpy: EGLDisplay, surface: EGLSurface) -> EGLBoolean;
        fn eglTerminate(dpy: EGLDisplay) -> EGLBoolean;
        fn eglWaitGL() -> EGLBoolean;
        fn eglWaitNative(engine: EGLint) -> EGLBoolean;
        fn eglBindTexImage(dpy: EGLDisplay, surface: EGLSurface, buffer: EGLint) -> EGLBoolean;
        fn eglReleaseTexImage(dpy: EGLDisplay, surface: EGLSurface, buffer: EGLint) -> EGLBoolean;
        fn eglSurfaceAttrib(dpy: EGLDisplay, surface: EGLSurface, attribute: EGLint, value: EGLint) -> EGLBoolean;
        fn eglSwapInterval(dpy: EGLDisplay, interval: EGLint) -> EGLBoolean;
        fn eglBindAPI(api: EGLenum) -> EGLBoolean;
        fn eglQueryAPI() -> EGLenum;
        fn eglCreatePbufferFromClientBuffer(dpy: EGLDisplay, buftype: EGLenum, buffer: EGLClientBuffer, config: EGLConfig, attrib_list: *const EGLint) -> EGLSurface;
        fn eglReleaseThread() -> EGLBoolean;
        fn eglWaitClient() -> EGLBoolean;
        fn eglGetCurrentContext() -> EGLContext;
        fn eglCreateSync(dpy: EGLDisplay, type_: EGLenum, attrib_list: *const EGLAttrib) -> EGLSync;
        fn eglDestroySync(dpy: EGLDisplay, sync: EGLSync) -> EGLBoolean;
        fn eglClientWaitSync(dpy: EGLDisplay, sync: EGLSync, flags: EGLint, timeout: EGLTime) -> EGLint;
        fn eglGetSyncAttrib(dpy: EGLDisplay, sync: EGLSync, attribute: EGLint, value: *mut EGLAttrib) -> EGLBoolean;
        fn eglCreateImage(dpy: EGLDisplay, ctx: EGLContext, target: EGLenum, buffer: EGLClientBuffer, attrib_list: *const EGLAttrib) -> EGLImage;
        fn eglDestroyImage(dpy: EGLDisplay, image: EGLImage) -> EGLBoolean;
        fn eglGetPlatformDisplay(platform: EGLenum, native_display: *mut c_void, attrib_list: *const EGLAttrib) -> EGLDisplay;
        fn eglCreatePlatformWindowSurface(dpy: EGLDisplay, config: EGLConfig, native_window: *mut c_void, attrib_list: *const EGLAttrib) -> EGLSurface;
        fn eglCreatePlatformPixmapSurface(dpy: EGLDisplay, config: EGLConfig, native_pixmap: *mut c_void, attrib_list: *const EGLAttrib) -> EGLSurface;
        fn eglWaitSync(dpy: EGLDisplay, sync: EGLSync, flags: EGLint) -> EGLBoolean;
    }
}

hook_table! {
    /// EGL extension entry points, only reachable through `eglGetProcAddress`
    pub struct EglExtTable {
        fn eglGetPlatformDisplayEXT(platform: EGLenum, native_display: *mut c_void, attrib_list: *const EGLint) -> EGLDisplay;
        fn eglCreatePlatformWindowSurfaceEXT(dpy: EGLDisplay, config: EGLConfig, native_window: *mut c_void, attrib_list: *const EGLint) -> EGLSurface;
        fn eglCreatePlatformPixmapSurfaceEXT(dpy: EGLDisplay, config: EGLConfig, native_pixmap: *mut c_void, attrib_list: *const EGLint) -> EGLSurface;
        fn eglLockSurfaceKHR(dpy: EGLDisplay, surface: EGLSurface, attrib_list: *const EGLint) -> EGLBoolean;
        fn eglUnlockSurfaceKHR(dpy: EGLDisplay, surface: EGLSurface) -> EGLBoolean;
        fn eglCreateImageKHR(dpy: EGLDisplay, ctx: EGLContext, target: EGLenum, buffer: EGLClientBuffer, attrib_list: *const EGLint) -> EGLImageKHR;
        fn eglDestroyImageKHR(dpy: EGLDisplay, image: EGLImageKHR) -> EGLBoolean;
        fn eglCreateSyncKHR(dpy: EGLDisplay, type_: EGLenum, attrib_list: *const EGLint) -> EGLSyncKHR;
        fn eglDestroySyncKHR(dpy: EGLDisplay, sync: EGLSyncKHR) -> EGLBoolean;
        fn eglClientWaitSyncKHR(dpy: EGLDisplay, sync: EGLSyncKHR, flags: EGLint, timeout: EGLTimeKHR) -> EGLint;
        fn eglSignalSyncKHR(dpy: EGLDisplay, sync: EGLSyncKHR, mode: EGLenum) -> EGLBoolean;
        fn eglGetSyncAttribKHR(dpy: EGLDisplay, sync: EGLSyncKHR, attribute: EGLint, value: *mut EGLint) -> EGLBoolean;
        fn eglWaitSyncKHR(dpy: EGLDisplay, sync: EGLSyncKHR, flags: EGLint) -> EGLint;
        fn eglCreateStreamKHR(dpy: EGLDisplay, attrib_list: *const EGLint) -> EGLStreamKHR;
        fn eglDestroyStreamKHR(dpy: EGLDisplay, stream: EGLStreamKHR) -> EGLBoolean;
        fn eglStreamAttribKHR(dpy: EGLDisplay, stream: EGLStreamKHR, attribute: EGLenum, value: EGLint) -> EGLBoolean;
        fn eglQueryStreamKHR(dpy: EGLDisplay, stream: EGLStreamKHR, attribute: EGLenum, value: *mut EGLint) -> EGLBoolean;
        fn eglQueryStreamu64KHR(dpy: EGLDisplay, stream: EGLStreamKHR, attribute: EGLenum, value: *mut EGLuint64KHR) -> EGLBoolean;
        fn eglQueryStreamTimeKHR(dpy: EGLDisplay, stream: EGLStreamKHR, attribute: EGLenum, value: *mut EGLTimeKHR) -> EGLBoolean;
        fn eglCreateStreamProducerSurfaceKHR(dpy: EGLDisplay, config: EGLConfig, stream: EGLStreamKHR, attrib_list: *const EGLint) -> EGLSurface;
        fn eglStreamConsumerGLTextureExternalKHR(dpy: EGLDisplay, stream: EGLStreamKHR) -> EGLBoolean;
        fn eglStreamConsumerAcquireKHR(dpy: EGLDisplay, stream: EGLStreamKHR) -> EGLBoolean;
        fn eglStreamConsumerReleaseKHR(dpy: EGLDisplay, stream: EGLStreamKHR) -> EGLBoolean;
        fn eglGetStreamFileDescriptorKHR(dpy: EGLDisplay, stream: EGLStreamKHR) -> EGLNativeFileDescriptorKHR;
        fn eglCreateStreamFromFileDescriptorKHR(dpy: EGLDisplay, file_descriptor: EGLNativeFileDescriptorKHR) -> EGLStreamKHR;
        fn eglGetSystemTimeFrequencyNV() -> EGLuint64NV;
        fn eglGetSystemTimeNV() -> EGLuint64NV;
        fn eglPresentationTimeANDROID(dpy: EGLDisplay, surface: EGLSurface, time: EGLnsecsANDROID) -> EGLBoolean;
        fn eglSwapBuffersWithDamageKHR(dpy: EGLDisplay, surface: EGLSurface, rects: *mut EGLint, n_rects: EGLint) -> EGLBoolean;
        fn eglGetNativeClientBufferANDROID(buffer: *const AHardwareBuffer) -> EGLClientBuffer;
        fn eglSetDamageRegionKHR(dpy: EGLDisplay, surface: EGLSurface, rects: *mut EGLint, n_rects: EGLint) -> EGLBoolean;
        fn eglDupNativeFenceFDANDROID(dpy: EGLDisplay, sync: EGLSyncKHR) -> EGLint;
    }
}

//! Smoke test for the EGL/GLES exports
//!
//! Runs the usual client bring-up against the system driver: display,
//! config, pbuffer, GLES2 context, then the extension-aware GL getters.

use egl_wrapper_shim::c_api::*;
use egl_wrapper_shim::ffi::*;
use egl_wrapper_shim::gl_api::*;
use std::ffi::CStr;
use std::ptr;

unsafe fn egl_string(dpy: EGLDisplay, name: EGLint) -> String {
    let s = eglQueryString(dpy, name);
    if s.is_null() {
        "(null)".to_string()
    } else {
        CStr::from_ptr(s).to_string_lossy().into_owned()
    }
}

unsafe fn gl_string(name: GLenum) -> String {
    let s = glGetString(name);
    if s.is_null() {
        "(null)".to_string()
    } else {
        CStr::from_ptr(s as *const _).to_string_lossy().into_owned()
    }
}

fn main() {
    // The library constructor may already have installed a subscriber
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    println!("=== EGL Wrapper Smoke Test ===\n");

    // Test 1: Client extensions
    println!("--- Test 1: Client extensions ---");
    unsafe {
        println!("  {}", egl_string(EGL_NO_DISPLAY, EGL_EXTENSIONS));
    }

    // Test 2: Display
    println!("\n--- Test 2: Display ---");
    let dpy = unsafe { eglGetDisplay(ptr::null_mut()) };
    if dpy.is_null() {
        println!("  FAILED: eglGetDisplay returned EGL_NO_DISPLAY (error 0x{:x})", unsafe {
            eglGetError()
        });
        return;
    }
    let (mut major, mut minor) = (0, 0);
    unsafe {
        if eglInitialize(dpy, &mut major, &mut minor) != EGL_TRUE {
            println!("  FAILED: eglInitialize (error 0x{:x})", eglGetError());
            return;
        }
        println!("  OK: EGL {}.{}", major, minor);
        println!("    Vendor: {}", egl_string(dpy, EGL_VENDOR));
        println!("    APIs: {}", egl_string(dpy, EGL_CLIENT_APIS));
        println!("    Extensions: {}", egl_string(dpy, EGL_EXTENSIONS));
    }

    // Test 3: Config
    println!("\n--- Test 3: Config ---");
    let config_attribs = [
        EGL_SURFACE_TYPE,
        EGL_PBUFFER_BIT,
        EGL_RENDERABLE_TYPE,
        EGL_OPENGL_ES2_BIT,
        EGL_NONE,
    ];
    let mut config: EGLConfig = ptr::null_mut();
    let mut num_config = 0;
    unsafe {
        let ok = eglChooseConfig(dpy, config_attribs.as_ptr(), &mut config, 1, &mut num_config);
        if ok != EGL_TRUE || num_config == 0 {
            println!("  FAILED: no pbuffer-capable GLES2 config");
            eglTerminate(dpy);
            return;
        }
    }
    println!("  OK: {} config(s)", num_config);

    // Test 4: Pbuffer surface and context
    println!("\n--- Test 4: Surface and context ---");
    let surface_attribs = [EGL_WIDTH, 16, EGL_HEIGHT, 16, EGL_NONE];
    let context_attribs = [EGL_CONTEXT_CLIENT_VERSION, 2, EGL_NONE];
    let (surface, context) = unsafe {
        let surface = eglCreatePbufferSurface(dpy, config, surface_attribs.as_ptr());
        let context = eglCreateContext(dpy, config, EGL_NO_CONTEXT, context_attribs.as_ptr());
        (surface, context)
    };
    if surface.is_null() || context.is_null() {
        println!("  FAILED: surface {:?}, context {:?}", surface, context);
        unsafe { eglTerminate(dpy) };
        return;
    }
    unsafe {
        if eglMakeCurrent(dpy, surface, surface, context) != EGL_TRUE {
            println!("  FAILED: eglMakeCurrent (error 0x{:x})", eglGetError());
        } else {
            println!("  OK: context current");
        }
    }

    // Test 5: GL strings
    println!("\n--- Test 5: GL strings ---");
    unsafe {
        println!("  Vendor: {}", gl_string(GL_VENDOR));
        println!("  Renderer: {}", gl_string(GL_RENDERER));
        println!("  Version: {}", gl_string(GL_VERSION));

        let mut count = 0;
        glGetIntegerv(GL_NUM_EXTENSIONS, &mut count);
        println!("  Extensions ({}): {}", count, gl_string(GL_EXTENSIONS));
    }

    // Test 6: Swap
    println!("\n--- Test 6: Swap ---");
    unsafe {
        glClearColor(0.0, 0.5, 1.0, 1.0);
        glClear(0x4000);
        let ok = eglSwapBuffers(dpy, surface);
        println!("  eglSwapBuffers: {}", if ok == EGL_TRUE { "OK" } else { "failed" });
    }

    // Cleanup
    println!("\n--- Cleanup ---");
    unsafe {
        eglMakeCurrent(dpy, EGL_NO_SURFACE, EGL_NO_SURFACE, EGL_NO_CONTEXT);
        eglDestroyContext(dpy, context);
        eglDestroySurface(dpy, surface);
        eglTerminate(dpy);
        eglReleaseThread();
    }
    println!("  OK: Cleaned up");

    println!("\n=== Done ===");
}

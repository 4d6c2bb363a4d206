//! GL extension virtualization and the `GL_EXT_read_format_bgra` probe

use std::ffi::{c_char, c_void};
use std::ptr;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::extensions::{GlExtensionCache, READ_FORMAT_BGRA};
use crate::ffi::*;
use crate::hooks::{GlExtTable, GlTable};
use crate::registry::{driver_str, Context, DispatchRuntime, Handle};
use crate::tls;

/// Whether `glReadPixels(GL_BGRA_EXT)` works on the current context
///
/// Renders nothing: a 1x1 texture is attached to a scratch framebuffer and
/// read back as BGRA. `GL_INVALID_OPERATION` means the driver advertises
/// the extension without supporting it. Missing entry points count as
/// unsupported.
///
/// # Safety
/// A context using `gl` must be current on the calling thread.
pub unsafe fn probe_bgra(gl: &GlTable, ext: &GlExtTable) -> bool {
    let (
        Some(gen_textures),
        Some(bind_texture),
        Some(tex_image),
        Some(delete_textures),
        Some(read_pixels),
        Some(get_error),
    ) = (
        gl.glGenTextures,
        gl.glBindTexture,
        gl.glTexImage2D,
        gl.glDeleteTextures,
        gl.glReadPixels,
        gl.glGetError,
    )
    else {
        warn!("BGRA probe: texture entry points missing");
        return false;
    };

    let (Some(gen_framebuffers), Some(bind_framebuffer), Some(framebuffer_texture), Some(delete_framebuffers)) = (
        gl.glGenFramebuffers.or(ext.glGenFramebuffersOES),
        gl.glBindFramebuffer.or(ext.glBindFramebufferOES),
        gl.glFramebufferTexture2D.or(ext.glFramebufferTexture2DOES),
        gl.glDeleteFramebuffers.or(ext.glDeleteFramebuffersOES),
    ) else {
        warn!("BGRA probe: framebuffer entry points missing");
        return false;
    };

    // Errors left over from the application must not count against the probe
    for _ in 0..16 {
        if get_error() == GL_NO_ERROR {
            break;
        }
    }

    let mut texture: GLuint = 0;
    let mut framebuffer: GLuint = 0;
    gen_textures(1, &mut texture);
    bind_texture(GL_TEXTURE_2D, texture);
    tex_image(
        GL_TEXTURE_2D,
        0,
        GL_RGBA as GLint,
        1,
        1,
        0,
        GL_RGBA,
        GL_UNSIGNED_BYTE,
        ptr::null(),
    );
    gen_framebuffers(1, &mut framebuffer);
    bind_framebuffer(GL_FRAMEBUFFER, framebuffer);
    framebuffer_texture(GL_FRAMEBUFFER, GL_COLOR_ATTACHMENT0, GL_TEXTURE_2D, texture, 0);

    let mut pixel = [0u8; 4];
    read_pixels(0, 0, 1, 1, GL_BGRA_EXT, GL_UNSIGNED_BYTE, pixel.as_mut_ptr() as *mut c_void);
    let valid = get_error() != GL_INVALID_OPERATION;

    bind_framebuffer(GL_FRAMEBUFFER, 0);
    delete_framebuffers(1, &framebuffer);
    bind_texture(GL_TEXTURE_2D, 0);
    delete_textures(1, &texture);

    valid
}

impl DispatchRuntime {
    /// Fill the context's extension cache on its first `eglMakeCurrent`
    pub(crate) unsafe fn cache_extensions(&self, context: &Context) {
        if context.extensions().is_some() {
            return;
        }
        let gl = self.hooks().gl(context.version());
        let Some(get_string) = gl.glGetString else {
            debug!("glGetString missing, context {:?} keeps driver answers", context.handle());
            return;
        };

        let driver = driver_str(get_string(GL_EXTENSIONS) as *const c_char).into_owned();
        let advertises_bgra = driver.split_whitespace().any(|name| name == READ_FORMAT_BGRA);
        let bgra_valid = advertises_bgra && self.bgra_valid(gl);
        context.cache_extensions(|| GlExtensionCache::new(&driver, bgra_valid));
    }

    /// Result of the BGRA probe, run at most once per runtime
    unsafe fn bgra_valid(&self, gl: &GlTable) -> bool {
        *self.bgra_probe().get_or_init(|| {
            if !self.config().read_format_bgra_check {
                info!("{} hidden, probe disabled", READ_FORMAT_BGRA);
                return false;
            }
            let valid = unsafe { probe_bgra(gl, &self.hooks().gl_ext) };
            info!("{} probe: {}", READ_FORMAT_BGRA, if valid { "works" } else { "broken" });
            valid
        })
    }

    /// Context current on this thread, if its extensions are cached
    fn current_cached_context(&self) -> Option<Arc<Context>> {
        let current = self
            .hooks()
            .egl
            .eglGetCurrentContext
            .map_or(ptr::null_mut(), |get| unsafe { get() });
        self.context(Handle::from_ptr(current))
            .filter(|context| context.extensions().is_some())
    }

    fn cached_extension_count(&self) -> Option<usize> {
        self.current_cached_context()
            .and_then(|context| context.extensions().map(|cache| cache.count()))
    }

    pub unsafe fn gl_get_string(&self, name: GLenum) -> *const GLubyte {
        if name == GL_EXTENSIONS {
            if let Some(context) = self.current_cached_context() {
                return context
                    .extensions()
                    .map_or(ptr::null(), |cache| cache.full().as_ptr() as *const GLubyte);
            }
        }
        tls::with_current_gl(|gl| match gl.and_then(|gl| gl.glGetString) {
            Some(get) => get(name),
            None => {
                warn!("glGetString without a current context");
                ptr::null()
            }
        })
    }

    pub unsafe fn gl_get_stringi(&self, name: GLenum, index: GLuint) -> *const GLubyte {
        if name == GL_EXTENSIONS {
            if let Some(context) = self.current_cached_context() {
                return context
                    .extensions()
                    .and_then(|cache| cache.token(index as usize))
                    .map_or(ptr::null(), |token| token.as_ptr() as *const GLubyte);
            }
        }
        tls::with_current_gl(|gl| match gl.and_then(|gl| gl.glGetStringi) {
            Some(get) => get(name, index),
            None => {
                warn!("glGetStringi is not available");
                ptr::null()
            }
        })
    }

    pub unsafe fn gl_get_integerv(&self, pname: GLenum, data: *mut GLint) {
        if pname == GL_NUM_EXTENSIONS && !data.is_null() {
            if let Some(count) = self.cached_extension_count() {
                *data = count as GLint;
                return;
            }
        }
        tls::with_current_gl(|gl| {
            if let Some(get) = gl.and_then(|gl| gl.glGetIntegerv) {
                get(pname, data);
            }
        })
    }

    pub unsafe fn gl_get_integer64v(&self, pname: GLenum, data: *mut GLint64) {
        if pname == GL_NUM_EXTENSIONS && !data.is_null() {
            if let Some(count) = self.cached_extension_count() {
                *data = count as GLint64;
                return;
            }
        }
        tls::with_current_gl(|gl| {
            if let Some(get) = gl.and_then(|gl| gl.glGetInteger64v) {
                get(pname, data);
            }
        })
    }

    pub unsafe fn gl_get_floatv(&self, pname: GLenum, data: *mut GLfloat) {
        if pname == GL_NUM_EXTENSIONS && !data.is_null() {
            if let Some(count) = self.cached_extension_count() {
                *data = count as GLfloat;
                return;
            }
        }
        tls::with_current_gl(|gl| {
            if let Some(get) = gl.and_then(|gl| gl.glGetFloatv) {
                get(pname, data);
            }
        })
    }

    pub unsafe fn gl_get_booleanv(&self, pname: GLenum, data: *mut GLboolean) {
        if pname == GL_NUM_EXTENSIONS && !data.is_null() {
            if let Some(count) = self.cached_extension_count() {
                *data = if count > 0 { GL_TRUE } else { GL_FALSE };
                return;
            }
        }
        tls::with_current_gl(|gl| {
            if let Some(get) = gl.and_then(|gl| gl.glGetBooleanv) {
                get(pname, data);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    use crate::attribs::AttribList;
    use crate::config::Config;
    use crate::dispatch::fake;

    fn current_context(runtime: &DispatchRuntime, version: EGLint) -> EGLContext {
        unsafe {
            let dpy = runtime.get_display(EGL_DEFAULT_DISPLAY);
            runtime.initialize(dpy, ptr::null_mut(), ptr::null_mut());
            let attribs = [EGL_CONTEXT_CLIENT_VERSION, version, EGL_NONE];
            let ctx = runtime.create_context(
                dpy,
                ptr::null_mut(),
                EGL_NO_CONTEXT,
                &AttribList::from_ints(attribs.as_ptr()),
            );
            assert_eq!(runtime.make_current(dpy, EGL_NO_SURFACE, EGL_NO_SURFACE, ctx), EGL_TRUE);
            ctx
        }
    }

    fn extensions(runtime: &DispatchRuntime) -> String {
        unsafe {
            let ptr = runtime.gl_get_string(GL_EXTENSIONS);
            CStr::from_ptr(ptr as *const c_char).to_string_lossy().into_owned()
        }
    }

    fn checking() -> Config {
        Config {
            read_format_bgra_check: true,
            ..Config::default()
        }
    }

    #[test]
    fn test_bgra_hidden_when_probe_disabled() {
        let runtime = fake::runtime();
        current_context(&runtime, 2);
        assert_eq!(extensions(&runtime), "GL_OES_depth24 GL_OES_rgb8_rgba8");
        assert!(!fake::calls().iter().any(|c| c.starts_with("glReadPixels")));
    }

    #[test]
    fn test_bgra_kept_when_probe_passes() {
        let runtime = fake::runtime_with(checking());
        current_context(&runtime, 2);
        assert!(extensions(&runtime).contains(READ_FORMAT_BGRA));
        assert!(fake::calls().contains(&format!("glReadPixels({:#x})", GL_BGRA_EXT)));
    }

    #[test]
    fn test_bgra_stripped_when_probe_fails() {
        let runtime = fake::runtime_with(checking());
        fake::with_state(|state| state.reject_bgra = true);
        current_context(&runtime, 1);
        assert_eq!(extensions(&runtime), "GL_OES_depth24 GL_OES_rgb8_rgba8");
    }

    #[test]
    fn test_probe_runs_once() {
        let runtime = fake::runtime_with(checking());
        current_context(&runtime, 2);
        current_context(&runtime, 2);
        let probes = fake::calls()
            .iter()
            .filter(|c| c.starts_with("glReadPixels"))
            .count();
        assert_eq!(probes, 1);
    }

    #[test]
    fn test_probe_without_framebuffers() {
        let mut gl = GlTable::empty();
        gl.glGetError = fake_hooks_error();
        assert!(!unsafe { probe_bgra(&gl, &GlExtTable::empty()) });
    }

    fn fake_hooks_error() -> Option<unsafe extern "C" fn() -> GLenum> {
        fake::hooks().gl[0].glGetError
    }

    #[test]
    fn test_virtual_counts_and_tokens() {
        let runtime = fake::runtime();
        current_context(&runtime, 3);
        unsafe {
            let mut count: GLint = 0;
            runtime.gl_get_integerv(GL_NUM_EXTENSIONS, &mut count);
            assert_eq!(count, 2);

            let mut wide: GLint64 = 0;
            runtime.gl_get_integer64v(GL_NUM_EXTENSIONS, &mut wide);
            assert_eq!(wide, 2);

            let first = runtime.gl_get_stringi(GL_EXTENSIONS, 0);
            assert_eq!(CStr::from_ptr(first as *const c_char), c"GL_OES_depth24");
            let second = runtime.gl_get_stringi(GL_EXTENSIONS, 1);
            assert_eq!(CStr::from_ptr(second as *const c_char), c"GL_OES_rgb8_rgba8");
            assert!(runtime.gl_get_stringi(GL_EXTENSIONS, 2).is_null());

            // Anything else still reaches the driver
            let mut other: GLint = 0;
            runtime.gl_get_integerv(0x0D33, &mut other);
            assert_eq!(other, -7);
            let renderer = runtime.gl_get_string(0x1F01);
            assert_eq!(CStr::from_ptr(renderer as *const c_char), c"Fake GL");
        }
    }

    #[test]
    fn test_no_current_context() {
        let runtime = fake::runtime();
        unsafe {
            assert!(runtime.gl_get_string(GL_EXTENSIONS).is_null());
            let mut count: GLint = 11;
            runtime.gl_get_integerv(GL_NUM_EXTENSIONS, &mut count);
            assert_eq!(count, 11);
        }
    }
}

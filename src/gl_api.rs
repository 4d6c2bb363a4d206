//! GLES entry points
//!
//! Each export forwards to the calling thread's current GL table. The
//! string and integer getters that report extensions are answered by the
//! runtime instead, so the extension list matches what the wrapper
//! validated for the current context.

#![allow(non_snake_case)]

use std::ffi::c_void;

use tracing::warn;

use crate::c_api::runtime;
use crate::ffi::*;
use crate::hooks::for_each_gl_entry;
use crate::tls;

/// Value a trampoline returns when it has nothing to call
pub trait Sentinel {
    fn sentinel() -> Self;
}

impl Sentinel for () {
    fn sentinel() -> Self {}
}

macro_rules! zero_sentinel {
    ($($ty:ty),*) => {
        $(
            impl Sentinel for $ty {
                fn sentinel() -> Self {
                    0
                }
            }
        )*
    };
}

zero_sentinel!(u8, u32, i32);

impl Sentinel for *const u8 {
    fn sentinel() -> Self {
        std::ptr::null()
    }
}

impl Sentinel for *mut c_void {
    fn sentinel() -> Self {
        std::ptr::null_mut()
    }
}

fn not_implemented<T: Sentinel>(name: &str) -> T {
    warn!("{} is not implemented for the current context", name);
    T::sentinel()
}

macro_rules! gl_trampolines {
    (
        shared { $($shared:tt)* }
        legacy { $($legacy:tt)* }
        modern { $($modern:tt)* }
        virtual_shared { $($virtual_shared:tt)* }
        virtual_modern { $($virtual_modern:tt)* }
    ) => {
        gl_trampolines!(@emit $($shared)* $($legacy)* $($modern)*);
    };
    (@emit $( fn $func:ident ( $($arg:ident : $ty:ty),* $(,)? ) $(-> $ret:ty)? ; )*) => {
        $(
            #[no_mangle]
            #[allow(clippy::too_many_arguments)]
            pub unsafe extern "C" fn $func($($arg: $ty),*) $(-> $ret)? {
                match tls::with_current_gl(|gl| gl.and_then(|table| table.$func)) {
                    Some(func) => func($($arg),*),
                    None => not_implemented(stringify!($func)),
                }
            }
        )*
    };
}

for_each_gl_entry!(gl_trampolines);

// =============================================================================
// Extension-aware getters
// =============================================================================

#[no_mangle]
pub unsafe extern "C" fn glGetString(name: GLenum) -> *const GLubyte {
    runtime().gl_get_string(name)
}

#[no_mangle]
pub unsafe extern "C" fn glGetStringi(name: GLenum, index: GLuint) -> *const GLubyte {
    runtime().gl_get_stringi(name, index)
}

#[no_mangle]
pub unsafe extern "C" fn glGetIntegerv(pname: GLenum, data: *mut GLint) {
    runtime().gl_get_integerv(pname, data)
}

#[no_mangle]
pub unsafe extern "C" fn glGetInteger64v(pname: GLenum, data: *mut GLint64) {
    runtime().gl_get_integer64v(pname, data)
}

#[no_mangle]
pub unsafe extern "C" fn glGetFloatv(pname: GLenum, data: *mut GLfloat) {
    runtime().gl_get_floatv(pname, data)
}

#[no_mangle]
pub unsafe extern "C" fn glGetBooleanv(pname: GLenum, data: *mut GLboolean) {
    runtime().gl_get_booleanv(pname, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::fake;
    use crate::hooks::GlesVersion;
    use std::sync::Arc;

    #[test]
    fn test_trampolines_without_context() {
        tls::reset();
        unsafe {
            assert_eq!(glGetError(), 0);
            assert_eq!(glIsEnabled(0x0B71), 0);
            assert_eq!(glGetAttribLocation(1, c"position".as_ptr()), 0);
            assert!(glMapBufferRange(0, 0, 16, 0).is_null());
            glFlush();
        }
    }

    #[test]
    fn test_trampolines_forward_to_current_table() {
        let _runtime = fake::runtime();
        tls::set_current(Arc::new(fake::hooks()), GlesVersion::Es2);
        fake::with_state(|state| {
            state.reject_bgra = true;
        });

        unsafe {
            glReadPixels(0, 0, 1, 1, GL_BGRA_EXT, GL_UNSIGNED_BYTE, std::ptr::null_mut());
            assert_eq!(glGetError(), GL_INVALID_OPERATION);
            assert_eq!(glGetError(), 0);
            // Not in the fake table
            assert_eq!(glIsEnabled(0x0B71), 0);
        }
        assert_eq!(fake::calls(), vec![format!("glReadPixels({:#x})", GL_BGRA_EXT)]);

        tls::clear_current();
        unsafe {
            glReadPixels(0, 0, 1, 1, GL_BGRA_EXT, GL_UNSIGNED_BYTE, std::ptr::null_mut());
        }
        assert_eq!(fake::calls().len(), 1);
    }

    #[test]
    fn test_sentinels() {
        assert_eq!(<u8 as Sentinel>::sentinel(), 0);
        assert_eq!(<i32 as Sentinel>::sentinel(), 0);
        assert!(<*const u8 as Sentinel>::sentinel().is_null());
        assert!(<*mut c_void as Sentinel>::sentinel().is_null());
    }
}

//! Per-thread dispatch state: the EGL error slot and the GL table bound by
//! the last successful `eglMakeCurrent`.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use crate::error::EglError;
use crate::ffi::{EGLint, EGL_SUCCESS};
use crate::hooks::{GlTable, GlesVersion, Hooks};

struct Current {
    hooks: Arc<Hooks>,
    version: GlesVersion,
}

thread_local! {
    static ERROR: Cell<EGLint> = const { Cell::new(EGL_SUCCESS) };
    static CURRENT: RefCell<Option<Current>> = const { RefCell::new(None) };
}

pub fn clear_error() {
    ERROR.with(|e| e.set(EGL_SUCCESS));
}

pub fn set_error(error: EglError) {
    ERROR.with(|e| e.set(error.code()));
}

pub fn error() -> EGLint {
    ERROR.with(|e| e.get())
}

/// Bind `hooks.gl[version]` to the calling thread
pub fn set_current(hooks: Arc<Hooks>, version: GlesVersion) {
    CURRENT.with(|c| *c.borrow_mut() = Some(Current { hooks, version }));
}

pub fn clear_current() {
    CURRENT.with(|c| *c.borrow_mut() = None);
}

pub fn current_version() -> Option<GlesVersion> {
    CURRENT.with(|c| c.borrow().as_ref().map(|cur| cur.version))
}

/// Run `f` against the calling thread's GL table
pub fn with_current_gl<R>(f: impl FnOnce(Option<&GlTable>) -> R) -> R {
    CURRENT.with(|c| {
        let current = c.borrow();
        f(current.as_ref().map(|cur| cur.hooks.gl(cur.version)))
    })
}

/// Reset everything, as `eglReleaseThread` does
pub fn reset() {
    clear_error();
    clear_current();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_slot() {
        reset();
        assert_eq!(error(), EGL_SUCCESS);
        set_error(EglError::BadDisplay);
        assert_eq!(error(), EglError::BadDisplay.code());
        clear_error();
        assert_eq!(error(), EGL_SUCCESS);
    }

    #[test]
    fn test_current_is_per_thread() {
        set_current(Arc::new(Hooks::empty()), GlesVersion::Es2);
        assert_eq!(current_version(), Some(GlesVersion::Es2));
        assert!(with_current_gl(|gl| gl.is_some()));

        let other = std::thread::spawn(|| (current_version(), error()))
            .join()
            .unwrap();
        assert_eq!(other, (None, EGL_SUCCESS));

        reset();
        assert!(with_current_gl(|gl| gl.is_none()));
    }
}

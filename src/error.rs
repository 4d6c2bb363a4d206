//! Error types for the EGL wrapper shim

use thiserror::Error;

use crate::ffi::{self, EGLint};

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to open {path}: {reason}")]
    LibraryOpen { path: String, reason: String },

    #[error("eglGetProcAddress is not exported by the system EGL")]
    MissingProcAddress,

    #[error("symbol {0} not found")]
    MissingSymbol(String),

    #[error("gralloc error: {0}")]
    Gralloc(String),

    #[error("wayland error: {0}")]
    Wayland(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// EGL error taxonomy as stored in the per-thread error slot.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EglError {
    #[error("EGL_SUCCESS")]
    Success,
    #[error("EGL_NOT_INITIALIZED")]
    NotInitialized,
    #[error("EGL_BAD_ACCESS")]
    BadAccess,
    #[error("EGL_BAD_ALLOC")]
    BadAlloc,
    #[error("EGL_BAD_ATTRIBUTE")]
    BadAttribute,
    #[error("EGL_BAD_CONFIG")]
    BadConfig,
    #[error("EGL_BAD_CONTEXT")]
    BadContext,
    #[error("EGL_BAD_CURRENT_SURFACE")]
    BadCurrentSurface,
    #[error("EGL_BAD_DISPLAY")]
    BadDisplay,
    #[error("EGL_BAD_MATCH")]
    BadMatch,
    #[error("EGL_BAD_NATIVE_PIXMAP")]
    BadNativePixmap,
    #[error("EGL_BAD_NATIVE_WINDOW")]
    BadNativeWindow,
    #[error("EGL_BAD_PARAMETER")]
    BadParameter,
    #[error("EGL_BAD_SURFACE")]
    BadSurface,
    #[error("EGL_CONTEXT_LOST")]
    ContextLost,
    #[error("unknown EGL error 0x{0:x}")]
    Other(EGLint),
}

impl EglError {
    /// Numeric value as returned by `eglGetError`
    pub fn code(self) -> EGLint {
        match self {
            EglError::Success => ffi::EGL_SUCCESS,
            EglError::NotInitialized => ffi::EGL_NOT_INITIALIZED,
            EglError::BadAccess => ffi::EGL_BAD_ACCESS,
            EglError::BadAlloc => ffi::EGL_BAD_ALLOC,
            EglError::BadAttribute => ffi::EGL_BAD_ATTRIBUTE,
            EglError::BadConfig => ffi::EGL_BAD_CONFIG,
            EglError::BadContext => ffi::EGL_BAD_CONTEXT,
            EglError::BadCurrentSurface => ffi::EGL_BAD_CURRENT_SURFACE,
            EglError::BadDisplay => ffi::EGL_BAD_DISPLAY,
            EglError::BadMatch => ffi::EGL_BAD_MATCH,
            EglError::BadNativePixmap => ffi::EGL_BAD_NATIVE_PIXMAP,
            EglError::BadNativeWindow => ffi::EGL_BAD_NATIVE_WINDOW,
            EglError::BadParameter => ffi::EGL_BAD_PARAMETER,
            EglError::BadSurface => ffi::EGL_BAD_SURFACE,
            EglError::ContextLost => ffi::EGL_CONTEXT_LOST,
            EglError::Other(code) => code,
        }
    }

    pub fn from_code(code: EGLint) -> Self {
        match code {
            ffi::EGL_SUCCESS => EglError::Success,
            ffi::EGL_NOT_INITIALIZED => EglError::NotInitialized,
            ffi::EGL_BAD_ACCESS => EglError::BadAccess,
            ffi::EGL_BAD_ALLOC => EglError::BadAlloc,
            ffi::EGL_BAD_ATTRIBUTE => EglError::BadAttribute,
            ffi::EGL_BAD_CONFIG => EglError::BadConfig,
            ffi::EGL_BAD_CONTEXT => EglError::BadContext,
            ffi::EGL_BAD_CURRENT_SURFACE => EglError::BadCurrentSurface,
            ffi::EGL_BAD_DISPLAY => EglError::BadDisplay,
            ffi::EGL_BAD_MATCH => EglError::BadMatch,
            ffi::EGL_BAD_NATIVE_PIXMAP => EglError::BadNativePixmap,
            ffi::EGL_BAD_NATIVE_WINDOW => EglError::BadNativeWindow,
            ffi::EGL_BAD_PARAMETER => EglError::BadParameter,
            ffi::EGL_BAD_SURFACE => EglError::BadSurface,
            ffi::EGL_CONTEXT_LOST => EglError::ContextLost,
            other => EglError::Other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_mapping() {
        for err in [
            EglError::Success,
            EglError::NotInitialized,
            EglError::BadAlloc,
            EglError::BadConfig,
            EglError::BadContext,
            EglError::BadDisplay,
            EglError::BadParameter,
            EglError::BadSurface,
        ] {
            assert_eq!(EglError::from_code(err.code()), err);
        }
        assert_eq!(EglError::BadDisplay.code(), 0x3008);
        assert_eq!(EglError::from_code(0x1234), EglError::Other(0x1234));
    }
}

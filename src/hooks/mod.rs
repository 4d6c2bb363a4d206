//! Typed hook tables
//!
//! Each table is a flat struct of `Option<unsafe extern "C" fn ..>` slots
//! generated from an entry-point manifest. A slot is either a resolved
//! driver function or `None`; callers branch on `None` instead of jumping
//! through a null pointer.
//!
//! ```text
//!   Hooks
//!   ├── egl      EGL 1.5 core, resolved by symbol then proc address
//!   ├── egl_ext  EGL extensions, proc address only
//!   ├── gl[0]    GLES 1.x (libGLESv1_CM), only the GLES1 subset is filled
//!   ├── gl[1]    GLES 2.0/3.0 (libGLESv2)
//!   └── gl_ext   OES framebuffer + EGLImage targets, proc address only
//! ```

use std::ffi::CStr;

pub(crate) const fn cstr(bytes: &'static [u8]) -> &'static CStr {
    match CStr::from_bytes_with_nul(bytes) {
        Ok(name) => name,
        Err(_) => panic!("entry point name must be nul terminated"),
    }
}

/// Declare a hook table from `fn name(arg: Type, ..) -> Ret;` entries.
///
/// Generates the struct, its `NAMES` in declaration order, `empty()` and a
/// `fill` that walks the names in order and stores every non-null address.
macro_rules! hook_table {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( fn $func:ident ( $($arg:ident : $ty:ty),* $(,)? ) $(-> $ret:ty)? ; )*
        }
    ) => {
        $(#[$meta])*
        #[allow(non_snake_case)]
        #[derive(Clone, Copy, Default)]
        $vis struct $name {
            $( pub $func: Option<unsafe extern "C" fn($($ty),*) $(-> $ret)?>, )*
        }

        impl $name {
            pub const NAMES: &'static [&'static ::std::ffi::CStr] = &[
                $( $crate::hooks::cstr(concat!(stringify!($func), "\0").as_bytes()), )*
            ];

            pub const fn empty() -> Self {
                Self { $( $func: None, )* }
            }

            /// Resolve every slot in `NAMES` order, returns the number resolved
            pub fn fill<F>(&mut self, mut resolve: F) -> usize
            where
                F: FnMut(&'static ::std::ffi::CStr) -> *mut ::std::ffi::c_void,
            {
                let mut names = Self::NAMES.iter();
                let mut resolved = 0;
                $(
                    if let Some(name) = names.next() {
                        let addr = resolve(name);
                        self.$func = if addr.is_null() {
                            None
                        } else {
                            resolved += 1;
                            Some(unsafe {
                                ::std::mem::transmute::<
                                    *mut ::std::ffi::c_void,
                                    unsafe extern "C" fn($($ty),*) $(-> $ret)?,
                                >(addr)
                            })
                        };
                    }
                )*
                resolved
            }

            pub fn resolved(&self) -> usize {
                [$( self.$func.is_some(), )*].iter().filter(|slot| **slot).count()
            }
        }
    };
}

/// `&[&CStr]` of the entry names in a manifest fragment
macro_rules! entry_names {
    ( $( fn $func:ident ( $($arg:ident : $ty:ty),* $(,)? ) $(-> $ret:ty)? ; )* ) => {
        &[ $( $crate::hooks::cstr(concat!(stringify!($func), "\0").as_bytes()), )* ]
    };
}

mod egl_entries;
mod gl_entries;

pub use egl_entries::{EglExtTable, EglTable};
pub(crate) use gl_entries::for_each_gl_entry;
pub use gl_entries::{GlExtTable, GlTable, GLES1_NAMES};

/// Which GL hook table a context dispatches through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlesVersion {
    /// GLES 1.x
    Legacy = 0,
    /// GLES 2.0 and 3.x
    Es2 = 1,
}

impl GlesVersion {
    /// Classify an `EGL_CONTEXT_CLIENT_VERSION` value; absent means legacy
    pub fn from_client_version(version: Option<i64>) -> Self {
        match version {
            Some(2) | Some(3) => GlesVersion::Es2,
            _ => GlesVersion::Legacy,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Every resolved driver entry point
#[derive(Clone, Copy, Default)]
pub struct Hooks {
    pub egl: EglTable,
    pub egl_ext: EglExtTable,
    pub gl: [GlTable; 2],
    pub gl_ext: GlExtTable,
}

impl Hooks {
    pub const fn empty() -> Self {
        Self {
            egl: EglTable::empty(),
            egl_ext: EglExtTable::empty(),
            gl: [GlTable::empty(), GlTable::empty()],
            gl_ext: GlExtTable::empty(),
        }
    }

    pub fn gl(&self, version: GlesVersion) -> &GlTable {
        &self.gl[version.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.egl.resolved() == 0
            && self.egl_ext.resolved() == 0
            && self.gl.iter().all(|table| table.resolved() == 0)
            && self.gl_ext.resolved() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::c_void;

    #[test]
    fn test_version_classification() {
        assert_eq!(GlesVersion::from_client_version(Some(1)), GlesVersion::Legacy);
        assert_eq!(GlesVersion::from_client_version(Some(2)), GlesVersion::Es2);
        assert_eq!(GlesVersion::from_client_version(Some(3)), GlesVersion::Es2);
        assert_eq!(GlesVersion::from_client_version(None), GlesVersion::Legacy);
        assert_eq!(GlesVersion::Es2.index(), 1);
    }

    #[test]
    fn test_gles1_names_are_subsequence() {
        let mut all = GlTable::NAMES.iter();
        for name in GLES1_NAMES {
            assert!(
                all.any(|candidate| candidate == name),
                "{:?} out of order",
                name
            );
        }
    }

    #[test]
    fn test_names_unique() {
        let mut names: Vec<&CStr> = GlTable::NAMES.to_vec();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), GlTable::NAMES.len());
    }

    unsafe extern "C" fn fake_get_error() -> crate::ffi::GLenum {
        0x0505
    }

    #[test]
    fn test_fill_by_name() {
        let mut table = GlTable::empty();
        let resolved = table.fill(|name| {
            if name == c"glGetError" {
                fake_get_error as *mut c_void
            } else {
                std::ptr::null_mut()
            }
        });
        assert_eq!(resolved, 1);
        assert_eq!(table.resolved(), 1);
        assert!(table.glClear.is_none());
        let get_error = table.glGetError.map(|f| unsafe { f() });
        assert_eq!(get_error, Some(0x0505));
    }

    #[test]
    fn test_empty_hooks() {
        let hooks = Hooks::empty();
        assert!(hooks.is_empty());
        assert!(hooks.gl(GlesVersion::Legacy).glDrawArrays.is_none());
    }
}

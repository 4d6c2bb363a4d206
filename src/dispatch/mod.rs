//! Entry-Point Dispatch Layer
//!
//! Every EGL entry point is a method on [`DispatchRuntime`]. Each one clears
//! the calling thread's error slot, then either forwards to the driver's
//! hook, translates attribute lists first, or runs one of the registry flows
//! in [`objects`]. A missing hook is logged and answered with the entry
//! point's failure sentinel.
//!
//! The methods are `unsafe` because they forward raw pointers from the
//! application to the driver unchanged.

/// Call a hook slot, or log and evaluate `$default` when the driver lacks it
macro_rules! call_hook {
    ($table:expr, $func:ident ( $($arg:expr),* $(,)? ) else $default:expr) => {
        match $table.$func {
            Some(hook) => hook($($arg),*),
            None => {
                tracing::warn!("{} is not implemented by the driver", stringify!($func));
                $default
            }
        }
    };
}

mod egl;
mod gl;
mod objects;

pub use egl::texture_format;
pub use gl::probe_bgra;
pub use objects::WindowSurfaceCall;

use crate::error::EglError;
use crate::tls;

/// Record `error` for the calling thread and hand back `sentinel`
pub(crate) fn fail<T>(error: EglError, sentinel: T) -> T {
    tls::set_error(error);
    sentinel
}

//! EGL/GLES runtime-dispatch shim for Android graphics drivers
//!
//! This library exports the EGL and GLES entry points a Linux application
//! links against and forwards them to an Android vendor driver (loaded
//! through libhybris). On the way it tracks displays, contexts and window
//! surfaces, adapts Wayland windows into Android native windows and serves
//! the `android_wlegl` buffer-sharing protocol for compositors.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │        Application / Wayland compositor                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                     EGL / GLES C ABI
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │              egl-wrapper-shim                               │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐ │
//! │  │ c_api       │  │ dispatch    │  │ platform adapters   │ │
//! │  │ gl_api      │  │ registry    │  │ wlegl / gralloc     │ │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘ │
//! │                 loader + hook tables + TLS                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                          libhybris
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │        Android EGL/GLES driver, gralloc                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use egl_wrapper_shim::c_api::*;
//!
//! let dpy = eglGetDisplay(std::ptr::null_mut());
//! let (mut major, mut minor) = (0, 0);
//! eglInitialize(dpy, &mut major, &mut minor);
//! ```

pub mod attribs;
pub mod c_api;
pub mod config;
pub mod dispatch;
pub mod dynlib;
pub mod error;
pub mod extensions;
pub mod ffi;
pub mod gl_api;
pub mod gralloc;
pub mod hooks;
pub mod loader;
pub mod logging;
pub mod platform;
pub mod registry;
pub mod tls;
pub mod wlegl;

pub use c_api::{install_wayland_connector, install_wlegl_transport};
pub use config::Config;
pub use error::{EglError, Error};
pub use registry::DispatchRuntime;

/// Result type for this crate
pub type Result<T> = std::result::Result<T, Error>;

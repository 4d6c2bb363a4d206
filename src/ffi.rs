//! Raw EGL/GLES and Android buffer types shared by every layer of the shim.
//!
//! Only the subset the dispatch layer names is declared here; everything
//! else travels through the hook tables as opaque pointers.

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_int, c_uint, c_void};

// =============================================================================
// EGL scalar and handle types
// =============================================================================

pub type EGLint = i32;
pub type EGLBoolean = c_uint;
pub type EGLenum = c_uint;
pub type EGLAttrib = isize;
pub type EGLTime = u64;
pub type EGLTimeKHR = u64;
pub type EGLuint64KHR = u64;
pub type EGLuint64NV = u64;
pub type EGLnsecsANDROID = i64;
pub type EGLNativeFileDescriptorKHR = c_int;

pub type EGLDisplay = *mut c_void;
pub type EGLConfig = *mut c_void;
pub type EGLContext = *mut c_void;
pub type EGLSurface = *mut c_void;
pub type EGLImage = *mut c_void;
pub type EGLImageKHR = *mut c_void;
pub type EGLSync = *mut c_void;
pub type EGLSyncKHR = *mut c_void;
pub type EGLStreamKHR = *mut c_void;
pub type EGLClientBuffer = *mut c_void;
pub type EGLNativeDisplayType = *mut c_void;
pub type EGLNativeWindowType = *mut c_void;
pub type EGLNativePixmapType = *mut c_void;

/// Generic function pointer handed out by `eglGetProcAddress`.
pub type EGLFuncPtr = *mut c_void;

pub type EglGetProcAddressFn = unsafe extern "C" fn(*const c_char) -> EGLFuncPtr;

// =============================================================================
// GLES scalar types
// =============================================================================

pub type GLenum = c_uint;
pub type GLboolean = u8;
pub type GLbitfield = c_uint;
pub type GLbyte = i8;
pub type GLubyte = u8;
pub type GLshort = i16;
pub type GLushort = u16;
pub type GLint = c_int;
pub type GLuint = c_uint;
pub type GLsizei = c_int;
pub type GLfloat = f32;
pub type GLclampf = f32;
pub type GLfixed = i32;
pub type GLclampx = i32;
pub type GLchar = c_char;
pub type GLint64 = i64;
pub type GLuint64 = u64;
pub type GLintptr = isize;
pub type GLsizeiptr = isize;
pub type GLsync = *mut c_void;
pub type GLeglImageOES = *mut c_void;

// =============================================================================
// EGL enumerants
// =============================================================================

pub const EGL_FALSE: EGLBoolean = 0;
pub const EGL_TRUE: EGLBoolean = 1;

pub const EGL_NO_DISPLAY: EGLDisplay = std::ptr::null_mut();
pub const EGL_NO_CONTEXT: EGLContext = std::ptr::null_mut();
pub const EGL_NO_SURFACE: EGLSurface = std::ptr::null_mut();
pub const EGL_NO_IMAGE: EGLImage = std::ptr::null_mut();
pub const EGL_NO_SYNC: EGLSync = std::ptr::null_mut();
pub const EGL_NO_STREAM_KHR: EGLStreamKHR = std::ptr::null_mut();
pub const EGL_DEFAULT_DISPLAY: EGLNativeDisplayType = std::ptr::null_mut();
pub const EGL_NO_FILE_DESCRIPTOR_KHR: EGLNativeFileDescriptorKHR = -1;

pub const EGL_SUCCESS: EGLint = 0x3000;
pub const EGL_NOT_INITIALIZED: EGLint = 0x3001;
pub const EGL_BAD_ACCESS: EGLint = 0x3002;
pub const EGL_BAD_ALLOC: EGLint = 0x3003;
pub const EGL_BAD_ATTRIBUTE: EGLint = 0x3004;
pub const EGL_BAD_CONFIG: EGLint = 0x3005;
pub const EGL_BAD_CONTEXT: EGLint = 0x3006;
pub const EGL_BAD_CURRENT_SURFACE: EGLint = 0x3007;
pub const EGL_BAD_DISPLAY: EGLint = 0x3008;
pub const EGL_BAD_MATCH: EGLint = 0x3009;
pub const EGL_BAD_NATIVE_PIXMAP: EGLint = 0x300A;
pub const EGL_BAD_NATIVE_WINDOW: EGLint = 0x300B;
pub const EGL_BAD_PARAMETER: EGLint = 0x300C;
pub const EGL_BAD_SURFACE: EGLint = 0x300D;
pub const EGL_CONTEXT_LOST: EGLint = 0x300E;

pub const EGL_NONE: EGLint = 0x3038;
pub const EGL_HEIGHT: EGLint = 0x3056;
pub const EGL_WIDTH: EGLint = 0x3057;
pub const EGL_VENDOR: EGLint = 0x3053;
pub const EGL_VERSION: EGLint = 0x3054;
pub const EGL_EXTENSIONS: EGLint = 0x3055;
pub const EGL_CLIENT_APIS: EGLint = 0x308D;
pub const EGL_TEXTURE_FORMAT: EGLint = 0x3080;
pub const EGL_TEXTURE_RGB: EGLint = 0x305D;
pub const EGL_TEXTURE_RGBA: EGLint = 0x305E;
pub const EGL_TEXTURE_EXTERNAL_WL: EGLint = 0x31DA;
pub const EGL_CONTEXT_CLIENT_VERSION: EGLint = 0x3098;
pub const EGL_SURFACE_TYPE: EGLint = 0x3033;
pub const EGL_RENDERABLE_TYPE: EGLint = 0x3040;
pub const EGL_PBUFFER_BIT: EGLint = 0x0001;
pub const EGL_OPENGL_ES2_BIT: EGLint = 0x0004;

pub const EGL_OPENGL_ES_API: EGLenum = 0x30A0;

pub const EGL_WAYLAND_BUFFER_WL: EGLenum = 0x31D5;
pub const EGL_NATIVE_BUFFER_ANDROID: EGLenum = 0x3140;

pub const EGL_PLATFORM_ANDROID_KHR: EGLenum = 0x3141;
pub const EGL_PLATFORM_GBM_KHR: EGLenum = 0x31D7;
pub const EGL_PLATFORM_WAYLAND_EXT: EGLenum = 0x31D8;
pub const EGL_PLATFORM_SURFACELESS_MESA: EGLenum = 0x31DD;

pub const EGL_SYNC_FENCE_KHR: EGLenum = 0x30F9;
pub const EGL_SYNC_FLUSH_COMMANDS_BIT_KHR: EGLint = 0x0001;

// =============================================================================
// GLES enumerants
// =============================================================================

pub const GL_NO_ERROR: GLenum = 0;
pub const GL_INVALID_OPERATION: GLenum = 0x0502;
pub const GL_VENDOR: GLenum = 0x1F00;
pub const GL_RENDERER: GLenum = 0x1F01;
pub const GL_VERSION: GLenum = 0x1F02;
pub const GL_EXTENSIONS: GLenum = 0x1F03;
pub const GL_NUM_EXTENSIONS: GLenum = 0x821D;
pub const GL_TEXTURE_2D: GLenum = 0x0DE1;
pub const GL_RGBA: GLenum = 0x1908;
pub const GL_UNSIGNED_BYTE: GLenum = 0x1401;
pub const GL_FRAMEBUFFER: GLenum = 0x8D40;
pub const GL_COLOR_ATTACHMENT0: GLenum = 0x8CE0;
pub const GL_BGRA_EXT: GLenum = 0x80E1;
pub const GL_TRUE: GLboolean = 1;
pub const GL_FALSE: GLboolean = 0;

// =============================================================================
// Android hardware buffers
// =============================================================================

/// AHardwareBuffer formats (numerically equal to the HAL pixel formats)
pub const AHARDWAREBUFFER_FORMAT_R8G8B8A8_UNORM: u32 = 1;
pub const AHARDWAREBUFFER_FORMAT_R8G8B8X8_UNORM: u32 = 2;
pub const AHARDWAREBUFFER_FORMAT_R8G8B8_UNORM: u32 = 3;
pub const AHARDWAREBUFFER_FORMAT_R5G6B5_UNORM: u32 = 4;
pub const HAL_PIXEL_FORMAT_BGRA_8888: u32 = 5;

/// AHardwareBuffer usage flags
pub const AHARDWAREBUFFER_USAGE_CPU_READ_OFTEN: u64 = 0x3;
pub const AHARDWAREBUFFER_USAGE_CPU_WRITE_OFTEN: u64 = 0x30;
pub const AHARDWAREBUFFER_USAGE_GPU_SAMPLED_IMAGE: u64 = 0x100;
pub const AHARDWAREBUFFER_USAGE_GPU_FRAMEBUFFER: u64 = 0x200;

/// `AHardwareBuffer_createFromHandle` method that clones the handle's fds
pub const AHARDWAREBUFFER_CREATE_FROM_HANDLE_METHOD_CLONE: i32 = 3;

/// Opaque AHardwareBuffer
#[repr(C)]
pub struct AHardwareBuffer {
    _opaque: [u8; 0],
}

/// Buffer description used by libnativewindow
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct AHardwareBuffer_Desc {
    pub width: u32,
    pub height: u32,
    pub layers: u32,
    pub format: u32,
    pub usage: u64,
    pub stride: u32,
    pub rfu0: u32,
    pub rfu1: u64,
}

/// Rectangle in buffer coordinates
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ARect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Header of a cutils `native_handle_t`; `num_fds` fds then `num_ints`
/// ints follow it in memory.
#[repr(C)]
#[derive(Debug)]
pub struct native_handle_t {
    pub version: c_int,
    pub num_fds: c_int,
    pub num_ints: c_int,
    pub data: [c_int; 0],
}

pub type buffer_handle_t = *const native_handle_t;

/// Reference-counted header shared by `ANativeWindow` and
/// `ANativeWindowBuffer`
#[repr(C)]
pub struct android_native_base_t {
    pub magic: c_int,
    pub version: c_int,
    pub reserved: [*mut c_void; 4],
    pub inc_ref: unsafe extern "C" fn(*mut android_native_base_t),
    pub dec_ref: unsafe extern "C" fn(*mut android_native_base_t),
}

/// Four-character magic stored in `android_native_base_t::magic`
pub const fn native_magic(tag: &[u8; 4]) -> c_int {
    ((tag[0] as c_int) << 24) | ((tag[1] as c_int) << 16) | ((tag[2] as c_int) << 8) | (tag[3] as c_int)
}

pub const ANDROID_NATIVE_WINDOW_MAGIC: c_int = native_magic(b"_wnd");
pub const ANDROID_NATIVE_BUFFER_MAGIC: c_int = native_magic(b"_bfr");

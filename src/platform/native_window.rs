//! `ANativeWindow` C ABI over a Rust window implementation
//!
//! The Android driver renders into an `EGLNativeWindowType` that it expects
//! to be an `ANativeWindow`: a base header followed by a table of callbacks.
//! [`NativeWindowShim`] lays that table out and forwards every callback to a
//! [`NativeWindowOps`] implementation.

use std::ffi::{c_int, c_void};
use std::os::fd::{FromRawFd, OwnedFd};
use std::sync::Arc;

use tracing::{debug, error, trace};

use crate::ffi::{android_native_base_t, ANDROID_NATIVE_WINDOW_MAGIC};

pub const NO_ERROR: c_int = 0;
pub const BAD_VALUE: c_int = -libc::EINVAL;

// query()
pub const NATIVE_WINDOW_WIDTH: c_int = 0;
pub const NATIVE_WINDOW_HEIGHT: c_int = 1;
pub const NATIVE_WINDOW_FORMAT: c_int = 2;
pub const NATIVE_WINDOW_MIN_UNDEQUEUED_BUFFERS: c_int = 3;
pub const NATIVE_WINDOW_QUEUES_TO_WINDOW_COMPOSER: c_int = 4;
pub const NATIVE_WINDOW_CONCRETE_TYPE: c_int = 5;
pub const NATIVE_WINDOW_DEFAULT_WIDTH: c_int = 6;
pub const NATIVE_WINDOW_DEFAULT_HEIGHT: c_int = 7;
pub const NATIVE_WINDOW_TRANSFORM_HINT: c_int = 8;
pub const NATIVE_WINDOW_CONSUMER_USAGE_BITS: c_int = 10;
pub const NATIVE_WINDOW_DEFAULT_DATASPACE: c_int = 12;
pub const NATIVE_WINDOW_BUFFER_AGE: c_int = 13;
pub const NATIVE_WINDOW_IS_VALID: c_int = 17;
pub const NATIVE_WINDOW_MAX_BUFFER_COUNT: c_int = 21;

// perform()
pub const NATIVE_WINDOW_SET_USAGE: c_int = 0;
pub const NATIVE_WINDOW_SET_BUFFER_COUNT: c_int = 4;
pub const NATIVE_WINDOW_SET_BUFFERS_DIMENSIONS: c_int = 8;
pub const NATIVE_WINDOW_SET_BUFFERS_FORMAT: c_int = 9;
pub const NATIVE_WINDOW_SET_USAGE64: c_int = 30;
pub const NATIVE_WINDOW_GET_CONSUMER_USAGE64: c_int = 31;

/// `NATIVE_WINDOW_CONCRETE_TYPE` value for a surface
pub const NATIVE_WINDOW_SURFACE: c_int = 1;

/// BufferQueue slot count the driver may assume
const MAX_BUFFER_COUNT: c_int = 64;

/// Window behavior behind the C callback table. Buffers are passed as
/// `ANativeWindowBuffer` pointers; fences are owned fds.
pub trait NativeWindowOps: Send + Sync {
    fn dequeue_buffer(&self) -> Result<(*mut c_void, Option<OwnedFd>), c_int>;
    fn queue_buffer(&self, buffer: *mut c_void, fence: Option<OwnedFd>) -> c_int;
    fn cancel_buffer(&self, buffer: *mut c_void, fence: Option<OwnedFd>) -> c_int;
    fn set_swap_interval(&self, interval: c_int) -> c_int;

    fn width(&self) -> c_int;
    fn height(&self) -> c_int;
    fn format(&self) -> c_int;
    fn default_width(&self) -> c_int;
    fn default_height(&self) -> c_int;
    fn usage(&self) -> u64;

    fn set_usage(&self, usage: u64) -> c_int;
    fn set_buffer_count(&self, count: c_int) -> c_int;
    fn set_buffers_dimensions(&self, width: c_int, height: c_int) -> c_int;
    fn set_buffers_format(&self, format: c_int) -> c_int;
}

type WindowFn<A> = unsafe extern "C" fn(*mut ANativeWindow, A) -> c_int;

/// C layout of `ANativeWindow`
#[repr(C)]
pub struct ANativeWindow {
    common: android_native_base_t,
    flags: u32,
    min_swap_interval: c_int,
    max_swap_interval: c_int,
    xdpi: f32,
    ydpi: f32,
    oem: [isize; 4],
    set_swap_interval: WindowFn<c_int>,
    dequeue_buffer_deprecated: WindowFn<*mut *mut c_void>,
    lock_buffer_deprecated: WindowFn<*mut c_void>,
    queue_buffer_deprecated: WindowFn<*mut c_void>,
    query: unsafe extern "C" fn(*const ANativeWindow, c_int, *mut c_int) -> c_int,
    // Variadic in C. The trailing words are read as register-passed
    // arguments, which holds for the AAPCS64 and SysV x86-64 conventions.
    perform: unsafe extern "C" fn(*mut ANativeWindow, c_int, usize, usize) -> c_int,
    cancel_buffer_deprecated: WindowFn<*mut c_void>,
    dequeue_buffer: unsafe extern "C" fn(*mut ANativeWindow, *mut *mut c_void, *mut c_int) -> c_int,
    queue_buffer: unsafe extern "C" fn(*mut ANativeWindow, *mut c_void, c_int) -> c_int,
    cancel_buffer: unsafe extern "C" fn(*mut ANativeWindow, *mut c_void, c_int) -> c_int,
}

/// Heap-pinned `ANativeWindow` forwarding to `ops`
///
/// `raw` is the first field, so a pointer to it is also a pointer to the
/// shim. The driver's reference counting is ignored: the shim lives as long
/// as the platform adapter keeps it.
#[repr(C)]
pub struct NativeWindowShim {
    raw: ANativeWindow,
    ops: Arc<dyn NativeWindowOps>,
}

// Every mutable state lives behind `ops`, which is Send + Sync
unsafe impl Send for NativeWindowShim {}
unsafe impl Sync for NativeWindowShim {}

impl NativeWindowShim {
    pub fn new(ops: Arc<dyn NativeWindowOps>) -> Box<Self> {
        Box::new(Self {
            raw: ANativeWindow {
                common: android_native_base_t {
                    magic: ANDROID_NATIVE_WINDOW_MAGIC,
                    version: std::mem::size_of::<ANativeWindow>() as c_int,
                    reserved: [std::ptr::null_mut(); 4],
                    inc_ref: base_ref,
                    dec_ref: base_ref,
                },
                flags: 0,
                min_swap_interval: 0,
                max_swap_interval: 1,
                xdpi: 0.0,
                ydpi: 0.0,
                oem: [0; 4],
                set_swap_interval,
                dequeue_buffer_deprecated,
                lock_buffer_deprecated,
                queue_buffer_deprecated,
                query,
                perform,
                cancel_buffer_deprecated,
                dequeue_buffer,
                queue_buffer,
                cancel_buffer,
            },
            ops,
        })
    }

    /// The `EGLNativeWindowType` handed to the driver
    pub fn as_native(&self) -> *mut c_void {
        &self.raw as *const ANativeWindow as *mut c_void
    }

    pub fn ops(&self) -> &Arc<dyn NativeWindowOps> {
        &self.ops
    }
}

unsafe extern "C" fn base_ref(_base: *mut android_native_base_t) {}

unsafe fn ops<'a>(window: *const ANativeWindow) -> Option<&'a dyn NativeWindowOps> {
    let shim = (window as *const NativeWindowShim).as_ref()?;
    Some(shim.ops.as_ref())
}

fn fence_from_raw(fd: c_int) -> Option<OwnedFd> {
    (fd >= 0).then(|| unsafe { OwnedFd::from_raw_fd(fd) })
}

/// Block until `fence` signals. An infinite timeout is intended.
pub fn wait_fence(fence: OwnedFd) {
    use std::os::fd::AsRawFd;

    let mut pollfd = libc::pollfd {
        fd: fence.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };
    loop {
        let rval = unsafe { libc::poll(&mut pollfd, 1, -1) };
        if rval >= 0 {
            break;
        }
        let err = std::io::Error::last_os_error();
        if err.kind() != std::io::ErrorKind::Interrupted {
            error!("fence wait failed: {}", err);
            break;
        }
    }
}

unsafe extern "C" fn set_swap_interval(window: *mut ANativeWindow, interval: c_int) -> c_int {
    ops(window).map_or(BAD_VALUE, |ops| ops.set_swap_interval(interval))
}

unsafe extern "C" fn dequeue_buffer_deprecated(
    window: *mut ANativeWindow,
    buffer: *mut *mut c_void,
) -> c_int {
    let Some(ops) = ops(window) else {
        return BAD_VALUE;
    };
    match ops.dequeue_buffer() {
        Ok((out, fence)) => {
            if let Some(fence) = fence {
                wait_fence(fence);
            }
            if !buffer.is_null() {
                *buffer = out;
            }
            NO_ERROR
        }
        Err(code) => code,
    }
}

unsafe extern "C" fn dequeue_buffer(
    window: *mut ANativeWindow,
    buffer: *mut *mut c_void,
    fence: *mut c_int,
) -> c_int {
    let Some(ops) = ops(window) else {
        return BAD_VALUE;
    };
    match ops.dequeue_buffer() {
        Ok((out, acquire)) => {
            if !buffer.is_null() {
                *buffer = out;
            }
            match (fence.is_null(), acquire) {
                (false, Some(acquire)) => *fence = std::os::fd::IntoRawFd::into_raw_fd(acquire),
                (false, None) => *fence = -1,
                (true, Some(acquire)) => wait_fence(acquire),
                (true, None) => {}
            }
            NO_ERROR
        }
        Err(code) => code,
    }
}

unsafe extern "C" fn lock_buffer_deprecated(_window: *mut ANativeWindow, _buffer: *mut c_void) -> c_int {
    NO_ERROR
}

unsafe extern "C" fn queue_buffer_deprecated(window: *mut ANativeWindow, buffer: *mut c_void) -> c_int {
    ops(window).map_or(BAD_VALUE, |ops| ops.queue_buffer(buffer, None))
}

unsafe extern "C" fn queue_buffer(window: *mut ANativeWindow, buffer: *mut c_void, fence: c_int) -> c_int {
    let fence = fence_from_raw(fence);
    ops(window).map_or(BAD_VALUE, |ops| ops.queue_buffer(buffer, fence))
}

unsafe extern "C" fn cancel_buffer_deprecated(window: *mut ANativeWindow, buffer: *mut c_void) -> c_int {
    ops(window).map_or(BAD_VALUE, |ops| ops.cancel_buffer(buffer, None))
}

unsafe extern "C" fn cancel_buffer(window: *mut ANativeWindow, buffer: *mut c_void, fence: c_int) -> c_int {
    let fence = fence_from_raw(fence);
    ops(window).map_or(BAD_VALUE, |ops| ops.cancel_buffer(buffer, fence))
}

/// Answer a `query()` request, `None` for unknown attributes
pub fn query_value(ops: &dyn NativeWindowOps, what: c_int) -> Option<c_int> {
    let value = match what {
        NATIVE_WINDOW_WIDTH => ops.width(),
        NATIVE_WINDOW_HEIGHT => ops.height(),
        NATIVE_WINDOW_FORMAT => ops.format(),
        NATIVE_WINDOW_CONCRETE_TYPE => NATIVE_WINDOW_SURFACE,
        NATIVE_WINDOW_QUEUES_TO_WINDOW_COMPOSER => 1,
        NATIVE_WINDOW_DEFAULT_WIDTH => ops.default_width(),
        NATIVE_WINDOW_DEFAULT_HEIGHT => ops.default_height(),
        NATIVE_WINDOW_TRANSFORM_HINT => 0,
        NATIVE_WINDOW_MIN_UNDEQUEUED_BUFFERS => 1,
        NATIVE_WINDOW_DEFAULT_DATASPACE => 0,
        NATIVE_WINDOW_CONSUMER_USAGE_BITS => ops.usage() as c_int,
        NATIVE_WINDOW_IS_VALID => 1,
        NATIVE_WINDOW_BUFFER_AGE => 2,
        NATIVE_WINDOW_MAX_BUFFER_COUNT => MAX_BUFFER_COUNT,
        _ => return None,
    };
    Some(value)
}

unsafe extern "C" fn query(window: *const ANativeWindow, what: c_int, value: *mut c_int) -> c_int {
    let Some(ops) = ops(window) else {
        return BAD_VALUE;
    };
    if value.is_null() {
        return BAD_VALUE;
    }
    trace!("window {:p} query {}", window, what);
    match query_value(ops, what) {
        Some(answer) => {
            *value = answer;
            NO_ERROR
        }
        None => {
            error!("NativeWindow error: unknown window attribute! {}", what);
            *value = 0;
            BAD_VALUE
        }
    }
}

unsafe extern "C" fn perform(window: *mut ANativeWindow, operation: c_int, arg0: usize, arg1: usize) -> c_int {
    let Some(ops) = ops(window) else {
        return BAD_VALUE;
    };
    trace!("window {:p} perform {}", window, operation);
    match operation {
        NATIVE_WINDOW_SET_USAGE => ops.set_usage(arg0 as u32 as u64),
        NATIVE_WINDOW_SET_USAGE64 => ops.set_usage(arg0 as u64),
        NATIVE_WINDOW_SET_BUFFER_COUNT => ops.set_buffer_count(arg0 as c_int),
        NATIVE_WINDOW_SET_BUFFERS_DIMENSIONS => {
            ops.set_buffers_dimensions(arg0 as c_int, arg1 as c_int)
        }
        NATIVE_WINDOW_SET_BUFFERS_FORMAT => ops.set_buffers_format(arg0 as c_int),
        NATIVE_WINDOW_GET_CONSUMER_USAGE64 => {
            let out = arg0 as *mut u64;
            if !out.is_null() {
                *out = ops.usage();
            }
            NO_ERROR
        }
        other => {
            debug!("ignoring native window operation {}", other);
            NO_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeOps {
        calls: Mutex<Vec<String>>,
    }

    impl FakeOps {
        fn record(&self, call: String) -> c_int {
            self.calls.lock().unwrap().push(call);
            NO_ERROR
        }
    }

    impl NativeWindowOps for FakeOps {
        fn dequeue_buffer(&self) -> Result<(*mut c_void, Option<OwnedFd>), c_int> {
            Ok((0x1000 as *mut c_void, None))
        }
        fn queue_buffer(&self, buffer: *mut c_void, fence: Option<OwnedFd>) -> c_int {
            self.record(format!("queue {:p} {}", buffer, fence.is_some()))
        }
        fn cancel_buffer(&self, buffer: *mut c_void, _fence: Option<OwnedFd>) -> c_int {
            self.record(format!("cancel {:p}", buffer))
        }
        fn set_swap_interval(&self, interval: c_int) -> c_int {
            self.record(format!("interval {}", interval))
        }
        fn width(&self) -> c_int {
            640
        }
        fn height(&self) -> c_int {
            480
        }
        fn format(&self) -> c_int {
            1
        }
        fn default_width(&self) -> c_int {
            320
        }
        fn default_height(&self) -> c_int {
            240
        }
        fn usage(&self) -> u64 {
            0x300
        }
        fn set_usage(&self, usage: u64) -> c_int {
            self.record(format!("usage {:x}", usage))
        }
        fn set_buffer_count(&self, count: c_int) -> c_int {
            self.record(format!("count {}", count))
        }
        fn set_buffers_dimensions(&self, width: c_int, height: c_int) -> c_int {
            self.record(format!("dims {}x{}", width, height))
        }
        fn set_buffers_format(&self, format: c_int) -> c_int {
            self.record(format!("format {}", format))
        }
    }

    #[test]
    fn test_callbacks_reach_ops() {
        let fake = Arc::new(FakeOps::default());
        let shim = NativeWindowShim::new(fake.clone());
        let raw = shim.as_native() as *mut ANativeWindow;

        unsafe {
            assert_eq!((*raw).common.magic, ANDROID_NATIVE_WINDOW_MAGIC);

            let mut value = 0;
            assert_eq!(((*raw).query)(raw, NATIVE_WINDOW_WIDTH, &mut value), NO_ERROR);
            assert_eq!(value, 640);
            assert_eq!(((*raw).query)(raw, NATIVE_WINDOW_DEFAULT_HEIGHT, &mut value), NO_ERROR);
            assert_eq!(value, 240);
            assert_eq!(((*raw).query)(raw, 999, &mut value), BAD_VALUE);

            let mut buffer = std::ptr::null_mut();
            let mut fence = 0;
            assert_eq!(((*raw).dequeue_buffer)(raw, &mut buffer, &mut fence), NO_ERROR);
            assert_eq!(buffer as usize, 0x1000);
            assert_eq!(fence, -1);

            assert_eq!(((*raw).queue_buffer)(raw, buffer, -1), NO_ERROR);
            assert_eq!(((*raw).set_swap_interval)(raw, 0), NO_ERROR);
            assert_eq!(((*raw).perform)(raw, NATIVE_WINDOW_SET_BUFFERS_DIMENSIONS, 64, 32), NO_ERROR);
            assert_eq!(((*raw).perform)(raw, NATIVE_WINDOW_SET_USAGE64, 0x33, 0), NO_ERROR);

            let mut usage = 0u64;
            ((*raw).perform)(raw, NATIVE_WINDOW_GET_CONSUMER_USAGE64, &mut usage as *mut u64 as usize, 0);
            assert_eq!(usage, 0x300);
        }

        let calls = fake.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                "queue 0x1000 false".to_string(),
                "interval 0".to_string(),
                "dims 64x32".to_string(),
                "usage 33".to_string(),
            ]
        );
    }

    #[test]
    fn test_wait_fence_on_signaled_pipe() {
        let (read, write) = std::os::unix::net::UnixStream::pair().unwrap();
        drop(write);
        wait_fence(OwnedFd::from(read));
    }
}

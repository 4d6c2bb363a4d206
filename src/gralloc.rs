//! Graphics buffer allocation
//!
//! Two backends sit behind [`BufferAllocator`]: `libnativewindow.so`
//! (`AHardwareBuffer`, Android 10 and later) and the libhardware gralloc0
//! module for older devices. Which one is used is decided once per process.

use std::ffi::{c_char, c_int, c_void, CStr};
use std::os::fd::{AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::dynlib::{global_symbol, DynLib};
use crate::error::Error;
use crate::ffi::{
    android_native_base_t, buffer_handle_t, native_handle_t, AHardwareBuffer,
    AHardwareBuffer_Desc, ARect, EGLClientBuffer, AHARDWAREBUFFER_CREATE_FROM_HANDLE_METHOD_CLONE,
    ANDROID_NATIVE_BUFFER_MAGIC,
};
use crate::Result;

/// `native_handle_t::version`, the size of its header in bytes
const NATIVE_HANDLE_VERSION: c_int = 12;

/// First API level whose libnativewindow can import foreign handles
const NATIVEWINDOW_MIN_API_LEVEL: u32 = 29;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferDesc {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub format: u32,
    pub usage: u64,
}

impl BufferDesc {
    pub fn new(width: u32, height: u32, format: u32, usage: u64) -> Self {
        Self {
            width,
            height,
            stride: 0,
            format,
            usage,
        }
    }

    /// Same geometry, format and usage; stride is the allocator's choice
    pub fn matches(&self, other: &BufferDesc) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.format == other.format
            && self.usage == other.usage
    }
}

/// One allocated or imported graphics buffer
pub trait GraphicBuffer: Send + Sync {
    fn desc(&self) -> BufferDesc;

    /// The backing `native_handle_t`, valid for the buffer's lifetime
    fn handle(&self) -> buffer_handle_t;

    /// The buffer as an `EGLClientBuffer` for `EGL_NATIVE_BUFFER_ANDROID`
    fn client_buffer(&self) -> EGLClientBuffer;

    fn lock(&self, usage: u64, rect: ARect) -> Result<*mut c_void>;

    fn unlock(&self) -> Result<()>;
}

pub trait BufferAllocator: Send + Sync {
    fn allocate(&self, desc: BufferDesc) -> Option<Arc<dyn GraphicBuffer>>;

    /// Import a buffer received from another process. The allocator
    /// duplicates what it keeps, `handle` stays owned by the caller.
    fn import(&self, handle: &NativeHandle, desc: BufferDesc) -> Option<Arc<dyn GraphicBuffer>>;
}

// =============================================================================
// Native handle
// =============================================================================

/// A `native_handle_t` laid out in owned memory: header, fds, then ints.
///
/// The fds are borrowed, whoever built the handle keeps them open.
#[derive(Debug, Clone)]
pub struct NativeHandle {
    data: Vec<c_int>,
}

impl NativeHandle {
    pub fn new(fds: &[RawFd], ints: &[c_int]) -> Self {
        let mut data = Vec::with_capacity(3 + fds.len() + ints.len());
        data.push(NATIVE_HANDLE_VERSION);
        data.push(fds.len() as c_int);
        data.push(ints.len() as c_int);
        data.extend_from_slice(fds);
        data.extend_from_slice(ints);
        Self { data }
    }

    /// Copy the fd and int arrays out of a foreign handle
    ///
    /// # Safety
    /// `handle` must be null or point to a valid `native_handle_t`.
    pub unsafe fn parts_of(handle: buffer_handle_t) -> Option<(Vec<RawFd>, Vec<c_int>)> {
        if handle.is_null() {
            return None;
        }
        let num_fds = usize::try_from((*handle).num_fds).ok()?;
        let num_ints = usize::try_from((*handle).num_ints).ok()?;
        let data = std::ptr::addr_of!((*handle).data) as *const c_int;
        let fds = std::slice::from_raw_parts(data, num_fds).to_vec();
        let ints = std::slice::from_raw_parts(data.add(num_fds), num_ints).to_vec();
        Some((fds, ints))
    }

    pub fn num_fds(&self) -> usize {
        self.data[1] as usize
    }

    pub fn fds(&self) -> &[RawFd] {
        &self.data[3..3 + self.num_fds()]
    }

    pub fn ints(&self) -> &[c_int] {
        &self.data[3 + self.num_fds()..]
    }

    pub fn as_ptr(&self) -> buffer_handle_t {
        self.data.as_ptr() as buffer_handle_t
    }
}

/// A native handle whose fds were duplicated and are closed on drop
struct ClonedHandle {
    handle: NativeHandle,
    _fds: Vec<OwnedFd>,
}

impl ClonedHandle {
    fn new(source: &NativeHandle) -> Result<Self> {
        let fds = source
            .fds()
            .iter()
            .map(|fd| unsafe { BorrowedFd::borrow_raw(*fd) }.try_clone_to_owned())
            .collect::<std::io::Result<Vec<OwnedFd>>>()?;
        let raw: Vec<RawFd> = fds.iter().map(|fd| fd.as_raw_fd()).collect();
        Ok(Self {
            handle: NativeHandle::new(&raw, source.ints()),
            _fds: fds,
        })
    }
}

// =============================================================================
// ANativeWindowBuffer wrapper
// =============================================================================

/// C layout of `ANativeWindowBuffer`, the object EGL expects behind
/// `EGL_NATIVE_BUFFER_ANDROID`
#[repr(C)]
struct NativeWindowBuffer {
    common: android_native_base_t,
    width: c_int,
    height: c_int,
    stride: c_int,
    format: c_int,
    usage_deprecated: c_int,
    layer_count: usize,
    reserved: [*mut c_void; 1],
    handle: buffer_handle_t,
    usage: u64,
    reserved_proc: [*mut c_void; 8 - std::mem::size_of::<u64>() / std::mem::size_of::<*mut c_void>()],
}

// The owning Rust buffer controls the lifetime; driver references are not counted
unsafe extern "C" fn native_base_ref(_base: *mut android_native_base_t) {}

/// Heap-pinned `ANativeWindowBuffer` describing a buffer owned elsewhere
struct WindowBufferShim(Box<NativeWindowBuffer>);

impl WindowBufferShim {
    fn new(desc: &BufferDesc, handle: buffer_handle_t) -> Self {
        Self(Box::new(NativeWindowBuffer {
            common: android_native_base_t {
                magic: ANDROID_NATIVE_BUFFER_MAGIC,
                version: std::mem::size_of::<NativeWindowBuffer>() as c_int,
                reserved: [std::ptr::null_mut(); 4],
                inc_ref: native_base_ref,
                dec_ref: native_base_ref,
            },
            width: desc.width as c_int,
            height: desc.height as c_int,
            stride: desc.stride as c_int,
            format: desc.format as c_int,
            usage_deprecated: desc.usage as c_int,
            layer_count: 1,
            reserved: [std::ptr::null_mut(); 1],
            handle,
            usage: desc.usage,
            reserved_proc: [std::ptr::null_mut(); 8 - std::mem::size_of::<u64>() / std::mem::size_of::<*mut c_void>()],
        }))
    }

    fn as_client_buffer(&self) -> EGLClientBuffer {
        &*self.0 as *const NativeWindowBuffer as EGLClientBuffer
    }
}

// =============================================================================
// libnativewindow backend
// =============================================================================

type AllocateFn = unsafe extern "C" fn(*const AHardwareBuffer_Desc, *mut *mut AHardwareBuffer) -> c_int;
type ReleaseFn = unsafe extern "C" fn(*mut AHardwareBuffer);
type DescribeFn = unsafe extern "C" fn(*const AHardwareBuffer, *mut AHardwareBuffer_Desc);
type LockFn = unsafe extern "C" fn(*mut AHardwareBuffer, u64, i32, *const ARect, *mut *mut c_void) -> c_int;
type UnlockFn = unsafe extern "C" fn(*mut AHardwareBuffer, *mut i32) -> c_int;
type GetNativeHandleFn = unsafe extern "C" fn(*const AHardwareBuffer) -> *const native_handle_t;
type CreateFromHandleFn = unsafe extern "C" fn(
    *const AHardwareBuffer_Desc,
    buffer_handle_t,
    i32,
    *mut *mut AHardwareBuffer,
) -> c_int;
type ToWindowBufferFn = unsafe extern "C" fn(*mut AHardwareBuffer) -> *mut c_void;

struct NativeWindowApi {
    _lib: DynLib,
    allocate: AllocateFn,
    release: ReleaseFn,
    describe: DescribeFn,
    lock: LockFn,
    unlock: UnlockFn,
    get_native_handle: GetNativeHandleFn,
    create_from_handle: CreateFromHandleFn,
    to_window_buffer: Option<ToWindowBufferFn>,
}

fn required<F: Copy>(lib: &DynLib, name: &CStr) -> Result<F> {
    unsafe { lib.lookup::<F>(name) }
        .ok_or_else(|| Error::MissingSymbol(name.to_string_lossy().into_owned()))
}

/// `AHardwareBuffer` allocator from `libnativewindow.so`
pub struct NativeWindowAllocator {
    api: Arc<NativeWindowApi>,
}

impl NativeWindowAllocator {
    pub fn open() -> Result<Self> {
        let lib = DynLib::open("libnativewindow.so")?;
        let api = NativeWindowApi {
            allocate: required(&lib, c"AHardwareBuffer_allocate")?,
            release: required(&lib, c"AHardwareBuffer_release")?,
            describe: required(&lib, c"AHardwareBuffer_describe")?,
            lock: required(&lib, c"AHardwareBuffer_lock")?,
            unlock: required(&lib, c"AHardwareBuffer_unlock")?,
            get_native_handle: required(&lib, c"AHardwareBuffer_getNativeHandle")?,
            create_from_handle: required(&lib, c"AHardwareBuffer_createFromHandle")?,
            to_window_buffer: unsafe { lib.lookup(c"AHardwareBuffer_to_ANativeWindowBuffer") },
            _lib: lib,
        };
        info!("gralloc backend: libnativewindow");
        Ok(Self { api: Arc::new(api) })
    }

    fn wrap(&self, ahb: *mut AHardwareBuffer) -> Arc<dyn GraphicBuffer> {
        let mut raw = AHardwareBuffer_Desc::default();
        unsafe { (self.api.describe)(ahb, &mut raw) };
        let desc = BufferDesc {
            width: raw.width,
            height: raw.height,
            stride: raw.stride,
            format: raw.format,
            usage: raw.usage,
        };
        let shim = match self.api.to_window_buffer {
            Some(_) => None,
            None => Some(WindowBufferShim::new(&desc, unsafe {
                (self.api.get_native_handle)(ahb)
            })),
        };
        Arc::new(HardwareBuffer {
            api: self.api.clone(),
            ahb,
            desc,
            shim,
            locked: Mutex::new(false),
        })
    }
}

impl BufferAllocator for NativeWindowAllocator {
    fn allocate(&self, desc: BufferDesc) -> Option<Arc<dyn GraphicBuffer>> {
        let ahb_desc = AHardwareBuffer_Desc {
            width: desc.width,
            height: desc.height,
            layers: 1,
            format: desc.format,
            usage: desc.usage,
            ..Default::default()
        };
        let mut ahb = std::ptr::null_mut();
        let rval = unsafe { (self.api.allocate)(&ahb_desc, &mut ahb) };
        if rval != 0 || ahb.is_null() {
            error!("AHardwareBuffer_allocate failed: {}", rval);
            return None;
        }
        debug!(
            "allocated {:p} {}x{} format 0x{:x} usage 0x{:x}",
            ahb, desc.width, desc.height, desc.format, desc.usage
        );
        Some(self.wrap(ahb))
    }

    fn import(&self, handle: &NativeHandle, desc: BufferDesc) -> Option<Arc<dyn GraphicBuffer>> {
        let ahb_desc = AHardwareBuffer_Desc {
            width: desc.width,
            height: desc.height,
            layers: 1,
            format: desc.format,
            usage: desc.usage,
            stride: desc.stride,
            ..Default::default()
        };
        let mut ahb = std::ptr::null_mut();
        let rval = unsafe {
            (self.api.create_from_handle)(
                &ahb_desc,
                handle.as_ptr(),
                AHARDWAREBUFFER_CREATE_FROM_HANDLE_METHOD_CLONE,
                &mut ahb,
            )
        };
        if rval != 0 || ahb.is_null() {
            error!("AHardwareBuffer_createFromHandle failed: {}", rval);
            return None;
        }
        Some(self.wrap(ahb))
    }
}

struct HardwareBuffer {
    api: Arc<NativeWindowApi>,
    ahb: *mut AHardwareBuffer,
    desc: BufferDesc,
    shim: Option<WindowBufferShim>,
    locked: Mutex<bool>,
}

// AHardwareBuffer is reference counted and thread safe
unsafe impl Send for HardwareBuffer {}
unsafe impl Sync for HardwareBuffer {}

impl GraphicBuffer for HardwareBuffer {
    fn desc(&self) -> BufferDesc {
        self.desc
    }

    fn handle(&self) -> buffer_handle_t {
        unsafe { (self.api.get_native_handle)(self.ahb) }
    }

    fn client_buffer(&self) -> EGLClientBuffer {
        match (self.api.to_window_buffer, &self.shim) {
            (Some(convert), _) => unsafe { convert(self.ahb) },
            (None, Some(shim)) => shim.as_client_buffer(),
            (None, None) => std::ptr::null_mut(),
        }
    }

    fn lock(&self, usage: u64, rect: ARect) -> Result<*mut c_void> {
        let mut locked = self.locked.lock().map_err(|_| Error::Gralloc("lock poisoned".into()))?;
        let mut vaddr = std::ptr::null_mut();
        let rval = unsafe { (self.api.lock)(self.ahb, usage, -1, &rect, &mut vaddr) };
        if rval != 0 {
            return Err(Error::Gralloc(format!("AHardwareBuffer_lock failed: {}", rval)));
        }
        *locked = true;
        Ok(vaddr)
    }

    fn unlock(&self) -> Result<()> {
        let mut locked = self.locked.lock().map_err(|_| Error::Gralloc("lock poisoned".into()))?;
        let mut fence = -1;
        let rval = unsafe { (self.api.unlock)(self.ahb, &mut fence) };
        if fence >= 0 {
            unsafe { libc::close(fence) };
        }
        if rval != 0 {
            return Err(Error::Gralloc(format!("AHardwareBuffer_unlock failed: {}", rval)));
        }
        *locked = false;
        Ok(())
    }
}

impl Drop for HardwareBuffer {
    fn drop(&mut self) {
        if matches!(self.locked.get_mut(), Ok(true)) {
            let _ = self.unlock();
        }
        debug!("release buffer {:p}", self.ahb);
        unsafe { (self.api.release)(self.ahb) };
    }
}

// =============================================================================
// libhardware gralloc0 backend
// =============================================================================

#[repr(C)]
struct HwModule {
    tag: u32,
    module_api_version: u16,
    hal_api_version: u16,
    id: *const c_char,
    name: *const c_char,
    author: *const c_char,
    methods: *const HwModuleMethods,
    dso: *mut c_void,
    reserved: [usize; 25],
}

#[repr(C)]
struct HwModuleMethods {
    open: Option<unsafe extern "C" fn(*const HwModule, *const c_char, *mut *mut HwDevice) -> c_int>,
}

#[repr(C)]
struct HwDevice {
    tag: u32,
    version: u32,
    module: *mut HwModule,
    reserved: [usize; 12],
    close: Option<unsafe extern "C" fn(*mut HwDevice) -> c_int>,
}

#[repr(C)]
struct GrallocModule {
    common: HwModule,
    register_buffer: Option<unsafe extern "C" fn(*const GrallocModule, buffer_handle_t) -> c_int>,
    unregister_buffer: Option<unsafe extern "C" fn(*const GrallocModule, buffer_handle_t) -> c_int>,
    lock: Option<
        unsafe extern "C" fn(
            *const GrallocModule,
            buffer_handle_t,
            c_int,
            c_int,
            c_int,
            c_int,
            c_int,
            *mut *mut c_void,
        ) -> c_int,
    >,
    unlock: Option<unsafe extern "C" fn(*const GrallocModule, buffer_handle_t) -> c_int>,
}

#[repr(C)]
struct AllocDevice {
    common: HwDevice,
    alloc: Option<
        unsafe extern "C" fn(
            *mut AllocDevice,
            c_int,
            c_int,
            c_int,
            c_int,
            *mut buffer_handle_t,
            *mut c_int,
        ) -> c_int,
    >,
    free: Option<unsafe extern "C" fn(*mut AllocDevice, buffer_handle_t) -> c_int>,
}

type HwGetModuleFn = unsafe extern "C" fn(*const c_char, *mut *const HwModule) -> c_int;

struct Gralloc0 {
    _lib: DynLib,
    module: *const GrallocModule,
    device: *mut AllocDevice,
}

unsafe impl Send for Gralloc0 {}
unsafe impl Sync for Gralloc0 {}

impl Drop for Gralloc0 {
    fn drop(&mut self) {
        unsafe {
            if let Some(close) = (*self.device).common.close {
                close(&mut (*self.device).common);
            }
        }
    }
}

/// gralloc0 allocator from the libhardware `gralloc` module
pub struct HardwareModuleAllocator {
    gralloc: Arc<Gralloc0>,
}

impl HardwareModuleAllocator {
    pub fn open() -> Result<Self> {
        let lib = DynLib::open("libhardware.so")?;
        let hw_get_module: HwGetModuleFn = required(&lib, c"hw_get_module")?;

        let mut module: *const HwModule = std::ptr::null();
        let rval = unsafe { hw_get_module(c"gralloc".as_ptr(), &mut module) };
        if rval != 0 || module.is_null() {
            return Err(Error::Gralloc(format!("hw_get_module(gralloc) failed: {}", rval)));
        }

        let major = unsafe { ((*module).module_api_version >> 8) & 0xff };
        if major >= 1 {
            return Err(Error::Gralloc(format!("gralloc{} modules are not supported", major)));
        }

        let open = unsafe { (*module).methods.as_ref() }
            .and_then(|methods| methods.open)
            .ok_or_else(|| Error::Gralloc("gralloc module has no open method".into()))?;
        let mut device: *mut HwDevice = std::ptr::null_mut();
        let rval = unsafe { open(module, c"gpu0".as_ptr(), &mut device) };
        if rval != 0 || device.is_null() {
            return Err(Error::Gralloc(format!("cannot open gralloc0 device: {}", rval)));
        }

        info!("gralloc backend: libhardware gralloc0");
        Ok(Self {
            gralloc: Arc::new(Gralloc0 {
                _lib: lib,
                module: module as *const GrallocModule,
                device: device as *mut AllocDevice,
            }),
        })
    }
}

impl BufferAllocator for HardwareModuleAllocator {
    fn allocate(&self, desc: BufferDesc) -> Option<Arc<dyn GraphicBuffer>> {
        let alloc = unsafe { (*self.gralloc.device).alloc }?;
        let mut handle: buffer_handle_t = std::ptr::null();
        let mut stride: c_int = 0;
        let rval = unsafe {
            alloc(
                self.gralloc.device,
                desc.width as c_int,
                desc.height as c_int,
                desc.format as c_int,
                desc.usage as c_int,
                &mut handle,
                &mut stride,
            )
        };
        if rval != 0 || handle.is_null() {
            error!("gralloc0 alloc failed: {}", rval);
            return None;
        }
        let desc = BufferDesc {
            stride: stride as u32,
            ..desc
        };
        Some(Arc::new(ModuleBuffer::new(
            self.gralloc.clone(),
            BufferOrigin::Allocated(handle),
            desc,
        )))
    }

    fn import(&self, handle: &NativeHandle, desc: BufferDesc) -> Option<Arc<dyn GraphicBuffer>> {
        let register = unsafe { (*self.gralloc.module).register_buffer }?;
        let cloned = match ClonedHandle::new(handle) {
            Ok(cloned) => cloned,
            Err(e) => {
                error!("cannot duplicate buffer fds: {}", e);
                return None;
            }
        };
        let rval = unsafe { register(self.gralloc.module, cloned.handle.as_ptr()) };
        if rval != 0 {
            error!("gralloc0 registerBuffer failed: {}", rval);
            return None;
        }
        Some(Arc::new(ModuleBuffer::new(
            self.gralloc.clone(),
            BufferOrigin::Imported(cloned),
            desc,
        )))
    }
}

enum BufferOrigin {
    Allocated(buffer_handle_t),
    Imported(ClonedHandle),
}

struct ModuleBuffer {
    gralloc: Arc<Gralloc0>,
    origin: BufferOrigin,
    desc: BufferDesc,
    shim: WindowBufferShim,
    locked: Mutex<bool>,
}

impl ModuleBuffer {
    fn new(gralloc: Arc<Gralloc0>, origin: BufferOrigin, desc: BufferDesc) -> Self {
        let handle = match &origin {
            BufferOrigin::Allocated(handle) => *handle,
            BufferOrigin::Imported(cloned) => cloned.handle.as_ptr(),
        };
        Self {
            gralloc,
            origin,
            desc,
            shim: WindowBufferShim::new(&desc, handle),
            locked: Mutex::new(false),
        }
    }
}

unsafe impl Send for ModuleBuffer {}
unsafe impl Sync for ModuleBuffer {}

impl GraphicBuffer for ModuleBuffer {
    fn desc(&self) -> BufferDesc {
        self.desc
    }

    fn handle(&self) -> buffer_handle_t {
        match &self.origin {
            BufferOrigin::Allocated(handle) => *handle,
            BufferOrigin::Imported(cloned) => cloned.handle.as_ptr(),
        }
    }

    fn client_buffer(&self) -> EGLClientBuffer {
        self.shim.as_client_buffer()
    }

    fn lock(&self, usage: u64, rect: ARect) -> Result<*mut c_void> {
        let mut locked = self.locked.lock().map_err(|_| Error::Gralloc("lock poisoned".into()))?;
        let lock = unsafe { (*self.gralloc.module).lock }
            .ok_or_else(|| Error::Gralloc("gralloc0 module has no lock".into()))?;
        let mut vaddr = std::ptr::null_mut();
        let rval = unsafe {
            lock(
                self.gralloc.module,
                self.handle(),
                usage as c_int,
                rect.left,
                rect.top,
                rect.right - rect.left,
                rect.bottom - rect.top,
                &mut vaddr,
            )
        };
        if rval != 0 {
            return Err(Error::Gralloc(format!("gralloc0 lock failed: {}", rval)));
        }
        *locked = true;
        Ok(vaddr)
    }

    fn unlock(&self) -> Result<()> {
        let mut locked = self.locked.lock().map_err(|_| Error::Gralloc("lock poisoned".into()))?;
        let unlock = unsafe { (*self.gralloc.module).unlock }
            .ok_or_else(|| Error::Gralloc("gralloc0 module has no unlock".into()))?;
        let rval = unsafe { unlock(self.gralloc.module, self.handle()) };
        if rval != 0 {
            return Err(Error::Gralloc(format!("gralloc0 unlock failed: {}", rval)));
        }
        *locked = false;
        Ok(())
    }
}

impl Drop for ModuleBuffer {
    fn drop(&mut self) {
        if matches!(self.locked.get_mut(), Ok(true)) {
            let _ = self.unlock();
        }
        unsafe {
            match &self.origin {
                BufferOrigin::Allocated(handle) => {
                    if let Some(free) = (*self.gralloc.device).free {
                        free(self.gralloc.device, *handle);
                    }
                }
                BufferOrigin::Imported(cloned) => {
                    if let Some(unregister) = (*self.gralloc.module).unregister_buffer {
                        unregister(self.gralloc.module, cloned.handle.as_ptr());
                    }
                }
            }
        }
    }
}

// =============================================================================
// Backend selection
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    NativeWindow,
    Hardware,
    None,
}

type ApiLevelFn = unsafe extern "C" fn() -> c_int;
type PropertyGetFn = unsafe extern "C" fn(*const c_char, *mut c_char) -> c_int;

/// Android API level of the running device, when it can be determined
pub fn device_api_level() -> Option<u32> {
    let addr = global_symbol(c"android_get_device_api_level");
    if !addr.is_null() {
        let get: ApiLevelFn = unsafe { std::mem::transmute(addr) };
        return u32::try_from(unsafe { get() }).ok().filter(|level| *level > 0);
    }

    let addr = global_symbol(c"__system_property_get");
    if addr.is_null() {
        return None;
    }
    let get: PropertyGetFn = unsafe { std::mem::transmute(addr) };
    // PROP_VALUE_MAX
    let mut value = [0 as c_char; 92];
    let len = unsafe { get(c"ro.build.version.sdk".as_ptr(), value.as_mut_ptr()) };
    if len <= 0 {
        return None;
    }
    unsafe { CStr::from_ptr(value.as_ptr()) }
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// libnativewindow is tried first unless forced off or the device is too old
pub fn prefers_nativewindow(config: &Config, api_level: Option<u32>) -> bool {
    if config.always_use_libhardware {
        return false;
    }
    api_level.map_or(true, |level| level >= NATIVEWINDOW_MIN_API_LEVEL)
}

/// Probe the backends in order and return the first that opens
pub fn load_allocator(config: &Config) -> (Backend, Option<Arc<dyn BufferAllocator>>) {
    if prefers_nativewindow(config, device_api_level()) {
        match NativeWindowAllocator::open() {
            Ok(allocator) => return (Backend::NativeWindow, Some(Arc::new(allocator))),
            Err(e) => debug!("libnativewindow unavailable: {}", e),
        }
    }

    match HardwareModuleAllocator::open() {
        Ok(allocator) => (Backend::Hardware, Some(Arc::new(allocator))),
        Err(e) => {
            warn!("no gralloc backend available: {}", e);
            (Backend::None, None)
        }
    }
}

/// Process-wide allocator, probed on first use
pub fn global() -> Option<Arc<dyn BufferAllocator>> {
    static ALLOCATOR: OnceLock<(Backend, Option<Arc<dyn BufferAllocator>>)> = OnceLock::new();
    ALLOCATOR
        .get_or_init(|| load_allocator(Config::global()))
        .1
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_handle_layout() {
        let handle = NativeHandle::new(&[7, 8], &[1, 2, 3]);
        assert_eq!(handle.fds(), &[7, 8]);
        assert_eq!(handle.ints(), &[1, 2, 3]);

        let header = unsafe { &*handle.as_ptr() };
        assert_eq!(header.version, NATIVE_HANDLE_VERSION);
        assert_eq!(header.num_fds, 2);
        assert_eq!(header.num_ints, 3);

        let (fds, ints) = unsafe { NativeHandle::parts_of(handle.as_ptr()) }.unwrap();
        assert_eq!(fds, vec![7, 8]);
        assert_eq!(ints, vec![1, 2, 3]);
        assert!(unsafe { NativeHandle::parts_of(std::ptr::null()) }.is_none());
    }

    #[test]
    fn test_cloned_handle_owns_duplicates() {
        let (read, write) = std::os::unix::net::UnixStream::pair().unwrap();
        let source = NativeHandle::new(&[read.as_raw_fd(), write.as_raw_fd()], &[42]);
        let cloned = ClonedHandle::new(&source).unwrap();

        assert_eq!(cloned.handle.ints(), &[42]);
        assert_eq!(cloned.handle.fds().len(), 2);
        assert_ne!(cloned.handle.fds()[0], read.as_raw_fd());
        assert_ne!(cloned.handle.fds()[1], write.as_raw_fd());
    }

    #[test]
    fn test_cloned_handle_bad_fd_is_io_error() {
        let source = NativeHandle::new(&[9999], &[1]);
        assert!(matches!(ClonedHandle::new(&source), Err(Error::Io(_))));
    }

    #[test]
    fn test_backend_preference() {
        let config = Config::default();
        assert!(prefers_nativewindow(&config, Some(30)));
        assert!(prefers_nativewindow(&config, Some(29)));
        assert!(!prefers_nativewindow(&config, Some(28)));
        assert!(prefers_nativewindow(&config, None));

        let forced = Config {
            always_use_libhardware: true,
            ..Config::default()
        };
        assert!(!prefers_nativewindow(&forced, Some(33)));
    }

    #[test]
    fn test_window_buffer_shim() {
        let handle = NativeHandle::new(&[], &[5]);
        let desc = BufferDesc {
            stride: 64,
            ..BufferDesc::new(48, 32, 1, 0x300)
        };
        let shim = WindowBufferShim::new(&desc, handle.as_ptr());
        let raw = unsafe { &*(shim.as_client_buffer() as *const NativeWindowBuffer) };
        assert_eq!(raw.common.magic, 0x5f626672);
        assert_eq!(raw.common.magic, ANDROID_NATIVE_BUFFER_MAGIC);
        assert_eq!(raw.width, 48);
        assert_eq!(raw.height, 32);
        assert_eq!(raw.stride, 64);
        assert_eq!(raw.usage, 0x300);
        assert_eq!(raw.handle, handle.as_ptr());
    }

    #[test]
    fn test_desc_matches_ignores_stride() {
        let a = BufferDesc::new(64, 64, 1, 0x300);
        let b = BufferDesc { stride: 128, ..a };
        assert!(a.matches(&b));
        assert!(!a.matches(&BufferDesc::new(64, 32, 1, 0x300)));
    }
}

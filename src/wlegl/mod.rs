//! Server half of the `android_wlegl` buffer-sharing protocol
//!
//! A client describes a native buffer as an fd list plus an int array
//! (`create_handle` + `add_fd`), then asks for a `wl_buffer` built from it
//! (`create_buffer`). The server rebuilds the native handle, imports it
//! through the gralloc backend and keeps the result until the client
//! destroys the resource.
//!
//! Resources are identified by [`ResourceId`]. [`transport`] maps
//! libwayland resources onto them and posts [`ProtocolError`]s back on the
//! offending resource.

pub mod protocol;
pub mod transport;

pub use transport::LibWaylandTransport;

use std::collections::HashMap;
use std::ffi::c_int;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::ffi::EGLClientBuffer;
use crate::gralloc::{BufferAllocator, BufferDesc, GraphicBuffer, NativeHandle};
use crate::registry::{lock, Handle};

/// `android_wlegl` error: the handle argument is not a live handle
pub const WLEGL_ERROR_BAD_HANDLE: u32 = 0;
/// `android_wlegl` error: an argument is out of range
pub const WLEGL_ERROR_BAD_VALUE: u32 = 1;
/// `android_wlegl_handle` error: more fds than declared
pub const WLEGL_HANDLE_ERROR_TOO_MANY_FDS: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(pub usize);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("protocol error {code}: {message}")]
pub struct ProtocolError {
    pub code: u32,
    pub message: String,
}

impl ProtocolError {
    fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Publishes the `android_wlegl` global on a compositor's `wl_display`
pub trait WleglTransport: Send + Sync {
    fn advertise(&self, display: Handle, server: Arc<WleglServer>) -> bool;
    fn withdraw(&self, display: Handle);
}

#[derive(Debug, Default)]
struct HandleDataInner {
    /// Owned until the handle resource is destroyed
    fds: Vec<OwnedFd>,
    ints: Vec<c_int>,
    num_fds: usize,
}

/// Data kept for each `android_wlegl_handle`
#[derive(Debug, Default)]
pub struct HandleData {
    inner: Mutex<HandleDataInner>,
}

impl HandleData {
    fn new(num_fds: usize, ints: &[c_int]) -> Self {
        Self {
            inner: Mutex::new(HandleDataInner {
                fds: Vec::with_capacity(num_fds),
                ints: ints.to_vec(),
                num_fds,
            }),
        }
    }

    /// Attach the next fd. Excess fds are closed.
    fn add_fd(&self, fd: OwnedFd) -> Result<(), ProtocolError> {
        let mut inner = lock(&self.inner);
        if inner.fds.len() >= inner.num_fds {
            drop(fd);
            return Err(ProtocolError::new(WLEGL_HANDLE_ERROR_TOO_MANY_FDS, "too many fd"));
        }
        inner.fds.push(fd);
        Ok(())
    }

    /// Fds first, then ints. The fds stay owned by this handle.
    fn native_handle(&self) -> Result<NativeHandle, ProtocolError> {
        let inner = lock(&self.inner);
        if inner.fds.len() != inner.num_fds {
            return Err(ProtocolError::new(
                WLEGL_ERROR_BAD_HANDLE,
                format!("handle has {} of {} fds", inner.fds.len(), inner.num_fds),
            ));
        }
        let fds: Vec<RawFd> = inner.fds.iter().map(|fd| fd.as_raw_fd()).collect();
        Ok(NativeHandle::new(&fds, &inner.ints))
    }
}

/// Data for a `wl_buffer` imported from an android native handle
pub struct AndroidBufferData {
    pub width: i32,
    pub height: i32,
    pub stride: i32,
    pub format: i32,
    pub usage: i32,
    buffer: Arc<dyn GraphicBuffer>,
}

impl AndroidBufferData {
    fn new(buffer: Arc<dyn GraphicBuffer>) -> Self {
        let desc = buffer.desc();
        Self {
            width: desc.width as i32,
            height: desc.height as i32,
            stride: desc.stride as i32,
            format: desc.format as i32,
            usage: desc.usage as i32,
            buffer,
        }
    }

    pub fn desc(&self) -> BufferDesc {
        BufferDesc {
            width: self.width as u32,
            height: self.height as u32,
            stride: self.stride as u32,
            format: self.format as u32,
            usage: self.usage as u32 as u64,
        }
    }

    /// The imported buffer as `EGL_NATIVE_BUFFER_ANDROID` client buffer
    pub fn client_buffer(&self) -> EGLClientBuffer {
        self.buffer.client_buffer()
    }
}

/// Per-display `android_wlegl` state: the target every handle and buffer
/// request is dispatched to
pub struct WleglServer {
    display: Handle,
    allocator: Option<Arc<dyn BufferAllocator>>,
    handles: Mutex<HashMap<ResourceId, Arc<HandleData>>>,
    buffers: Mutex<HashMap<ResourceId, Arc<AndroidBufferData>>>,
}

impl WleglServer {
    pub fn new(display: Handle, allocator: Option<Arc<dyn BufferAllocator>>) -> Self {
        Self {
            display,
            allocator,
            handles: Mutex::new(HashMap::new()),
            buffers: Mutex::new(HashMap::new()),
        }
    }

    /// Compositor display this server is bound to
    pub fn display(&self) -> Handle {
        self.display
    }

    pub fn create_handle(
        &self,
        id: ResourceId,
        num_fds: i32,
        ints: &[c_int],
    ) -> Result<(), ProtocolError> {
        let num_fds = usize::try_from(num_fds).map_err(|_| {
            ProtocolError::new(WLEGL_ERROR_BAD_VALUE, format!("num_fds {} is invalid.", num_fds))
        })?;
        debug!("create_handle {:?}: {} fds, {} ints", id, num_fds, ints.len());
        lock(&self.handles).insert(id, Arc::new(HandleData::new(num_fds, ints)));
        Ok(())
    }

    fn handle(&self, id: ResourceId) -> Option<Arc<HandleData>> {
        lock(&self.handles).get(&id).cloned()
    }

    pub fn add_fd(&self, handle: ResourceId, fd: OwnedFd) -> Result<(), ProtocolError> {
        let data = self
            .handle(handle)
            .ok_or_else(|| ProtocolError::new(WLEGL_ERROR_BAD_HANDLE, "unknown handle"))?;
        data.add_fd(fd)
    }

    /// Client destroyed the handle resource; its fds close here
    pub fn destroy_handle(&self, handle: ResourceId) {
        lock(&self.handles).remove(&handle);
    }

    /// Import the buffer described by `handle`. Returns `Ok(None)` when the
    /// gralloc backend rejects it; no buffer object exists in that case.
    #[allow(clippy::too_many_arguments)]
    pub fn create_buffer(
        &self,
        id: ResourceId,
        width: i32,
        height: i32,
        stride: i32,
        format: i32,
        usage: i32,
        handle: ResourceId,
    ) -> Result<Option<Arc<AndroidBufferData>>, ProtocolError> {
        let data = self
            .handle(handle)
            .ok_or_else(|| ProtocolError::new(WLEGL_ERROR_BAD_HANDLE, "not a handle"))?;
        let native = data.native_handle()?;

        if width <= 0 || height <= 0 {
            return Err(ProtocolError::new(
                WLEGL_ERROR_BAD_VALUE,
                format!("invalid buffer size {}x{}", width, height),
            ));
        }

        let Some(allocator) = &self.allocator else {
            warn!("create_buffer: no gralloc backend to import into");
            return Ok(None);
        };

        // The allocator clones what it keeps; the handle's fds stay ours
        let desc = BufferDesc {
            width: width as u32,
            height: height as u32,
            stride: stride.max(0) as u32,
            format: format as u32,
            usage: usage as u32 as u64,
        };
        let Some(buffer) = allocator.import(&native, desc) else {
            error!("create_buffer {:?}: import of {}x{} failed", id, width, height);
            return Ok(None);
        };

        let remote = Arc::new(AndroidBufferData::new(buffer));
        lock(&self.buffers).insert(id, remote.clone());
        Ok(Some(remote))
    }

    pub fn destroy_buffer(&self, id: ResourceId) {
        lock(&self.buffers).remove(&id);
    }

    pub fn buffer(&self, id: ResourceId) -> Option<Arc<AndroidBufferData>> {
        lock(&self.buffers).get(&id).cloned()
    }

    /// Resolve a `wl_buffer` resource to its native buffer, or null
    pub fn client_buffer(&self, id: ResourceId) -> EGLClientBuffer {
        self.buffer(id)
            .map_or(std::ptr::null_mut(), |buffer| buffer.client_buffer())
    }

    pub fn handle_count(&self) -> usize {
        lock(&self.handles).len()
    }

    pub fn buffer_count(&self) -> usize {
        lock(&self.buffers).len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Read;
    use std::os::unix::net::UnixStream;

    use crate::ffi::{buffer_handle_t, ARect};
    use crate::Result;

    pub(crate) struct MemoryBuffer {
        pub desc: BufferDesc,
        pub ints: Vec<c_int>,
    }

    impl GraphicBuffer for MemoryBuffer {
        fn desc(&self) -> BufferDesc {
            self.desc
        }

        fn handle(&self) -> buffer_handle_t {
            std::ptr::null()
        }

        fn client_buffer(&self) -> EGLClientBuffer {
            self as *const MemoryBuffer as EGLClientBuffer
        }

        fn lock(&self, _usage: u64, _rect: ARect) -> Result<*mut std::ffi::c_void> {
            Ok(std::ptr::null_mut())
        }

        fn unlock(&self) -> Result<()> {
            Ok(())
        }
    }

    /// Imports succeed unless `fail` is set
    pub(crate) struct MemoryAllocator {
        pub fail: bool,
    }

    impl BufferAllocator for MemoryAllocator {
        fn allocate(&self, desc: BufferDesc) -> Option<Arc<dyn GraphicBuffer>> {
            if self.fail {
                return None;
            }
            Some(Arc::new(MemoryBuffer {
                desc: BufferDesc {
                    stride: desc.width,
                    ..desc
                },
                ints: Vec::new(),
            }))
        }

        fn import(&self, handle: &NativeHandle, desc: BufferDesc) -> Option<Arc<dyn GraphicBuffer>> {
            if self.fail {
                return None;
            }
            Some(Arc::new(MemoryBuffer {
                desc,
                ints: handle.ints().to_vec(),
            }))
        }
    }

    fn server(fail: bool) -> WleglServer {
        WleglServer::new(Handle(0x10), Some(Arc::new(MemoryAllocator { fail })))
    }

    fn peer_closed(peer: &mut UnixStream) -> bool {
        let mut byte = [0u8; 1];
        matches!(peer.read(&mut byte), Ok(0))
    }

    #[test]
    fn test_negative_fd_count_rejected() {
        let server = server(false);
        let err = server.create_handle(ResourceId(1), -1, &[]).unwrap_err();
        assert_eq!(err.code, WLEGL_ERROR_BAD_VALUE);
        assert_eq!(server.handle_count(), 0);
    }

    #[test]
    fn test_too_many_fds_closes_extra() {
        let server = server(false);
        server.create_handle(ResourceId(1), 1, &[7]).unwrap();

        let (kept, mut peer_a) = UnixStream::pair().unwrap();
        server.add_fd(ResourceId(1), OwnedFd::from(kept)).unwrap();

        let (extra, mut peer_b) = UnixStream::pair().unwrap();
        let err = server.add_fd(ResourceId(1), OwnedFd::from(extra)).unwrap_err();
        assert_eq!(err.code, WLEGL_HANDLE_ERROR_TOO_MANY_FDS);
        assert!(peer_closed(&mut peer_b));

        server.destroy_handle(ResourceId(1));
        assert!(peer_closed(&mut peer_a));
    }

    #[test]
    fn test_failed_import_creates_nothing_and_leaks_nothing() {
        let server = server(true);
        server.create_handle(ResourceId(1), 2, &[1, 2, 3]).unwrap();
        let (a, mut peer_a) = UnixStream::pair().unwrap();
        let (b, mut peer_b) = UnixStream::pair().unwrap();
        server.add_fd(ResourceId(1), OwnedFd::from(a)).unwrap();
        server.add_fd(ResourceId(1), OwnedFd::from(b)).unwrap();

        let result = server
            .create_buffer(ResourceId(2), 64, 64, 64, 1, 0x300, ResourceId(1))
            .unwrap();
        assert!(result.is_none());
        assert_eq!(server.buffer_count(), 0);
        assert!(server.client_buffer(ResourceId(2)).is_null());

        server.destroy_handle(ResourceId(1));
        assert!(peer_closed(&mut peer_a));
        assert!(peer_closed(&mut peer_b));
    }

    #[test]
    fn test_create_buffer_resolves_resource() {
        let server = server(false);
        server.create_handle(ResourceId(1), 0, &[9, 8]).unwrap();
        let buffer = server
            .create_buffer(ResourceId(2), 32, 16, 32, 4, 0x100, ResourceId(1))
            .unwrap()
            .unwrap();
        assert_eq!(buffer.desc().width, 32);
        assert_eq!(buffer.desc().height, 16);
        assert_eq!(buffer.desc().format, 4);
        assert_eq!(server.client_buffer(ResourceId(2)), buffer.client_buffer());

        server.destroy_buffer(ResourceId(2));
        assert!(server.buffer(ResourceId(2)).is_none());
    }

    #[test]
    fn test_buffer_records_imported_allocation() {
        let server = server(false);
        server.create_handle(ResourceId(1), 0, &[]).unwrap();
        let buffer = server
            .create_buffer(ResourceId(2), 20, 10, 24, 1, 0x933, ResourceId(1))
            .unwrap()
            .unwrap();
        assert_eq!((buffer.width, buffer.height, buffer.stride), (20, 10, 24));
        assert_eq!((buffer.format, buffer.usage), (1, 0x933));
        assert_eq!(buffer.desc().usage, 0x933);
    }

    #[test]
    fn test_poisoned_tables_keep_working() {
        let server = Arc::new(server(false));
        let poisoner = server.clone();
        let _ = std::thread::spawn(move || {
            let _handles = poisoner.handles.lock().unwrap();
            let _buffers = poisoner.buffers.lock().unwrap();
            panic!("poison the tables");
        })
        .join();
        assert!(server.handles.is_poisoned());

        server.create_handle(ResourceId(1), 0, &[5]).unwrap();
        assert_eq!(server.handle_count(), 1);
        assert!(server
            .create_buffer(ResourceId(2), 8, 8, 8, 1, 0, ResourceId(1))
            .unwrap()
            .is_some());
        assert_eq!(server.buffer_count(), 1);
        server.destroy_buffer(ResourceId(2));
        server.destroy_handle(ResourceId(1));
        assert_eq!(server.buffer_count(), 0);
        assert_eq!(server.handle_count(), 0);
    }

    #[test]
    fn test_create_buffer_unknown_handle() {
        let server = server(false);
        let err = server
            .create_buffer(ResourceId(2), 32, 16, 32, 4, 0x100, ResourceId(99))
            .err()
            .unwrap();
        assert_eq!(err.code, WLEGL_ERROR_BAD_HANDLE);
    }

    #[test]
    fn test_create_buffer_missing_fds() {
        let server = server(false);
        server.create_handle(ResourceId(1), 1, &[]).unwrap();
        let err = server
            .create_buffer(ResourceId(2), 32, 16, 32, 4, 0x100, ResourceId(1))
            .err()
            .unwrap();
        assert_eq!(err.code, WLEGL_ERROR_BAD_HANDLE);
    }
}

//! Wayland client integration
//!
//! Each `wl_egl_window` becomes a [`WaylandWindow`]: a small pool of gralloc
//! buffers that the driver renders into and that are posted to the
//! compositor as `android_wlegl` wire buffers.
//!
//! The Wayland client library is reached through [`WaylandConnector`] (one
//! per process) and [`WaylandConnection`] (one event queue per window), so
//! the buffer logic here does not depend on a particular binding.
//!
//! Lock order inside a window: `conn` before `state`. Events are only ever
//! applied while `conn` is held.

use std::collections::{HashMap, VecDeque};
use std::ffi::{c_int, c_void};
use std::io;
use std::os::fd::{BorrowedFd, OwnedFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info, trace, warn};

use super::native_window::{wait_fence, NativeWindowOps, NativeWindowShim, BAD_VALUE, NO_ERROR};
use super::{DamageRect, PlatformAdapter};
use crate::ffi::{
    AHARDWAREBUFFER_FORMAT_R8G8B8A8_UNORM, AHARDWAREBUFFER_USAGE_GPU_FRAMEBUFFER,
    AHARDWAREBUFFER_USAGE_GPU_SAMPLED_IMAGE,
};
use crate::gralloc::{BufferAllocator, BufferDesc, GraphicBuffer, NativeHandle};
use crate::registry::{lock, Handle};
use crate::Result;

const DEFAULT_BUFFER_COUNT: usize = 3;

/// A client-side protocol object (`wl_buffer`, `wl_callback`, handle)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    /// `wl_buffer.release`
    BufferRelease(ObjectId),
    /// `wl_callback.done` for a frame or sync callback
    CallbackDone(ObjectId),
    /// `wl_egl_window_resize` was called on the application window
    Resized { width: i32, height: i32 },
    /// The application destroyed its `wl_egl_window`
    WindowDestroyed,
}

/// One window's view of the compositor connection, bound to a private
/// event queue
pub trait WaylandConnection: Send {
    /// Block until at least one event arrives on the window queue
    fn dispatch(&mut self) -> io::Result<Vec<ClientEvent>>;
    fn dispatch_pending(&mut self) -> io::Result<Vec<ClientEvent>>;

    fn create_handle(&mut self, num_fds: i32, ints: &[c_int]) -> Option<ObjectId>;
    fn handle_add_fd(&mut self, handle: ObjectId, fd: BorrowedFd<'_>);
    fn handle_destroy(&mut self, handle: ObjectId);
    fn create_buffer(&mut self, desc: &BufferDesc, handle: ObjectId) -> Option<ObjectId>;
    fn buffer_destroy(&mut self, buffer: ObjectId);

    fn surface_attach(&mut self, buffer: ObjectId, x: i32, y: i32);
    fn surface_damage(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn surface_frame(&mut self) -> ObjectId;
    fn surface_commit(&mut self);
    fn display_sync(&mut self) -> ObjectId;

    /// Report the size of the attached buffer back to the `wl_egl_window`
    fn set_attached_size(&mut self, width: i32, height: i32);
    fn flush(&mut self) -> io::Result<()>;
}

pub struct WindowConnection {
    pub connection: Box<dyn WaylandConnection>,
    pub width: i32,
    pub height: i32,
}

/// Process-wide access to the Wayland client library
pub trait WaylandConnector: Send + Sync {
    /// Connect to `display` (null: the default compositor) and bind
    /// `android_wlegl`
    fn connect(&self, display: Handle) -> Result<()>;
    fn disconnect(&self);
    /// Open a window queue for the `wl_egl_window` at `native`
    fn open_window(&self, native: Handle) -> Option<WindowConnection>;
}

// =============================================================================
// Window
// =============================================================================

type BufferId = u64;

struct WindowBuffer {
    id: BufferId,
    buffer: Arc<dyn GraphicBuffer>,
    /// What was requested; the allocator may pick a different stride
    desc: BufferDesc,
    busy: bool,
    wire: Option<ObjectId>,
}

struct WindowState {
    buffers: Vec<WindowBuffer>,
    /// Attached and not yet released by the compositor, oldest first
    posted: VecDeque<BufferId>,
    queue: VecDeque<BufferId>,
    last: Option<BufferId>,
    throttle: Option<ObjectId>,
    /// Wire buffers of dropped pool entries, destroyed on the next swap
    retired: Vec<ObjectId>,
    damage: Vec<DamageRect>,
    width: i32,
    height: i32,
    default_width: i32,
    default_height: i32,
    format: u32,
    usage: u64,
    swap_interval: i32,
    buffer_count: usize,
    attached: (i32, i32),
    destroyed: bool,
    next_id: BufferId,
}

impl WindowState {
    fn requested(&self) -> BufferDesc {
        BufferDesc::new(
            self.width.max(1) as u32,
            self.height.max(1) as u32,
            self.format,
            self.usage,
        )
    }

    fn slot_mut(&mut self, id: BufferId) -> Option<&mut WindowBuffer> {
        self.buffers.iter_mut().find(|slot| slot.id == id)
    }

    fn forget(&mut self, id: BufferId) {
        self.posted.retain(|posted| *posted != id);
        self.queue.retain(|queued| *queued != id);
        if self.last == Some(id) {
            self.last = None;
        }
    }

    fn remove_at(&mut self, index: usize) {
        let slot = self.buffers.remove(index);
        if let Some(wire) = slot.wire {
            self.retired.push(wire);
        }
        self.forget(slot.id);
    }

    fn release(&mut self, wire: ObjectId) {
        let posted = self.posted.iter().position(|id| {
            self.buffers
                .iter()
                .any(|slot| slot.id == *id && slot.wire == Some(wire))
        });
        if let Some(index) = posted {
            if let Some(id) = self.posted.remove(index) {
                if let Some(slot) = self.slot_mut(id) {
                    slot.busy = false;
                }
            }
            return;
        }

        match self.buffers.iter_mut().find(|slot| slot.wire == Some(wire)) {
            Some(slot) => slot.busy = false,
            None => trace!("release for unknown wl_buffer {:?}", wire),
        }
    }
}

pub struct WaylandWindow {
    conn: Mutex<Box<dyn WaylandConnection>>,
    state: Mutex<WindowState>,
    allocator: Option<Arc<dyn BufferAllocator>>,
}

impl WaylandWindow {
    pub fn new(window: WindowConnection, allocator: Option<Arc<dyn BufferAllocator>>) -> Self {
        Self {
            conn: Mutex::new(window.connection),
            state: Mutex::new(WindowState {
                buffers: Vec::new(),
                posted: VecDeque::new(),
                queue: VecDeque::new(),
                last: None,
                throttle: None,
                retired: Vec::new(),
                damage: Vec::new(),
                width: window.width,
                height: window.height,
                default_width: window.width,
                default_height: window.height,
                format: AHARDWAREBUFFER_FORMAT_R8G8B8A8_UNORM,
                usage: AHARDWAREBUFFER_USAGE_GPU_SAMPLED_IMAGE | AHARDWAREBUFFER_USAGE_GPU_FRAMEBUFFER,
                swap_interval: 1,
                buffer_count: DEFAULT_BUFFER_COUNT,
                attached: (0, 0),
                destroyed: false,
                next_id: 0,
            }),
            allocator,
        }
    }

    fn state(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn conn(&self) -> MutexGuard<'_, Box<dyn WaylandConnection>> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply(&self, events: Vec<ClientEvent>) {
        if events.is_empty() {
            return;
        }
        let mut state = self.state();
        for event in events {
            match event {
                ClientEvent::BufferRelease(wire) => state.release(wire),
                ClientEvent::CallbackDone(callback) => {
                    if state.throttle == Some(callback) {
                        state.throttle = None;
                    }
                }
                ClientEvent::Resized { width, height } => {
                    state.width = width;
                    state.default_width = width;
                    state.height = height;
                    state.default_height = height;
                }
                ClientEvent::WindowDestroyed => state.destroyed = true,
            }
        }
    }

    /// Compositor resize of the application window
    pub fn resize(&self, width: i32, height: i32) {
        self.apply(vec![ClientEvent::Resized { width, height }]);
    }

    pub fn prepare_swap(&self, damage: &[DamageRect]) {
        self.state().damage = damage.to_vec();
    }

    fn allocate(&self, state: &mut WindowState) -> std::result::Result<WindowBuffer, c_int> {
        let desc = state.requested();
        let Some(allocator) = &self.allocator else {
            error!("no gralloc backend, cannot allocate window buffers");
            return Err(-libc::ENOMEM);
        };
        let Some(buffer) = allocator.allocate(desc) else {
            error!("failed to allocate {}x{} window buffer", desc.width, desc.height);
            return Err(-libc::ENOMEM);
        };
        state.next_id += 1;
        Ok(WindowBuffer {
            id: state.next_id,
            buffer,
            desc,
            busy: false,
            wire: None,
        })
    }

    fn claim(
        &self,
        state: &mut WindowState,
        index: usize,
    ) -> std::result::Result<Arc<dyn GraphicBuffer>, c_int> {
        if !state.buffers[index].desc.matches(&state.requested()) {
            let replacement = self.allocate(state)?;
            debug!(
                "replacing window buffer with {}x{}",
                replacement.desc.width, replacement.desc.height
            );
            let old = std::mem::replace(&mut state.buffers[index], replacement);
            if let Some(wire) = old.wire {
                state.retired.push(wire);
            }
            state.forget(old.id);
        }

        let slot = &mut state.buffers[index];
        slot.busy = true;
        let (id, buffer) = (slot.id, slot.buffer.clone());
        state.queue.push_back(id);
        Ok(buffer)
    }

    /// Hand out a free buffer, blocking on the compositor when all are busy
    pub fn dequeue(&self) -> std::result::Result<Arc<dyn GraphicBuffer>, c_int> {
        let mut conn = self.conn();
        match conn.dispatch_pending() {
            Ok(events) => self.apply(events),
            Err(e) => warn!("dispatch_pending failed: {}", e),
        }

        loop {
            {
                let mut state = self.state();
                if let Some(index) = state.buffers.iter().position(|slot| !slot.busy) {
                    return self.claim(&mut state, index);
                }
                if state.buffers.len() < state.buffer_count {
                    let slot = self.allocate(&mut state)?;
                    state.buffers.push(slot);
                    let index = state.buffers.len() - 1;
                    return self.claim(&mut state, index);
                }
            }

            match conn.dispatch() {
                Ok(events) => self.apply(events),
                Err(e) => {
                    error!("waiting for a free buffer failed: {}", e);
                    return Err(-1);
                }
            }
        }
    }

    pub fn queue(&self, buffer: *mut c_void, fence: Option<OwnedFd>) {
        trace!("queue buffer {:p}", buffer);
        if let Some(fence) = fence {
            wait_fence(fence);
        }
    }

    /// Return a dequeued buffer to the pool without presenting it
    pub fn cancel(&self, buffer: *mut c_void, fence: Option<OwnedFd>) {
        drop(fence);
        let mut state = self.state();
        let Some(slot) = state
            .buffers
            .iter_mut()
            .find(|slot| slot.buffer.client_buffer() == buffer)
        else {
            return;
        };
        slot.busy = false;
        let id = slot.id;
        state.queue.retain(|queued| *queued != id);
    }

    fn create_wire(conn: &mut dyn WaylandConnection, buffer: &dyn GraphicBuffer) -> Option<ObjectId> {
        let (fds, ints) = unsafe { NativeHandle::parts_of(buffer.handle()) }?;
        let handle = conn.create_handle(fds.len() as i32, &ints)?;
        for fd in &fds {
            conn.handle_add_fd(handle, unsafe { BorrowedFd::borrow_raw(*fd) });
        }
        let wire = conn.create_buffer(&buffer.desc(), handle);
        conn.handle_destroy(handle);
        wire
    }

    /// Present the oldest queued buffer, or the last one again
    pub fn finish_swap(&self) {
        let mut conn = self.conn();

        let picked = {
            let mut state = self.state();
            for wire in std::mem::take(&mut state.retired) {
                conn.buffer_destroy(wire);
            }
            if state.destroyed {
                return;
            }
            let Some(id) = state.queue.pop_front().or(state.last) else {
                debug!("finish_swap with no buffer to present");
                return;
            };
            state.last = Some(id);
            let interval = state.swap_interval;
            state.slot_mut(id).map(|slot| {
                slot.busy = true;
                (id, slot.buffer.clone(), slot.desc, slot.wire, interval)
            })
        };
        let Some((id, buffer, desc, wire, interval)) = picked else {
            return;
        };

        while self.state().throttle.is_some() {
            match conn.dispatch() {
                Ok(events) => self.apply(events),
                Err(e) => {
                    error!("waiting for frame callback failed: {}", e);
                    return;
                }
            }
        }

        let wire = match wire {
            Some(wire) => wire,
            None => match Self::create_wire(&mut **conn, &*buffer) {
                Some(wire) => {
                    if let Some(slot) = self.state().slot_mut(id) {
                        slot.wire = Some(wire);
                    }
                    wire
                }
                None => {
                    error!("cannot create wl_buffer for window buffer");
                    if let Some(slot) = self.state().slot_mut(id) {
                        slot.busy = false;
                    }
                    return;
                }
            },
        };

        let frame = (interval > 0).then(|| conn.surface_frame());

        conn.surface_attach(wire, 0, 0);
        let damage = std::mem::take(&mut self.state().damage);
        if damage.is_empty() {
            conn.surface_damage(0, 0, i32::MAX, i32::MAX);
        } else {
            for [x, y, width, height] in damage {
                let inv_y = desc.height as i32 - (y + height);
                conn.surface_damage(x, inv_y, width, height);
            }
        }
        conn.surface_commit();

        let throttle = match frame {
            Some(frame) => frame,
            None => conn.display_sync(),
        };
        if let Err(e) = conn.flush() {
            warn!("wl_display_flush failed: {}", e);
        }

        let attached = (desc.width as i32, desc.height as i32);
        conn.set_attached_size(attached.0, attached.1);

        let mut state = self.state();
        state.throttle = Some(throttle);
        // Re-attaching a held buffer gets one release, not two
        if !state.posted.contains(&id) {
            state.posted.push_back(id);
        }
        state.attached = attached;
    }

    pub fn set_swap_interval(&self, interval: c_int) {
        self.state().swap_interval = interval.clamp(0, 1);
    }

    pub fn set_usage(&self, usage: u64) {
        self.state().usage = usage | AHARDWAREBUFFER_USAGE_GPU_SAMPLED_IMAGE;
    }

    pub fn set_buffers_format(&self, format: u32) {
        self.state().format = format;
    }

    pub fn set_buffers_dimensions(&self, width: i32, height: i32) {
        let mut state = self.state();
        state.width = width;
        state.height = height;
    }

    /// Shrinking drops free buffers from the front of the pool; busy buffers
    /// stay until the next shrink
    pub fn set_buffer_count(&self, count: usize) {
        let mut state = self.state();
        state.buffer_count = count;
        while state.buffers.len() > count {
            let Some(index) = state.buffers.iter().position(|slot| !slot.busy) else {
                break;
            };
            state.remove_at(index);
        }
    }

    pub fn size(&self) -> (i32, i32) {
        let state = self.state();
        (state.width, state.height)
    }

    pub fn attached_size(&self) -> (i32, i32) {
        self.state().attached
    }

    pub fn pool_size(&self) -> usize {
        self.state().buffers.len()
    }

    /// Buffers the compositor still holds
    pub fn posted_count(&self) -> usize {
        self.state().posted.len()
    }
}

impl Drop for WaylandWindow {
    fn drop(&mut self) {
        let conn = self.conn.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner());
        let state = self.state.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner());
        for wire in state
            .retired
            .drain(..)
            .chain(state.buffers.iter().filter_map(|slot| slot.wire))
        {
            conn.buffer_destroy(wire);
        }
    }
}

impl NativeWindowOps for WaylandWindow {
    fn dequeue_buffer(&self) -> std::result::Result<(*mut c_void, Option<OwnedFd>), c_int> {
        self.dequeue().map(|buffer| (buffer.client_buffer(), None))
    }

    fn queue_buffer(&self, buffer: *mut c_void, fence: Option<OwnedFd>) -> c_int {
        self.queue(buffer, fence);
        NO_ERROR
    }

    fn cancel_buffer(&self, buffer: *mut c_void, fence: Option<OwnedFd>) -> c_int {
        self.cancel(buffer, fence);
        NO_ERROR
    }

    fn set_swap_interval(&self, interval: c_int) -> c_int {
        WaylandWindow::set_swap_interval(self, interval);
        NO_ERROR
    }

    fn width(&self) -> c_int {
        self.state().width
    }

    fn height(&self) -> c_int {
        self.state().height
    }

    fn format(&self) -> c_int {
        self.state().format as c_int
    }

    fn default_width(&self) -> c_int {
        self.state().default_width
    }

    fn default_height(&self) -> c_int {
        self.state().default_height
    }

    fn usage(&self) -> u64 {
        self.state().usage
    }

    fn set_usage(&self, usage: u64) -> c_int {
        WaylandWindow::set_usage(self, usage);
        NO_ERROR
    }

    fn set_buffer_count(&self, count: c_int) -> c_int {
        match usize::try_from(count) {
            Ok(count) if count > 0 => {
                WaylandWindow::set_buffer_count(self, count);
                NO_ERROR
            }
            _ => BAD_VALUE,
        }
    }

    fn set_buffers_dimensions(&self, width: c_int, height: c_int) -> c_int {
        WaylandWindow::set_buffers_dimensions(self, width, height);
        NO_ERROR
    }

    fn set_buffers_format(&self, format: c_int) -> c_int {
        WaylandWindow::set_buffers_format(self, format as u32);
        NO_ERROR
    }
}

// =============================================================================
// Adapter
// =============================================================================

struct AdapterWindow {
    // Dropped before `window`
    _shim: Box<NativeWindowShim>,
    window: Arc<WaylandWindow>,
}

pub struct WaylandAdapter {
    display: Handle,
    connector: Option<Arc<dyn WaylandConnector>>,
    allocator: Option<Arc<dyn BufferAllocator>>,
    initialized: AtomicBool,
    windows: Mutex<HashMap<Handle, AdapterWindow>>,
}

impl WaylandAdapter {
    pub fn new(
        display: Handle,
        connector: Option<Arc<dyn WaylandConnector>>,
        allocator: Option<Arc<dyn BufferAllocator>>,
    ) -> Self {
        Self {
            display,
            connector,
            allocator,
            initialized: AtomicBool::new(false),
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self, window: Handle) -> Option<Arc<WaylandWindow>> {
        lock(&self.windows).get(&window).map(|entry| entry.window.clone())
    }

    pub fn window_count(&self) -> usize {
        lock(&self.windows).len()
    }
}

impl PlatformAdapter for WaylandAdapter {
    fn initialize(&self) -> bool {
        let Some(connector) = &self.connector else {
            error!("cannot connect wayland display: no connector installed");
            return false;
        };
        match connector.connect(self.display) {
            Ok(()) => {
                info!("connected to wayland display {:?}", self.display);
                self.initialized.store(true, Ordering::SeqCst);
                true
            }
            Err(e) => {
                error!("cannot find android_wlegl: {}", e);
                false
            }
        }
    }

    fn terminate(&self) {
        if let Some(connector) = &self.connector {
            connector.disconnect();
        }
        self.initialized.store(false, Ordering::SeqCst);
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn create_window(&self, native: Handle) -> Option<Handle> {
        let connector = self.connector.as_ref()?;
        let Some(connection) = connector.open_window(native) else {
            error!("cannot open wayland window {:?}", native);
            return None;
        };
        let window = Arc::new(WaylandWindow::new(connection, self.allocator.clone()));
        let shim = NativeWindowShim::new(window.clone());
        let handle = Handle::from_ptr(shim.as_native());

        lock(&self.windows).insert(handle, AdapterWindow { _shim: shim, window });
        debug!("wrapped wl_egl_window {:?} as {:?}", native, handle);
        Some(handle)
    }

    fn destroy_window(&self, window: Handle) {
        if lock(&self.windows).remove(&window).is_none() {
            warn!("destroy_window: unknown window {:?}", window);
        }
    }

    fn prepare_swap(&self, window: Handle, damage: &[DamageRect]) {
        if let Some(window) = self.window(window) {
            window.prepare_swap(damage);
        }
    }

    fn finish_swap(&self, window: Handle) {
        if let Some(window) = self.window(window) {
            window.finish_swap();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::mpsc::{channel, Receiver, Sender};
    use std::time::Duration;

    use crate::error::Error;
    use crate::ffi::{buffer_handle_t, ARect, EGLClientBuffer};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Op {
        CreateHandle(i32, usize),
        AddFd,
        HandleDestroy,
        CreateBuffer(u32, u32),
        BufferDestroy(ObjectId),
        Attach(ObjectId),
        Damage(i32, i32, i32, i32),
        Frame,
        Commit,
        Sync,
        Attached(i32, i32),
        Flush,
    }

    pub(crate) struct FakeConnection {
        ops: Arc<Mutex<Vec<Op>>>,
        events: Receiver<ClientEvent>,
        callbacks: Vec<ObjectId>,
        next: u32,
    }

    impl FakeConnection {
        pub(crate) fn new() -> (Self, Arc<Mutex<Vec<Op>>>, Sender<ClientEvent>) {
            let (tx, rx) = channel();
            let ops = Arc::new(Mutex::new(Vec::new()));
            let conn = Self {
                ops: ops.clone(),
                events: rx,
                callbacks: Vec::new(),
                next: 100,
            };
            (conn, ops, tx)
        }

        fn id(&mut self) -> ObjectId {
            self.next += 1;
            ObjectId(self.next)
        }

        fn log(&self, op: Op) {
            self.ops.lock().unwrap().push(op);
        }
    }

    impl WaylandConnection for FakeConnection {
        fn dispatch(&mut self) -> io::Result<Vec<ClientEvent>> {
            // Callbacks complete as soon as anyone waits for them
            if let Some(callback) = self.callbacks.pop() {
                return Ok(vec![ClientEvent::CallbackDone(callback)]);
            }
            self.events
                .recv()
                .map(|event| vec![event])
                .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn dispatch_pending(&mut self) -> io::Result<Vec<ClientEvent>> {
            Ok(self.events.try_iter().collect())
        }

        fn create_handle(&mut self, num_fds: i32, ints: &[c_int]) -> Option<ObjectId> {
            self.log(Op::CreateHandle(num_fds, ints.len()));
            Some(self.id())
        }

        fn handle_add_fd(&mut self, _handle: ObjectId, _fd: BorrowedFd<'_>) {
            self.log(Op::AddFd);
        }

        fn handle_destroy(&mut self, _handle: ObjectId) {
            self.log(Op::HandleDestroy);
        }

        fn create_buffer(&mut self, desc: &BufferDesc, _handle: ObjectId) -> Option<ObjectId> {
            self.log(Op::CreateBuffer(desc.width, desc.height));
            Some(self.id())
        }

        fn buffer_destroy(&mut self, buffer: ObjectId) {
            self.log(Op::BufferDestroy(buffer));
        }

        fn surface_attach(&mut self, buffer: ObjectId, _x: i32, _y: i32) {
            self.log(Op::Attach(buffer));
        }

        fn surface_damage(&mut self, x: i32, y: i32, width: i32, height: i32) {
            self.log(Op::Damage(x, y, width, height));
        }

        fn surface_frame(&mut self) -> ObjectId {
            self.log(Op::Frame);
            let id = self.id();
            self.callbacks.push(id);
            id
        }

        fn surface_commit(&mut self) {
            self.log(Op::Commit);
        }

        fn display_sync(&mut self) -> ObjectId {
            self.log(Op::Sync);
            let id = self.id();
            self.callbacks.push(id);
            id
        }

        fn set_attached_size(&mut self, width: i32, height: i32) {
            self.log(Op::Attached(width, height));
        }

        fn flush(&mut self) -> io::Result<()> {
            self.log(Op::Flush);
            Ok(())
        }
    }

    struct PoolBuffer {
        desc: BufferDesc,
        handle: NativeHandle,
    }

    impl GraphicBuffer for PoolBuffer {
        fn desc(&self) -> BufferDesc {
            self.desc
        }

        fn handle(&self) -> buffer_handle_t {
            self.handle.as_ptr()
        }

        fn client_buffer(&self) -> EGLClientBuffer {
            self as *const PoolBuffer as EGLClientBuffer
        }

        fn lock(&self, _usage: u64, _rect: ARect) -> Result<*mut c_void> {
            Err(Error::Gralloc("not mappable".into()))
        }

        fn unlock(&self) -> Result<()> {
            Ok(())
        }
    }

    pub(crate) struct PoolAllocator;

    impl BufferAllocator for PoolAllocator {
        fn allocate(&self, desc: BufferDesc) -> Option<Arc<dyn GraphicBuffer>> {
            Some(Arc::new(PoolBuffer {
                desc: BufferDesc {
                    stride: desc.width,
                    ..desc
                },
                handle: NativeHandle::new(&[], &[desc.width as c_int, desc.height as c_int]),
            }))
        }

        fn import(&self, _handle: &NativeHandle, _desc: BufferDesc) -> Option<Arc<dyn GraphicBuffer>> {
            None
        }
    }

    fn window(width: i32, height: i32) -> (Arc<WaylandWindow>, Arc<Mutex<Vec<Op>>>, Sender<ClientEvent>) {
        let (conn, ops, tx) = FakeConnection::new();
        let window = WaylandWindow::new(
            WindowConnection {
                connection: Box::new(conn),
                width,
                height,
            },
            Some(Arc::new(PoolAllocator)),
        );
        (Arc::new(window), ops, tx)
    }

    fn present(window: &WaylandWindow) -> *mut c_void {
        let buffer = window.dequeue().unwrap().client_buffer();
        window.queue(buffer, None);
        window.finish_swap();
        buffer
    }

    fn wires(ops: &Mutex<Vec<Op>>) -> Vec<ObjectId> {
        ops.lock()
            .unwrap()
            .iter()
            .filter_map(|op| match op {
                Op::Attach(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_dequeue_blocks_until_release() {
        let (window, ops, tx) = window(64, 64);
        window.set_swap_interval(0);

        let first = present(&window);
        present(&window);
        present(&window);
        assert_eq!(window.pool_size(), 3);
        let first_wire = wires(&ops)[0];

        let (done_tx, done_rx) = channel();
        let waiter = {
            let window = window.clone();
            std::thread::spawn(move || {
                let buffer = window.dequeue().map(|buffer| buffer.client_buffer() as usize);
                done_tx.send(()).unwrap();
                buffer
            })
        };

        assert!(done_rx.recv_timeout(Duration::from_millis(200)).is_err());

        tx.send(ClientEvent::BufferRelease(first_wire)).unwrap();
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let dequeued = waiter.join().unwrap().unwrap();
        assert_eq!(dequeued, first as usize);
        assert_eq!(window.pool_size(), 3);
    }

    #[test]
    fn test_finish_swap_posts_with_flipped_damage() {
        let (window, ops, _tx) = window(200, 100);
        window.set_swap_interval(0);

        let buffer = window.dequeue().unwrap().client_buffer();
        window.queue(buffer, None);
        window.prepare_swap(&[[10, 20, 30, 40]]);
        window.finish_swap();

        let log = ops.lock().unwrap().clone();
        let wire = wires(&ops)[0];
        assert_eq!(
            log,
            vec![
                Op::CreateHandle(0, 2),
                Op::CreateBuffer(200, 100),
                Op::HandleDestroy,
                Op::Attach(wire),
                Op::Damage(10, 40, 30, 40),
                Op::Commit,
                Op::Sync,
                Op::Flush,
                Op::Attached(200, 100),
            ]
        );
        assert_eq!(window.attached_size(), (200, 100));

        // Nothing new queued: the last buffer is shown again with full damage
        ops.lock().unwrap().clear();
        window.finish_swap();
        let log = ops.lock().unwrap().clone();
        assert!(log.contains(&Op::Attach(wire)));
        assert!(log.contains(&Op::Damage(0, 0, i32::MAX, i32::MAX)));
        assert!(!log.iter().any(|op| matches!(op, Op::CreateBuffer(..))));
    }

    #[test]
    fn test_frame_callback_throttles_with_interval() {
        let (window, ops, _tx) = window(32, 32);
        window.set_swap_interval(7);
        present(&window);
        let log = ops.lock().unwrap().clone();
        assert!(log.contains(&Op::Frame));
        assert!(!log.contains(&Op::Sync));
    }

    #[test]
    fn test_posted_buffers_stay_bounded() {
        let (window, ops, tx) = window(32, 32);
        window.set_swap_interval(0);
        present(&window);
        for _ in 0..50 {
            window.finish_swap();
        }
        assert_eq!(window.posted_count(), 1);

        present(&window);
        present(&window);
        assert_eq!(window.posted_count(), 3);

        for wire in wires(&ops) {
            tx.send(ClientEvent::BufferRelease(wire)).unwrap();
        }
        let buffer = window.dequeue().unwrap();
        assert_eq!(window.posted_count(), 0);
        assert_eq!(window.pool_size(), 3);
        window.cancel(buffer.client_buffer(), None);
    }

    #[test]
    fn test_finish_swap_without_buffer_is_noop() {
        let (window, ops, _tx) = window(32, 32);
        window.finish_swap();
        assert!(ops.lock().unwrap().is_empty());
    }

    #[test]
    fn test_release_of_unknown_buffer_is_ignored() {
        let (window, _ops, tx) = window(32, 32);
        tx.send(ClientEvent::BufferRelease(ObjectId(9999))).unwrap();
        assert!(window.dequeue().is_ok());
        assert_eq!(window.pool_size(), 1);
    }

    #[test]
    fn test_resized_buffers_are_replaced() {
        let (window, _ops, tx) = window(32, 32);
        let buffer = window.dequeue().unwrap();
        window.cancel(buffer.client_buffer(), None);

        tx.send(ClientEvent::Resized { width: 50, height: 60 }).unwrap();
        let replaced = window.dequeue().unwrap();
        assert_eq!(replaced.desc().width, 50);
        assert_eq!(replaced.desc().height, 60);
        assert_eq!(window.pool_size(), 1);
        assert_eq!(window.size(), (50, 60));
        assert_eq!(NativeWindowOps::default_width(&*window), 50);
    }

    #[test]
    fn test_shrinking_keeps_busy_buffers() {
        let (window, _ops, _tx) = window(32, 32);
        let a = window.dequeue().unwrap().client_buffer();
        let b = window.dequeue().unwrap().client_buffer();
        let _c = window.dequeue().unwrap();

        window.set_buffer_count(1);
        assert_eq!(window.pool_size(), 3);

        window.cancel(a, None);
        window.cancel(b, None);
        window.set_buffer_count(1);
        assert_eq!(window.pool_size(), 1);
    }

    #[test]
    fn test_window_setters() {
        let (window, _ops, _tx) = window(32, 32);
        window.set_swap_interval(-3);
        assert_eq!(window.state().swap_interval, 0);
        window.set_swap_interval(5);
        assert_eq!(window.state().swap_interval, 1);

        window.set_usage(0x3);
        assert_eq!(NativeWindowOps::usage(&*window), 0x3 | AHARDWAREBUFFER_USAGE_GPU_SAMPLED_IMAGE);
        assert_eq!(NativeWindowOps::set_buffer_count(&*window, 0), BAD_VALUE);
    }

    #[test]
    fn test_destroyed_window_stops_presenting() {
        let (window, ops, tx) = window(32, 32);
        let buffer = window.dequeue().unwrap().client_buffer();
        window.queue(buffer, None);
        tx.send(ClientEvent::WindowDestroyed).unwrap();
        // Events are applied on the next dispatch
        let _ = window.dequeue();
        ops.lock().unwrap().clear();
        window.finish_swap();
        assert!(ops.lock().unwrap().is_empty());
    }

    pub(crate) struct FakeConnector {
        pub fail: bool,
    }

    impl WaylandConnector for FakeConnector {
        fn connect(&self, _display: Handle) -> Result<()> {
            if self.fail {
                Err(Error::Wayland("android_wlegl not advertised".into()))
            } else {
                Ok(())
            }
        }

        fn disconnect(&self) {}

        fn open_window(&self, _native: Handle) -> Option<WindowConnection> {
            let (conn, _ops, _tx) = FakeConnection::new();
            Some(WindowConnection {
                connection: Box::new(conn),
                width: 16,
                height: 16,
            })
        }
    }

    #[test]
    fn test_adapter_window_lifecycle() {
        let adapter = WaylandAdapter::new(
            Handle::NULL,
            Some(Arc::new(FakeConnector { fail: false })),
            Some(Arc::new(PoolAllocator)),
        );
        assert!(adapter.initialize());
        assert!(adapter.is_initialized());

        let handle = adapter.create_window(Handle(0x44)).unwrap();
        assert_ne!(handle, Handle(0x44));
        assert_eq!(adapter.window_count(), 1);
        assert_eq!(adapter.window(handle).unwrap().size(), (16, 16));

        adapter.destroy_window(handle);
        assert_eq!(adapter.window_count(), 0);

        adapter.terminate();
        assert!(!adapter.is_initialized());
    }

    #[test]
    fn test_adapter_initialize_failures() {
        let missing = WaylandAdapter::new(Handle::NULL, None, None);
        assert!(!missing.initialize());
        assert!(missing.create_window(Handle(0x44)).is_none());

        let failing = WaylandAdapter::new(Handle::NULL, Some(Arc::new(FakeConnector { fail: true })), None);
        assert!(!failing.initialize());
        assert!(!failing.is_initialized());
    }
}

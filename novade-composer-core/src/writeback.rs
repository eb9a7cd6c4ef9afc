//! Capture (writeback) requests.
//!
//! Every display has a FIFO queue of capture requests and, while the queue
//! is non-empty, one worker thread. The hardware may complete captures in any
//! order; the worker notifies clients strictly in posting order by only ever
//! popping the front of the queue, and only once the front has been
//! submitted and completed.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use novade_buffer_manager::{BufferHandle, BufferId, HandleImporter, NativeHandle};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use crate::driver::DisplayDriver;
use crate::error::{ComposerError, ComposerResult};
use crate::types::{DisplayId, Rect};

/// What to capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CaptureConfig {
    /// Region of interest in display coordinates.
    pub roi: Rect,
    /// Capture after post-processing instead of the blended layer stack.
    pub post_processed: bool,
    /// Use the partial update region as the region of interest.
    pub pu_as_roi: bool,
    /// Do not trigger a refresh to produce the capture.
    pub avoid_refresh: bool,
}

/// Final status of a capture as reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureStatus {
    Success,
    Failure,
}

impl CaptureStatus {
    /// Maps a driver completion code: `0` is success, anything else failure.
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            CaptureStatus::Success
        } else {
            CaptureStatus::Failure
        }
    }
}

/// Receives the result of one capture. Called from the display's worker thread.
pub trait CaptureCallback: Send + Sync {
    fn notify_capture_done(&self, status: CaptureStatus, buffer: &NativeHandle);
}

struct CaptureRequest {
    seq: u64,
    buffer_id: BufferId,
    buffer: BufferHandle,
    callback: Arc<dyn CaptureCallback>,
    config: CaptureConfig,
    submitted: bool,
    notified: Option<CaptureStatus>,
}

#[derive(Default)]
struct SessionState {
    queue: VecDeque<CaptureRequest>,
    worker_running: bool,
}

struct DisplaySession {
    display: DisplayId,
    state: Mutex<SessionState>,
    cv: Condvar,
}

impl DisplaySession {
    fn new(display: DisplayId) -> Self {
        Self {
            display,
            state: Mutex::new(SessionState::default()),
            cv: Condvar::new(),
        }
    }

    /// Worker loop: notify the front request once it is done, exit when the
    /// queue is empty.
    fn run_worker(&self) {
        loop {
            let request = {
                let mut state = self.state.lock();
                loop {
                    let front_done = state
                        .queue
                        .front()
                        .map(|front| front.submitted && front.notified.is_some());
                    match front_done {
                        None => {
                            state.worker_running = false;
                            info!(display = self.display.0, "Capture queue empty, worker exiting");
                            return;
                        }
                        Some(true) => break,
                        Some(false) => {
                            self.cv.wait(&mut state);
                            let front_pending = state
                                .queue
                                .front()
                                .is_some_and(|front| front.submitted && front.notified.is_none());
                            if front_pending && state.queue.iter().any(|r| r.notified.is_some()) {
                                warn!(display = self.display.0, "Capture completed out of sequence");
                            }
                        }
                    }
                }
                match state.queue.pop_front() {
                    Some(request) => request,
                    None => continue,
                }
            };

            let status = request.notified.unwrap_or(CaptureStatus::Failure);
            debug!(
                display = self.display.0,
                buffer = request.buffer_id.raw(),
                ?status,
                "Notifying capture completion"
            );
            request.callback.notify_capture_done(status, request.buffer.native());
            // Dropping the request releases its buffer.
        }
    }
}

/// Per-display capture queues and their workers.
pub struct WritebackPipeline {
    driver: Arc<dyn DisplayDriver>,
    importer: Arc<dyn HandleImporter>,
    thread_name_prefix: String,
    sessions: Mutex<HashMap<DisplayId, Arc<DisplaySession>>>,
    next_seq: AtomicU64,
}

impl WritebackPipeline {
    pub fn new(driver: Arc<dyn DisplayDriver>, importer: Arc<dyn HandleImporter>, thread_name_prefix: String) -> Self {
        Self {
            driver,
            importer,
            thread_name_prefix,
            sessions: Mutex::new(HashMap::new()),
            next_seq: AtomicU64::new(1),
        }
    }

    fn session(&self, display: DisplayId) -> Arc<DisplaySession> {
        self.sessions
            .lock()
            .entry(display)
            .or_insert_with(|| Arc::new(DisplaySession::new(display)))
            .clone()
    }

    /// Queues a capture of `display` into `buffer` and submits it to the driver.
    ///
    /// # Errors
    ///
    /// - `BadParameter` if the buffer has no identity or is already queued.
    /// - `NoResources` if the buffer cannot be imported.
    /// - Whatever the driver reports for the submission. The request is
    ///   removed and its buffer released in that case.
    pub fn post(
        &self,
        display: DisplayId,
        config: CaptureConfig,
        buffer: &NativeHandle,
        callback: Arc<dyn CaptureCallback>,
    ) -> ComposerResult<()> {
        let display_id = display.0;
        let buffer_id = buffer.buffer_id;
        if buffer_id.is_none() {
            error!(display = display_id, "Capture buffer has no identity");
            return Err(ComposerError::BadParameter);
        }
        let handle = BufferHandle::import(self.importer.clone(), buffer)?;
        let session = self.session(display);
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        {
            let mut state = session.state.lock();
            if state.queue.iter().any(|request| request.buffer_id == buffer_id) {
                warn!(
                    display = display_id,
                    buffer = buffer_id.raw(),
                    "Capture buffer already queued"
                );
                return Err(ComposerError::BadParameter);
            }
            state.queue.push_back(CaptureRequest {
                seq,
                buffer_id,
                buffer: handle,
                callback,
                config,
                submitted: false,
                notified: None,
            });
        }

        if let Err(err) = self.driver.submit_readback_buffer(display, buffer, &config) {
            error!(display = display_id, buffer = buffer_id.raw(), error = %err, "Capture submission failed");
            let removed = {
                let mut state = session.state.lock();
                let removed = state
                    .queue
                    .iter()
                    .position(|request| request.seq == seq)
                    .and_then(|index| state.queue.remove(index));
                session.cv.notify_all();
                removed
            };
            drop(removed);
            return Err(err);
        }

        let mut state = session.state.lock();
        if let Some(request) = state.queue.iter_mut().find(|request| request.seq == seq) {
            request.submitted = true;
            debug!(
                display = display_id,
                buffer = buffer_id.raw(),
                roi = ?request.config.roi,
                "Capture submitted"
            );
        }
        if !state.worker_running {
            let worker = session.clone();
            let spawned = thread::Builder::new()
                .name(format!("{}-{}", self.thread_name_prefix, display_id))
                .spawn(move || worker.run_worker());
            match spawned {
                Ok(_) => state.worker_running = true,
                // The next post retries.
                Err(err) => error!(display = display_id, error = %err, "Failed to start capture worker"),
            }
        }
        session.cv.notify_all();
        Ok(())
    }

    /// Records the driver's completion of the capture into `buffer_id`.
    ///
    /// Completions may arrive in any order; the first request with this
    /// identity that has not been notified yet is marked.
    ///
    /// # Errors
    ///
    /// `BadParameter` when no such request is pending (a stale completion).
    pub fn on_completion(&self, display: DisplayId, status: i32, buffer_id: BufferId) -> ComposerResult<()> {
        let display_id = display.0;
        let Some(session) = self.sessions.lock().get(&display).cloned() else {
            warn!(display = display_id, buffer = buffer_id.raw(), "Capture completion for idle display");
            return Err(ComposerError::BadParameter);
        };

        let mut state = session.state.lock();
        let Some(request) = state
            .queue
            .iter_mut()
            .find(|request| request.notified.is_none() && request.buffer_id == buffer_id)
        else {
            warn!(display = display_id, buffer = buffer_id.raw(), "Dropping stale capture completion");
            return Err(ComposerError::BadParameter);
        };
        request.notified = Some(CaptureStatus::from_code(status));
        session.cv.notify_all();
        Ok(())
    }

    /// Number of requests queued for `display`.
    pub fn pending(&self, display: DisplayId) -> usize {
        self.sessions
            .lock()
            .get(&display)
            .map_or(0, |session| session.state.lock().queue.len())
    }

    /// Drops the capture session of a display that went away.
    ///
    /// Requests still waiting for the driver can no longer complete; they are
    /// failed so the worker notifies them in order and exits.
    pub fn remove_display(&self, display: DisplayId) {
        let display_id = display.0;
        let Some(session) = self.sessions.lock().remove(&display) else {
            return;
        };
        let mut state = session.state.lock();
        let mut failed = 0;
        for request in state.queue.iter_mut().filter(|request| request.notified.is_none()) {
            request.notified = Some(CaptureStatus::Failure);
            failed += 1;
        }
        if failed > 0 {
            warn!(display = display_id, failed, "Failing captures of removed display");
        }
        session.cv.notify_all();
    }

    /// Whether `display` currently has a capture session.
    pub fn has_session(&self, display: DisplayId) -> bool {
        self.sessions.lock().contains_key(&display)
    }
}

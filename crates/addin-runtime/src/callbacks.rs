//! Callback bridge: native error/event/status callbacks to host observers
//!
//! The native side may call back at any moment and from any thread. The
//! `extern "C"` entry points here copy the payload into owned strings and
//! post a `Notification` into a channel; nothing else happens on the
//! native thread. Subscribers run only when the host calls
//! `CallbackBridge::dispatch_pending` from its script thread, in the order
//! the native side fired.

use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, Ordering};

use addin_abi::{CallbackTable, WStr};
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use serde::Serialize;

// ============================================================================
// Severity mapping
// ============================================================================

/// Native error code classes
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    None = 1000,
    Ordinary = 1001,
    Attention = 1002,
    Important = 1003,
    VeryImportant = 1004,
    Info = 1005,
    Fail = 1006,
    MsgboxAttention = 1007,
    MsgboxInfo = 1008,
    MsgboxFail = 1009,
}

impl ErrorCode {
    /// Decode a raw native code
    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            1000 => Self::None,
            1001 => Self::Ordinary,
            1002 => Self::Attention,
            1003 => Self::Important,
            1004 => Self::VeryImportant,
            1005 => Self::Info,
            1006 => Self::Fail,
            1007 => Self::MsgboxAttention,
            1008 => Self::MsgboxInfo,
            1009 => Self::MsgboxFail,
            _ => return None,
        })
    }
}

/// Host message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    WithoutStatus,
    Ordinary,
    Important,
    Information,
    VeryImportant,
    Attention,
}

impl Severity {
    /// Map a raw native code; unknown codes are `Ordinary`
    pub fn from_native(code: u16) -> Self {
        ErrorCode::from_code(code).map_or(Severity::Ordinary, Severity::from)
    }
}

impl From<ErrorCode> for Severity {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::None => Severity::WithoutStatus,
            ErrorCode::Ordinary => Severity::Ordinary,
            ErrorCode::Important => Severity::Important,
            ErrorCode::Info => Severity::Information,
            ErrorCode::VeryImportant | ErrorCode::Fail => Severity::VeryImportant,
            ErrorCode::Attention
            | ErrorCode::MsgboxAttention
            | ErrorCode::MsgboxInfo
            | ErrorCode::MsgboxFail => Severity::Attention,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Severity::WithoutStatus => "without-status",
            Severity::Ordinary => "ordinary",
            Severity::Important => "important",
            Severity::Information => "information",
            Severity::VeryImportant => "very-important",
            Severity::Attention => "attention",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// Error channel payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    pub severity: Severity,
    /// Raw native code the severity was derived from
    pub code: u16,
    /// Component-specific extra code
    pub extra: i32,
    pub source: String,
    pub description: String,
}

/// Event channel payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventNotice {
    pub source: String,
    pub message: String,
    pub data: String,
}

/// One native callback invocation, copied out of native memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Error(ErrorNotice),
    Event(EventNotice),
    Status(String),
}

// ============================================================================
// Registration (native side of the channel)
// ============================================================================

/// Target of the native `user_data` pointer
struct CallbackSlot {
    tx: Sender<Notification>,
    open: AtomicBool,
}

impl CallbackSlot {
    fn post(&self, notification: Notification) {
        if !self.open.load(Ordering::Acquire) {
            tracing::trace!("callback after close ignored");
            return;
        }
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!(?dropped, "callback queue full; notification dropped");
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Callback slots registered with one native instance.
///
/// Owned by the component; its address is the `user_data` the native side
/// holds, so it must outlive the native handle. Dropping it frees the slot.
pub struct CallbackRegistration {
    slot: Box<CallbackSlot>,
}

impl CallbackRegistration {
    /// Create a registration and the queue its notifications land in.
    /// `capacity = None` gives an unbounded queue; a zero capacity holds
    /// one notification.
    pub fn new(capacity: Option<usize>) -> (Self, Receiver<Notification>) {
        let (tx, rx) = match capacity {
            Some(cap) => channel::bounded(cap.max(1)),
            None => channel::unbounded(),
        };
        let slot = Box::new(CallbackSlot {
            tx,
            open: AtomicBool::new(true),
        });
        (Self { slot }, rx)
    }

    /// Table to hand to `create_instance`
    pub fn table(&self) -> CallbackTable {
        CallbackTable {
            user_data: &*self.slot as *const CallbackSlot as *mut c_void,
            on_error: native_error,
            on_event: native_event,
            on_status: native_status,
        }
    }

    /// Stop accepting notifications; later native calls are ignored
    pub fn close(&self) {
        self.slot.open.store(false, Ordering::Release);
    }

    /// Whether notifications are still accepted
    pub fn is_open(&self) -> bool {
        self.slot.open.load(Ordering::Acquire)
    }
}

unsafe fn slot<'a>(user_data: *mut c_void) -> Option<&'a CallbackSlot> {
    (user_data as *const CallbackSlot).as_ref()
}

unsafe extern "C" fn native_error(
    user_data: *mut c_void,
    code: u16,
    source: WStr,
    description: WStr,
    extra: i32,
) {
    if let Some(slot) = slot(user_data) {
        slot.post(Notification::Error(ErrorNotice {
            severity: Severity::from_native(code),
            code,
            extra,
            source: source.to_string_lossy(),
            description: description.to_string_lossy(),
        }));
    }
}

unsafe extern "C" fn native_event(user_data: *mut c_void, source: WStr, message: WStr, data: WStr) {
    if let Some(slot) = slot(user_data) {
        slot.post(Notification::Event(EventNotice {
            source: source.to_string_lossy(),
            message: message.to_string_lossy(),
            data: data.to_string_lossy(),
        }));
    }
}

unsafe extern "C" fn native_status(user_data: *mut c_void, text: WStr) {
    if let Some(slot) = slot(user_data) {
        slot.post(Notification::Status(text.to_string_lossy()));
    }
}

// ============================================================================
// Subscribers (host side)
// ============================================================================

/// Handle returned by a subscribe call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type ErrorHandler = Box<dyn FnMut(&ErrorNotice)>;
type EventHandler = Box<dyn FnMut(&EventNotice)>;
type StatusHandler = Box<dyn FnMut(&str)>;

/// Observer lists for the three channels
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    error: Vec<(SubscriptionId, ErrorHandler)>,
    event: Vec<(SubscriptionId, EventHandler)>,
    status: Vec<(SubscriptionId, StatusHandler)>,
}

impl Subscribers {
    fn next_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }

    /// Observe the error channel
    pub fn on_error(&mut self, handler: impl FnMut(&ErrorNotice) + 'static) -> SubscriptionId {
        let id = self.next_id();
        self.error.push((id, Box::new(handler)));
        id
    }

    /// Observe the event channel
    pub fn on_event(&mut self, handler: impl FnMut(&EventNotice) + 'static) -> SubscriptionId {
        let id = self.next_id();
        self.event.push((id, Box::new(handler)));
        id
    }

    /// Observe the status text channel
    pub fn on_status(&mut self, handler: impl FnMut(&str) + 'static) -> SubscriptionId {
        let id = self.next_id();
        self.status.push((id, Box::new(handler)));
        id
    }

    /// Detach a subscriber. Returns false if the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.len();
        self.error.retain(|(sid, _)| *sid != id);
        self.event.retain(|(sid, _)| *sid != id);
        self.status.retain(|(sid, _)| *sid != id);
        self.len() != before
    }

    /// Total number of subscribers
    pub fn len(&self) -> usize {
        self.error.len() + self.event.len() + self.status.len()
    }

    /// Check if nobody is subscribed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Detach everyone
    pub fn clear(&mut self) {
        self.error.clear();
        self.event.clear();
        self.status.clear();
    }

    /// Hand a notification to every subscriber of its channel, in
    /// subscription order
    pub fn deliver(&mut self, notification: &Notification) {
        match notification {
            Notification::Error(notice) => {
                for (_, handler) in &mut self.error {
                    handler(notice);
                }
            }
            Notification::Event(notice) => {
                for (_, handler) in &mut self.event {
                    handler(notice);
                }
            }
            Notification::Status(text) => {
                for (_, handler) in &mut self.status {
                    handler(text);
                }
            }
        }
    }
}

/// Queue of posted notifications plus the observers they are delivered to
pub struct CallbackBridge {
    queue: Receiver<Notification>,
    subscribers: Subscribers,
}

impl CallbackBridge {
    /// Bridge draining `queue`
    pub fn new(queue: Receiver<Notification>) -> Self {
        Self {
            queue,
            subscribers: Subscribers::default(),
        }
    }

    /// Observer lists
    pub fn subscribers(&self) -> &Subscribers {
        &self.subscribers
    }

    /// Observer lists, for attaching or detaching
    pub fn subscribers_mut(&mut self) -> &mut Subscribers {
        &mut self.subscribers
    }

    /// Notifications posted but not yet delivered
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Deliver everything posted so far. Notifications posted while this
    /// runs wait for the next call. Returns the number delivered.
    pub fn dispatch_pending(&mut self) -> usize {
        let ready = self.queue.len();
        let mut delivered = 0;
        while delivered < ready {
            match self.queue.try_recv() {
                Ok(notification) => {
                    self.subscribers.deliver(&notification);
                    delivered += 1;
                }
                Err(_) => break,
            }
        }
        delivered
    }

    /// Drop queued notifications and detach every subscriber
    pub fn shutdown(&mut self) -> usize {
        let discarded = self.queue.try_iter().count();
        self.subscribers.clear();
        discarded
    }
}

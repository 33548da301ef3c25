//! UI Events
//!
//! Semantic events for the presentation layer: toast notifications and
//! navigation requests. The core never renders or navigates itself.

use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Notify { level: NotifyLevel, message: String },
    RedirectToLogin,
}

impl UiEvent {
    pub fn success(message: impl Into<String>) -> Self {
        UiEvent::Notify { level: NotifyLevel::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        UiEvent::Notify { level: NotifyLevel::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        UiEvent::Notify { level: NotifyLevel::Error, message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, UiEvent::Notify { level: NotifyLevel::Error, .. })
    }
}

/// Receiver of controller events (toast renderer, router, ...)
pub trait EventSink {
    fn emit(&self, event: UiEvent);
}

/// Buffers events until the presentation layer drains them
#[derive(Debug, Default)]
pub struct EventLog {
    events: RefCell<Vec<UiEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<UiEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn snapshot(&self) -> Vec<UiEvent> {
        self.events.borrow().clone()
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: UiEvent) {
        log::debug!("[EVENT] {:?}", event);
        self.events.borrow_mut().push(event);
    }
}

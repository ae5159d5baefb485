//! Transient status-bar notices.
//!
//! Only the newest toast is shown. Each one has a monotonically increasing id
//! so a dismiss timer that fires after a newer toast replaced it is a no-op.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub level: ToastLevel,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Toasts {
    last_id: u64,
    current: Option<Toast>,
}

impl Toasts {
    pub fn show(&mut self, level: ToastLevel, message: impl Into<String>) -> ToastId {
        self.last_id += 1;
        let id = ToastId(self.last_id);
        self.current = Some(Toast {
            id,
            level,
            message: message.into(),
        });
        id
    }

    /// Remove the toast only if `id` is still the one on screen.
    pub fn dismiss(&mut self, id: ToastId) -> bool {
        if self.current.as_ref().is_some_and(|toast| toast.id == id) {
            self.current = None;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&Toast> {
        self.current.as_ref()
    }
}

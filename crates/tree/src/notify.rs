/// A modal status that blocks interaction until cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockingAlert {
    pub message: String,
    pub prompt: Option<String>,
    pub show_loading: bool,
}

impl BlockingAlert {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            prompt: None,
            show_loading: false,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn loading(mut self) -> Self {
        self.show_loading = true;
        self
    }
}

/// User-facing notification sink supplied by the embedding application.
pub trait Notifier: Send + Sync {
    fn notify_success(&self, message: &str);
    fn notify_warning(&self, message: &str);
    fn notify_error(&self, message: &str);
    /// Internal contract violations. These are bugs and must never be swallowed.
    fn notify_illegal_state(&self, message: &str);
    fn set_blocking_alert(&self, alert: Option<BlockingAlert>);
}

/// Routes notifications to the `log` facade for headless sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_success(&self, message: &str) {
        log::info!("{message}");
    }

    fn notify_warning(&self, message: &str) {
        log::warn!("{message}");
    }

    fn notify_error(&self, message: &str) {
        log::error!("{message}");
    }

    fn notify_illegal_state(&self, message: &str) {
        log::error!("[illegal state] {message}");
    }

    fn set_blocking_alert(&self, alert: Option<BlockingAlert>) {
        match alert {
            Some(alert) => match alert.prompt {
                Some(prompt) => log::warn!("{} ({prompt})", alert.message),
                None => log::warn!("{}", alert.message),
            },
            None => log::debug!("Blocking alert cleared"),
        }
    }
}

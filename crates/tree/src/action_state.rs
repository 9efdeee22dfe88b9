use tokio::sync::watch;

/// Progress of one guarded asynchronous operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionStatus {
    Initial,
    InProgress,
    Succeeded,
    Failed,
}

impl ActionStatus {
    pub fn is_concluded(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Re-entrancy guard and progress signal for an asynchronous operation.
///
/// Entry is rejected (not queued) while another holder is in progress. The
/// returned [`ActionGuard`] releases the state when dropped, so an early `?`
/// return can never leave it stuck in [`ActionStatus::InProgress`].
#[derive(Debug)]
pub struct ActionState {
    status: watch::Sender<ActionStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Release {
    /// Unconcluded guards fail on drop.
    Conclude,
    /// The state always returns to `Initial` on drop.
    Reset,
}

impl Default for ActionState {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionState {
    pub fn new() -> Self {
        let (status, _) = watch::channel(ActionStatus::Initial);
        Self { status }
    }

    pub fn status(&self) -> ActionStatus {
        *self.status.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ActionStatus> {
        self.status.subscribe()
    }

    pub fn is_in_progress(&self) -> bool {
        self.status() == ActionStatus::InProgress
    }

    pub fn has_succeeded(&self) -> bool {
        self.status() == ActionStatus::Succeeded
    }

    /// Enters the operation; the guard concludes it as failed unless told otherwise.
    pub fn begin(&self) -> Option<ActionGuard<'_>> {
        self.enter(Release::Conclude)
    }

    /// Enters a reusable slot that goes back to `Initial` whichever way it ends.
    pub fn begin_slot(&self) -> Option<ActionGuard<'_>> {
        self.enter(Release::Reset)
    }

    /// Returns a concluded state to `Initial`. Has no effect while in progress.
    pub fn reset(&self) -> bool {
        self.status.send_if_modified(|status| {
            if status.is_concluded() {
                *status = ActionStatus::Initial;
                true
            } else {
                false
            }
        })
    }

    fn enter(&self, release: Release) -> Option<ActionGuard<'_>> {
        let entered = self.status.send_if_modified(|status| {
            if *status == ActionStatus::InProgress {
                false
            } else {
                *status = ActionStatus::InProgress;
                true
            }
        });
        entered.then_some(ActionGuard {
            state: self,
            release,
            concluded: false,
        })
    }

    fn set(&self, next: ActionStatus) {
        self.status.send_replace(next);
    }
}

/// Holds an [`ActionState`] in progress until concluded or dropped.
#[derive(Debug)]
#[must_use = "dropping the guard immediately ends the operation"]
pub struct ActionGuard<'a> {
    state: &'a ActionState,
    release: Release,
    concluded: bool,
}

impl ActionGuard<'_> {
    pub fn succeed(mut self) {
        self.conclude(ActionStatus::Succeeded);
    }

    pub fn fail(mut self) {
        self.conclude(ActionStatus::Failed);
    }

    fn conclude(&mut self, status: ActionStatus) {
        self.concluded = true;
        match self.release {
            Release::Conclude => self.state.set(status),
            Release::Reset => self.state.set(ActionStatus::Initial),
        }
    }
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        if !self.concluded {
            self.conclude(ActionStatus::Failed);
        }
    }
}

//! Internal state of the USB MIDI driver.



use core::sync::atomic::{
    AtomicBool, Ordering,
};



/// Lifecycle state of the driver as seen by callers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub enum State {
    /// The driver is not registered with the host service.
    /// This is both the initial and the terminal state.
    Stopped,

    /// The driver is registered. Each flag tells if a device is attached for
    /// that direction.
    Started { input: bool, output: bool },
}

impl State {
    /// Returns `true` if a device is attached for at least one direction.
    pub const fn attached(&self) -> bool {
        matches!(self, State::Started { input: true, .. } | State::Started { output: true, .. })
    }
}



/// Driver state flags.
/// The attached flags are only set while `started` is set. Stop and detach
/// clear them before anything else happens.
pub(crate) struct Flags {
    started: AtomicBool,
    input: AtomicBool,
    output: AtomicBool,
}

impl Flags {
    /// Static initializer.
    pub(crate) const fn new() -> Self {
        Self {
            started: AtomicBool::new(false),
            input: AtomicBool::new(false),
            output: AtomicBool::new(false),
        }
    }

    /// Marks the driver as started. Returns `false` if it already was.
    pub(crate) fn start(&self) -> bool {
        self.started.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok()
    }

    /// Marks the driver as stopped and detached. Returns `false` if it was
    /// not started.
    pub(crate) fn stop(&self) -> bool {
        if self.started.compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return false;
        }

        self.detach();

        true
    }

    /// Sets the attached flags. Ignored, returning `false`, if the driver is
    /// not started.
    pub(crate) fn attach(&self, input: bool, output: bool) -> bool {
        if !self.started() { return false }

        self.input.store(input, Ordering::Release);
        self.output.store(output, Ordering::Release);

        true
    }

    /// Clears both attached flags.
    pub(crate) fn detach(&self) {
        self.input.store(false, Ordering::Release);
        self.output.store(false, Ordering::Release);
    }

    pub(crate) fn started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub(crate) fn input(&self) -> bool {
        self.started() && self.input.load(Ordering::Acquire)
    }

    pub(crate) fn output(&self) -> bool {
        self.started() && self.output.load(Ordering::Acquire)
    }

    /// Snapshot of the lifecycle state.
    pub(crate) fn state(&self) -> State {
        match self.started() {
            false => State::Stopped,
            true => State::Started { input: self.input(), output: self.output() },
        }
    }
}



#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attached_flags_require_started() {
        let flags = Flags::new();

        assert!(!flags.attach(true, true));
        assert_eq!(flags.state(), State::Stopped);
        assert!(!flags.input());

        assert!(flags.start());
        assert!(!flags.start());

        assert!(flags.attach(true, false));
        assert_eq!(flags.state(), State::Started { input: true, output: false });
        assert!(flags.state().attached());

        assert!(flags.stop());
        assert!(!flags.stop());
        assert!(!flags.input());

        // Restarting does not resurrect a stale attachment.
        assert!(flags.start());
        assert_eq!(flags.state(), State::Started { input: false, output: false });
    }
}

//! System power events forwarded to the driver.



/// System suspend notification.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub enum SystemEvent {
    /// The system is about to suspend.
    Suspend,

    /// The system resumed from suspend.
    /// The port routing was lost and must be selected again.
    Resume,
}

impl SystemEvent {
    /// Maps a raw system event handler call.
    pub const fn from_raw(resume: bool) -> Self {
        match resume {
            true => SystemEvent::Resume,
            false => SystemEvent::Suspend,
        }
    }
}

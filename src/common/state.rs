//! Internal state flags of the transfer slots.



/// Kind of transfer handled by a slot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub enum TransferKind {
    /// Control transfer on the default pipe.
    Control,

    /// Bulk OUT transfer.
    Send,

    /// Bulk IN transfer.
    Receive,
}



/// Occupation of a transfer slot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum SlotState {
    /// No transfer outstanding. A new one can be issued.
    Idle = 0,

    /// A transfer was issued and its completion was not consumed yet.
    InFlight = 1,
}

//! Device context and the transfer bridge.
//! Every transfer kind owns a slot with its completion signal, its staging
//! buffer and its in-flight flag. The host service fires completions from
//! its own context. Callers await them through the bridge operations.



mod completion;
mod slot;
mod transfer;



pub use completion::*;
pub use slot::*;
pub use transfer::*;



use core::cell::Cell;

use embassy_sync::blocking_mutex::{
    raw::RawMutex,
    Mutex,
};

use super::{
    common::TransferKind,
    host::PipeId,
};



/// Maximum packet size of the MIDI streaming bulk endpoints.
pub const MAX_PACKET_SIZE: usize = 64;



/// Handles of the opened pipes. `None` marks an unopened pipe.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Pipes {
    pub control: Option<PipeId>,
    pub input: Option<PipeId>,
    pub output: Option<PipeId>,
}

impl Pipes {
    /// No pipe opened.
    pub const EMPTY: Self = Self { control: None, input: None, output: None, };
}



/// Shared context of a driver.
/// Must live in static storage so the host service can complete transfers
/// from any context.
pub struct DeviceContext<M: RawMutex> {
    /// Opened pipe handles.
    /// SAFETY : Only modified by attach, detach and stop.
    pipes: Mutex<M, Cell<Pipes>>,

    /// Control transfer slot.
    pub(crate) control: TransferSlot<M>,

    /// Bulk OUT transfer slot. Its buffer is the write staging buffer.
    pub(crate) send: TransferSlot<M>,

    /// Bulk IN transfer slot. Its buffer is the read staging buffer.
    pub(crate) receive: TransferSlot<M>,
}

impl<M: RawMutex> DeviceContext<M> {
    /// Static initializer.
    /// Use this method to create static instances of a device context.
    pub const fn new() -> Self {
        Self {
            pipes: Mutex::new( Cell::new( Pipes::EMPTY ) ),
            control: TransferSlot::new( TransferKind::Control ),
            send: TransferSlot::new( TransferKind::Send ),
            receive: TransferSlot::new( TransferKind::Receive ),
        }
    }

    /// Returns the currently opened pipes.
    pub fn pipes(&self) -> Pipes {
        self.pipes.lock(|pipes| pipes.get())
    }

    /// Replaces the opened pipes.
    pub(crate) fn set_pipes(&self, new: Pipes) {
        self.pipes.lock(|pipes| pipes.set(new))
    }

    /// Clears the opened pipes and returns the previous ones.
    pub(crate) fn take_pipes(&self) -> Pipes {
        self.pipes.lock(|pipes| pipes.replace(Pipes::EMPTY))
    }

    /// Wakes every blocked transfer with a cancellation.
    pub(crate) fn cancel_all(&self) {
        for slot in [&self.control, &self.send, &self.receive] {
            slot.cancel();
        }
    }
}

impl<M: RawMutex> Default for DeviceContext<M> {
    fn default() -> Self {
        Self::new()
    }
}

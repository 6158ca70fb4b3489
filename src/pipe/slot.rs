//! Transfer slot of a single transfer kind.



use core::{
    cell::RefCell,

    sync::atomic::{
        AtomicU32, AtomicU8, AtomicUsize, Ordering,
    },
};

use embassy_sync::{
    blocking_mutex::{
        raw::RawMutex,
        Mutex,
    },

    signal::Signal,
};

use super::*;

use crate::{
    common::SlotState,
    host::HostError,

    Error,
};



/// Outcome of a transfer, recorded by its completion.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub enum Outcome {
    /// The transfer completed and moved this many bytes.
    Completed( usize ),

    /// The transfer completed with an error.
    Failed( HostError ),

    /// The transfer was torn down before completing.
    Cancelled,
}



pub struct TransferSlot<M: RawMutex> {
    /// Kind of transfers issued on this slot.
    pub(super) kind: TransferKind,

    /// In-flight flag.
    /// SAFETY :
    ///   - Issuer : Idle to InFlight
    ///   - Guard  : InFlight to Idle
    state: AtomicU8,

    /// Sequence number of the latest transfer. Completions carrying an older
    /// number are discarded.
    seq: AtomicU32,

    /// Completion signal. Cleared when observed.
    signal: Signal<M, Outcome>,

    /// Staging buffer of the transfer data.
    buffer: Mutex<M, RefCell<[u8; MAX_PACKET_SIZE]>>,

    /// Number of bytes received into the staging buffer by the latest transfer.
    received: AtomicUsize,
}

impl<M: RawMutex> TransferSlot<M> {
    /// Static initializer.
    pub(crate) const fn new(kind: TransferKind) -> Self {
        Self {
            kind,
            state: AtomicU8::new( SlotState::Idle as u8 ),
            seq: AtomicU32::new(0),
            signal: Signal::new(),
            buffer: Mutex::new( RefCell::new( [0u8; MAX_PACKET_SIZE] ) ),
            received: AtomicUsize::new(0),
        }
    }

    /// Returns the kind of transfers issued on this slot.
    pub fn kind(&self) -> TransferKind {
        self.kind
    }

    /// Returns `true` if a transfer is outstanding.
    pub fn in_flight(&self) -> bool {
        self.state.load(Ordering::Acquire) == SlotState::InFlight as u8
    }

    /// Tries to mark the slot as in flight. Fails fast if it already is.
    pub(super) fn acquire(&self) -> Result<(), Error> {
        match self.state.compare_exchange(SlotState::Idle as u8, SlotState::InFlight as u8, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => Ok( () ),
            Err(_) => Err( Error::Busy ),
        }
    }

    /// Marks the slot as idle.
    pub(super) fn release(&self) {
        self.state.store(SlotState::Idle as u8, Ordering::Release);
    }

    /// Starts a new transfer: clears any stale signal and returns the new
    /// sequence number.
    pub(super) fn begin(&self) -> u32 {
        self.signal.reset();
        self.received.store(0, Ordering::Release);
        self.seq.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    /// Records the outcome of the transfer `seq` and raises the signal.
    /// Copies `data` into the staging buffer first, if any. Only data
    /// delivered this way is ever handed back as received.
    pub(super) fn deliver(&self, seq: u32, outcome: Outcome, data: Option<&[u8]>) {
        // Discard completions of torn down transfers.
        if self.seq.load(Ordering::Acquire) != seq {
            #[cfg(feature = "log")]
            defmt::warn!("{} slot : Discarded stale completion {}", self.kind, seq);

            return;
        }

        let outcome = match (outcome, data) {
            (Outcome::Completed(_), Some(data)) => {
                let n = data.len().min(MAX_PACKET_SIZE);
                self.buffer.lock(|buf| buf.borrow_mut()[..n].copy_from_slice(&data[..n]));
                self.received.store(n, Ordering::Release);
                Outcome::Completed(n)
            },

            (outcome, _) => outcome,
        };

        self.signal.signal(outcome);
    }

    /// Wakes the outstanding transfer, if any, with a cancellation.
    /// Later completions of that transfer are discarded.
    pub(crate) fn cancel(&self) {
        self.seq.fetch_add(1, Ordering::AcqRel);
        self.signal.signal(Outcome::Cancelled);
    }

    /// Waits for the completion signal and clears it.
    pub(super) async fn wait(&self) -> Outcome {
        self.signal.wait().await
    }

    /// Accesses the bytes received by the latest transfer.
    pub(crate) fn with_received<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let n = self.received.load(Ordering::Acquire).min(MAX_PACKET_SIZE);
        self.buffer.lock(|buf| f(&buf.borrow()[..n]))
    }

    /// Accesses the staging buffer.
    pub(crate) fn with_buffer<R>(&self, f: impl FnOnce(&mut [u8; MAX_PACKET_SIZE]) -> R) -> R {
        self.buffer.lock(|buf| f(&mut buf.borrow_mut()))
    }
}

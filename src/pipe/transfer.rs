//! Issuing a transfer and awaiting its completion.



use embassy_sync::blocking_mutex::raw::RawMutex;

use super::*;

use crate::{
    host::HostError,

    Error,
};



/// An issued transfer that was not submitted yet.
/// Holds the in-flight flag of its slot until dropped.
pub struct Transfer<M: RawMutex + Sync + 'static> {
    /// Slot the transfer was issued on.
    slot: &'static TransferSlot<M>,

    /// Completion to hand to the host service.
    completion: Option<Completion>,
}

impl<M: RawMutex + Sync + 'static> Transfer<M> {
    /// Issues a new transfer on the slot.
    /// Fails with `Error::Busy` if a transfer of the same kind is outstanding.
    pub fn issue(slot: &'static TransferSlot<M>) -> Result<Self, Error> {
        slot.acquire()?;

        let seq = slot.begin();

        #[cfg(feature = "log")]
        defmt::trace!("{} slot : Issued transfer {}", slot.kind, seq);

        Ok( Self { slot, completion: Some( Completion::new(slot, seq) ) } )
    }

    /// Accesses the staging buffer of the slot.
    pub fn with_buffer<R>(&self, f: impl FnOnce(&mut [u8; MAX_PACKET_SIZE]) -> R) -> R {
        self.slot.with_buffer(f)
    }

    /// Submits the transfer to the host service.
    /// A submission error is returned immediately, without waiting.
    pub fn submit<F>(mut self, f: F) -> Result<Pending<M>, Error>
    where
        F: FnOnce(Completion) -> Result<(), HostError>,
    {
        let completion = match self.completion.take() {
            Some(completion) => completion,
            None => return Err( Error::Interrupted ),
        };

        if let Err(e) = f(completion) {
            #[cfg(feature = "log")]
            defmt::warn!("{} slot : Submission failed {}", self.slot.kind, e);

            return Err( Error::Submission(e) );
        }

        Ok( Pending { transfer: self } )
    }
}

impl<M: RawMutex + Sync + 'static> Drop for Transfer<M> {
    fn drop(&mut self) {
        // Disarm an unused completion before freeing the slot.
        if let Some(completion) = self.completion.take() {
            core::mem::forget(completion);
        }

        self.slot.release();
    }
}



/// A submitted transfer.
pub struct Pending<M: RawMutex + Sync + 'static> {
    transfer: Transfer<M>,
}

impl<M: RawMutex + Sync + 'static> Pending<M> {
    /// Waits for the completion of the transfer.
    /// WARNING : This method may block indefinitely if the device never
    /// answers and is never detached.
    pub async fn wait(&mut self) -> Result<usize, Error> {
        let outcome = self.transfer.slot.wait().await;

        #[cfg(feature = "log")]
        defmt::trace!("{} slot : Outcome {}", self.transfer.slot.kind, outcome);

        match outcome {
            Outcome::Completed(n) => Ok(n),
            Outcome::Failed(e) => Err( Error::Transfer(e) ),
            Outcome::Cancelled => Err( Error::Interrupted ),
        }
    }

    /// Accesses the bytes received by the transfer. Empty if the host
    /// completed it without handing over data.
    /// The slot stays in flight until the pending transfer is dropped, so
    /// the received data cannot be overwritten meanwhile.
    pub fn with_received<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        self.transfer.slot.with_received(f)
    }
}

//! Completion callback handed to the host service with every transfer.



use embassy_sync::blocking_mutex::raw::RawMutex;

use super::*;

use crate::host::HostError;



/// Type erased receiver of transfer outcomes.
pub(crate) trait Sink: Sync {
    fn deliver(&self, seq: u32, outcome: Outcome, data: Option<&[u8]>);
}

impl<M: RawMutex + Sync> Sink for TransferSlot<M> {
    fn deliver(&self, seq: u32, outcome: Outcome, data: Option<&[u8]>) {
        TransferSlot::deliver(self, seq, outcome, data)
    }
}



/// Completion of a single transfer.
/// Firing it records the outcome and raises the completion signal of the
/// transfer kind. It does nothing else, so it is safe to fire from interrupt
/// or worker context.
/// Dropping it without firing cancels the transfer.
pub struct Completion {
    /// Slot that issued the transfer. `None` once fired.
    sink: Option<&'static dyn Sink>,

    /// Sequence number of the transfer.
    seq: u32,
}

impl Completion {
    /// Creates the completion of transfer `seq` on the given slot.
    pub(crate) fn new(sink: &'static dyn Sink, seq: u32) -> Self {
        Self { sink: Some(sink), seq, }
    }

    /// The transfer completed and moved `count` bytes.
    /// For OUT transfers. An IN transfer completed this way reads zero bytes.
    pub fn complete(mut self, count: usize) {
        if let Some(sink) = self.sink.take() {
            sink.deliver(self.seq, Outcome::Completed(count), None);
        }
    }

    /// The IN transfer completed with the given data.
    /// At most `MAX_PACKET_SIZE` bytes are kept.
    pub fn complete_with(mut self, data: &[u8]) {
        if let Some(sink) = self.sink.take() {
            sink.deliver(self.seq, Outcome::Completed(data.len()), Some(data));
        }
    }

    /// The transfer failed.
    pub fn fail(mut self, error: HostError) {
        if let Some(sink) = self.sink.take() {
            sink.deliver(self.seq, Outcome::Failed(error), None);
        }
    }

    /// Fires the completion from a raw host callback: a zero `result` is a
    /// success moving `count` bytes, anything else is the error code.
    /// For OUT transfers, IN data must go through `complete_with`.
    pub fn finish(self, result: i32, count: i32) {
        match result {
            0 => self.complete( count.max(0) as usize ),
            code => self.fail( HostError(code) ),
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take() {
            #[cfg(feature = "log")]
            defmt::debug!("Completion {} dropped without firing", self.seq);

            sink.deliver(self.seq, Outcome::Cancelled, None);
        }
    }
}

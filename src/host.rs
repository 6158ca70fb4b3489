//! Interface to the USB host service the driver runs on top of.
//! The host service owns enumeration, hub handling and the actual bus
//! transfers. The driver only scans descriptors, opens pipes and submits
//! transfers through this interface.



use super::{
    common::{
        DeviceRequest, EndpointDescriptor,
    },

    pipe::Completion,
};



/// Identifier of a device enumerated by the host service.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub struct DeviceId(pub u32);

/// Handle of an opened pipe.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub struct PipeId(pub u32);

/// Negative status code reported by the host service.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub struct HostError(pub i32);



/// Routing of the USB port.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub enum HostMode {
    /// The port acts as a host and enumerates attached devices.
    Host,

    /// The port goes back to the routing it had before the driver started.
    Restore,
}



/// Answer of a class driver to a probe request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Probe {
    Succeeded,
    Failed,
}

/// Answer of a class driver to an attach or detach request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Attach {
    Succeeded,
    Failed,
}



/// A device-matching driver registered with the host service.
/// The host service invokes these from its own context, never concurrently
/// for the same device.
pub trait ClassDriver: Sync {
    /// Name under which the driver is registered.
    fn name(&self) -> &'static str;

    /// Decides if the driver can handle the device. Must not have side effects.
    fn probe(&self, device: DeviceId) -> Probe;

    /// Takes ownership of a probed device.
    fn attach(&self, device: DeviceId) -> Attach;

    /// The device was removed. Answering `Attach::Failed` releases the association.
    fn detach(&self, device: DeviceId) -> Attach;
}



/// The USB host service.
///
/// Transfer submissions return as soon as the request is queued. The given
/// `Completion` must be fired exactly once, from any context, when the
/// transfer ends.
pub trait UsbHost: Sync {
    /// Returns the static descriptor blob of the device: the device
    /// descriptor followed by the active configuration bundle.
    fn descriptors(&self, device: DeviceId) -> Option<&[u8]>;

    /// Opens a pipe to the given endpoint, or the default control pipe if `None`.
    fn open_pipe(&self, device: DeviceId, endpoint: Option<&EndpointDescriptor>) -> Result<PipeId, HostError>;

    /// Closes a pipe. Outstanding transfers on it are dropped.
    fn close_pipe(&self, pipe: PipeId) -> Result<(), HostError>;

    /// Submits a control transfer on a control pipe.
    /// `data` is the OUT data stage and is empty for IN or data-less requests.
    /// IN data is handed over with `Completion::complete_with`.
    fn control_transfer(&self, pipe: PipeId, request: &DeviceRequest, data: &[u8], completion: Completion) -> Result<(), HostError>;

    /// Submits a bulk OUT transfer. The host consumes `data` before returning.
    fn bulk_out(&self, pipe: PipeId, data: &[u8], completion: Completion) -> Result<(), HostError>;

    /// Submits a bulk IN transfer of at most `len` bytes.
    /// Received bytes are handed over with `Completion::complete_with`.
    fn bulk_in(&self, pipe: PipeId, len: usize, completion: Completion) -> Result<(), HostError>;

    /// Registers a device-matching driver.
    fn register_driver(&self, driver: &'static dyn ClassDriver) -> Result<(), HostError>;

    /// Unregisters a device-matching driver.
    fn unregister_driver(&self, driver: &'static dyn ClassDriver) -> Result<(), HostError>;

    /// Switches the routing of the USB port.
    fn select_mode(&self, mode: HostMode) -> Result<(), HostError>;

    /// Copies driver memory into caller memory.
    fn copy_to_caller(&self, dst: &mut [u8], src: &[u8]) -> Result<(), HostError> {
        dst.copy_from_slice(src);
        Ok( () )
    }

    /// Copies caller memory into driver memory.
    fn copy_from_caller(&self, dst: &mut [u8], src: &[u8]) -> Result<(), HostError> {
        dst.copy_from_slice(src);
        Ok( () )
    }
}

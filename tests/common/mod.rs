//! Mock USB host service driving the driver from the test thread.
//!
//! Control transfers complete immediately unless held. Bulk transfers stay
//! pending until a test completes them, possibly from another thread than
//! the blocked caller.

#![allow(dead_code)]



use std::{
    collections::HashMap,
    sync::Mutex,
    thread,
    time::{Duration, Instant},
};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use usbmidi::{
    common::{DeviceRequest, EndpointDescriptor},
    host::{Attach, ClassDriver, DeviceId, HostError, HostMode, PipeId, Probe, UsbHost},
    pipe::Completion,
    Config, DeviceContext, Driver,
};



pub type TestDriver = Driver<MockHost, CriticalSectionRawMutex>;

/// Creates a stopped driver with its own leaked context and mock host.
pub fn driver(config: Config) -> &'static TestDriver {
    let context: &'static DeviceContext<CriticalSectionRawMutex> = Box::leak( Box::new( DeviceContext::new() ) );

    Box::leak( Box::new( Driver::new( MockHost::new(), context, config ) ) )
}

/// Waits until the condition holds. Panics after a few seconds.
pub fn wait_for(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);

    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep( Duration::from_millis(1) );
    }
}



/// Device descriptor, configuration 1, audio control interface, MIDI
/// streaming interface with bulk OUT 0x02 and bulk IN 0x81, then a vendor
/// interface with its own bulk endpoint 0x83.
pub const MIDI_DEVICE: [u8; 86] = [
    18, 0x01, 0x10, 0x01, 0x00, 0x00, 0x00, 64, 0x99, 0x05, 0x01, 0x00, 0x00, 0x01, 1, 2, 0, 1,
    9, 0x02, 68, 0, 3, 1, 0, 0x80, 50,
    9, 0x04, 0, 0, 0, 0x01, 0x01, 0x00, 0,
    9, 0x04, 1, 0, 2, 0x01, 0x03, 0x00, 0,
    7, 0x24, 0x01, 0x00, 0x01, 7, 0,
    9, 0x05, 0x02, 0x02, 64, 0, 0, 0, 0,
    9, 0x05, 0x81, 0x02, 64, 0, 0, 0, 0,
    9, 0x04, 2, 0, 1, 0xFF, 0x00, 0x00, 0,
    7, 0x05, 0x83, 0x02, 64, 0, 0,
];

/// A keyboard: class defined per interface, HID interface only.
pub const HID_DEVICE: [u8; 43] = [
    18, 0x01, 0x10, 0x01, 0x00, 0x00, 0x00, 8, 0x6D, 0x04, 0x1C, 0xC3, 0x00, 0x01, 1, 2, 0, 1,
    9, 0x02, 25, 0, 1, 1, 0, 0xA0, 50,
    9, 0x04, 0, 0, 1, 0x03, 0x01, 0x01, 0,
    7, 0x05, 0x81, 0x03, 8, 0, 10,
];



/// A bulk transfer waiting for the test to complete it.
pub struct PendingBulk {
    pub pipe: PipeId,

    /// OUT data, or the requested length of an IN transfer.
    pub data: Vec<u8>,
    pub len: usize,

    pub completion: Completion,
}

#[derive(Default)]
struct Inner {
    devices: HashMap<u32, &'static [u8]>,

    driver: Option<&'static dyn ClassDriver>,

    next_pipe: u32,
    open: Vec<PipeId>,

    modes: Vec<HostMode>,
    requests: Vec<DeviceRequest>,

    bulk_in: Vec<PendingBulk>,
    bulk_out: Vec<PendingBulk>,
    submissions: usize,

    /// Control completions are queued instead of fired.
    hold_control: bool,
    control: Vec<Completion>,

    /// Error answered to control transfers.
    control_error: Option<HostError>,

    /// Error answered to bulk submissions.
    submit_error: Option<HostError>,

    /// Error answered to driver registrations.
    register_error: Option<HostError>,
}

pub struct MockHost {
    inner: Mutex<Inner>,
}

impl MockHost {
    pub fn new() -> Self {
        Self { inner: Mutex::new( Inner::default() ) }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        f( &mut self.inner.lock().unwrap() )
    }

    /// Enumerates a device. It is not offered to the driver until plugged.
    pub fn add_device(&self, id: u32, descriptors: &'static [u8]) {
        self.with(|inner| inner.devices.insert(id, descriptors));
    }

    /// Offers the device to the registered driver the way the host service
    /// does: probe, then attach if the probe succeeded.
    /// Returns `None` if no driver is registered or the probe failed.
    pub fn plug(&self, id: u32) -> Option<Attach> {
        // Never call into the driver with the lock held.
        let driver = self.with(|inner| inner.driver)?;

        match driver.probe( DeviceId(id) ) {
            Probe::Succeeded => Some( driver.attach( DeviceId(id) ) ),
            Probe::Failed => None,
        }
    }

    /// Reports the removal of the device to the registered driver.
    pub fn unplug(&self, id: u32) -> Option<Attach> {
        let driver = self.with(|inner| inner.driver)?;

        Some( driver.detach( DeviceId(id) ) )
    }

    pub fn registered(&self) -> bool {
        self.with(|inner| inner.driver.is_some())
    }

    pub fn modes(&self) -> Vec<HostMode> {
        self.with(|inner| inner.modes.clone())
    }

    pub fn requests(&self) -> Vec<DeviceRequest> {
        self.with(|inner| inner.requests.clone())
    }

    pub fn open_pipes(&self) -> usize {
        self.with(|inner| inner.open.len())
    }

    pub fn submissions(&self) -> usize {
        self.with(|inner| inner.submissions)
    }

    pub fn pending_in(&self) -> usize {
        self.with(|inner| inner.bulk_in.len())
    }

    pub fn pending_out(&self) -> usize {
        self.with(|inner| inner.bulk_out.len())
    }

    pub fn hold_control(&self, hold: bool) {
        self.with(|inner| inner.hold_control = hold);
    }

    pub fn pending_control(&self) -> usize {
        self.with(|inner| inner.control.len())
    }

    pub fn fail_control(&self, error: Option<HostError>) {
        self.with(|inner| inner.control_error = error);
    }

    pub fn fail_submit(&self, error: Option<HostError>) {
        self.with(|inner| inner.submit_error = error);
    }

    pub fn fail_register(&self, error: Option<HostError>) {
        self.with(|inner| inner.register_error = error);
    }

    /// Takes the oldest pending bulk IN transfer.
    pub fn take_in(&self) -> PendingBulk {
        wait_for("a bulk IN transfer", || self.pending_in() > 0);
        self.with(|inner| inner.bulk_in.remove(0))
    }

    /// Takes the oldest pending bulk OUT transfer.
    pub fn take_out(&self) -> PendingBulk {
        wait_for("a bulk OUT transfer", || self.pending_out() > 0);
        self.with(|inner| inner.bulk_out.remove(0))
    }

    fn submit(&self, pipe: PipeId, data: &[u8], len: usize, completion: Completion, input: bool) -> Result<(), HostError> {
        self.with(|inner| {
            if let Some(e) = inner.submit_error {
                return Err(e);
            }

            if !inner.open.contains(&pipe) {
                return Err( HostError(-22) );
            }

            inner.submissions += 1;

            let transfer = PendingBulk { pipe, data: data.to_vec(), len, completion };

            match input {
                true => inner.bulk_in.push(transfer),
                false => inner.bulk_out.push(transfer),
            }

            Ok(())
        })
    }
}

impl UsbHost for MockHost {
    fn descriptors(&self, device: DeviceId) -> Option<&[u8]> {
        self.with(|inner| inner.devices.get(&device.0).copied())
    }

    fn open_pipe(&self, _device: DeviceId, _endpoint: Option<&EndpointDescriptor>) -> Result<PipeId, HostError> {
        self.with(|inner| {
            inner.next_pipe += 1;

            let pipe = PipeId(inner.next_pipe);
            inner.open.push(pipe);

            Ok(pipe)
        })
    }

    fn close_pipe(&self, pipe: PipeId) -> Result<(), HostError> {
        // Pending transfers are kept so tests can fire late completions.
        self.with(|inner| {
            let before = inner.open.len();
            inner.open.retain(|open| *open != pipe);

            match inner.open.len() < before {
                true => Ok(()),
                false => Err( HostError(-22) ),
            }
        })
    }

    fn control_transfer(&self, pipe: PipeId, request: &DeviceRequest, data: &[u8], completion: Completion) -> Result<(), HostError> {
        assert!(self.with(|inner| inner.open.contains(&pipe)), "control transfer on a closed pipe");

        let (error, descriptors, completion) = self.with(|inner| {
            inner.requests.push(*request);

            let completion = match inner.hold_control {
                true => {
                    inner.control.push(completion);
                    None
                },
                false => Some(completion),
            };

            (inner.control_error, inner.devices.values().next().copied(), completion)
        });

        let Some(completion) = completion else {
            return Ok(());
        };

        if let Some(e) = error {
            completion.fail(e);
            return Ok(());
        }

        match request.request_type & DeviceRequest::STANDARD_IN {
            0 => completion.complete( data.len() ),
            _ => {
                let blob = descriptors.unwrap_or(&[]);
                let n = blob.len().min( request.length as usize );
                completion.complete_with( &blob[..n] );
            },
        }

        Ok(())
    }

    fn bulk_out(&self, pipe: PipeId, data: &[u8], completion: Completion) -> Result<(), HostError> {
        self.submit(pipe, data, data.len(), completion, false)
    }

    fn bulk_in(&self, pipe: PipeId, len: usize, completion: Completion) -> Result<(), HostError> {
        self.submit(pipe, &[], len, completion, true)
    }

    fn register_driver(&self, driver: &'static dyn ClassDriver) -> Result<(), HostError> {
        self.with(|inner| match inner.register_error {
            Some(e) => Err(e),
            None => {
                inner.driver = Some(driver);
                Ok(())
            },
        })
    }

    fn unregister_driver(&self, _driver: &'static dyn ClassDriver) -> Result<(), HostError> {
        self.with(|inner| match inner.driver.take() {
            Some(_) => Ok(()),
            None => Err( HostError(-2) ),
        })
    }

    fn select_mode(&self, mode: HostMode) -> Result<(), HostError> {
        self.with(|inner| inner.modes.push(mode));
        Ok(())
    }
}

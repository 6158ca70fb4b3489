//! USB MIDI class driver with a blocking interface for executor agnostic embedded `Rust`.
//!
//! What do each of these mean:
//!   - USB MIDI class : Works with any class compliant device exposing an
//!     Audio class, MIDI Streaming subclass interface.
//!   - Blocking : Reads and writes block the calling thread until the
//!     transfer completes, or until the device is detached or the driver stopped.
//!   - Executor agnostic : The transfer bridge is a set of plain futures. The
//!     blocking calls drive them with `block_on`, async callers can await them.
//!
//! The driver sits on top of a USB host service (see [`host::UsbHost`]) that
//! owns enumeration and completes transfers from its own context.
//!
//! Concurrency contract : a single reader and a single writer. A second
//! concurrent `read` (or `write`) fails fast with [`Error::Busy`] instead of
//! racing on the staging buffer.



#![no_std]



#[cfg(any(test, feature = "std"))]
extern crate std;



pub mod common;
pub mod host;
pub mod matcher;
pub mod pipe;



mod block;
mod config;
mod control;
mod error;
mod state;



pub use block::*;

pub use config::*;

pub use control::*;

pub use error::*;

pub use state::*;

pub use pipe::{
    DeviceContext, MAX_PACKET_SIZE,
};



use common::*;

use embassy_sync::blocking_mutex::raw::RawMutex;

use host::{
    Attach, ClassDriver, DeviceId, HostError, HostMode, PipeId, Probe, UsbHost,
};

use pipe::{
    Pipes, Transfer,
};



/// USB MIDI class driver. Register it with the host service with `start`.
pub struct Driver<H: UsbHost + 'static, M: RawMutex + Sync + 'static> {
    /// The USB host service.
    host: H,

    /// Pipes and transfer slots.
    /// The context must be static so the host service can complete transfers
    /// from any context. Synchronization is handled internally by the driver.
    context: &'static DeviceContext<M>,

    /// Configuration of the driver.
    config: Config,

    /// Started and attached flags.
    flags: Flags,
}

/// Creating / Starting / Stopping the driver.
impl<H: UsbHost + 'static, M: RawMutex + Sync + 'static> Driver<H, M> {
    /// Creates a new stopped driver.
    pub const fn new(host: H, context: &'static DeviceContext<M>, config: Config) -> Self {
        Self {
            host,
            context,
            config,
            flags: Flags::new(),
        }
    }

    /// Returns the USB host service.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Returns the configuration of the driver.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> State {
        self.flags.state()
    }

    /// Returns `true` if a device is attached for input.
    pub fn is_input_attached(&self) -> bool {
        self.flags.input()
    }

    /// Returns `true` if a device is attached for output.
    pub fn is_output_attached(&self) -> bool {
        self.flags.output()
    }

    /// Starts the driver: switches the port to host mode and registers the
    /// driver with the host service.
    pub fn start(&'static self) -> Result<(), Error> {
        if !self.flags.start() { return Err( Error::AlreadyStarted ) }

        #[cfg(feature = "log")]
        defmt::info!("Starting {}", self.config.name);

        // Pipes left by an attach that raced the previous stop.
        self.close( self.context.take_pipes() );

        if let Err( e ) = self.host.select_mode( HostMode::Host ) {
            #[cfg(feature = "log")]
            defmt::error!("Failed to select host mode: {}", e);

            self.flags.stop();
            return Err( Error::Host(e) );
        }

        if let Err( e ) = self.host.register_driver(self) {
            #[cfg(feature = "log")]
            defmt::error!("Failed to register driver: {}", e);

            let _ = self.host.select_mode( HostMode::Restore );
            self.flags.stop();
            return Err( Error::Host(e) );
        }

        Ok( () )
    }

    /// Stops the driver: closes the pipes, unregisters the driver, restores
    /// the port routing and wakes any blocked transfer.
    pub fn stop(&'static self) -> Result<(), Error> {
        if !self.flags.stop() { return Err( Error::NotStarted ) }

        #[cfg(feature = "log")]
        defmt::info!("Stopping {}", self.config.name);

        self.close( self.context.take_pipes() );

        if let Err( _e ) = self.host.unregister_driver(self) {
            #[cfg(feature = "log")]
            defmt::warn!("Failed to unregister driver: {}", _e);
        }

        if let Err( _e ) = self.host.select_mode( HostMode::Restore ) {
            #[cfg(feature = "log")]
            defmt::warn!("Failed to restore port routing: {}", _e);
        }

        self.context.cancel_all();

        Ok( () )
    }

    /// Handles a system power event.
    /// On resume while started, the port is switched back to host mode so the
    /// device reappears without a stop / start cycle.
    pub fn on_system_event(&self, event: SystemEvent) -> Result<(), Error> {
        if event != SystemEvent::Resume || !self.flags.started() { return Ok( () ) }

        #[cfg(feature = "log")]
        defmt::debug!("Resumed, selecting host mode again");

        self.host.select_mode( HostMode::Host ).map_err( Error::Host )
    }

    /// Closes the given pipes, ignoring host errors.
    fn close(&self, pipes: Pipes) {
        for pipe in [pipes.input, pipes.output, pipes.control].into_iter().flatten() {
            if let Err( _e ) = self.host.close_pipe(pipe) {
                #[cfg(feature = "log")]
                defmt::warn!("Failed to close pipe {}: {}", pipe, _e);
            }
        }
    }

    /// Opens a pipe. A host error leaves the pipe unopened.
    fn open(&self, device: DeviceId, endpoint: Option<&EndpointDescriptor>) -> Option<PipeId> {
        match self.host.open_pipe(device, endpoint) {
            Ok( pipe ) => {
                #[cfg(feature = "log")]
                defmt::trace!("Opened pipe {} to endpoint {}", pipe, endpoint.map(|ep| ep.address));

                Some( pipe )
            },

            Err( _e ) => {
                #[cfg(feature = "log")]
                defmt::warn!("Failed to open pipe to endpoint {}: {}", endpoint.map(|ep| ep.address), _e);

                None
            },
        }
    }
}



/// Reading / Writing MIDI packets.
impl<H: UsbHost + 'static, M: RawMutex + Sync + 'static> Driver<H, M> {
    /// Reads at most `MAX_PACKET_SIZE` bytes of USB-MIDI packets into `buf`.
    /// Blocks until the device sends data, is detached or the driver stops.
    /// Returns the number of bytes read.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, Error> {
        block_on( self.read_async(buf) )
    }

    /// Writes at most `MAX_PACKET_SIZE` bytes of USB-MIDI packets.
    /// Blocks until the device took the data, is detached or the driver stops.
    /// Returns the number of bytes written.
    pub fn write(&self, data: &[u8]) -> Result<usize, Error> {
        block_on( self.write_async(data) )
    }

    /// Issues a control transfer on the default pipe and blocks until it
    /// completes. For IN requests the received bytes are copied into `data`.
    /// Returns the number of bytes of the data stage.
    pub fn control_transfer(&self, request: DeviceRequest, data: &mut [u8]) -> Result<usize, Error> {
        block_on( self.control_async(request, data) )
    }

    /// Async version of `read`.
    pub async fn read_async(&self, buf: &mut [u8]) -> Result<usize, Error> {
        if !self.flags.input() { return Err( Error::Unavailable ) }

        if buf.len() > MAX_PACKET_SIZE { return Err( Error::BadSize( buf.len() ) ) }

        let transfer = Transfer::issue( &self.context.receive )?;

        // Recheck after issuing, a detach in between would not wake us.
        let pipe = match self.context.pipes().input {
            Some( pipe ) if self.flags.input() => pipe,
            _ => return Err( Error::Unavailable ),
        };

        let mut pending = transfer.submit(|completion| self.host.bulk_in(pipe, buf.len(), completion))?;

        pending.wait().await?;

        let n = pending.with_received(|received| {
            let n = received.len().min( buf.len() );
            self.host.copy_to_caller(&mut buf[..n], &received[..n]).map(|_| n)
        }).map_err( Error::Boundary )?;

        #[cfg(feature = "log")]
        defmt::trace!("Read {} bytes", n);

        Ok( n )
    }

    /// Async version of `write`.
    pub async fn write_async(&self, data: &[u8]) -> Result<usize, Error> {
        if !self.flags.output() { return Err( Error::Unavailable ) }

        if data.len() > MAX_PACKET_SIZE { return Err( Error::BadSize( data.len() ) ) }

        let transfer = Transfer::issue( &self.context.send )?;

        // Recheck after issuing, a detach in between would not wake us.
        let pipe = match self.context.pipes().output {
            Some( pipe ) if self.flags.output() => pipe,
            _ => return Err( Error::Unavailable ),
        };

        let n = data.len();

        // Stage the caller data, then hand the host a snapshot of it.
        let packet = transfer.with_buffer(|staging| {
            self.host.copy_from_caller(&mut staging[..n], data)?;
            Ok::<_, HostError>( *staging )
        }).map_err( Error::Boundary )?;

        let mut pending = transfer.submit(|completion| self.host.bulk_out(pipe, &packet[..n], completion))?;

        let sent = pending.wait().await?.min( n );

        #[cfg(feature = "log")]
        defmt::trace!("Wrote {} bytes", sent);

        Ok( sent )
    }

    /// Async version of `control_transfer`.
    pub async fn control_async(&self, request: DeviceRequest, data: &mut [u8]) -> Result<usize, Error> {
        if !self.flags.started() { return Err( Error::NotStarted ) }

        if data.len() > MAX_PACKET_SIZE { return Err( Error::BadSize( data.len() ) ) }

        let transfer = Transfer::issue( &self.context.control )?;

        let pipe = match self.context.pipes().control {
            Some( pipe ) if self.flags.started() => pipe,
            _ => return Err( Error::Unavailable ),
        };

        let input = (request.request_type & DeviceRequest::STANDARD_IN) != 0;

        let mut pending = match input {
            true => transfer.submit(|completion| self.host.control_transfer(pipe, &request, &[], completion))?,
            false => transfer.submit(|completion| self.host.control_transfer(pipe, &request, &*data, completion))?,
        };

        let n = pending.wait().await?;

        #[cfg(feature = "log")]
        defmt::trace!("Control request {} completed with {} bytes", request.request, n);

        if !input { return Ok( n.min( data.len() ) ) }

        pending.with_received(|received| {
            let n = received.len().min( data.len() );
            self.host.copy_to_caller(&mut data[..n], &received[..n]).map(|_| n)
        }).map_err( Error::Boundary )
    }
}



/// Matching / Attaching / Detaching devices.
impl<H: UsbHost + 'static, M: RawMutex + Sync + 'static> Driver<H, M> {
    /// Opens the pipes of a matching device and applies its configuration.
    fn connect(&self, device: DeviceId) -> Result<Pipes, Error> {
        if !self.flags.started() { return Err( Error::NotStarted ) }

        // Probe and attach are independent calls, match again.
        let blob = self.host.descriptors(device).ok_or( Error::AttachFailed )?;
        let midi = matcher::match_device(blob).ok_or( Error::AttachFailed )?;

        let configuration = match scan(blob, None, DescriptorType::Configuration) {
            Some( (_, Descriptor::Configuration(c)) ) => c,
            _ => return Err( Error::AttachFailed ),
        };

        // A new attach replaces whatever was left of the previous device.
        self.close( self.context.take_pipes() );

        let mut pipes = Pipes::EMPTY;

        for ep in midi.endpoints(blob) {
            #[cfg(feature = "log")]
            defmt::trace!("Found endpoint {:x}", ep.address);

            if pipes.input.is_none() && self.config.wants_in(&ep) {
                pipes.input = self.open(device, Some(&ep));
            } else if pipes.output.is_none() && self.config.wants_out(&ep) {
                pipes.output = self.open(device, Some(&ep));
            }
        }

        pipes.control = self.open(device, None);

        if pipes.control.is_none() || (pipes.input.is_none() && pipes.output.is_none()) {
            self.close(pipes);
            return Err( Error::AttachFailed );
        }

        self.context.set_pipes(pipes);

        // Apply the default configuration.
        if let Err( e ) = self.control_transfer( DeviceRequest::set_configuration(configuration.value), &mut [] ) {
            #[cfg(feature = "log")]
            defmt::error!("Failed to set configuration {}: {}", configuration.value, e);

            self.close( self.context.take_pipes() );
            return Err( e );
        }

        Ok( pipes )
    }
}

impl<H: UsbHost + 'static, M: RawMutex + Sync + 'static> ClassDriver for Driver<H, M> {
    fn name(&self) -> &'static str {
        self.config.name
    }

    fn probe(&self, device: DeviceId) -> Probe {
        #[cfg(feature = "log")]
        defmt::debug!("Probing device {}", device);

        match self.host.descriptors(device).and_then(matcher::match_device) {
            Some( _ ) => Probe::Succeeded,
            None => Probe::Failed,
        }
    }

    fn attach(&self, device: DeviceId) -> Attach {
        #[cfg(feature = "log")]
        defmt::debug!("Attaching device {}", device);

        match self.connect(device) {
            Ok( pipes ) => {
                // A stop during the attach already tore the context down.
                if !self.flags.attach( pipes.input.is_some(), pipes.output.is_some() ) {
                    self.close( self.context.take_pipes() );
                    return Attach::Failed;
                }

                #[cfg(feature = "log")]
                defmt::info!("Attached device {} [in = {}, out = {}]", device, pipes.input.is_some(), pipes.output.is_some());

                Attach::Succeeded
            },

            Err( _e ) => {
                #[cfg(feature = "log")]
                defmt::warn!("Failed to attach device {}: {}", device, _e);

                Attach::Failed
            },
        }
    }

    fn detach(&self, _device: DeviceId) -> Attach {
        #[cfg(feature = "log")]
        defmt::debug!("Detaching device {}", _device);

        // Both directions go down together.
        self.flags.detach();
        self.close( self.context.take_pipes() );

        // Wake any blocked transfer.
        self.context.cancel_all();

        Attach::Failed
    }
}

//! Configuration of the USB MIDI driver.



use super::common::*;



#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Name under which the driver registers with the host service.
    pub(crate) name: &'static str,

    /// Address of the bulk IN endpoint.
    pub(crate) inep: u8,

    /// Address of the bulk OUT endpoint.
    pub(crate) outep: u8,

    /// Endpoint selection policy.
    pub(crate) selection: EndpointSelection,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Creates a new configuration instance.
    pub const fn new() -> Self {
        Self {
            name: "usbmidi",
            inep: 0x81,
            outep: 0x02,
            selection: EndpointSelection::Fixed,
        }
    }

    /// Sets the driver name.
    pub const fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Sets the bulk endpoint addresses.
    /// The direction bit is forced on the IN address and cleared on the OUT address.
    pub const fn endpoints(mut self, inep: u8, outep: u8) -> Self {
        self.inep = inep | 0x80;
        self.outep = outep & 0x7F;
        self
    }

    /// Sets the endpoint selection policy.
    pub const fn selection(mut self, selection: EndpointSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Returns `true` if the endpoint must be opened as the IN pipe.
    pub(crate) fn wants_in(&self, ep: &EndpointDescriptor) -> bool {
        match self.selection {
            EndpointSelection::Fixed => ep.address == self.inep,
            EndpointSelection::FirstBulk => ep.is_in() && ep.is_bulk(),
        }
    }

    /// Returns `true` if the endpoint must be opened as the OUT pipe.
    pub(crate) fn wants_out(&self, ep: &EndpointDescriptor) -> bool {
        match self.selection {
            EndpointSelection::Fixed => ep.address == self.outep,
            EndpointSelection::FirstBulk => !ep.is_in() && ep.is_bulk(),
        }
    }
}

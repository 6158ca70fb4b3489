//! Standard requests sent over the control pipe.



/// Standard request codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
#[repr(u8)]
pub enum Request {
    /// Reads the status of the recipient.
    GetStatus = 0x00,

    /// Clears a feature (e.g. an endpoint halt).
    ClearFeature = 0x01,

    /// Sets a feature.
    SetFeature = 0x03,

    /// Reads a descriptor.
    GetDescriptor = 0x06,

    /// Reads the active configuration value.
    GetConfiguration = 0x08,

    /// Selects a configuration.
    SetConfiguration = 0x09,
}

impl Into<u8> for Request {
    fn into(self) -> u8 {
        self as u8
    }
}



/// Setup packet of a control transfer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub struct DeviceRequest {
    /// Direction, type and recipient bitmap.
    pub request_type: u8,

    /// Request code.
    pub request: u8,

    pub value: u16,

    pub index: u16,

    /// Length of the data stage.
    pub length: u16,
}

impl DeviceRequest {
    /// Host to device, standard, device recipient.
    pub const STANDARD_OUT: u8 = 0x00;

    /// Device to host, standard, device recipient.
    pub const STANDARD_IN: u8 = 0x80;

    /// Creates a new request.
    pub const fn new(request_type: u8, request: u8, value: u16, index: u16, length: u16) -> Self {
        Self { request_type, request, value, index, length, }
    }

    /// Creates a SET_CONFIGURATION request for the given configuration value.
    pub const fn set_configuration(value: u8) -> Self {
        Self::new(Self::STANDARD_OUT, Request::SetConfiguration as u8, value as u16, 0, 0)
    }

    /// Returns the 8 byte wire representation of the setup packet.
    pub fn to_bytes(&self) -> [u8; 8] {
        let value = self.value.to_le_bytes();
        let index = self.index.to_le_bytes();
        let length = self.length.to_le_bytes();

        [
            self.request_type, self.request,
            value[0], value[1],
            index[0], index[1],
            length[0], length[1],
        ]
    }
}



#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_configuration_setup_packet() {
        let request = DeviceRequest::set_configuration(1);

        assert_eq!(request.to_bytes(), [0x00, 0x09, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);
    }
}

//! Standard USB descriptors and the descriptor scan primitive.



/// Types of standard descriptors used by the driver.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
#[repr(u8)]
pub enum DescriptorType {
    /// Device descriptor.
    Device = 0x01,

    /// Configuration descriptor.
    Configuration = 0x02,

    /// Interface descriptor.
    Interface = 0x04,

    /// Endpoint descriptor.
    Endpoint = 0x05,
}

impl Into<u8> for DescriptorType {
    fn into(self) -> u8 {
        self as u8
    }
}



/// Device descriptor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub struct DeviceDescriptor {
    /// Device class. Zero means the class is defined per interface.
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,

    /// Maximum packet size of endpoint zero.
    pub max_packet_size0: u8,

    pub vendor: u16,
    pub product: u16,

    pub num_configurations: u8,
}

impl DeviceDescriptor {
    pub const LENGTH: usize = 18;

    /// Parses a device descriptor record.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        if raw.len() < Self::LENGTH || raw[1] != DescriptorType::Device as u8 { return None }

        Some( Self {
            class: raw[4],
            subclass: raw[5],
            protocol: raw[6],
            max_packet_size0: raw[7],
            vendor: u16::from_le_bytes([raw[8], raw[9]]),
            product: u16::from_le_bytes([raw[10], raw[11]]),
            num_configurations: raw[17],
        })
    }
}



/// Configuration descriptor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub struct ConfigurationDescriptor {
    /// Length of the whole configuration bundle.
    pub total_length: u16,

    pub num_interfaces: u8,

    /// Value to select this configuration with SET_CONFIGURATION.
    pub value: u8,

    pub attributes: u8,

    /// Maximum power in 2 mA units.
    pub max_power: u8,
}

impl ConfigurationDescriptor {
    pub const LENGTH: usize = 9;

    /// Parses a configuration descriptor record.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        if raw.len() < Self::LENGTH || raw[1] != DescriptorType::Configuration as u8 { return None }

        Some( Self {
            total_length: u16::from_le_bytes([raw[2], raw[3]]),
            num_interfaces: raw[4],
            value: raw[5],
            attributes: raw[7],
            max_power: raw[8],
        })
    }
}



/// Interface descriptor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub struct InterfaceDescriptor {
    pub number: u8,
    pub alternate: u8,
    pub num_endpoints: u8,
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
}

impl InterfaceDescriptor {
    pub const LENGTH: usize = 9;

    /// Parses an interface descriptor record.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        if raw.len() < Self::LENGTH || raw[1] != DescriptorType::Interface as u8 { return None }

        Some( Self {
            number: raw[2],
            alternate: raw[3],
            num_endpoints: raw[4],
            class: raw[5],
            subclass: raw[6],
            protocol: raw[7],
        })
    }
}



/// Endpoint descriptor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub struct EndpointDescriptor {
    /// Endpoint address. Bit 7 set for IN endpoints.
    pub address: u8,

    /// Transfer type in bits 0..2.
    pub attributes: u8,

    pub max_packet_size: u16,

    pub interval: u8,
}

impl EndpointDescriptor {
    /// Audio class endpoints carry two extra bytes, so only the standard
    /// prefix is required.
    pub const LENGTH: usize = 7;

    /// Parses an endpoint descriptor record.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        if raw.len() < Self::LENGTH || raw[1] != DescriptorType::Endpoint as u8 { return None }

        Some( Self {
            address: raw[2],
            attributes: raw[3],
            max_packet_size: u16::from_le_bytes([raw[4], raw[5]]),
            interval: raw[6],
        })
    }

    /// Returns `true` if this is an IN (device to host) endpoint.
    pub const fn is_in(&self) -> bool {
        (self.address & 0x80) != 0
    }

    /// Returns `true` if this is a bulk endpoint.
    pub const fn is_bulk(&self) -> bool {
        (self.attributes & 0b11) == 0b10
    }
}



/// A parsed descriptor record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Descriptor {
    Device( DeviceDescriptor ),
    Configuration( ConfigurationDescriptor ),
    Interface( InterfaceDescriptor ),
    Endpoint( EndpointDescriptor ),
}



/// Iterator over the raw records of a descriptor blob.
/// Yields `(offset, record)` and stops at the first malformed record.
pub struct Records<'a> {
    /// The descriptor blob.
    blob: &'a [u8],

    /// Offset of the next record.
    cursor: usize,
}

impl<'a> Records<'a> {
    /// Creates an iterator over all the records in the blob.
    pub const fn new(blob: &'a [u8]) -> Self {
        Self { blob, cursor: 0, }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = (usize, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.cursor;

        // Need at least bLength and bDescriptorType.
        if offset + 2 > self.blob.len() { return None }

        let length = self.blob[offset] as usize;

        // A short or overrunning record ends the scan.
        if length < 2 || offset + length > self.blob.len() {
            self.cursor = self.blob.len();
            return None;
        }

        self.cursor += length;

        Some( (offset, &self.blob[offset..offset + length]) )
    }
}



/// Returns the next descriptor of the given type located strictly after the
/// record at `from`, or the first one if `from` is `None`.
/// Returns `None` when the blob ends, is malformed or the record does not parse.
pub fn scan(blob: &[u8], from: Option<usize>, kind: DescriptorType) -> Option<(usize, Descriptor)> {
    let (offset, raw) = Records::new(blob)
        .filter(|(offset, _)| from.map_or(true, |from| *offset > from))
        .find(|(_, raw)| raw[1] == kind as u8)?;

    let descriptor = match kind {
        DescriptorType::Device => Descriptor::Device( DeviceDescriptor::parse(raw)? ),
        DescriptorType::Configuration => Descriptor::Configuration( ConfigurationDescriptor::parse(raw)? ),
        DescriptorType::Interface => Descriptor::Interface( InterfaceDescriptor::parse(raw)? ),
        DescriptorType::Endpoint => Descriptor::Endpoint( EndpointDescriptor::parse(raw)? ),
    };

    Some( (offset, descriptor) )
}



#[cfg(test)]
mod tests {
    use super::*;

    const BLOB: [u8; 34] = [
        // Device, class defined per interface.
        18, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 64, 0x34, 0x12, 0x78, 0x56, 0x00, 0x01, 1, 2, 0, 1,
        // Configuration 1.
        9, 0x02, 16, 0, 1, 1, 0, 0x80, 50,
        // Endpoint 0x81, bulk, 64 bytes.
        7, 0x05, 0x81, 0x02, 64, 0, 0,
    ];

    #[test]
    fn parses_device_descriptor() {
        let Some( (0, Descriptor::Device(device)) ) = scan(&BLOB, None, DescriptorType::Device) else {
            panic!("device descriptor not found");
        };

        assert_eq!(device.class, 0);
        assert_eq!(device.vendor, 0x1234);
        assert_eq!(device.product, 0x5678);
        assert_eq!(device.max_packet_size0, 64);
    }

    #[test]
    fn scan_skips_records_up_to_cursor() {
        let (offset, _) = scan(&BLOB, None, DescriptorType::Configuration).unwrap();
        assert_eq!(offset, 18);

        assert!(scan(&BLOB, Some(offset), DescriptorType::Configuration).is_none());

        let Some( (27, Descriptor::Endpoint(ep)) ) = scan(&BLOB, Some(offset), DescriptorType::Endpoint) else {
            panic!("endpoint descriptor not found");
        };

        assert!(ep.is_in());
        assert!(ep.is_bulk());
        assert_eq!(ep.max_packet_size, 64);
    }

    #[test]
    fn truncated_blob_ends_scan() {
        // Endpoint record claims 7 bytes but only 4 are present.
        assert!(scan(&BLOB[..31], None, DescriptorType::Endpoint).is_none());

        // Zero length record.
        let mut broken = BLOB;
        broken[18] = 0;
        assert!(scan(&broken, None, DescriptorType::Configuration).is_none());
        assert!(scan(&broken, None, DescriptorType::Endpoint).is_none());

        assert!(scan(&[], None, DescriptorType::Device).is_none());
    }
}

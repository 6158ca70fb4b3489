//! Matching of class compliant USB MIDI devices.
//! A device matches if its class is defined per interface and one of its
//! interfaces is an Audio class, MIDI Streaming subclass interface.



use super::common::*;



/// Audio interface class.
pub const AUDIO_CLASS: u8 = 0x01;

/// MIDI Streaming interface subclass.
pub const MIDI_STREAMING_SUBCLASS: u8 = 0x03;

/// Device class meaning "defined at interface level".
pub const PER_INTERFACE_CLASS: u8 = 0x00;



/// The MIDI streaming interface of a matched device.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MidiInterface {
    /// The device descriptor.
    pub device: DeviceDescriptor,

    /// The matched interface descriptor.
    pub interface: InterfaceDescriptor,

    /// Offset of the interface descriptor in the descriptor blob.
    pub offset: usize,
}

impl MidiInterface {
    /// Iterates over the endpoint descriptors of the interface.
    /// The iteration stops at the next interface descriptor.
    pub fn endpoints<'a>(&self, blob: &'a [u8]) -> impl Iterator<Item = EndpointDescriptor> + 'a {
        let start = self.offset;

        Records::new(blob)
            .skip_while(move |(offset, _)| *offset <= start)
            .take_while(|(_, raw)| raw[1] != DescriptorType::Interface as u8)
            .filter_map(|(_, raw)| EndpointDescriptor::parse(raw))
    }
}

/// Returns the first MIDI streaming interface of the device, if it is a
/// class compliant MIDI device. Read only.
pub fn match_device(blob: &[u8]) -> Option<MidiInterface> {
    let Some( (_, Descriptor::Device(device)) ) = scan(blob, None, DescriptorType::Device) else {
        return None;
    };

    #[cfg(feature = "log")]
    defmt::trace!("Matcher : Device {:x}:{:x} class {}", device.vendor, device.product, device.class);

    if device.class != PER_INTERFACE_CLASS { return None }

    let mut cursor = None;

    while let Some( (offset, descriptor) ) = scan(blob, cursor, DescriptorType::Interface) {
        if let Descriptor::Interface(interface) = descriptor {
            if interface.class == AUDIO_CLASS && interface.subclass == MIDI_STREAMING_SUBCLASS {
                return Some( MidiInterface { device, interface, offset } );
            }
        }

        cursor = Some(offset);
    }

    None
}

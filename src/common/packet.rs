//! USB-MIDI event packets.
//! Every bulk transfer of a MIDI streaming interface carries a sequence of
//! 4 byte packets: a header byte (cable number and code index) followed by
//! up to 3 bytes of a MIDI message.



/// Size of a USB-MIDI event packet.
pub const PACKET_SIZE: usize = 4;



/// A single USB-MIDI event packet.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub struct Packet(pub [u8; PACKET_SIZE]);

impl Packet {
    /// Virtual cable the packet belongs to.
    pub const fn cable(&self) -> u8 {
        self.0[0] >> 4
    }

    /// Code index number of the packet.
    pub const fn code_index(&self) -> u8 {
        self.0[0] & 0x0F
    }

    /// MIDI status byte with the channel stripped.
    pub const fn status(&self) -> u8 {
        self.0[1] & 0xF0
    }

    /// MIDI channel of the message.
    pub const fn channel(&self) -> u8 {
        self.0[1] & 0x0F
    }

    /// Decodes the channel message carried by the packet.
    pub const fn message(&self) -> Message {
        let a = self.0[2] & 0x7F;
        let b = self.0[3] & 0x7F;

        match self.status() {
            0x80 => Message::NoteOff { note: a, velocity: b },
            0x90 => Message::NoteOn { note: a, velocity: b },
            0xA0 => Message::KeyPressure { note: a, pressure: b },
            0xB0 => Message::ControlChange { control: a, value: b },
            0xC0 => Message::ProgramChange { program: a },
            0xD0 => Message::ChannelPressure { pressure: a },
            0xE0 => Message::PitchBend { value: ((b as u16) << 7) | (a as u16) },
            _ => Message::Other,
        }
    }
}



/// Channel voice message decoded from a packet.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub enum Message {
    NoteOff { note: u8, velocity: u8 },

    NoteOn { note: u8, velocity: u8 },

    KeyPressure { note: u8, pressure: u8 },

    ControlChange { control: u8, value: u8 },

    ProgramChange { program: u8 },

    ChannelPressure { pressure: u8 },

    /// 14 bit pitch wheel value, centered at 0x2000.
    PitchBend { value: u16 },

    /// System and unrecognized messages.
    Other,
}



/// Iterator over the complete packets of a read, in arrival order.
/// A trailing partial packet is ignored.
pub struct Packets<'a> {
    chunks: core::slice::ChunksExact<'a, u8>,
}

impl<'a> Iterator for Packets<'a> {
    type Item = Packet;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = self.chunks.next()?;

        Some( Packet([chunk[0], chunk[1], chunk[2], chunk[3]]) )
    }
}

/// Splits the bytes of a read into packets.
pub fn packets(data: &[u8]) -> Packets<'_> {
    Packets { chunks: data.chunks_exact(PACKET_SIZE) }
}



#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_note_on() {
        let packet = Packet([0x09, 0x93, 0x3C, 0x64]);

        assert_eq!(packet.cable(), 0);
        assert_eq!(packet.code_index(), 0x9);
        assert_eq!(packet.channel(), 3);
        assert_eq!(packet.message(), Message::NoteOn { note: 0x3C, velocity: 0x64 });
    }

    #[test]
    fn decodes_pitch_bend() {
        // Center position.
        let packet = Packet([0x0E, 0xE0, 0x00, 0x40]);
        assert_eq!(packet.message(), Message::PitchBend { value: 0x2000 });
    }

    #[test]
    fn splits_read_into_packets() {
        let data = [
            0x09, 0x90, 0x3C, 0x64,
            0x08, 0x80, 0x3C, 0x00,
            0x0B, 0xB1, 0x07, 0x7F,
            0x0F, 0xF8,
        ];

        let messages: [Message; 3] = {
            let mut iter = packets(&data).map(|p| p.message());
            [iter.next().unwrap(), iter.next().unwrap(), iter.next().unwrap()]
        };

        assert_eq!(messages[0], Message::NoteOn { note: 0x3C, velocity: 0x64 });
        assert_eq!(messages[1], Message::NoteOff { note: 0x3C, velocity: 0 });
        assert_eq!(messages[2], Message::ControlChange { control: 0x07, value: 0x7F });

        assert_eq!(packets(&data).count(), 3);
    }
}

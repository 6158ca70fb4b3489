//! `enum`s used in driver configuration structs.



/// How the data endpoints of the MIDI streaming interface are picked.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "log", derive(defmt::Format))]
pub enum EndpointSelection {
    /// Only the configured IN and OUT endpoint addresses are opened.
    Fixed,

    /// The first bulk endpoint of each direction is opened, whatever its address.
    FirstBulk,
}

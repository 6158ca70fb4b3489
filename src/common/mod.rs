//! `enum`s and `struct`s used by the driver.



mod config;
mod descriptor;
mod packet;
mod request;
mod state;



pub use config::*;
pub use descriptor::*;
pub use packet::*;
pub use request::*;
pub use state::*;

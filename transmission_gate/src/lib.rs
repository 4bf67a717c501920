//! SKY130 inverter, transmission gate, and transmission gate with a built-in
//! enable inverter, generated with Substrate.

pub mod cli;
pub mod config;
pub mod error;
pub mod inverter;
pub mod params;
pub mod pins;
pub mod place;
pub mod route;
pub mod tb;
pub mod tgate;
pub mod tgate_inv;
pub mod verify;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use inverter::{Inverter, InverterIo};
pub use tgate::{TGate, TGateIo};
pub use tgate_inv::{TGateInv, TGateInvData, TGateInvIo};

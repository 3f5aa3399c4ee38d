//! VCPU subsystem for a MIPS processor equipped with the Virtualization
//! Module (VZ ASE): the per-guest execution context, the save/restore path
//! run on every world switch, and the privileged-instruction emulation
//! engine that handles traps from guests touching CP0 state the hardware
//! does not directly virtualize.
//!
//! The crate is organized leaves-first, matching its own dependency order:
//! [`hal`] (the capability set consumed from the board), [`vcpu`] (the
//! passive per-guest record), [`context`] (save/restore), [`emulate`] (trap
//! decode and dispatch), and [`pcpu`] (the per-hart object that ties them
//! together).

#![cfg_attr(not(test), no_std)]

mod context;
mod emulate;
mod hal;
mod pcpu;
mod vcpu;

#[cfg(test)]
mod test_support;

pub use context::calculate_gt_offset;
pub use hal::Hal;
pub use pcpu::HartContext;
pub use vcpu::{GuestCp0Snapshot, Vcpu, MAX_GUESTS};

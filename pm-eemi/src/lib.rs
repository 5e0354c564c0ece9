//! EEMI wire-level definitions shared by the PM transport and service layers.
//!
//! The EEMI call convention is a fixed array of 32-bit words exchanged with
//! the platform management controller (PMC) over an IPI mailbox. Word 0
//! bit-packs the low byte of the first argument, the target module ID and a
//! secure/non-secure origin flag; the remaining words carry raw arguments.
//!
//! This crate is pure data: identifier enumerations, the payload codec and
//! the return-status taxonomy. It performs no I/O and has no error paths of
//! its own.

#![cfg_attr(not(test), no_std)]

mod api;
mod payload;
mod status;

pub use api::*;
pub use payload::{PAYLOAD_ARG_CNT, Payload};
pub use status::{PmError, PmResult, pm_result, wire_code};

/// Target module addressed by an EEMI payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ModuleId {
    /// Core power-management module of the PMC firmware.
    Libpm = 0x2,
    /// PDI loader module.
    Loader = 0x7,
}

/// Mask selecting the module nibble carried in bits [8:15] of an API ID.
pub const MODULE_ID_MASK: u32 = 0x0000_ff00;

/// Extracts the module ID field from a raw API identifier.
///
/// An API ID with an empty module field addresses the power-management
/// module by convention.
pub fn module_of(api_id: u32) -> u32 {
    let module = (api_id & MODULE_ID_MASK) >> 8;
    if module == 0 {
        ModuleId::Libpm as u32
    } else {
        module
    }
}

/// Origin of a PM request, forwarded to the PMC as bit 24 of payload word 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum SecurityFlag {
    /// Call issued from the secure world.
    Secure = 0,
    /// Call issued from the normal world.
    NonSecure = 1,
}

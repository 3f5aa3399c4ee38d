//! The capability set this crate needs from the board: raw access to the
//! guest and root CP0 register files and to the VZ ASE guest-control
//! registers. Every method is a 1:1 binding to a MIPS privileged
//! instruction or control register and is specified here by contract only:
//! the implementer supplies inline-asm bodies on real hardware and an
//! in-memory mock in tests.
//!
//! All calls are synchronous, side-effecting, and assumed atomic: the core
//! never retries or checks for partial completion.

/// Board/architecture binding for the MIPS CP0 and VZ guest-control
/// primitives this crate drives during context switch and instruction
/// emulation.
///
/// Implementations are expected to be zero-sized or otherwise free to
/// construct; every method takes `&self` because the core treats the
/// underlying hardware as the only real state.
pub trait Hal {
    /// `mfgc0(reg, sel)`: read the guest CP0 register bound to the
    /// currently configured Guest-ID.
    fn mfgc0(&self, reg: u32, sel: u32) -> u32;

    /// `mtgc0(reg, sel, value)`: write the guest CP0 register bound to
    /// the currently configured Guest-ID.
    fn mtgc0(&self, reg: u32, sel: u32, value: u32);

    /// `mfc0(reg, sel)`: read a root CP0 register.
    fn mfc0(&self, reg: u32, sel: u32) -> u32;

    /// Read root Exception PC.
    fn epc(&self) -> u32;

    /// Write root Exception PC.
    fn set_epc(&self, value: u32);

    /// Read Guest-CTL2 (pending guest-interrupt delivery bits).
    fn guest_ctl2(&self) -> u32;

    /// Write Guest-CTL2.
    fn set_guest_ctl2(&self, value: u32);

    /// Program the Guest-Timer-Offset register.
    fn set_gt_offset(&self, value: u32);

    /// Bind the hardware to a Guest-ID.
    fn set_guest_id(&self, id: u32);

    /// Enter guest mode: from this point `mtgc0`/`mfgc0` target the bound
    /// guest's CP0 state.
    fn set_guest_mode(&self);

    /// Configure the "previous" shadow GPR set used at trap entry.
    fn set_previous_shadow_set(&self, index: u32);

    /// Configure the lowest shadow set reserved for guest use.
    fn set_lowest_gshadow(&self, index: u32);

    /// Read general-purpose register `rt` of the shadow set used at trap
    /// entry for the currently bound guest.
    fn move_from_previous_guest_gpr(&self, rt: u32) -> u32;

    /// Write general-purpose register `rt` of the shadow set used at trap
    /// entry for the currently bound guest.
    fn move_to_previous_guest_gpr(&self, rt: u32, value: u32);
}

//! Decoder and dispatch policy for guest instructions that trap into the
//! root because the hardware could not complete them unassisted (a
//! Guest-Privileged-Instruction exception).
//!
//! The trap-and-emulate discipline here is instruction-by-instruction:
//! every combination of `(opcode, co, rs, rd, sel, func)` the hardware is
//! known to raise this exception class for gets a named handler; anything
//! else is logged and ignored so the guest keeps running. Emulation never
//! aborts the guest.

use log::warn;

use crate::hal::Hal;
use crate::pcpu::HartContext;

numeric_enum_macro::numeric_enum! {
/// Major opcodes this crate cares about among the handful that can raise a
/// Guest-Privileged-Instruction exception. Any other opcode value simply
/// fails the `TryFrom` conversion, which `classify` treats as unsupported.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Opcode {
    /// `COP0` major opcode.
    Cp0 = 0b010_000,
    /// `CACHE` major opcode.
    Cache = 0b101_111,
}
}

/// `rs` field value selecting the `MTC0` COP0 sub-operation.
const RS_MTC: u32 = 0b00100;
/// `rs` field value selecting the `MFC0` COP0 sub-operation.
const RS_MFC: u32 = 0b00000;

/// `func` field value of the `WAIT` instruction, reached when `co == 1`.
const FUNC_WAIT: u32 = 0b100000;

/// Mask of the guest-writable bits of CP0 Status that `MTC0 $rt, Status` is
/// allowed to actually change; every other bit keeps the hardware's current
/// value.
const STATUS_MASK: u32 = 0x0000_FF00;

/// Mask of the `HSS` (highest implemented shadow set) field of CP0 SRSCtl,
/// bits [29:26], cleared before the value is handed back to a guest reading
/// the root's SRSCtl.
const SRSCTL_HSS_MASK: u32 = 0x3C00_0000;

/// `(register, select)` CP0 cells read directly from hardware by specific
/// emulation handlers (not part of the saved/restored snapshot).
mod root_reg {
    /// BadVAddr select 2: on a Guest-Privileged-Instruction trap, hardware
    /// deposits the faulting instruction word here instead of a faulting
    /// address.
    pub const BADVADDR_INSTR: (u32, u32) = (8, 2);
    pub const PRID: (u32, u32) = (15, 0);
    pub const SRSCTL: (u32, u32) = (12, 2);
    pub const PERFCTL0: (u32, u32) = (25, 0);
}

/// Bitfields extracted from a trapping 32-bit MIPS instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Decoded {
    pub opcode: u32,
    pub rs: u32,
    pub rt: u32,
    pub rd: u32,
    pub sel: u32,
    pub co: u32,
    pub func: u32,
}

/// Split a raw instruction word into the fields the dispatch policy keys
/// on.
pub(crate) fn decode(instr: u32) -> Decoded {
    Decoded {
        opcode: (instr >> 26) & 0x3F,
        rs: (instr >> 21) & 0x1F,
        rt: (instr >> 16) & 0x1F,
        rd: (instr >> 11) & 0x1F,
        sel: instr & 0x7,
        co: (instr >> 25) & 0x1,
        func: instr & 0x3F,
    }
}

/// A trapped operation classified from its decoded fields, independent of
/// the concrete instruction word it came from. Keeping this as a data type
/// (rather than inlining hardware access into the match) lets the dispatch
/// policy be exercised by structural tests that enumerate fields instead of
/// raw instruction values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TrappedOp {
    /// `wait`, reached with `co == 1`.
    WaitIgnored,
    /// `mtc0 $rt, Status, 0`: merge the guest-writable bits into live
    /// Status.
    StatusMerge { rt: u32 },
    /// `mtc0 $rt, SRSCtl, 3`: SRSCtl is not modeled, the write is dropped.
    SrsCtlWriteIgnored,
    /// `mtc0 $rt, Count, 0`: zero the guest's observed Count by
    /// programming the Guest-Timer-Offset register.
    CountReset,
    /// `mfc0 $rt, PRId, 0`: return a spoofed processor identity.
    PridRead { rt: u32 },
    /// `mfc0 $rt, SRSCtl, 2`: return root SRSCtl with HSS cleared.
    SrsCtlRead { rt: u32 },
    /// `mfc0 $rt, PerfCtl0, 0`: return root PerfCtl0 verbatim.
    PerfCtl0Read { rt: u32 },
    /// Any `cache` instruction.
    CacheIgnored,
    /// Every other decoded combination.
    Unsupported,
}

/// Classify a decoded instruction against the fixed trap-and-emulate table.
pub(crate) fn classify(d: Decoded) -> TrappedOp {
    match Opcode::try_from(d.opcode) {
        Ok(Opcode::Cp0) if d.co == 1 => match d.func {
            FUNC_WAIT => TrappedOp::WaitIgnored,
            _ => TrappedOp::Unsupported,
        },
        Ok(Opcode::Cp0) if d.co == 0 => match (d.rs, d.rd, d.sel) {
            (RS_MTC, 12, 0) => TrappedOp::StatusMerge { rt: d.rt },
            (RS_MTC, 12, 3) => TrappedOp::SrsCtlWriteIgnored,
            (RS_MTC, 9, 0) => TrappedOp::CountReset,
            (RS_MFC, 15, _) => TrappedOp::PridRead { rt: d.rt },
            (RS_MFC, 12, 2) => TrappedOp::SrsCtlRead { rt: d.rt },
            (RS_MFC, 25, 0) => TrappedOp::PerfCtl0Read { rt: d.rt },
            _ => TrappedOp::Unsupported,
        },
        Ok(Opcode::Cp0) => TrappedOp::Unsupported,
        Ok(Opcode::Cache) => TrappedOp::CacheIgnored,
        Err(_) => TrappedOp::Unsupported,
    }
}

impl<H: Hal> HartContext<H> {
    /// Entry point for the guest-trap vector: emulate the guest instruction
    /// that raised a Guest-Privileged-Instruction exception at `epc`.
    ///
    /// Always returns `0`; advancing guest EPC past the faulting
    /// instruction is the trap epilogue's responsibility, not this
    /// method's.
    pub fn emulate(&mut self, epc: u32) -> u32 {
        let hal = self.hal() as *const H;
        // SAFETY: `hal` outlives this call; `current` does not alias it.
        let hal = unsafe { &*hal };
        let vcpu_id = unsafe { self.current() }.map(|v| v.id());

        let instr = hal.mfc0(root_reg::BADVADDR_INSTR.0, root_reg::BADVADDR_INSTR.1);
        let op = classify(decode(instr));
        execute(hal, op, instr, epc, vcpu_id);
        0
    }
}

/// Run the HAL side effects for a classified trapped operation, logging
/// every ignored or unsupported path rather than aborting the guest.
fn execute<H: Hal>(hal: &H, op: TrappedOp, instr: u32, epc: u32, vcpu_id: Option<u32>) {
    match op {
        TrappedOp::WaitIgnored => {
            warn!("Wait emulation ignored.");
        }
        TrappedOp::StatusMerge { rt } => {
            let written = hal.move_from_previous_guest_gpr(rt);
            let current = hal.mfgc0(12, 0);
            let merged = (written & STATUS_MASK) | (current & !STATUS_MASK);
            hal.mtgc0(12, 0, merged);
        }
        TrappedOp::SrsCtlWriteIgnored => {
            warn!("Write to CP0 SRSCtl ignored");
        }
        TrappedOp::CountReset => {
            let count = hal.mfgc0(9, 0);
            let offset = (!count).wrapping_add(1);
            hal.set_gt_offset(offset);
        }
        TrappedOp::PridRead { rt } => {
            let (reg, sel) = root_reg::PRID;
            let value = (hal.mfc0(reg, sel) & !0xFF00) | 0x8000;
            hal.move_to_previous_guest_gpr(rt, value);
        }
        TrappedOp::SrsCtlRead { rt } => {
            let (reg, sel) = root_reg::SRSCTL;
            let value = hal.mfc0(reg, sel) & !SRSCTL_HSS_MASK;
            hal.move_to_previous_guest_gpr(rt, value);
        }
        TrappedOp::PerfCtl0Read { rt } => {
            let (reg, sel) = root_reg::PERFCTL0;
            let value = hal.mfc0(reg, sel);
            hal.move_to_previous_guest_gpr(rt, value);
        }
        TrappedOp::CacheIgnored => {
            warn!(
                "Cache instruction {:#x} at {:#x} not supported on VCPU {:?}",
                instr, epc, vcpu_id
            );
        }
        TrappedOp::Unsupported => {
            warn!(
                "Instruction {:#x} at {:#x} not supported on VCPU {:?}",
                instr, epc, vcpu_id
            );
        }
    }
}

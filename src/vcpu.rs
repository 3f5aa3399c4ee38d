//! The VCPU record: a passive snapshot of one guest's architectural state.
//! Nothing in this module touches hardware; [`crate::context`] and
//! [`crate::emulate`] are the only code that reads or writes a live
//! register through the [`crate::hal::Hal`] binding.

use axerrno::{AxError, AxResult};

/// Upper bound on the hardware Guest-ID space. The VZ ASE `GuestCtl1.ID`
/// field is 8 bits wide on the cores this hypervisor targets, but in
/// practice only a handful of guests are ever scheduled.
pub const MAX_GUESTS: u32 = 256;

/// Snapshot of the guest CP0 cells a supported guest kernel may legitimately
/// modify. Every field corresponds to exactly one `(register, select)` cell
/// this crate saves and restores; cells that are never saved are simply
/// absent from this struct, which makes "undefined cell" a compile-time
/// property rather than a runtime convention over a dense table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuestCp0Snapshot {
    /// CP0 (4,0): Context.
    pub context: u32,
    /// CP0 (6,0): Wired.
    pub wired: u32,
    /// CP0 (8,0): BadVAddr.
    pub bad_v_addr: u32,
    /// CP0 (11,0): Compare.
    pub compare: u32,
    /// CP0 (12,0): Status.
    pub status: u32,
    /// CP0 (12,1): IntCtl.
    pub int_ctl: u32,
    /// CP0 (12,2): SRSCtl.
    pub srs_ctl: u32,
    /// CP0 (12,3): SRSMap.
    pub srs_map: u32,
    /// CP0 (13,0): Cause.
    pub cause: u32,
    /// CP0 (14,0): EPC (guest shadow, distinct from [`Vcpu::pc`]).
    pub epc: u32,
    /// CP0 (14,2): NestedEPC.
    pub nested_epc: u32,
    /// Read from guest `(15,1)` (EBase) on save, written back to `(15,1)`
    /// on restore. See DESIGN.md's open-question log for why this is the
    /// one asymmetric cell in the set.
    pub ebase: u32,
    /// CP0 (16,0): Config.
    pub config: u32,
    /// CP0 (16,3): Config3.
    pub config3: u32,
    /// CP0 (17,0): LLAddr.
    pub ll_addr: u32,
    /// CP0 (30,0): ErrorEPC.
    pub error_epc: u32,
    /// CP0 (5,0): PageMask. Restored every `restore`, never captured by
    /// `save`: a guest is expected to re-establish it, or it is seeded once
    /// at VCPU construction and never touched again by the guest.
    pub page_mask: u32,
}

/// One guest's hardware-facing execution context.
///
/// `id` and `gprshadowset` are fixed at construction and never change for
/// the lifetime of the VCPU; everything else is mutated by
/// [`crate::context`] and [`crate::emulate`] while this VCPU is the one
/// bound to hardware.
#[derive(Debug, Clone, Copy)]
pub struct Vcpu {
    /// Hardware Guest-ID written to the Guest-ID register on restore.
    id: u32,
    /// Index of the shadow GPR set assigned to this VCPU. Used as both the
    /// "previous" and the "lowest guest" shadow set.
    gprshadowset: u32,
    /// Snapshot of guest CP0 state, valid whenever `init == false`.
    pub cp0: GuestCp0Snapshot,
    /// Accumulated Guest-CTL2 (pending guest-interrupt delivery bits);
    /// bit-or'd in on save, written back wholesale on restore.
    pub guestclt2: u32,
    /// Guest resume address (root Exception PC) as of the last save.
    pub pc: u32,
    /// `true` until the first successful `restore`: nothing is live in
    /// hardware yet, so `save` must skip this VCPU entirely.
    pub init: bool,
    /// Reserved for future timer virtualization. Never read by the current
    /// design; kept so the field survives into the eventual timer work.
    pub rootcount: u32,
}

impl Vcpu {
    /// Construct a fresh VCPU: `init = true`, all CP0 state zeroed, resume
    /// address set to `entry`.
    ///
    /// Fails if `id` is out of the hardware Guest-ID range, or if
    /// `gprshadowset` is `0` (shadow set `0` is reserved for the root
    /// context on every VZ-capable core, so it can never be a guest's
    /// assigned set).
    pub fn new(id: u32, gprshadowset: u32, entry: u32) -> AxResult<Self> {
        if id == 0 || id >= MAX_GUESTS {
            return Err(AxError::InvalidInput);
        }
        if gprshadowset == 0 {
            return Err(AxError::InvalidInput);
        }
        Ok(Self {
            id,
            gprshadowset,
            cp0: GuestCp0Snapshot::default(),
            guestclt2: 0,
            pc: entry,
            init: true,
            rootcount: 0,
        })
    }

    /// Hardware Guest-ID assigned at construction.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Shadow GPR set index assigned at construction.
    pub fn gprshadowset(&self) -> u32 {
        self.gprshadowset
    }
}

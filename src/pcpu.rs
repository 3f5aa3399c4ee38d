//! Per-hart state: which VCPU, if any, is currently bound to this hart's
//! hardware. One instance lives per physical hart; allocating and storing
//! that instance in per-hart storage is bootstrap's job, same as VCPU
//! creation.
//!
//! The binding is a lookup-only weak reference, never ownership: the VCPU
//! record is owned by whatever scheduler structure created it. That rules
//! out a safe Rust reference with a `'static` lifetime, so the slot is kept
//! as a raw pointer.

use crate::hal::Hal;
use crate::vcpu::Vcpu;

/// Per-hart context carried through every `context_save`/`context_restore`/
/// `emulate` call on one physical hart.
///
/// Not `Sync`: each hart owns exactly one `HartContext`, and the
/// single-threaded cooperative model means nothing else touches it
/// concurrently. Only the scheduler calls [`HartContext::bind`]; only this
/// crate calls the context-engine and emulation-engine methods.
pub struct HartContext<H: Hal> {
    hal: H,
    /// Lookup-only reference to the VCPU currently bound to hardware.
    /// Valid whenever `is_vcpu_executing` is `true`.
    vcpu_executing: Option<*mut Vcpu>,
    /// `false` only during early boot, before any VCPU has ever been
    /// scheduled on this hart.
    is_vcpu_executing: bool,
}

impl<H: Hal> HartContext<H> {
    /// Construct a hart context around a HAL binding, with no VCPU bound
    /// yet.
    pub const fn new(hal: H) -> Self {
        Self {
            hal,
            vcpu_executing: None,
            is_vcpu_executing: false,
        }
    }

    /// Access the HAL binding this context drives.
    pub(crate) fn hal(&self) -> &H {
        &self.hal
    }

    /// Bind a VCPU as the one executing on this hart. Called by the
    /// scheduler after it has chosen the next VCPU and before calling
    /// [`crate::context`]'s `context_restore`.
    ///
    /// # Safety
    ///
    /// `vcpu` must stay valid and must not be aliased elsewhere for as long
    /// as it remains bound. The scheduler, which owns the VCPU record,
    /// is responsible for this.
    pub unsafe fn bind(&mut self, vcpu: *mut Vcpu) {
        self.vcpu_executing = Some(vcpu);
        self.is_vcpu_executing = true;
    }

    /// Whether any VCPU has ever been bound to this hart.
    pub(crate) fn is_vcpu_executing(&self) -> bool {
        self.is_vcpu_executing
    }

    /// The VCPU currently bound to this hart, if any.
    ///
    /// # Safety
    ///
    /// The caller must not retain the reference past the point another
    /// `bind` call could retarget the slot.
    pub(crate) unsafe fn current(&mut self) -> Option<&mut Vcpu> {
        self.vcpu_executing.map(|p| unsafe { &mut *p })
    }
}

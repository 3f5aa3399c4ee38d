//! The context engine: `save` and `restore` drive the [`Hal`] binding to
//! move CP0 state between hardware and a [`Vcpu`] record.
//!
//! Both operations are infallible at the design level (HAL primitives do
//! not fail), and both run with interrupts masked on the calling hart, so
//! neither may block or be interrupted partway through.

use log::debug;

use crate::hal::Hal;
use crate::pcpu::HartContext;
use crate::vcpu::Vcpu;

impl<H: Hal> HartContext<H> {
    /// Capture the currently bound VCPU's live guest CP0 state into its
    /// record. No-op if no VCPU has ever been bound to this hart, or if the
    /// bound VCPU has never been restored (nothing is live in hardware yet
    /// in that case).
    pub fn context_save(&mut self) {
        if !self.is_vcpu_executing() {
            return;
        }
        let hal = self.hal() as *const H;
        // SAFETY: `hal` outlives this call; `current` does not alias it.
        let hal = unsafe { &*hal };
        if let Some(vcpu) = unsafe { self.current() } {
            save(hal, vcpu);
        }
    }

    /// Push the bound VCPU's record into hardware and resume it at its
    /// saved `pc`. Requires a prior [`HartContext::bind`] of the target
    /// VCPU.
    pub fn context_restore(&mut self) {
        let hal = self.hal() as *const H;
        // SAFETY: `hal` outlives this call; `current` does not alias it.
        let hal = unsafe { &*hal };
        if let Some(vcpu) = unsafe { self.current() } {
            restore(hal, vcpu);
        }
    }
}

/// Capture guest CP0 state for one VCPU into its record. Skips entirely if
/// the VCPU has never been restored.
fn save<H: Hal>(hal: &H, vcpu: &mut Vcpu) {
    if vcpu.init {
        return;
    }

    vcpu.cp0.context = hal.mfgc0(4, 0);
    vcpu.cp0.wired = hal.mfgc0(6, 0);
    vcpu.cp0.bad_v_addr = hal.mfgc0(8, 0);
    vcpu.cp0.compare = hal.mfgc0(11, 0);
    vcpu.cp0.status = hal.mfgc0(12, 0);
    vcpu.cp0.int_ctl = hal.mfgc0(12, 1);
    vcpu.cp0.srs_ctl = hal.mfgc0(12, 2);
    vcpu.cp0.srs_map = hal.mfgc0(12, 3);
    vcpu.cp0.cause = hal.mfgc0(13, 0);
    vcpu.cp0.epc = hal.mfgc0(14, 0);
    vcpu.cp0.nested_epc = hal.mfgc0(14, 2);
    // Intentional cross-select: the live register is (15,1), EBase.
    vcpu.cp0.ebase = hal.mfgc0(15, 1);
    vcpu.cp0.config = hal.mfgc0(16, 0);
    vcpu.cp0.ll_addr = hal.mfgc0(17, 0);
    vcpu.cp0.config3 = hal.mfgc0(16, 3);
    vcpu.cp0.error_epc = hal.mfgc0(30, 0);

    vcpu.guestclt2 |= hal.guest_ctl2();
    vcpu.pc = hal.epc();

    debug!("vcpu {}: context saved, pc={:#x}", vcpu.id(), vcpu.pc);
}

/// Push one VCPU's record into hardware. Order matters: shadow-set and
/// Guest-ID programming precedes any `mtgc0`, and EPC is written last so
/// `eret` resumes the guest exactly where `save` left it.
fn restore<H: Hal>(hal: &H, vcpu: &mut Vcpu) {
    hal.set_previous_shadow_set(vcpu.gprshadowset());
    hal.set_lowest_gshadow(vcpu.gprshadowset());
    hal.set_guest_id(vcpu.id());

    hal.set_guest_mode();

    if vcpu.init {
        vcpu.init = false;
    }

    hal.mtgc0(12, 0, vcpu.cp0.status);
    hal.mtgc0(4, 0, vcpu.cp0.context);
    hal.mtgc0(6, 0, vcpu.cp0.wired);
    hal.mtgc0(5, 0, vcpu.cp0.page_mask);
    hal.mtgc0(8, 0, vcpu.cp0.bad_v_addr);
    hal.mtgc0(11, 0, vcpu.cp0.compare);
    hal.mtgc0(13, 0, vcpu.cp0.cause);
    hal.mtgc0(12, 1, vcpu.cp0.int_ctl);
    hal.mtgc0(12, 2, vcpu.cp0.srs_ctl);
    hal.mtgc0(12, 3, vcpu.cp0.srs_map);
    hal.mtgc0(14, 0, vcpu.cp0.epc);
    hal.mtgc0(14, 2, vcpu.cp0.nested_epc);
    hal.mtgc0(15, 1, vcpu.cp0.ebase);
    hal.mtgc0(16, 0, vcpu.cp0.config);
    hal.mtgc0(17, 0, vcpu.cp0.ll_addr);
    hal.mtgc0(16, 3, vcpu.cp0.config3);
    hal.mtgc0(30, 0, vcpu.cp0.error_epc);

    hal.set_guest_ctl2(vcpu.guestclt2);

    hal.set_epc(vcpu.pc);

    debug!("vcpu {}: context restored, pc={:#x}", vcpu.id(), vcpu.pc);
}

/// The two's-complement negation of the elapsed root `Count` ticks since
/// `saved`, handling 32-bit wrap-around. Declared for the eventual timer
/// virtualization work; not wired into `save`/`restore` today.
pub const fn calculate_gt_offset(saved: u32, current: u32) -> u32 {
    let offset = if saved > current {
        (0xFFFF_FFFFu32 - saved).wrapping_add(current)
    } else {
        current - saved
    };
    (!offset).wrapping_add(1)
}

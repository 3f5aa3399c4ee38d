//! An in-memory [`Hal`] mock used by this crate's own tests. Every call is
//! appended to a log; guest CP0 reads are served from a programmable bank
//! keyed by `(register, select)`. This module is `#[cfg(test)]`-only and
//! never ships in the production crate.

use std::cell::RefCell;
use std::collections::HashMap;
use std::vec::Vec;

use crate::hal::Hal;

#[derive(Default)]
struct Inner {
    calls: Vec<String>,
    guest_cp0: HashMap<(u32, u32), u32>,
    root_cp0: HashMap<(u32, u32), u32>,
    guest_ctl2: u32,
    epc: u32,
    gt_offset: u32,
    guest_id: Option<u32>,
    previous_shadow_set: Option<u32>,
    lowest_gshadow: Option<u32>,
    guest_mode_entered: bool,
    shadow_gprs: HashMap<u32, u32>,
}

/// Programmable, call-logging stand-in for a real MIPS VZ board.
pub(crate) struct MockHal {
    inner: RefCell<Inner>,
}

impl MockHal {
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(Inner::default()),
        }
    }

    /// Pre-seed a guest CP0 cell as if the guest had already written it.
    pub fn seed_guest_cp0(&self, reg: u32, sel: u32, value: u32) {
        self.inner.borrow_mut().guest_cp0.insert((reg, sel), value);
    }

    /// Pre-seed a root CP0 cell (e.g. PRId, SRSCtl, PerfCtl0).
    pub fn seed_root_cp0(&self, reg: u32, sel: u32, value: u32) {
        self.inner.borrow_mut().root_cp0.insert((reg, sel), value);
    }

    /// Pre-seed the shadow-set GPR a trapping `mtc0`'s `rt` reads from.
    pub fn seed_shadow_gpr(&self, rt: u32, value: u32) {
        self.inner.borrow_mut().shadow_gprs.insert(rt, value);
    }

    /// Set the hardware `GuestCtl2` value `save` will OR into a VCPU.
    pub fn set_guest_ctl2_bank(&self, value: u32) {
        self.inner.borrow_mut().guest_ctl2 = value;
    }

    /// The ordered, human-readable call log recorded so far.
    pub fn calls(&self) -> Vec<String> {
        self.inner.borrow().calls.clone()
    }

    /// Snapshot of every guest CP0 cell touched so far (by read or write).
    pub fn guest_cp0_bank_snapshot(&self) -> HashMap<(u32, u32), u32> {
        self.inner.borrow().guest_cp0.clone()
    }

    pub fn guest_id(&self) -> Option<u32> {
        self.inner.borrow().guest_id
    }

    pub fn previous_shadow_set(&self) -> Option<u32> {
        self.inner.borrow().previous_shadow_set
    }

    pub fn lowest_gshadow(&self) -> Option<u32> {
        self.inner.borrow().lowest_gshadow
    }

    pub fn guest_mode_entered(&self) -> bool {
        self.inner.borrow().guest_mode_entered
    }

    pub fn gt_offset(&self) -> u32 {
        self.inner.borrow().gt_offset
    }
}

impl Hal for MockHal {
    fn mfgc0(&self, reg: u32, sel: u32) -> u32 {
        let mut inner = self.inner.borrow_mut();
        let value = *inner.guest_cp0.get(&(reg, sel)).unwrap_or(&0);
        inner.calls.push(format!("mfgc0({reg},{sel})"));
        value
    }

    fn mtgc0(&self, reg: u32, sel: u32, value: u32) {
        let mut inner = self.inner.borrow_mut();
        inner.guest_cp0.insert((reg, sel), value);
        inner.calls.push(format!("mtgc0({reg},{sel},{value:#x})"));
    }

    fn mfc0(&self, reg: u32, sel: u32) -> u32 {
        let mut inner = self.inner.borrow_mut();
        let value = *inner.root_cp0.get(&(reg, sel)).unwrap_or(&0);
        inner.calls.push(format!("mfc0({reg},{sel})"));
        value
    }

    fn epc(&self) -> u32 {
        let mut inner = self.inner.borrow_mut();
        let value = inner.epc;
        inner.calls.push("epc()".into());
        value
    }

    fn set_epc(&self, value: u32) {
        let mut inner = self.inner.borrow_mut();
        inner.epc = value;
        inner.calls.push(format!("set_epc({value:#x})"));
    }

    fn guest_ctl2(&self) -> u32 {
        let mut inner = self.inner.borrow_mut();
        let value = inner.guest_ctl2;
        inner.calls.push("guest_ctl2()".into());
        value
    }

    fn set_guest_ctl2(&self, value: u32) {
        let mut inner = self.inner.borrow_mut();
        inner.guest_ctl2 = value;
        inner.calls.push(format!("set_guest_ctl2({value:#x})"));
    }

    fn set_gt_offset(&self, value: u32) {
        let mut inner = self.inner.borrow_mut();
        inner.gt_offset = value;
        inner.calls.push(format!("set_gt_offset({value:#x})"));
    }

    fn set_guest_id(&self, id: u32) {
        let mut inner = self.inner.borrow_mut();
        inner.guest_id = Some(id);
        inner.calls.push(format!("set_guest_id({id})"));
    }

    fn set_guest_mode(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.guest_mode_entered = true;
        inner.calls.push("set_guest_mode()".into());
    }

    fn set_previous_shadow_set(&self, index: u32) {
        let mut inner = self.inner.borrow_mut();
        inner.previous_shadow_set = Some(index);
        inner.calls.push(format!("set_previous_shadow_set({index})"));
    }

    fn set_lowest_gshadow(&self, index: u32) {
        let mut inner = self.inner.borrow_mut();
        inner.lowest_gshadow = Some(index);
        inner.calls.push(format!("set_lowest_gshadow({index})"));
    }

    fn move_from_previous_guest_gpr(&self, rt: u32) -> u32 {
        let mut inner = self.inner.borrow_mut();
        let value = *inner.shadow_gprs.get(&rt).unwrap_or(&0);
        inner
            .calls
            .push(format!("move_from_previous_guest_gpr({rt})"));
        value
    }

    fn move_to_previous_guest_gpr(&self, rt: u32, value: u32) {
        let mut inner = self.inner.borrow_mut();
        inner.shadow_gprs.insert(rt, value);
        inner
            .calls
            .push(format!("move_to_previous_guest_gpr({rt},{value:#x})"));
    }
}

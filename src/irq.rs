//! "Channel-down" interrupt: the handler only acknowledges, masks and
//! raises a flag; the main loop does the work and re-arms the source.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::bus::Bus;
use crate::soc::evm;

/// Single-producer single-consumer event flag.
///
/// Plain load/store only, so it also works on cores without the A extension.
pub struct EventFlag(AtomicBool);

impl EventFlag {
    pub const fn new() -> Self {
        EventFlag(AtomicBool::new(false))
    }

    pub fn signal(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Clears the flag and reports whether it was set.
    pub fn take(&self) -> bool {
        if self.0.load(Ordering::Acquire) {
            self.0.store(false, Ordering::Relaxed);
            true
        } else {
            false
        }
    }
}

impl Default for EventFlag {
    fn default() -> Self {
        Self::new()
    }
}

pub static CE_EVENT: EventFlag = EventFlag::new();

/// Body of the interrupt handler.
pub fn ce_down_isr(bus: &dyn Bus, flag: &EventFlag) {
    bus.write32(evm::PENDING, 1);
    bus.write32(evm::ENABLE, 0);
    flag.signal();
}

/// Clears anything pending and unmasks the source.
pub fn arm(bus: &dyn Bus) {
    bus.write32(evm::PENDING, 1);
    bus.write32(evm::ENABLE, 1);
}

/// Unmasks the event manager line at the CPU.
#[cfg(target_arch = "riscv32")]
pub fn enable_line() {
    // VexRiscv keeps its external interrupt mask in CSR 0xBC0
    unsafe {
        core::arch::asm!("csrs 0xBC0, {0}", in(reg) 1u32 << evm::INTERRUPT);
        riscv::register::mie::set_mext();
        riscv::interrupt::enable();
    }
}

#[cfg(not(target_arch = "riscv32"))]
pub fn enable_line() {}

#[cfg(target_arch = "riscv32")]
#[export_name = "MachineExternal"]
extern "C" fn machine_external() {
    let pending: u32;
    unsafe { core::arch::asm!("csrr {0}, 0xFC0", out(reg) pending) };
    if pending & (1 << evm::INTERRUPT) != 0 {
        ce_down_isr(&crate::bus::VOLATILE, &CE_EVENT);
    }
}

//! Access to CSRs and memory-mapped regions.
//!
//! Every register poke and every DDR access in the firmware goes through
//! [`Bus`], so the same command code runs on the SoC ([`Volatile`]) and
//! against the RAM-backed fake in the host tests.

pub trait Bus {
    fn read32(&self, addr: usize) -> u32;
    fn write32(&self, addr: usize, value: u32);
    fn read8(&self, addr: usize) -> u8;
    fn write8(&self, addr: usize, value: u8);

    /// Orders the accesses before the barrier against those after it.
    fn barrier(&self) {
        core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::SeqCst);
    }
}

/// Plain volatile loads and stores at physical addresses.
pub struct Volatile;

impl Bus for Volatile {
    fn read32(&self, addr: usize) -> u32 {
        // Safe, because only addresses from the soc map end up here
        unsafe { core::ptr::read_volatile(addr as *const u32) }
    }

    fn write32(&self, addr: usize, value: u32) {
        unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
    }

    fn read8(&self, addr: usize) -> u8 {
        unsafe { core::ptr::read_volatile(addr as *const u8) }
    }

    fn write8(&self, addr: usize, value: u8) {
        unsafe { core::ptr::write_volatile(addr as *mut u8, value) }
    }
}

/// Shared handle to the single hardware bus.
pub static VOLATILE: Volatile = Volatile;


#[cfg(test)]
mod tests {
    use super::fake::FakeBus;
    use super::Bus;

    #[test]
    fn fake_bus_is_little_endian() {
        let bus = FakeBus::new();
        bus.write32(0x100, 0x1122_3344);
        assert_eq!(bus.read8(0x100), 0x44);
        assert_eq!(bus.read8(0x103), 0x11);
        assert_eq!(bus.read32(0x100), 0x1122_3344);
        assert_eq!(bus.writes_to(0x100), [0x1122_3344]);
    }
}

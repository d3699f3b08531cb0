use core::convert::Infallible;

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use embedded_hal::serial;

use crate::bus::Bus;
use crate::soc;

const UART_EV_RX: u32 = 1 << 1;

/// LiteX UART, polled.
pub struct Uart {
    bus: &'static dyn Bus,
}

impl Uart {
    pub fn new(bus: &'static dyn Bus) -> Self {
        // Drop whatever the bootloader left pending
        bus.write32(soc::uart::EV_ENABLE, 0);
        bus.write32(soc::uart::EV_PENDING, bus.read32(soc::uart::EV_PENDING));
        Self { bus }
    }

    /// Handle that leaves the event registers alone, for the logger and the
    /// panic path.
    pub const fn raw(bus: &'static dyn Bus) -> Self {
        Self { bus }
    }

    fn write_byte_blocking(&mut self, byte: u8) {
        while self.bus.read32(soc::uart::TXFULL) != 0 {}
        self.bus.write32(soc::uart::RXTX, byte as u32);
    }
}

impl serial::Read<u8> for Uart {
    type Error = Infallible;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        if self.bus.read32(soc::uart::RXEMPTY) != 0 {
            return Err(nb::Error::WouldBlock);
        }
        let byte = self.bus.read32(soc::uart::RXTX) as u8;
        self.bus.write32(soc::uart::EV_PENDING, UART_EV_RX);
        Ok(byte)
    }
}

impl serial::Write<u8> for Uart {
    type Error = Infallible;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if self.bus.read32(soc::uart::TXFULL) != 0 {
            return Err(nb::Error::WouldBlock);
        }
        self.bus.write32(soc::uart::RXTX, word as u32);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        if self.bus.read32(soc::uart::TXEMPTY) != 0 {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl embedded_hal::blocking::serial::write::Default<u8> for Uart {}

impl core::fmt::Write for Uart {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.write_byte_blocking(b'\r');
            }
            self.write_byte_blocking(byte);
        }
        Ok(())
    }
}

/// One of the LiteX down-counting timers.
pub struct Timer {
    bus: &'static dyn Bus,
    base: usize,
    pub sys_clk: u32,
}

impl Timer {
    pub fn new(bus: &'static dyn Bus, base: usize, sys_clk: u32) -> Self {
        Self { bus, base, sys_clk }
    }

    fn reg(&self, offset: usize) -> usize {
        self.base + offset
    }

    /// Loads `ticks` as a one-shot countdown and starts it.
    pub fn start_oneshot(&mut self, ticks: u32) {
        self.bus.write32(self.reg(soc::timer::EN), 0);
        self.bus.write32(self.reg(soc::timer::RELOAD), 0);
        self.bus.write32(self.reg(soc::timer::LOAD), ticks);
        self.bus.write32(self.reg(soc::timer::EN), 1);
    }

    /// Latches and returns the current counter value.
    pub fn value(&self) -> u32 {
        self.bus.write32(self.reg(soc::timer::UPDATE_VALUE), 1);
        self.bus.read32(self.reg(soc::timer::VALUE))
    }

    fn spin_ticks(&mut self, ticks: u32) {
        self.start_oneshot(ticks);
        while self.value() > 0 {}
    }
}

impl DelayMs<u32> for Timer {
    fn delay_ms(&mut self, ms: u32) {
        let ticks = (self.sys_clk / 1_000).saturating_mul(ms);
        self.spin_ticks(ticks);
    }
}

impl DelayUs<u32> for Timer {
    fn delay_us(&mut self, us: u32) {
        let ticks = (self.sys_clk / 1_000_000).saturating_mul(us);
        self.spin_ticks(ticks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::fake::FakeBus;
    use embedded_hal::serial::{Read, Write};

    #[test]
    fn uart_reads_only_when_rx_not_empty() {
        let bus = FakeBus::leak();
        let mut uart = Uart::new(bus);
        bus.preset32(soc::uart::RXEMPTY, 1);
        assert!(matches!(uart.read(), Err(nb::Error::WouldBlock)));

        bus.preset32(soc::uart::RXEMPTY, 0);
        bus.preset32(soc::uart::RXTX, b'x' as u32);
        assert_eq!(uart.read().ok(), Some(b'x'));
        assert_eq!(bus.writes_to(soc::uart::EV_PENDING).last(), Some(&UART_EV_RX));
    }

    #[test]
    fn uart_write_translates_newlines() {
        use core::fmt::Write as _;
        let bus = FakeBus::leak();
        let mut uart = Uart::new(bus);
        uart.write_str("a\n").unwrap();
        assert_eq!(bus.writes_to(soc::uart::RXTX), [b'a' as u32, b'\r' as u32, b'\n' as u32]);
        assert!(uart.write(b'z').is_ok());
    }

    #[test]
    fn delay_loads_ticks_for_milliseconds() {
        let bus = FakeBus::leak();
        let mut timer = Timer::new(bus, soc::TIMER0_BASE, 65_000_000);
        timer.delay_ms(2);
        assert_eq!(bus.writes_to(soc::TIMER0_BASE + soc::timer::LOAD), [130_000]);
    }
}

//! Board-level settings of the UberClock build.

use log::LevelFilter;
use smoltcp::wire::Ipv4Address;

use crate::soc;

pub struct BoardConfig {
    /// System clock in Hz, 0 if unknown (elapsed times then read as 0 us)
    pub clock_hz: u32,
    /// Start of the region the DDR tests run over
    pub ddr_base: usize,
    /// Bytes of DDR behind `ddr_base`; test sizes beyond it are rejected
    pub ddr_size: usize,
    pub prompt: &'static str,
    pub ip: Ipv4Address,
    pub prefix_len: u8,
    pub mac: [u8; 6],
    /// Largest UDP payload the streamer hands to the stack, header included
    pub udp_payload_max: usize,
    pub calib_polls: u32,
    pub arp_retries: u32,
    pub log_level: LevelFilter,
    pub caps: Capabilities,
}

impl BoardConfig {
    pub const fn uberclock() -> Self {
        Self {
            clock_hz: 65_000_000,
            ddr_base: soc::ubddr3::MEM_BASE,
            ddr_size: soc::ubddr3::MEM_SIZE,
            prompt: "uberClock>",
            ip: Ipv4Address([192, 168, 0, 123]),
            prefix_len: 24,
            mac: [0x02, 0x00, 0x00, 0x00, 0x00, 0xAB],
            udp_payload_max: 1400,
            calib_polls: 10_000,
            arp_retries: 500_000,
            log_level: LevelFilter::Info,
            caps: Capabilities::from_features(),
        }
    }
}

/// Which optional peripherals the gateware was built with.
///
/// Decides at startup which command tables get registered.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Capabilities {
    pub uberclock: bool,
    pub ubddr3: bool,
    pub dac: bool,
    pub evm_irq: bool,
    pub timer1: bool,
    pub leds: bool,
    pub ethernet: bool,
    pub adc: bool,
    pub ledmem: bool,
}

impl Capabilities {
    pub const fn from_features() -> Self {
        Self {
            uberclock: cfg!(feature = "uberclock"),
            ubddr3: cfg!(feature = "ubddr3"),
            dac: cfg!(feature = "dac"),
            evm_irq: cfg!(feature = "evm-irq"),
            timer1: cfg!(feature = "timer1"),
            leds: cfg!(feature = "leds"),
            ethernet: cfg!(feature = "ethernet"),
            adc: cfg!(feature = "adc"),
            ledmem: cfg!(feature = "ledmem"),
        }
    }

    pub const fn all() -> Self {
        Self {
            uberclock: true,
            ubddr3: true,
            dac: true,
            evm_irq: true,
            timer1: true,
            leds: true,
            ethernet: true,
            adc: true,
            ledmem: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            uberclock: false,
            ubddr3: false,
            dac: false,
            evm_irq: false,
            timer1: false,
            leds: false,
            ethernet: false,
            adc: false,
            ledmem: false,
        }
    }
}

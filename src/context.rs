//! Session state handed to every shell command.

use core::fmt::{self, Write};

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::serial::Read;

use crate::bus::Bus;
use crate::config::BoardConfig;
use crate::console::Terminal;
use crate::hal::{Timer, Uart};
use crate::irq::{self, EventFlag};
use crate::soc::{self, cfg_link, main as uc};
use crate::stream::UdpLink;
use crate::timing::Stopwatch;

/// Values the CORDIC datapath reported last.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct CordicState {
    pub phase: i32,
    pub magnitude: i16,
    /// "Channel-down" events handled so far
    pub events: u32,
}

pub struct Context {
    pub bus: &'static dyn Bus,
    pub uart: Uart,
    pub delay: Timer,
    pub stopwatch: Stopwatch,
    pub config: BoardConfig,
    pub cordic: CordicState,
    pub net: Option<&'static mut dyn UdpLink>,
}

impl Context {
    pub fn new(bus: &'static dyn Bus, config: BoardConfig) -> Self {
        Self {
            bus,
            uart: Uart::new(bus),
            delay: Timer::new(bus, soc::TIMER0_BASE, config.clock_hz),
            stopwatch: Stopwatch::new(bus, config.clock_hz, config.caps.timer1),
            config,
            cordic: CordicState::default(),
            net: None,
        }
    }

    pub fn with_link(mut self, link: &'static mut dyn UdpLink) -> Self {
        self.net = Some(link);
        self
    }

    /// Latches staged datapath registers into the sample clock domain.
    pub fn commit(&self) {
        self.bus.write32(cfg_link::COMMIT, 1);
    }

    pub fn busy_wait(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// LEDs to mirror progress on, when the build has them.
    pub fn leds(&self) -> Option<&'static dyn Bus> {
        if self.config.caps.leds {
            Some(self.bus)
        } else {
            None
        }
    }

    /// Puts the datapath into its power-on state and arms the
    /// channel-down interrupt.
    pub fn uberclock_init(&mut self) {
        let bus = self.bus;
        if self.config.caps.uberclock {
            bus.write32(uc::PHASE_INC_NCO, 80660);
            for (ch, addr) in uc::PHASE_INC_DOWN.iter().enumerate() {
                bus.write32(*addr, 80656 - 4 * ch as u32);
            }
            bus.write32(uc::PHASE_INC_CPU, 52429);
            bus.write32(uc::INPUT_SELECT, 0);
            bus.write32(uc::UPSAMPLER_INPUT_MUX, 0);
            for addr in uc::GAIN {
                bus.write32(addr, 0x4000_0000);
            }
            bus.write32(uc::OUTPUT_SELECT_CH1, 3);
            bus.write32(uc::OUTPUT_SELECT_CH2, 3);
            bus.write32(uc::FINAL_SHIFT, 2);
            // Ramp mode until someone asks for a capture
            bus.write32(uc::CAP_ENABLE, 0);
            self.commit();
        }
        if self.config.caps.evm_irq {
            irq::arm(bus);
            irq::enable_line();
        }
        writeln!(self, "UberClock init done.").ok();
        log::info!("datapath initialised");
    }

    pub fn uberclock_poll(&mut self) {
        self.handle_events(&irq::CE_EVENT);
    }

    /// Lets the network stack answer ARP and drain its queues between
    /// commands.
    pub fn service_net(&mut self) {
        if let Some(link) = self.net.as_mut() {
            link.service();
        }
    }

    /// Consumes a pending channel-down event and re-arms the source.
    pub fn handle_events(&mut self, flag: &EventFlag) {
        if !self.config.caps.evm_irq || !flag.take() {
            return;
        }
        self.cordic.events = self.cordic.events.wrapping_add(1);
        irq::arm(self.bus);
    }
}

impl Write for Context {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.uart.write_str(s)
    }
}

impl Terminal for Context {
    fn read_byte(&mut self) -> Option<u8> {
        self.uart.read().ok()
    }
}

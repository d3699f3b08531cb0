//! Elapsed-time measurement for the memory tests.
//!
//! Prefers TIMER1 (free for this purpose), then the cycle counter, then
//! TIMER0.

use crate::bus::Bus;
use crate::hal::Timer;
use crate::soc;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Source {
    Timer1,
    Rdcycle,
    Timer0,
}

impl Source {
    pub fn name(self) -> &'static str {
        match self {
            Source::Timer1 => "TIMER1",
            Source::Rdcycle => "RDCYCLE",
            Source::Timer0 => "TIMER0",
        }
    }
}

pub struct Stopwatch {
    source: Source,
    timer: Timer,
    start_cycles: u64,
    clock_hz: u32,
}

impl Stopwatch {
    pub fn new(bus: &'static dyn Bus, clock_hz: u32, have_timer1: bool) -> Self {
        let source = if have_timer1 {
            Source::Timer1
        } else if cfg!(target_arch = "riscv32") {
            Source::Rdcycle
        } else {
            Source::Timer0
        };
        let base = match source {
            Source::Timer1 => soc::TIMER1_BASE,
            _ => soc::TIMER0_BASE,
        };
        Self {
            source,
            timer: Timer::new(bus, base, clock_hz),
            start_cycles: 0,
            clock_hz,
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    pub fn start(&mut self) {
        match self.source {
            Source::Rdcycle => self.start_cycles = cycles(),
            Source::Timer1 | Source::Timer0 => self.timer.start_oneshot(u32::MAX),
        }
    }

    /// Ticks since [`Stopwatch::start`], saturating at `u32::MAX`.
    pub fn lap_ticks(&mut self) -> u32 {
        match self.source {
            Source::Rdcycle => {
                let elapsed = cycles().wrapping_sub(self.start_cycles);
                elapsed.min(u32::MAX as u64) as u32
            }
            Source::Timer1 | Source::Timer0 => u32::MAX - self.timer.value(),
        }
    }

    pub fn ticks_to_us(&self, ticks: u32) -> u32 {
        ticks_to_us(ticks, self.clock_hz)
    }
}

pub fn ticks_to_us(ticks: u32, clock_hz: u32) -> u32 {
    if clock_hz == 0 {
        return 0;
    }
    (ticks as u64 * 1_000_000 / clock_hz as u64) as u32
}

#[cfg(target_arch = "riscv32")]
fn cycles() -> u64 {
    loop {
        let hi = riscv::register::mcycleh::read() as u64;
        let lo = riscv::register::mcycle::read() as u64;
        if hi == riscv::register::mcycleh::read() as u64 {
            return (hi << 32) | lo;
        }
    }
}

#[cfg(not(target_arch = "riscv32"))]
fn cycles() -> u64 {
    0
}

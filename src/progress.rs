use core::fmt::Write;

use crate::bus::Bus;
use crate::soc;

const FRAMES: [char; 4] = ['|', '/', '-', '\\'];

/// Coarse progress indicator: a percentage with a rotating spinner,
/// redrawn in place every `step` units and mirrored on the LEDs.
pub struct Progress<'a> {
    step: u32,
    frame: u8,
    leds: Option<&'a dyn Bus>,
}

impl<'a> Progress<'a> {
    pub const WORD_STEP: u32 = 1 << 12;
    pub const BYTE_STEP: u32 = 1 << 14;

    pub fn new(step: u32, leds: Option<&'a dyn Bus>) -> Self {
        Self { step, frame: 0, leds }
    }

    pub fn update<W: Write>(&mut self, out: &mut W, phase: &str, i: u32, total: u32) {
        if total == 0 || (i % self.step != 0 && i != 0) {
            return;
        }
        let pct = (i as u64 * 100 / total as u64) as u32;
        let frame = FRAMES[(self.frame & 3) as usize];
        self.frame = self.frame.wrapping_add(1);
        write!(out, "\r{} {:>3}% {}", phase, pct, frame).ok();
        if let Some(bus) = self.leds {
            bus.write32(soc::leds::OUT, 1 << (self.frame & 3));
        }
    }

    pub fn done<W: Write>(&mut self, out: &mut W) {
        write!(out, "\r{:20}\r", "").ok();
        if let Some(bus) = self.leds {
            bus.write32(soc::leds::OUT, 0);
        }
    }
}

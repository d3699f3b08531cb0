//! UberDDR3 memory tests: fill a region with a generated pattern, read it
//! back, count mismatches.

use core::fmt::Write;

use crate::bus::Bus;
use crate::error::{Error, Result};
use crate::progress::Progress;
use crate::soc;
use crate::timing::Stopwatch;

/// Mismatches printed by the word test before it only counts them.
const WORD_ERRORS_SHOWN: u32 = 12;
const BYTE_ERRORS_SHOWN: u32 = 16;
const CALIB_SPIN: u32 = 50_000;

pub fn pat_const(_base: u32, _i: u32, seed: u32) -> u32 {
    seed
}

pub fn pat_xor(_base: u32, i: u32, seed: u32) -> u32 {
    seed ^ i
}

pub fn pat_addr(base: u32, i: u32, _seed: u32) -> u32 {
    base.wrapping_add(i.wrapping_mul(4))
}

pub fn pat_walk1(_base: u32, i: u32, _seed: u32) -> u32 {
    1 << (i & 31)
}

pub fn pat_walk0(base: u32, i: u32, seed: u32) -> u32 {
    !pat_walk1(base, i, seed)
}

pub fn xorshift32(state: &mut u32) -> u32 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    *state = if x == 0 { 1 } else { x };
    *state
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Pattern {
    Const,
    Xor,
    Addr,
    Prbs,
    Walk1,
    Walk0,
}

impl Pattern {
    /// Unknown or empty names fall back to the A5A5 XOR pattern.
    pub fn by_name(name: &str) -> Self {
        match name {
            "const" => Pattern::Const,
            "addr" => Pattern::Addr,
            "prbs" => Pattern::Prbs,
            "walk1" => Pattern::Walk1,
            "walk0" => Pattern::Walk0,
            _ => Pattern::Xor,
        }
    }

    pub fn pretty(self) -> &'static str {
        match self {
            Pattern::Const => "Constant 32-bit value",
            Pattern::Xor => "A5A5 XOR index",
            Pattern::Addr => "Physical address (32b)",
            Pattern::Prbs => "PRBS (xorshift32)",
            Pattern::Walk1 => "Walking 1s",
            Pattern::Walk0 => "Walking 0s",
        }
    }

    pub fn default_seed(self) -> u32 {
        match self {
            Pattern::Xor => 0xA5A5_0000,
            Pattern::Prbs => 1,
            _ => 0,
        }
    }

    pub fn generator(self, base: u32, seed: u32) -> PatternGen {
        PatternGen { pattern: self, base, seed, prbs: 1 }
    }
}

/// Produces the pattern word for successive indices.
///
/// PRBS is the only stateful pattern: its generator restarts from the seed at
/// index 0, so a fill pass and a verify pass see the same sequence.
pub struct PatternGen {
    pattern: Pattern,
    base: u32,
    seed: u32,
    prbs: u32,
}

impl PatternGen {
    pub fn value(&mut self, i: u32) -> u32 {
        let (b, s) = (self.base, self.seed);
        match self.pattern {
            Pattern::Const => pat_const(b, i, s),
            Pattern::Xor => pat_xor(b, i, s),
            Pattern::Addr => pat_addr(b, i, s),
            Pattern::Walk1 => pat_walk1(b, i, s),
            Pattern::Walk0 => pat_walk0(b, i, s),
            Pattern::Prbs => {
                if i == 0 {
                    self.prbs = if s == 0 { 1 } else { s };
                }
                xorshift32(&mut self.prbs)
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TestReport {
    pub bytes: u32,
    pub errors: u32,
    pub fill_us: u32,
    pub verify_us: u32,
}

impl TestReport {
    pub fn passed(&self) -> bool {
        self.errors == 0
    }

    pub fn print<W: Write>(&self, out: &mut W) {
        if self.passed() {
            writeln!(
                out,
                "\x1b[32;1mPASS\x1b[0m — wrote {} bytes in {} us, verified in {} us",
                self.bytes, self.fill_us, self.verify_us
            )
            .ok();
        } else {
            writeln!(
                out,
                "\x1b[31;1mFAIL\x1b[0m — {} mismatches over {} bytes",
                self.errors, self.bytes
            )
            .ok();
        }
    }
}

pub fn calibrated(bus: &dyn Bus) -> bool {
    bus.read32(soc::ubddr3::CALIB_DONE) & 1 != 0
}

/// Polls the calibration flag up to `max_polls` times.
pub fn wait_calibration(bus: &dyn Bus, max_polls: u32) -> Result<()> {
    for _ in 0..max_polls {
        if calibrated(bus) {
            return Ok(());
        }
        for _ in 0..CALIB_SPIN {
            core::hint::spin_loop();
        }
    }
    log::warn!("ddr calibration timed out after {} polls", max_polls);
    Err(Error::CalibrationTimeout)
}

/// Fill-and-verify runs over one memory region.
pub struct DdrTester<'a> {
    pub bus: &'a dyn Bus,
    pub stopwatch: &'a mut Stopwatch,
    pub leds: Option<&'a dyn Bus>,
    pub base: usize,
}

impl<'a> DdrTester<'a> {
    /// 32-bit test over `kib` KiB; the caller has waited for calibration.
    pub fn run_words<W: Write>(
        &mut self,
        out: &mut W,
        kib: u32,
        pattern: Pattern,
        seed: u32,
    ) -> TestReport {
        let base = self.base;
        let words = kib.saturating_mul(1024) / 4;
        let mut progress = Progress::new(Progress::WORD_STEP, self.leds);

        writeln!(
            out,
            "\x1b[33;1mTest:\x1b[0m {}  | \x1b[33;1mBase:\x1b[0m 0x{:08x}  | \x1b[33;1mSize:\x1b[0m {} KiB  | \x1b[33;1mSeed:\x1b[0m 0x{:08x}",
            pattern.pretty(), base, kib, seed
        )
        .ok();

        let mut gen = pattern.generator(base as u32, seed);
        self.stopwatch.start();
        progress.update(out, "Write ", 0, words);
        for i in 0..words {
            self.bus.write32(base + 4 * i as usize, gen.value(i));
            progress.update(out, "Write ", i, words);
        }
        self.bus.barrier();
        let ticks = self.stopwatch.lap_ticks();
        let fill_us = self.stopwatch.ticks_to_us(ticks);
        progress.done(out);

        let mut gen = pattern.generator(base as u32, seed);
        let mut errors = 0u32;
        self.stopwatch.start();
        progress.update(out, "Verify", 0, words);
        for i in 0..words {
            let addr = base + 4 * i as usize;
            let expected = gen.value(i);
            let got = self.bus.read32(addr);
            if got != expected {
                if errors < WORD_ERRORS_SHOWN {
                    writeln!(
                        out,
                        "\x1b[31;1mERR\x1b[0m @0x{:08x} exp={:08x} got={:08x}",
                        addr, expected, got
                    )
                    .ok();
                }
                errors += 1;
            }
            progress.update(out, "Verify", i, words);
        }
        let ticks = self.stopwatch.lap_ticks();
        let verify_us = self.stopwatch.ticks_to_us(ticks);
        progress.done(out);

        TestReport {
            bytes: words * 4,
            errors,
            fill_us,
            verify_us,
        }
    }

    /// Byte-lane test with `(i ^ 0xA5)` as the pattern.
    pub fn run_bytes<W: Write>(&mut self, out: &mut W, kib: u32) -> TestReport {
        let base = self.base;
        let bytes = kib.saturating_mul(1024);
        let mut progress = Progress::new(Progress::BYTE_STEP, self.leds);
        let expected = |i: u32| (i ^ 0xA5) as u8;

        self.stopwatch.start();
        progress.update(out, "Write ", 0, bytes);
        for i in 0..bytes {
            self.bus.write8(base + i as usize, expected(i));
            progress.update(out, "Write ", i, bytes);
        }
        self.bus.barrier();
        let ticks = self.stopwatch.lap_ticks();
        let fill_us = self.stopwatch.ticks_to_us(ticks);
        progress.done(out);

        let mut errors = 0u32;
        self.stopwatch.start();
        progress.update(out, "Verify", 0, bytes);
        for i in 0..bytes {
            let addr = base + i as usize;
            let got = self.bus.read8(addr);
            if got != expected(i) {
                if errors < BYTE_ERRORS_SHOWN {
                    writeln!(
                        out,
                        "\x1b[31;1mERR\x1b[0m @0x{:08x} exp={:02x} got={:02x}",
                        addr,
                        expected(i),
                        got
                    )
                    .ok();
                }
                errors += 1;
            }
            progress.update(out, "Verify", i, bytes);
        }
        let ticks = self.stopwatch.lap_ticks();
        let verify_us = self.stopwatch.ticks_to_us(ticks);
        progress.done(out);

        TestReport {
            bytes,
            errors,
            fill_us,
            verify_us,
        }
    }
}

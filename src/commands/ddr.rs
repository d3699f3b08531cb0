use core::fmt::Write;

use super::next_arg;
use crate::console::{puts_help_header, Command, Table};
use crate::context::Context;
use crate::ddr::{self, DdrTester, Pattern, TestReport};
use crate::error::{Error, Result};
use crate::parse::{parse_kib, parse_u32};
use crate::soc;

const DEFAULT_KIB: u32 = 4;
const LANE_TAGS: [u32; 8] = [
    0x1111_1111,
    0x2222_2222,
    0x3333_3333,
    0x4444_4444,
    0x5555_5555,
    0x6666_6666,
    0x7777_7777,
    0x8888_8888,
];

pub static TABLE: Table<Context> = Table {
    title: "DDR commands",
    commands: &[
        Command { name: "help_ddr", handler: help_ddr, help: "DDR command list" },
        Command { name: "ddrinfo", handler: ddrinfo, help: "Print DDR base + calib CSR state" },
        Command { name: "ddrwait", handler: ddrwait, help: "Wait for UberDDR3 calibration" },
        Command { name: "ddrprobe", handler: ddrprobe, help: "One 32-bit store/load at base" },
        Command { name: "ddrbyte", handler: ddrbyte, help: "Byte-lane sanity (0..31 at base)" },
        Command { name: "ddrtest", handler: ddrtest, help: "32-bit test, A5A5^index" },
        Command { name: "ddrtestb", handler: ddrtestb, help: "Byte test, A5^index" },
        Command { name: "ddrmap", handler: ddrmap, help: "Lane map of one 256-bit beat" },
        Command { name: "ddrpat", handler: ddrpat, help: "Pattern test" },
        Command { name: "timertest", handler: timertest, help: "100 ms timer sanity" },
        Command { name: "timeinfo", handler: timeinfo, help: "Show timing source and CLK_HZ" },
    ],
};

fn help_ddr(ctx: &mut Context, _args: &str) -> Result<()> {
    puts_help_header(ctx, "DDR commands");
    for line in [
        "  ddrinfo             - Print DDR base + calib CSR state",
        "  ddrwait             - Wait for UberDDR3 calibration to complete",
        "  ddrprobe            - One 32-bit store/load at base",
        "  ddrbyte             - Byte-lane sanity (0..31 at base)",
        "  ddrtest  [KiB]      - 32-bit test, pattern=A5A5^index (default 4 KiB)",
        "  ddrtestb [KiB]      - Byte test,  pattern=A5^index     (default 4 KiB)",
        "  ddrpat   [size] [pattern] [seed]  - Pattern test:",
        "       patterns: a5xor(default) | const | addr | prbs | walk1 | walk0",
        "       size suffix: K/M/G (e.g., 4M). Seed is optional.",
        "  timertest           - 100 ms sanity (prints source, ticks, us)",
        "  timeinfo            - Show timing source and CLK_HZ",
    ] {
        writeln!(ctx, "{}", line).ok();
    }
    Ok(())
}

fn ddrinfo(ctx: &mut Context, _args: &str) -> Result<()> {
    puts_help_header(ctx, "DDR Info");
    writeln!(ctx, "MAIN_RAM_BASE: 0x{:08x}", soc::MAIN_RAM_BASE).ok();
    let calib = ctx.bus.read32(soc::ubddr3::CALIB_DONE);
    writeln!(ctx, "UBDDR3 calib CSR present: {}", calib).ok();
    Ok(())
}

/// Waits for calibration, printing the failure banner on timeout.
fn calibrated(ctx: &mut Context) -> bool {
    match ddr::wait_calibration(ctx.bus, ctx.config.calib_polls) {
        Ok(()) => true,
        Err(_) => {
            writeln!(ctx, "\x1b[31;1mCalibration TIMEOUT\x1b[0m").ok();
            false
        }
    }
}

fn ddrwait(ctx: &mut Context, _args: &str) -> Result<()> {
    puts_help_header(ctx, "DDR Calibration");
    write!(ctx, "Waiting for DDR calibration... ").ok();
    if ddr::wait_calibration(ctx.bus, ctx.config.calib_polls).is_ok() {
        writeln!(ctx, "\x1b[32;1mOK\x1b[0m").ok();
    } else {
        writeln!(ctx, "\x1b[31;1mTIMEOUT\x1b[0m").ok();
    }
    Ok(())
}

fn ddrprobe(ctx: &mut Context, _args: &str) -> Result<()> {
    puts_help_header(ctx, "DDR 32-bit Probe");
    let base = ctx.config.ddr_base;
    ctx.bus.write32(base, 0x1122_3344);
    ctx.bus.barrier();
    writeln!(ctx, "Wrote  0x11223344 @ 0x{:08x}", base).ok();
    let got = ctx.bus.read32(base);
    writeln!(ctx, "Read   0x{:08x}", got).ok();
    Ok(())
}

fn ddrbyte(ctx: &mut Context, _args: &str) -> Result<()> {
    puts_help_header(ctx, "DDR Byte-Lane Sanity (first 32 bytes)");
    if !calibrated(ctx) {
        return Ok(());
    }
    let (bus, base) = (ctx.bus, ctx.config.ddr_base);
    for i in 0..32u8 {
        bus.write8(base + i as usize, i);
    }
    bus.barrier();
    for i in 0..32usize {
        let sep = if i % 16 == 15 { "\n" } else { " " };
        write!(ctx, "{:02x}{}", bus.read8(base + i), sep).ok();
    }
    Ok(())
}

/// Optional size argument in KiB, 4 KiB when absent. Sizes past the end of
/// the DDR region are refused before anything is written.
fn size_arg(ctx: &Context, args: &mut &str) -> Result<u32> {
    let kib = match next_arg(args) {
        "" => DEFAULT_KIB,
        token => parse_kib(token)?,
    };
    let max = ctx.config.ddr_size / 1024;
    if kib as usize > max {
        return Err(Error::OutOfRange { what: "KiB", max: max as u32 });
    }
    Ok(kib)
}

fn run_words(ctx: &mut Context, kib: u32, pattern: Pattern, seed: u32) -> TestReport {
    let leds = ctx.leds();
    let mut tester = DdrTester {
        bus: ctx.bus,
        stopwatch: &mut ctx.stopwatch,
        leds,
        base: ctx.config.ddr_base,
    };
    let report = tester.run_words(&mut ctx.uart, kib, pattern, seed);
    report.print(&mut ctx.uart);
    report
}

fn ddrtest(ctx: &mut Context, mut args: &str) -> Result<()> {
    let kib = size_arg(ctx, &mut args)?;
    puts_help_header(ctx, "DDR 32-bit Test (A5A5^index)");
    if calibrated(ctx) {
        run_words(ctx, kib, Pattern::Xor, Pattern::Xor.default_seed());
    }
    Ok(())
}

fn ddrtestb(ctx: &mut Context, mut args: &str) -> Result<()> {
    let kib = size_arg(ctx, &mut args)?;
    puts_help_header(ctx, "DDR Byte Test (A5^index)");
    if !calibrated(ctx) {
        return Ok(());
    }
    let leds = ctx.leds();
    let mut tester = DdrTester {
        bus: ctx.bus,
        stopwatch: &mut ctx.stopwatch,
        leds,
        base: ctx.config.ddr_base,
    };
    let report = tester.run_bytes(&mut ctx.uart, kib);
    report.print(&mut ctx.uart);
    Ok(())
}

fn print_lanes(ctx: &mut Context, label: &str, beat: usize) {
    let bus = ctx.bus;
    for i in 0..LANE_TAGS.len() {
        bus.write32(beat + 4 * i, 0);
    }
    bus.barrier();
    for (i, tag) in LANE_TAGS.iter().enumerate() {
        bus.write32(beat + 4 * i, *tag);
        bus.barrier();
    }
    let mut read = [0u32; 8];
    for (i, word) in read.iter_mut().enumerate() {
        *word = bus.read32(beat + 4 * i);
    }
    write!(ctx, "{}[0..7] = ", label).ok();
    for word in read {
        write!(ctx, "{:02x} ", word >> 28).ok();
    }
    writeln!(ctx).ok();
}

fn ddrmap(ctx: &mut Context, _args: &str) -> Result<()> {
    puts_help_header(ctx, "DDR Lane Map (one 256-bit beat @ base)");
    let base = ctx.config.ddr_base;
    writeln!(ctx, "Wrote lanes:  [0..7] = 11 22 33 44 55 66 77 88").ok();
    print_lanes(ctx, "Read lanes :  ", base);
    print_lanes(ctx, "Read lanes+1: ", base + 32);
    Ok(())
}

fn ddrpat(ctx: &mut Context, mut args: &str) -> Result<()> {
    let kib = size_arg(ctx, &mut args)?;
    let pattern = Pattern::by_name(next_arg(&mut args));
    let seed = match next_arg(&mut args) {
        "" => pattern.default_seed(),
        token => parse_u32(token)?,
    };
    puts_help_header(ctx, "DDR Pattern Test");
    if calibrated(ctx) {
        run_words(ctx, kib, pattern, seed);
    }
    Ok(())
}

fn timertest(ctx: &mut Context, _args: &str) -> Result<()> {
    puts_help_header(ctx, "Timer sanity");
    ctx.stopwatch.start();
    ctx.busy_wait(100);
    let ticks = ctx.stopwatch.lap_ticks();
    let us = ctx.stopwatch.ticks_to_us(ticks);
    writeln!(
        ctx,
        "source={}  CLK_HZ={}  ticks={}  -> ~{} us (expected ~100000 us)",
        ctx.stopwatch.source().name(),
        ctx.stopwatch.clock_hz(),
        ticks,
        us
    )
    .ok();
    Ok(())
}

fn timeinfo(ctx: &mut Context, _args: &str) -> Result<()> {
    puts_help_header(ctx, "Timer info");
    writeln!(ctx, "Timing source: {}", ctx.stopwatch.source().name()).ok();
    writeln!(ctx, "CLK_HZ      : {}", ctx.stopwatch.clock_hz()).ok();
    if ctx.config.caps.timer1 {
        writeln!(ctx, "TIMER1 base : 0x{:08x}", soc::TIMER1_BASE).ok();
    }
    writeln!(ctx, "TIMER0 base : 0x{:08x}", soc::TIMER0_BASE).ok();
    Ok(())
}

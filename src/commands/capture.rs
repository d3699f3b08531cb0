//! UberDDR3 S2MM capture engine and the UDP region streamer.

use core::fmt::Write;

use super::uberclock::{mode_name, set_cap_enable};
use super::{next_arg, required};
use crate::console::{puts_help_header, Command, Table};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::parse::{parse_below, parse_ipv4, parse_u32, parse_u64};
use crate::soc::{main as uc, ubddr3};
use crate::stream::{stream_region, StreamRequest};

const DEFAULT_BEATS: u32 = 256;

pub static TABLE: Table<Context> = Table {
    title: "UberDDR3/S2MM commands",
    commands: &[
        Command { name: "ub_help", handler: ub_help, help: "UberDDR3/S2MM help" },
        Command { name: "ub_info", handler: ub_info, help: "Show UBDDR3 info/state" },
        Command { name: "ub_mode", handler: ub_mode, help: "Show current cap_enable mode" },
        Command { name: "ub_setmode", handler: ub_setmode, help: "Set cap_enable (0=ramp,1=capture)" },
        Command { name: "ub_start", handler: ub_start, help: "Start S2MM using current mode" },
        Command { name: "ub_ramp", handler: ub_ramp, help: "Force ramp mode then start S2MM" },
        Command { name: "ub_cap", handler: ub_cap, help: "Force capture mode then start S2MM" },
        Command { name: "ub_wait", handler: ub_wait, help: "Wait until DMA done" },
        Command { name: "ub_hexdump", handler: ub_hexdump, help: "Hexdump DDR memory" },
        Command { name: "ub_send", handler: ub_send, help: "Send DDR memory region via UDP" },
    ],
};

/// Transfer width of the S2MM engine, as encoded in `dma_size`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TransferSize {
    Bus = 0,
    W32 = 1,
    W16 = 2,
    W8 = 3,
}

impl TransferSize {
    /// Unknown names select the full bus width.
    pub fn by_name(name: &str) -> Self {
        match name {
            "32" => TransferSize::W32,
            "16" => TransferSize::W16,
            "8" => TransferSize::W8,
            _ => TransferSize::Bus,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TransferSize::Bus => "bus",
            TransferSize::W32 => "32",
            TransferSize::W16 => "16",
            TransferSize::W8 => "8",
        }
    }
}

fn ub_help(ctx: &mut Context, _args: &str) -> Result<()> {
    puts_help_header(ctx, "UberDDR3/S2MM commands");
    for line in [
        "  ub_info",
        "      Print DDR calibration state and CSR base.",
        "  ub_mode",
        "      Print current capture mode (cap_enable).",
        "  ub_setmode <0|1>",
        "      Set cap_enable (0=ramp, 1=capture design) and commit.",
        "  ub_ramp <addr_hex> [beats] [size]",
        "      FORCE ramp mode (cap_enable=0), then start S2MM into DDR.",
        "  ub_cap  <addr_hex> [beats] [size]",
        "      FORCE capture mode (cap_enable=1), then start S2MM into DDR.",
        "  ub_start <addr_hex> [beats] [size]",
        "      Start S2MM using CURRENT cap_enable mode.",
        "  ub_wait",
        "      Poll until DMA not busy; print error if any.",
        "  ub_hexdump <addr_hex> <bytes>",
        "      Dump memory to verify write.",
        "  ub_send <addr_hex> <bytes> <dst_ip> <dst_port>",
        "      Send DDR memory region via UDP to PC.",
        "      Example: ub_send 0xA0000000 8192 192.168.0.2 5000",
        "",
    ] {
        writeln!(ctx, "{}", line).ok();
    }
    Ok(())
}

fn ub_info(ctx: &mut Context, _args: &str) -> Result<()> {
    let calib = ctx.bus.read32(ubddr3::CALIB_DONE);
    writeln!(
        ctx,
        "UBDDR3 CSR base: 0x{:08x}  calib_done: {}  (UBDDR3_MEM_BASE: 0x{:08x})",
        ubddr3::BASE,
        calib,
        ubddr3::MEM_BASE
    )
    .ok();
    Ok(())
}

fn capture_mode(ctx: &Context) -> u32 {
    if ctx.config.caps.uberclock {
        ctx.bus.read32(uc::CAP_ENABLE) & 1
    } else {
        0
    }
}

fn ub_mode(ctx: &mut Context, _args: &str) -> Result<()> {
    if !ctx.config.caps.uberclock {
        return Err(Error::NotPresent("cap_enable CSR"));
    }
    let v = capture_mode(ctx);
    writeln!(ctx, "cap_enable = {} ({})", v, mode_name(v)).ok();
    Ok(())
}

fn ub_setmode(ctx: &mut Context, args: &str) -> Result<()> {
    if !ctx.config.caps.uberclock {
        return Err(Error::NotPresent("cap_enable CSR"));
    }
    set_cap_enable(ctx, args)
}

/// Programs the S2MM engine and kicks off one transfer.
pub fn dma_start(ctx: &Context, addr: u64, beats: u32, size: TransferSize) {
    let bus = ctx.bus;
    bus.write32(ubddr3::DMA_INC, 1);
    bus.write32(ubddr3::DMA_SIZE, size as u32);
    bus.write32(ubddr3::DMA_ADDR0, addr as u32);
    bus.write32(ubddr3::DMA_ADDR1, (addr >> 32) as u32);
    bus.write32(ubddr3::RAMP_LEN, beats);
    bus.write32(ubddr3::DMA_REQ, 1);
}

fn ub_start(ctx: &mut Context, mut args: &str) -> Result<()> {
    let addr = parse_u64(required(&mut args, "addr_hex")?)?;
    let beats = match next_arg(&mut args) {
        "" => DEFAULT_BEATS,
        token => parse_u32(token)?,
    };
    let size = TransferSize::by_name(next_arg(&mut args));
    let mode = capture_mode(ctx);

    writeln!(
        ctx,
        "S2MM start: mode={} addr=0x{:08x}_{:08x} beats={} size={}",
        if mode != 0 { "CAPTURE" } else { "RAMP" },
        addr >> 32,
        addr & 0xffff_ffff,
        beats,
        size.name()
    )
    .ok();

    if ctx.config.caps.uberclock {
        ctx.bus.write32(uc::CAP_BEATS, beats);
        ctx.commit();
    }
    dma_start(ctx, addr, beats, size);
    log::debug!("s2mm started at {:#x}, {} beats", addr, beats);
    Ok(())
}

fn force_mode(ctx: &mut Context, capture: bool) {
    if ctx.config.caps.uberclock {
        ctx.bus.write32(uc::CAP_ENABLE, capture as u32);
        ctx.commit();
    }
}

fn ub_ramp(ctx: &mut Context, args: &str) -> Result<()> {
    force_mode(ctx, false);
    ub_start(ctx, args)
}

fn ub_cap(ctx: &mut Context, args: &str) -> Result<()> {
    force_mode(ctx, true);
    ub_start(ctx, args)
}

fn ub_wait(ctx: &mut Context, _args: &str) -> Result<()> {
    write!(ctx, "Waiting for DMA ... ").ok();
    while ctx.bus.read32(ubddr3::DMA_BUSY) != 0 {}
    ctx.bus.barrier();
    writeln!(ctx, "done.").ok();
    if ctx.bus.read32(ubddr3::DMA_ERR) != 0 {
        writeln!(ctx, "DMA error flag is set!").ok();
    }
    Ok(())
}

fn ub_hexdump(ctx: &mut Context, mut args: &str) -> Result<()> {
    let addr = parse_u64(required(&mut args, "addr_hex")?)? as usize;
    let len = parse_u32(required(&mut args, "bytes")?)? as usize;
    let bus = ctx.bus;
    for i in 0..len {
        if i % 16 == 0 {
            write!(ctx, "\n{:08x}: ", (addr + i) as u32).ok();
        }
        write!(ctx, "{:02x} ", bus.read8(addr + i)).ok();
    }
    writeln!(ctx).ok();
    Ok(())
}

fn ub_send(ctx: &mut Context, mut args: &str) -> Result<()> {
    let addr = parse_u64(required(&mut args, "addr_hex")?)?;
    let total = parse_u32(required(&mut args, "bytes")?)?;
    let dst = parse_ipv4(required(&mut args, "dst_ip")?)?;
    let port = parse_below(required(&mut args, "dst_port")?, 1 << 16, "dst_port")? as u16;
    if total == 0 {
        return Err(Error::Zero("bytes"));
    }
    if port == 0 {
        return Err(Error::Zero("dst_port"));
    }

    writeln!(
        ctx,
        "UDP send: addr=0x{:08x}_{:08x} bytes={} dst={}:{}",
        addr >> 32,
        addr & 0xffff_ffff,
        total,
        dst,
        port
    )
    .ok();

    let req = StreamRequest {
        addr: addr as usize,
        total,
        dst,
        dst_port: port,
        src_port: port,
        payload_max: ctx.config.udp_payload_max,
        arp_retries: ctx.config.arp_retries,
    };
    let link = ctx.net.take().ok_or(Error::NotPresent("ethernet"))?;
    let bus = ctx.bus;
    let result = stream_region(&mut *link, bus, &req, ctx);
    ctx.net = Some(link);
    result.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::Shell;
    use crate::config::Capabilities;
    use crate::soc::cfg_link;
    use crate::stream::testing::RecordingLink;
    use crate::bus::Bus;

    fn shell() -> Shell {
        Shell::new(Capabilities::all())
    }

    #[test]
    fn start_programs_the_engine() {
        let mut shell = shell();
        let out = shell.run("ub_start 0xA0001000 64 16");
        assert_eq!(
            out,
            "S2MM start: mode=RAMP addr=0x00000000_a0001000 beats=64 size=16\n"
        );
        assert_eq!(
            shell.reg_writes(),
            [
                (uc::CAP_BEATS, 64),
                (cfg_link::COMMIT, 1),
                (ubddr3::DMA_INC, 1),
                (ubddr3::DMA_SIZE, 2),
                (ubddr3::DMA_ADDR0, 0xA000_1000),
                (ubddr3::DMA_ADDR1, 0),
                (ubddr3::RAMP_LEN, 64),
                (ubddr3::DMA_REQ, 1),
            ]
        );
    }

    #[test]
    fn start_defaults_to_256_beats_at_bus_width() {
        let mut shell = shell();
        shell.run("ub_start 0xA0000000");
        assert_eq!(shell.bus.writes_to(ubddr3::RAMP_LEN), [256]);
        assert_eq!(shell.bus.writes_to(ubddr3::DMA_SIZE), [0]);
        assert!(shell.run("ub_start").starts_with("Error: missing argument <addr_hex>"));
    }

    #[test]
    fn cap_forces_capture_mode_first() {
        let mut shell = shell();
        let out = shell.run("ub_cap 0xA0000000");
        assert!(out.starts_with("S2MM start: mode=CAPTURE"));
        assert_eq!(shell.reg_writes()[0], (uc::CAP_ENABLE, 1));
        assert!(shell.run("ub_ramp 0xA0000000").starts_with("S2MM start: mode=RAMP"));
        assert_eq!(shell.run("ub_mode"), "cap_enable = 0 (RAMP->DDR)\n");
    }

    #[test]
    fn wait_reports_dma_errors() {
        let mut shell = shell();
        shell.bus.preset32(ubddr3::DMA_ERR, 1);
        assert_eq!(
            shell.run("ub_wait"),
            "Waiting for DMA ... done.\nDMA error flag is set!\n"
        );
    }

    #[test]
    fn hexdump_prints_sixteen_per_row() {
        let mut shell = shell();
        for i in 0..20u32 {
            shell.bus.write8(0xA000_0000 + i as usize, i as u8);
        }
        let out = shell.run("ub_hexdump 0xA0000000 18");
        assert!(out.starts_with("\na0000000: 00 01 02"));
        assert!(out.contains("0f \na0000010: 10 11 \n"));
    }

    #[test]
    fn send_without_link_is_refused() {
        let mut shell = shell();
        assert_eq!(
            shell.run("ub_send 0xA0000000 64 192.168.0.2 5000"),
            "UDP send: addr=0x00000000_a0000000 bytes=64 dst=192.168.0.2:5000\n\
             Error: ethernet not present in this build\n"
        );
        assert_eq!(
            shell.run("ub_send 0xA0000000 64 192.168.0 5000"),
            "Error: bad dst_ip format (use a.b.c.d)\n"
        );
        assert_eq!(
            shell.run("ub_send 0xA0000000 0 192.168.0.2 5000"),
            "Error: bytes must be >= 1\n"
        );
    }

    #[test]
    fn send_rejects_port_zero() {
        let mut shell = shell();
        let link: &'static mut RecordingLink = Box::leak(Box::new(RecordingLink::new()));
        shell.ctx.net = Some(link);
        assert_eq!(
            shell.run("ub_send 0xA0000000 64 192.168.0.2 0"),
            "Error: dst_port must be >= 1\n"
        );
        assert_eq!(
            shell.run("ub_send 0xA0000000 64 192.168.0.2 65536"),
            "Error: dst_port must be 0..65535\n"
        );
        assert!(shell.reg_writes().is_empty());
    }

    #[test]
    fn send_streams_through_the_link() {
        let mut shell = shell();
        let link: &'static mut RecordingLink = Box::leak(Box::new(RecordingLink::new()));
        shell.ctx.net = Some(link);

        let out = shell.run("ub_send 0xA0000000 8192 192.168.0.2 5000");
        assert!(out.contains("ARP resolve 192.168.0.2 ... ok\n"));
        assert!(out.ends_with("ub_send done: 8192 bytes in 6 packets\n"));
        assert!(shell.ctx.net.is_some());

        // The link survives for the next transfer
        let out = shell.run("ub_send 0xA0000000 100 192.168.0.2 5000");
        assert!(out.ends_with("ub_send done: 100 bytes in 1 packets\n"));
    }
}

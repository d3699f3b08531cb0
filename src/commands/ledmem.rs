use core::fmt::Write;

use super::required;
use crate::console::{Command, Table};
use crate::context::Context;
use crate::error::Result;
use crate::parse::{parse_below, parse_u32};
use crate::soc::ledmem;

pub static TABLE: Table<Context> = Table {
    title: "LEDMem commands",
    commands: &[
        Command { name: "ledmem", handler: ledmem_demo, help: "AXI-Lite LEDMem demo" },
        Command { name: "readmem", handler: readmem, help: "Read back all four RAM words" },
        Command { name: "pokeled", handler: pokeled, help: "Write word <v> to LEDMem index <i> (0-3)" },
        Command { name: "peekled", handler: peekled, help: "Read word from LEDMem index <i>" },
    ],
};

fn word(index: u32) -> usize {
    ledmem::BASE + 4 * index as usize
}

/// Bit `i` of `pattern` goes to RAM word `i`, which drives LED `i`.
fn write_pattern(ctx: &Context, pattern: u32) {
    for i in 0..ledmem::WORDS as u32 {
        ctx.bus.write32(word(i), (pattern >> i) & 1);
    }
}

fn index_arg(args: &mut &str) -> Result<u32> {
    parse_below(required(args, "index")?, ledmem::WORDS as u32, "index")
}

fn ledmem_demo(ctx: &mut Context, _args: &str) -> Result<()> {
    writeln!(ctx, "LEDMem demo (AXI-Lite @ 0x{:08X})...", ledmem::BASE).ok();
    for pattern in 0..16 {
        write_pattern(ctx, pattern);
        ctx.busy_wait(200);
    }
    for i in 0..ledmem::WORDS {
        write_pattern(ctx, 1 << i);
        ctx.busy_wait(200);
    }
    Ok(())
}

fn readmem(ctx: &mut Context, _args: &str) -> Result<()> {
    writeln!(ctx, "Reading back 4-word RAM @ 0x{:08X}:", ledmem::BASE).ok();
    for i in 0..ledmem::WORDS as u32 {
        let v = ctx.bus.read32(word(i));
        writeln!(ctx, "  ram[{}] = 0x{:08X}", i, v).ok();
    }
    Ok(())
}

fn pokeled(ctx: &mut Context, mut args: &str) -> Result<()> {
    let index = index_arg(&mut args)?;
    let v = parse_u32(required(&mut args, "value")?)?;
    ctx.bus.write32(word(index), v);
    writeln!(ctx, "pokeled: wrote 0x{:08X} to ledmem[{}]", v, index).ok();
    Ok(())
}

fn peekled(ctx: &mut Context, mut args: &str) -> Result<()> {
    let index = index_arg(&mut args)?;
    let v = ctx.bus.read32(word(index));
    writeln!(ctx, "peekled: ledmem[{}] = 0x{:08X}", index, v).ok();
    Ok(())
}

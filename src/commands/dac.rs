use core::fmt::Write;

use super::{next_arg, required};
use crate::console::{Command, Table};
use crate::context::Context;
use crate::error::Result;
use crate::parse::{parse_below, parse_u32};
use crate::soc::main as uc;

const DAC_MASK: u32 = 0x3FFF;

pub static TABLE: Table<Context> = Table {
    title: "DAC commands",
    commands: &[
        Command { name: "dac1", handler: dac1, help: "Set DAC1 output (0-0x3FFF)" },
        Command { name: "dac2", handler: dac2, help: "Set DAC2 output (0-0x3FFF)" },
        Command { name: "cordic_phase", handler: cordic_phase, help: "Set CORDIC phase (0..524287)" },
    ],
};

/// Latches a 14-bit code into one converter with a write-enable pulse.
fn set_dac(ctx: &mut Context, n: u8, data: usize, wrt_en: usize, mut args: &str) -> Result<()> {
    let v = parse_u32(required(&mut args, "value")?)? & DAC_MASK;
    ctx.bus.write32(data, v);
    ctx.bus.write32(wrt_en, 1);
    ctx.bus.write32(wrt_en, 0);
    writeln!(ctx, "DAC{} set to 0x{:04X}", n, v).ok();
    Ok(())
}

fn dac1(ctx: &mut Context, args: &str) -> Result<()> {
    set_dac(ctx, 1, uc::DAC1_DATA, uc::DAC1_WRT_EN, args)
}

fn dac2(ctx: &mut Context, args: &str) -> Result<()> {
    set_dac(ctx, 2, uc::DAC2_DATA, uc::DAC2_WRT_EN, args)
}

fn cordic_phase(ctx: &mut Context, mut args: &str) -> Result<()> {
    let p = parse_below(next_arg(&mut args), 1 << 19, "phase")?;
    ctx.bus.write32(uc::CORDIC_PHASE, p);
    writeln!(ctx, "Phase changed to {}", p).ok();
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::commands::testing::Shell;
    use crate::config::Capabilities;
    use crate::soc::main as uc;

    #[test]
    fn dac_value_is_masked_and_latched() {
        let mut shell = Shell::new(Capabilities::all());
        assert_eq!(shell.run("dac1 0xFFFF"), "DAC1 set to 0x3FFF\n");
        assert_eq!(
            shell.reg_writes(),
            [(uc::DAC1_DATA, 0x3FFF), (uc::DAC1_WRT_EN, 1), (uc::DAC1_WRT_EN, 0)]
        );
        assert_eq!(shell.run("dac2 291"), "DAC2 set to 0x0123\n");
        assert_eq!(shell.bus.writes_to(uc::DAC2_DATA), [0x123]);
    }

    #[test]
    fn dac_needs_a_number() {
        let mut shell = Shell::new(Capabilities::all());
        assert_eq!(shell.run("dac1"), "Error: missing argument <value>\n");
        assert_eq!(shell.run("dac1 x"), "Error: invalid number\n");
        assert!(shell.reg_writes().is_empty());
    }

    #[test]
    fn cordic_phase_is_range_checked() {
        let mut shell = Shell::new(Capabilities::all());
        assert_eq!(shell.run("cordic_phase 1000"), "Phase changed to 1000\n");
        assert_eq!(shell.bus.writes_to(uc::CORDIC_PHASE), [1000]);
        assert_eq!(
            shell.run("cordic_phase 524288"),
            "Error: phase must be 0..524287\n"
        );
        assert!(shell.reg_writes().is_empty());
    }
}

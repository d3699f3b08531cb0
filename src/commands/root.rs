use core::fmt::Write;

use super::{enabled_tables, required};
use crate::console::{print_table, puts_help_header, Command, Table};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::parse::parse_u32;
use crate::soc;

pub static TABLE: Table<Context> = Table {
    title: "Top-level commands",
    commands: &[
        Command { name: "help", handler: help, help: "Top-level help and command list" },
        Command { name: "reboot", handler: reboot, help: "Reboot CPU" },
        Command { name: "led", handler: led_demo, help: "LED demo" },
        Command { name: "leds", handler: leds, help: "Set the LED register" },
    ],
};

fn help(ctx: &mut Context, _args: &str) -> Result<()> {
    puts_help_header(ctx, "Top-level help");
    writeln!(ctx, "  help_uc             - UberClock command list").ok();
    writeln!(ctx, "  ub_help             - UberDDR3/S2MM capture command list").ok();
    writeln!(ctx, "  help_ddr            - DDR/UberDDR3 memory command list").ok();
    writeln!(ctx, "  ddrinfo/ddrwait/... - DDR helpers (see also: ddrtest, ddrpat, timertest)").ok();
    let caps = ctx.config.caps;
    for table in enabled_tables(&caps) {
        print_table(ctx, table);
    }
    Ok(())
}

fn reboot(ctx: &mut Context, _args: &str) -> Result<()> {
    writeln!(ctx, "Rebooting...").ok();
    log::info!("reset requested");
    ctx.bus.write32(soc::ctrl::RESET, 1);
    Ok(())
}

fn led_demo(ctx: &mut Context, _args: &str) -> Result<()> {
    if !ctx.config.caps.leds {
        return Err(Error::NotPresent("leds"));
    }
    writeln!(ctx, "LED demo...").ok();
    let bus = ctx.bus;
    for i in 0..32 {
        bus.write32(soc::leds::OUT, i);
        ctx.busy_wait(100);
    }
    for i in 0..4 {
        bus.write32(soc::leds::OUT, 1 << i);
        ctx.busy_wait(200);
    }
    for i in 0..4 {
        bus.write32(soc::leds::OUT, 1 << (3 - i));
        ctx.busy_wait(200);
    }
    for _ in 0..4 {
        bus.write32(soc::leds::OUT, 0x55);
        ctx.busy_wait(200);
        bus.write32(soc::leds::OUT, 0xAA);
        ctx.busy_wait(200);
    }
    Ok(())
}

fn leds(ctx: &mut Context, mut args: &str) -> Result<()> {
    if !ctx.config.caps.leds {
        return Err(Error::NotPresent("leds"));
    }
    let mask = parse_u32(required(&mut args, "mask")?)?;
    ctx.bus.write32(soc::leds::OUT, mask);
    writeln!(ctx, "LEDs set to 0x{:02X}", mask).ok();
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::commands::testing::Shell;
    use crate::config::Capabilities;
    use crate::soc;

    #[test]
    fn help_lists_every_enabled_table() {
        let mut shell = Shell::new(Capabilities::all());
        let out = shell.run("help");
        assert!(out.starts_with("\nTop-level help\n"));
        for name in ["phase_nco", "ub_send", "ddrpat", "dac1", "leds", "dacwave", "pokeled"] {
            assert!(out.contains(name), "{} missing from help", name);
        }

        let mut bare = Shell::new(Capabilities::none());
        let out = bare.run("help");
        assert!(!out.contains("phase_nco"));
    }

    #[test]
    fn reboot_pokes_reset() {
        let mut shell = Shell::new(Capabilities::all());
        shell.run("reboot");
        assert_eq!(shell.bus.writes_to(soc::ctrl::RESET), [1]);
    }

    #[test]
    fn led_demo_runs_the_whole_sequence() {
        let mut shell = Shell::new(Capabilities::all());
        assert_eq!(shell.run("led"), "LED demo...\n");
        let writes = shell.bus.writes_to(soc::leds::OUT);
        assert_eq!(writes.len(), 32 + 4 + 4 + 8);
        assert_eq!(writes[32..40], [1, 2, 4, 8, 8, 4, 2, 1]);
        assert_eq!(writes.last(), Some(&0xAA));
    }

    #[test]
    fn led_commands_need_leds() {
        let mut shell = Shell::new(Capabilities::none());
        assert_eq!(shell.run("leds 3"), "Error: leds not present in this build\n");
        assert!(shell.bus.writes_to(soc::leds::OUT).is_empty());

        let mut shell = Shell::new(Capabilities::all());
        assert_eq!(shell.run("leds 0x5"), "LEDs set to 0x05\n");
        assert_eq!(shell.bus.writes_to(soc::leds::OUT), [5]);
    }
}

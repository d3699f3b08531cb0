#![no_std]
#![no_main]

use core::fmt::Write;

use riscv_rt::entry;
use static_cell::StaticCell;

use uberclock_fw::bus::VOLATILE;
use uberclock_fw::commands;
use uberclock_fw::config::BoardConfig;
use uberclock_fw::console::Console;
use uberclock_fw::context::Context;
use uberclock_fw::ethernet::Eth;
use uberclock_fw::logger;
use uberclock_fw::net::{NetStorage, SmolLink};

static NET_STORAGE: StaticCell<NetStorage> = StaticCell::new();
static LINK: StaticCell<SmolLink> = StaticCell::new();

#[entry]
fn main() -> ! {
    let config = BoardConfig::uberclock();
    logger::init(config.log_level);
    let caps = config.caps;

    let link = if caps.ethernet {
        let storage = NET_STORAGE.init_with(NetStorage::new);
        Some(LINK.init(SmolLink::new(Eth::new(&VOLATILE), &config, storage)))
    } else {
        None
    };

    let mut console: Console<Context> = Console::new(config.prompt);
    let mut ctx = Context::new(&VOLATILE, config);
    if let Some(link) = link {
        ctx = ctx.with_link(link);
    }

    if let Err(e) = commands::register_all(&mut console, &caps) {
        writeln!(ctx, "Command registration failed: {}", e).ok();
    }
    ctx.uberclock_init();

    writeln!(
        ctx,
        "Type 'help' for top-level, 'help_uc' for UberClock commands, 'help_ddr' for DDR commands."
    )
    .ok();
    console.print_prompt(&mut ctx);

    loop {
        console.poll(&mut ctx);
        ctx.uberclock_poll();
        ctx.service_net();
    }
}

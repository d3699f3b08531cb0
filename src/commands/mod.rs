//! Shell command tables and the rules for which of them a build gets.

use heapless::Vec;

use crate::config::Capabilities;
use crate::console::registry::MAX_TABLES;
use crate::console::{Console, Table};
use crate::context::Context;
use crate::error::{Error, Result};

pub mod adc;
pub mod capture;
pub mod dac;
pub mod ddr;
pub mod ledmem;
pub mod root;
pub mod uberclock;

/// Tables for the peripherals in `caps`, in lookup order.
pub fn enabled_tables(caps: &Capabilities) -> Vec<&'static Table<Context>, MAX_TABLES> {
    let mut tables: Vec<&'static Table<Context>, MAX_TABLES> = Vec::new();
    let candidates: [(bool, &'static Table<Context>); 7] = [
        (true, &root::TABLE),
        (caps.uberclock, &uberclock::TABLE),
        (caps.ubddr3, &capture::TABLE),
        (caps.ubddr3, &ddr::TABLE),
        (caps.dac, &dac::TABLE),
        (caps.adc, &adc::TABLE),
        (caps.ledmem, &ledmem::TABLE),
    ];
    for (present, table) in candidates {
        if present {
            // Fewer candidates than slots
            tables.push(table).ok();
        }
    }
    tables
}

pub fn register_all(console: &mut Console<Context>, caps: &Capabilities) -> Result<()> {
    for table in enabled_tables(caps) {
        console.register(table)?;
    }
    Ok(())
}

/// Splits off the next whitespace-separated argument; empty once the line
/// is used up.
pub(crate) fn next_arg<'a>(args: &mut &'a str) -> &'a str {
    let s = args.trim_start();
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    let (token, rest) = s.split_at(end);
    *args = rest;
    token
}

pub(crate) fn required<'a>(args: &mut &'a str, what: &'static str) -> Result<&'a str> {
    match next_arg(args) {
        "" => Err(Error::MissingArgument(what)),
        token => Ok(token),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_follow_capabilities() {
        assert_eq!(enabled_tables(&Capabilities::all()).len(), 7);
        let mut caps = Capabilities::none();
        caps.ledmem = true;
        let titles: std::vec::Vec<_> = enabled_tables(&caps).iter().map(|t| t.title).collect();
        assert_eq!(titles, ["Top-level commands", "LEDMem commands"]);
        let titles: std::vec::Vec<_> = enabled_tables(&Capabilities::none())
            .iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, ["Top-level commands"]);
    }

    #[test]
    fn arguments_split_on_any_whitespace() {
        let mut args = "  0xA0000000 \t256  bus";
        assert_eq!(next_arg(&mut args), "0xA0000000");
        assert_eq!(next_arg(&mut args), "256");
        assert_eq!(required(&mut args, "size"), Ok("bus"));
        assert_eq!(next_arg(&mut args), "");
        assert_eq!(required(&mut args, "size"), Err(Error::MissingArgument("size")));
    }

    #[test]
    fn unknown_commands_fall_through_all_tables() {
        let mut shell = testing::Shell::new(Capabilities::all());
        assert_eq!(shell.run("bogus 1"), "Unknown command: bogus\n");
    }
}

//! `log` backend writing straight to the UART registers.

use core::fmt::Write;

use log::{LevelFilter, Log, Metadata, Record};

use crate::bus::VOLATILE;
use crate::hal::Uart;

pub struct UartLogger;

static LOGGER: UartLogger = UartLogger;

/// Formats one record the way it appears on the console.
pub fn write_record<W: Write>(out: &mut W, record: &Record) {
    writeln!(
        out,
        "\x1b[2m[{:>5}({})]\x1b[0m {}",
        record.level(),
        record.target(),
        record.args()
    )
    .ok();
}

impl Log for UartLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            write_record(&mut Uart::raw(&VOLATILE), record);
        }
    }

    fn flush(&self) {}
}

/// Installs the UART logger. Must run before interrupts are enabled.
pub fn init(level: LevelFilter) {
    // Safe, because this runs once from main before anything else logs
    if unsafe { log::set_logger_racy(&LOGGER) }.is_ok() {
        unsafe { log::set_max_level_racy(level) };
    }
}

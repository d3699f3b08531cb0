//! The shared UART shell: line editing, tokenizing and table dispatch.

use core::fmt::Write;

pub mod line;
pub mod registry;
pub mod token;

pub use line::LineReader;
pub use registry::{Command, Registry, Table};
pub use token::get_token;

use crate::error::Result;

/// Byte-oriented terminal the console runs on.
pub trait Terminal: Write {
    /// Next input byte, if one is waiting. Never blocks.
    fn read_byte(&mut self) -> Option<u8>;
}

pub struct Console<C: 'static> {
    prompt: &'static str,
    reader: LineReader,
    registry: Registry<C>,
}

impl<C: Terminal + 'static> Console<C> {
    pub const fn new(prompt: &'static str) -> Self {
        Self {
            prompt,
            reader: LineReader::new(),
            registry: Registry::new(),
        }
    }

    pub fn register(&mut self, table: &'static Table<C>) -> Result<()> {
        self.registry.register(table).map_err(|e| {
            log::warn!("cannot register '{}': {}", table.title, e);
            e
        })?;
        log::debug!("registered '{}' ({} commands)", table.title, table.commands.len());
        Ok(())
    }

    pub fn registry(&self) -> &Registry<C> {
        &self.registry
    }

    /// Services at most one input byte. Returns `true` if a line was run.
    pub fn poll(&mut self, ctx: &mut C) -> bool {
        let byte = match ctx.read_byte() {
            Some(byte) => byte,
            None => return false,
        };
        match self.reader.feed(byte, ctx) {
            Some(line) => {
                self.execute(ctx, &line);
                true
            }
            None => false,
        }
    }

    /// Runs one complete line and reprints the prompt.
    pub fn execute(&mut self, ctx: &mut C, line: &str) {
        let mut args = line;
        let name = get_token(&mut args);
        match self.registry.find(name) {
            Some(command) => {
                if let Err(e) = (command.handler)(ctx, args) {
                    writeln!(ctx, "Error: {}", e).ok();
                }
            }
            None => {
                writeln!(ctx, "Unknown command: {}", name).ok();
            }
        }
        self.print_prompt(ctx);
    }

    pub fn print_prompt(&self, ctx: &mut C) {
        write!(ctx, "\x1b[92;1m{}\x1b[0m ", self.prompt).ok();
    }

    /// Lists every registered table in registration order.
    pub fn print_help<W: Write>(&self, out: &mut W) {
        for table in self.registry.tables() {
            print_table(out, table);
        }
    }
}

/// Section header used by all help and report commands.
pub fn puts_help_header<W: Write>(out: &mut W, title: &str) {
    writeln!(out).ok();
    writeln!(out, "{}", title).ok();
    writeln!(out, "-------------------------------------").ok();
}

/// Lists every command of `table` with its description.
pub fn print_table<C, W: Write>(out: &mut W, table: &Table<C>) {
    puts_help_header(out, table.title);
    for command in table.commands {
        writeln!(out, "  {:<20} - {}", command.name, command.help).ok();
    }
}

#[cfg(test)]
pub mod testing {
    use super::Terminal;
    use std::collections::VecDeque;
    use std::string::String;

    /// Terminal with scripted input and captured output.
    pub struct ScriptTerminal {
        pub input: VecDeque<u8>,
        pub output: String,
    }

    impl ScriptTerminal {
        pub fn new(input: &str) -> Self {
            Self {
                input: input.bytes().collect(),
                output: String::new(),
            }
        }
    }

    impl core::fmt::Write for ScriptTerminal {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            self.output.push_str(s);
            Ok(())
        }
    }

    impl Terminal for ScriptTerminal {
        fn read_byte(&mut self) -> Option<u8> {
            self.input.pop_front()
        }
    }
}

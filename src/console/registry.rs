use heapless::Vec;

use crate::error::{Error, Result};

pub const MAX_TABLES: usize = 8;

pub type Handler<C> = fn(&mut C, &str) -> Result<()>;

/// One shell command: the name typed at the prompt, the function it runs
/// with the rest of the line, and a one-line description.
pub struct Command<C: 'static> {
    pub name: &'static str,
    pub handler: Handler<C>,
    pub help: &'static str,
}

pub struct Table<C: 'static> {
    pub title: &'static str,
    pub commands: &'static [Command<C>],
}

/// Command tables in registration order.
///
/// Names are not checked for uniqueness: lookup returns the first match.
pub struct Registry<C: 'static> {
    tables: Vec<&'static Table<C>, MAX_TABLES>,
}

impl<C: 'static> Registry<C> {
    pub const fn new() -> Self {
        Self { tables: Vec::new() }
    }

    pub fn register(&mut self, table: &'static Table<C>) -> Result<()> {
        self.tables.push(table).map_err(|_| Error::RegistryFull)
    }

    pub fn find(&self, name: &str) -> Option<&'static Command<C>> {
        self.tables
            .iter()
            .flat_map(|table| table.commands.iter())
            .find(|command| command.name == name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &'static Table<C>> + '_ {
        self.tables.iter().copied()
    }
}

impl<C: 'static> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

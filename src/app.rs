use crate::cli::Cli;
use crate::io::local_store::LocalStore;
use crate::prelude::*;

/// What every command runs against.
pub struct App {
    pub cli: Cli,
    pub store: LocalStore,
}

impl App {
    pub fn new(cli: Cli) -> AppResult<Self> {
        let store = cli.open_store()?;

        Ok(App { cli, store })
    }
}

pub mod package;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Handle unitypackage files
    Package {
        #[command(subcommand)]
        command: package::PackageCommands,
    },
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Package { command } => command.handle(),
        }
    }
}

use clap::Args;
use miette::Result;
use owo_colors::OwoColorize;
use tracing::info;
use upk_package::search::SearchIndex;

use super::PackageArgs;

#[derive(Args)]
pub struct SearchArgs {
    #[command(flatten)]
    package: PackageArgs,

    /// Text to look for in file names and GUIDs, ignoring case
    query: String,
}

impl SearchArgs {
    pub fn handle(&self) -> Result<()> {
        let package = self.package.open()?;
        let tree = package.build_tree()?;
        let index = SearchIndex::new(&tree);

        let found = index.search(&self.query);
        for entry in &found {
            println!("{}", entry.green());
        }
        info!("{} of {} assets match {:?}", found.len(), index.len(), self.query);
        Ok(())
    }
}

use clap::Args;
use miette::{Context, Result};
use std::path::PathBuf;
use tracing::warn;
use upk_package::{is_unitypackage, GuidPolicy, IndexOptions, UnityPackage};

pub mod cat;
pub mod extract;
pub mod list;
pub mod search;

#[derive(clap::Subcommand)]
pub enum PackageCommands {
    /// Print the asset tree of a package
    List(list::ListArgs),
    /// Find assets by file name or GUID
    Search(search::SearchArgs),
    /// Write a single asset to a file or stdout
    Cat(cat::CatArgs),
    /// Extract every asset of a package into a directory
    Extract(extract::ExtractArgs),
}

impl PackageCommands {
    pub fn handle(&self) -> Result<()> {
        match self {
            PackageCommands::List(list) => list.handle(),
            PackageCommands::Search(search) => search.handle(),
            PackageCommands::Cat(cat) => cat.handle(),
            PackageCommands::Extract(extract) => extract.handle(),
        }
    }
}

/// Arguments shared by every command reading a package
#[derive(Args)]
pub struct PackageArgs {
    /// An input unitypackage file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Fail when a GUID directory and its asset.meta disagree
    #[arg(long, env = "UPK_STRICT", default_value_t = false)]
    strict: bool,
}

impl PackageArgs {
    pub fn open(&self) -> Result<UnityPackage<PathBuf>> {
        if !is_unitypackage(&self.file) {
            warn!("{} does not have a .unitypackage extension", self.file.display());
        }

        let guid_policy = if self.strict {
            GuidPolicy::Strict
        } else {
            GuidPolicy::Warn
        };
        let options = IndexOptions::builder().guid_policy(guid_policy).build();

        UnityPackage::with_options(self.file.clone(), &options)
            .context(format!("path: {}", self.file.display()))
    }
}

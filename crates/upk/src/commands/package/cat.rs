use clap::Args;
use miette::{miette, Context, IntoDiagnostic, Result};
use std::{fs::File, io, path::PathBuf};
use tracing::info;

use super::PackageArgs;

#[derive(Args)]
pub struct CatArgs {
    #[command(flatten)]
    package: PackageArgs,

    /// Virtual path or GUID of the asset
    #[arg(short, long, value_name = "ASSET")]
    asset: String,

    /// A target file, stdout when missing
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl CatArgs {
    pub fn handle(&self) -> Result<()> {
        let package = self.package.open()?;
        let record = package
            .by_path(&self.asset)
            .or_else(|| package.by_guid(&self.asset))
            .ok_or_else(|| miette!("no asset with path or GUID {}", self.asset))?;

        let mut payload = package.open_payload(record)?;

        match &self.output {
            Some(p) => {
                info!("writing {} to {}", record.path(), p.display());
                let mut out = if !self.overwrite {
                    File::create_new(p)
                        .into_diagnostic()
                        .context(format!("creating {}", p.display()))?
                } else {
                    File::create(p)
                        .into_diagnostic()
                        .context(format!("creating {}", p.display()))?
                };
                io::copy(&mut payload, &mut out).into_diagnostic()?;
            }
            None => {
                io::copy(&mut payload, &mut io::stdout().lock()).into_diagnostic()?;
            }
        }
        Ok(())
    }
}

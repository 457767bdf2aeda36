use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use std::{fs::File, path::PathBuf};
use tracing::{info, warn};

use super::PackageArgs;

#[derive(Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    package: PackageArgs,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let package = self.package.open()?;

        for record in package.records().iter().filter(|r| r.is_directory()) {
            if let Some(p) = record.enclosed_path() {
                std::fs::create_dir_all(self.directory.join(p))
                    .into_diagnostic()
                    .context(format!("creating {}", record.path()))?;
            }
        }

        let mut skipped = 0;
        let written = package.for_each_payload(|record, payload| {
            let Some(relative) = record.enclosed_path() else {
                warn!("skipping {} {:?}, it leaves the target directory", record.guid(), record.path());
                skipped += 1;
                return Ok(());
            };

            let p = self.directory.join(relative);
            info!("writing {}", p.display());

            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = if !self.overwrite {
                File::create_new(&p)?
            } else {
                File::create(&p)?
            };

            std::io::copy(payload, &mut out)?;
            Ok(())
        })?;

        info!("extracted {} assets, skipped {}", written - skipped, skipped);
        Ok(())
    }
}

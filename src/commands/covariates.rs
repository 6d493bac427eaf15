use crate::error_metrics::directive::{ErrorKind, ALL_TOKEN};
use crate::error_metrics::stratifiers::Stratifier;
use anyhow::Result;
use std::io::{self, Write};

pub fn run() -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "Error kinds:")?;
    for kind in ErrorKind::ALL {
        writeln!(out, "  {:<20} {}", kind.token(), kind.suffix())?;
    }
    writeln!(out, "Covariates:")?;
    writeln!(out, "  {:<26} {}", ALL_TOKEN, "all")?;
    for stratifier in Stratifier::ALL {
        writeln!(out, "  {:<26} {}", stratifier.token(), stratifier.suffix())?;
    }
    Ok(())
}

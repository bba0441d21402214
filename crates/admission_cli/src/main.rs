mod cli;
mod commands;

use app::{AppBuilder, Application};
use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use tracing::level_filters::LevelFilter;

use crate::cli::Cli;

pub struct AdmissionCli;

impl Application for AdmissionCli {
    const APP_ID: &'static str = "admission";
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let mut builder = AppBuilder::<AdmissionCli>::new(env!("CARGO_PKG_VERSION"));
    if let Some(dir) = &args.data_dir {
        builder = builder.with_base_path(dir);
    }
    if args.verbose {
        builder = builder.with_level(LevelFilter::DEBUG);
    }
    let ctx = builder.build().map_err(|e| eyre!(e))?;

    commands::run(args.cmd, &ctx).await
}

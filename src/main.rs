use anyhow::Result;
use clap::Parser as ClapParser;

use cli::command::{Cli, Commands, LogFormat};
use cli::edit::cmd_edit;
use cli::info::cmd_info;

mod cli;
mod input;
mod snapshot;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut env_builder = env_logger::Builder::from_default_env();
    env_builder.filter_level(cli.loglevel.to_level_filter());
    match cli.log_format {
        LogFormat::Plain => {
            env_builder.format_timestamp_secs();
        }
        LogFormat::Json => {
            env_builder.format(|buf, record| {
                use std::io::Write;
                writeln!(
                    buf,
                    "{{\"ts\":\"{}\",\"lvl\":\"{}\",\"target\":\"{}\",\"msg\":{:?}}}",
                    buf.timestamp(),
                    record.level(),
                    record.target(),
                    record.args().to_string()
                )
            });
        }
    }
    env_builder.try_init()?;

    match cli.command {
        Commands::Info(ref args) => cmd_info(args)?,
        Commands::Edit(ref args) => cmd_edit(args)?,
    }

    Ok(())
}

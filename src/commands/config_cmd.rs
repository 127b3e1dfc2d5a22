use clap::{Args, Subcommand};

use itemsync::Config;

use super::render::{print_config, OutputFormat};

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective settings and where each one came from
    Show {
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let ConfigSubcommand::Show { format } = &self.command;
        print_config(config, *format)?;
        Ok(())
    }
}

use clap::Parser;
use serde_json::json;

use super::{
    terminal::{is_narrow, Colorize},
    Context, OutputFormat,
};

#[derive(Debug, Parser)]
#[command(about = "List the available document profiles")]
pub struct Profiles {
    /// Output format (table, json)
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl Profiles {
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let registry = &context.registry;

        match self.output {
            OutputFormat::Json => {
                let profiles: Vec<_> = registry
                    .iter()
                    .map(|profile| {
                        json!({
                            "id": profile.id(),
                            "description": profile.description(),
                            "match": profile.prefixes(),
                            "fields": profile.fields(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&profiles)?);
            }
            OutputFormat::Table => {
                if is_narrow() {
                    for profile in registry.iter() {
                        println!("{}", profile.id().info());
                    }
                    return Ok(());
                }
                println!("{:<20} {:<28} Description", "Profile", "Matches");
                for profile in registry.iter() {
                    println!(
                        "{:<20} {:<28} {}",
                        profile.id().info(),
                        profile.prefixes().join(", "),
                        profile.description().dim()
                    );
                }
            }
        }
        Ok(())
    }
}

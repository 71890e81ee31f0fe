//! CLI tool to read and change the alarm clock configuration
//!
//! Usage: configctl [<field>=<value> ...]
//!
//! The device is addressed through `CONFIG_API_URL`.

use alarmclock_ui::{
    ChangeSet, ConfigApiClient, ConfigForm, ConfigFormBinding, FormControl,
    ResponseOrdering, TextInput, config::ClientConfig,
};
use anyhow::{Context, Result, bail};
use env_logger::{Builder, Env};
use std::env;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    Builder::from_env(Env::default().default_filter_or("warn")).init();

    if let Err(e) = run().await {
        eprintln!("configctl failed: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let change_set = parse_changes(env::args().skip(1))?;

    let client_config = ClientConfig::load()?;
    let client = ConfigApiClient::new(&client_config.base_url)?;
    let form = ConfigForm::new(TextInput::default(), TextInput::default());
    let binding =
        ConfigFormBinding::new(client, form).with_ordering(ResponseOrdering::LatestRequestWins);

    binding
        .initialize()
        .await
        .context("failed to load configuration")?;

    if !change_set.is_empty() {
        binding
            .send_change(change_set)
            .await
            .context("failed to send changes")?;
    }

    println!("brightness: {}", binding.form().brightness().value());
    println!(
        "clockFormatString: {}",
        binding.form().clock_format_string().value()
    );

    Ok(())
}

fn parse_changes(args: impl Iterator<Item = String>) -> Result<ChangeSet> {
    let mut change_set = ChangeSet::new();

    for arg in args {
        let Some((key, value)) = arg.split_once('=') else {
            bail!("failed to parse '{arg}': expected <field>=<value>");
        };

        if key.is_empty() {
            bail!("failed to parse '{arg}': field name is empty");
        }

        change_set.insert(key, value);
    }

    Ok(change_set)
}

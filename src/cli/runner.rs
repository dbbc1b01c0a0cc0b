//! CLI runner - executes commands

use crate::auth::mint_assertion;
use crate::cli::commands::{Cli, Commands, OutputFormat, SearchArgs};
use crate::client::Client;
use crate::config::{AuthConfigDef, ClientConfig};
use crate::http::Context;
use crate::validation::validate_nhs_number;
use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let ctx = match self.cli.timeout {
            Some(secs) => Context::with_timeout(Duration::from_secs(secs)),
            None => Context::background(),
        };

        let canceller = ctx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling");
                canceller.cancel();
            }
        });

        match &self.cli.command {
            Commands::Get { nhs_number } => self.get(&ctx, nhs_number).await,
            Commands::Search(args) => self.search(&ctx, args).await,
            Commands::Assertion => self.assertion(),
            Commands::Validate { nhs_number } => self.validate(nhs_number),
        }
    }

    /// Load the config file, if any, and apply command-line overrides
    fn load_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ClientConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ClientConfig::default(),
        };

        if let Some(base_url) = &self.cli.base_url {
            config.base_url = Some(base_url.clone());
        }

        Ok(config)
    }

    fn build_client(&self) -> Result<Client> {
        let config = self.load_config()?;
        let client = Client::from_config(&config).context("building client")?;
        debug!("Using {:?}", client);
        Ok(client)
    }

    async fn get(&self, ctx: &Context, nhs_number: &str) -> Result<()> {
        let client = self.build_client()?;
        let patient = client
            .patient()
            .get(ctx, nhs_number)
            .await
            .with_context(|| format!("retrieving patient {nhs_number}"))?;
        self.output(&patient)
    }

    async fn search(&self, ctx: &Context, args: &SearchArgs) -> Result<()> {
        let client = self.build_client()?;
        let options = args.to_options();
        let patients = client.patient();

        if args.bundle {
            let bundle = patients
                .search_bundle(ctx, &options)
                .await
                .context("searching patients")?;
            self.output(&bundle)
        } else {
            let found = patients
                .search(ctx, &options)
                .await
                .context("searching patients")?;
            self.output(&found)
        }
    }

    fn assertion(&self) -> Result<()> {
        let config = self.load_config()?;
        let AuthConfigDef::Jwt(jwt) = &config.auth else {
            bail!("the assertion command needs `auth.type: jwt` in the configuration file");
        };
        let identity = jwt.to_identity()?;
        let assertion = mint_assertion(&identity).context("minting client assertion")?;
        println!("{assertion}");
        Ok(())
    }

    fn validate(&self, nhs_number: &str) -> Result<()> {
        validate_nhs_number(nhs_number)?;
        println!("{nhs_number} is a valid NHS number");
        Ok(())
    }

    /// Print a value in the selected format
    fn output<T: Serialize>(&self, value: &T) -> Result<()> {
        let text = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        };
        println!("{text}");
        Ok(())
    }
}

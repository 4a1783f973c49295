//! Command line and connection target resolution (flags, saved profiles, defaults).

use anyhow::{bail, Context};
use clap::Parser;
use url::Url;

use crate::profiles::{
    load_profiles, save_profiles, should_save, ProfileEntry, ProfileRequest, ResolveProfile,
};
use crate::ws::DEFAULT_URL;

/// Display a live stream of one or more containers' resource usage statistics.
#[derive(Parser, Debug, Clone)]
#[command(name = "stattop", version)]
pub struct Cli {
    /// Agent base URL (ws://HOST:PORT or wss://HOST:PORT)
    #[arg(long)]
    pub url: Option<String>,

    /// Connection profile to load, or to save the given --url under
    #[arg(short = 'P', long)]
    pub profile: Option<String>,

    /// PEM file with the CA that signed the agent's certificate
    #[arg(short = 't', long = "tls-ca", value_name = "CERT_PEM")]
    pub tls_ca: Option<String>,

    /// Access token expected by the agent
    #[arg(long)]
    pub token: Option<String>,

    /// Overwrite an existing profile that differs from the given flags
    #[arg(long)]
    pub save: bool,

    /// Resolve and save configuration, print it, and exit without connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Containers to watch
    #[arg(value_name = "CONTAINER", required = true)]
    pub containers: Vec<String>,
}

impl Cli {
    /// Container names in display order.
    pub fn sorted_containers(&self) -> Vec<String> {
        let mut names = self.containers.clone();
        names.sort();
        names.dedup();
        names
    }

    /// Work out where to connect, persisting a named profile when the flags call for it.
    pub fn resolve_target(&self) -> anyhow::Result<ProfileEntry> {
        let mut profiles = load_profiles();
        let req = ProfileRequest {
            profile_name: self.profile.clone(),
            url: self.url.clone(),
            tls_ca: self.tls_ca.clone(),
            token: self.token.clone(),
        };
        let entry = match req.resolve(&profiles) {
            ResolveProfile::Direct(entry) => {
                if let Some(name) = self.profile.as_ref() {
                    if should_save(&profiles, name, &entry, self.save) {
                        profiles.profiles.insert(name.clone(), entry.clone());
                        save_profiles(&profiles)
                            .with_context(|| format!("saving profile '{name}'"))?;
                    }
                }
                entry
            }
            ResolveProfile::Loaded(entry) => entry,
            ResolveProfile::Unknown(name) => {
                bail!("profile '{name}' does not exist; pass --url to create it")
            }
            ResolveProfile::Default => ProfileEntry {
                url: DEFAULT_URL.to_string(),
                tls_ca: self.tls_ca.clone(),
                token: self.token.clone(),
            },
        };
        Ok(entry)
    }
}

/// Parse and check a profile's URL.
pub fn agent_url(entry: &ProfileEntry) -> anyhow::Result<Url> {
    let url = Url::parse(&entry.url)
        .with_context(|| format!("invalid agent URL '{}'", entry.url))?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => bail!("unsupported scheme '{other}' (expected ws or wss)"),
    }
}

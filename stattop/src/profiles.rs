//! Connection profiles: load/save simple JSON mapping of profile name -> { url, tls_ca, token }
//! Stored under XDG config dir: $XDG_CONFIG_HOME/stattop/profiles.json (fallback ~/.config/stattop/profiles.json)

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProfileEntry {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_ca: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfilesFile {
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileEntry>,
    #[serde(default)]
    pub version: u32,
}

pub fn config_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("stattop")
    } else {
        dirs_next::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stattop")
    }
}

pub fn profiles_path() -> PathBuf {
    config_dir().join("profiles.json")
}

pub fn load_profiles() -> ProfilesFile {
    let path = profiles_path();
    match fs::read_to_string(&path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
        Err(_) => ProfilesFile::default(),
    }
}

pub fn save_profiles(p: &ProfilesFile) -> anyhow::Result<()> {
    let path = profiles_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(p)?;
    fs::write(path, data)?;
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
pub enum ResolveProfile {
    /// Use the provided runtime inputs; the caller decides whether to persist them.
    Direct(ProfileEntry),
    /// Loaded from an existing profile entry
    Loaded(ProfileEntry),
    /// A profile name was given without a URL and no such profile exists
    Unknown(String),
    /// Nothing given: connect to the local agent
    Default,
}

pub struct ProfileRequest {
    pub profile_name: Option<String>,
    pub url: Option<String>,
    pub tls_ca: Option<String>,
    pub token: Option<String>,
}

impl ProfileRequest {
    pub fn resolve(self, pf: &ProfilesFile) -> ResolveProfile {
        if let Some(url) = self.url {
            return ResolveProfile::Direct(ProfileEntry {
                url,
                tls_ca: self.tls_ca,
                token: self.token,
            });
        }
        match self.profile_name {
            Some(name) => match pf.profiles.get(&name) {
                Some(entry) => {
                    // flags given alongside a profile override what was saved
                    let mut entry = entry.clone();
                    if self.tls_ca.is_some() {
                        entry.tls_ca = self.tls_ca;
                    }
                    if self.token.is_some() {
                        entry.token = self.token;
                    }
                    ResolveProfile::Loaded(entry)
                }
                None => ResolveProfile::Unknown(name),
            },
            None => ResolveProfile::Default,
        }
    }
}

/// Whether a direct entry for `name` should be written back: new profiles always are, changed
/// ones only when `overwrite` is set.
pub fn should_save(pf: &ProfilesFile, name: &str, entry: &ProfileEntry, overwrite: bool) -> bool {
    match pf.profiles.get(name) {
        None => true,
        Some(existing) => existing != entry && overwrite,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_with(name: &str, url: &str) -> ProfilesFile {
        let mut pf = ProfilesFile::default();
        pf.profiles.insert(
            name.into(),
            ProfileEntry {
                url: url.into(),
                tls_ca: None,
                token: Some("t0".into()),
            },
        );
        pf
    }

    fn request(profile: Option<&str>, url: Option<&str>) -> ProfileRequest {
        ProfileRequest {
            profile_name: profile.map(Into::into),
            url: url.map(Into::into),
            tls_ca: None,
            token: None,
        }
    }

    #[test]
    fn url_wins_over_profile() {
        let pf = file_with("prod", "ws://prod/");
        let r = request(Some("prod"), Some("ws://other/")).resolve(&pf);
        assert!(matches!(r, ResolveProfile::Direct(e) if e.url == "ws://other/"));
    }

    #[test]
    fn profile_only_loads_entry() {
        let pf = file_with("prod", "ws://prod/");
        let r = request(Some("prod"), None).resolve(&pf);
        match r {
            ResolveProfile::Loaded(e) => {
                assert_eq!(e.url, "ws://prod/");
                assert_eq!(e.token.as_deref(), Some("t0"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            request(Some("dev"), None).resolve(&pf),
            ResolveProfile::Unknown("dev".into())
        );
        assert_eq!(request(None, None).resolve(&pf), ResolveProfile::Default);
    }

    #[test]
    fn overwrite_only_when_changed_and_asked() {
        let pf = file_with("prod", "ws://prod/");
        let same = pf.profiles["prod"].clone();
        let changed = ProfileEntry {
            url: "ws://new/".into(),
            ..same.clone()
        };
        assert!(should_save(&pf, "fresh", &same, false));
        assert!(!should_save(&pf, "prod", &same, true));
        assert!(!should_save(&pf, "prod", &changed, false));
        assert!(should_save(&pf, "prod", &changed, true));
    }
}

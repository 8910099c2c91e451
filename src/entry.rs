//! Configured accounts and their runtime state.

use crate::config::WaterSmartConfig;
use crate::coordinator::Coordinator;
use serde_derive::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A configured WaterSmart account, as accepted by setup validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigEntry {
    pub entry_id: String,
    pub title: String,
    pub data: EntryData,
}

/// Credentials and host as entered by the user.
#[derive(Clone, PartialEq, Serialize)]
pub struct EntryData {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for EntryData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryData")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"**REDACTED**")
            .finish()
    }
}

impl ConfigEntry {
    /// Creates the entry for `config`, whose host resolved to `hostname`.
    pub fn new(config: &WaterSmartConfig, hostname: &str) -> Self {
        Self {
            entry_id: format!("{}-{}", hostname, config.username).to_lowercase(),
            title: format!("{} ({})", config.host, config.username),
            data: EntryData {
                host: config.host.clone(),
                username: config.username.clone(),
                password: config.password.clone(),
            },
        }
    }
}

/// An entry whose coordinator has been set up.
pub struct LoadedEntry {
    pub entry: ConfigEntry,
    /// Portal subdomain the entry resolved to
    pub hostname: String,
    pub coordinator: Arc<Coordinator>,
}

/// Entries addressable by id.
#[derive(Default)]
pub struct EntryRegistry {
    entries: BTreeMap<String, LoadedEntry>,
}

impl EntryRegistry {
    pub fn insert(&mut self, loaded: LoadedEntry) {
        self.entries.insert(loaded.entry.entry_id.clone(), loaded);
    }

    pub fn get(&self, entry_id: &str) -> Option<&LoadedEntry> {
        self.entries.get(entry_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoadedEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::config::TestWaterSmartConfigBuilder;

    #[test]
    fn test_config_entry_new() {
        let config = TestWaterSmartConfigBuilder::new()
            .with_host("https://MyUtility.bellevuewa.gov")
            .with_username("Test@Home-Assistant.io")
            .build();

        let entry = ConfigEntry::new(&config, "myutility");

        assert_eq!(entry.entry_id, "myutility-test@home-assistant.io");
        assert_eq!(
            entry.title,
            "https://MyUtility.bellevuewa.gov (Test@Home-Assistant.io)"
        );
        assert_eq!(entry.data.password, "Passw0rd");
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = TestWaterSmartConfigBuilder::new().build();
        let entry = ConfigEntry::new(&config, "test");

        for debug in [format!("{:?}", config), format!("{:?}", entry)] {
            assert!(debug.contains("**REDACTED**"));
            assert!(!debug.contains("Passw0rd"));
        }
    }
}

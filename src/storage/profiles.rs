//! File-backed profile collaborators.
//!
//! - [`FileProfileStore`]: OAuth profiles in `profiles.toml`
//! - [`JsonApiProfileSource`]: API-key profiles in `api-profiles.json`
//!
//! Both re-read their file on every call so edits made by other processes
//! are picked up on the next cycle.
//!
//! ```toml
//! active = "work"
//!
//! [[profiles]]
//! id = "work"
//! name = "Work"
//! priority = 0
//! oauth_token = "sk-ant-oat01-..."   # optional, else the OS keyring
//!
//! [[profiles]]
//! id = "glm"
//! name = "GLM"
//! base_url = "https://api.z.ai/api/anthropic"
//! priority = 1
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::core::models::{ApiProfilesFile, AutoSwitchSettings, Profile};
use crate::core::store::{ApiProfileSource, ProfileStore};
use crate::error::{Result, SwapwatchError};

/// Keyring service holding OAuth tokens; the user is the profile id.
pub const KEYRING_SERVICE: &str = "swapwatch";

// =============================================================================
// profiles.toml
// =============================================================================

/// On-disk shape of `profiles.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilesFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,
    #[serde(default)]
    pub profiles: Vec<ProfileEntry>,
}

/// One `[[profiles]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_endpoint: Option<String>,
    /// Lower is preferred.
    #[serde(default)]
    pub priority: i64,
}

impl ProfileEntry {
    fn inline_token(&self) -> Option<&str> {
        self.oauth_token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// [`ProfileStore`] over a TOML file.
#[derive(Debug)]
pub struct FileProfileStore {
    path: PathBuf,
    settings: AutoSwitchSettings,
    use_keyring: bool,
    write_lock: Mutex<()>,
}

impl FileProfileStore {
    #[must_use]
    pub fn new(path: &Path, settings: AutoSwitchSettings) -> Self {
        Self {
            path: path.to_path_buf(),
            settings,
            use_keyring: true,
            write_lock: Mutex::new(()),
        }
    }

    /// Only use inline tokens.
    #[must_use]
    pub const fn without_keyring(mut self) -> Self {
        self.use_keyring = false;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file; a missing file is an empty store.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub async fn read(&self) -> Result<ProfilesFile> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            tracing::debug!(path = ?self.path, "profiles file not found");
            return Ok(ProfilesFile::default());
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        toml::from_str(&content).map_err(|e| SwapwatchError::ConfigParse {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    async fn write(&self, file: &ProfilesFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = toml::to_string_pretty(file)
            .map_err(|e| SwapwatchError::ProfileStore(format!("failed to serialize profiles: {e}")))?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    async fn to_profile(&self, entry: &ProfileEntry) -> Profile {
        let has_oauth_token =
            entry.inline_token().is_some() || self.keyring_has_token(&entry.id).await;
        Profile {
            id: entry.id.clone(),
            name: entry.name.clone(),
            base_url: entry.base_url.clone(),
            has_oauth_token,
            usage_endpoint: entry.usage_endpoint.clone(),
        }
    }

    async fn keyring_has_token(&self, id: &str) -> bool {
        if !self.use_keyring {
            return false;
        }
        let user = id.to_string();
        match tokio::task::spawn_blocking(move || keyring_token(&user)).await {
            Ok(Ok(token)) => token.is_some(),
            Ok(Err(e)) => {
                tracing::debug!(profile_id = id, error = %e, "keyring lookup failed");
                false
            }
            Err(e) => {
                tracing::debug!(profile_id = id, error = %e, "keyring task failed");
                false
            }
        }
    }

    async fn find_profile(&self, id: &str) -> Result<Option<Profile>> {
        let file = self.read().await?;
        match file.profiles.iter().find(|p| p.id == id) {
            Some(entry) => Ok(Some(self.to_profile(entry).await)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ProfileStore for FileProfileStore {
    async fn active_profile(&self) -> Result<Option<Profile>> {
        let Some(active) = self.read().await?.active else {
            return Ok(None);
        };
        self.find_profile(&active).await
    }

    async fn profile(&self, id: &str) -> Result<Option<Profile>> {
        self.find_profile(id).await
    }

    async fn profiles_by_availability(&self) -> Result<Vec<Profile>> {
        let mut entries = self.read().await?.profiles;
        // Stable: equal priorities keep file order.
        entries.sort_by_key(|p| p.priority);
        let mut profiles = Vec::with_capacity(entries.len());
        for entry in &entries {
            profiles.push(self.to_profile(entry).await);
        }
        Ok(profiles)
    }

    async fn set_active_profile(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.read().await?;
        if !file.profiles.iter().any(|p| p.id == id) {
            return Err(SwapwatchError::ProfileNotFound(id.to_string()));
        }
        file.active = Some(id.to_string());
        self.write(&file).await?;
        tracing::debug!(profile_id = id, path = ?self.path, "active profile persisted");
        Ok(())
    }

    async fn resolve_credential(&self, id: &str) -> Result<Option<String>> {
        let file = self.read().await?;
        let Some(entry) = file.profiles.iter().find(|p| p.id == id) else {
            return Err(SwapwatchError::ProfileNotFound(id.to_string()));
        };
        if let Some(token) = entry.inline_token() {
            return Ok(Some(token.to_string()));
        }
        if !self.use_keyring {
            return Ok(None);
        }

        let user = id.to_string();
        tokio::task::spawn_blocking(move || keyring_token(&user))
            .await
            .map_err(|e| SwapwatchError::ProfileStore(format!("keyring task failed: {e}")))?
    }

    fn auto_switch_settings(&self) -> AutoSwitchSettings {
        self.settings
    }
}

fn keyring_token(user: &str) -> Result<Option<String>> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, user)
        .map_err(|e| SwapwatchError::ProfileStore(format!("keyring error: {e}")))?;
    match entry.get_password() {
        Ok(token) => Ok(Some(token)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(SwapwatchError::ProfileStore(format!(
            "failed to read token from keyring: {e}"
        ))),
    }
}

// =============================================================================
// api-profiles.json
// =============================================================================

/// [`ApiProfileSource`] over a JSON file.
#[derive(Debug, Clone)]
pub struct JsonApiProfileSource {
    path: PathBuf,
}

impl JsonApiProfileSource {
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

#[async_trait]
impl ApiProfileSource for JsonApiProfileSource {
    async fn load_profiles(&self) -> Result<ApiProfilesFile> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(ApiProfilesFile::default());
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        serde_json::from_str(&content).map_err(|e| SwapwatchError::ConfigParse {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PROFILES: &str = r#"
active = "work"

[[profiles]]
id = "spare"
name = "Spare"
priority = 5
oauth_token = "tok-spare"

[[profiles]]
id = "work"
name = "Work"
oauth_token = "tok-work"

[[profiles]]
id = "glm"
name = "GLM"
base_url = "https://api.z.ai/api/anthropic"
oauth_token = "tok-glm"
"#;

    fn store(dir: &TempDir) -> FileProfileStore {
        let path = dir.path().join("profiles.toml");
        std::fs::write(&path, PROFILES).unwrap();
        FileProfileStore::new(&path, AutoSwitchSettings::default()).without_keyring()
    }

    #[tokio::test]
    async fn ranks_by_priority_then_file_order() {
        let dir = TempDir::new().unwrap();
        let ids: Vec<String> = store(&dir)
            .profiles_by_availability()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["work", "glm", "spare"]);
    }

    #[tokio::test]
    async fn set_active_persists() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.set_active_profile("glm").await.unwrap();

        let reopened = FileProfileStore::new(store.path(), AutoSwitchSettings::default());
        let active = reopened.active_profile().await.unwrap().unwrap();
        assert_eq!(active.id, "glm");
        assert_eq!(active.base_url.as_deref(), Some("https://api.z.ai/api/anthropic"));
    }

    #[tokio::test]
    async fn set_active_unknown_profile_fails() {
        let dir = TempDir::new().unwrap();
        let err = store(&dir).set_active_profile("ghost").await.unwrap_err();
        assert!(matches!(err, SwapwatchError::ProfileNotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn inline_token_is_resolved() {
        let dir = TempDir::new().unwrap();
        let token = store(&dir).resolve_credential("work").await.unwrap();
        assert_eq!(token.as_deref(), Some("tok-work"));
    }

    #[tokio::test]
    async fn profile_without_token_reports_no_oauth_token() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profiles.toml");
        std::fs::write(
            &path,
            "[[profiles]]\nid = \"bare\"\nname = \"Bare\"\n\n[[profiles]]\nid = \"work\"\nname = \"Work\"\noauth_token = \"tok\"\n",
        )
        .unwrap();
        let store = FileProfileStore::new(&path, AutoSwitchSettings::default()).without_keyring();

        let ranked = store.profiles_by_availability().await.unwrap();
        let flags: Vec<(&str, bool)> = ranked
            .iter()
            .map(|p| (p.id.as_str(), p.has_oauth_token))
            .collect();
        assert_eq!(flags, vec![("bare", false), ("work", true)]);
        assert!(store.resolve_credential("bare").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = FileProfileStore::new(&dir.path().join("none.toml"), AutoSwitchSettings::default());
        assert!(store.active_profile().await.unwrap().is_none());
        assert!(store.profiles_by_availability().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn api_profiles_parse_camel_case() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api-profiles.json");
        std::fs::write(
            &path,
            r#"{
                "profiles": [
                    {"id": "z", "name": "Z", "baseUrl": "https://api.z.ai", "apiKey": "k1"}
                ],
                "activeProfileId": "z"
            }"#,
        )
        .unwrap();

        let file = JsonApiProfileSource::new(&path).load_profiles().await.unwrap();
        assert_eq!(file.active().map(|p| p.api_key.as_str()), Some("k1"));
    }

    #[tokio::test]
    async fn invalid_api_profiles_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("api-profiles.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = JsonApiProfileSource::new(&path).load_profiles().await.unwrap_err();
        assert!(matches!(err, SwapwatchError::ConfigParse { .. }));
    }
}

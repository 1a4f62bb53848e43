use metahint_protocol::{HINTS_DOCUMENT_PATH, LOCATIONS_DOCUMENT_PATH};
use serde::{Deserialize, Serialize};

pub const DEFAULT_OWNER: &str = "lukas-hzb";
pub const DEFAULT_REPO: &str = "GeoguessrScript";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_RAW_BASE: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_WEB_BASE: &str = "https://github.com";

/// Where the two community documents live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub hints_path: String,
    pub locations_path: String,
    pub api_base: String,
    pub raw_base: String,
    pub web_base: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            owner: DEFAULT_OWNER.to_string(),
            repo: DEFAULT_REPO.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            hints_path: HINTS_DOCUMENT_PATH.to_string(),
            locations_path: LOCATIONS_DOCUMENT_PATH.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            raw_base: DEFAULT_RAW_BASE.to_string(),
            web_base: DEFAULT_WEB_BASE.to_string(),
        }
    }
}

impl RemoteConfig {
    /// Defaults overridden by `METAHINT_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let fields: [(&str, &mut String); 8] = [
            ("METAHINT_OWNER", &mut config.owner),
            ("METAHINT_REPO", &mut config.repo),
            ("METAHINT_BRANCH", &mut config.branch),
            ("METAHINT_HINTS_PATH", &mut config.hints_path),
            ("METAHINT_LOCATIONS_PATH", &mut config.locations_path),
            ("METAHINT_API_BASE", &mut config.api_base),
            ("METAHINT_RAW_BASE", &mut config.raw_base),
            ("METAHINT_WEB_BASE", &mut config.web_base),
        ];
        for (key, slot) in fields {
            if let Some(value) = lookup(key) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    *slot = trimmed.to_string();
                }
            }
        }
        config
    }

    #[must_use]
    pub fn repo_slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Read-only URL of a document on the configured branch.
    #[must_use]
    pub fn raw_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.raw_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.branch,
            path.trim_start_matches('/')
        )
    }

    #[must_use]
    pub fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            path.trim_start_matches('/')
        )
    }

    #[must_use]
    pub fn new_issue_url(&self) -> String {
        format!(
            "{}/{}/{}/issues/new",
            self.web_base.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn defaults_point_at_community_repo() {
        let config = RemoteConfig::default();
        assert_eq!(
            config.raw_url(&config.hints_path),
            "https://raw.githubusercontent.com/lukas-hzb/GeoguessrScript/main/data/metas.json"
        );
        assert_eq!(
            config.contents_url(&config.locations_path),
            "https://api.github.com/repos/lukas-hzb/GeoguessrScript/contents/data/locations.json"
        );
    }

    #[test]
    fn environment_overrides_non_blank_values() {
        let env: HashMap<&str, &str> = [
            ("METAHINT_OWNER", "someone"),
            ("METAHINT_BRANCH", "  "),
            ("METAHINT_API_BASE", "http://127.0.0.1:9999/"),
        ]
        .into_iter()
        .collect();
        let config = RemoteConfig::from_lookup(|key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.owner, "someone");
        assert_eq!(config.branch, "main");
        assert_eq!(
            config.contents_url("data/metas.json"),
            "http://127.0.0.1:9999/repos/someone/GeoguessrScript/contents/data/metas.json"
        );
    }
}

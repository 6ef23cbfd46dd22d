// ─── Client Manifest ───
// The Wurm manifest lists the client variants and their native dependencies.

use serde::Deserialize;

use crate::core::error::ValidationError;

pub const JCEF_DEPENDENCY_NAME: &str = "jcef-natives";

/// Top-level client manifest.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClientManifest {
    #[serde(default)]
    pub clients: Vec<ClientEntry>,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
}

/// A client variant (e.g. "Live").
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientEntry {
    pub name: String,
    pub url: String,
}

/// A native dependency bundle for one platform.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DependencyEntry {
    pub name: String,
    pub platform: String,
    pub url: String,
}

impl ClientManifest {
    pub fn client_names(&self) -> Vec<String> {
        self.clients.iter().map(|c| c.name.clone()).collect()
    }

    /// Find a client variant by its exact name.
    pub fn find_client(&self, name: &str) -> Result<&ClientEntry, ValidationError> {
        self.clients
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ValidationError::UnknownClient {
                name: name.to_string(),
                known: self.client_names(),
            })
    }

    /// JCEF natives for a Wurm platform id such as `linux64`.
    pub fn jcef_for(&self, platform_id: &str) -> Option<&DependencyEntry> {
        self.dependencies
            .iter()
            .filter(|d| d.name == JCEF_DEPENDENCY_NAME)
            .find(|d| d.platform == platform_id)
    }
}

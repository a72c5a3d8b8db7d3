use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Generic `{"mcpServers": {"<name>": {...}}}` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpServersDocument {
    #[serde(rename = "mcpServers", default)]
    pub servers: BTreeMap<String, serde_json::Value>,
}

impl McpServersDocument {
    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Read the shared document. The file is only ever read, never written.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow::anyhow!("read mcp config {}: {}", path.display(), e))?;
        Self::from_json_str(&raw)
            .map_err(|e| anyhow::anyhow!("parse mcp config {}: {}", path.display(), e))
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Copy holding only the requested servers, plus the names the document does not define.
    pub fn select(&self, requested: &[String]) -> (Self, Vec<String>) {
        let mut selected = BTreeMap::new();
        let mut missing = Vec::new();
        for name in requested {
            match self.servers.get(name) {
                Some(entry) => {
                    selected.insert(name.clone(), entry.clone());
                }
                None => missing.push(name.clone()),
            }
        }
        (Self { servers: selected }, missing)
    }

    pub fn to_value(&self) -> serde_json::Value {
        let servers: serde_json::Map<String, serde_json::Value> = self
            .servers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        serde_json::json!({ "mcpServers": servers })
    }
}

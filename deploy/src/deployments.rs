use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::error::DeployError;

/// A deployed program, with the state account its constructor created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    /// Address used to talk to the deployment (the state account)
    pub address: String,
    pub program_id: String,
    /// Constructor arguments, as passed
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
}

impl Deployment {
    pub fn new(address: Pubkey, program_id: Pubkey, args: Vec<serde_json::Value>) -> Self {
        Self {
            address: address.to_string(),
            program_id: program_id.to_string(),
            args,
            transaction: None,
        }
    }

    pub fn address(&self) -> Result<Pubkey, DeployError> {
        parse_pubkey(&self.address)
    }

    pub fn program_id(&self) -> Result<Pubkey, DeployError> {
        parse_pubkey(&self.program_id)
    }
}

fn parse_pubkey(value: &str) -> Result<Pubkey, DeployError> {
    value.parse().map_err(|_| DeployError::InvalidRecord(value.to_string()))
}

/// Named deployment records of one network, stored as `<dir>/<network>/<name>.json`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deployments {
    records: BTreeMap<String, Deployment>,
}

impl Deployments {
    pub fn get(&self, name: &str) -> Result<&Deployment, DeployError> {
        self.records
            .get(name)
            .ok_or_else(|| DeployError::MissingDeployment(name.to_string()))
    }

    pub fn save(&mut self, name: &str, deployment: Deployment) {
        self.records.insert(name.to_string(), deployment);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn load(dir: &Path, network: &str) -> Result<Self, DeployError> {
        let network_dir = dir.join(network);
        let mut deployments = Self::default();
        if !network_dir.exists() {
            return Ok(deployments);
        }

        for entry in fs::read_dir(&network_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let name = match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            let deployment: Deployment = serde_json::from_str(&fs::read_to_string(&path)?)?;
            deployments.records.insert(name, deployment);
        }
        Ok(deployments)
    }

    pub fn persist(&self, dir: &Path, network: &str) -> Result<Vec<PathBuf>, DeployError> {
        let network_dir = dir.join(network);
        fs::create_dir_all(&network_dir)?;

        let mut written = Vec::with_capacity(self.records.len());
        for (name, deployment) in &self.records {
            let path = network_dir.join(format!("{}.json", name));
            fs::write(&path, serde_json::to_string_pretty(deployment)?)?;
            written.push(path);
        }
        Ok(written)
    }
}

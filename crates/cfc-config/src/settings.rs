// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Typed view of the resolved console configuration.
//!
//! The same type doubles as the schema root: every key is optional in the
//! files and falls back to the defaults below.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

pub const DEFAULT_BOOTSTRAP_URL: &str =
    "https://raw.githubusercontent.com/danhigham/cf-console/master/install.sh";
pub const DEFAULT_ENDPOINT_DOMAIN: &str = "tmate.io";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConsoleSettings {
    /// Host CLI binary used as the platform command channel
    pub cf_binary: String,

    /// Program used for the interactive hand-off
    pub ssh_binary: String,

    /// Extra arguments placed before the endpoint on the hand-off command line
    #[serde(deserialize_with = "string_or_list")]
    #[schemars(with = "StringOrList")]
    pub ssh_args: Vec<String>,

    /// Location of the remote-access helper install script
    pub bootstrap_url: String,

    /// Domain the helper's endpoints live under
    pub endpoint_domain: String,

    /// Delay between two log polls while waiting for the endpoint
    #[schemars(range(min = 1))]
    pub poll_interval_ms: u64,

    /// Upper bound on endpoint discovery
    #[schemars(range(min = 1))]
    pub max_wait_secs: u64,

    /// Timeout applied to every single platform call
    #[schemars(range(min = 1))]
    pub call_timeout_secs: u64,

    /// Extra attempts for platform calls that fail at the transport level
    pub call_retries: u32,

    /// Instance scoped by discovery on legacy backends
    pub legacy_instance_index: InstanceIndexPolicy,

    /// Instance scoped by discovery on next-generation backends
    pub next_gen_instance_index: InstanceIndexPolicy,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            cf_binary: "cf".to_string(),
            ssh_binary: "ssh".to_string(),
            ssh_args: Vec::new(),
            bootstrap_url: DEFAULT_BOOTSTRAP_URL.to_string(),
            endpoint_domain: DEFAULT_ENDPOINT_DOMAIN.to_string(),
            poll_interval_ms: 2_000,
            max_wait_secs: 600,
            call_timeout_secs: 60,
            call_retries: 2,
            legacy_instance_index: InstanceIndexPolicy::Rule(IndexRule::NewInstance),
            next_gen_instance_index: InstanceIndexPolicy::Rule(IndexRule::LastExisting),
        }
    }
}

impl ConsoleSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

/// Named ways of picking the instance index that discovery listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum IndexRule {
    /// The instance added by provisioning (index = original count)
    NewInstance,
    /// The highest-numbered instance that already existed (original count - 1)
    LastExisting,
}

/// Either a named rule or an explicit instance index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum InstanceIndexPolicy {
    Rule(IndexRule),
    Fixed(u32),
}

impl InstanceIndexPolicy {
    /// Resolve against the instance count recorded before any mutation.
    pub fn resolve(self, original_instances: u32) -> u32 {
        match self {
            InstanceIndexPolicy::Rule(IndexRule::NewInstance) => original_instances,
            InstanceIndexPolicy::Rule(IndexRule::LastExisting) => original_instances.saturating_sub(1),
            InstanceIndexPolicy::Fixed(index) => index,
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
enum StringOrList {
    List(Vec<String>),
    Joined(String),
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::List(items) => items,
        StringOrList::Joined(joined) => joined.split_whitespace().map(str::to_string).collect(),
    })
}

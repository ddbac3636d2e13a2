use std::collections::HashSet;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::utils::secrets_match;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
pub const EVENT_HEADER: &str = "x-github-event";

/// Computes the `sha256=<hex>` signature GitHub sends for `body`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("hmac takes keys of any size"));
    mac.update(body);
    let digest = mac.finalize().into_bytes();

    let mut out = String::with_capacity(7 + digest.len() * 2);
    out.push_str("sha256=");
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Checks a signature header against the raw body in constant time.
pub fn verify_signature(secret: &str, body: &[u8], header: &str) -> bool {
    secrets_match(&sign(secret, body), header.trim())
}

#[derive(Debug, Default, Deserialize)]
pub struct PushPayload {
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
    pub repository: Option<Repository>,
    #[serde(default)]
    pub commits: Vec<Commit>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Repository {
    pub full_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub added: Vec<String>,
    #[serde(default)]
    pub modified: Vec<String>,
    #[serde(default)]
    pub removed: Vec<String>,
}

impl PushPayload {
    /// Every path added, modified or removed across all commits, first occurrence first.
    pub fn changed_paths(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.commits
            .iter()
            .flat_map(|c| c.added.iter().chain(&c.modified).chain(&c.removed))
            .map(String::as_str)
            .filter(|path| seen.insert(*path))
            .collect()
    }

    pub fn repository_name(&self) -> Option<&str> {
        self.repository.as_ref()?.full_name.as_deref()
    }
}

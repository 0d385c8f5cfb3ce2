use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical execution-client identifier, independent of how any site spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    #[default]
    Nethermind,
    Geth,
    Besu,
    Erigon,
    Reth,
}

impl ClientKind {
    pub const ALL: [ClientKind; 5] = [
        ClientKind::Nethermind,
        ClientKind::Geth,
        ClientKind::Besu,
        ClientKind::Erigon,
        ClientKind::Reth,
    ];

    /// Lowercase identifier used in storage and on the command line.
    pub fn id(&self) -> &'static str {
        match self {
            ClientKind::Nethermind => "nethermind",
            ClientKind::Geth => "geth",
            ClientKind::Besu => "besu",
            ClientKind::Erigon => "erigon",
            ClientKind::Reth => "reth",
        }
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientKind::Nethermind => "Nethermind",
            ClientKind::Geth => "Geth",
            ClientKind::Besu => "Besu",
            ClientKind::Erigon => "Erigon",
            ClientKind::Reth => "Reth",
        };
        f.write_str(name)
    }
}

impl FromStr for ClientKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        ClientKind::ALL
            .into_iter()
            .find(|c| c.id() == wanted)
            .ok_or_else(|| Error::Config(format!("invalid client: {}", s)))
    }
}

/// Source-specific spellings of each canonical client.
pub type AliasTable = &'static [(ClientKind, &'static [&'static str])];

pub const ETHERNETS_ALIASES: AliasTable = &[
    (ClientKind::Nethermind, &["nethermind"]),
    (ClientKind::Geth, &["geth"]),
    (ClientKind::Besu, &["besu"]),
    (ClientKind::Erigon, &["erigon"]),
    (ClientKind::Reth, &["reth"]),
];

// Ethernodes lists geth and go-ethereum as separate rows.
pub const ETHERNODES_ALIASES: AliasTable = &[
    (ClientKind::Nethermind, &["nethermind"]),
    (ClientKind::Geth, &["geth", "go-ethereum"]),
    (ClientKind::Besu, &["besu"]),
    (ClientKind::Erigon, &["erigon"]),
    (ClientKind::Reth, &["reth"]),
];

/// Returns true when `label`, as printed by a site, names `client`.
pub fn label_matches(table: AliasTable, label: &str, client: ClientKind) -> bool {
    let label = label.trim().to_lowercase();
    table
        .iter()
        .filter(|(kind, _)| *kind == client)
        .flat_map(|(_, spellings)| spellings.iter())
        .any(|spelling| *spelling == label)
}

/// Returns true when `label` is the site's grand-total row.
pub fn is_total_label(label: &str) -> bool {
    label.trim().eq_ignore_ascii_case("total")
}

//! Common types used across the githost utilities.

use clap::ValueEnum;
use std::fmt;

/// The ssh public key types sshd may present to the key authorizer.
///
/// This is a closed set: a key type outside it is a usage error at the
/// CLI boundary, never something the scan has to cope with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum KeyType {
    #[value(name = "sk-ecdsa-sha2-nistp256@openssh.com")]
    SkEcdsaSha2Nistp256,
    #[value(name = "ecdsa-sha2-nistp256")]
    EcdsaSha2Nistp256,
    #[value(name = "ecdsa-sha2-nistp384")]
    EcdsaSha2Nistp384,
    #[value(name = "ecdsa-sha2-nistp521")]
    EcdsaSha2Nistp521,
    #[value(name = "sk-ssh-ed25519@openssh.com")]
    SkSshEd25519,
    #[value(name = "ssh-ed25519")]
    SshEd25519,
    #[value(name = "ssh-dss")]
    SshDss,
    #[value(name = "ssh-rsa")]
    SshRsa,
}

impl KeyType {
    /// Wire-format name, exactly as it appears in an authorized_keys line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SkEcdsaSha2Nistp256 => "sk-ecdsa-sha2-nistp256@openssh.com",
            Self::EcdsaSha2Nistp256 => "ecdsa-sha2-nistp256",
            Self::EcdsaSha2Nistp384 => "ecdsa-sha2-nistp384",
            Self::EcdsaSha2Nistp521 => "ecdsa-sha2-nistp521",
            Self::SkSshEd25519 => "sk-ssh-ed25519@openssh.com",
            Self::SshEd25519 => "ssh-ed25519",
            Self::SshDss => "ssh-dss",
            Self::SshRsa => "ssh-rsa",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

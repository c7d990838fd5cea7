//! Client-side model of the Squads v4 multisig program: account layouts,
//! PDA derivation, instruction builders, and status normalization.

pub mod instructions;
pub mod state;
pub mod status;

use solana_sdk::{hash::hashv, pubkey::Pubkey};

pub const ID: Pubkey = solana_sdk::pubkey!("SQDS4ep65T869zMMBKyuUq6aD6EgTu8psMjkvj52pCf");

pub const SEED_PREFIX: &[u8] = b"multisig";
pub const SEED_VAULT: &[u8] = b"vault";
pub const SEED_TRANSACTION: &[u8] = b"transaction";
pub const SEED_PROPOSAL: &[u8] = b"proposal";

/// 8-byte anchor discriminator for an account type, `sha256("account:<Name>")`.
pub fn account_discriminator(name: &str) -> [u8; 8] {
    let hash = hashv(&[b"account:", name.as_bytes()]);
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash.to_bytes()[..8]);
    disc
}

/// 8-byte anchor discriminator for an instruction, `sha256("global:<name>")`.
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    let hash = hashv(&[b"global:", name.as_bytes()]);
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&hash.to_bytes()[..8]);
    disc
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("account data too short for discriminator")]
    TooShort,
    #[error("discriminator mismatch, expected {expected}")]
    Discriminator { expected: &'static str },
    #[error("borsh deserialization failed: {0}")]
    Borsh(#[from] std::io::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_discriminators() {
        // known anchor discriminator for the squads v4 Multisig account
        assert_eq!(
            account_discriminator("Multisig"),
            [224, 116, 121, 186, 68, 161, 79, 236]
        );
        // instruction and account namespaces must never collide
        assert_ne!(
            instruction_discriminator("proposal_create"),
            account_discriminator("Proposal")
        );
    }
}

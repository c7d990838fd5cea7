//! Instruction builders for the proposal lifecycle. Data layout is the
//! anchor convention: 8-byte global discriminator followed by borsh args.

use {
    crate::{
        instruction_discriminator,
        state::{MultisigV4, VaultInstruction},
        ID,
    },
    borsh::{BorshDeserialize, BorshSerialize},
    solana_sdk::{
        instruction::{AccountMeta, Instruction},
        pubkey::Pubkey,
        system_program,
    },
};

#[derive(BorshSerialize, BorshDeserialize, Debug)]
pub struct VaultTransactionCreateArgs {
    pub transaction_index: u64,
    pub vault_index: u8,
    pub instruction: VaultInstruction,
    pub memo: Option<String>,
}

#[derive(BorshSerialize, BorshDeserialize, Debug)]
pub struct ProposalCreateArgs {
    pub transaction_index: u64,
    /// When set the proposal starts in Draft and needs explicit activation.
    pub draft: bool,
}

#[derive(BorshSerialize, BorshDeserialize, Debug)]
pub struct ProposalActivateArgs {
    pub transaction_index: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug)]
pub struct ProposalVoteArgs {
    pub transaction_index: u64,
    pub memo: Option<String>,
}

#[derive(BorshSerialize, BorshDeserialize, Debug)]
pub struct ProposalCancelArgs {
    pub transaction_index: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug)]
pub struct VaultTransactionExecuteArgs {
    pub transaction_index: u64,
}

fn encode<T: BorshSerialize>(name: &str, args: &T) -> Vec<u8> {
    let mut data = instruction_discriminator(name).to_vec();
    // borsh serialization of plain arg structs cannot fail
    data.extend(args.try_to_vec().unwrap());
    data
}

pub fn vault_transaction_create(
    multisig: &Pubkey,
    transaction_index: u64,
    creator: &Pubkey,
    vault_index: u8,
    instruction: VaultInstruction,
    memo: Option<String>,
) -> Instruction {
    let (transaction_pda, _) = MultisigV4::derive_transaction_pda(multisig, transaction_index);
    Instruction {
        program_id: ID,
        accounts: vec![
            AccountMeta::new(*multisig, false),
            AccountMeta::new(transaction_pda, false),
            AccountMeta::new(*creator, true),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: encode(
            "vault_transaction_create",
            &VaultTransactionCreateArgs {
                transaction_index,
                vault_index,
                instruction,
                memo,
            },
        ),
    }
}

pub fn proposal_create(
    multisig: &Pubkey,
    transaction_index: u64,
    creator: &Pubkey,
    draft: bool,
) -> Instruction {
    let (proposal_pda, _) = MultisigV4::derive_proposal_pda(multisig, transaction_index);
    Instruction {
        program_id: ID,
        accounts: vec![
            AccountMeta::new(*multisig, false),
            AccountMeta::new(proposal_pda, false),
            AccountMeta::new(*creator, true),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: encode(
            "proposal_create",
            &ProposalCreateArgs {
                transaction_index,
                draft,
            },
        ),
    }
}

pub fn proposal_activate(multisig: &Pubkey, transaction_index: u64, member: &Pubkey) -> Instruction {
    let (proposal_pda, _) = MultisigV4::derive_proposal_pda(multisig, transaction_index);
    Instruction {
        program_id: ID,
        accounts: vec![
            AccountMeta::new_readonly(*multisig, false),
            AccountMeta::new(proposal_pda, false),
            AccountMeta::new_readonly(*member, true),
        ],
        data: encode(
            "proposal_activate",
            &ProposalActivateArgs { transaction_index },
        ),
    }
}

fn vote_instruction(
    name: &str,
    multisig: &Pubkey,
    transaction_index: u64,
    member: &Pubkey,
) -> Instruction {
    let (proposal_pda, _) = MultisigV4::derive_proposal_pda(multisig, transaction_index);
    Instruction {
        program_id: ID,
        accounts: vec![
            AccountMeta::new_readonly(*multisig, false),
            AccountMeta::new(proposal_pda, false),
            AccountMeta::new_readonly(*member, true),
        ],
        data: encode(
            name,
            &ProposalVoteArgs {
                transaction_index,
                memo: None,
            },
        ),
    }
}

pub fn proposal_approve(multisig: &Pubkey, transaction_index: u64, member: &Pubkey) -> Instruction {
    vote_instruction("proposal_approve", multisig, transaction_index, member)
}

pub fn proposal_reject(multisig: &Pubkey, transaction_index: u64, member: &Pubkey) -> Instruction {
    vote_instruction("proposal_reject", multisig, transaction_index, member)
}

pub fn proposal_cancel(multisig: &Pubkey, transaction_index: u64, member: &Pubkey) -> Instruction {
    let (proposal_pda, _) = MultisigV4::derive_proposal_pda(multisig, transaction_index);
    Instruction {
        program_id: ID,
        accounts: vec![
            AccountMeta::new_readonly(*multisig, false),
            AccountMeta::new(proposal_pda, false),
            AccountMeta::new_readonly(*member, true),
        ],
        data: encode("proposal_cancel", &ProposalCancelArgs { transaction_index }),
    }
}

/// The wrapped instruction's accounts (then its program id) trail the fixed
/// accounts so the program can reconstruct and invoke the inner call.
pub fn vault_transaction_execute(
    multisig: &Pubkey,
    transaction_index: u64,
    member: &Pubkey,
    wrapped: &VaultInstruction,
) -> Instruction {
    let (proposal_pda, _) = MultisigV4::derive_proposal_pda(multisig, transaction_index);
    let (transaction_pda, _) = MultisigV4::derive_transaction_pda(multisig, transaction_index);
    let mut accounts = vec![
        AccountMeta::new_readonly(*multisig, false),
        AccountMeta::new(proposal_pda, false),
        AccountMeta::new_readonly(transaction_pda, false),
        AccountMeta::new_readonly(*member, true),
    ];
    for spec in &wrapped.accounts {
        accounts.push(if spec.is_writable {
            AccountMeta::new(spec.address, false)
        } else {
            AccountMeta::new_readonly(spec.address, false)
        });
    }
    accounts.push(AccountMeta::new_readonly(wrapped.program_id, false));
    Instruction {
        program_id: ID,
        accounts,
        data: encode(
            "vault_transaction_execute",
            &VaultTransactionExecuteArgs { transaction_index },
        ),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state::AccountMetaSpec;

    #[test]
    fn test_create_encodes_discriminator_and_args() {
        let multisig = Pubkey::new_unique();
        let creator = Pubkey::new_unique();
        let wrapped = VaultInstruction {
            program_id: system_program::id(),
            accounts: vec![],
            data: vec![7; 4],
        };
        let ix = vault_transaction_create(&multisig, 3, &creator, 0, wrapped, None);
        assert_eq!(ix.program_id, ID);
        assert_eq!(ix.data[..8], instruction_discriminator("vault_transaction_create"));
        let args = VaultTransactionCreateArgs::try_from_slice(&ix.data[8..]).unwrap();
        assert_eq!(args.transaction_index, 3);
        assert_eq!(args.vault_index, 0);
        // creator signs, transaction pda is writable
        assert!(ix.accounts[2].is_signer);
        assert!(ix.accounts[1].is_writable);
    }

    #[test]
    fn test_execute_appends_wrapped_accounts() {
        let multisig = Pubkey::new_unique();
        let member = Pubkey::new_unique();
        let target = Pubkey::new_unique();
        let wrapped = VaultInstruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![AccountMetaSpec {
                address: target,
                is_signer: false,
                is_writable: true,
            }],
            data: vec![],
        };
        let ix = vault_transaction_execute(&multisig, 1, &member, &wrapped);
        assert_eq!(ix.accounts.len(), 6);
        assert_eq!(ix.accounts[4].pubkey, target);
        assert!(ix.accounts[4].is_writable);
        assert_eq!(ix.accounts[5].pubkey, wrapped.program_id);
    }
}

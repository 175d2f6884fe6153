use anchor_lang::prelude::*;
use anchor_lang::Discriminator;
use ephemeral_vrf_sdk::instructions::{create_request_randomness_ix, RequestRandomnessParams};
use ephemeral_vrf_sdk::types::SerializableAccountMeta;

use crate::{
    constants::*,
    errors::ErrorCode,
    events::EntropyRequested,
    state::{Engine, EntropyStatus},
};

/// Convert an anchor Pubkey to the SDK's Pubkey (same 32 bytes, different crate).
fn to_sdk_pubkey(p: &Pubkey) -> ephemeral_vrf_sdk::Pubkey {
    ephemeral_vrf_sdk::Pubkey::new_from_array(p.to_bytes())
}

const VRF_PROGRAM_ID_BYTES: [u8; 32] = ephemeral_vrf_sdk::consts::VRF_PROGRAM_ID.to_bytes();
const DEFAULT_QUEUE_BYTES: [u8; 32] = ephemeral_vrf_sdk::consts::DEFAULT_QUEUE.to_bytes();

pub static VRF_PROGRAM_ID: Pubkey = Pubkey::new_from_array(VRF_PROGRAM_ID_BYTES);
pub static DEFAULT_QUEUE: Pubkey = Pubkey::new_from_array(DEFAULT_QUEUE_BYTES);

#[derive(Accounts)]
pub struct RequestEntropy<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,

    #[account(
        mut,
        seeds = [SEED_ENGINE],
        bump = engine.bump,
        constraint = engine.is_operator(&payer.key()) @ ErrorCode::Unauthorized,
    )]
    pub engine: Box<Account<'info, Engine>>,

    /// CHECK: Our program's identity PDA, used to sign the VRF CPI.
    #[account(seeds = [SEED_IDENTITY], bump)]
    pub program_identity: AccountInfo<'info>,

    /// CHECK: Oracle queue account
    #[account(mut, address = DEFAULT_QUEUE)]
    pub oracle_queue: AccountInfo<'info>,

    /// CHECK: MagicBlock VRF program
    #[account(address = VRF_PROGRAM_ID)]
    pub vrf_program: AccountInfo<'info>,

    /// CHECK: SlotHashes sysvar
    #[account(address = anchor_lang::solana_program::sysvar::slot_hashes::ID)]
    pub slot_hashes: AccountInfo<'info>,

    pub system_program: Program<'info, System>,
}

/// Asks the oracle for a fresh entropy word. The previous word stays unusable until the
/// callback lands.
pub fn handler(ctx: Context<RequestEntropy>) -> Result<()> {
    let engine_key = ctx.accounts.engine.key();
    {
        let engine = &ctx.accounts.engine;
        require!(engine.active_runs == 0, ErrorCode::RunsInProgress);
        require!(
            engine.entropy_status != EntropyStatus::Requested as u8,
            ErrorCode::EntropyRequestPending
        );
    }
    let request = ctx
        .accounts
        .engine
        .entropy_requests
        .checked_add(1)
        .ok_or(ErrorCode::MathOverflow)?;

    let mut caller_seed = [0u8; 32];
    caller_seed[..8].copy_from_slice(&request.to_le_bytes());
    caller_seed[8..].copy_from_slice(&engine_key.to_bytes()[..24]);

    let sdk_ix = create_request_randomness_ix(RequestRandomnessParams {
        payer: to_sdk_pubkey(&ctx.accounts.payer.key()),
        oracle_queue: to_sdk_pubkey(&ctx.accounts.oracle_queue.key()),
        callback_program_id: to_sdk_pubkey(&crate::ID),
        callback_discriminator: crate::instruction::EntropyCallback::DISCRIMINATOR.to_vec(),
        caller_seed,
        accounts_metas: Some(vec![SerializableAccountMeta {
            pubkey: to_sdk_pubkey(&engine_key),
            is_signer: false,
            is_writable: true,
        }]),
        ..Default::default()
    });

    // Manually convert the SDK instruction to anchor's solana_program types.
    let ix = {
        let program_id = Pubkey::new_from_array(sdk_ix.program_id.to_bytes());
        let accounts: Vec<anchor_lang::solana_program::instruction::AccountMeta> = sdk_ix
            .accounts
            .iter()
            .map(|a| {
                let pubkey = Pubkey::new_from_array(a.pubkey.to_bytes());
                if a.is_writable {
                    anchor_lang::solana_program::instruction::AccountMeta::new(pubkey, a.is_signer)
                } else {
                    anchor_lang::solana_program::instruction::AccountMeta::new_readonly(
                        pubkey, a.is_signer,
                    )
                }
            })
            .collect();
        anchor_lang::solana_program::instruction::Instruction {
            program_id,
            accounts,
            data: sdk_ix.data,
        }
    };

    let identity_bump = ctx.bumps.program_identity;
    anchor_lang::solana_program::program::invoke_signed(
        &ix,
        &[
            ctx.accounts.payer.to_account_info(),
            ctx.accounts.program_identity.to_account_info(),
            ctx.accounts.oracle_queue.to_account_info(),
            ctx.accounts.slot_hashes.to_account_info(),
            ctx.accounts.system_program.to_account_info(),
        ],
        &[&[SEED_IDENTITY, &[identity_bump]]],
    )?;

    let engine = &mut ctx.accounts.engine;
    engine.entropy = [0u8; 32];
    engine.entropy_status = EntropyStatus::Requested as u8;
    engine.entropy_requests = request;

    emit!(EntropyRequested {
        request,
        payer: ctx.accounts.payer.key(),
    });

    Ok(())
}

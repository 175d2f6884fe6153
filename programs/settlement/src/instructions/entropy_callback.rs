use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::ErrorCode,
    events::EntropyFulfilled,
    state::{Engine, EntropyStatus},
};

const VRF_PROGRAM_IDENTITY_BYTES: [u8; 32] =
    ephemeral_vrf_sdk::consts::VRF_PROGRAM_IDENTITY.to_bytes();
const VRF_PROGRAM_IDENTITY: Pubkey = Pubkey::new_from_array(VRF_PROGRAM_IDENTITY_BYTES);

#[derive(Accounts)]
pub struct EntropyCallback<'info> {
    #[account(address = VRF_PROGRAM_IDENTITY)]
    pub vrf_program_identity: Signer<'info>,

    #[account(mut, seeds = [SEED_ENGINE], bump = engine.bump)]
    pub engine: Box<Account<'info, Engine>>,
}

pub fn handler(ctx: Context<EntropyCallback>, randomness: [u8; 32]) -> Result<()> {
    fulfill(&mut ctx.accounts.engine, randomness)
}

/// Stores an oracle word. Shared with the devnet mock path.
pub fn fulfill(engine: &mut Engine, randomness: [u8; 32]) -> Result<()> {
    require!(
        engine.entropy_status == EntropyStatus::Requested as u8,
        ErrorCode::EntropyNotReady
    );
    engine.entropy = randomness;
    engine.entropy_status = EntropyStatus::Ready as u8;

    emit!(EntropyFulfilled {
        request: engine.entropy_requests,
        entropy: randomness,
    });

    Ok(())
}

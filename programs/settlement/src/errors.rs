use anchor_lang::prelude::*;

#[error_code]
pub enum ErrorCode {
    #[msg("Math overflow")]
    MathOverflow,
    #[msg("Pool balance would go negative")]
    PoolUnderflow,
    #[msg("Held assets no longer cover pool balances")]
    Insolvent,
    #[msg("Invalid pool id")]
    InvalidPool,
    #[msg("Invalid run kind")]
    InvalidRunKind,
    #[msg("A run of this kind is already in progress for another level")]
    RunAlreadyInProgress,
    #[msg("Resume parameters do not match the run in progress")]
    RunParamsMismatch,
    #[msg("No run of this kind is in progress")]
    NoRunInProgress,
    #[msg("Runs are still in progress")]
    RunsInProgress,
    #[msg("Already claimed")]
    AlreadyClaimed,
    #[msg("Claimant is not a winner of this round")]
    NotAWinner,
    #[msg("Claim round is not active")]
    ClaimRoundInactive,
    #[msg("Claim round already exists for this level")]
    ClaimRoundExists,
    #[msg("Invalid category")]
    InvalidCategory,
    #[msg("Decimator denominator must be between 2 and 20")]
    InvalidDenominator,
    #[msg("Weight must be greater than zero")]
    ZeroWeight,
    #[msg("Decimator book is frozen by a run")]
    DecimatorFrozen,
    #[msg("Decimator book is required for this run")]
    MissingDecimatorBook,
    #[msg("Reward queue is full")]
    RewardQueueFull,
    #[msg("Nothing to withdraw")]
    NothingToWithdraw,
    #[msg("Unauthorized")]
    Unauthorized,
    #[msg("Invalid admin address")]
    InvalidAdmin,
    #[msg("Invalid engine config")]
    InvalidConfig,
    #[msg("Entropy is not ready")]
    EntropyNotReady,
    #[msg("Entropy request already pending")]
    EntropyRequestPending,
    #[msg("No exterminated category for this level")]
    NoExterminatedCategory,
    #[msg("Category already exterminated for this level")]
    AlreadyExterminated,
    #[msg("Too many tickets in one insert")]
    TooManyTickets,
    #[msg("Ticket pool account does not match level and category")]
    InvalidTicketPool,
    #[msg("Level mismatch")]
    LevelMismatch,
    #[msg("Level is still active")]
    LevelStillActive,
    #[msg("Record table is full")]
    TableFull,
    #[msg("Record index out of range")]
    RecordOutOfRange,
    #[msg("Invalid vault account")]
    InvalidVault,
    #[msg("Invalid token account")]
    InvalidTokenAccount,
}

use anchor_lang::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BondRouteError {
    /// Routing is switched off.
    Disabled,
    /// The instrument refused this beneficiary or amount.
    Rejected,
}

pub type RouteResult = core::result::Result<(), BondRouteError>;

/// Best-effort redirection of part of a payout into the bond instrument.
/// Callers must pay the beneficiary directly when this returns an error.
pub trait BondRouter {
    fn try_route(&mut self, beneficiary: &Pubkey, amount: u64) -> RouteResult;
}

pub struct DisabledBondRouter;

impl BondRouter for DisabledBondRouter {
    fn try_route(&mut self, _beneficiary: &Pubkey, _amount: u64) -> RouteResult {
        Err(BondRouteError::Disabled)
    }
}

/// Router backed by the engine's bond vault. Accepted amounts are moved out of the main vault
/// by the instruction once the run step completes.
pub struct VaultBondRouter {
    pub enabled: bool,
    pub min_amount: u64,
    pub routed: u64,
}

impl VaultBondRouter {
    pub fn new(enabled: bool, min_amount: u64) -> Self {
        Self {
            enabled,
            min_amount,
            routed: 0,
        }
    }
}

impl BondRouter for VaultBondRouter {
    fn try_route(&mut self, _beneficiary: &Pubkey, amount: u64) -> RouteResult {
        if !self.enabled {
            return Err(BondRouteError::Disabled);
        }
        if amount == 0 || amount < self.min_amount {
            return Err(BondRouteError::Rejected);
        }
        self.routed = self.routed.checked_add(amount).ok_or(BondRouteError::Rejected)?;
        Ok(())
    }
}

/// Accepts routes until an optional number of acceptances is used up, keeping a log of what
/// it accepted.
#[derive(Clone, Debug, Default)]
pub struct RecordingBondRouter {
    pub remaining: Option<u32>,
    pub accepted: Vec<(Pubkey, u64)>,
    pub rejected: u32,
}

impl RecordingBondRouter {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            remaining: Some(capacity),
            ..Self::default()
        }
    }

    pub fn total_accepted(&self) -> u64 {
        self.accepted.iter().map(|(_, a)| *a).sum()
    }
}

impl BondRouter for RecordingBondRouter {
    fn try_route(&mut self, beneficiary: &Pubkey, amount: u64) -> RouteResult {
        if let Some(left) = self.remaining.as_mut() {
            if *left == 0 {
                self.rejected += 1;
                return Err(BondRouteError::Rejected);
            }
            *left -= 1;
        }
        self.accepted.push((*beneficiary, amount));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_router_rejects_small_routes() {
        let who = Pubkey::new_from_array([1; 32]);
        let mut r = VaultBondRouter::new(true, 100);
        assert_eq!(r.try_route(&who, 99), Err(BondRouteError::Rejected));
        assert_eq!(r.try_route(&who, 0), Err(BondRouteError::Rejected));
        assert_eq!(r.try_route(&who, 100), Ok(()));
        assert_eq!(r.routed, 100);

        let mut off = VaultBondRouter::new(false, 0);
        assert_eq!(off.try_route(&who, 100), Err(BondRouteError::Disabled));
    }

    #[test]
    fn recording_router_runs_out() {
        let who = Pubkey::new_from_array([2; 32]);
        let mut r = RecordingBondRouter::with_capacity(1);
        assert!(r.try_route(&who, 5).is_ok());
        assert_eq!(r.try_route(&who, 6), Err(BondRouteError::Rejected));
        assert_eq!(r.total_accepted(), 5);
        assert_eq!(r.rejected, 1);
    }
}

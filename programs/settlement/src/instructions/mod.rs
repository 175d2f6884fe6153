pub mod add_tickets;
pub mod admin_abort_run;
pub mod advance_level;
pub mod claim_decimator;
pub mod close_ticket_pool;
pub mod drain_rewards;
pub mod entropy_callback;
pub mod fund_pool;
pub mod init_decimator_book;
pub mod init_engine;
pub mod init_ticket_pool;
pub mod mark_exterminated;
#[cfg(feature = "devnet")]
pub mod mock_fulfill_entropy;
pub mod prune_claim_round;
pub mod record_decimator_burn;
pub mod request_entropy;
pub mod start_or_resume_run;
pub mod transfer_admin;
pub mod update_engine_config;
pub mod withdraw;

pub use add_tickets::*;
pub use admin_abort_run::*;
pub use advance_level::*;
pub use claim_decimator::*;
pub use close_ticket_pool::*;
pub use drain_rewards::*;
pub use entropy_callback::*;
pub use fund_pool::*;
pub use init_decimator_book::*;
pub use init_engine::*;
pub use init_ticket_pool::*;
pub use mark_exterminated::*;
#[cfg(feature = "devnet")]
pub use mock_fulfill_entropy::*;
pub use prune_claim_round::*;
pub use record_decimator_burn::*;
pub use request_entropy::*;
pub use start_or_resume_run::*;
pub use transfer_admin::*;
pub use update_engine_config::*;
pub use withdraw::*;

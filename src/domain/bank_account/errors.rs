use rust_decimal::Decimal;
use uuid::Uuid;

use crate::event_sourcing::core::AggregateError;

// ============================================================================
// Bank Account Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BankAccountError {
    #[error("Account {account_id} is closed")]
    AccountClosed { account_id: Uuid },

    #[error("Insufficient funds in account {account_id}: balance {balance}, overdraft limit {overdraft_limit}, amount {amount}")]
    InsufficientFunds {
        account_id: Uuid,
        balance: Decimal,
        overdraft_limit: Decimal,
        amount: Decimal,
    },

    #[error("Amount {amount} would take the balance of account {account_id} out of range")]
    AmountOutOfRange { account_id: Uuid, amount: Decimal },

    #[error("Overdraft limit cannot be negative: {0}")]
    NegativeOverdraftLimit(Decimal),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl BankAccountError {
    /// Business rule violations, as opposed to failures of the event machinery.
    pub fn is_domain_error(&self) -> bool {
        !matches!(self, BankAccountError::Aggregate(_))
    }
}

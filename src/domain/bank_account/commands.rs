use rust_decimal::Decimal;
use uuid::Uuid;

// ============================================================================
// Bank Account Commands - Represent user intent
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum BankAccountCommand {
    OpenAccount {
        account_id: Uuid,
        full_name: String,
        email_address: String,
    },
    AppendTransaction {
        account_id: Uuid,
        amount: Decimal,
        transaction_id: Option<Uuid>,
    },
    SetOverdraftLimit {
        account_id: Uuid,
        overdraft_limit: Decimal,
    },
    CloseAccount {
        account_id: Uuid,
    },
}

impl BankAccountCommand {
    pub fn account_id(&self) -> Uuid {
        match self {
            BankAccountCommand::OpenAccount { account_id, .. }
            | BankAccountCommand::AppendTransaction { account_id, .. }
            | BankAccountCommand::SetOverdraftLimit { account_id, .. }
            | BankAccountCommand::CloseAccount { account_id } => *account_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BankAccountCommand::OpenAccount { .. } => "OpenAccount",
            BankAccountCommand::AppendTransaction { .. } => "AppendTransaction",
            BankAccountCommand::SetOverdraftLimit { .. } => "SetOverdraftLimit",
            BankAccountCommand::CloseAccount { .. } => "CloseAccount",
        }
    }
}

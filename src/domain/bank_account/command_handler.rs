use uuid::Uuid;

use crate::event_sourcing::core::Aggregate;
use crate::event_sourcing::store::{Repository, RepositoryError};
use crate::utils::{retry_on_transient, IsTransient, RetryConfig};

use super::aggregate::BankAccount;
use super::commands::BankAccountCommand;
use super::errors::BankAccountError;

// ============================================================================
// Bank Account Command Handler
// ============================================================================
//
// Orchestrates: Command → Load → Aggregate → Pending Events → Event Store
//
// A version conflict means another writer saved first. The handler reloads
// the account and runs the command again; business rule violations are
// returned on the first attempt.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Domain(#[from] BankAccountError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Account already exists: {0}")]
    AlreadyExists(Uuid),
}

impl IsTransient for CommandError {
    fn is_transient(&self) -> bool {
        matches!(self, CommandError::Repository(e) if e.is_conflict())
    }
}

pub struct BankAccountCommandHandler {
    repository: Repository<BankAccount>,
    retry: RetryConfig,
}

impl BankAccountCommandHandler {
    pub fn new(repository: Repository<BankAccount>, retry: RetryConfig) -> Self {
        Self { repository, retry }
    }

    /// Handle a command and persist the resulting event.
    /// Returns the account version after the command.
    pub async fn handle(&self, command: BankAccountCommand) -> Result<u64, CommandError> {
        let account_id = command.account_id();

        let new_version = retry_on_transient(&self.retry, |attempt| {
            let command = command.clone();
            async move {
                tracing::debug!(
                    account_id = %account_id,
                    command = command.name(),
                    attempt = attempt,
                    "Handling command"
                );
                self.execute(command).await
            }
        })
        .await
        .into_result()?;

        tracing::info!(
            account_id = %account_id,
            command = command.name(),
            new_version = new_version,
            "✅ Command handled"
        );
        Ok(new_version)
    }

    pub async fn load(&self, account_id: Uuid) -> Result<BankAccount, CommandError> {
        Ok(self.repository.get(account_id).await?)
    }

    async fn execute(&self, command: BankAccountCommand) -> Result<u64, CommandError> {
        let mut account = match command {
            BankAccountCommand::OpenAccount {
                account_id,
                full_name,
                email_address,
            } => {
                if self.repository.exists(account_id).await? {
                    return Err(CommandError::AlreadyExists(account_id));
                }
                BankAccount::open_with_id(account_id, &full_name, &email_address)?
            }
            BankAccountCommand::AppendTransaction {
                account_id,
                amount,
                transaction_id,
            } => {
                let mut account = self.repository.get(account_id).await?;
                account.append_transaction(amount, transaction_id)?;
                account
            }
            BankAccountCommand::SetOverdraftLimit {
                account_id,
                overdraft_limit,
            } => {
                let mut account = self.repository.get(account_id).await?;
                account.set_overdraft_limit(overdraft_limit)?;
                account
            }
            BankAccountCommand::CloseAccount { account_id } => {
                let mut account = self.repository.get(account_id).await?;
                account.close()?;
                account
            }
        };

        self.repository.save(&mut account).await?;
        Ok(account.version())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

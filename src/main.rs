use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use rust_decimal::Decimal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use eventsourcing_core::config::EventSourcingConfig;
use eventsourcing_core::domain::bank_account::{
    BankAccount, BankAccountCommand, BankAccountCommandHandler, BankAccountEvent, CommandError,
};
use eventsourcing_core::event_sourcing::core::Aggregate;
use eventsourcing_core::event_sourcing::store::{EventStore, InMemoryEventStore, Repository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,eventsourcing_core=debug")),
        )
        .init();

    tracing::info!("🚀 Starting event sourcing bank account demo");

    // === 1. Configuration ===
    let config = EventSourcingConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        compression = ?config.compression,
        max_attempts = config.retry.max_attempts,
        "Configuration loaded"
    );

    // === 2. Store, mapper and repository ===
    let store = Arc::new(InMemoryEventStore::new());
    let mapper = config
        .mapper::<BankAccountEvent>()
        .context("Failed to register bank account topics")?;
    let repository = Repository::<BankAccount>::new(store.clone(), mapper.clone());
    let handler = BankAccountCommandHandler::new(repository, config.retry.clone());

    // === 3. Bank account lifecycle ===
    let account_id = Uuid::new_v4();
    let amount = |value: &str| Decimal::from_str(value).context("Invalid amount");

    let commands = vec![
        BankAccountCommand::OpenAccount {
            account_id,
            full_name: "Alice".to_string(),
            email_address: "alice@example.com".to_string(),
        },
        BankAccountCommand::AppendTransaction {
            account_id,
            amount: amount("10.00")?,
            transaction_id: Some(Uuid::new_v4()),
        },
        BankAccountCommand::AppendTransaction {
            account_id,
            amount: amount("10.00")?,
            transaction_id: None,
        },
        BankAccountCommand::AppendTransaction {
            account_id,
            amount: amount("-15.00")?,
            transaction_id: None,
        },
        BankAccountCommand::AppendTransaction {
            account_id,
            amount: amount("-15.00")?,
            transaction_id: None,
        },
        BankAccountCommand::SetOverdraftLimit {
            account_id,
            overdraft_limit: amount("100.00")?,
        },
        BankAccountCommand::AppendTransaction {
            account_id,
            amount: amount("-15.00")?,
            transaction_id: None,
        },
        BankAccountCommand::CloseAccount { account_id },
        BankAccountCommand::AppendTransaction {
            account_id,
            amount: amount("-15.00")?,
            transaction_id: None,
        },
    ];

    for command in commands {
        let name = command.name();
        match handler.handle(command).await {
            Ok(version) => tracing::info!(command = name, version = version, "Command accepted"),
            Err(CommandError::Domain(e)) => {
                tracing::warn!(command = name, error = %e, "Command rejected")
            }
            Err(e) => return Err(e).context(format!("Command {name} failed")),
        }
    }

    // === 4. Reconstruct from the store ===
    let account = handler.load(account_id).await?;
    tracing::info!(
        account_id = %account.id(),
        version = account.version(),
        balance = %account.balance(),
        overdraft_limit = %account.overdraft_limit(),
        is_closed = account.is_closed(),
        "📒 Account rebuilt from stored events"
    );

    for record in store.load(account_id).await? {
        let bytes = record.state.len();
        let event = mapper.from_stored(record)?;
        tracing::debug!(
            version = event.originator_version(),
            topic = event.topic(),
            stored_bytes = bytes,
            "Stored event"
        );
    }

    tracing::info!("🎉 Demo complete!");
    Ok(())
}

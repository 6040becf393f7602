// ============================================================================
// Bank Account Domain - Business Logic for BankAccount Aggregate
// ============================================================================
//
// This module contains ALL BankAccount-specific code:
// - Events (Opened, TransactionAppended, OverdraftLimitSet, Closed)
// - Commands (OpenAccount, AppendTransaction, ...)
// - Errors (BankAccountError enum)
// - Aggregate (BankAccount with business logic)
// - Command Handler (BankAccountCommandHandler)
//
// ============================================================================

pub mod aggregate;
pub mod command_handler;
pub mod commands;
pub mod errors;
pub mod events;

// Re-export for convenience
pub use aggregate::*;
pub use command_handler::*;
pub use commands::*;
pub use errors::*;
pub use events::*;

// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Domain-specific aggregates built on the generic event sourcing
// infrastructure. Each aggregate has its own subdirectory with:
// - Events
// - Commands
// - Errors
// - Aggregate implementation
// - Command handler
//
// ============================================================================

pub mod bank_account;

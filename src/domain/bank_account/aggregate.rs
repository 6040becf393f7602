use rust_decimal::Decimal;
use uuid::Uuid;

use crate::event_sourcing::core::{Aggregate, AggregateHeader, DomainEvent, EventError};
use crate::fields;

use super::errors::BankAccountError;
use super::events::*;

// ============================================================================
// Bank Account Aggregate - Domain Logic
// ============================================================================
//
// Command methods check their preconditions first and only then trigger an
// event; a failed command leaves the account and its pending queue untouched.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct BankAccount {
    header: AggregateHeader<BankAccountEvent>,

    full_name: String,
    email_address: String,
    balance: Decimal,
    overdraft_limit: Decimal,
    is_closed: bool,
}

impl BankAccount {
    pub fn open(full_name: &str, email_address: &str) -> Result<Self, BankAccountError> {
        Self::open_with_id(Uuid::new_v4(), full_name, email_address)
    }

    pub fn open_with_id(
        account_id: Uuid,
        full_name: &str,
        email_address: &str,
    ) -> Result<Self, BankAccountError> {
        Ok(Self::create::<Opened>(
            account_id,
            fields! {
                "full_name" => full_name,
                "email_address" => email_address,
            },
        )?)
    }

    /// Positive amounts deposit, negative amounts withdraw.
    pub fn append_transaction(
        &mut self,
        amount: Decimal,
        transaction_id: Option<Uuid>,
    ) -> Result<(), BankAccountError> {
        self.check_account_is_not_closed()?;
        self.check_has_sufficient_funds(amount)?;

        self.trigger::<TransactionAppended>(fields! {
            "amount" => amount,
            "transaction_id" => transaction_id,
        })?;
        Ok(())
    }

    /// Zero is a valid limit; negative limits are rejected.
    pub fn set_overdraft_limit(&mut self, overdraft_limit: Decimal) -> Result<(), BankAccountError> {
        if overdraft_limit < Decimal::ZERO {
            return Err(BankAccountError::NegativeOverdraftLimit(overdraft_limit));
        }
        self.check_account_is_not_closed()?;

        self.trigger::<OverdraftLimitSet>(fields! { "overdraft_limit" => overdraft_limit })?;
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), BankAccountError> {
        self.check_account_is_not_closed()?;

        self.trigger::<Closed>(fields! {})?;
        Ok(())
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn email_address(&self) -> &str {
        &self.email_address
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn overdraft_limit(&self) -> Decimal {
        self.overdraft_limit
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    fn check_account_is_not_closed(&self) -> Result<(), BankAccountError> {
        if self.is_closed {
            return Err(BankAccountError::AccountClosed {
                account_id: self.id(),
            });
        }
        Ok(())
    }

    fn check_has_sufficient_funds(&self, amount: Decimal) -> Result<(), BankAccountError> {
        let Some(new_balance) = self.balance.checked_add(amount) else {
            return Err(BankAccountError::AmountOutOfRange {
                account_id: self.id(),
                amount,
            });
        };
        if new_balance < -self.overdraft_limit {
            return Err(BankAccountError::InsufficientFunds {
                account_id: self.id(),
                balance: self.balance,
                overdraft_limit: self.overdraft_limit,
                amount,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for BankAccount {
    type Event = BankAccountEvent;

    fn header(&self) -> &AggregateHeader<BankAccountEvent> {
        &self.header
    }

    fn header_mut(&mut self) -> &mut AggregateHeader<BankAccountEvent> {
        &mut self.header
    }

    fn created(
        header: AggregateHeader<BankAccountEvent>,
        event: &BankAccountEvent,
    ) -> Result<Self, EventError> {
        match event {
            BankAccountEvent::Opened(e) => Ok(Self {
                header,
                full_name: e.full_name.clone(),
                email_address: e.email_address.clone(),
                balance: Decimal::new(0, 2),
                overdraft_limit: Decimal::new(0, 2),
                is_closed: false,
            }),
            other => Err(EventError::UnexpectedKind {
                topic: other.topic(),
                version: 1,
            }),
        }
    }

    fn apply(&mut self, event: &BankAccountEvent) {
        match event {
            BankAccountEvent::Opened(_) => {
                // First event already applied
            }
            BankAccountEvent::TransactionAppended(e) => {
                // Commands never overflow; replayed history clamps.
                self.balance = self.balance.saturating_add(e.amount);
            }
            BankAccountEvent::OverdraftLimitSet(e) => {
                self.overdraft_limit = e.overdraft_limit;
            }
            BankAccountEvent::Closed(_) => {
                self.is_closed = true;
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

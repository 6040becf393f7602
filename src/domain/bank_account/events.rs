use rust_decimal::Decimal;
use uuid::Uuid;

use crate::event_sourcing::core::{DomainEvent, EventKind};
use crate::event_sourcing::transcoding::{ObjectState, Record, TopicRegistry, TranscodingError};

// ============================================================================
// Bank Account Events - Domain Events for BankAccount Aggregate
// ============================================================================

/// Bank Account Event - Union type for all bank account events
#[derive(Debug, Clone, PartialEq)]
pub enum BankAccountEvent {
    Opened(Opened),
    TransactionAppended(TransactionAppended),
    OverdraftLimitSet(OverdraftLimitSet),
    Closed(Closed),
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Account Opened - Initial event in account lifecycle
#[derive(Debug, Clone, PartialEq)]
pub struct Opened {
    pub full_name: String,
    pub email_address: String,
}

crate::impl_record!(Opened, "domain.bank_account#BankAccount.Opened", {
    full_name,
    email_address,
});

/// Transaction Appended - Signed amount moved in or out of the account
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionAppended {
    pub amount: Decimal,
    pub transaction_id: Option<Uuid>,
}

crate::impl_record!(
    TransactionAppended,
    "domain.bank_account#BankAccount.TransactionAppended",
    { amount, transaction_id }
);

#[derive(Debug, Clone, PartialEq)]
pub struct OverdraftLimitSet {
    pub overdraft_limit: Decimal,
}

crate::impl_record!(
    OverdraftLimitSet,
    "domain.bank_account#BankAccount.OverdraftLimitSet",
    { overdraft_limit }
);

/// Account Closed - No further transactions accepted
#[derive(Debug, Clone, PartialEq)]
pub struct Closed {}

crate::impl_record!(Closed, "domain.bank_account#BankAccount.Closed", {});

// ============================================================================
// Event Kind Wiring
// ============================================================================

macro_rules! bank_account_event_kind {
    ($($kind:ident),+ $(,)?) => {
        $(
            impl From<$kind> for BankAccountEvent {
                fn from(event: $kind) -> Self {
                    BankAccountEvent::$kind(event)
                }
            }

            impl EventKind for $kind {
                type Event = BankAccountEvent;

                fn into_event(self) -> BankAccountEvent {
                    BankAccountEvent::$kind(self)
                }
            }
        )+
    };
}

bank_account_event_kind!(Opened, TransactionAppended, OverdraftLimitSet, Closed);

impl DomainEvent for BankAccountEvent {
    fn topic(&self) -> &'static str {
        match self {
            BankAccountEvent::Opened(_) => Opened::TOPIC,
            BankAccountEvent::TransactionAppended(_) => TransactionAppended::TOPIC,
            BankAccountEvent::OverdraftLimitSet(_) => OverdraftLimitSet::TOPIC,
            BankAccountEvent::Closed(_) => Closed::TOPIC,
        }
    }

    fn is_created(&self) -> bool {
        matches!(self, BankAccountEvent::Opened(_))
    }

    fn to_state(&self) -> ObjectState {
        match self {
            BankAccountEvent::Opened(e) => e.to_state(),
            BankAccountEvent::TransactionAppended(e) => e.to_state(),
            BankAccountEvent::OverdraftLimitSet(e) => e.to_state(),
            BankAccountEvent::Closed(e) => e.to_state(),
        }
    }

    fn from_state(topic: &str, state: ObjectState) -> Result<Self, TranscodingError> {
        match topic {
            t if t == Opened::TOPIC => Opened::from_state(state).map(Into::into),
            t if t == TransactionAppended::TOPIC => {
                TransactionAppended::from_state(state).map(Into::into)
            }
            t if t == OverdraftLimitSet::TOPIC => {
                OverdraftLimitSet::from_state(state).map(Into::into)
            }
            t if t == Closed::TOPIC => Closed::from_state(state).map(Into::into),
            other => Err(TranscodingError::resolution(
                other,
                "not a BankAccount event",
            )),
        }
    }

    fn register_topics(registry: &mut TopicRegistry) -> Result<(), TranscodingError> {
        registry
            .register::<Opened>()?
            .register::<TransactionAppended>()?
            .register::<OverdraftLimitSet>()?
            .register::<Closed>()?;
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_sourcing::core::Event;
    use crate::event_sourcing::transcoding::Transcoder;
    use std::str::FromStr;

    fn transcoder() -> Transcoder {
        let mut registry = TopicRegistry::new();
        BankAccountEvent::register_topics(&mut registry).unwrap();
        Transcoder::new(registry)
    }

    #[test]
    fn test_every_variant_is_registered() {
        let transcoder = transcoder();
        for topic in [
            Opened::TOPIC,
            TransactionAppended::TOPIC,
            OverdraftLimitSet::TOPIC,
            Closed::TOPIC,
        ] {
            assert!(transcoder.registry().contains(topic), "{topic} missing");
        }
    }

    #[test]
    fn test_only_opened_is_created_kind() {
        let opened: BankAccountEvent = Opened {
            full_name: "Alice".to_string(),
            email_address: "alice@example.com".to_string(),
        }
        .into();
        let closed: BankAccountEvent = Closed {}.into();

        assert!(opened.is_created());
        assert!(!closed.is_created());
    }

    #[test]
    fn test_transaction_event_wire_format() {
        let id = Uuid::from_str("6ba7b811-9dad-11d1-80b4-00c04fd430c8").unwrap();
        let event = Event::with_timestamp(
            id,
            2,
            chrono::DateTime::parse_from_rfc3339("2024-03-01T09:30:00Z")
                .unwrap()
                .with_timezone(&chrono::Utc),
            BankAccountEvent::from(TransactionAppended {
                amount: Decimal::from_str("10.00").unwrap(),
                transaction_id: None,
            }),
        );

        let text = transcoder().encode(&event).unwrap();
        assert_eq!(
            text,
            concat!(
                r#"{"__class__": {"state": {"amount": {"__decimal__": "10.00"}, "#,
                r#""originator_id": {"UUID": "6ba7b8119dad11d180b400c04fd430c8"}, "#,
                r#""originator_version": 2, "#,
                r#""timestamp": {"ISO8601_datetime": "2024-03-01T09:30:00.000000+0000"}, "#,
                r#""transaction_id": null}, "#,
                r#""topic": "domain.bank_account#BankAccount.TransactionAppended"}}"#,
            )
        );

        let decoded: Event<BankAccountEvent> = transcoder().decode_as(&text).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_unknown_topic_is_rejected() {
        let result = BankAccountEvent::from_state("domain.bank_account#Other", ObjectState::new());
        assert!(matches!(result, Err(TranscodingError::Resolution { .. })));
    }
}

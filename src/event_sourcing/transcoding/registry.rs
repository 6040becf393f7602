use std::collections::HashMap;

use super::error::TranscodingError;
use super::record::{Record, TupleRecord};

// ============================================================================
// Topic Registry - Explicit Topic → Type Resolution
// ============================================================================
//
// Custom types are resolved by topic during decode. Topics are registered
// once at start-up; resolution splits `<module/path>#<qualified name>`,
// locates the module, then the (possibly nested) type inside it.
//
// ============================================================================

/// Topic of plain tuples, shared with records written by other producers.
pub const TUPLE_TOPIC: &str = "builtins#tuple";

/// How a registered type is laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Record,
    /// `None` accepts any arity.
    Tuple { arity: Option<usize> },
}

/// A parsed topic string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topic<'a> {
    pub module: &'a str,
    pub qualname: &'a str,
}

impl<'a> Topic<'a> {
    pub fn parse(topic: &'a str) -> Result<Self, TranscodingError> {
        let (module, qualname) = topic
            .split_once('#')
            .ok_or_else(|| TranscodingError::resolution(topic, "expected <module>#<name>"))?;

        if module.is_empty() || qualname.is_empty() {
            return Err(TranscodingError::resolution(topic, "empty module or type name"));
        }
        if qualname.split('.').any(str::is_empty) {
            return Err(TranscodingError::resolution(topic, "empty nested name segment"));
        }

        Ok(Self { module, qualname })
    }
}

#[derive(Debug, Clone)]
pub struct TopicRegistry {
    modules: HashMap<String, HashMap<String, Shape>>,
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicRegistry {
    /// Registry with the plain tuple topic pre-registered.
    pub fn new() -> Self {
        let mut modules: HashMap<String, HashMap<String, Shape>> = HashMap::new();
        if let Some((module, qualname)) = TUPLE_TOPIC.split_once('#') {
            modules
                .entry(module.to_string())
                .or_default()
                .insert(qualname.to_string(), Shape::Tuple { arity: None });
        }
        Self { modules }
    }

    pub fn register<T: Record>(&mut self) -> Result<&mut Self, TranscodingError> {
        self.insert(T::TOPIC, Shape::Record)?;
        Ok(self)
    }

    pub fn register_tuple<T: TupleRecord>(&mut self) -> Result<&mut Self, TranscodingError> {
        self.insert(T::TOPIC, Shape::Tuple { arity: Some(T::ARITY) })?;
        Ok(self)
    }

    /// Registering the same topic twice is allowed only with the same shape.
    fn insert(&mut self, topic: &str, shape: Shape) -> Result<(), TranscodingError> {
        let parsed = Topic::parse(topic)?;
        let types = self.modules.entry(parsed.module.to_string()).or_default();

        match types.get(parsed.qualname) {
            Some(existing) if *existing != shape => Err(TranscodingError::resolution(
                topic,
                format!("already registered as {existing:?}"),
            )),
            Some(_) => Ok(()),
            None => {
                types.insert(parsed.qualname.to_string(), shape);
                Ok(())
            }
        }
    }

    pub fn resolve(&self, topic: &str) -> Result<Shape, TranscodingError> {
        let parsed = Topic::parse(topic)?;

        let types = self.modules.get(parsed.module).ok_or_else(|| {
            TranscodingError::resolution(topic, format!("module {} is not registered", parsed.module))
        })?;

        types.get(parsed.qualname).copied().ok_or_else(|| {
            TranscodingError::resolution(
                topic,
                format!("type {} not found in module {}", parsed.qualname, parsed.module),
            )
        })
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.resolve(topic).is_ok()
    }

    pub fn len(&self) -> usize {
        self.modules.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_sourcing::transcoding::{ObjectState, Value};

    struct Outer;

    impl Record for Outer {
        const TOPIC: &'static str = "tests.registry#Outer.Inner";
        const FIELDS: &'static [&'static str] = &[];

        fn to_state(&self) -> ObjectState {
            ObjectState::new()
        }

        fn from_state(_state: ObjectState) -> Result<Self, TranscodingError> {
            Ok(Outer)
        }
    }

    struct Pair;

    impl TupleRecord for Pair {
        const TOPIC: &'static str = "tests.registry#Outer.Inner";
        const ARITY: usize = 2;

        fn to_items(&self) -> Vec<Value> {
            vec![Value::Null, Value::Null]
        }

        fn from_items(_items: Vec<Value>) -> Result<Self, TranscodingError> {
            Ok(Pair)
        }
    }

    #[test]
    fn test_parse_nested_topic() {
        let topic = Topic::parse("domain.bank_account#BankAccount.Opened").unwrap();
        assert_eq!(topic.module, "domain.bank_account");
        assert_eq!(topic.qualname, "BankAccount.Opened");
    }

    #[test]
    fn test_parse_rejects_malformed_topics() {
        for topic in ["no-separator", "#Name", "module#", "module#Outer..Inner"] {
            assert!(
                matches!(Topic::parse(topic), Err(TranscodingError::Resolution { .. })),
                "{topic} should not parse"
            );
        }
    }

    #[test]
    fn test_new_registry_knows_plain_tuples() {
        let registry = TopicRegistry::new();
        assert_eq!(
            registry.resolve(TUPLE_TOPIC).unwrap(),
            Shape::Tuple { arity: None }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = TopicRegistry::new();
        registry.register::<Outer>().unwrap();
        assert_eq!(registry.resolve(Outer::TOPIC).unwrap(), Shape::Record);

        // Idempotent for the same shape.
        registry.register::<Outer>().unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_conflicting_shape_is_rejected() {
        let mut registry = TopicRegistry::new();
        registry.register::<Outer>().unwrap();
        let result = registry.register_tuple::<Pair>();
        assert!(matches!(result, Err(TranscodingError::Resolution { .. })));
    }

    #[test]
    fn test_unknown_module_and_type() {
        let mut registry = TopicRegistry::new();
        registry.register::<Outer>().unwrap();

        let err = registry.resolve("tests.missing#Outer").unwrap_err();
        assert!(err.to_string().contains("module tests.missing"));

        let err = registry.resolve("tests.registry#Outer").unwrap_err();
        assert!(err.to_string().contains("type Outer not found"));
    }
}

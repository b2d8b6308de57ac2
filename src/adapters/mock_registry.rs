use crate::config::{FakerKind, MockRuleConfig, MockRuleStrategy};
use crate::domain::{SchemaModel, TypeRef};
use fake::faker::address::en::{CityName, CountryName};
use fake::faker::internet::en::{SafeEmail, Username};
use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_LIST_LENGTH: usize = 2;

/// Random source handed to every rule. Seed it for reproducible responses.
pub type MockRng = StdRng;

/// Produces a stand-in value for one type.
///
/// Leaf types expect a bare JSON value. Object-kind types may return a JSON
/// object whose entries override the generated fields, or `null`.
pub trait MockRule: Send + Sync {
    fn generate(&self, ty: &TypeRef, rng: &mut MockRng) -> Value;

    /// Number of elements for lists of this type. `None` keeps the registry default.
    fn list_length(&self, _rng: &mut MockRng) -> Option<usize> {
        None
    }
}

/// Adapter so plain closures can be registered as rules
pub struct FnRule<F>(pub F);

impl<F> MockRule for FnRule<F>
where
    F: Fn(&TypeRef, &mut MockRng) -> Value + Send + Sync,
{
    fn generate(&self, ty: &TypeRef, rng: &mut MockRng) -> Value {
        (self.0)(ty, rng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Int,
    Float,
    Boolean,
    Id,
}

impl ScalarKind {
    pub fn from_builtin(name: &str) -> Option<Self> {
        match name {
            "String" => Some(Self::String),
            "Int" => Some(Self::Int),
            "Float" => Some(Self::Float),
            "Boolean" => Some(Self::Boolean),
            "ID" => Some(Self::Id),
            _ => None,
        }
    }

    pub fn generate(self, rng: &mut MockRng) -> Value {
        match self {
            ScalarKind::String => json!(Word().fake_with_rng::<String, _>(rng)),
            ScalarKind::Int => json!(rng.gen_range(0..100i64)),
            ScalarKind::Float => json!(rng.gen_range(0.0..100.0f64)),
            ScalarKind::Boolean => json!(rng.gen_bool(0.5)),
            ScalarKind::Id => json!(random_uuid(rng)),
        }
    }
}

fn random_uuid(rng: &mut MockRng) -> String {
    let bytes: [u8; 16] = rng.gen();
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

/// Outcome of a registry lookup
pub enum Rule<'a> {
    Custom(&'a dyn MockRule),
    Scalar(ScalarKind),
    Enum(&'a [String]),
    /// Recurse into the object type's fields
    Structural,
}

impl Rule<'_> {
    /// Generated value, or `None` for the structural rule
    pub fn generate(&self, ty: &TypeRef, rng: &mut MockRng) -> Option<Value> {
        match self {
            Rule::Custom(rule) => Some(rule.generate(ty, rng)),
            Rule::Scalar(kind) => Some(kind.generate(rng)),
            Rule::Enum(values) if !values.is_empty() => {
                Some(json!(values[rng.gen_range(0..values.len())]))
            }
            Rule::Enum(_) => Some(Value::Null),
            Rule::Structural => None,
        }
    }

    pub fn list_length(&self, rng: &mut MockRng) -> Option<usize> {
        match self {
            Rule::Custom(rule) => rule.list_length(rng),
            _ => None,
        }
    }
}

/// Type name to rule mapping. Configured once at startup, read-only afterwards.
#[derive(Clone)]
pub struct MockRegistry {
    rules: HashMap<String, Arc<dyn MockRule>>,
    scalars: HashMap<String, ScalarKind>,
    enums: HashMap<String, Vec<String>>,
    list_length: usize,
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRegistry {
    pub fn new() -> Self {
        let scalars = ["String", "Int", "Float", "Boolean", "ID"]
            .into_iter()
            .filter_map(|name| ScalarKind::from_builtin(name).map(|k| (name.to_string(), k)))
            .collect();
        Self {
            rules: HashMap::new(),
            scalars,
            enums: HashMap::new(),
            list_length: DEFAULT_LIST_LENGTH,
        }
    }

    /// Registry with enum values and custom scalar fallbacks taken from `schema`.
    ///
    /// Custom scalars without a rule generate like `String`.
    pub fn for_schema(schema: &SchemaModel) -> Self {
        let mut registry = Self::new();
        for (name, values) in schema.enums() {
            registry.enums.insert(name.to_string(), values.to_vec());
        }
        for name in schema.custom_scalars() {
            registry.scalars.insert(name.to_string(), ScalarKind::String);
        }
        registry
    }

    pub fn with_list_length(mut self, list_length: usize) -> Self {
        self.list_length = list_length;
        self
    }

    /// Registers `rule` for `type_name`, replacing any previous rule.
    pub fn register(&mut self, type_name: impl Into<String>, rule: impl MockRule + 'static) {
        self.rules.insert(type_name.into(), Arc::new(rule));
    }

    pub fn register_fn<F>(&mut self, type_name: impl Into<String>, f: F)
    where
        F: Fn(&TypeRef, &mut MockRng) -> Value + Send + Sync + 'static,
    {
        self.register(type_name, FnRule(f));
    }

    /// Registers every configured rule, later entries replacing earlier ones.
    pub fn register_configs(&mut self, configs: &IndexMap<String, MockRuleConfig>) {
        for (type_name, config) in configs {
            self.register(type_name.clone(), ConfiguredRule::new(config.clone()));
        }
    }

    /// Custom rule, else the built-in scalar or enum rule, else the structural rule.
    pub fn resolve(&self, type_name: &str) -> Rule<'_> {
        if let Some(rule) = self.rules.get(type_name) {
            return Rule::Custom(rule.as_ref());
        }
        if let Some(kind) = self.scalars.get(type_name) {
            return Rule::Scalar(*kind);
        }
        if let Some(values) = self.enums.get(type_name) {
            return Rule::Enum(values);
        }
        Rule::Structural
    }

    pub fn list_length(&self) -> usize {
        self.list_length
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Rule built from a [`MockRuleConfig`] entry
pub struct ConfiguredRule {
    config: MockRuleConfig,
}

impl ConfiguredRule {
    pub fn new(config: MockRuleConfig) -> Self {
        Self { config }
    }

    fn faker_value(kind: FakerKind, rng: &mut MockRng) -> Value {
        let text: String = match kind {
            FakerKind::FirstName => FirstName().fake_with_rng(rng),
            FakerKind::LastName => LastName().fake_with_rng(rng),
            FakerKind::Name => Name().fake_with_rng(rng),
            FakerKind::Username => Username().fake_with_rng(rng),
            FakerKind::Email => SafeEmail().fake_with_rng(rng),
            FakerKind::Phone => PhoneNumber().fake_with_rng(rng),
            FakerKind::City => CityName().fake_with_rng(rng),
            FakerKind::Country => CountryName().fake_with_rng(rng),
            FakerKind::Word => Word().fake_with_rng(rng),
            FakerKind::Sentence => Sentence(1..10).fake_with_rng(rng),
            FakerKind::Paragraph => Paragraph(1..3).fake_with_rng(rng),
        };
        json!(text)
    }
}

impl MockRule for ConfiguredRule {
    fn generate(&self, _ty: &TypeRef, rng: &mut MockRng) -> Value {
        let config = &self.config;
        match config.strategy {
            MockRuleStrategy::Constant => config.value.clone(),
            MockRuleStrategy::Integer => {
                let min = config.min.unwrap_or(0.0) as i64;
                let max = config.max.unwrap_or(100.0) as i64;
                if min > max {
                    return Value::Null;
                }
                json!(rng.gen_range(min..=max))
            }
            MockRuleStrategy::Float => {
                let min = config.min.unwrap_or(0.0);
                let max = config.max.unwrap_or(100.0);
                // Reachable only for rules that skipped config validation.
                if !(min <= max && (max - min).is_finite()) {
                    return Value::Null;
                }
                json!(rng.gen_range(min..=max))
            }
            MockRuleStrategy::Boolean => json!(rng.gen_bool(0.5)),
            MockRuleStrategy::Uuid => json!(random_uuid(rng)),
            MockRuleStrategy::Enum => match config.values.as_deref() {
                Some(values) if !values.is_empty() => {
                    values[rng.gen_range(0..values.len())].clone()
                }
                _ => Value::Null,
            },
            MockRuleStrategy::Pattern => match &config.pattern {
                Some(pattern) => json!(generate_from_pattern(pattern, rng)),
                None => json!(""),
            },
            MockRuleStrategy::Faker => match config.faker {
                Some(kind) => Self::faker_value(kind, rng),
                None => Value::Null,
            },
            MockRuleStrategy::Fields => Value::Object(config.fields.clone().unwrap_or_default()),
        }
    }

    fn list_length(&self, _rng: &mut MockRng) -> Option<usize> {
        self.config.list_length
    }
}

/// `#` becomes a digit, `?` a lowercase letter, `*` either; other characters are kept.
pub fn generate_from_pattern(pattern: &str, rng: &mut MockRng) -> String {
    let mut result = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '#' => result.push(char::from(b'0' + rng.gen_range(0..10u8))),
            '?' => result.push(char::from(rng.gen_range(b'a'..=b'z'))),
            '*' => {
                if rng.gen_bool(0.5) {
                    result.push(char::from(b'0' + rng.gen_range(0..10u8)))
                } else {
                    result.push(char::from(rng.gen_range(b'a'..=b'z')))
                }
            }
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn string_ref() -> TypeRef {
        TypeRef::Scalar("String".into())
    }

    fn rule_config(strategy: MockRuleStrategy) -> MockRuleConfig {
        MockRuleConfig {
            strategy,
            value: Value::Null,
            min: None,
            max: None,
            values: None,
            pattern: None,
            faker: None,
            fields: None,
            list_length: None,
        }
    }

    #[test]
    fn test_builtin_scalars_resolve() {
        let registry = MockRegistry::new();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let int = registry
                .resolve("Int")
                .generate(&TypeRef::Scalar("Int".into()), &mut rng)
                .unwrap();
            let n = int.as_i64().unwrap();
            assert!((0..100).contains(&n));
        }
        let id = registry
            .resolve("ID")
            .generate(&TypeRef::Scalar("ID".into()), &mut rng)
            .unwrap();
        assert!(uuid::Uuid::parse_str(id.as_str().unwrap()).is_ok());
        assert!(registry
            .resolve("Boolean")
            .generate(&TypeRef::Scalar("Boolean".into()), &mut rng)
            .unwrap()
            .is_boolean());
        assert!(registry
            .resolve("String")
            .generate(&string_ref(), &mut rng)
            .unwrap()
            .is_string());
    }

    #[test]
    fn test_unknown_type_is_structural() {
        let registry = MockRegistry::new();
        assert!(matches!(registry.resolve("User"), Rule::Structural));
    }

    #[test]
    fn test_register_overrides_builtin() {
        let mut registry = MockRegistry::new();
        registry.register_fn("String", |_, _| json!("fixed"));
        registry.register_fn("String", |_, _| json!("second"));
        let mut rng = StdRng::seed_from_u64(1);
        let value = registry.resolve("String").generate(&string_ref(), &mut rng);
        assert_eq!(value, Some(json!("second")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_for_schema_seeds_enums_and_custom_scalars() {
        let schema = SchemaModel::load(
            "scalar Money enum Color { RED GREEN } type Query { c: Color m: Money }",
        )
        .unwrap();
        let registry = MockRegistry::for_schema(&schema);
        let mut rng = StdRng::seed_from_u64(3);
        let color = registry
            .resolve("Color")
            .generate(&TypeRef::Scalar("Color".into()), &mut rng)
            .unwrap();
        assert!(color == json!("RED") || color == json!("GREEN"));
        assert!(matches!(registry.resolve("Money"), Rule::Scalar(ScalarKind::String)));
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let registry = MockRegistry::new();
        let a = registry
            .resolve("String")
            .generate(&string_ref(), &mut StdRng::seed_from_u64(42));
        let b = registry
            .resolve("String")
            .generate(&string_ref(), &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_configured_float_range() {
        let mut config = rule_config(MockRuleStrategy::Float);
        config.min = Some(0.0);
        config.max = Some(10000.0);
        let rule = ConfiguredRule::new(config);
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            let v = rule.generate(&TypeRef::Scalar("Money".into()), &mut rng);
            let f = v.as_f64().unwrap();
            assert!((0.0..=10000.0).contains(&f));
        }
    }

    #[test]
    fn test_unsampleable_range_yields_null() {
        let money = TypeRef::Scalar("Money".into());
        let mut rng = StdRng::seed_from_u64(9);

        let mut unbounded = rule_config(MockRuleStrategy::Float);
        unbounded.max = Some(f64::INFINITY);
        assert_eq!(ConfiguredRule::new(unbounded).generate(&money, &mut rng), Value::Null);

        let mut wide = rule_config(MockRuleStrategy::Float);
        wide.min = Some(-f64::MAX);
        wide.max = Some(f64::MAX);
        assert_eq!(ConfiguredRule::new(wide).generate(&money, &mut rng), Value::Null);

        let mut inverted = rule_config(MockRuleStrategy::Integer);
        inverted.min = Some(5.0);
        inverted.max = Some(1.0);
        assert_eq!(ConfiguredRule::new(inverted).generate(&money, &mut rng), Value::Null);
    }

    #[test]
    fn test_configured_fields_and_list_length() {
        let mut config = rule_config(MockRuleStrategy::Fields);
        let mut fields = serde_json::Map::new();
        fields.insert("fullName".into(), json!("John Doe"));
        config.fields = Some(fields);
        config.list_length = Some(5);
        let rule = ConfiguredRule::new(config);
        let mut rng = StdRng::seed_from_u64(0);
        let value = rule.generate(&TypeRef::Object("UserProfileType".into()), &mut rng);
        assert_eq!(value, json!({"fullName": "John Doe"}));
        assert_eq!(rule.list_length(&mut rng), Some(5));
    }

    #[test]
    fn test_configured_enum_and_constant() {
        let mut config = rule_config(MockRuleStrategy::Enum);
        config.values = Some(vec![json!("a"), json!("b")]);
        let rule = ConfiguredRule::new(config);
        let mut rng = StdRng::seed_from_u64(0);
        let v = rule.generate(&string_ref(), &mut rng);
        assert!(v == json!("a") || v == json!("b"));

        let mut config = rule_config(MockRuleStrategy::Constant);
        config.value = json!("https://picsum.photos/200/300");
        let rule = ConfiguredRule::new(config);
        assert_eq!(
            rule.generate(&string_ref(), &mut rng),
            json!("https://picsum.photos/200/300")
        );
    }

    #[test]
    fn test_configured_faker() {
        let mut config = rule_config(MockRuleStrategy::Faker);
        config.faker = Some(FakerKind::Email);
        let rule = ConfiguredRule::new(config);
        let v = rule.generate(&string_ref(), &mut StdRng::seed_from_u64(5));
        assert!(v.as_str().unwrap().contains('@'));
    }

    #[test]
    fn test_pattern_generation() {
        let mut rng = StdRng::seed_from_u64(11);
        let value = generate_from_pattern("ORD-###-??", &mut rng);
        assert_eq!(value.len(), 10);
        assert!(value.starts_with("ORD-"));
        assert!(value[4..7].chars().all(|c| c.is_ascii_digit()));
        assert!(value[8..].chars().all(|c| c.is_ascii_lowercase()));
    }
}

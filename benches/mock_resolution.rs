use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use graphql_mock::adapters::mock_registry::{generate_from_pattern, MockRegistry, MockRng};
use graphql_mock::adapters::mock_resolver::MockEngine;
use graphql_mock::domain::SchemaModel;
use rand::SeedableRng;

const SCHEMA: &str = r#"
    interface Node { id: ID! }
    type User implements Node { id: ID! name: String! age: Int friends: [User!]! posts: [Post] }
    type Post implements Node { id: ID! title: String tags: [String!]! }
    union SearchResult = User | Post
    type Query { me: User search: [SearchResult!]! }
"#;

fn engine(list_length: usize) -> MockEngine {
    let schema = SchemaModel::load(SCHEMA).unwrap();
    let registry = MockRegistry::for_schema(&schema).with_list_length(list_length);
    MockEngine::new(schema, registry).with_seed(Some(1))
}

fn benchmark_parse_and_validate(c: &mut Criterion) {
    let engine = engine(2);
    let query = "{ me { id name friends { name posts { title } } } }";

    c.bench_function("prepare_query", |b| {
        b.iter(|| engine.prepare(black_box(query), None).unwrap());
    });
}

fn benchmark_nested_lists(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_lists");
    let query = "{ me { id name friends { name friends { name posts { title tags } } } } }";

    for list_length in [1, 2, 5].iter() {
        let engine = engine(*list_length);
        let operation = engine.prepare(query, None).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(list_length), list_length, |b, _| {
            b.iter(|| engine.run(black_box(&operation), &mut engine.rng()));
        });
    }

    group.finish();
}

fn benchmark_abstract_types(c: &mut Criterion) {
    let engine = engine(10);
    let operation = engine
        .prepare(
            "{ search { __typename ... on User { name } ... on Post { title } } }",
            None,
        )
        .unwrap();

    c.bench_function("union_resolution", |b| {
        b.iter(|| engine.run(black_box(&operation), &mut engine.rng()));
    });
}

fn benchmark_pattern_rule(c: &mut Criterion) {
    let mut rng = MockRng::seed_from_u64(1);

    c.bench_function("pattern_rule", |b| {
        b.iter(|| generate_from_pattern(black_box("USR-####-????"), &mut rng));
    });
}

criterion_group!(
    benches,
    benchmark_parse_and_validate,
    benchmark_nested_lists,
    benchmark_abstract_types,
    benchmark_pattern_rule
);
criterion_main!(benches);

mod common;
mod graphql_test;
mod health_test;

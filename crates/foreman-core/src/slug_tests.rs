// SPDX-License-Identifier: MIT

use super::*;
use yare::parameterized;

#[parameterized(
    lower = {"my-project"},
    with_digits = {"proj123"},
    underscores = {"my_project_1"},
    single_char = {"a"},
)]
fn accepts_valid_slugs(s: &str) {
    assert!(ProjectSlug::parse(s).is_ok());
}

#[parameterized(
    empty = {""},
    uppercase = {"MyProject"},
    spaces = {"my project"},
    slash = {"my/project"},
    too_long = {"a-very-very-very-very-very-very-very-very-very-very-long-slug-name"},
)]
fn rejects_invalid_slugs(s: &str) {
    assert!(ProjectSlug::parse(s).is_err());
}

#[test]
fn serializes_as_plain_string() {
    let slug = ProjectSlug::parse("demo").unwrap();
    assert_eq!(serde_json::to_string(&slug).unwrap(), "\"demo\"");
}

#[test]
fn deserialize_rejects_invalid() {
    let result: Result<ProjectSlug, _> = serde_json::from_str("\"Not Valid\"");
    assert!(result.is_err());
}

// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn handle_list_reports_empty_message_for_text() {
    let items: Vec<u32> = Vec::new();
    let mut rendered = false;
    handle_list(OutputFormat::Text, &items, "no items", |_| rendered = true).unwrap();
    assert!(!rendered);
}

#[test]
fn handle_list_renders_text_for_nonempty() {
    let items = vec![1, 2, 3];
    let mut rendered = false;
    handle_list(OutputFormat::Text, &items, "no items", |got| {
        rendered = true;
        assert_eq!(got, &items);
    })
    .unwrap();
    assert!(rendered);
}

#[test]
fn format_or_json_calls_text_fn_in_text_mode() {
    let mut called = false;
    format_or_json(OutputFormat::Text, &42, || called = true).unwrap();
    assert!(called);
}

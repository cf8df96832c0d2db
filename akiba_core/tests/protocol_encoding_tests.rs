//! Tests for AniDB protocol parameter encoding
//!
//! Only `&` and line breaks are escaped; every other character is sent as is.

use akiba_core::protocol::messages::{AniDBCommand, AuthCommand, decode_value, encode_value};
use akiba_core::protocol::{Command, MylistState};

#[test]
fn test_encode_value_html_entities() {
    assert_eq!(encode_value("simple"), "simple");
    assert_eq!(encode_value("with&ampersand"), "with&amp;ampersand");
    assert_eq!(encode_value("multiple&&&"), "multiple&amp;&amp;&amp;");
}

#[test]
fn test_encode_value_leaves_other_characters() {
    for value in [
        "user@example.com",
        "pass!word",
        "test#tag",
        "value=test",
        "space test",
        "path/to/file",
        "test<value>",
        "test|value",
        "test%value",
    ] {
        assert_eq!(encode_value(value), value);
    }
}

#[test]
fn test_encode_value_newlines() {
    assert_eq!(encode_value("line1\nline2"), "line1<br />line2");
    assert_eq!(encode_value("line1\r\nline2"), "line1<br />line2");
}

#[test]
fn test_encode_value_unicode() {
    assert_eq!(encode_value("カウボーイビバップ"), "カウボーイビバップ");
    assert_eq!(encode_value("Tom & Jerry ♪"), "Tom &amp; Jerry ♪");
}

#[test]
fn test_decode_value_reverses_escapes() {
    assert_eq!(decode_value("a&amp;b<br />c"), "a&b\nc");
    assert_eq!(decode_value("it`s"), "it's");
    assert_eq!(decode_value("/"), "|");
    assert_eq!(decode_value("Fate/stay night"), "Fate/stay night");
}

#[test]
fn test_auth_command_encoding() {
    let auth = AuthCommand::new("user", "pass&word", "akiba", "1");
    let encoded = auth.encode();

    assert!(encoded.starts_with("AUTH "));
    assert!(encoded.contains("user=user"));
    assert!(encoded.contains("pass=pass&amp;word"));
    assert!(encoded.contains("protover=3"));
    assert!(encoded.contains("enc=utf8"));
}

#[test]
fn test_auth_command_masked_hides_password() {
    let auth = AuthCommand::new("user", "hunter2", "akiba", "1");
    let masked = auth.masked();

    assert!(masked.contains("pass=***"));
    assert!(!masked.contains("hunter2"));
    assert!(masked.contains("user=user"));
}

#[test]
fn test_file_lookup_by_hash() {
    let command = Command::file(733_785_347, "0123456789abcdef0123456789abcdef");
    assert_eq!(command.name(), "FILE");
    assert!(command.requires_auth());

    let line = command.with_session(Some("abc12"));
    assert!(line.contains("size=733785347"));
    assert!(line.contains("ed2k=0123456789abcdef0123456789abcdef"));
    assert!(line.ends_with("&s=abc12"));
}

#[test]
fn test_mylist_add_carries_state_and_edit() {
    let command = Command::mylist_add(10, "aa", MylistState::ExternalStorage, true);
    let line = command.encode();
    assert!(line.starts_with("MYLISTADD "));
    assert!(line.contains("state=2"));
    assert!(line.contains("edit=1"));
}

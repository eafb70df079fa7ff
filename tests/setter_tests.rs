#![allow(clippy::unwrap_used, clippy::panic, clippy::expect_used)]

/// Tests for URL component setters: in-place edits that relocate the
/// neighboring components without reparsing.
use ruri::{ParseError, UriBase, Url};

fn parse(input: &str) -> Url {
    Url::parse(input).unwrap()
}

#[test]
fn test_set_scheme() {
    let mut url = parse("//example.com/p?q#f");
    url.set_scheme("https").unwrap();
    assert_eq!(url.as_str(), "https://example.com/p?q#f");

    url.set_scheme("wss").unwrap();
    assert_eq!(url.as_str(), "wss://example.com/p?q#f");

    url.remove_scheme();
    assert_eq!(url.as_str(), "//example.com/p?q#f");
    assert!(url.is_relative());
}

#[test]
fn test_set_scheme_validation() {
    let mut url = parse("s://h/");
    assert!(url.set_scheme("").is_err());
    assert!(url.set_scheme("9p").is_err());
    assert!(url.set_scheme("a b").is_err());
    assert!(url.set_scheme("a%62").is_err());
    assert_eq!(url.as_str(), "s://h/");
}

#[test]
fn test_set_userinfo() {
    let mut url = parse("s://example.com/");
    url.set_encoded_userinfo("user:pass").unwrap();
    assert_eq!(url.as_str(), "s://user:pass@example.com/");

    url.set_encoded_userinfo("other").unwrap();
    assert_eq!(url.as_str(), "s://other@example.com/");

    url.remove_userinfo();
    assert_eq!(url.as_str(), "s://example.com/");
}

#[test]
fn test_set_userinfo_decoded() {
    let mut url = parse("s://h/");
    url.set_userinfo("u@s er").unwrap();
    assert_eq!(url.as_str(), "s://u%40s%20er@h/");
    assert_eq!(url.userinfo().unwrap(), "u@s er");
}

#[test]
fn test_set_host() {
    let mut url = parse("s://u@old:80/p");
    url.set_encoded_host("new.example").unwrap();
    assert_eq!(url.as_str(), "s://u@new.example:80/p");

    url.set_encoded_host("[::1]").unwrap();
    assert_eq!(url.as_str(), "s://u@[::1]:80/p");

    url.set_encoded_host("").unwrap();
    assert_eq!(url.as_str(), "s://u@:80/p");
}

#[test]
fn test_set_host_creates_authority_and_roots_path() {
    let mut url = parse("s:rootless/path");
    url.set_encoded_host("h").unwrap();
    assert_eq!(url.as_str(), "s://h/rootless/path");
    assert_eq!(url.encoded_path(), "/rootless/path");
}

#[test]
fn test_set_host_validation() {
    let mut url = parse("s://h/");
    assert!(url.set_encoded_host("a b").is_err());
    assert!(url.set_encoded_host("a/b").is_err());
    assert!(url.set_encoded_host("[::1").is_err());
    assert!(url.set_encoded_host("[1:2:3]").is_err());
    assert_eq!(url.as_str(), "s://h/");
}

#[test]
fn test_remove_authority() {
    let mut url = parse("s://u@h:80/p?q");
    url.remove_authority().unwrap();
    assert_eq!(url.as_str(), "s:/p?q");
    assert!(!url.has_host());
    assert!(!url.has_userinfo());
    assert!(!url.has_port());
}

#[test]
fn test_set_port() {
    let mut url = parse("s://h/p");
    url.set_port("8080").unwrap();
    assert_eq!(url.as_str(), "s://h:8080/p");

    url.set_port("80").unwrap();
    assert_eq!(url.as_str(), "s://h:80/p");

    url.set_port_u16(65535).unwrap();
    assert_eq!(url.as_str(), "s://h:65535/p");
    assert_eq!(url.port_number(), Some(65535));

    url.remove_port();
    assert_eq!(url.as_str(), "s://h/p");

    assert_eq!(url.set_port("x"), Err(ParseError::BadPort));
    assert_eq!(url.set_port("8 0"), Err(ParseError::BadPort));
}

#[test]
fn test_set_path() {
    let mut url = parse("s://h/old?q#f");
    url.set_encoded_path("/new/path").unwrap();
    assert_eq!(url.as_str(), "s://h/new/path?q#f");
    assert_eq!(url.segment_count(), 2);

    url.set_encoded_path("").unwrap();
    assert_eq!(url.as_str(), "s://h?q#f");
    assert_eq!(url.segment_count(), 0);

    url.set_path("/a b/c").unwrap();
    assert_eq!(url.as_str(), "s://h/a%20b/c?q#f");
}

#[test]
fn test_set_query_presence() {
    let mut url = parse("s://h/p#f");
    url.set_encoded_query("").unwrap();
    assert_eq!(url.as_str(), "s://h/p?#f");
    assert!(url.has_query());
    assert_eq!(url.param_count(), 1);

    url.set_encoded_query("a=1&b").unwrap();
    assert_eq!(url.as_str(), "s://h/p?a=1&b#f");
    assert_eq!(url.param_count(), 2);

    url.remove_query();
    assert_eq!(url.as_str(), "s://h/p#f");
    assert_eq!(url.param_count(), 0);
}

#[test]
fn test_set_fragment() {
    let mut url = parse("s://h/p?q");
    url.set_encoded_fragment("sec-2").unwrap();
    assert_eq!(url.as_str(), "s://h/p?q#sec-2");

    url.set_fragment("one two").unwrap();
    assert_eq!(url.as_str(), "s://h/p?q#one%20two");
    assert_eq!(url.fragment().unwrap(), "one two");

    url.remove_fragment();
    assert_eq!(url.as_str(), "s://h/p?q");
}

#[test]
fn test_edit_relocates_all_following_components() {
    let mut url = parse("s://u@h:1/p?q#f");
    url.set_encoded_host("a-much-longer-host.example").unwrap();
    assert_eq!(url.as_str(), "s://u@a-much-longer-host.example:1/p?q#f");
    assert_eq!(url.encoded_port(), Some("1"));
    assert_eq!(url.encoded_path(), "/p");
    assert_eq!(url.encoded_query(), Some("q"));
    assert_eq!(url.encoded_fragment(), Some("f"));

    url.set_encoded_host("h").unwrap();
    assert_eq!(url.as_str(), "s://u@h:1/p?q#f");
}

#[test]
fn test_build_from_scratch() {
    let mut url = Url::new();
    assert_eq!(url.as_str(), "");

    url.set_scheme("https").unwrap();
    url.set_encoded_host("example.com").unwrap();
    url.set_encoded_path("/search").unwrap();
    url.set_encoded_query("q=rust").unwrap();
    url.set_encoded_fragment("top").unwrap();
    assert_eq!(url.as_str(), "https://example.com/search?q=rust#top");

    // and back down again
    url.remove_fragment();
    url.remove_query();
    url.set_encoded_path("").unwrap();
    url.remove_authority().unwrap();
    url.remove_scheme();
    assert_eq!(url.as_str(), "");
}

#[test]
fn test_failed_setter_preserves_url() {
    let mut url = parse("s://h/p?a=1#f");
    let before = url.as_str().to_string();
    assert!(url.set_encoded_query("%").is_err());
    assert!(url.set_encoded_path("^").is_err());
    assert!(url.set_encoded_fragment("%G1").is_err());
    assert!(url.set_scheme("no good").is_err());
    assert_eq!(url.as_str(), before);
}

#[test]
fn test_mutation_then_reparse_agrees() {
    let mut url = parse("s://h/p");
    url.set_encoded_query("a=1").unwrap();
    url.set_port("99").unwrap();
    url.set_encoded_fragment("z").unwrap();

    let reparsed = Url::parse(url.as_str()).unwrap();
    assert_eq!(reparsed.encoded_host(), url.encoded_host());
    assert_eq!(reparsed.encoded_port(), url.encoded_port());
    assert_eq!(reparsed.encoded_query(), url.encoded_query());
    assert_eq!(reparsed.encoded_fragment(), url.encoded_fragment());
}

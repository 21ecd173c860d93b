// Copyright 2024 Simo Sorce
// See LICENSE.txt file for terms

use super::*;

use serial_test::parallel;

#[test]
#[parallel]
fn test_fetch_allocates_probed_lengths() {
    let token = MockToken::new();
    let handle = token.add_object(&template! {
        Class: CKO_DATA,
        Label: "hello",
        Value: vec![1u8, 2, 3],
        Private: false,
    });
    let session = token.session();

    let read = session
        .get_attributes(
            handle,
            &Template::probes(&[Attr::Label, Attr::Value, Attr::Private]),
        )
        .unwrap();
    assert_eq!(read.names(), vec!["label", "value", "private"]);
    assert_eq!(read.get(Attr::Label).unwrap().to_string().unwrap(), "hello");
    assert_eq!(read.get(Attr::Value).unwrap().to_bytes().unwrap(), vec![1, 2, 3]);
    assert!(!read.get(Attr::Private).unwrap().to_bool().unwrap());

    assert_eq!(token.count("C_GetAttributeValue"), 2);
    assert_eq!(token.fetches(), vec![vec![5, 3, 1]]);
}

#[test]
#[parallel]
fn test_empty_values_skip_the_fetch() {
    let token = MockToken::new();
    let handle = token.add_object(&template! {
        Class: CKO_DATA,
        Label: "",
        Value: Vec::<u8>::new(),
    });
    let read = token
        .session()
        .get_attributes(handle, &Template::probes(&[Attr::Label, Attr::Value]))
        .unwrap();
    assert_eq!(read.get(Attr::Label).unwrap().to_string().unwrap(), "");
    assert!(read.get(Attr::Value).unwrap().to_bytes().unwrap().is_empty());
    assert_eq!(token.count("C_GetAttributeValue"), 1);
    assert!(token.fetches().is_empty());
}

#[test]
#[parallel]
fn test_values_in_the_request_are_ignored() {
    let token = MockToken::new();
    let handle = token.add_object(&template! { Class: CKO_DATA, Label: "real" });
    let read = token
        .session()
        .get_attributes(handle, &template! { Label: "ignored" })
        .unwrap();
    assert_eq!(read.get(Attr::Label).unwrap().to_string().unwrap(), "real");
}

#[test]
#[parallel]
fn test_oversized_length_is_a_protocol_violation() {
    let token = MockToken::new();
    let handle = token.add_object(&template! {
        Class: CKO_DATA,
        Value: vec![0u8; 64],
    });
    let config = Config {
        max_attribute_len: 32,
        ..Config::default()
    };
    let session = token.session_with(config).unwrap();
    let err = session
        .get_attributes(handle, &Template::probes(&[Attr::Value]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
    /* never fetched */
    assert_eq!(token.count("C_GetAttributeValue"), 1);
}

#[test]
#[parallel]
fn test_failed_read_reports_the_call() {
    let token = MockToken::new();
    let handle = token.add_object(&template! { Class: CKO_DATA });
    token.fail("C_GetAttributeValue", CKR_DEVICE_ERROR);
    let err = token.session().object(handle).class().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CkError);
    assert_eq!(err.rv(), CKR_DEVICE_ERROR);
    assert_eq!(
        format!("{}", err),
        "C_GetAttributeValue failed: CKR_DEVICE_ERROR"
    );
}

#[test]
#[parallel]
fn test_writes_need_values() {
    let token = MockToken::new();
    let session = token.session();
    let handle = token.add_object(&template! { Class: CKO_DATA });
    let err = session
        .set_attributes(handle, &Template::probes(&[Attr::Label]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    let err = session
        .create_object(&Template::probes(&[Attr::Class]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    assert!(token.calls().is_empty());
}

#[test]
#[parallel]
fn test_find_in_batches() {
    let token = MockToken::new();
    let mut expected = Vec::new();
    for i in 0..5 {
        expected.push(token.add_object(&template! {
            Class: CKO_DATA,
            Application: "batch",
            Label: format!("item {}", i),
        }));
    }
    token.add_object(&template! { Class: CKO_DATA, Application: "other" });

    let config = Config {
        find_batch: 2,
        ..Config::default()
    };
    let session = token.session_with(config).unwrap();
    let found = session
        .find_objects(&template! { Application: "batch" })
        .unwrap();
    let handles: Vec<_> = found.iter().map(|o| o.handle()).collect();
    assert_eq!(handles, expected);
    /* 2 + 2 + 1 + the empty batch that ends the search */
    assert_eq!(token.batches(), vec![2, 2, 2, 2]);
    assert_eq!(token.count("C_FindObjectsFinal"), 1);

    let views = session.find(&template! { Application: "other" }).unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].class(), CKO_DATA);
}

#[test]
#[parallel]
fn test_find_always_finalizes() {
    let token = MockToken::new();
    token.add_object(&template! { Class: CKO_DATA });
    token.fail("C_FindObjects", CKR_DEVICE_MEMORY);
    let session = token.session();
    let err = session.find_objects(&Template::new()).unwrap_err();
    assert_eq!(err.rv(), CKR_DEVICE_MEMORY);
    assert_eq!(err.call(), Some("C_FindObjects"));
    assert_eq!(
        token.calls(),
        vec!["C_FindObjectsInit", "C_FindObjects", "C_FindObjectsFinal"]
    );

    /* the search was closed so a new one can start */
    let token = MockToken::new();
    token.fail("C_FindObjectsInit", CKR_SESSION_CLOSED);
    let err = token.session().find_objects(&Template::new()).unwrap_err();
    assert_eq!(err.rv(), CKR_SESSION_CLOSED);
    assert_eq!(token.count("C_FindObjectsFinal"), 0);
}

#[test]
#[parallel]
fn test_config_from_toml() {
    let conf = Config::from_toml("find_batch = 16\n").unwrap();
    assert_eq!(conf.find_batch, 16);
    assert_eq!(conf.max_attribute_len, crate::config::DEFAULT_MAX_ATTRIBUTE_LEN);

    let conf = Config::from_toml("").unwrap();
    assert_eq!(conf, Config::default());

    let err = Config::from_toml("find_batch = 0\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);

    let err = Config::from_toml("find_batch = \"many\"\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Nested);
}

#[test]
#[parallel]
fn test_config_from_file() {
    let path = std::env::temp_dir()
        .join(format!("p11client-test-{}.toml", std::process::id()));
    std::fs::write(&path, "max_attribute_len = 4096\nfind_batch = 8\n")
        .unwrap();
    let conf = Config::from_file(path.to_str().unwrap()).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(conf.max_attribute_len, 4096);
    assert_eq!(conf.find_batch, 8);

    let err = Config::from_file(path.to_str().unwrap()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Nested);
}

#[test]
#[parallel]
fn test_session_rejects_invalid_config() {
    let token = MockToken::new();
    token.add_object(&template! { Class: CKO_DATA });

    let err = token
        .session_with(Config {
            find_batch: 0,
            ..Config::default()
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    let err = token
        .session_with(Config {
            max_attribute_len: 0,
            ..Config::default()
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    /* nothing reached the token */
    assert!(token.calls().is_empty());

    let session = token
        .session_with(Config {
            find_batch: 1,
            ..Config::default()
        })
        .unwrap();
    assert_eq!(session.find_objects(&Template::new()).unwrap().len(), 1);
}

// Copyright 2024 Simo Sorce
// See LICENSE.txt file for terms

use super::*;

use serial_test::parallel;

#[test]
#[parallel]
fn test_digest_streaming_matches_single_part() {
    let token = MockToken::new();
    let session = token.session();
    let mech = Mechanism::new(CKM_SHA256);

    let mut op = session.digest();
    assert_eq!(op.state(), OpState::Uninitialized);
    op.init(&mech).unwrap();
    assert_eq!(op.state(), OpState::Initialized);
    op.update(b"hello ").unwrap();
    op.update(b"world").unwrap();
    let streamed = op.finalize().unwrap();
    assert_eq!(op.state(), OpState::Finalized);

    let once = session.digest().once(&mech, b"hello world").unwrap();
    assert_eq!(streamed, once);
    assert_eq!(once, mac_of(&[], b"hello world"));
    assert_eq!(once.len(), 32);
    assert!(!token.is_active());

    /* a finalized operation can be reused */
    op.init(&mech).unwrap();
    assert_eq!(op.finalize().unwrap(), mac_of(&[], b""));
}

#[test]
#[parallel]
fn test_digest_state_machine() {
    let token = MockToken::new();
    let session = token.session();
    let mech = Mechanism::new(CKM_SHA256);
    let mut op = session.digest();

    let err = op.update(b"early").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotInitialized);
    let err = op.finalize().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotInitialized);
    assert!(token.calls().is_empty());

    op.init(&mech).unwrap();
    let err = op.init(&mech).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyInitialized);
    let err = op.once(&mech, b"data").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyInitialized);
    assert_eq!(op.state(), OpState::Initialized);
    assert_eq!(token.count("C_DigestInit"), 1);

    op.finalize().unwrap();
    let err = op.update(b"late").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotInitialized);
}

#[test]
#[parallel]
fn test_failed_init_keeps_state() {
    let token = MockToken::new();
    let session = token.session();
    let mut op = session.digest();
    let err = op.init(&Mechanism::new(CKM_MD5)).unwrap_err();
    assert_eq!(err.rv(), CKR_MECHANISM_INVALID);
    assert_eq!(err.call(), Some("C_DigestInit"));
    assert_eq!(op.state(), OpState::Uninitialized);
    op.init(&Mechanism::new(CKM_SHA256)).unwrap();
}

#[test]
#[parallel]
fn test_failed_update_cancels() {
    let token = MockToken::new();
    let session = token.session();
    let mut op = session.digest();
    op.init(&Mechanism::new(CKM_SHA256)).unwrap();
    op.update(b"fine").unwrap();

    token.fail("C_DigestUpdate", CKR_DATA_LEN_RANGE);
    let err = op.update(b"broken").unwrap_err();
    assert_eq!(err.rv(), CKR_DATA_LEN_RANGE);
    assert_eq!(err.call(), Some("C_DigestUpdate"));
    assert_eq!(op.state(), OpState::Finalized);

    /* the token side operation was terminated by a final call */
    assert_eq!(token.count("C_DigestFinal"), 2);
    assert!(!token.is_active());
}

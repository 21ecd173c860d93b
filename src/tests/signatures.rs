// Copyright 2024 Simo Sorce
// See LICENSE.txt file for terms

use super::*;

use serial_test::parallel;

const KEY: &[u8] = b"0123456789abcdef";

#[test]
#[parallel]
fn test_sign_and_verify() {
    let (_token, session, key) = token_with_key(KEY);
    let mech = Mechanism::new(CKM_SHA256_HMAC);

    let mut signer = session.sign();
    signer.init(&mech, &key).unwrap();
    signer.update(b"part one, ").unwrap();
    signer.update(b"part two").unwrap();
    let signature = signer.finalize().unwrap();
    assert_eq!(signature, mac_of(KEY, b"part one, part two"));

    let once = session.sign().once(&mech, &key, b"part one, part two").unwrap();
    assert_eq!(once, signature);

    let mut verifier = session.verify();
    verifier.init(&mech, &key).unwrap();
    verifier.update(b"part one, part two").unwrap();
    assert!(verifier.finalize(&signature).unwrap());
    assert_eq!(verifier.state(), OpState::Finalized);

    assert!(session
        .verify()
        .once(&mech, &key, b"part one, part two", &signature)
        .unwrap());
}

#[test]
#[parallel]
fn test_wrong_signature_is_false() {
    let (token, session, key) = token_with_key(KEY);
    let mech = Mechanism::new(CKM_SHA256_HMAC);
    let mut signature = mac_of(KEY, b"message");
    signature[0] ^= 0x80;

    let mut verifier = session.verify();
    verifier.init(&mech, &key).unwrap();
    verifier.update(b"message").unwrap();
    assert!(!verifier.finalize(&signature).unwrap());
    assert_eq!(verifier.state(), OpState::Finalized);

    assert!(!session
        .verify()
        .once(&mech, &key, b"message", &signature)
        .unwrap());
    assert!(!token.is_active());
}

#[test]
#[parallel]
fn test_malformed_signature_is_an_error() {
    let (_token, session, key) = token_with_key(KEY);
    let mech = Mechanism::new(CKM_SHA256_HMAC);

    let mut verifier = session.verify();
    verifier.init(&mech, &key).unwrap();
    verifier.update(b"message").unwrap();
    let err = verifier.finalize(&[0u8; 3]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CkError);
    assert_eq!(err.rv(), CKR_SIGNATURE_LEN_RANGE);
    assert_eq!(err.call(), Some("C_VerifyFinal"));
    /* final always ends the operation */
    assert_eq!(verifier.state(), OpState::Finalized);
    let err = verifier.finalize(&[0u8; 32]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotInitialized);
}

#[test]
#[parallel]
fn test_sign_state_machine() {
    let (token, session, key) = token_with_key(KEY);
    let mech = Mechanism::new(CKM_SHA256_HMAC);
    let mut signer = session.sign();

    let err = signer.update(b"x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotInitialized);
    signer.init(&mech, &key).unwrap();
    let err = signer.init(&mech, &key).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyInitialized);
    assert_eq!(token.count("C_SignInit"), 1);

    /* unknown key */
    let mut other = session.sign();
    let err = other.init(&mech, &(key + 100)).unwrap_err();
    assert_eq!(err.call(), Some("C_SignInit"));
    assert_eq!(other.state(), OpState::Uninitialized);
}

#[test]
#[parallel]
fn test_failed_verify_update_cancels() {
    let (token, session, key) = token_with_key(KEY);
    let mech = Mechanism::new(CKM_SHA256_HMAC);
    let mut verifier = session.verify();
    verifier.init(&mech, &key).unwrap();

    token.fail("C_VerifyUpdate", CKR_DEVICE_ERROR);
    let err = verifier.update(b"data").unwrap_err();
    assert_eq!(err.rv(), CKR_DEVICE_ERROR);
    assert_eq!(verifier.state(), OpState::Finalized);
    assert_eq!(token.count("C_VerifyFinal"), 1);
    assert!(!token.is_active());
}

#[test]
#[parallel]
fn test_failed_sign_update_cancels() {
    let (token, session, key) = token_with_key(KEY);
    let mech = Mechanism::new(CKM_SHA256_HMAC);
    let mut signer = session.sign();
    signer.init(&mech, &key).unwrap();

    token.fail("C_SignUpdate", CKR_GENERAL_ERROR);
    let err = signer.update(b"data").unwrap_err();
    assert_eq!(err.rv(), CKR_GENERAL_ERROR);
    assert_eq!(signer.state(), OpState::Finalized);
    assert!(!token.is_active());

    /* the handle is usable again */
    signer.init(&mech, &key).unwrap();
    assert_eq!(signer.finalize().unwrap(), mac_of(KEY, b""));
}

#[test]
#[parallel]
fn test_sign_with_typed_key() {
    let (_token, session, key) = token_with_key(KEY);
    let secret = match session.classify(key).unwrap() {
        ObjectView::SecretKey(k) => k,
        _ => panic!("expected a secret key"),
    };
    let mech = Mechanism::new(CKM_SHA256_HMAC);
    let sig = session.sign().once(&mech, &secret, b"typed").unwrap();
    assert!(session.verify().once(&mech, &secret, b"typed", &sig).unwrap());
}

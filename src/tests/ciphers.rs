// Copyright 2024 Simo Sorce
// See LICENSE.txt file for terms

use super::*;

use serial_test::parallel;

const KEY: &[u8] = b"\x01\x02\x03\x04\x05\x06\x07\x08\x09";

#[test]
#[parallel]
fn test_streaming_encryption() {
    let (token, session, key) = token_with_key(KEY);
    let mech = Mechanism::with_iv(CKM_AES_CBC, &[0u8; 16]);
    let plain = b"a message that spans several blocks";

    let mut enc = session.cipher();
    enc.init(&mech, &key).unwrap();
    let mut out = enc.update(&plain[..6]).unwrap();
    /* only whole blocks come out of update */
    assert_eq!(out.len(), 4);
    out.extend(enc.update(&plain[6..]).unwrap());
    let tail = enc.finalize().unwrap();
    assert_eq!(tail.len(), plain.len() % BLOCK);
    out.extend(tail);
    assert_eq!(out, xor_of(plain, KEY));
    assert!(!token.is_active());

    let once = session.cipher().once(&mech, &key, plain).unwrap();
    assert_eq!(once, out);

    let mut dec = session.decipher();
    dec.init(&mech, &key).unwrap();
    let mut back = Vec::new();
    for chunk in out.chunks(5) {
        back.extend(dec.update(chunk).unwrap());
    }
    back.extend(dec.finalize().unwrap());
    assert_eq!(back, plain);

    let back = session.decipher().once(&mech, &key, &once).unwrap();
    assert_eq!(back, plain);
}

#[test]
#[parallel]
fn test_empty_update_output() {
    let (_token, session, key) = token_with_key(KEY);
    let mech = Mechanism::new(CKM_AES_ECB);
    let mut enc = session.cipher();
    enc.init(&mech, &key).unwrap();
    /* no whole block yet, but the input is still consumed */
    assert!(enc.update(b"ab").unwrap().is_empty());
    assert!(enc.update(b"c").unwrap().is_empty());
    assert_eq!(enc.finalize().unwrap(), xor_of(b"abc", KEY));
}

#[test]
#[parallel]
fn test_cipher_state_machine() {
    let (token, session, key) = token_with_key(KEY);
    let mech = Mechanism::new(CKM_AES_ECB);
    let mut dec = session.decipher();
    let err = dec.update(b"data").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotInitialized);
    let err = dec.finalize().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotInitialized);

    dec.init(&mech, &key).unwrap();
    let err = dec.once(&mech, &key, b"data").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyInitialized);
    assert_eq!(token.count("C_DecryptInit"), 1);
    assert_eq!(token.count("C_Decrypt"), 0);
}

#[test]
#[parallel]
fn test_failed_encrypt_update_cancels() {
    let (token, session, key) = token_with_key(KEY);
    let mech = Mechanism::new(CKM_AES_ECB);
    let mut enc = session.cipher();
    enc.init(&mech, &key).unwrap();
    enc.update(b"12345678").unwrap();

    token.fail("C_EncryptUpdate", CKR_DATA_LEN_RANGE);
    let err = enc.update(b"more").unwrap_err();
    assert_eq!(err.rv(), CKR_DATA_LEN_RANGE);
    assert_eq!(err.call(), Some("C_EncryptUpdate"));
    assert_eq!(enc.state(), OpState::Finalized);
    assert_eq!(token.count("C_EncryptFinal"), 2);
    assert!(!token.is_active());
}

// Copyright 2024 Simo Sorce
// See LICENSE.txt file for terms

use super::*;

use serial_test::parallel;

fn generic_secret(session: &Session, len: CK_ULONG) -> SecretKey {
    let mut t = template! {
        KeyType: CKK_GENERIC_SECRET,
        ValueLen: len,
        Label: "generated",
        Extractable: true,
    };
    t.add_usage(KeyUsage::SIGN | KeyUsage::VERIFY | KeyUsage::WRAP)
        .unwrap();
    session
        .generate_key(&Mechanism::new(CKM_GENERIC_SECRET_KEY_GEN), &t)
        .unwrap()
}

#[test]
#[parallel]
fn test_generate_key() {
    let token = MockToken::new();
    let session = token.session();
    let key = generic_secret(&session, 32);

    assert_eq!(key.object().class().unwrap(), CKO_SECRET_KEY);
    assert_eq!(key.key_type().unwrap(), CKK_GENERIC_SECRET);
    assert_eq!(key.label().unwrap(), "generated");
    assert_eq!(key.value_len().unwrap(), 32);
    assert_eq!(key.value().unwrap().len(), 32);
    assert!(key.local().unwrap());
    assert!(key.sign().unwrap());
    assert!(key.wrap().unwrap());
    assert_eq!(
        key.key_gen_mechanism().unwrap(),
        CKM_GENERIC_SECRET_KEY_GEN
    );

    let err = session
        .generate_key(
            &Mechanism::new(CKM_GENERIC_SECRET_KEY_GEN),
            &template! { Label: "no length" },
        )
        .unwrap_err();
    assert_eq!(err.rv(), CKR_TEMPLATE_INCOMPLETE);
    assert_eq!(err.call(), Some("C_GenerateKey"));
}

#[test]
#[parallel]
fn test_generate_key_pair() {
    let token = MockToken::new();
    let session = token.session();
    let ec_params = vec![0x06u8, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07];
    let mut public = template! { EcParams: ec_params.clone(), Label: "pub" };
    public.add_usage(KeyUsage::VERIFY).unwrap();
    let mut private = template! { Label: "priv", Sensitive: true };
    private.add_usage(KeyUsage::SIGN).unwrap();

    let pair = session
        .generate_key_pair(&Mechanism::new(CKM_EC_KEY_PAIR_GEN), &public, &private)
        .unwrap();
    assert_eq!(pair.public.object().class().unwrap(), CKO_PUBLIC_KEY);
    assert_eq!(pair.private.object().class().unwrap(), CKO_PRIVATE_KEY);
    assert_eq!(pair.public.ec_params().unwrap(), ec_params);
    assert_eq!(pair.public.label().unwrap(), "pub");
    assert!(pair.public.verify().unwrap());
    assert!(pair.private.sign().unwrap());
    assert!(pair.private.sensitive().unwrap());
    assert_eq!(pair.private.key_type().unwrap(), CKK_EC);

    let mech = Mechanism::new(CKM_SHA256_HMAC);
    let sig = session.sign().once(&mech, &pair.private, b"pair").unwrap();
    assert!(session
        .verify()
        .once(&mech, &pair.public, b"pair", &sig)
        .unwrap());
}

#[test]
#[parallel]
fn test_wrap_and_unwrap() {
    let token = MockToken::new();
    let session = token.session();
    let kek = generic_secret(&session, 16);
    let key = generic_secret(&session, 24);
    let mech = Mechanism::new(CKM_AES_KEY_WRAP);

    let wrapped = session.wrap_key(&mech, &kek, &key).unwrap();
    assert_eq!(wrapped.len(), 24);
    assert_eq!(
        wrapped,
        xor_of(&key.value().unwrap(), &kek.value().unwrap())
    );

    let unwrapped = session
        .unwrap_key(
            &mech,
            &kek,
            &wrapped,
            &template! {
                Class: CKO_SECRET_KEY,
                KeyType: CKK_AES,
                Label: "unwrapped",
            },
        )
        .unwrap();
    let secret = match unwrapped {
        ObjectView::SecretKey(k) => k,
        _ => panic!("expected a secret key"),
    };
    assert_eq!(secret.value().unwrap(), key.value().unwrap());
    assert_eq!(secret.label().unwrap(), "unwrapped");
    assert!(!secret.local().unwrap());

    let err = session.wrap_key(&mech, &(999 as CK_OBJECT_HANDLE), &key).unwrap_err();
    assert_eq!(err.rv(), CKR_WRAPPING_KEY_HANDLE_INVALID);
    assert_eq!(err.call(), Some("C_WrapKey"));
    let err = session
        .unwrap_key(&mech, &kek, &[], &Template::new())
        .unwrap_err();
    assert_eq!(err.rv(), CKR_WRAPPED_KEY_INVALID);
}

#[test]
#[parallel]
fn test_derive_key() {
    let token = MockToken::new();
    let session = token.session();
    let base = generic_secret(&session, 32);
    let params = Ecdh1DeriveParams::new(CKD_NULL, None, Some(&[4u8; 65]));
    let mech = Mechanism::with_params(CKM_ECDH1_DERIVE, &params).unwrap();

    let derived = session
        .derive_key(
            &mech,
            &base,
            &template! {
                Class: CKO_SECRET_KEY,
                KeyType: CKK_GENERIC_SECRET,
                Label: "derived",
            },
        )
        .unwrap();
    assert_eq!(derived.class(), CKO_SECRET_KEY);
    let secret = match derived {
        ObjectView::SecretKey(k) => k,
        _ => panic!("expected a secret key"),
    };
    assert_eq!(
        secret.value().unwrap(),
        mac_of(&base.value().unwrap(), mech.param_bytes())
    );

    let err = session
        .derive_key(&Mechanism::new(CKM_ECDH1_DERIVE), &base, &Template::new())
        .unwrap_err();
    assert_eq!(err.rv(), CKR_MECHANISM_PARAM_INVALID);
    assert_eq!(err.call(), Some("C_DeriveKey"));
}

#[test]
#[parallel]
fn test_derived_vendor_class_is_unrecognized() {
    let token = MockToken::new();
    let session = token.session();
    let base = generic_secret(&session, 16);
    let mech = Mechanism::with_raw(CKM_AES_CBC_ENCRYPT_DATA, vec![0u8; 8]);
    let err = session
        .derive_key(
            &mech,
            &base,
            &template! { Class: CKO_VENDOR_DEFINED },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnrecognizedObjectType);
}

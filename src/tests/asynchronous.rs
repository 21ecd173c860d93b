// Copyright 2024 Simo Sorce
// See LICENSE.txt file for terms

use super::*;

use serial_test::parallel;

#[tokio::test]
#[parallel]
async fn test_async_matches_blocking() {
    let (_token, session, key) = token_with_key(b"async key");
    let sha = Mechanism::new(CKM_SHA256);
    let hmac = Mechanism::new(CKM_SHA256_HMAC);
    let ecb = Mechanism::new(CKM_AES_ECB);

    let digest = session
        .digest_async(sha.clone(), b"data".to_vec())
        .await
        .unwrap();
    assert_eq!(digest, session.digest().once(&sha, b"data").unwrap());

    let sig = session
        .sign_async(hmac.clone(), &key, b"data".to_vec())
        .await
        .unwrap();
    assert_eq!(sig, session.sign().once(&hmac, &key, b"data").unwrap());
    assert!(session
        .verify_async(hmac.clone(), &key, b"data".to_vec(), sig.clone())
        .await
        .unwrap());
    assert!(!session
        .verify_async(hmac, &key, b"other".to_vec(), sig)
        .await
        .unwrap());

    let ct = session
        .encrypt_async(ecb.clone(), &key, b"plaintext".to_vec())
        .await
        .unwrap();
    assert_eq!(ct, session.cipher().once(&ecb, &key, b"plaintext").unwrap());
    let pt = session.decrypt_async(ecb, &key, ct).await.unwrap();
    assert_eq!(pt, b"plaintext");
}

#[tokio::test]
#[parallel]
async fn test_async_key_generation() {
    let token = MockToken::new();
    let session = token.session();
    let key = session
        .generate_key_async(
            Mechanism::new(CKM_GENERIC_SECRET_KEY_GEN),
            template! { ValueLen: 16 as CK_ULONG },
        )
        .await
        .unwrap();
    assert_eq!(key.value().unwrap().len(), 16);

    let pair = session
        .generate_key_pair_async(
            Mechanism::new(CKM_EC_KEY_PAIR_GEN),
            template! { Label: "pub" },
            template! { Label: "priv" },
        )
        .await
        .unwrap();
    assert_eq!(pair.private.label().unwrap(), "priv");

    let err = session
        .generate_key_async(
            Mechanism::new(CKM_GENERIC_SECRET_KEY_GEN),
            Template::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.rv(), CKR_TEMPLATE_INCOMPLETE);
}

#[tokio::test]
#[parallel]
async fn test_spawn_runs_closures() {
    let (_token, session, key) = token_with_key(b"spawned");
    let label = session
        .spawn(move |s| s.object(key).get_string(Attr::Label))
        .await
        .unwrap();
    assert_eq!(label, "secret");
}

// Family bootstrap state machine, driven through the in-memory store.

use anyhow::Result;
use std::sync::Arc;

use hearth_api::auth::{
    authenticate_family, hash_secret, AuthError, FALLBACK_LOGIN_ID,
};
use hearth_api::database::memory::MemoryStore;
use hearth_api::database::models::Role;
use hearth_api::database::store::AuthStore;

const SECURITY_PIN: &str = "111222";

fn store_with_family() -> (Arc<MemoryStore>, hearth_api::database::models::Family) {
    let store = Arc::new(MemoryStore::new());
    let family = store.add_family("acme", "The Acme Household");
    (store, family)
}

#[tokio::test]
async fn empty_family_accepts_security_pin_as_admin() -> Result<()> {
    let (store, family) = store_with_family();
    store.set_settings(family.id, &hash_secret(SECURITY_PIN)?);

    let outcome = authenticate_family(store.as_ref(), &family, None, SECURITY_PIN)
        .await
        .expect("bootstrap login should succeed");

    assert_eq!(outcome.role, Role::Admin);
    assert_eq!(outcome.caretaker.login_id, FALLBACK_LOGIN_ID);
    Ok(())
}

#[tokio::test]
async fn empty_family_rejects_wrong_secret() -> Result<()> {
    let (store, family) = store_with_family();
    store.set_settings(family.id, &hash_secret(SECURITY_PIN)?);

    let err = authenticate_family(store.as_ref(), &family, None, "999999")
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::Unauthenticated);
    Ok(())
}

#[tokio::test]
async fn missing_settings_fall_back_to_seeded_default_pin() -> Result<()> {
    let (store, family) = store_with_family();
    // No settings row at all: the seeded default is in force and the
    // bootstrap creates settings and fallback caretaker together
    let outcome = authenticate_family(store.as_ref(), &family, None, SECURITY_PIN)
        .await
        .expect("default-pin bootstrap should succeed");

    assert_eq!(outcome.role, Role::Admin);
    assert!(store.get_settings(family.id).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn fallback_gate_closes_once_a_real_caretaker_exists() -> Result<()> {
    let (store, family) = store_with_family();
    store.set_settings(family.id, &hash_secret(SECURITY_PIN)?);
    store.add_caretaker(family.id, "07", "Jamie", Role::User, "4321");

    // Correct security PIN, but the shortcut is closed: Forbidden, not
    // Unauthenticated
    let err = authenticate_family(store.as_ref(), &family, None, SECURITY_PIN)
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::Forbidden);

    // Naming the reserved login id explicitly is just as Forbidden
    let err = authenticate_family(store.as_ref(), &family, Some(FALLBACK_LOGIN_ID), SECURITY_PIN)
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::Forbidden);
    Ok(())
}

#[tokio::test]
async fn two_phase_family_lifecycle() -> Result<()> {
    // Family T: zero caretakers, security PIN 111222
    let store = Arc::new(MemoryStore::new());
    let family = store.add_family("t", "Family T");
    store.set_settings(family.id, &hash_secret(SECURITY_PIN)?);

    // Phase 1: security-PIN login succeeds and materializes the fallback
    let first = authenticate_family(store.as_ref(), &family, None, SECURITY_PIN)
        .await
        .expect("first login should succeed");
    assert_eq!(first.role, Role::Admin);
    assert_eq!(first.caretaker.login_id, FALLBACK_LOGIN_ID);

    // A real caretaker appears
    let jamie = store.add_caretaker(family.id, "07", "Jamie", Role::User, "8642");

    // Phase 2: the same security PIN is now Forbidden
    let err = authenticate_family(store.as_ref(), &family, None, SECURITY_PIN)
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::Forbidden);

    // The real caretaker logs in normally; their id is returned unmodified
    let second = authenticate_family(store.as_ref(), &family, Some("07"), "8642")
        .await
        .expect("caretaker login should succeed");
    assert_eq!(second.caretaker.id, jamie.id);
    assert_eq!(second.role, Role::User);
    Ok(())
}

#[tokio::test]
async fn gate_is_per_family() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let staffed = store.add_family("staffed", "Staffed");
    let fresh = store.add_family("fresh", "Fresh");
    store.set_settings(staffed.id, &hash_secret(SECURITY_PIN)?);
    store.set_settings(fresh.id, &hash_secret(SECURITY_PIN)?);
    store.add_caretaker(staffed.id, "01", "Alex", Role::Admin, "1111");

    let err = authenticate_family(store.as_ref(), &staffed, None, SECURITY_PIN)
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::Forbidden);

    let outcome = authenticate_family(store.as_ref(), &fresh, None, SECURITY_PIN)
        .await
        .expect("fresh family should still bootstrap");
    assert_eq!(outcome.role, Role::Admin);
    Ok(())
}

#[tokio::test]
async fn deleting_every_real_caretaker_reopens_bootstrap() -> Result<()> {
    let (store, family) = store_with_family();
    store.set_settings(family.id, &hash_secret(SECURITY_PIN)?);
    let only = store.add_caretaker(family.id, "07", "Jamie", Role::User, "4321");

    assert_eq!(
        authenticate_family(store.as_ref(), &family, None, SECURITY_PIN).await.unwrap_err(),
        AuthError::Forbidden
    );

    // Soft-delete drops the real count back to zero; the same count check
    // reopens the gate with no special case
    store.soft_delete_caretaker(only.id);
    let outcome = authenticate_family(store.as_ref(), &family, None, SECURITY_PIN)
        .await
        .expect("bootstrap should reopen");
    assert_eq!(outcome.role, Role::Admin);
    Ok(())
}

#[tokio::test]
async fn wrong_pin_for_real_caretaker_is_unauthenticated() -> Result<()> {
    let (store, family) = store_with_family();
    store.add_caretaker(family.id, "07", "Jamie", Role::User, "4321");

    let err = authenticate_family(store.as_ref(), &family, Some("07"), "0000")
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::Unauthenticated);

    let err = authenticate_family(store.as_ref(), &family, Some("99"), "4321")
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::Unauthenticated);
    Ok(())
}

#[tokio::test]
async fn bootstrap_store_failure_fails_closed() -> Result<()> {
    let (store, family) = store_with_family();
    store.set_settings(family.id, &hash_secret(SECURITY_PIN)?);
    store.fail_next_bootstrap();

    // Credentials matched, but the side effect failed: InternalError, never
    // a silent unauthenticated pass-through
    let err = authenticate_family(store.as_ref(), &family, None, SECURITY_PIN)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Internal(_)));
    Ok(())
}

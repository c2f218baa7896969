//! Profile and tier synchronization: periodic refresh, no-op updates.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use pelican_core::{Address, KycState, UserDetails};
use pelican_integration_tests::{
    active_user, engine, init_tracing, tier, MockApi, MockMetadata, MockWallet,
};

fn address() -> Address {
    Address {
        line1: "1 Main St".to_string(),
        line2: None,
        city: "London".to_string(),
        state: None,
        post_code: "E1 6AN".to_string(),
        country: "GB".to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_pending_verification_schedules_single_refresh() {
    init_tracing();
    let api = Arc::new(MockApi::new());
    // Long token lifetime keeps renewals out of the observation window.
    api.set_session_ttl(3600).await;
    let mut user = active_user();
    user.kyc_state = KycState::Pending;
    api.set_user(user).await;
    let engine = engine(
        Arc::clone(&api),
        Arc::new(MockMetadata::with_credentials()),
        Arc::new(MockWallet::new()),
    );

    engine.sign_in().await.unwrap();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(api.call_count("getUser").await, 1);
    assert!(engine.user_refresh_task_active().await);

    // A second fetch must not start a second refresh chain.
    engine.fetch_user().await.unwrap();
    assert_eq!(api.call_count("getUser").await, 2);

    // One tick per 30-second period from the single chain.
    sleep(Duration::from_secs(31)).await;
    assert_eq!(api.call_count("getUser").await, 3);
    sleep(Duration::from_secs(30)).await;
    assert_eq!(api.call_count("getUser").await, 4);
}

#[tokio::test(start_paused = true)]
async fn test_verified_user_gets_no_refresh_task() {
    init_tracing();
    let api = Arc::new(MockApi::new());
    api.set_session_ttl(3600).await;
    let mut user = active_user();
    user.kyc_state = KycState::Verified;
    api.set_user(user).await;
    let engine = engine(
        Arc::clone(&api),
        Arc::new(MockMetadata::with_credentials()),
        Arc::new(MockWallet::new()),
    );

    engine.sign_in().await.unwrap();
    sleep(Duration::from_millis(100)).await;
    assert!(!engine.user_refresh_task_active().await);

    sleep(Duration::from_secs(61)).await;
    assert_eq!(api.call_count("getUser").await, 1);
}

#[tokio::test]
async fn test_update_user_with_unchanged_details_skips_backend() {
    init_tracing();
    let api = Arc::new(MockApi::new());
    let mut user = active_user();
    user.details.first_name = Some("Satoshi".to_string());
    api.set_user(user).await;
    let engine = engine(
        Arc::clone(&api),
        Arc::new(MockMetadata::with_credentials()),
        Arc::new(MockWallet::new()),
    );
    engine.fetch_user().await.unwrap();

    let patch = UserDetails {
        first_name: Some("Satoshi".to_string()),
        ..UserDetails::default()
    };
    let profile = engine.update_user(&patch).await.unwrap();

    assert_eq!(api.call_count("updateUser").await, 0);
    assert_eq!(profile.details.first_name.as_deref(), Some("Satoshi"));
}

#[tokio::test]
async fn test_update_user_with_changed_details_updates_and_refetches() {
    init_tracing();
    let api = Arc::new(MockApi::new());
    let mut user = active_user();
    user.details.first_name = Some("Satoshi".to_string());
    user.details.last_name = Some("Nakamoto".to_string());
    api.set_user(user).await;
    let engine = engine(
        Arc::clone(&api),
        Arc::new(MockMetadata::with_credentials()),
        Arc::new(MockWallet::new()),
    );
    engine.fetch_user().await.unwrap();
    let fetches = api.call_count("getUser").await;

    let patch = UserDetails {
        first_name: Some("Dorian".to_string()),
        ..UserDetails::default()
    };
    let profile = engine.update_user(&patch).await.unwrap();

    assert_eq!(api.call_count("updateUser").await, 1);
    assert_eq!(api.call_count("getUser").await, fetches + 1);
    // Patched field changed, untouched field preserved.
    assert_eq!(profile.details.first_name.as_deref(), Some("Dorian"));
    assert_eq!(profile.details.last_name.as_deref(), Some("Nakamoto"));
}

#[tokio::test]
async fn test_update_user_falls_back_to_cached_profile_when_refetch_fails() {
    init_tracing();
    let api = Arc::new(MockApi::new());
    let mut user = active_user();
    user.details.first_name = Some("Satoshi".to_string());
    api.set_user(user).await;
    let engine = engine(
        Arc::clone(&api),
        Arc::new(MockMetadata::with_credentials()),
        Arc::new(MockWallet::new()),
    );
    engine.fetch_user().await.unwrap();

    api.fail_user_fetches(1).await;
    let patch = UserDetails {
        first_name: Some("Dorian".to_string()),
        ..UserDetails::default()
    };
    let profile = engine.update_user(&patch).await.unwrap();

    // The backend update went through, but with the re-fetch down the
    // caller gets the pre-update cached profile.
    assert_eq!(api.call_count("updateUser").await, 1);
    assert_eq!(profile.details.first_name.as_deref(), Some("Satoshi"));
    // The fetch failure itself is published.
    assert!(matches!(
        engine.store().user().await,
        pelican_core::Remote::Failure(_)
    ));
}

#[tokio::test]
async fn test_update_user_address_with_unchanged_address_skips_backend() {
    init_tracing();
    let api = Arc::new(MockApi::new());
    let mut user = active_user();
    user.address = Some(address());
    api.set_user(user).await;
    let engine = engine(
        Arc::clone(&api),
        Arc::new(MockMetadata::with_credentials()),
        Arc::new(MockWallet::new()),
    );
    engine.fetch_user().await.unwrap();

    engine.update_user_address(&address()).await.unwrap();
    assert_eq!(api.call_count("updateUserAddress").await, 0);

    let mut moved = address();
    moved.city = "Paris".to_string();
    moved.country = "FR".to_string();
    let profile = engine.update_user_address(&moved).await.unwrap();
    assert_eq!(api.call_count("updateUserAddress").await, 1);
    assert_eq!(profile.address.unwrap().city, "Paris");
}

#[tokio::test]
async fn test_tiers_are_sorted_with_tier_zero_hidden() {
    init_tracing();
    let api = Arc::new(MockApi::new());
    api.set_tiers(vec![tier(2), tier(0), tier(1)]).await;
    let engine = engine(
        Arc::clone(&api),
        Arc::new(MockMetadata::with_credentials()),
        Arc::new(MockWallet::new()),
    );

    engine.fetch_tiers().await;

    let tiers = engine.store().tiers().await.into_success().unwrap();
    let indices: Vec<u32> = tiers.iter().map(|t| t.index).collect();
    assert_eq!(indices, vec![1, 2]);
}

#[tokio::test]
async fn test_sync_user_with_wallet_publishes_profile() {
    init_tracing();
    let api = Arc::new(MockApi::new());
    let engine = engine(
        Arc::clone(&api),
        Arc::new(MockMetadata::with_credentials()),
        Arc::new(MockWallet::new()),
    );

    engine.sync_user_with_wallet().await.unwrap();

    assert_eq!(api.call_count("generateRetailToken").await, 1);
    assert_eq!(api.call_count("syncUserWithWallet").await, 1);
    assert!(engine.store().user().await.is_success());
}

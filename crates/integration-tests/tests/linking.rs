//! Exchange linking, address sharing, and campaign header derivation.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use pelican_core::{Campaign, CoinType, Remote};
use pelican_session::{SessionError, SessionEvent};

use pelican_integration_tests::{engine, init_tracing, MockApi, MockMetadata, MockWallet};

#[tokio::test(start_paused = true)]
async fn test_link_account_waits_for_email_verification() {
    init_tracing();
    let api = Arc::new(MockApi::new());
    let wallet = Arc::new(MockWallet::new());
    wallet.set_email_verified(false).await;
    let engine = engine(
        Arc::clone(&api),
        Arc::new(MockMetadata::with_credentials()),
        wallet,
    );
    engine.fetch_user().await.unwrap();

    let linking = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.link_account("link-1").await })
    };

    // The flow is suspended on the verification signal.
    sleep(Duration::from_millis(50)).await;
    assert_eq!(api.call_count("linkAccount").await, 0);
    assert!(engine.store().link_account().await.is_loading());

    engine.events().publish(SessionEvent::EmailVerified);
    linking.await.unwrap();

    assert_eq!(api.call_count("linkAccount").await, 1);
    assert!(engine.store().link_account().await.is_success());
    assert_eq!(api.call_count("shareDepositAddresses").await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_link_account_creates_user_when_not_activated() {
    init_tracing();
    let api = Arc::new(MockApi::new());
    let metadata = Arc::new(MockMetadata::empty());
    let engine = engine(
        Arc::clone(&api),
        Arc::clone(&metadata),
        Arc::new(MockWallet::new()),
    );

    // A wallet with no stored credentials signs in as not-activated.
    engine.sign_in().await.unwrap();
    sleep(Duration::from_millis(50)).await;
    assert!(engine.store().api_token().await.is_not_asked());

    engine.link_account("link-1").await;

    // Linking registered the user, persisted credentials, and established
    // a session before the link call.
    assert_eq!(api.call_count("createUser").await, 1);
    assert_eq!(api.call_count("generateSession").await, 1);
    assert_eq!(api.call_count("linkAccount").await, 1);
    assert_eq!(metadata.writes().await.len(), 1);
    assert!(engine.store().api_token().await.is_success());
    assert!(engine.store().link_account().await.is_success());
    assert!(engine.renewal_task_active().await);
}

#[tokio::test(start_paused = true)]
async fn test_create_user_is_noop_with_session_in_flight() {
    init_tracing();
    let api = Arc::new(MockApi::new());
    let engine = engine(
        Arc::clone(&api),
        Arc::new(MockMetadata::with_credentials()),
        Arc::new(MockWallet::new()),
    );

    engine.sign_in().await.unwrap();
    sleep(Duration::from_millis(50)).await;
    assert_eq!(api.call_count("generateSession").await, 1);

    engine.create_user().await.unwrap();

    assert_eq!(api.call_count("createUser").await, 0);
    assert_eq!(api.call_count("generateRetailToken").await, 0);
    assert_eq!(api.call_count("generateSession").await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_create_user_can_retry_after_failed_establishment() {
    init_tracing();
    let api = Arc::new(MockApi::new());
    api.fail_sessions(1).await;
    let engine = engine(
        Arc::clone(&api),
        Arc::new(MockMetadata::with_credentials()),
        Arc::new(MockWallet::new()),
    );

    // A transient backend failure surfaces as an error, not a stuck state.
    assert!(engine.create_user().await.is_err());
    assert!(engine.store().api_token().await.is_not_asked());
    assert_eq!(api.call_count("generateSession").await, 1);

    // Once the backend recovers, the same call goes through.
    engine.create_user().await.unwrap();
    assert_eq!(api.call_count("generateSession").await, 2);
    assert!(engine.store().api_token().await.is_success());
    assert!(engine.renewal_task_active().await);
}

#[tokio::test]
async fn test_share_addresses_fills_missing_coins_only() {
    init_tracing();
    let api = Arc::new(MockApi::new());
    let engine = engine(
        Arc::clone(&api),
        Arc::new(MockMetadata::with_credentials()),
        Arc::new(MockWallet::new()),
    );
    // The backend already knows a BTC address for this user.
    engine.fetch_user().await.unwrap();

    engine.share_addresses().await;

    let shared = api.shared_addresses().await.unwrap();
    assert_eq!(shared.len(), 3);
    // The known address is kept, not overwritten with a fresh one.
    assert_eq!(
        shared.get(&CoinType::Btc).map(String::as_str),
        Some("1ExistingBtc")
    );
    assert_eq!(
        shared.get(&CoinType::Eth).map(String::as_str),
        Some("0xFreshEth")
    );
    assert_eq!(
        shared.get(&CoinType::Xlm).map(String::as_str),
        Some("GFRESHXLM")
    );
    assert!(engine.store().share_addresses().await.is_success());
}

#[tokio::test]
async fn test_share_addresses_without_user_publishes_failure() {
    init_tracing();
    let api = Arc::new(MockApi::new());
    let engine = engine(
        Arc::clone(&api),
        Arc::new(MockMetadata::with_credentials()),
        Arc::new(MockWallet::new()),
    );

    engine.share_addresses().await;

    assert!(matches!(
        engine.store().share_addresses().await,
        Remote::Failure(_)
    ));
    assert_eq!(api.call_count("shareDepositAddresses").await, 0);
}

#[tokio::test]
async fn test_create_link_account_id_builds_exchange_url() {
    init_tracing();
    let api = Arc::new(MockApi::new());
    let engine = engine(
        Arc::clone(&api),
        Arc::new(MockMetadata::with_credentials()),
        Arc::new(MockWallet::new()),
    );

    let link = engine.create_link_account_id().await.unwrap();

    assert_eq!(link.url.host_str(), Some("exchange.pelican.test"));
    assert_eq!(link.url.path(), format!("/trade/link/{}", link.link_id));
    assert!(link.url.as_str().contains("email=satoshi%40example.com"));
    assert_eq!(
        engine.store().exchange_link().await.into_success().unwrap(),
        link
    );
}

#[tokio::test]
async fn test_campaign_headers_for_sunriver() {
    init_tracing();
    let engine = engine(
        Arc::new(MockApi::new()),
        Arc::new(MockMetadata::with_credentials()),
        Arc::new(MockWallet::new()),
    );
    let campaign = Campaign {
        name: "sunriver".to_string(),
        code: "CODE-1".to_string(),
        email: "satoshi@example.com".to_string(),
    };

    let headers = engine.campaign_headers(&campaign).await.unwrap().unwrap();
    assert_eq!(
        headers.get("x-campaign-address").map(String::as_str),
        Some("GFRESHXLM")
    );
    assert_eq!(
        headers.get("x-campaign-code").map(String::as_str),
        Some("CODE-1")
    );
    assert_eq!(
        headers.get("x-campaign-email").map(String::as_str),
        Some("satoshi@example.com")
    );
}

#[tokio::test]
async fn test_campaign_headers_for_other_campaigns_are_absent() {
    init_tracing();
    let engine = engine(
        Arc::new(MockApi::new()),
        Arc::new(MockMetadata::with_credentials()),
        Arc::new(MockWallet::new()),
    );
    let campaign = Campaign {
        name: "powercoin".to_string(),
        code: "CODE-2".to_string(),
        email: "satoshi@example.com".to_string(),
    };

    assert!(engine.campaign_headers(&campaign).await.unwrap().is_none());
}

#[tokio::test]
async fn test_campaign_headers_require_xlm_account() {
    init_tracing();
    let wallet = Arc::new(MockWallet::new());
    wallet.set_receive_address(CoinType::Xlm, None).await;
    let engine = engine(
        Arc::new(MockApi::new()),
        Arc::new(MockMetadata::with_credentials()),
        wallet,
    );
    let campaign = Campaign {
        name: "sunriver".to_string(),
        code: "CODE-1".to_string(),
        email: "satoshi@example.com".to_string(),
    };

    let result = engine.campaign_headers(&campaign).await;
    assert!(matches!(
        result,
        Err(SessionError::MissingValue("xlmAccount"))
    ));
}

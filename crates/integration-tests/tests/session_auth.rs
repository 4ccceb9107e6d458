//! Login, logout, token persistence and the 401 teardown policy,
//! exercised against the in-process mock shop.

use sprout_client::api::types::{Credentials, ProfileUpdateInput, RegistrationInput};
use sprout_client::{ShopConfig, Storefront};
use sprout_core::Email;
use sprout_integration_tests::{
    ACCESS_TOKEN, PASSWORD, REFRESH_TOKEN, REFRESHED_ACCESS_TOKEN, TestContext, USERNAME,
};

#[tokio::test]
async fn login_persists_token_pair_and_fetches_profile() {
    let ctx = TestContext::logged_in().await;

    assert_eq!(ctx.stored_value("token").as_deref(), Some(ACCESS_TOKEN));
    assert_eq!(
        ctx.stored_value("refreshToken").as_deref(),
        Some(REFRESH_TOKEN)
    );

    let profile = ctx.shop.session().profile().expect("profile loaded");
    assert_eq!(profile.username, USERNAME);
    assert!(ctx.shop.session().is_authenticated());
}

#[tokio::test]
async fn rejected_login_stays_anonymous() {
    let ctx = TestContext::new().await;

    let result = ctx
        .shop
        .session()
        .login(&Credentials {
            username: USERNAME.to_owned(),
            password: "wrong".to_owned(),
        })
        .await;

    assert!(result.is_err());
    assert!(!ctx.shop.session().is_authenticated());
    assert_eq!(ctx.stored_value("token"), None);
    assert_eq!(ctx.stored_value("refreshToken"), None);
}

#[tokio::test]
async fn unauthorized_response_tears_down_session() {
    let ctx = TestContext::logged_in().await;
    assert!(ctx.shop.session().is_authenticated());

    // Server starts rejecting the token (expiry, revocation, ...)
    ctx.server.reject_authenticated(true);

    // The 401 is absorbed: the session just becomes anonymous
    ctx.shop
        .session()
        .fetch_profile()
        .await
        .expect("401 is not surfaced");

    assert!(!ctx.shop.session().is_authenticated());
    assert!(ctx.shop.session().profile().is_none());
    assert_eq!(ctx.stored_value("token"), None);
    assert_eq!(ctx.stored_value("refreshToken"), None);
}

#[tokio::test]
async fn refresh_replaces_only_the_access_token() {
    let ctx = TestContext::logged_in().await;

    assert!(ctx.shop.session().refresh_access_token().await);

    assert_eq!(
        ctx.stored_value("token").as_deref(),
        Some(REFRESHED_ACCESS_TOKEN)
    );
    assert_eq!(
        ctx.stored_value("refreshToken").as_deref(),
        Some(REFRESH_TOKEN)
    );
}

#[tokio::test]
async fn refresh_without_a_refresh_token_logs_out() {
    let ctx = TestContext::new().await;

    assert!(!ctx.shop.session().refresh_access_token().await);
    assert!(!ctx.shop.session().tokens().is_authenticated());
}

#[tokio::test]
async fn session_survives_a_restart() {
    let ctx = TestContext::logged_in().await;

    // A second client over the same storage file plays the role of the
    // process after a restart.
    let config = ShopConfig::new(&ctx.server.base_url(), &ctx.storage_path)
        .expect("build client config");
    let restarted = Storefront::new(&config).expect("build storefront client");

    assert!(restarted.session().tokens().is_authenticated());
    restarted.initialize().await;
    assert!(restarted.session().is_authenticated());
}

#[tokio::test]
async fn registered_account_can_log_in() {
    let ctx = TestContext::new().await;

    let profile = ctx
        .shop
        .session()
        .register(&RegistrationInput {
            username: "bob".to_owned(),
            email: Email::parse("bob@example.com").expect("valid email"),
            password: "hunter2hunter2".to_owned(),
            first_name: Some("Bob".to_owned()),
            phone_number: None,
            address: None,
        })
        .await
        .expect("registration accepted");
    assert_eq!(profile.username, "bob");

    // Registration does not log in
    assert!(!ctx.shop.session().is_authenticated());

    ctx.shop
        .session()
        .login(&Credentials {
            username: "bob".to_owned(),
            password: "hunter2hunter2".to_owned(),
        })
        .await
        .expect("login with fresh account");
    assert!(ctx.shop.session().tokens().is_authenticated());
}

#[tokio::test]
async fn profile_update_merges_into_held_profile() {
    let ctx = TestContext::logged_in().await;

    let merged = ctx
        .shop
        .session()
        .update_profile(&ProfileUpdateInput {
            first_name: Some("Alicia".to_owned()),
            ..ProfileUpdateInput::default()
        })
        .await
        .expect("profile update accepted");

    // Updated field wins, fields the response omitted are retained
    assert_eq!(merged.first_name.as_deref(), Some("Alicia"));
    assert_eq!(merged.email.as_deref(), Some("alice@example.com"));

    let held = ctx.shop.session().profile().expect("profile still held");
    assert_eq!(held.first_name.as_deref(), Some("Alicia"));
}

#[tokio::test]
async fn logout_clears_profile_and_storage() {
    let ctx = TestContext::logged_in().await;

    ctx.shop.session().logout();

    assert!(!ctx.shop.session().is_authenticated());
    assert_eq!(ctx.stored_value("token"), None);
    assert_eq!(ctx.stored_value("refreshToken"), None);

    // Second login works after a logout, with the same password
    ctx.shop
        .session()
        .login(&Credentials {
            username: USERNAME.to_owned(),
            password: PASSWORD.to_owned(),
        })
        .await
        .expect("re-login");
    assert!(ctx.shop.session().is_authenticated());
}

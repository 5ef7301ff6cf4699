//! Registration demo binary
//!
//! Walks an email registration, a phone registration, a sign-in and a photo
//! upload through the `Store` runtime with in-memory providers.

use anyhow::Context;
use lavado_auth::mocks::{MockChallengeVerifier, MockCredentialIssuer, MockDocumentStore, VALID_SMS_CODE};
use lavado_auth::state::{AccountType, VerificationChannel};
use lavado_auth::{AuthAction, AuthConfig, AuthEnvironment, AuthReducer, AuthState, RegistrationForm};
use lavado_core::environment::{Clock, SystemClock};
use lavado_photos::mocks::InMemoryObjectStorage;
use lavado_photos::{PhotoPhase, PhotoService, PhotoUpload};
use lavado_runtime::Store;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const WAIT: Duration = Duration::from_secs(5);

type DemoStore = Store<
    AuthState,
    AuthAction,
    AuthEnvironment<MockCredentialIssuer, MockDocumentStore, MockChallengeVerifier>,
    AuthReducer<MockCredentialIssuer, MockDocumentStore, MockChallengeVerifier>,
>;

fn form(email: &str, channel: VerificationChannel, account_type: AccountType, owner_key: &str) -> RegistrationForm {
    RegistrationForm {
        first_name: "Ana".into(),
        last_name: "Ruiz".into(),
        street: "1 Main St".into(),
        city: "New York".into(),
        state: "NY".into(),
        zip_code: "10001".into(),
        phone: "+1 (212) 555-0100".into(),
        email: email.into(),
        password: "secret1".into(),
        confirm_password: "secret1".into(),
        channel,
        account_type,
        owner_key: owner_key.into(),
    }
}

async fn report(store: &DemoStore) {
    let state = store.state(AuthState::clone).await;
    let session = &state.registration;
    println!("  phase: {:?}", session.phase);
    if let Some(notice) = &session.notice {
        println!("  notice: {}", notice.message());
    }
    if let Some(error) = &session.error {
        println!("  error: {}", error.user_message());
    }
    if let Some(destination) = session.destination() {
        println!("  destination: {destination}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "registration_demo=info,lavado_auth=debug,lavado_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AuthConfig::from_env().context("loading auth configuration")?;
    config.validate()?;
    let owner_key = config.owner_key.clone();

    let issuer = MockCredentialIssuer::new();
    let documents = MockDocumentStore::new();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let env = AuthEnvironment::new(
        issuer.clone(),
        documents.clone(),
        MockChallengeVerifier::new(),
        Arc::clone(&clock),
        config,
    );

    println!("=== Email registration ===");
    let store: DemoStore = Store::new(AuthState::default(), AuthReducer::new(), env.clone());
    store
        .send(AuthAction::SubmitRegistration {
            form: form("cliente@lavado.test", VerificationChannel::Email, AccountType::Customer, ""),
        })
        .await?;
    store.settle(WAIT).await?;
    report(&store).await;

    println!("\n>>> Verify now (link not followed yet)");
    store.send(AuthAction::CheckEmailVerified).await?;
    store.settle(WAIT).await?;
    report(&store).await;

    println!("\n>>> Verify now (link followed)");
    issuer.verify_email("cliente@lavado.test");
    store.send(AuthAction::CheckEmailVerified).await?;
    store.settle(WAIT).await?;
    report(&store).await;

    println!("\n=== Phone registration (owner) ===");
    let store: DemoStore = Store::new(AuthState::default(), AuthReducer::new(), env.clone());
    store
        .send_and_wait_for(
            AuthAction::SubmitRegistration {
                form: form("dueno@lavado.test", VerificationChannel::Phone, AccountType::Owner, &owner_key),
            },
            |a| matches!(a, AuthAction::SmsSent { .. } | AuthAction::SmsSendFailed { .. }),
            WAIT,
        )
        .await?;
    store.settle(WAIT).await?;
    report(&store).await;

    println!("\n>>> Submitting code {VALID_SMS_CODE}");
    store
        .send(AuthAction::SubmitVerificationCode {
            code: VALID_SMS_CODE.into(),
        })
        .await?;
    store.settle(WAIT).await?;
    report(&store).await;

    println!("\n=== Sign in ===");
    let store: DemoStore = Store::new(AuthState::default(), AuthReducer::new(), env);
    store
        .send(AuthAction::SignIn {
            email: "dueno@lavado.test".into(),
            password: "secret1".into(),
        })
        .await?;
    store.settle(WAIT).await?;
    let login = store.state(|s| s.login.clone()).await;
    println!("  phase: {:?}", login.phase);
    if let Some(destination) = login.destination() {
        println!("  destination: {destination}");
    }

    println!("\n=== Order photos ===");
    let photos = PhotoService::new(InMemoryObjectStorage::new(), documents, clock);
    let uploader = login.credential.map(|c| c.user_id);
    let entries = photos
        .upload_order_photos(
            uploader.as_ref(),
            "order-1",
            vec![PhotoUpload {
                name: "antes del lavado.jpg".into(),
                bytes: vec![0xFF, 0xD8, 0xFF],
                content_type: "image/jpeg".into(),
            }],
            PhotoPhase::Before,
        )
        .await?;
    for entry in &entries {
        println!("  {} -> {}", entry.name, photos.download_url(&entry.path).await?);
    }

    store.shutdown(WAIT).await?;
    tracing::info!("Demo complete");
    Ok(())
}

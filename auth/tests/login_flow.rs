//! Sign-in, role routing and the sign-in form's side requests.

#![allow(clippy::unwrap_used)]

mod support;

use lavado_auth::mocks::IssuerCall;
use lavado_auth::state::{LoginPhase, Notice};
use lavado_auth::{AuthAction, AuthError, Destination, Role, ValidationError};
use serde_json::json;
use support::Harness;

fn sign_in(email: &str, password: &str) -> AuthAction {
    AuthAction::SignIn {
        email: email.into(),
        password: password.into(),
    }
}

#[tokio::test]
async fn washer_profile_routes_to_washer_orders() {
    let mut harness = Harness::new();
    let credential = harness.env.issuer.add_account("w@b.com", "secret1");
    harness
        .env
        .documents
        .insert("users", credential.user_id.as_str(), json!({"role": "washer"}));

    harness.send(sign_in(" W@b.com", "secret1")).await;

    let session = &harness.state.login;
    assert_eq!(session.phase, LoginPhase::SignedIn);
    assert_eq!(session.role, Some(Role::Washer));
    assert_eq!(session.destination().map(Destination::path), Some("/washer/orders"));
    assert!(!session.busy);
}

#[tokio::test]
async fn null_and_numeric_profile_fields_do_not_block_sign_in() {
    let mut harness = Harness::new();
    let credential = harness.env.issuer.add_account("w@b.com", "secret1");
    harness.env.documents.insert(
        "users",
        credential.user_id.as_str(),
        json!({"role": "washer", "phone": null, "zipCode": 10001, "createdAt": null}),
    );

    harness.send(sign_in("w@b.com", "secret1")).await;

    let session = &harness.state.login;
    assert_eq!(session.phase, LoginPhase::SignedIn);
    assert_eq!(session.destination(), Some(Destination::WasherOrders));
    assert_eq!(harness.env.issuer.count(IssuerCall::SignOut), 0);
}

#[tokio::test]
async fn stored_role_variants_route_by_role() {
    for (stored, expected) in [
        (json!({"role": "admin"}), Destination::AdminOrders),
        (json!({"role": "owner"}), Destination::OwnerConsole),
        (json!({"role": "manager"}), Destination::CustomerDashboard),
        (json!({"firstName": "Ana"}), Destination::CustomerDashboard),
    ] {
        let mut harness = Harness::new();
        let credential = harness.env.issuer.add_account("a@b.com", "secret1");
        harness.env.documents.insert("users", credential.user_id.as_str(), stored);

        harness.send(sign_in("a@b.com", "secret1")).await;
        assert_eq!(harness.state.login.destination(), Some(expected));
    }
}

#[tokio::test]
async fn missing_profile_signs_in_as_customer() {
    let mut harness = Harness::new();
    harness.env.issuer.add_account("a@b.com", "secret1");

    harness.send(sign_in("a@b.com", "secret1")).await;

    assert_eq!(harness.state.login.role, Some(Role::Customer));
    assert_eq!(harness.state.login.destination(), Some(Destination::CustomerDashboard));
}

#[tokio::test]
async fn disabled_profile_is_signed_out_again() {
    let mut harness = Harness::new();
    let credential = harness.env.issuer.add_account("a@b.com", "secret1");
    harness.env.documents.insert(
        "users",
        credential.user_id.as_str(),
        json!({"role": "washer", "disabled": true}),
    );

    let trace = harness.send(sign_in("a@b.com", "secret1")).await;

    let session = &harness.state.login;
    assert_eq!(session.phase, LoginPhase::Idle);
    assert_eq!(session.error, Some(AuthError::UserDisabled));
    assert_eq!(session.credential, None);
    assert_eq!(session.role, None);
    assert_eq!(harness.env.issuer.count(IssuerCall::SignOut), 1);
    assert_eq!(trace.last(), Some(&AuthAction::LoginSignedOut));
}

#[tokio::test]
async fn issuer_rejections_surface_as_errors() {
    let mut harness = Harness::new();
    harness.env.issuer.add_account("a@b.com", "secret1");

    harness.send(sign_in("a@b.com", "wrong1")).await;
    assert_eq!(harness.state.login.error, Some(AuthError::WrongPassword));
    assert_eq!(harness.state.login.phase, LoginPhase::Idle);

    harness.send(sign_in("nobody@b.com", "secret1")).await;
    assert_eq!(harness.state.login.error, Some(AuthError::UserNotFound));

    harness.env.issuer.disable("a@b.com");
    harness.send(sign_in("a@b.com", "secret1")).await;
    assert_eq!(harness.state.login.error, Some(AuthError::UserDisabled));
    assert_eq!(harness.env.issuer.count(IssuerCall::SignOut), 0);
}

#[tokio::test]
async fn empty_fields_make_no_issuer_call() {
    let mut harness = Harness::new();

    harness.send(sign_in("a@b.com", "")).await;

    assert!(harness.env.issuer.calls().is_empty());
    assert_eq!(
        harness.state.login.error,
        Some(AuthError::Validation(ValidationError::MissingCredentials))
    );
}

#[tokio::test]
async fn unreadable_profile_fails_sign_in() {
    let mut harness = Harness::new();
    harness.env.issuer.add_account("a@b.com", "secret1");
    harness.env.documents.fail_reads_with(AuthError::Unavailable);

    harness.send(sign_in("a@b.com", "secret1")).await;

    assert_eq!(harness.state.login.phase, LoginPhase::Idle);
    assert_eq!(harness.state.login.error, Some(AuthError::Unavailable));
    assert_eq!(harness.env.issuer.count(IssuerCall::SignOut), 1);
}

#[tokio::test]
async fn resend_from_sign_in_signs_in_sends_and_signs_out() {
    let mut harness = Harness::new();
    harness.env.issuer.add_account("a@b.com", "secret1");

    harness
        .send(AuthAction::ResendVerificationFromSignIn {
            email: "a@b.com".into(),
            password: "secret1".into(),
        })
        .await;

    assert_eq!(
        harness.env.issuer.calls(),
        vec![IssuerCall::SignIn, IssuerCall::SendEmailVerification, IssuerCall::SignOut]
    );
    assert_eq!(harness.state.login.notice, Some(Notice::VerificationEmailResent));
    assert_eq!(harness.state.login.phase, LoginPhase::Idle);

    harness
        .send(AuthAction::ResendVerificationFromSignIn {
            email: "a@b.com".into(),
            password: "wrong1".into(),
        })
        .await;
    assert_eq!(harness.state.login.error, Some(AuthError::WrongPassword));
}

#[tokio::test]
async fn password_reset_checks_email_shape() {
    let mut harness = Harness::new();
    harness.env.issuer.add_account("a@b.com", "secret1");

    harness
        .send(AuthAction::RequestPasswordReset {
            email: "not-an-email".into(),
        })
        .await;
    assert!(harness.env.issuer.calls().is_empty());
    assert_eq!(
        harness.state.login.error,
        Some(AuthError::Validation(ValidationError::InvalidEmail))
    );

    harness
        .send(AuthAction::RequestPasswordReset {
            email: " A@B.com".into(),
        })
        .await;
    assert_eq!(
        harness.state.login.notice,
        Some(Notice::PasswordResetSent {
            email: "a@b.com".into()
        })
    );
    assert_eq!(harness.state.login.error, None);
}

#[tokio::test]
async fn sign_out_clears_session() {
    let mut harness = Harness::new();
    harness.env.issuer.add_account("a@b.com", "secret1");
    harness.send(sign_in("a@b.com", "secret1")).await;

    let trace = harness.send(AuthAction::SignOut).await;

    assert_eq!(trace, vec![AuthAction::SignedOut]);
    assert_eq!(harness.state.login.phase, LoginPhase::Idle);
    assert_eq!(harness.state.login.credential, None);
    assert_eq!(harness.state.login.email, "a@b.com");
    assert_eq!(harness.env.issuer.count(IssuerCall::SignOut), 1);
}

// Session flows
//
// Login / OTP / session-check / logout and the account endpoints shared by
// both backend profiles. These are the only places that write the session
// marker: it is set on a successful login or session check and cleared on
// logout (the refresh engine clears it on an unrecoverable 401).

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Value, json};
use strum::IntoEnumIterator;
use tracing::{debug, info};

use crate::auth::{Endpoint, SessionKind};
use crate::client::ApiClient;
use crate::envelope::Envelope;
use crate::request::RequestOptions;

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

impl ApiClient {
    /// Log in against `kind`'s backend.
    ///
    /// On success the backend sets the session cookies and the marker is
    /// set to `kind`. A backend that requires a second factor still answers
    /// 2xx here; [`verify_otp`](Self::verify_otp) then targets the same
    /// profile.
    pub async fn login(
        &self,
        kind: SessionKind,
        username: &str,
        password: &SecretString,
    ) -> Envelope {
        debug!(%kind, username, "logging in");

        let credentials = Credentials {
            username,
            password: password.expose_secret(),
        };
        let options = match RequestOptions::post().json_from(&credentials) {
            Ok(options) => options,
            Err(err) => return Envelope::from(err),
        };
        let envelope = self.call_as(kind, Endpoint::Login, options).await;

        if envelope.ok {
            self.session().set_kind(kind);
            info!(%kind, "login successful");
        }
        envelope
    }

    /// Submit a one-time password for the pending login.
    pub async fn verify_otp(&self, code: &str) -> Envelope {
        let kind = self.active_kind();
        debug!(%kind, "verifying OTP");

        let envelope = self
            .call_as(
                kind,
                Endpoint::VerifyOtp,
                RequestOptions::post().json(json!({ "otp": code })),
            )
            .await;
        if envelope.ok {
            self.session().set_kind(kind);
        }
        envelope
    }

    /// Probe `kind`'s session endpoint; on success mark the session as
    /// belonging to `kind`.
    pub async fn check_session(&self, kind: SessionKind) -> Envelope {
        let envelope = self
            .call_as(kind, Endpoint::SessionCheck, RequestOptions::get())
            .await;
        if envelope.ok {
            self.session().set_kind(kind);
        }
        envelope
    }

    /// Re-establish the marker from existing cookies, trying each profile
    /// in turn. Returns the profile that answered.
    pub async fn restore_session(&self) -> Option<SessionKind> {
        for kind in SessionKind::iter() {
            if self.check_session(kind).await.ok {
                debug!(%kind, "session restored");
                return Some(kind);
            }
        }
        None
    }

    /// End the session. The marker is cleared whatever the backend answers.
    pub async fn logout(&self) -> Envelope {
        let kind = self.active_kind();
        let envelope = self
            .call_as(kind, Endpoint::Logout, RequestOptions::post())
            .await;
        self.session().clear_kind();
        debug!(%kind, status = envelope.status, "logged out");
        envelope
    }

    // ── Account endpoints ────────────────────────────────────────────

    pub async fn register(&self, kind: SessionKind, details: Value) -> Envelope {
        self.call_as(kind, Endpoint::Register, RequestOptions::post().json(details))
            .await
    }

    pub async fn fetch_profile(&self) -> Envelope {
        self.call(Endpoint::Profile, RequestOptions::get()).await
    }

    pub async fn update_profile(&self, changes: Value) -> Envelope {
        self.call(Endpoint::UpdateProfile, RequestOptions::patch().json(changes))
            .await
    }

    pub async fn forgot_password(&self, kind: SessionKind, email: &str) -> Envelope {
        self.call_as(
            kind,
            Endpoint::ForgotPassword,
            RequestOptions::post().json(json!({ "email": email })),
        )
        .await
    }

    /// Complete a reset with the token delivered out of band.
    pub async fn reset_password(
        &self,
        kind: SessionKind,
        token: &str,
        new_password: &SecretString,
    ) -> Envelope {
        let body = json!({
            "token": token,
            "new_password": new_password.expose_secret(),
        });
        self.call_as(kind, Endpoint::ResetPassword, RequestOptions::post().json(body))
            .await
    }

    pub async fn change_password(
        &self,
        current: &SecretString,
        new_password: &SecretString,
    ) -> Envelope {
        let body = json!({
            "old_password": current.expose_secret(),
            "new_password": new_password.expose_secret(),
        });
        self.call(Endpoint::ChangePassword, RequestOptions::post().json(body))
            .await
    }

    pub async fn enable_2fa(&self) -> Envelope {
        self.call(Endpoint::Enable2fa, RequestOptions::post()).await
    }

    pub async fn disable_2fa(&self) -> Envelope {
        self.call(Endpoint::Disable2fa, RequestOptions::post()).await
    }

    pub async fn request_otp(&self) -> Envelope {
        self.call(Endpoint::RequestOtp, RequestOptions::post()).await
    }
}

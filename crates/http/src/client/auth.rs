//! Authentication API client methods

use super::{ClientError, TrackerClient, session::SessionEvent};
use crate::types::{
    LoginRequest, MessageResponse, PasswordResetConfirm, PasswordResetRequest, RegisterRequest,
    TokenResponse,
};
use reqwest::Method;
use tracker_core::Validate;
use tracker_core::types::User;

impl TrackerClient {
    /// Exchange credentials for an access token.
    ///
    /// The token is stored in the client's token slot; the refresh
    /// credential arrives as a cookie and stays inside the transport.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<TokenResponse, ClientError> {
        credentials.validate()?;
        let request = self
            .request(Method::POST, "/auth/token")
            .form(credentials);
        let token: TokenResponse = self.execute_public(request).await?;

        self.inner.tokens.set(&token.access_token)?;
        info!(username = %credentials.username, "Logged in");
        self.inner.events.publish(SessionEvent::LoggedIn);
        Ok(token)
    }

    /// Revoke the refresh credential and drop the local session.
    ///
    /// The local token is cleared even when the revoke call fails; the
    /// returned error only reports that the server was not told.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let revoked = self.revoke_session().await;
        if let Err(err) = &revoked {
            warn!(error = %err, "Logout request failed, clearing local session anyway");
        }

        let cleared = self.inner.tokens.clear();
        self.inner.events.publish(SessionEvent::LoggedOut);
        info!("Logged out");
        cleared?;
        revoked
    }

    async fn revoke_session(&self) -> Result<(), ClientError> {
        // Sent once with the current token; an expired token must not
        // start a refresh just to log out
        let request = self.request(Method::POST, "/auth/logout").build()?;
        let (response, _) = self.send(request).await?;
        super::check_status(response).await?;
        Ok(())
    }

    /// Create an account; does not log in
    pub async fn register(&self, registration: &RegisterRequest) -> Result<User, ClientError> {
        registration.validate()?;
        let request = self
            .request(Method::POST, "/auth/register")
            .json(registration);
        self.execute_public(request).await
    }

    /// Get the logged-in user
    pub async fn me(&self) -> Result<User, ClientError> {
        let request = self.request(Method::GET, "/auth/me");
        self.execute(request).await
    }

    /// Ask for a password-reset link to be mailed to `email`
    pub async fn request_password_reset(
        &self,
        email: impl Into<String>,
    ) -> Result<MessageResponse, ClientError> {
        let body = PasswordResetRequest {
            email: email.into(),
        };
        body.validate()?;
        let request = self
            .request(Method::POST, "/auth/password-reset/request")
            .json(&body);
        self.execute_public(request).await
    }

    /// Set a new password using the token from the reset link
    pub async fn confirm_password_reset(
        &self,
        token: impl Into<String>,
        new_password: impl Into<String>,
    ) -> Result<MessageResponse, ClientError> {
        let body = PasswordResetConfirm {
            token: token.into(),
            new_password: new_password.into(),
        };
        body.validate()?;
        let request = self
            .request(Method::POST, "/auth/password-reset/confirm")
            .json(&body);
        self.execute_public(request).await
    }

    /// Renew the access token now instead of waiting for a 401.
    ///
    /// Joins a refresh that is already running. Fails with
    /// [`ClientError::SessionExpired`] when the refresh credential is no
    /// longer accepted.
    pub async fn refresh_session(&self) -> Result<(), ClientError> {
        if self.refresh_cycle().await? {
            Ok(())
        } else {
            Err(ClientError::SessionExpired)
        }
    }
}

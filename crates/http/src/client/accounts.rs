//! Account API client methods

use super::{ClientError, TrackerClient};
use crate::types::AccountRequest;
use reqwest::Method;
use tracker_core::Validate;
use tracker_core::types::{Account, AccountBalance, RecordId};
use tracker_core::validation::validators;

impl TrackerClient {
    pub async fn list_accounts(&self) -> Result<Vec<Account>, ClientError> {
        let request = self.request(Method::GET, "/accounts/");
        self.execute(request).await
    }

    /// Create an account with a base balance
    pub async fn create_account(&self, balance: f64) -> Result<Account, ClientError> {
        let body = AccountRequest { balance };
        body.validate()?;
        let request = self.request(Method::POST, "/accounts/").json(&body);
        self.execute(request).await
    }

    /// Reset an account's base balance
    pub async fn update_account_balance(
        &self,
        id: RecordId,
        balance: f64,
    ) -> Result<Account, ClientError> {
        validators::validate_id(id, "id")?;
        let body = AccountRequest { balance };
        body.validate()?;
        let request = self
            .request(Method::PUT, &format!("/accounts/{id}"))
            .json(&body);
        self.execute(request).await
    }

    /// Real and apparent balance across the user's accounts
    pub async fn account_balance(&self) -> Result<AccountBalance, ClientError> {
        let request = self.request(Method::GET, "/accounts/balance");
        self.execute(request).await
    }
}

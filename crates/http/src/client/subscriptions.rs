//! Recurring expense (subscription) API client methods

use super::{ClientError, TrackerClient};
use crate::types::NewSubscription;
use reqwest::Method;
use tracker_core::Validate;
use tracker_core::types::{RecordId, Subscription};
use tracker_core::validation::validators;

impl TrackerClient {
    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>, ClientError> {
        let request = self.request(Method::GET, "/recurring-expenses/");
        self.execute(request).await
    }

    pub async fn create_subscription(
        &self,
        subscription: &NewSubscription,
    ) -> Result<Subscription, ClientError> {
        subscription.validate()?;
        let request = self
            .request(Method::POST, "/recurring-expenses/")
            .json(subscription);
        self.execute(request).await
    }

    pub async fn update_subscription(
        &self,
        id: RecordId,
        subscription: &NewSubscription,
    ) -> Result<Subscription, ClientError> {
        validators::validate_id(id, "id")?;
        subscription.validate()?;
        let request = self
            .request(Method::PUT, &format!("/recurring-expenses/{id}"))
            .json(subscription);
        self.execute(request).await
    }

    pub async fn delete_subscription(&self, id: RecordId) -> Result<(), ClientError> {
        validators::validate_id(id, "id")?;
        let request = self.request(Method::DELETE, &format!("/recurring-expenses/{id}"));
        self.execute_empty(request).await
    }

    /// Move the effective date forward by one subscription period
    pub async fn renew_subscription(&self, id: RecordId) -> Result<Subscription, ClientError> {
        validators::validate_id(id, "id")?;
        let request = self.request(Method::POST, &format!("/recurring-expenses/{id}/renew"));
        self.execute(request).await
    }
}

//! Saving goal API client methods

use super::{ClientError, TrackerClient};
use crate::types::{GoalAllocationRequest, NewSavingGoal};
use reqwest::Method;
use tracker_core::Validate;
use tracker_core::types::{RecordId, SavingGoal};
use tracker_core::validation::validators;

impl TrackerClient {
    pub async fn list_saving_goals(&self) -> Result<Vec<SavingGoal>, ClientError> {
        let request = self.request(Method::GET, "/saving-goals/");
        self.execute(request).await
    }

    pub async fn create_saving_goal(&self, goal: &NewSavingGoal) -> Result<SavingGoal, ClientError> {
        goal.validate()?;
        let request = self.request(Method::POST, "/saving-goals/").json(goal);
        self.execute(request).await
    }

    pub async fn update_saving_goal(
        &self,
        id: RecordId,
        goal: &NewSavingGoal,
    ) -> Result<SavingGoal, ClientError> {
        validators::validate_id(id, "id")?;
        goal.validate()?;
        let request = self
            .request(Method::PUT, &format!("/saving-goals/{id}"))
            .json(goal);
        self.execute(request).await
    }

    pub async fn delete_saving_goal(&self, id: RecordId) -> Result<(), ClientError> {
        validators::validate_id(id, "id")?;
        let request = self.request(Method::DELETE, &format!("/saving-goals/{id}"));
        self.execute_empty(request).await
    }

    /// Put money aside for a goal
    pub async fn allocate_to_goal(
        &self,
        id: RecordId,
        allocation: &GoalAllocationRequest,
    ) -> Result<SavingGoal, ClientError> {
        validators::validate_id(id, "id")?;
        allocation.validate()?;
        let request = self
            .request(Method::POST, &format!("/saving-goals/{id}/allocate"))
            .json(allocation);
        self.execute(request).await
    }

    /// Release a goal's saved amount back to the account
    pub async fn redeem_saving_goal(&self, id: RecordId) -> Result<SavingGoal, ClientError> {
        validators::validate_id(id, "id")?;
        let request = self.request(Method::POST, &format!("/saving-goals/{id}/redeem"));
        self.execute(request).await
    }
}

//! Budget API client methods

use super::{ClientError, TrackerClient};
use crate::types::{BudgetRequest, MonthQuery};
use reqwest::Method;
use tracker_core::Validate;
use tracker_core::types::Budget;

impl TrackerClient {
    /// Latest budget in effect for a month, `None` if none was ever set
    pub async fn latest_budget(&self, month: u32, year: i32) -> Result<Option<Budget>, ClientError> {
        let query = MonthQuery::new(month, year)?;
        let request = self.request(Method::GET, "/budgets/latest").query(&query);
        match self.execute(request).await {
            Ok(budget) => Ok(Some(budget)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn create_budget(&self, budget: &BudgetRequest) -> Result<Budget, ClientError> {
        budget.validate()?;
        let request = self.request(Method::POST, "/budgets/").json(budget);
        self.execute(request).await
    }

    /// Replace the budget of the month named in `budget`
    pub async fn update_budget(&self, budget: &BudgetRequest) -> Result<Budget, ClientError> {
        budget.validate()?;
        let query = MonthQuery::new(budget.month, budget.year)?;
        let request = self
            .request(Method::PUT, "/budgets/")
            .query(&query)
            .json(budget);
        self.execute(request).await
    }

    /// Create the month's budget, or update it if one already exists
    pub async fn save_budget(&self, budget: &BudgetRequest) -> Result<Budget, ClientError> {
        if self.latest_budget(budget.month, budget.year).await?.is_some() {
            self.update_budget(budget).await
        } else {
            self.create_budget(budget).await
        }
    }
}

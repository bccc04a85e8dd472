//! Expense API client methods

use super::{ClientError, TrackerClient};
use crate::types::{MonthQuery, NewExpense};
use bytes::Bytes;
use reqwest::Method;
use tracker_core::types::{CategoryPrediction, DailyExpense, Expense, RecordId, Totals};
use tracker_core::validation::validators;
use tracker_core::Validate;

impl TrackerClient {
    /// List the expenses of one month
    pub async fn list_expenses(&self, month: u32, year: i32) -> Result<Vec<Expense>, ClientError> {
        let query = MonthQuery::new(month, year)?;
        let request = self.request(Method::GET, "/expenses/").query(&query);
        self.execute(request).await
    }

    /// Total spent in one month with a per-category breakdown
    pub async fn expense_totals(&self, month: u32, year: i32) -> Result<Totals, ClientError> {
        let query = MonthQuery::new(month, year)?;
        let request = self.request(Method::GET, "/expenses/total").query(&query);
        self.execute(request).await
    }

    /// Day-by-day spending for one month
    pub async fn daily_expenses(
        &self,
        month: u32,
        year: i32,
    ) -> Result<Vec<DailyExpense>, ClientError> {
        let query = MonthQuery::new(month, year)?;
        let request = self.request(Method::GET, "/expenses/daily").query(&query);
        self.execute(request).await
    }

    pub async fn create_expense(&self, expense: &NewExpense) -> Result<Expense, ClientError> {
        expense.validate()?;
        let request = self.request(Method::POST, "/expenses/").json(expense);
        self.execute(request).await
    }

    pub async fn delete_expense(&self, id: RecordId) -> Result<(), ClientError> {
        validators::validate_id(id, "id")?;
        let request = self.request(Method::DELETE, &format!("/expenses/{id}"));
        self.execute_empty(request).await
    }

    /// Download every expense as a spreadsheet export
    pub async fn export_expenses(&self) -> Result<Bytes, ClientError> {
        let request = self.request(Method::GET, "/expenses/export");
        self.execute_bytes(request).await
    }

    /// Ask the server which expense category fits a description
    pub async fn predict_category(&self, name: &str) -> Result<CategoryPrediction, ClientError> {
        validators::validate_not_empty(name, "name")?;
        let request = self
            .request(Method::GET, "/expenses/predict-category")
            .query(&[("name", name.trim())]);
        self.execute(request).await
    }
}

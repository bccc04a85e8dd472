//! Report API client methods

use super::{ClientError, TrackerClient};
use crate::types::{MessageResponse, MonthQuery};
use reqwest::Method;
use tracker_core::types::{MonthlyReport, MonthlySummary};

impl TrackerClient {
    /// Render the monthly report (HTML body)
    pub async fn monthly_report(&self, month: u32, year: i32) -> Result<MonthlyReport, ClientError> {
        let query = MonthQuery::new(month, year)?;
        let request = self.request(Method::GET, "/reports/monthly").query(&query);
        self.execute(request).await
    }

    /// Income, expense and saving totals for a month
    pub async fn monthly_summary(
        &self,
        month: u32,
        year: i32,
    ) -> Result<MonthlySummary, ClientError> {
        let query = MonthQuery::new(month, year)?;
        let request = self.request(Method::GET, "/reports/summary").query(&query);
        self.execute(request).await
    }

    /// Have the server mail the monthly report to the user
    pub async fn email_monthly_report(
        &self,
        month: u32,
        year: i32,
    ) -> Result<MessageResponse, ClientError> {
        let query = MonthQuery::new(month, year)?;
        let request = self
            .request(Method::POST, "/reports/monthly/email")
            .query(&query);
        self.execute(request).await
    }
}

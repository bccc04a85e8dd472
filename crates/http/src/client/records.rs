//! Income and saving API client methods
//!
//! Incomes and savings share one record shape and one endpoint layout;
//! only the collection path and the category table differ.

use super::{ClientError, TrackerClient};
use crate::types::{MonthQuery, NewRecord};
use chrono::Local;
use reqwest::Method;
use tracker_core::RecordKind;
use tracker_core::types::{Income, Record, RecordId, Saving, Totals};
use tracker_core::validation::validators;

impl TrackerClient {
    pub async fn list_incomes(&self, month: u32, year: i32) -> Result<Vec<Income>, ClientError> {
        self.list_records(RecordKind::Income, month, year).await
    }

    pub async fn income_totals(&self, month: u32, year: i32) -> Result<Totals, ClientError> {
        self.record_totals(RecordKind::Income, month, year).await
    }

    pub async fn create_income(&self, income: &NewRecord) -> Result<Income, ClientError> {
        self.create_record(RecordKind::Income, income).await
    }

    pub async fn delete_income(&self, id: RecordId) -> Result<(), ClientError> {
        self.delete_record(RecordKind::Income, id).await
    }

    pub async fn list_savings(&self, month: u32, year: i32) -> Result<Vec<Saving>, ClientError> {
        self.list_records(RecordKind::Saving, month, year).await
    }

    pub async fn saving_totals(&self, month: u32, year: i32) -> Result<Totals, ClientError> {
        self.record_totals(RecordKind::Saving, month, year).await
    }

    pub async fn create_saving(&self, saving: &NewRecord) -> Result<Saving, ClientError> {
        self.create_record(RecordKind::Saving, saving).await
    }

    pub async fn delete_saving(&self, id: RecordId) -> Result<(), ClientError> {
        self.delete_record(RecordKind::Saving, id).await
    }

    async fn list_records(
        &self,
        kind: RecordKind,
        month: u32,
        year: i32,
    ) -> Result<Vec<Record>, ClientError> {
        let query = MonthQuery::new(month, year)?;
        let request = self
            .request(Method::GET, &format!("/{}/", kind.path()))
            .query(&query);
        self.execute(request).await
    }

    async fn record_totals(
        &self,
        kind: RecordKind,
        month: u32,
        year: i32,
    ) -> Result<Totals, ClientError> {
        let query = MonthQuery::new(month, year)?;
        let request = self
            .request(Method::GET, &format!("/{}/total", kind.path()))
            .query(&query);
        self.execute(request).await
    }

    async fn create_record(&self, kind: RecordKind, record: &NewRecord) -> Result<Record, ClientError> {
        record.validate_as(kind, Local::now().date_naive())?;
        let request = self
            .request(Method::POST, &format!("/{}/", kind.path()))
            .json(record);
        self.execute(request).await
    }

    async fn delete_record(&self, kind: RecordKind, id: RecordId) -> Result<(), ClientError> {
        validators::validate_id(id, "id")?;
        let request = self.request(Method::DELETE, &format!("/{}/{id}", kind.path()));
        self.execute_empty(request).await
    }
}

//! Request and response bodies exchanged with the API
//!
//! Payloads the client sends implement [`Validate`]; the resource wrappers
//! run the checks before building a request, so a payload that fails
//! never reaches the network.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracker_core::types::{Intention, Period, RecordKind};
use tracker_core::validation::{Validate, ValidationError, validators};

/// Longest period value the forms offer
pub const MAX_PERIOD_VALUE: u32 = 30;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Credentials for `POST /auth/token`, sent form-url-encoded
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// The account email
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validators::validate_not_empty(&self.username, "username")?;
        validators::validate_not_empty(&self.password, "password")
    }
}

/// Access token issued by login and refresh
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validators::validate_not_empty(&self.name, "name")?;
        validators::validate_email(&self.email, "email")?;
        validators::validate_not_empty(&self.password, "password")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

impl Validate for PasswordResetRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validators::validate_email(&self.email, "email")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub new_password: String,
}

impl Validate for PasswordResetConfirm {
    fn validate(&self) -> Result<(), ValidationError> {
        validators::validate_not_empty(&self.token, "token")?;
        validators::validate_not_empty(&self.new_password, "new_password")
    }
}

/// Plain acknowledgement returned by several endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MessageResponse {
    #[serde(default, alias = "detail")]
    pub message: String,
}

/// Query string for every month-scoped endpoint
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct MonthQuery {
    pub month: u32,
    pub year: i32,
}

impl MonthQuery {
    pub(crate) fn new(month: u32, year: i32) -> Result<Self, ValidationError> {
        validators::validate_month_year(month, year)?;
        Ok(Self { month, year })
    }
}

/// A new expense
#[derive(Debug, Clone, Serialize)]
pub struct NewExpense {
    pub name: String,
    pub date: NaiveDate,
    pub category_id: u32,
    pub amount: f64,
    pub intention: Intention,
}

impl NewExpense {
    pub fn validate_on(&self, today: NaiveDate) -> Result<(), ValidationError> {
        validate_record_fields(
            RecordKind::Expense,
            &self.name,
            self.date,
            self.category_id,
            self.amount,
            today,
        )
    }
}

impl Validate for NewExpense {
    fn validate(&self) -> Result<(), ValidationError> {
        self.validate_on(today())
    }
}

/// A new income or saving entry
#[derive(Debug, Clone, Serialize)]
pub struct NewRecord {
    pub name: String,
    pub date: NaiveDate,
    pub category_id: u32,
    pub amount: f64,
}

impl NewRecord {
    /// Check the fields against the category table of `kind`
    pub fn validate_as(&self, kind: RecordKind, today: NaiveDate) -> Result<(), ValidationError> {
        validate_record_fields(kind, &self.name, self.date, self.category_id, self.amount, today)
    }
}

fn validate_record_fields(
    kind: RecordKind,
    name: &str,
    date: NaiveDate,
    category_id: u32,
    amount: f64,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    validators::validate_not_empty(name, "name")?;
    validators::validate_not_future(date, today, "date")?;
    if kind.category_name(category_id).is_none() {
        return Err(ValidationError::new(
            "category_id",
            format!("{category_id} is not a valid {kind} category"),
        ));
    }
    validators::validate_positive(amount, "amount")
}

/// Budget for one month, used for both create and update
#[derive(Debug, Clone, Serialize)]
pub struct BudgetRequest {
    pub month: u32,
    pub year: i32,
    pub monthly_income: f64,
    pub saving_goal: f64,
    /// Budget per expense category name
    pub category_budgets: BTreeMap<String, f64>,
}

impl Validate for BudgetRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validators::validate_month_year(self.month, self.year)?;
        validators::validate_non_negative(self.monthly_income, "monthly_income")?;
        validators::validate_non_negative(self.saving_goal, "saving_goal")?;

        let mut total = 0.0;
        for (category, amount) in &self.category_budgets {
            if RecordKind::Expense.category_id(category).is_none() {
                return Err(ValidationError::new(
                    "category_budgets",
                    format!("unknown expense category '{category}'"),
                ));
            }
            validators::validate_non_negative(*amount, "category_budgets")?;
            total += amount;
        }
        if total > self.monthly_income {
            return Err(ValidationError::new(
                "category_budgets",
                "total category budgets cannot exceed monthly income",
            ));
        }
        Ok(())
    }
}

/// A new or edited recurring expense
#[derive(Debug, Clone, Serialize)]
pub struct NewSubscription {
    pub name: String,
    pub amount: f64,
    pub category_id: u32,
    pub subscription_period: Period,
    pub effective_date: NaiveDate,
    pub billing_period: Period,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_period: Option<Period>,
}

fn validate_period(period: &Period, field: &'static str) -> Result<(), ValidationError> {
    validators::validate_range(period.value, 1, MAX_PERIOD_VALUE, field)
}

impl Validate for NewSubscription {
    fn validate(&self) -> Result<(), ValidationError> {
        validators::validate_not_empty(&self.name, "name")?;
        validators::validate_positive(self.amount, "amount")?;
        if RecordKind::Expense.category_name(self.category_id).is_none() {
            return Err(ValidationError::new(
                "category_id",
                format!("{} is not a valid expense category", self.category_id),
            ));
        }
        validate_period(&self.subscription_period, "subscription_period")?;
        validate_period(&self.billing_period, "billing_period")?;
        if let Some(due) = &self.due_period {
            validate_period(due, "due_period")?;
        }
        Ok(())
    }
}

/// A new or edited saving goal
#[derive(Debug, Clone, Serialize)]
pub struct NewSavingGoal {
    pub name: String,
    pub target_amount: f64,
    pub target_date: NaiveDate,
    pub saved_amount: f64,
}

impl NewSavingGoal {
    /// Target must be positive, the saved amount within `[0, target]`
    /// and the target date strictly after `today`
    pub fn validate_on(&self, today: NaiveDate) -> Result<(), ValidationError> {
        validators::validate_not_empty(&self.name, "name")?;
        validators::validate_positive(self.target_amount, "target_amount")?;
        validators::validate_non_negative(self.saved_amount, "saved_amount")?;
        if self.saved_amount > self.target_amount {
            return Err(ValidationError::new(
                "saved_amount",
                "cannot exceed the target amount",
            ));
        }
        validators::validate_strictly_future(self.target_date, today, "target_date")
    }
}

impl Validate for NewSavingGoal {
    fn validate(&self) -> Result<(), ValidationError> {
        self.validate_on(today())
    }
}

/// Money to move into a saving goal
#[derive(Debug, Clone, Serialize)]
pub struct GoalAllocationRequest {
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Validate for GoalAllocationRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validators::validate_positive(self.amount, "amount")
    }
}

/// Base balance of an account
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AccountRequest {
    pub balance: f64,
}

impl Validate for AccountRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if !self.balance.is_finite() {
            return Err(ValidationError::new("balance", "must be a finite number"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_core::types::PeriodUnit;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn goal(target_amount: f64, saved_amount: f64, target_date: NaiveDate) -> NewSavingGoal {
        NewSavingGoal {
            name: "Vacation".into(),
            target_amount,
            target_date,
            saved_amount,
        }
    }

    #[test]
    fn test_saving_goal_rules() {
        let today = date(2025, 6, 1);
        let later = date(2026, 1, 1);

        assert!(goal(500.0, 0.0, later).validate_on(today).is_ok());
        assert!(goal(500.0, 500.0, later).validate_on(today).is_ok());

        let err = goal(-5.0, 0.0, later).validate_on(today).unwrap_err();
        assert_eq!(err.field, "target_amount");

        let err = goal(500.0, -1.0, later).validate_on(today).unwrap_err();
        assert_eq!(err.field, "saved_amount");

        let err = goal(500.0, 600.0, later).validate_on(today).unwrap_err();
        assert_eq!(err.field, "saved_amount");

        let err = goal(500.0, 0.0, today).validate_on(today).unwrap_err();
        assert_eq!(err.field, "target_date");
    }

    #[test]
    fn test_expense_rules() {
        let today = date(2025, 6, 1);
        let expense = NewExpense {
            name: "Groceries".into(),
            date: today,
            category_id: 1,
            amount: 42.5,
            intention: Intention::Need,
        };
        assert!(expense.validate_on(today).is_ok());

        let future = NewExpense {
            date: date(2025, 6, 2),
            ..expense.clone()
        };
        assert_eq!(future.validate_on(today).unwrap_err().field, "date");

        let bad_category = NewExpense {
            category_id: 42,
            ..expense.clone()
        };
        assert_eq!(bad_category.validate_on(today).unwrap_err().field, "category_id");

        let zero = NewExpense {
            amount: 0.0,
            ..expense
        };
        assert_eq!(zero.validate_on(today).unwrap_err().field, "amount");
    }

    #[test]
    fn test_record_categories_depend_on_kind() {
        let today = date(2025, 6, 1);
        let record = NewRecord {
            name: "Bonus".into(),
            date: today,
            category_id: 7,
            amount: 100.0,
        };
        assert!(record.validate_as(RecordKind::Income, today).is_ok());
        assert!(record.validate_as(RecordKind::Saving, today).is_err());
    }

    #[test]
    fn test_budget_total_cannot_exceed_income() {
        let mut budgets = BTreeMap::new();
        budgets.insert("Food".to_string(), 600.0);
        budgets.insert("Housing".to_string(), 500.0);
        let request = BudgetRequest {
            month: 5,
            year: 2025,
            monthly_income: 1000.0,
            saving_goal: 100.0,
            category_budgets: budgets,
        };
        assert_eq!(request.validate().unwrap_err().field, "category_budgets");

        let mut ok = request.clone();
        ok.monthly_income = 1100.0;
        assert!(ok.validate().is_ok());

        let mut unknown = ok.clone();
        unknown.category_budgets.insert("Yachts".into(), 1.0);
        assert!(unknown.validate().is_err());
    }

    #[test]
    fn test_subscription_period_bounds() {
        let subscription = NewSubscription {
            name: "Streaming".into(),
            amount: 9.99,
            category_id: 6,
            subscription_period: Period::months(12),
            effective_date: date(2025, 1, 1),
            billing_period: Period::months(1),
            due_period: None,
        };
        assert!(subscription.validate().is_ok());

        let too_long = NewSubscription {
            billing_period: Period {
                value: 31,
                unit: PeriodUnit::Days,
            },
            ..subscription
        };
        assert_eq!(too_long.validate().unwrap_err().field, "billing_period");
    }

    #[test]
    fn test_month_query_bounds() {
        assert!(MonthQuery::new(13, 2025).is_err());
        assert!(MonthQuery::new(12, 2025).is_ok());
    }
}

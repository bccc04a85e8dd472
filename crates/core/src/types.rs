use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Server-assigned identifier for any stored record
pub type RecordId = i64;

/// Why an expense was made
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Intention {
    #[default]
    Need,
    Want,
    Saving,
}

impl std::str::FromStr for Intention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "need" => Ok(Self::Need),
            "want" => Ok(Self::Want),
            "saving" => Ok(Self::Saving),
            other => Err(format!("unknown intention '{other}'")),
        }
    }
}

/// The three kinds of money movement the tracker records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Income,
    Expense,
    Saving,
}

const EXPENSE_CATEGORIES: &[(u32, &str)] = &[
    (1, "Food"),
    (2, "Housing"),
    (3, "Transportation"),
    (4, "Personal"),
    (5, "Utility"),
    (6, "Recreation"),
    (7, "Health"),
    (8, "Debt"),
];

const INCOME_CATEGORIES: &[(u32, &str)] = &[
    (1, "Salary"),
    (2, "Interest"),
    (3, "Gift"),
    (4, "Matured Amount"),
    (5, "Dividend"),
    (6, "Stocks"),
    (7, "Side Hustle"),
    (8, "Others"),
];

const SAVING_CATEGORIES: &[(u32, &str)] = &[
    (1, "Stocks"),
    (2, "PPF"),
    (3, "Recurring deposit"),
    (4, "Fixed Deposit"),
    (5, "Mutual Fund"),
    (6, "Others"),
];

impl RecordKind {
    /// Category table for this kind of record, ordered by id
    pub fn categories(self) -> &'static [(u32, &'static str)] {
        match self {
            Self::Income => INCOME_CATEGORIES,
            Self::Expense => EXPENSE_CATEGORIES,
            Self::Saving => SAVING_CATEGORIES,
        }
    }

    pub fn category_name(self, id: u32) -> Option<&'static str> {
        self.categories()
            .iter()
            .find(|(cid, _)| *cid == id)
            .map(|(_, name)| *name)
    }

    /// Case-insensitive lookup of a category id by name
    pub fn category_id(self, name: &str) -> Option<u32> {
        self.categories()
            .iter()
            .find(|(_, cname)| cname.eq_ignore_ascii_case(name.trim()))
            .map(|(id, _)| *id)
    }

    /// Collection path segment used by the API
    pub fn path(self) -> &'static str {
        match self {
            Self::Income => "incomes",
            Self::Expense => "expenses",
            Self::Saving => "savings",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Income => write!(f, "income"),
            Self::Expense => write!(f, "expense"),
            Self::Saving => write!(f, "saving"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: RecordId,
    pub date: NaiveDate,
    pub category_id: u32,
    #[serde(default)]
    pub category: String,
    pub amount: f64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub intention: Intention,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// An income or saving entry; neither carries an intention
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub id: RecordId,
    pub date: NaiveDate,
    pub category_id: u32,
    #[serde(default)]
    pub category: String,
    pub amount: f64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

pub type Income = Record;
pub type Saving = Record;

/// Monthly total with a per-category breakdown
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Totals {
    pub overall_total: f64,
    #[serde(default)]
    pub category_breakdown: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyExpense {
    pub date: NaiveDate,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryPrediction {
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    pub id: RecordId,
    pub month: u32,
    pub year: i32,
    pub monthly_income: f64,
    pub saving_goal: f64,
    #[serde(default)]
    pub category_budgets: BTreeMap<String, f64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Budget {
    /// Amount left for spending once the saving goal is set aside
    pub fn spendable(&self) -> f64 {
        self.monthly_income - self.saving_goal
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PeriodUnit {
    Days,
    Months,
    Years,
}

impl std::str::FromStr for PeriodUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().trim_end_matches('s') {
            "day" => Ok(Self::Days),
            "month" => Ok(Self::Months),
            "year" => Ok(Self::Years),
            other => Err(format!("unknown period unit '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Period {
    pub value: u32,
    pub unit: PeriodUnit,
}

impl Period {
    pub const fn months(value: u32) -> Self {
        Self {
            value,
            unit: PeriodUnit::Months,
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let unit = match self.unit {
            PeriodUnit::Days => "day",
            PeriodUnit::Months => "month",
            PeriodUnit::Years => "year",
        };
        if self.value == 1 {
            write!(f, "1 {unit}")
        } else {
            write!(f, "{} {unit}s", self.value)
        }
    }
}

/// A recurring expense
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub id: RecordId,
    pub name: String,
    pub amount: f64,
    pub category_id: u32,
    #[serde(default)]
    pub category: String,
    pub subscription_period: Period,
    pub effective_date: NaiveDate,
    pub billing_period: Period,
    #[serde(default)]
    pub due_period: Option<Period>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Redeemed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavingGoal {
    pub id: RecordId,
    pub name: String,
    pub target_date: NaiveDate,
    pub target_amount: f64,
    #[serde(default)]
    pub saved_amount: f64,
    #[serde(default)]
    pub status: GoalStatus,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub redeemed_at: Option<String>,
}

impl SavingGoal {
    /// Fraction of the target saved so far, clamped to [0, 1]
    pub fn progress(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 0.0;
        }
        (self.saved_amount / self.target_amount).clamp(0.0, 1.0)
    }

    pub fn remaining(&self) -> f64 {
        (self.target_amount - self.saved_amount).max(0.0)
    }
}

/// Money moved into a saving goal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalAllocation {
    pub id: RecordId,
    pub saving_goal_id: RecordId,
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: RecordId,
    pub balance: f64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

/// Real balance excludes money locked in saving goals; apparent balance
/// includes every transaction since the base balance was set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountBalance {
    pub real_balance: f64,
    pub apparent_balance: f64,
}

/// Rendered monthly report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyReport {
    pub subject: String,
    pub body: String,
}

/// Income, expense and saving totals for one month
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MonthlySummary {
    pub income: f64,
    pub expenses: f64,
    pub savings: f64,
}

impl MonthlySummary {
    pub fn net(&self) -> f64 {
        self.income - self.expenses - self.savings
    }
}

/// One row parsed out of an uploaded bank statement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Withdrawal", default)]
    pub withdrawal: f64,
    #[serde(rename = "Deposit", default)]
    pub deposit: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionSummary {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    pub total_amount_withdrawn: f64,
    pub total_amount_deposited: f64,
    #[serde(alias = "total_transcations")]
    pub total_transactions: u64,
    pub net_monthly_expenditure: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: RecordId,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
}

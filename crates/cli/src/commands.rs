//! CLI commands

use anyhow::{Context, Result, bail};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;
use tracker_core::RecordKind;
use tracker_core::types::{Intention, Period, PeriodUnit, RecordId};
use tracker_http::TrackerClient;
use tracker_http::types::{
    BudgetRequest, GoalAllocationRequest, LoginRequest, NewExpense, NewRecord, NewSavingGoal,
    NewSubscription, RegisterRequest,
};

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and keep the session for later commands
    Login {
        #[arg(long, env = "TRACKER_EMAIL")]
        email: String,

        #[arg(long, env = "TRACKER_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the session
    Logout,

    /// Create an account
    Register {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "TRACKER_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Show the logged-in user
    Me,

    /// Password reset by email
    PasswordReset {
        #[command(subcommand)]
        command: PasswordResetCommands,
    },

    Expenses {
        #[command(subcommand)]
        command: ExpenseCommands,
    },

    Incomes {
        #[command(subcommand)]
        command: RecordCommands,
    },

    Savings {
        #[command(subcommand)]
        command: RecordCommands,
    },

    /// Monthly budget
    Budget {
        #[command(subcommand)]
        command: BudgetCommands,
    },

    /// Recurring expenses
    Subscriptions {
        #[command(subcommand)]
        command: SubscriptionCommands,
    },

    /// Saving goals
    Goals {
        #[command(subcommand)]
        command: GoalCommands,
    },

    /// Account balance
    Account {
        #[command(subcommand)]
        command: AccountCommands,
    },

    /// Monthly reports
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },

    /// Upload a bank statement and show the parsed transactions
    Import {
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum PasswordResetCommands {
    /// Mail a reset link
    Request {
        #[arg(long)]
        email: String,
    },

    /// Set a new password with the token from the reset link
    Confirm {
        #[arg(long)]
        token: String,

        #[arg(long, env = "TRACKER_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

/// Month selector; defaults to the current month
#[derive(Args, Clone, Copy)]
pub struct MonthArgs {
    #[arg(long)]
    month: Option<u32>,

    #[arg(long)]
    year: Option<i32>,
}

impl MonthArgs {
    fn resolve(self) -> (u32, i32) {
        let today = Local::now().date_naive();
        (
            self.month.unwrap_or_else(|| today.month()),
            self.year.unwrap_or_else(|| today.year()),
        )
    }
}

#[derive(Args)]
pub struct EntryArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    amount: f64,

    /// Category name or id
    #[arg(long)]
    category: String,

    /// Defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Subcommand)]
pub enum ExpenseCommands {
    List {
        #[command(flatten)]
        period: MonthArgs,
    },

    /// Monthly total with category breakdown
    Total {
        #[command(flatten)]
        period: MonthArgs,
    },

    /// Spending per day
    Daily {
        #[command(flatten)]
        period: MonthArgs,
    },

    Add {
        #[command(flatten)]
        entry: EntryArgs,

        /// need, want or saving
        #[arg(long, default_value = "need")]
        intention: Intention,
    },

    Delete {
        id: RecordId,
    },

    /// Download all expenses as a spreadsheet
    Export {
        #[arg(short, long, default_value = "expenses.xlsx")]
        output: PathBuf,
    },

    /// Suggest a category for an expense name
    Predict {
        name: String,
    },
}

#[derive(Subcommand)]
pub enum RecordCommands {
    List {
        #[command(flatten)]
        period: MonthArgs,
    },

    Total {
        #[command(flatten)]
        period: MonthArgs,
    },

    Add {
        #[command(flatten)]
        entry: EntryArgs,
    },

    Delete {
        id: RecordId,
    },
}

#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Show the budget in effect for a month
    Show {
        #[command(flatten)]
        period: MonthArgs,
    },

    /// Create or replace the budget of a month
    Set {
        #[command(flatten)]
        period: MonthArgs,

        #[arg(long)]
        income: f64,

        #[arg(long, default_value_t = 0.0)]
        saving_goal: f64,

        /// Category budget as NAME=AMOUNT, repeatable
        #[arg(long = "category", value_parser = parse_category_budget)]
        categories: Vec<(String, f64)>,
    },
}

#[derive(Subcommand)]
pub enum SubscriptionCommands {
    List,

    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        amount: f64,

        /// Expense category name or id
        #[arg(long)]
        category: String,

        /// Length of one subscription period
        #[arg(long, default_value_t = 1)]
        every: u32,

        /// days, months or years
        #[arg(long, default_value = "months")]
        unit: PeriodUnit,

        /// First billing date, defaults to today
        #[arg(long)]
        start: Option<NaiveDate>,
    },

    Delete {
        id: RecordId,
    },

    /// Advance to the next billing period
    Renew {
        id: RecordId,
    },
}

#[derive(Subcommand)]
pub enum GoalCommands {
    List,

    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        target: f64,

        /// Date the target should be reached by
        #[arg(long)]
        by: NaiveDate,

        #[arg(long, default_value_t = 0.0)]
        saved: f64,
    },

    /// Put money aside for a goal
    Allocate {
        id: RecordId,

        #[arg(long)]
        amount: f64,

        #[arg(long)]
        note: Option<String>,
    },

    Redeem {
        id: RecordId,
    },

    Delete {
        id: RecordId,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    Show,

    /// Real and apparent balance
    Balance,

    /// Set the base balance, creating the account if there is none
    Set {
        #[arg(long, allow_hyphen_values = true)]
        balance: f64,

        /// Account to update; defaults to the first account
        #[arg(long)]
        id: Option<RecordId>,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Print the rendered monthly report
    Show {
        #[command(flatten)]
        period: MonthArgs,
    },

    /// Income, expense and saving totals
    Summary {
        #[command(flatten)]
        period: MonthArgs,
    },

    /// Mail the monthly report
    Email {
        #[command(flatten)]
        period: MonthArgs,
    },
}

impl Commands {
    pub async fn execute(self, client: &TrackerClient) -> Result<()> {
        match self {
            Commands::Login { email, password } => {
                let credentials = LoginRequest {
                    username: email,
                    password,
                };
                client.login(&credentials).await?;
                println!("Logged in as {}", credentials.username);
                Ok(())
            }
            Commands::Logout => {
                client.logout().await?;
                println!("Logged out");
                Ok(())
            }
            Commands::Register {
                name,
                email,
                password,
            } => {
                let user = client
                    .register(&RegisterRequest {
                        name,
                        email,
                        password,
                    })
                    .await?;
                println!("Registered {}; run `tracker login` to start a session", user.email);
                Ok(())
            }
            Commands::Me => print_json(&client.me().await?),
            Commands::PasswordReset { command } => command.execute(client).await,
            Commands::Expenses { command } => command.execute(client).await,
            Commands::Incomes { command } => command.execute(client, RecordKind::Income).await,
            Commands::Savings { command } => command.execute(client, RecordKind::Saving).await,
            Commands::Budget { command } => command.execute(client).await,
            Commands::Subscriptions { command } => command.execute(client).await,
            Commands::Goals { command } => command.execute(client).await,
            Commands::Account { command } => command.execute(client).await,
            Commands::Report { command } => command.execute(client).await,
            Commands::Import { file } => import_statement(client, file).await,
        }
    }
}

impl PasswordResetCommands {
    async fn execute(self, client: &TrackerClient) -> Result<()> {
        let response = match self {
            PasswordResetCommands::Request { email } => client.request_password_reset(email).await?,
            PasswordResetCommands::Confirm { token, password } => {
                client.confirm_password_reset(token, password).await?
            }
        };
        println!("{}", response.message);
        Ok(())
    }
}

impl ExpenseCommands {
    async fn execute(self, client: &TrackerClient) -> Result<()> {
        match self {
            ExpenseCommands::List { period } => {
                let (month, year) = period.resolve();
                print_json(&client.list_expenses(month, year).await?)
            }
            ExpenseCommands::Total { period } => {
                let (month, year) = period.resolve();
                print_json(&client.expense_totals(month, year).await?)
            }
            ExpenseCommands::Daily { period } => {
                let (month, year) = period.resolve();
                print_json(&client.daily_expenses(month, year).await?)
            }
            ExpenseCommands::Add { entry, intention } => {
                let expense = NewExpense {
                    category_id: category_id(RecordKind::Expense, &entry.category)?,
                    name: entry.name,
                    date: entry.date.unwrap_or_else(|| Local::now().date_naive()),
                    amount: entry.amount,
                    intention,
                };
                print_json(&client.create_expense(&expense).await?)
            }
            ExpenseCommands::Delete { id } => {
                client.delete_expense(id).await?;
                println!("Deleted expense {id}");
                Ok(())
            }
            ExpenseCommands::Export { output } => {
                let bytes = client.export_expenses().await?;
                tokio::fs::write(&output, &bytes)
                    .await
                    .with_context(|| format!("writing {}", output.display()))?;
                info!(path = %output.display(), size = bytes.len(), "Exported expenses");
                println!("Wrote {}", output.display());
                Ok(())
            }
            ExpenseCommands::Predict { name } => {
                match client.predict_category(&name).await?.category {
                    Some(category) => println!("{category}"),
                    None => println!("No suggestion"),
                }
                Ok(())
            }
        }
    }
}

impl RecordCommands {
    async fn execute(self, client: &TrackerClient, kind: RecordKind) -> Result<()> {
        match self {
            RecordCommands::List { period } => {
                let (month, year) = period.resolve();
                let records = match kind {
                    RecordKind::Saving => client.list_savings(month, year).await?,
                    _ => client.list_incomes(month, year).await?,
                };
                print_json(&records)
            }
            RecordCommands::Total { period } => {
                let (month, year) = period.resolve();
                let totals = match kind {
                    RecordKind::Saving => client.saving_totals(month, year).await?,
                    _ => client.income_totals(month, year).await?,
                };
                print_json(&totals)
            }
            RecordCommands::Add { entry } => {
                let record = NewRecord {
                    category_id: category_id(kind, &entry.category)?,
                    name: entry.name,
                    date: entry.date.unwrap_or_else(|| Local::now().date_naive()),
                    amount: entry.amount,
                };
                let created = match kind {
                    RecordKind::Saving => client.create_saving(&record).await?,
                    _ => client.create_income(&record).await?,
                };
                print_json(&created)
            }
            RecordCommands::Delete { id } => {
                match kind {
                    RecordKind::Saving => client.delete_saving(id).await?,
                    _ => client.delete_income(id).await?,
                }
                println!("Deleted {kind} {id}");
                Ok(())
            }
        }
    }
}

impl BudgetCommands {
    async fn execute(self, client: &TrackerClient) -> Result<()> {
        match self {
            BudgetCommands::Show { period } => {
                let (month, year) = period.resolve();
                match client.latest_budget(month, year).await? {
                    Some(budget) => print_json(&budget),
                    None => {
                        println!("No budget set for {month:02}/{year}");
                        Ok(())
                    }
                }
            }
            BudgetCommands::Set {
                period,
                income,
                saving_goal,
                categories,
            } => {
                let (month, year) = period.resolve();
                let budget = BudgetRequest {
                    month,
                    year,
                    monthly_income: income,
                    saving_goal,
                    category_budgets: categories.into_iter().collect::<BTreeMap<_, _>>(),
                };
                print_json(&client.save_budget(&budget).await?)
            }
        }
    }
}

impl SubscriptionCommands {
    async fn execute(self, client: &TrackerClient) -> Result<()> {
        match self {
            SubscriptionCommands::List => print_json(&client.list_subscriptions().await?),
            SubscriptionCommands::Add {
                name,
                amount,
                category,
                every,
                unit,
                start,
            } => {
                let period = Period { value: every, unit };
                let subscription = NewSubscription {
                    name,
                    amount,
                    category_id: category_id(RecordKind::Expense, &category)?,
                    subscription_period: period,
                    effective_date: start.unwrap_or_else(|| Local::now().date_naive()),
                    billing_period: period,
                    due_period: None,
                };
                print_json(&client.create_subscription(&subscription).await?)
            }
            SubscriptionCommands::Delete { id } => {
                client.delete_subscription(id).await?;
                println!("Deleted subscription {id}");
                Ok(())
            }
            SubscriptionCommands::Renew { id } => print_json(&client.renew_subscription(id).await?),
        }
    }
}

impl GoalCommands {
    async fn execute(self, client: &TrackerClient) -> Result<()> {
        match self {
            GoalCommands::List => {
                for goal in client.list_saving_goals().await? {
                    println!(
                        "#{:<4} {:<24} {:>10.2} / {:<10.2} {:>5.1}%  by {}  ({:?})",
                        goal.id,
                        goal.name,
                        goal.saved_amount,
                        goal.target_amount,
                        goal.progress() * 100.0,
                        goal.target_date,
                        goal.status,
                    );
                }
                Ok(())
            }
            GoalCommands::Add {
                name,
                target,
                by,
                saved,
            } => {
                let goal = NewSavingGoal {
                    name,
                    target_amount: target,
                    target_date: by,
                    saved_amount: saved,
                };
                print_json(&client.create_saving_goal(&goal).await?)
            }
            GoalCommands::Allocate { id, amount, note } => {
                let allocation = GoalAllocationRequest { amount, note };
                print_json(&client.allocate_to_goal(id, &allocation).await?)
            }
            GoalCommands::Redeem { id } => print_json(&client.redeem_saving_goal(id).await?),
            GoalCommands::Delete { id } => {
                client.delete_saving_goal(id).await?;
                println!("Deleted saving goal {id}");
                Ok(())
            }
        }
    }
}

impl AccountCommands {
    async fn execute(self, client: &TrackerClient) -> Result<()> {
        match self {
            AccountCommands::Show => print_json(&client.list_accounts().await?),
            AccountCommands::Balance => {
                let balance = client.account_balance().await?;
                println!("Real balance:     {:.2}", balance.real_balance);
                println!("Apparent balance: {:.2}", balance.apparent_balance);
                Ok(())
            }
            AccountCommands::Set { balance, id } => {
                let id = match id {
                    Some(id) => Some(id),
                    None => client.list_accounts().await?.first().map(|a| a.id),
                };
                let account = match id {
                    Some(id) => client.update_account_balance(id, balance).await?,
                    None => client.create_account(balance).await?,
                };
                print_json(&account)
            }
        }
    }
}

impl ReportCommands {
    async fn execute(self, client: &TrackerClient) -> Result<()> {
        match self {
            ReportCommands::Show { period } => {
                let (month, year) = period.resolve();
                let report = client.monthly_report(month, year).await?;
                println!("{}\n\n{}", report.subject, report.body);
                Ok(())
            }
            ReportCommands::Summary { period } => {
                let (month, year) = period.resolve();
                let summary = client.monthly_summary(month, year).await?;
                println!("Income:   {:>10.2}", summary.income);
                println!("Expenses: {:>10.2}", summary.expenses);
                println!("Savings:  {:>10.2}", summary.savings);
                println!("Net:      {:>10.2}", summary.net());
                Ok(())
            }
            ReportCommands::Email { period } => {
                let (month, year) = period.resolve();
                let response = client.email_monthly_report(month, year).await?;
                println!("{}", response.message);
                Ok(())
            }
        }
    }
}

async fn import_statement(client: &TrackerClient, file: PathBuf) -> Result<()> {
    let contents = tokio::fs::read(&file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let Some(file_name) = file.file_name().and_then(|n| n.to_str()) else {
        bail!("{} is not a file name", file.display());
    };

    let summary = client.upload_statement(file_name, contents).await?;
    for tx in &summary.transactions {
        println!(
            "{:<12} {:<40} {:>10.2} {:>10.2}",
            tx.date, tx.description, tx.withdrawal, tx.deposit
        );
    }
    println!(
        "{} transactions, withdrawn {:.2}, deposited {:.2}, net {:.2}",
        summary.total_transactions,
        summary.total_amount_withdrawn,
        summary.total_amount_deposited,
        summary.net_monthly_expenditure
    );
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Accept a category either by id or by (case-insensitive) name
fn category_id(kind: RecordKind, value: &str) -> Result<u32> {
    if let Ok(id) = value.trim().parse::<u32>() {
        return Ok(id);
    }
    kind.category_id(value).with_context(|| {
        let known: Vec<_> = kind.categories().iter().map(|(_, name)| *name).collect();
        format!("unknown {kind} category '{value}', expected one of: {}", known.join(", "))
    })
}

fn parse_category_budget(value: &str) -> Result<(String, f64), String> {
    let (name, amount) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=AMOUNT, got '{value}'"))?;
    let amount = amount
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid amount '{amount}': {e}"))?;
    let name = RecordKind::Expense
        .category_id(name)
        .and_then(|id| RecordKind::Expense.category_name(id))
        .ok_or_else(|| format!("unknown expense category '{name}'"))?;
    Ok((name.to_string(), amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_by_name_or_id() {
        assert_eq!(category_id(RecordKind::Expense, "food").unwrap(), 1);
        assert_eq!(category_id(RecordKind::Income, "Salary").unwrap(), 1);
        assert_eq!(category_id(RecordKind::Saving, "4").unwrap(), 4);
        assert!(category_id(RecordKind::Expense, "Salary").is_err());
    }

    #[test]
    fn test_parse_category_budget() {
        assert_eq!(
            parse_category_budget("food=250.5").unwrap(),
            ("Food".to_string(), 250.5)
        );
        assert!(parse_category_budget("Food").is_err());
        assert!(parse_category_budget("Food=lots").is_err());
        assert!(parse_category_budget("Gifts=10").is_err());
    }
}

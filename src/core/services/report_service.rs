//! Trial balance, income statement, balance sheet and dashboard figures.
//!
//! Reports are computed from one consistent snapshot of the accounts, so
//! they never observe half of a posting.

use serde::{Deserialize, Serialize};

use crate::domain::{Account, AccountType, Amount, Loan, LoanStatus, Member, NormalSide};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrialBalanceLine {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub debit: Amount,
    pub credit: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrialBalance {
    pub lines: Vec<TrialBalanceLine>,
    pub total_debit: Amount,
    pub total_credit: Amount,
}

impl TrialBalance {
    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatementLine {
    pub code: String,
    pub name: String,
    pub amount: Amount,
}

impl From<&Account> for StatementLine {
    fn from(account: &Account) -> Self {
        Self {
            code: account.code.clone(),
            name: account.name.clone(),
            amount: account.balance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncomeStatement {
    pub revenues: Vec<StatementLine>,
    pub expenses: Vec<StatementLine>,
    pub total_revenue: Amount,
    pub total_expense: Amount,
    pub net_income: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceSheet {
    pub assets: Vec<StatementLine>,
    pub liabilities: Vec<StatementLine>,
    pub equity: Vec<StatementLine>,
    pub total_assets: Amount,
    pub total_liabilities: Amount,
    pub total_equity: Amount,
    /// Revenue less expense not yet closed into equity.
    pub current_earnings: Amount,
}

impl BalanceSheet {
    pub fn is_balanced(&self) -> bool {
        self.total_assets == self.total_liabilities + self.total_equity + self.current_earnings
    }
}

/// Headline figures for the administrator dashboard and advisory prompts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardSummary {
    pub member_count: usize,
    pub active_member_count: usize,
    pub total_member_savings: Amount,
    pub active_loan_count: usize,
    pub pending_loan_count: usize,
    pub outstanding_loan_principal: Amount,
    pub cash_balance: Amount,
    pub total_assets: Amount,
    pub net_income: Amount,
}

pub struct ReportService;

impl ReportService {
    /// Lists every account on its normal side; negative balances flip sides.
    pub fn trial_balance(accounts: &[Account]) -> TrialBalance {
        let lines: Vec<TrialBalanceLine> = accounts
            .iter()
            .map(|account| {
                let (debit, credit) = match (account.account_type.normal_side(), account.balance) {
                    (NormalSide::Debit, balance) if balance >= 0 => (balance, 0),
                    (NormalSide::Debit, balance) => (0, -balance),
                    (NormalSide::Credit, balance) if balance >= 0 => (0, balance),
                    (NormalSide::Credit, balance) => (-balance, 0),
                };
                TrialBalanceLine {
                    code: account.code.clone(),
                    name: account.name.clone(),
                    account_type: account.account_type,
                    debit,
                    credit,
                }
            })
            .collect();
        TrialBalance {
            total_debit: lines.iter().map(|line| line.debit).sum(),
            total_credit: lines.iter().map(|line| line.credit).sum(),
            lines,
        }
    }

    pub fn income_statement(accounts: &[Account]) -> IncomeStatement {
        let revenues = lines_of(accounts, AccountType::Revenue);
        let expenses = lines_of(accounts, AccountType::Expense);
        let total_revenue = total(&revenues);
        let total_expense = total(&expenses);
        IncomeStatement {
            revenues,
            expenses,
            total_revenue,
            total_expense,
            net_income: total_revenue - total_expense,
        }
    }

    pub fn balance_sheet(accounts: &[Account]) -> BalanceSheet {
        let assets = lines_of(accounts, AccountType::Asset);
        let liabilities = lines_of(accounts, AccountType::Liability);
        let equity = lines_of(accounts, AccountType::Equity);
        let income = Self::income_statement(accounts);
        BalanceSheet {
            total_assets: total(&assets),
            total_liabilities: total(&liabilities),
            total_equity: total(&equity),
            current_earnings: income.net_income,
            assets,
            liabilities,
            equity,
        }
    }

    /// `cash_code` is the account the posting rules book cash to.
    pub fn dashboard(
        accounts: &[Account],
        members: &[Member],
        loans: &[Loan],
        cash_code: &str,
    ) -> DashboardSummary {
        let active_loans = loans.iter().filter(|loan| loan.status == LoanStatus::Active);
        DashboardSummary {
            member_count: members.len(),
            active_member_count: members.iter().filter(|member| member.is_active()).count(),
            total_member_savings: members.iter().map(|member| member.balance).sum(),
            active_loan_count: active_loans.clone().count(),
            pending_loan_count: loans
                .iter()
                .filter(|loan| loan.status == LoanStatus::Pending)
                .count(),
            outstanding_loan_principal: active_loans.map(|loan| loan.remaining_balance).sum(),
            cash_balance: accounts
                .iter()
                .find(|account| account.code == cash_code)
                .map(|account| account.balance)
                .unwrap_or(0),
            total_assets: total(&lines_of(accounts, AccountType::Asset)),
            net_income: Self::income_statement(accounts).net_income,
        }
    }
}

fn lines_of(accounts: &[Account], account_type: AccountType) -> Vec<StatementLine> {
    accounts
        .iter()
        .filter(|account| account.account_type == account_type)
        .map(StatementLine::from)
        .collect()
}

fn total(lines: &[StatementLine]) -> Amount {
    lines.iter().map(|line| line.amount).sum()
}

//! Net Worth Parser
//!
//! Reads the account list of the Empower net worth page. Below an
//! `Account` / `Type` / `Balance` column header, accounts are grouped under
//! headers (`Cash`, `Investment`, `Credit`, `Loan`, `Mortgage`,
//! `Other Asset`), each followed by the group total. One account renders as:
//!
//! ```text
//! Charles Schwab                  provider
//! Brokerage - Ending in 1234      account name (optional)
//! Investment                      account type (optional)
//! $52,340.12                      balance
//! 3/4/2025 10:15AM                as-of date (optional)
//! ```

pub mod export;

pub use export::{format_networth_text, save_networth_csv, write_networth_csv, NETWORTH_CSV_HEADER};

use crate::archive::PlainText;
use crate::error::NetWorthError;
use crate::holdings::parse_amount;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Lines after a group header searched for the group total
const GROUP_TOTAL_LOOKAHEAD: usize = 4;

/// Lines after the net worth label searched for its amount
const TOTAL_LOOKAHEAD: usize = 3;

/// Provider shown for manually entered properties
const MANUAL_PROVIDER: &str = "Empower Manual";

/// Account types the page prints under the account name
const ACCOUNT_TYPES: &[&str] = &[
    "Checking",
    "Savings",
    "Investment",
    "IRA Traditional",
    "IRA Roth",
    "IRA SEP",
    "401k Traditional",
    "401k Roth",
    "Personal",
    "Credit Card",
    "Line of Credit",
    "Mortgage",
    "Assets",
    "Property",
    "Cryptocurrency",
];

static RE_BALANCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[-\x{2212}]?\$\s*[\d,]*\d(?:\.\d+)?|[-\x{2212}][\d,]*\d(?:\.\d+)?|\(\$[\d,]*\d(?:\.\d+)?\))$",
    )
    .unwrap()
});
static RE_AS_OF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^\d{1,2}/\d{1,2}/\d{2,4}|^\d{1,2}:\d{2}\s?[AP]M$|\bago$)").unwrap()
});
static RE_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\s+.*\b(?:Ct|St|Ave|Dr|Ln|Rd|Way|Blvd|Pl|Cir|Ter)\b").unwrap()
});
static RE_NET_WORTH_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^net\s+worth:?(?:\s+(.*))?$").unwrap());
static RE_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Alphabetic}").unwrap());

/// Group header in the account list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountGroup {
    Cash,
    Investment,
    Credit,
    Loan,
    Mortgage,
    OtherAsset,
}

impl AccountGroup {
    pub fn from_header(line: &str) -> Option<Self> {
        match line.trim() {
            "Cash" => Some(Self::Cash),
            "Investment" => Some(Self::Investment),
            "Credit" => Some(Self::Credit),
            "Loan" => Some(Self::Loan),
            "Mortgage" => Some(Self::Mortgage),
            "Other Asset" => Some(Self::OtherAsset),
            _ => None,
        }
    }
}

/// Reporting category of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Cash,
    InvestmentBrokerage,
    InvestmentRetirement,
    Credit,
    Loan,
    Mortgage,
    Other,
}

impl Category {
    /// Categorize by account type, falling back to the enclosing group.
    pub fn classify(account_type: Option<&str>, group: Option<AccountGroup>) -> Self {
        if group == Some(AccountGroup::OtherAsset) {
            return Self::Other;
        }

        let account_type = account_type.unwrap_or_default().to_ascii_lowercase();
        match account_type.as_str() {
            "checking" | "savings" => Self::Cash,
            "investment" | "cryptocurrency" => Self::InvestmentBrokerage,
            t if t.contains("401k") || t.contains("ira") => Self::InvestmentRetirement,
            "personal" | "credit card" => Self::Credit,
            "line of credit" => Self::Loan,
            "mortgage" => Self::Mortgage,
            "assets" | "property" => Self::Other,
            _ => match group {
                Some(AccountGroup::Cash) => Self::Cash,
                Some(AccountGroup::Investment) => Self::InvestmentBrokerage,
                Some(AccountGroup::Credit) => Self::Credit,
                Some(AccountGroup::Loan) => Self::Loan,
                Some(AccountGroup::Mortgage) => Self::Mortgage,
                _ => Self::Other,
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::InvestmentBrokerage => "Investment Brokerage",
            Self::InvestmentRetirement => "Investment Retirement",
            Self::Credit => "Credit",
            Self::Loan => "Loan",
            Self::Mortgage => "Mortgage",
            Self::Other => "Other",
        }
    }
}

/// One account from the net worth page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetWorthAccount {
    pub account: String,
    pub account_type: Option<String>,
    /// Negative for liabilities
    pub balance: f64,
    pub category: Category,
    pub provider: String,
    pub as_of: Option<String>,
}

/// Where the net worth total came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalSource {
    /// Printed next to the page's "Net worth" label
    Reported,
    /// Sum of the parsed account balances
    Calculated,
}

impl TotalSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Reported => "Reported",
            Self::Calculated => "Calculated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetWorth {
    pub accounts: Vec<NetWorthAccount>,
    pub total: f64,
    pub total_source: TotalSource,
}

impl NetWorth {
    /// Sum of the parsed balances
    pub fn account_total(&self) -> f64 {
        self.accounts.iter().map(|a| a.balance).sum()
    }

    /// Accounts grouped by category, categories in first appearance order
    pub fn by_category(&self) -> Vec<(Category, Vec<&NetWorthAccount>)> {
        let mut groups: Vec<(Category, Vec<&NetWorthAccount>)> = Vec::new();
        for account in &self.accounts {
            match groups.iter_mut().find(|(c, _)| *c == account.category) {
                Some((_, accounts)) => accounts.push(account),
                None => groups.push((account.category, vec![account])),
            }
        }
        groups
    }
}

/// Parse the account list of a net worth page.
pub fn extract_net_worth(text: &PlainText) -> Result<NetWorth, NetWorthError> {
    let lines = text.lines();

    let has_indicator = lines.iter().any(|line| {
        line.to_ascii_lowercase().contains("net worth") || line.contains("ALL ACCOUNTS")
    });
    if !has_indicator {
        return Err(NetWorthError::NoIndicators);
    }

    let start = lines
        .windows(3)
        .position(|w| w[0] == "Account" && w[1] == "Type" && w[2] == "Balance")
        .map(|pos| pos + 3)
        .ok_or(NetWorthError::NoAccountTable)?;

    let mut accounts = Vec::new();
    let mut group = None;
    let mut i = start;

    while i < lines.len() {
        if let Some(header) = AccountGroup::from_header(&lines[i]) {
            group = Some(header);
            // The group total follows its header
            let total_at = lines[i + 1..]
                .iter()
                .take(GROUP_TOTAL_LOOKAHEAD)
                .position(|line| is_balance(line));
            i += total_at.map(|pos| pos + 2).unwrap_or(1);
            continue;
        }

        let matched = if group == Some(AccountGroup::OtherAsset) {
            match_property(&lines[i..]).or_else(|| match_account(&lines[i..], group))
        } else {
            match_account(&lines[i..], group)
        };

        match matched {
            Some((account, consumed)) => {
                log::debug!(
                    "Account at line {}: {} ({})",
                    i + 1,
                    account.account,
                    account.provider
                );
                accounts.push(account);
                i += consumed;
            }
            None => i += 1,
        }
    }

    let accounts = dedupe(accounts);
    if accounts.is_empty() {
        return Err(NetWorthError::NoAccounts);
    }

    let (total, total_source) = match find_reported_net_worth(text) {
        Some(total) => (total, TotalSource::Reported),
        None => (
            accounts.iter().map(|a| a.balance).sum(),
            TotalSource::Calculated,
        ),
    };

    log::info!(
        "Parsed {} accounts, net worth ${:.2} ({})",
        accounts.len(),
        total,
        total_source.label()
    );

    Ok(NetWorth {
        accounts,
        total,
        total_source,
    })
}

/// Amount printed with the page's "Net worth" label, if any.
pub fn find_reported_net_worth(text: &PlainText) -> Option<f64> {
    let lines = text.lines();

    for (i, line) in lines.iter().enumerate() {
        let Some(caps) = RE_NET_WORTH_LABEL.captures(line.trim()) else {
            continue;
        };
        let rest = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        if !rest.split_whitespace().all(is_balance) {
            continue;
        }

        let amount = std::iter::once(rest)
            .chain(lines[i + 1..].iter().take(TOTAL_LOOKAHEAD).map(String::as_str))
            .find_map(|candidate| {
                candidate
                    .split_whitespace()
                    .filter(|token| is_balance(token))
                    .last()
                    .and_then(parse_amount)
            });
        if amount.is_some() {
            return amount;
        }
    }

    None
}

/// Provider, optional name, optional type, balance, optional date.
fn match_account(lines: &[String], group: Option<AccountGroup>) -> Option<(NetWorthAccount, usize)> {
    let provider = lines.first()?.trim();
    if !is_text(provider) {
        return None;
    }

    let mut idx = 1;
    let name = match lines.get(idx).map(|l| l.trim()) {
        Some(line) if is_text(line) => {
            idx += 1;
            Some(line.to_string())
        }
        _ => None,
    };

    let account_type = match lines.get(idx).map(|l| l.trim()) {
        Some(line) if is_account_type(line) => {
            idx += 1;
            Some(line.to_string())
        }
        _ => None,
    };

    let balance = lines
        .get(idx)
        .map(|l| l.trim())
        .filter(|line| is_balance(line))
        .and_then(parse_amount)?;
    idx += 1;

    let as_of = match lines.get(idx).map(|l| l.trim()) {
        Some(line) if is_as_of(line) => {
            idx += 1;
            Some(line.to_string())
        }
        _ => None,
    };

    let account = match (name, &account_type) {
        (Some(name), _) => name,
        (None, Some(account_type)) => format!("{} {}", provider, account_type),
        (None, None) => provider.to_string(),
    };

    Some((
        NetWorthAccount {
            account,
            category: Category::classify(account_type.as_deref(), group),
            account_type,
            balance,
            provider: provider.to_string(),
            as_of,
        },
        idx,
    ))
}

/// Manually entered property: `Home ...` or a Zestimate, its value, then an
/// optional street address and date.
fn match_property(lines: &[String]) -> Option<(NetWorthAccount, usize)> {
    let label = lines.first()?.trim();
    if !(label.starts_with("Home") || label.contains("Zestimate")) {
        return None;
    }

    let balance = lines
        .get(1)
        .map(|l| l.trim())
        .filter(|line| is_balance(line))
        .and_then(parse_amount)?;
    let mut idx = 2;

    let mut account = label.to_string();
    if let Some(address) = lines.get(idx).map(|l| l.trim()).filter(|l| RE_ADDRESS.is_match(l)) {
        account = format!("{} - {}", account, address);
        idx += 1;
    }

    let as_of = match lines.get(idx).map(|l| l.trim()) {
        Some(line) if is_as_of(line) => {
            idx += 1;
            Some(line.to_string())
        }
        _ => None,
    };

    Some((
        NetWorthAccount {
            account,
            account_type: Some("Property".to_string()),
            balance,
            category: Category::Other,
            provider: MANUAL_PROVIDER.to_string(),
            as_of,
        },
        idx,
    ))
}

/// Drop repeated accounts: same balance and one name containing the other.
/// The longer, more descriptive name is kept.
fn dedupe(accounts: Vec<NetWorthAccount>) -> Vec<NetWorthAccount> {
    let mut kept: Vec<NetWorthAccount> = Vec::new();

    for account in accounts {
        let name = account.account.to_lowercase();
        let cents = (account.balance * 100.0).round() as i64;

        let duplicate = kept.iter().position(|other| {
            let other_name = other.account.to_lowercase();
            (other.balance * 100.0).round() as i64 == cents
                && (other_name.contains(&name) || name.contains(&other_name))
        });

        match duplicate {
            Some(pos) => {
                if account.account.len() > kept[pos].account.len() {
                    kept[pos] = account;
                }
            }
            None => kept.push(account),
        }
    }

    kept
}

fn is_balance(line: &str) -> bool {
    RE_BALANCE.is_match(line.trim())
}

fn is_as_of(line: &str) -> bool {
    RE_AS_OF.is_match(line.trim())
}

fn is_account_type(line: &str) -> bool {
    ACCOUNT_TYPES.iter().any(|t| line.eq_ignore_ascii_case(t))
}

/// A provider or account name
fn is_text(line: &str) -> bool {
    RE_LETTER.is_match(line)
        && !line.contains('$')
        && !is_balance(line)
        && !is_as_of(line)
        && !is_account_type(line)
        && AccountGroup::from_header(line).is_none()
        && !RE_NET_WORTH_LABEL.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "Net worth\n\
        $1,069,190.12\n\
        ALL ACCOUNTS\n\
        Account\nType\nBalance\n\
        Cash\n$12,500.00\n\
        Apple Federal Credit Union\nEveryday Checking - Ending in 1234\nChecking\n$12,500.00\n3/4/2025 10:15AM\n\
        Investment\n$82,340.12\n\
        Charles Schwab\nBrokerage - Ending in 5678\nInvestment\n$52,340.12\n2 hours ago\n\
        Fidelity\nRollover IRA\nIRA Traditional\n$30,000.00\n\
        Credit\n-$1,650.00\n\
        American Express\nPlatinum Card - Ending in 1001\nPersonal\n-$1,650.00\n\
        Other Asset\n$976,000.00\n\
        Home\n$976,000.00\n12 Oak Ct\n3/1/2025\n\
        Privacy\nTerms of Service";

    #[test]
    fn test_extract_accounts() {
        let net_worth = extract_net_worth(&PlainText::from(PAGE)).unwrap();
        let accounts = &net_worth.accounts;
        assert_eq!(accounts.len(), 5);

        assert_eq!(accounts[0].account, "Everyday Checking - Ending in 1234");
        assert_eq!(accounts[0].provider, "Apple Federal Credit Union");
        assert_eq!(accounts[0].account_type.as_deref(), Some("Checking"));
        assert_eq!(accounts[0].balance, 12500.0);
        assert_eq!(accounts[0].category, Category::Cash);
        assert_eq!(accounts[0].as_of.as_deref(), Some("3/4/2025 10:15AM"));

        assert_eq!(accounts[1].category, Category::InvestmentBrokerage);
        assert_eq!(accounts[1].as_of.as_deref(), Some("2 hours ago"));
        assert_eq!(accounts[2].category, Category::InvestmentRetirement);
        assert_eq!(accounts[2].as_of, None);

        assert_eq!(accounts[3].balance, -1650.0);
        assert_eq!(accounts[3].category, Category::Credit);

        assert_eq!(accounts[4].account, "Home - 12 Oak Ct");
        assert_eq!(accounts[4].provider, "Empower Manual");
        assert_eq!(accounts[4].category, Category::Other);
        assert_eq!(accounts[4].as_of.as_deref(), Some("3/1/2025"));
    }

    #[test]
    fn test_reported_total() {
        let net_worth = extract_net_worth(&PlainText::from(PAGE)).unwrap();
        assert_eq!(net_worth.total, 1069190.12);
        assert_eq!(net_worth.total_source, TotalSource::Reported);
        assert!((net_worth.account_total() - 1069190.12).abs() < 1e-6);
    }

    #[test]
    fn test_calculated_total_without_label() {
        let text = PlainText::from(
            "ALL ACCOUNTS\nAccount\nType\nBalance\n\
             Loan\n-$5,000.00\n\
             Chase\nAuto Loan - Ending in 42\nLine of Credit\n-$5,000.00\n\
             Wells Fargo\nSavings\n$7,500.50",
        );
        let net_worth = extract_net_worth(&text).unwrap();
        assert_eq!(net_worth.accounts.len(), 2);
        assert_eq!(net_worth.accounts[0].category, Category::Loan);
        assert_eq!(net_worth.accounts[1].account, "Wells Fargo Savings");
        assert_eq!(net_worth.accounts[1].category, Category::Cash);
        assert_eq!(net_worth.total, 2500.5);
        assert_eq!(net_worth.total_source, TotalSource::Calculated);
    }

    #[test]
    fn test_group_fallback_for_unknown_type() {
        let text = PlainText::from(
            "Net Worth\nAccount\nType\nBalance\nMortgage\n-$300,000.00\nRocket\nHome Loan\n-$300,000.00",
        );
        let net_worth = extract_net_worth(&text).unwrap();
        assert_eq!(net_worth.accounts[0].account, "Home Loan");
        assert_eq!(net_worth.accounts[0].category, Category::Mortgage);
    }

    #[test]
    fn test_duplicates_keep_descriptive_name() {
        let text = PlainText::from(
            "Net worth\nAccount\nType\nBalance\n\
             Coinbase\nCrypto\nCryptocurrency\n$900.00\n\
             Coinbase\nCoinbase Crypto Wallet\nCryptocurrency\n$900.00\n\
             Coinbase\nCoinbase Crypto Wallet\nCryptocurrency\n$900.00",
        );
        let net_worth = extract_net_worth(&text).unwrap();
        assert_eq!(net_worth.accounts.len(), 1);
        assert_eq!(net_worth.accounts[0].account, "Coinbase Crypto Wallet");
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            extract_net_worth(&PlainText::from("Holdings\nEquity")),
            Err(NetWorthError::NoIndicators)
        );
        assert_eq!(
            extract_net_worth(&PlainText::from("Net worth\n$10.00")),
            Err(NetWorthError::NoAccountTable)
        );
        assert_eq!(
            extract_net_worth(&PlainText::from("Net worth\nAccount\nType\nBalance\nNo linked accounts")),
            Err(NetWorthError::NoAccounts)
        );
    }

    #[test]
    fn test_by_category_order() {
        let net_worth = extract_net_worth(&PlainText::from(PAGE)).unwrap();
        let categories: Vec<Category> = net_worth.by_category().iter().map(|(c, _)| *c).collect();
        assert_eq!(
            categories,
            vec![
                Category::Cash,
                Category::InvestmentBrokerage,
                Category::InvestmentRetirement,
                Category::Credit,
                Category::Other,
            ]
        );
    }

    #[test]
    fn test_classify() {
        assert_eq!(Category::classify(Some("Line Of Credit"), None), Category::Loan);
        assert_eq!(Category::classify(Some("401k Roth"), None), Category::InvestmentRetirement);
        assert_eq!(
            Category::classify(Some("Checking"), Some(AccountGroup::OtherAsset)),
            Category::Other
        );
        assert_eq!(Category::classify(None, None), Category::Other);
    }
}

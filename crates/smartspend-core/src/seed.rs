//! Default datasets for first run and schema resets

use crate::models::{Account, AccountKind, Currency, Institution, InstitutionKind};

/// Currency shown by default on the dashboard.
pub const DEFAULT_CURRENCY_ID: &str = "cur-inr";

fn currency(code: &str, name: &str, symbol: &str) -> Currency {
    Currency {
        id: format!("cur-{}", code.to_ascii_lowercase()),
        code: code.to_string(),
        name: name.to_string(),
        symbol: symbol.to_string(),
    }
}

pub fn currencies() -> Vec<Currency> {
    vec![
        currency("INR", "Indian Rupee", "₹"),
        currency("USD", "US Dollar", "$"),
        currency("EUR", "Euro", "€"),
        currency("GBP", "British Pound", "£"),
        currency("AUD", "Australian Dollar", "A$"),
        currency("CAD", "Canadian Dollar", "C$"),
    ]
}

fn institution(id: &str, name: &str, kind: InstitutionKind) -> Institution {
    Institution {
        id: id.to_string(),
        name: name.to_string(),
        kind,
    }
}

pub fn institutions() -> Vec<Institution> {
    vec![
        institution("inst-hdfc", "HDFC Bank", InstitutionKind::Bank),
        institution("inst-icici", "ICICI Bank", InstitutionKind::Bank),
        institution("inst-zerodha", "Zerodha", InstitutionKind::Brokerage),
        institution("inst-paytm", "Paytm Wallet", InstitutionKind::Wallet),
    ]
}

fn account(
    id: &str,
    name: &str,
    kind: AccountKind,
    institution_id: Option<&str>,
    balance_minor: i64,
) -> Account {
    Account {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        institution_id: institution_id.map(str::to_string),
        currency_id: DEFAULT_CURRENCY_ID.to_string(),
        balance_minor,
    }
}

pub fn accounts() -> Vec<Account> {
    vec![
        account(
            "acc-salary",
            "Salary Account",
            AccountKind::Savings,
            Some("inst-hdfc"),
            12_500_000,
        ),
        account(
            "acc-credit",
            "Credit Card",
            AccountKind::CreditCard,
            Some("inst-icici"),
            -1_845_000,
        ),
        account(
            "acc-stocks",
            "Stocks",
            AccountKind::Investment,
            Some("inst-zerodha"),
            30_000_000,
        ),
        account(
            "acc-wallet",
            "UPI Wallet",
            AccountKind::Checking,
            Some("inst-paytm"),
            250_000,
        ),
        account("acc-cash", "Cash", AccountKind::Cash, None, 500_000),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seed_ids_are_unique() {
        let ids: HashSet<_> = accounts().into_iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), accounts().len());

        let ids: HashSet<_> = institutions().into_iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), institutions().len());

        let ids: HashSet<_> = currencies().into_iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), currencies().len());
    }

    #[test]
    fn test_seed_references_resolve() {
        let institutions = institutions();
        let currencies = currencies();

        for account in accounts() {
            if let Some(inst) = &account.institution_id {
                assert!(institutions.iter().any(|i| &i.id == inst), "{inst}");
            }
            assert!(currencies.iter().any(|c| c.id == account.currency_id));
        }
    }

    #[test]
    fn test_dashboard_currencies() {
        let codes: Vec<_> = currencies().into_iter().map(|c| c.code).collect();
        assert_eq!(codes, vec!["INR", "USD", "EUR", "GBP", "AUD", "CAD"]);
        assert!(currencies().iter().any(|c| c.id == DEFAULT_CURRENCY_ID));
    }
}

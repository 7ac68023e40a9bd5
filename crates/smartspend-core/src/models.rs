//! Domain records held by the accounts store

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use smartspend_store::Record;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub id: String,
    /// ISO 4217 code
    pub code: String,
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstitutionKind {
    Bank,
    CreditUnion,
    Brokerage,
    Wallet,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub id: String,
    pub name: String,
    pub kind: InstitutionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Checking,
    Savings,
    CreditCard,
    Cash,
    Investment,
    Loan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub kind: AccountKind,
    /// Owning institution, if any (cash has none)
    #[serde(default)]
    pub institution_id: Option<String>,
    pub currency_id: String,
    /// Balance in minor units of the account currency
    #[serde(default)]
    pub balance_minor: i64,
}

impl Account {
    pub fn new(name: String, kind: AccountKind, currency_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            kind,
            institution_id: None,
            currency_id,
            balance_minor: 0,
        }
    }

    pub fn with_institution(mut self, institution_id: impl Into<String>) -> Self {
        self.institution_id = Some(institution_id.into());
        self
    }
}

impl Record for Account {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Institution {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Currency {
    fn id(&self) -> &str {
        &self.id
    }
}

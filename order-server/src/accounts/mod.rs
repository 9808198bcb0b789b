//! Account service - identity resolution for priority flags, blacklist
//! checks and audit stamps

use dashmap::DashMap;
use shared::models::account::Account;

#[derive(Debug, Default)]
pub struct AccountService {
    accounts: DashMap<String, Account>,
}

impl AccountService {
    pub fn new() -> Self {
        Self { accounts: DashMap::new() }
    }

    pub fn upsert(&self, account: Account) {
        self.accounts.insert(account.id.clone(), account);
    }

    pub fn get(&self, id: &str) -> Option<Account> {
        self.accounts.get(id).map(|a| a.clone())
    }

    pub fn display_name(&self, id: &str) -> Option<String> {
        self.accounts.get(id).map(|a| a.display_name.clone())
    }

    /// Blacklist check by phone (guests have no account id)
    pub fn is_phone_blacklisted(&self, phone: &str) -> bool {
        self.accounts
            .iter()
            .any(|a| a.is_blacklisted && a.phone.as_deref() == Some(phone))
    }

    /// Priority flags for a linked account: (is_vip, is_teacher)
    pub fn priority_flags(&self, account_id: &str) -> (bool, bool) {
        self.accounts
            .get(account_id)
            .map(|a| (a.is_vip, a.is_teacher))
            .unwrap_or((false, false))
    }
}

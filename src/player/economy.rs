use std::collections::HashMap;

/// Authoritative currency and money balance of the garrison owner.
/// Money amounts are in copper.
pub trait PlayerEconomy {
    fn has_currency(&self, currency_type: u32, quantity: u32) -> bool;

    fn remove_currency(&mut self, currency_type: u32, quantity: u32);

    fn add_currency(&mut self, currency_type: u32, quantity: u32);

    fn has_enough_money(&self, amount: u64) -> bool;

    fn modify_money(&mut self, delta: i64);
}

/// Plain in-memory balance, used by offline tooling and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wallet {
    pub money: u64,
    pub currencies: HashMap<u32, u32>,
}

impl Wallet {
    pub fn new(money: u64) -> Self {
        Self {
            money,
            currencies: HashMap::new(),
        }
    }

    pub fn with_currency(mut self, currency_type: u32, quantity: u32) -> Self {
        self.currencies.insert(currency_type, quantity);
        self
    }

    pub fn currency(&self, currency_type: u32) -> u32 {
        self.currencies.get(&currency_type).copied().unwrap_or(0)
    }
}

impl PlayerEconomy for Wallet {
    fn has_currency(&self, currency_type: u32, quantity: u32) -> bool {
        quantity == 0 || self.currency(currency_type) >= quantity
    }

    fn remove_currency(&mut self, currency_type: u32, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let balance = self.currencies.entry(currency_type).or_insert(0);
        *balance = balance.saturating_sub(quantity);
    }

    fn add_currency(&mut self, currency_type: u32, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let balance = self.currencies.entry(currency_type).or_insert(0);
        *balance = balance.saturating_add(quantity);
    }

    fn has_enough_money(&self, amount: u64) -> bool {
        self.money >= amount
    }

    fn modify_money(&mut self, delta: i64) {
        if delta >= 0 {
            self.money = self.money.saturating_add(delta as u64);
        } else {
            self.money = self.money.saturating_sub(delta.unsigned_abs());
        }
    }
}

// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Currencies known to the server: one native currency plus a fixed allow-list
//! of custom tokens, loaded once at start-up.

use crate::types::{Amount, Currency};
use std::collections::HashMap;

pub const NATIVE_CURRENCY_SYMBOL: &str = "EGLD";
pub const NATIVE_CURRENCY_DECIMALS: u32 = 18;
/// Identifier of the native currency when moved through token transfer functions
pub const NATIVE_AS_CUSTOM_IDENTIFIER: &str = "EGLD-000000";

#[derive(Clone, Debug)]
pub struct CurrencyRegistry {
    native: Currency,
    custom: Vec<Currency>,
    custom_by_symbol: HashMap<String, Currency>,
}

impl CurrencyRegistry {
    pub fn new(native: Currency, custom: Vec<Currency>) -> Self {
        let custom_by_symbol = custom
            .iter()
            .map(|currency| (currency.symbol.clone(), currency.clone()))
            .collect();
        CurrencyRegistry {
            native,
            custom,
            custom_by_symbol,
        }
    }

    pub fn native(&self) -> &Currency {
        &self.native
    }

    pub fn is_native(&self, symbol: &str) -> bool {
        self.native.symbol == symbol
    }

    pub fn custom_currencies(&self) -> &[Currency] {
        &self.custom
    }

    pub fn custom(&self, symbol: &str) -> Option<&Currency> {
        self.custom_by_symbol.get(symbol)
    }

    pub fn has_custom(&self, symbol: &str) -> bool {
        self.custom_by_symbol.contains_key(symbol)
    }

    /// Native or custom currency by symbol
    pub fn get(&self, symbol: &str) -> Option<&Currency> {
        if self.is_native(symbol) {
            Some(&self.native)
        } else {
            self.custom(symbol)
        }
    }

    pub fn native_amount(&self, value: impl Into<String>) -> Amount {
        Amount::new(value, &self.native)
    }
}

impl Default for CurrencyRegistry {
    fn default() -> Self {
        CurrencyRegistry::new(
            Currency::new(NATIVE_CURRENCY_SYMBOL, NATIVE_CURRENCY_DECIMALS),
            vec![],
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let registry = CurrencyRegistry::new(
            Currency::new("EGLD", 18),
            vec![Currency::new("ROSETTA-3a2edf", 2), Currency::new("TEST-abcdef", 0)],
        );

        assert!(registry.is_native("EGLD"));
        assert!(!registry.has_custom("EGLD"));
        assert_eq!(18, registry.get("EGLD").unwrap().decimals);
        assert_eq!(2, registry.get("ROSETTA-3a2edf").unwrap().decimals);
        assert!(registry.get("UNKNOWN-000000").is_none());
        assert_eq!(2, registry.custom_currencies().len());
        assert_eq!("EGLD", registry.native_amount("10").currency.symbol);
    }
}

//! Product catalog model

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Preparation station a menu item is routed to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KitchenZone {
    #[default]
    HotKitchen,
    ColdKitchen,
    Beverage,
    Dessert,
}

impl std::fmt::Display for KitchenZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KitchenZone::HotKitchen => write!(f, "HOT_KITCHEN"),
            KitchenZone::ColdKitchen => write!(f, "COLD_KITCHEN"),
            KitchenZone::Beverage => write!(f, "BEVERAGE"),
            KitchenZone::Dessert => write!(f, "DESSERT"),
        }
    }
}

/// Happy-hour override: active only within the configured daily clock range
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HappyHour {
    pub price: i64,
    /// "HH:MM", inclusive
    pub start: String,
    /// "HH:MM", exclusive
    pub end: String,
    #[serde(default)]
    pub is_active: bool,
}

/// Size option on a product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SizeOption {
    pub name: String,
    #[serde(default)]
    pub price_modifier: i64,
    #[serde(default)]
    pub is_default: bool,
}

/// Topping option (multiple choice)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToppingOption {
    pub name: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

/// One entry of a required single-choice group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionItem {
    pub name: String,
    #[serde(default)]
    pub price_modifier: i64,
}

/// Required single-choice group (e.g. "Chọn loại sốt")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequiredOptionGroup {
    pub group_name: String,
    pub options: Vec<OptionItem>,
}

/// Stock tracking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Inventory {
    pub current_stock: u32,
    #[serde(default = "default_low_stock")]
    pub low_stock_threshold: u32,
    #[serde(default)]
    pub sold_count: u64,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub is_limited_stock: bool,
}

fn default_low_stock() -> u32 {
    10
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            current_stock: 100,
            low_stock_threshold: 10,
            sold_count: 0,
            is_available: true,
            is_limited_stock: false,
        }
    }
}

/// Catalog product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub happy_hour: Option<HappyHour>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<SizeOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sugar_levels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ice_levels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub toppings: Vec<ToppingOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_options: Vec<RequiredOptionGroup>,
    #[serde(default)]
    pub kitchen_zone: KitchenZone,
    /// Minutes per unit, input to the ready-time estimator
    #[serde(default = "default_prep_time")]
    pub prep_time_minutes: u32,
    #[serde(default)]
    pub inventory: Inventory,
}

fn default_prep_time() -> u32 {
    5
}

impl Product {
    /// Effective unit base price at the given store-local wall clock.
    ///
    /// Happy-hour pricing applies in the half-open window `[start, end)`.
    /// Malformed window strings disable the override.
    pub fn current_price(&self, local_time: NaiveTime) -> i64 {
        if let Some(hh) = &self.happy_hour
            && hh.is_active
            && let (Some(start), Some(end)) = (parse_hhmm(&hh.start), parse_hhmm(&hh.end))
            && start <= local_time
            && local_time < end
        {
            return hh.price;
        }
        self.price
    }

    pub fn size(&self, name: &str) -> Option<&SizeOption> {
        self.sizes.iter().find(|s| s.name == name)
    }

    pub fn topping(&self, name: &str) -> Option<&ToppingOption> {
        self.toppings.iter().find(|t| t.name == name)
    }

    /// Resolve a required-option choice "group:option" or bare option name
    /// against the first group that contains it.
    pub fn required_option(&self, option_name: &str) -> Option<(&RequiredOptionGroup, &OptionItem)> {
        self.required_options.iter().find_map(|group| {
            group
                .options
                .iter()
                .find(|o| o.name == option_name)
                .map(|o| (group, o))
        })
    }
}

fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_with_happy_hour(active: bool) -> Product {
        Product {
            id: "p1".into(),
            name: "Trà sữa".into(),
            price: 25_000,
            happy_hour: Some(HappyHour {
                price: 20_000,
                start: "10:00".into(),
                end: "12:00".into(),
                is_active: active,
            }),
            sizes: vec![],
            sugar_levels: vec![],
            ice_levels: vec![],
            toppings: vec![],
            required_options: vec![],
            kitchen_zone: KitchenZone::Beverage,
            prep_time_minutes: 5,
            inventory: Inventory::default(),
        }
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_happy_hour_window_half_open() {
        let p = product_with_happy_hour(true);
        assert_eq!(p.current_price(t(9, 59)), 25_000);
        assert_eq!(p.current_price(t(10, 0)), 20_000);
        assert_eq!(p.current_price(t(11, 59)), 20_000);
        // end is exclusive
        assert_eq!(p.current_price(t(12, 0)), 25_000);
    }

    #[test]
    fn test_happy_hour_inactive_flag() {
        let p = product_with_happy_hour(false);
        assert_eq!(p.current_price(t(11, 0)), 25_000);
    }

    #[test]
    fn test_malformed_window_falls_back_to_base_price() {
        let mut p = product_with_happy_hour(true);
        p.happy_hour.as_mut().unwrap().start = "25:99".into();
        assert_eq!(p.current_price(t(11, 0)), 25_000);
    }
}

use anyhow::Context;
use orders_types::domain::customer::Segment;
use orders_types::domain::discount::{
    DiscountEngine, DiscountRule, SegmentDiscount, StackingPolicy, VolumeDiscount,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub discounts: DiscountConfig,
}

/// Discount rules loaded once at startup. Percentages are 0..=100.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DiscountConfig {
    pub gold_percent: Decimal,
    pub premium_percent: Decimal,
    pub volume_min_orders: u32,
    pub volume_percent: Decimal,
    pub stacking: StackingPolicy,
}

impl Default for DiscountConfig {
    fn default() -> Self {
        Self {
            gold_percent: Decimal::from(15),
            premium_percent: Decimal::from(10),
            volume_min_orders: 5,
            volume_percent: Decimal::from(5),
            stacking: StackingPolicy::FirstMatch,
        }
    }
}

impl DiscountConfig {
    /// Gold, then Premium, then volume.
    pub fn build_engine(&self) -> DiscountEngine {
        let rules: Vec<Arc<dyn DiscountRule>> = vec![
            Arc::new(SegmentDiscount::new(Segment::Gold, self.gold_percent)),
            Arc::new(SegmentDiscount::new(Segment::Premium, self.premium_percent)),
            Arc::new(VolumeDiscount::new(
                self.volume_min_orders,
                self.volume_percent,
            )),
        ];
        DiscountEngine::new(rules, self.stacking)
    }
}

fn percent(key: &str, raw: Option<String>, default: Decimal) -> anyhow::Result<Decimal> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value = Decimal::from_str(raw.trim()).with_context(|| format!("{key} is not a number"))?;
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        anyhow::bail!("{key} must be between 0 and 100, got {value}");
    }
    Ok(value)
}

fn stacking(raw: Option<String>) -> anyhow::Result<StackingPolicy> {
    match raw.as_deref().map(str::trim) {
        None | Some("first") => Ok(StackingPolicy::FirstMatch),
        Some("cumulative") => Ok(StackingPolicy::Cumulative),
        Some(other) => anyhow::bail!("DISCOUNT_STACKING must be `first` or `cumulative`, got {other}"),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let server_port = lookup("SERVER_PORT").unwrap_or_else(|| "3000".into());
        let database_url = lookup("DATABASE_URL");

        let defaults = DiscountConfig::default();
        let volume_min_orders = match lookup("DISCOUNT_VOLUME_MIN_ORDERS") {
            Some(raw) => raw
                .trim()
                .parse()
                .context("DISCOUNT_VOLUME_MIN_ORDERS is not a count")?,
            None => defaults.volume_min_orders,
        };
        let discounts = DiscountConfig {
            gold_percent: percent(
                "DISCOUNT_GOLD_PERCENT",
                lookup("DISCOUNT_GOLD_PERCENT"),
                defaults.gold_percent,
            )?,
            premium_percent: percent(
                "DISCOUNT_PREMIUM_PERCENT",
                lookup("DISCOUNT_PREMIUM_PERCENT"),
                defaults.premium_percent,
            )?,
            volume_min_orders,
            volume_percent: percent(
                "DISCOUNT_VOLUME_PERCENT",
                lookup("DISCOUNT_VOLUME_PERCENT"),
                defaults.volume_percent,
            )?,
            stacking: stacking(lookup("DISCOUNT_STACKING"))?,
        };

        Ok(Self {
            server_port,
            database_url,
            discounts,
        })
    }
}

//! Static price book for data bundles.
//!
//! Two tiers per deployment: Retail for clients and Wholesale for
//! agents/admins. The tables are fixed at compile time; agent shops
//! layer per-plan overrides on top of the wholesale list at purchase
//! time. All prices are decimal GHS; wallet arithmetic happens in
//! integer pesewas via the conversion helpers at the bottom.

use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Mobile networks the delivery provider can fulfil
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Network {
    Mtn,
    AirtelTigo,
    Telecel,
}

impl Network {
    /// Parse the client-facing network name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "MTN" => Some(Network::Mtn),
            "AirtelTigo" => Some(Network::AirtelTigo),
            "Telecel" => Some(Network::Telecel),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mtn => "MTN",
            Network::AirtelTigo => "AirtelTigo",
            Network::Telecel => "Telecel",
        }
    }

    /// Network code on the delivery provider's wire format
    pub fn provider_code(&self) -> &'static str {
        match self {
            Network::Mtn => "MTN",
            Network::AirtelTigo => "AT",
            Network::Telecel => "TELECEL",
        }
    }

    pub const ALL: [Network; 3] = [Network::Mtn, Network::AirtelTigo, Network::Telecel];
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Price tier a caller buys at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceTier {
    Retail,
    Wholesale,
}

/// One entry in a price list. Prices are decimal strings so the tables
/// stay const; `PlanPrice` carries the parsed value.
#[derive(Debug, Clone, Copy)]
pub struct PlanEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub price: &'static str,
}

const fn plan(id: &'static str, price: &'static str) -> PlanEntry {
    PlanEntry {
        id,
        name: id,
        price,
    }
}

const RETAIL_MTN: &[PlanEntry] = &[
    plan("1GB", "6.00"),
    plan("2GB", "11.00"),
    plan("3GB", "18.00"),
    plan("4GB", "23.00"),
    plan("5GB", "30.00"),
    plan("6GB", "36.00"),
    plan("7GB", "39.00"),
    plan("8GB", "43.00"),
    plan("10GB", "49.00"),
    plan("15GB", "75.00"),
    plan("20GB", "100.00"),
    plan("25GB", "128.00"),
    plan("30GB", "150.00"),
    plan("40GB", "195.00"),
    plan("50GB", "248.00"),
];

const RETAIL_AIRTELTIGO: &[PlanEntry] = &[
    plan("1GB", "6.00"),
    plan("2GB", "10.00"),
    plan("3GB", "14.00"),
    plan("4GB", "22.00"),
    plan("5GB", "26.00"),
    plan("6GB", "30.00"),
    plan("7GB", "34.00"),
    plan("8GB", "38.00"),
    plan("9GB", "40.00"),
    plan("10GB", "49.00"),
    plan("12GB", "53.00"),
    plan("15GB", "61.00"),
    plan("20GB", "85.00"),
];

const RETAIL_TELECEL: &[PlanEntry] = &[
    plan("5GB", "29.00"),
    plan("10GB", "49.20"),
    plan("15GB", "80.00"),
    plan("20GB", "100.00"),
    plan("25GB", "120.00"),
    plan("30GB", "123.00"),
    plan("40GB", "175.50"),
    plan("50GB", "205.00"),
    plan("100GB", "400.00"),
];

const WHOLESALE_MTN: &[PlanEntry] = &[
    plan("1GB", "4.90"),
    plan("2GB", "9.90"),
    plan("3GB", "14.70"),
    plan("4GB", "20.00"),
    plan("5GB", "24.60"),
    plan("6GB", "28.00"),
    plan("8GB", "36.00"),
    plan("10GB", "43.80"),
    plan("15GB", "64.00"),
    plan("20GB", "85.00"),
    plan("25GB", "105.00"),
    plan("30GB", "124.50"),
    plan("40GB", "165.00"),
    plan("50GB", "198.00"),
];

const WHOLESALE_AIRTELTIGO: &[PlanEntry] = &[
    plan("1GB", "4.00"),
    plan("2GB", "8.00"),
    plan("3GB", "12.00"),
    plan("4GB", "16.00"),
    plan("5GB", "20.00"),
    plan("6GB", "24.00"),
    plan("7GB", "27.90"),
    plan("8GB", "32.00"),
    plan("9GB", "36.00"),
    plan("10GB", "42.00"),
    plan("12GB", "50.00"),
    plan("15GB", "61.30"),
    plan("20GB", "82.10"),
];

const WHOLESALE_TELECEL: &[PlanEntry] = &[
    plan("5GB", "23.00"),
    plan("10GB", "43.00"),
    plan("15GB", "62.20"),
    plan("20GB", "83.00"),
    plan("25GB", "103.00"),
    plan("30GB", "123.00"),
    plan("40GB", "155.00"),
    plan("50GB", "195.00"),
    plan("100GB", "400.00"),
];

/// Price list for one tier and network
pub fn plans(tier: PriceTier, network: Network) -> &'static [PlanEntry] {
    match (tier, network) {
        (PriceTier::Retail, Network::Mtn) => RETAIL_MTN,
        (PriceTier::Retail, Network::AirtelTigo) => RETAIL_AIRTELTIGO,
        (PriceTier::Retail, Network::Telecel) => RETAIL_TELECEL,
        (PriceTier::Wholesale, Network::Mtn) => WHOLESALE_MTN,
        (PriceTier::Wholesale, Network::AirtelTigo) => WHOLESALE_AIRTELTIGO,
        (PriceTier::Wholesale, Network::Telecel) => WHOLESALE_TELECEL,
    }
}

/// A plan with its parsed price
#[derive(Debug, Clone)]
pub struct PlanPrice {
    pub id: &'static str,
    pub name: &'static str,
    pub price: BigDecimal,
}

/// Look up a plan on a tier's price list
pub fn find_plan(tier: PriceTier, network: Network, plan_id: &str) -> Option<PlanPrice> {
    plans(tier, network)
        .iter()
        .find(|p| p.id == plan_id)
        .map(|p| PlanPrice {
            id: p.id,
            name: p.name,
            // The table literals are known-good decimals
            price: BigDecimal::from_str(p.price).expect("price table literal"),
        })
}

/// Full price book for a tier, in the JSON shape the storefront renders:
/// `{ "MTN": [{id, name, price}], ... }`
pub fn price_book(tier: PriceTier) -> serde_json::Value {
    let mut book = serde_json::Map::new();
    for network in Network::ALL {
        let entries: Vec<serde_json::Value> = plans(tier, network)
            .iter()
            .map(|p| {
                serde_json::json!({
                    "id": p.id,
                    "name": p.name,
                    "price": p.price,
                })
            })
            .collect();
        book.insert(network.as_str().to_string(), serde_json::Value::Array(entries));
    }
    serde_json::Value::Object(book)
}

/// Capacity in GB encoded in a plan id ("5GB" -> 5)
pub fn plan_capacity(plan_id: &str) -> Option<u32> {
    let digits: String = plan_id.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// GHS to pesewas, rounded half-up. Used for every charge.
pub fn ghs_to_minor(amount: &BigDecimal) -> i64 {
    (amount * BigDecimal::from(100))
        .with_scale_round(0, RoundingMode::HalfUp)
        .to_i64()
        .unwrap_or(0)
}

/// GHS to pesewas, rounded down. Used for commission credits so the
/// platform never over-credits fractional pesewas.
pub fn ghs_to_minor_floor(amount: &BigDecimal) -> i64 {
    (amount * BigDecimal::from(100))
        .with_scale_round(0, RoundingMode::Floor)
        .to_i64()
        .unwrap_or(0)
}

/// Pesewas back to decimal GHS with two decimal places
pub fn minor_to_ghs(minor: i64) -> BigDecimal {
    BigDecimal::new(BigInt::from(minor), 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_lookup_retail_vs_wholesale() {
        let retail = find_plan(PriceTier::Retail, Network::Mtn, "5GB").unwrap();
        let wholesale = find_plan(PriceTier::Wholesale, Network::Mtn, "5GB").unwrap();

        assert_eq!(retail.price, BigDecimal::from_str("30.00").unwrap());
        assert_eq!(wholesale.price, BigDecimal::from_str("24.60").unwrap());
    }

    #[test]
    fn test_unknown_plan_returns_none() {
        assert!(find_plan(PriceTier::Retail, Network::Telecel, "1GB").is_none());
        assert!(find_plan(PriceTier::Wholesale, Network::Mtn, "999GB").is_none());
    }

    #[test]
    fn test_network_parsing_and_provider_codes() {
        assert_eq!(Network::parse("MTN"), Some(Network::Mtn));
        assert_eq!(Network::parse("AirtelTigo"), Some(Network::AirtelTigo));
        assert_eq!(Network::parse("Telecel"), Some(Network::Telecel));
        assert_eq!(Network::parse("Vodafone"), None);

        assert_eq!(Network::AirtelTigo.provider_code(), "AT");
        assert_eq!(Network::Telecel.provider_code(), "TELECEL");
    }

    #[test]
    fn test_plan_capacity_parsing() {
        assert_eq!(plan_capacity("5GB"), Some(5));
        assert_eq!(plan_capacity("100GB"), Some(100));
        assert_eq!(plan_capacity("GB"), None);
    }

    #[test]
    fn test_minor_unit_conversions() {
        let thirty = BigDecimal::from_str("30.00").unwrap();
        assert_eq!(ghs_to_minor(&thirty), 3000);

        // Half-up on charges
        let odd = BigDecimal::from_str("10.005").unwrap();
        assert_eq!(ghs_to_minor(&odd), 1001);

        // Floor on commissions
        let commission = BigDecimal::from_str("7.409").unwrap();
        assert_eq!(ghs_to_minor_floor(&commission), 740);

        assert_eq!(minor_to_ghs(2000), BigDecimal::from_str("20.00").unwrap());
    }

    #[test]
    fn test_shop_markup_commission_in_minor_units() {
        // 32.00 custom price over 24.60 wholesale -> 7.40 -> 740 pesewas
        let custom = BigDecimal::from_str("32.00").unwrap();
        let wholesale = find_plan(PriceTier::Wholesale, Network::Mtn, "5GB")
            .unwrap()
            .price;
        assert_eq!(ghs_to_minor_floor(&(custom - wholesale)), 740);
    }

    #[test]
    fn test_price_book_shape() {
        let book = price_book(PriceTier::Wholesale);
        let mtn = book.get("MTN").and_then(|v| v.as_array()).unwrap();
        assert_eq!(mtn.len(), WHOLESALE_MTN.len());
        assert_eq!(mtn[0].get("id").and_then(|v| v.as_str()), Some("1GB"));
    }
}

//! seva catalog, the only source of donation amounts

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A fixed price donation cause.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Seva {
    pub slug: String,
    pub name: String,
    /// amount in major currency unit (INR)
    pub amount: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tag: String,
}

impl Seva {
    fn new(slug: &str, name: &str, amount: u64, description: &str, tag: &str) -> Self {
        Self {
            slug: slug.to_owned(),
            name: name.to_owned(),
            amount,
            description: description.to_owned(),
            tag: tag.to_owned(),
        }
    }

    /// gateway amount in the currency subunit
    pub fn minor_amount(&self) -> u64 {
        minor_units(self.amount)
    }
}

/// `floor(amount * 100)`, never less than 1
pub fn minor_units(amount: u64) -> u64 {
    amount.saturating_mul(100).max(1)
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Catalog(Vec<Seva>);

impl Default for Catalog {
    fn default() -> Self {
        Self(vec![
            Seva::new(
                "feed-a-cow",
                "Seva Bhav",
                101,
                "Provide nutritious food and daily care, essential for their well-being and recovery.",
                "Popular",
            ),
            Seva::new(
                "medical-care",
                "Shelter Care",
                501,
                "Fund emergency treatments, necessary surgeries, and ongoing medication for sick cows.",
                "Best Seller",
            ),
            Seva::new(
                "shelter-support",
                "Feeding a Cow",
                1101,
                "Contribute towards the maintenance and infrastructure of safe, clean cow shelters.",
                "Featured",
            ),
            Seva::new(
                "acid-attack-support",
                "Veterinary Support",
                2501,
                "Specialized, long-term veterinary care, physiotherapy, and nourishment for victims.",
                "Urgent",
            ),
        ])
    }
}

impl From<Vec<Seva>> for Catalog {
    fn from(sevas: Vec<Seva>) -> Self {
        Self(sevas)
    }
}

impl Catalog {
    pub fn get(&self, slug: &str) -> Option<&Seva> {
        self.0.iter().find(|s| s.slug == slug)
    }

    pub fn list(&self) -> &[Seva] {
        &self.0
    }

    pub fn validate(&self) -> Result<()> {
        let mut slugs = HashSet::new();
        for seva in &self.0 {
            if seva.slug.trim().is_empty() {
                return Err(Error::Message("catalog: empty seva slug".to_owned()));
            }
            if seva.amount == 0 {
                return Err(Error::Message(format!(
                    "catalog: seva `{}` amount must be positive",
                    seva.slug
                )));
            }
            if !slugs.insert(seva.slug.as_str()) {
                return Err(Error::Message(format!(
                    "catalog: duplicate seva slug `{}`",
                    seva.slug
                )));
            }
        }
        Ok(())
    }
}

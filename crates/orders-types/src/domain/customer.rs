use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Customer tier used to select discount eligibility.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Segment {
    #[default]
    Regular,
    Premium,
    Gold,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Segment::Regular => "Regular",
            Segment::Premium => "Premium",
            Segment::Gold => "Gold",
        };
        f.write_str(s)
    }
}

impl FromStr for Segment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regular" => Ok(Segment::Regular),
            "premium" => Ok(Segment::Premium),
            "gold" => Ok(Segment::Gold),
            other => anyhow::bail!("unknown segment: {other}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Fixed at creation; nothing in the API rewrites it.
    pub segment: Segment,
    /// Orders placed so far.
    pub order_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: String, email: String, segment: Segment) -> anyhow::Result<Self> {
        if name.trim().is_empty() {
            anyhow::bail!("name empty");
        }
        if !email.contains('@') {
            anyhow::bail!("invalid email");
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            email,
            segment,
            order_count: 0,
            created_at: Utc::now(),
        })
    }
}

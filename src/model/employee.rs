use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::PayrollError;
use crate::model::money::Money;

const AVATAR_BASE_URL: &str = "https://ui-avatars.com/api/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Budi Santoso",
        "position": "Frontend Developer",
        "daily_rate": 600000,
        "weekly_allowance": 300000,
        "image_url": "https://picsum.photos/seed/1/200",
        "created_at": "2025-09-01T08:00:00Z"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Budi Santoso")]
    pub name: String,

    #[schema(example = "Frontend Developer")]
    pub position: String,

    /// Pay for one day worked, in whole currency units.
    #[schema(example = 600000, value_type = i64)]
    pub daily_rate: Money,

    /// Default allowance for a full six-day week.
    #[schema(example = 300000, value_type = i64)]
    pub weekly_allowance: Money,

    #[schema(example = "https://picsum.photos/seed/1/200", nullable = true)]
    pub image_url: Option<String>,

    #[schema(example = "2025-09-01T08:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

/// Validated employee attributes, used for both create and full update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub name: String,
    pub position: String,
    pub daily_rate: Money,
    pub weekly_allowance: Money,
    pub image_url: String,
}

impl NewEmployee {
    pub fn new(
        name: &str,
        position: &str,
        daily_rate: Money,
        weekly_allowance: Money,
        image_url: Option<&str>,
    ) -> Result<Self, PayrollError> {
        let name = name.trim();
        let position = position.trim();

        if name.is_empty() {
            return Err(PayrollError::InvalidEmployee("name is required".into()));
        }
        if position.is_empty() {
            return Err(PayrollError::InvalidEmployee("position is required".into()));
        }
        if daily_rate.is_negative() {
            return Err(PayrollError::invalid_amount("daily_rate", "must not be negative"));
        }
        if weekly_allowance.is_negative() {
            return Err(PayrollError::invalid_amount(
                "weekly_allowance",
                "must not be negative",
            ));
        }

        let image_url = match image_url.map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => avatar_url(name),
        };

        Ok(Self {
            name: name.to_string(),
            position: position.to_string(),
            daily_rate,
            weekly_allowance,
            image_url,
        })
    }
}

/// Generated avatar for employees registered without a photo.
fn avatar_url(name: &str) -> String {
    let query = serde_urlencoded::to_string([("name", name), ("background", "random")])
        .unwrap_or_else(|_| "background=random".to_string());
    format!("{AVATAR_BASE_URL}?{query}")
}

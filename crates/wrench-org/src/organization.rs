//! Organization domain model
//!
//! Organizations are the tenant boundary of the platform. Every member,
//! invitation, and query is scoped to exactly one organization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An organization represents a tenant in the multi-tenant system.
///
/// All membership and invitation state hangs off an organization; members
/// reference it by id and never move between organizations.
///
/// # Examples
///
/// ```
/// use wrench_org::Organization;
///
/// let org = Organization::new("Northside Auto")
///     .with_business_name("Northside Auto Repair LLC")
///     .with_phone("555-0134");
/// assert_eq!(org.name, "Northside Auto");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier for the organization
    pub id: Uuid,

    /// Human-readable name
    pub name: String,

    /// Registered business name, if different from the display name
    pub business_name: Option<String>,

    /// Street address
    pub street: Option<String>,

    /// City
    pub city: Option<String>,

    /// State or region
    pub region: Option<String>,

    /// Postal code
    pub postal_code: Option<String>,

    /// Contact phone number
    pub phone: Option<String>,

    /// Website URL
    pub website: Option<String>,

    /// When the organization was created
    pub created_at: DateTime<Utc>,

    /// When the organization was last updated
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Creates a new organization.
    ///
    /// The organization is created with a newly generated UUID v7 id and
    /// current timestamps; all optional attributes start empty.
    ///
    /// # Arguments
    ///
    /// * `name` - The organization display name
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            business_name: None,
            street: None,
            city: None,
            region: None,
            postal_code: None,
            phone: None,
            website: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the registered business name.
    pub fn with_business_name(mut self, business_name: impl Into<String>) -> Self {
        self.business_name = Some(business_name.into());
        self
    }

    /// Set the contact phone number.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Set the website URL.
    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    /// Bump the update timestamp after a mutation.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

//! Venue listing entity model and DTOs.

use htw_core::types::{DbId, Timestamp};
use htw_core::venue_workflow::VenueStatus;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `venues` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Venue {
    pub id: DbId,
    pub name: String,
    pub address: String,
    pub neighborhood: Option<String>,
    pub capacity: Option<i32>,
    pub amenities: Vec<String>,
    pub contact_email: Option<String>,
    pub listing_visibility: bool,
    pub claimed_by_user_id: Option<DbId>,
    #[sqlx(try_from = "String")]
    pub status: VenueStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a venue listing.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVenue {
    pub name: String,
    pub address: String,
    pub neighborhood: Option<String>,
    pub capacity: Option<i32>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub contact_email: Option<String>,
    pub listing_visibility: Option<bool>,
}

/// Which venues a listing query returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VenueListFilter {
    pub status: Option<VenueStatus>,
    pub claimed_by_user_id: Option<DbId>,
    /// With `claimed_by_user_id`, also return approved venues claimed by others.
    pub claimed_or_approved: bool,
    pub limit: i64,
    pub offset: i64,
}

impl VenueListFilter {
    pub fn matches(&self, venue: &Venue) -> bool {
        let status_ok = self.status.is_none() || self.status == Some(venue.status);
        let owner_ok = match self.claimed_by_user_id {
            None => true,
            Some(owner) if venue.claimed_by_user_id == Some(owner) => true,
            Some(_) => self.claimed_or_approved && venue.status == VenueStatus::Approved,
        };
        status_ok && owner_ok
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn venue(id: DbId, claimed_by: Option<DbId>, status: VenueStatus) -> Venue {
        Venue {
            id,
            name: format!("Venue {id}"),
            address: "1 Market St".to_string(),
            neighborhood: None,
            capacity: None,
            amenities: Vec::new(),
            contact_email: None,
            listing_visibility: true,
            claimed_by_user_id: claimed_by,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn claimed_only_filter_hides_other_approved_venues() {
        let filter = VenueListFilter {
            claimed_by_user_id: Some(1),
            ..Default::default()
        };
        assert!(filter.matches(&venue(10, Some(1), VenueStatus::PendingVerification)));
        assert!(!filter.matches(&venue(11, Some(2), VenueStatus::Approved)));
    }

    #[test]
    fn claimed_or_approved_adds_approved_venues_of_others() {
        let filter = VenueListFilter {
            claimed_by_user_id: Some(1),
            claimed_or_approved: true,
            ..Default::default()
        };
        assert!(filter.matches(&venue(10, Some(1), VenueStatus::Suspended)));
        assert!(filter.matches(&venue(11, Some(2), VenueStatus::Approved)));
        assert!(filter.matches(&venue(12, None, VenueStatus::Approved)));
        assert!(!filter.matches(&venue(13, Some(2), VenueStatus::PendingVerification)));
    }

    #[test]
    fn status_filter_still_applies_in_claimed_or_approved_mode() {
        let filter = VenueListFilter {
            status: Some(VenueStatus::Approved),
            claimed_by_user_id: Some(1),
            claimed_or_approved: true,
            ..Default::default()
        };
        assert!(!filter.matches(&venue(10, Some(1), VenueStatus::PendingVerification)));
        assert!(filter.matches(&venue(11, Some(2), VenueStatus::Approved)));
    }
}

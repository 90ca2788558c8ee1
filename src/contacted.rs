//! Outreach tracker: which agencies the team has already contacted

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::cache::PersistentCache;
use crate::{DirectoryError, Result};

const TRACKER_KEY: &str = "contacted-agencies";
const TRACKER_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactedAgency {
    pub id: String,
    pub contacted: bool,
    pub contacted_by: String,
    pub contacted_at: DateTime<Utc>,
}

pub type ContactedMap = BTreeMap<String, ContactedAgency>;

pub struct ContactedTracker {
    cache: PersistentCache,
    // read-modify-write of the single map entry
    write_lock: Mutex<()>,
}

impl ContactedTracker {
    pub fn new(cache: PersistentCache) -> Self {
        Self {
            cache,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn all(&self) -> Result<ContactedMap> {
        Ok(self
            .cache
            .get_json::<ContactedMap>(TRACKER_KEY)
            .await
            .map_err(|e| DirectoryError::cache(e.to_string()))?
            .unwrap_or_default())
    }

    /// Flag or unflag an agency. Returns the stored entry, `None` once unflagged.
    pub async fn mark(
        &self,
        id: &str,
        contacted: bool,
        contacted_by: Option<&str>,
    ) -> Result<Option<ContactedAgency>> {
        let id = id.trim();
        if id.is_empty() {
            return Err(DirectoryError::validation("Agency ID is required"));
        }

        let _guard = self.write_lock.lock().await;
        let mut map = self.all().await?;

        if contacted {
            let by = contacted_by
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or("Unknown");
            map.insert(
                id.to_string(),
                ContactedAgency {
                    id: id.to_string(),
                    contacted: true,
                    contacted_by: by.to_string(),
                    contacted_at: Utc::now(),
                },
            );
            info!("Agency {id} marked as contacted by {by}");
        } else {
            map.remove(id);
            info!("Agency {id} unmarked");
        }

        self.cache
            .put_json(TRACKER_KEY, &map, TRACKER_TTL)
            .await
            .map_err(|e| DirectoryError::cache(e.to_string()))?;
        Ok(map.remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn tracker() -> ContactedTracker {
        let dir = std::env::temp_dir().join(format!("travel-directory-contacted-{}", Uuid::new_v4()));
        ContactedTracker::new(PersistentCache::open(dir).unwrap())
    }

    #[tokio::test]
    async fn test_mark_and_unmark() {
        let tracker = tracker();
        assert!(tracker.all().await.unwrap().is_empty());

        let entry = tracker.mark("agency-1", true, Some("Nadia")).await.unwrap().unwrap();
        assert_eq!(entry.contacted_by, "Nadia");
        tracker.mark("agency-2", true, None).await.unwrap();

        let all = tracker.all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["agency-2"].contacted_by, "Unknown");

        assert!(tracker.mark("agency-1", false, None).await.unwrap().is_none());
        let all = tracker.all().await.unwrap();
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["agency-2"]);
    }

    #[tokio::test]
    async fn test_missing_id() {
        let err = tracker().mark("  ", true, None).await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid input: Agency ID is required");
    }

    #[test]
    fn test_serialized_shape() {
        let entry = ContactedAgency {
            id: "a".to_string(),
            contacted: true,
            contacted_by: "Unknown".to_string(),
            contacted_at: Utc::now(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["contactedBy"], "Unknown");
        assert!(value["contactedAt"].is_string());
    }
}

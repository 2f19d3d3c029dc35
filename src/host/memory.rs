//! In-memory host directory.
//!
//! Holds course, user, enrolment and instance records in `DashMap`s. Used
//! for tests and for running the service without a host database.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::enrolment::{CourseContext, EnrolmentContext, SiteConfig, UserContext};
use crate::instance::InstanceRecord;

use super::directory::{DirectoryError, DirectoryResult, HostDirectory};

pub struct MemoryDirectory {
    site: RwLock<SiteConfig>,
    courses: DashMap<i64, CourseContext>,
    users: DashMap<i64, UserContext>,
    enrolments: DashMap<i64, EnrolmentContext>,
    instances: DashMap<i64, InstanceRecord>,
    next_instance_id: AtomicI64,
    /// Serializes the one-per-course check with the insert
    insert_lock: Mutex<()>,
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new(SiteConfig::default())
    }
}

impl MemoryDirectory {
    pub fn new(site: SiteConfig) -> Self {
        Self {
            site: RwLock::new(site),
            courses: DashMap::new(),
            users: DashMap::new(),
            enrolments: DashMap::new(),
            instances: DashMap::new(),
            next_instance_id: AtomicI64::new(1),
            insert_lock: Mutex::new(()),
        }
    }

    pub fn set_site_config(&self, site: SiteConfig) {
        match self.site.write() {
            Ok(mut guard) => *guard = site,
            Err(poisoned) => *poisoned.into_inner() = site,
        }
    }

    pub fn insert_course(&self, course: CourseContext) {
        self.courses.insert(course.id, course);
    }

    pub fn insert_user(&self, user: UserContext) {
        self.users.insert(user.id, user);
    }

    pub fn insert_enrolment(&self, enrolment: EnrolmentContext) {
        self.enrolments.insert(enrolment.id, enrolment);
    }

    /// Store an instance as-is, assigning an id when it has none
    pub fn put_instance(&self, mut record: InstanceRecord) -> i64 {
        if record.id == 0 {
            record.id = self.next_instance_id.fetch_add(1, Ordering::Relaxed);
        }
        let id = record.id;
        self.instances.insert(id, record);
        id
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

#[async_trait]
impl HostDirectory for MemoryDirectory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn site_config(&self) -> DirectoryResult<SiteConfig> {
        let guard = self
            .site
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(guard.clone())
    }

    async fn course(&self, course_id: i64) -> DirectoryResult<Option<CourseContext>> {
        Ok(self.courses.get(&course_id).map(|c| c.clone()))
    }

    async fn user(&self, user_id: i64) -> DirectoryResult<Option<UserContext>> {
        Ok(self.users.get(&user_id).map(|u| u.clone()))
    }

    async fn enrolment(&self, enrolment_id: i64) -> DirectoryResult<Option<EnrolmentContext>> {
        Ok(self.enrolments.get(&enrolment_id).map(|e| *e))
    }

    async fn instance_for_course(&self, course_id: i64) -> DirectoryResult<Option<InstanceRecord>> {
        // Lowest id first, mirroring the host's sort order
        Ok(self
            .instances
            .iter()
            .filter(|entry| entry.course_id == course_id)
            .min_by_key(|entry| entry.id)
            .map(|entry| entry.value().clone()))
    }

    async fn profile_field_shortnames(&self) -> DirectoryResult<Vec<String>> {
        let names: BTreeSet<String> = self
            .users
            .iter()
            .flat_map(|entry| entry.profile_fields.keys().cloned().collect::<Vec<_>>())
            .collect();
        Ok(names.into_iter().collect())
    }

    async fn insert_instance(&self, record: &InstanceRecord) -> DirectoryResult<Option<i64>> {
        let _guard = self
            .insert_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if self
            .instances
            .iter()
            .any(|entry| entry.course_id == record.course_id)
        {
            return Ok(None);
        }

        let mut record = record.clone();
        record.id = 0;
        Ok(Some(self.put_instance(record)))
    }

    async fn update_instance(&self, record: &InstanceRecord) -> DirectoryResult<bool> {
        match self.instances.get_mut(&record.id) {
            Some(mut existing) => {
                if existing.course_id != record.course_id {
                    return Err(DirectoryError::InvalidRecord(format!(
                        "instance {} belongs to course {}",
                        record.id, existing.course_id
                    )));
                }
                *existing = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrolment::ProfileField;

    #[tokio::test]
    async fn test_lookup_missing_records() {
        let directory = MemoryDirectory::default();
        assert!(directory.course(1).await.unwrap().is_none());
        assert!(directory.user(1).await.unwrap().is_none());
        assert!(directory.enrolment(1).await.unwrap().is_none());
        assert!(directory.instance_for_course(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_instance_insert_and_update() {
        let directory = MemoryDirectory::default();
        let record = InstanceRecord {
            course_id: 3,
            customtext1: "Hi".into(),
            ..Default::default()
        };

        let id = directory.insert_instance(&record).await.unwrap().unwrap();
        let mut stored = directory.instance_for_course(3).await.unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.customtext1, "Hi");

        stored.customtext1 = "Hello".into();
        assert!(directory.update_instance(&stored).await.unwrap());
        assert_eq!(
            directory.instance_for_course(3).await.unwrap().unwrap().customtext1,
            "Hello"
        );

        stored.id = 999;
        assert!(!directory.update_instance(&stored).await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_refuses_second_instance_for_course() {
        let directory = MemoryDirectory::default();
        let record = InstanceRecord {
            course_id: 3,
            ..Default::default()
        };

        assert!(directory.insert_instance(&record).await.unwrap().is_some());
        assert_eq!(directory.insert_instance(&record).await.unwrap(), None);
        assert_eq!(directory.instance_count(), 1);

        let other = InstanceRecord {
            course_id: 4,
            ..Default::default()
        };
        assert!(directory.insert_instance(&other).await.unwrap().is_some());
    }

    #[test]
    fn test_concurrent_inserts_keep_one_instance() {
        let directory = std::sync::Arc::new(MemoryDirectory::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let directory = directory.clone();
                std::thread::spawn(move || {
                    let record = InstanceRecord {
                        course_id: 3,
                        ..Default::default()
                    };
                    tokio_test::block_on(directory.insert_instance(&record)).unwrap()
                })
            })
            .collect();

        let inserted = handles
            .into_iter()
            .filter_map(|handle| handle.join().unwrap())
            .count();
        assert_eq!(inserted, 1);
        assert_eq!(directory.instance_count(), 1);
    }

    #[tokio::test]
    async fn test_update_rejects_course_change() {
        let directory = MemoryDirectory::default();
        let id = directory.put_instance(InstanceRecord {
            course_id: 3,
            ..Default::default()
        });
        let moved = InstanceRecord {
            id,
            course_id: 4,
            ..Default::default()
        };
        assert!(matches!(
            directory.update_instance(&moved).await,
            Err(DirectoryError::InvalidRecord(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_field_shortnames_deduplicated() {
        let directory = MemoryDirectory::default();
        for id in 1..=2 {
            let mut user = UserContext {
                id,
                ..Default::default()
            };
            user.profile_fields.insert("office".into(), ProfileField::text("x"));
            directory.insert_user(user);
        }
        assert_eq!(directory.profile_field_shortnames().await.unwrap(), vec!["office"]);
    }
}

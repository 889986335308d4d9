use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::MemberId;
use crate::ports::{MemberDirectory, MemberRecord, Result};

/// In-memory implementation of MemberDirectory
///
/// The member context lives in a separate system; this adapter stands in
/// for it during development and tests. Seed members with `add_member`.
pub struct MockMemberDirectory {
    members: Mutex<HashMap<MemberId, MemberRecord>>,
}

impl MockMemberDirectory {
    pub fn new() -> Self {
        Self {
            members: Mutex::new(HashMap::new()),
        }
    }

    /// Register a member as active
    pub fn add_member(&self, id: MemberId, name: impl Into<String>) {
        let mut members = self.members.lock().unwrap();
        members.insert(
            id,
            MemberRecord {
                id,
                name: name.into(),
                active: true,
            },
        );
    }

    /// Mark an existing member as inactive
    pub fn deactivate(&self, id: MemberId) {
        let mut members = self.members.lock().unwrap();
        if let Some(record) = members.get_mut(&id) {
            record.active = false;
        }
    }
}

impl Default for MockMemberDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemberDirectory for MockMemberDirectory {
    async fn find_member(&self, id: MemberId) -> Result<Option<MemberRecord>> {
        let members = self.members.lock().unwrap();
        Ok(members.get(&id).cloned())
    }
}

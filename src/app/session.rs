//! Operator session — tag allow-list check and login state.
//!
//! Access control is a static membership check: a scanned credential tag
//! id is either on the configured list or it is not.  The session only
//! records who is logged in; it has no effect on the inventory store.

use log::{info, warn};
use parking_lot::Mutex;

use super::ports::TagError;

/// Fixed set of tag ids allowed to log in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagAllowList {
    tags: Vec<String>,
}

impl TagAllowList {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// `Ok` when `tag` is on the list.  Surrounding whitespace from the
    /// reader or form field is ignored.
    pub fn check(&self, tag: &str) -> Result<(), TagError> {
        let tag = tag.trim();
        if !tag.is_empty() && self.tags.iter().any(|t| t == tag) {
            Ok(())
        } else {
            Err(TagError::NotAllowed)
        }
    }
}

/// Who is currently logged in at the control surface.
pub struct OperatorSession {
    allow: TagAllowList,
    operator: Mutex<Option<String>>,
}

impl OperatorSession {
    pub fn new(allow: TagAllowList) -> Self {
        Self {
            allow,
            operator: Mutex::new(None),
        }
    }

    /// Validate `tag` and make it the current operator.
    pub fn login(&self, tag: &str) -> Result<(), TagError> {
        if let Err(e) = self.allow.check(tag) {
            warn!("session: rejected tag {:?}", tag.trim());
            return Err(e);
        }
        info!("session: operator {} logged in", tag.trim());
        *self.operator.lock() = Some(tag.trim().to_owned());
        Ok(())
    }

    /// Forget the current operator.  Returns who was logged in.
    pub fn logout(&self) -> Option<String> {
        let prev = self.operator.lock().take();
        if let Some(tag) = &prev {
            info!("session: operator {} logged out", tag);
        }
        prev
    }

    pub fn operator(&self) -> Option<String> {
        self.operator.lock().clone()
    }
}

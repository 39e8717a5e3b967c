use tokio::sync::broadcast::{self, error::RecvError};

use super::{LocalMirror, MirrorEvent};
use crate::changes::{diff, ChangeRecord};
use crate::error::{ClientError, ClientResult};
use crate::models::Recipe;

/// Live, name-sorted view of one user's mirrored recipes.
///
/// Holds the snapshot a list widget is currently showing and reports the
/// change batch needed to bring it up to date after the mirror moves on.
pub struct RecipeListView {
    mirror: LocalMirror,
    email: Option<String>,
    snapshot: Vec<Recipe>,
    events: broadcast::Receiver<MirrorEvent>,
}

impl RecipeListView {
    pub fn new(mirror: LocalMirror, email: Option<&str>) -> ClientResult<Self> {
        let events = mirror.subscribe();
        let mut view = Self {
            mirror,
            email: None,
            snapshot: Vec::new(),
            events,
        };
        view.rescope(email)?;
        Ok(view)
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Switch to another user's partition. The new snapshot replaces the old
    /// one wholesale; callers reload rather than patch.
    pub fn rescope(&mut self, email: Option<&str>) -> ClientResult<()> {
        self.email = email.map(str::to_string);
        self.snapshot = self.read()?;
        tracing::debug!(email = ?self.email, count = self.snapshot.len(), "list view rescoped");
        Ok(())
    }

    fn read(&self) -> ClientResult<Vec<Recipe>> {
        match &self.email {
            Some(email) => self.mirror.fetch_all(email),
            None => Ok(Vec::new()),
        }
    }

    /// Re-read the mirror and return what changed since the last snapshot.
    pub fn refresh(&mut self) -> ClientResult<Vec<ChangeRecord>> {
        let current = self.read()?;
        let changes = diff(&self.snapshot, &current);
        self.snapshot = current;
        Ok(changes)
    }

    /// Wait for the next write to this user's partition that changes the
    /// view, and return its batch. Writes to other partitions are ignored.
    pub async fn next_changes(&mut self) -> ClientResult<Vec<ChangeRecord>> {
        loop {
            match self.events.recv().await {
                Ok(event) if Some(event.email.as_str()) == self.email.as_deref() => {}
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "list view lagged behind mirror events");
                }
                Err(RecvError::Closed) => return Err(ClientError::WriterClosed),
            }

            let changes = self.refresh()?;
            if !changes.is_empty() {
                return Ok(changes);
            }
        }
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.snapshot
    }

    pub fn get(&self, index: usize) -> Option<&Recipe> {
        self.snapshot.get(index)
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }
}

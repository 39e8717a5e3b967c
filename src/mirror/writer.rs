use tokio::sync::{mpsc, oneshot};

use super::{LocalMirror, ReconcileReport};
use crate::error::{ClientError, ClientResult};
use crate::models::Recipe;

enum MirrorJob {
    EnsureUser {
        email: String,
        reply: oneshot::Sender<ClientResult<()>>,
    },
    Insert {
        email: String,
        recipe: Recipe,
        reply: oneshot::Sender<ClientResult<()>>,
    },
    Update {
        email: String,
        recipe: Recipe,
        reply: oneshot::Sender<ClientResult<bool>>,
    },
    Delete {
        email: String,
        id: String,
        reply: oneshot::Sender<ClientResult<bool>>,
    },
    Reconcile {
        email: String,
        recipes: Vec<Recipe>,
        reply: oneshot::Sender<ClientResult<ReconcileReport>>,
    },
}

impl MirrorJob {
    fn run(self, mirror: &LocalMirror) {
        // A dropped receiver means the caller stopped waiting; the write still happened
        match self {
            MirrorJob::EnsureUser { email, reply } => {
                let _ = reply.send(mirror.ensure_user(&email));
            }
            MirrorJob::Insert {
                email,
                recipe,
                reply,
            } => {
                let _ = reply.send(mirror.insert(&email, &recipe));
            }
            MirrorJob::Update {
                email,
                recipe,
                reply,
            } => {
                let _ = reply.send(mirror.update(&email, &recipe));
            }
            MirrorJob::Delete { email, id, reply } => {
                let _ = reply.send(mirror.delete(&email, &id));
            }
            MirrorJob::Reconcile {
                email,
                recipes,
                reply,
            } => {
                let _ = reply.send(mirror.reconcile(&email, &recipes));
            }
        }
    }
}

/// Serial background queue for mirror writes.
///
/// One task drains the queue and runs each job to completion on the blocking
/// pool before starting the next, so writes land in submission order.
#[derive(Clone)]
pub struct MirrorWriter {
    jobs: mpsc::UnboundedSender<MirrorJob>,
}

impl MirrorWriter {
    /// Must be called inside a tokio runtime.
    pub fn spawn(mirror: LocalMirror) -> Self {
        let (jobs, mut queue) = mpsc::unbounded_channel::<MirrorJob>();

        tokio::spawn(async move {
            while let Some(job) = queue.recv().await {
                let mirror = mirror.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || job.run(&mirror)).await {
                    tracing::error!("Mirror write panicked: {}", e);
                }
            }
            tracing::debug!("Mirror writer stopped");
        });

        Self { jobs }
    }

    async fn submit<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<ClientResult<T>>) -> MirrorJob,
    ) -> ClientResult<T> {
        let (reply, result) = oneshot::channel();
        self.jobs
            .send(make(reply))
            .map_err(|_| ClientError::WriterClosed)?;
        result.await.map_err(|_| ClientError::WriterClosed)?
    }

    pub async fn ensure_user(&self, email: &str) -> ClientResult<()> {
        let email = email.to_string();
        self.submit(|reply| MirrorJob::EnsureUser { email, reply })
            .await
    }

    pub async fn insert(&self, email: &str, recipe: Recipe) -> ClientResult<()> {
        let email = email.to_string();
        self.submit(|reply| MirrorJob::Insert {
            email,
            recipe,
            reply,
        })
        .await
    }

    pub async fn update(&self, email: &str, recipe: Recipe) -> ClientResult<bool> {
        let email = email.to_string();
        self.submit(|reply| MirrorJob::Update {
            email,
            recipe,
            reply,
        })
        .await
    }

    pub async fn delete(&self, email: &str, id: &str) -> ClientResult<bool> {
        let email = email.to_string();
        let id = id.to_string();
        self.submit(|reply| MirrorJob::Delete { email, id, reply })
            .await
    }

    pub async fn reconcile(
        &self,
        email: &str,
        recipes: Vec<Recipe>,
    ) -> ClientResult<ReconcileReport> {
        let email = email.to_string();
        self.submit(|reply| MirrorJob::Reconcile {
            email,
            recipes,
            reply,
        })
        .await
    }
}

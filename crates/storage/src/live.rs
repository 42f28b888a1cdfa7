use log::debug;
use strum::AsRefStr;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

#[derive(AsRefStr, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    #[strum(serialize = "users")]
    Users,
    #[strum(serialize = "exercises")]
    Exercises,
    #[strum(serialize = "routines")]
    Routines,
    #[strum(serialize = "routine_exercises")]
    RoutineExercises,
    #[strum(serialize = "completed_activities")]
    CompletedActivities,
}

/// Tables a live query reads from.
pub type Dependencies = &'static [Table];

/// Publishes the tables touched by each committed write.
#[derive(Clone)]
pub struct Changes {
    sender: broadcast::Sender<&'static [Table]>,
}

impl Changes {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, tables: &'static [Table]) {
        // Without live queries there is nobody to notify.
        let _ = self.sender.send(tables);
    }

    pub fn subscribe(&self, dependencies: Dependencies) -> Listener {
        Listener {
            receiver: self.sender.subscribe(),
            dependencies,
        }
    }

    pub fn listeners(&self) -> usize {
        self.sender.receiver_count()
    }
}

pub struct Listener {
    receiver: broadcast::Receiver<&'static [Table]>,
    dependencies: Dependencies,
}

impl Listener {
    /// Wait until one of the dependencies changed. Returns `false` once no
    /// more changes can arrive.
    ///
    /// Changes queued up behind the first relevant one are consumed as well,
    /// as a single refresh covers them all.
    pub async fn affected(&mut self) -> bool {
        loop {
            match self.receiver.recv().await {
                Ok(tables) if self.depends_on(tables) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    debug!("live query missed {skipped} changes");
                    break;
                }
                Err(RecvError::Closed) => return false,
            }
        }

        loop {
            match self.receiver.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => return true,
            }
        }
    }

    fn depends_on(&self, tables: &[Table]) -> bool {
        tables.iter().any(|t| self.dependencies.contains(t))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_listener_ignores_unrelated_tables() {
        let changes = Changes::new(8);
        let mut listener = changes.subscribe(&[Table::Exercises]);

        changes.publish(&[Table::Users]);
        changes.publish(&[Table::CompletedActivities]);

        assert!(
            tokio::time::timeout(Duration::from_millis(20), listener.affected())
                .await
                .is_err()
        );

        changes.publish(&[Table::Exercises, Table::RoutineExercises]);

        assert!(listener.affected().await);
    }

    #[tokio::test]
    async fn test_listener_coalesces_changes() {
        let changes = Changes::new(8);
        let mut listener = changes.subscribe(&[Table::Routines]);

        changes.publish(&[Table::Routines]);
        changes.publish(&[Table::Routines]);
        changes.publish(&[Table::Routines]);

        assert!(listener.affected().await);
        assert!(
            tokio::time::timeout(Duration::from_millis(20), listener.affected())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_listener_lagged() {
        let changes = Changes::new(1);
        let mut listener = changes.subscribe(&[Table::Routines]);

        changes.publish(&[Table::Users]);
        changes.publish(&[Table::Users]);
        changes.publish(&[Table::Users]);

        assert!(listener.affected().await);
    }

    #[tokio::test]
    async fn test_listener_closed() {
        let changes = Changes::new(1);
        let mut listener = changes.subscribe(&[Table::Routines]);

        assert_eq!(changes.listeners(), 1);

        drop(changes);

        assert!(!listener.affected().await);
    }

    #[test]
    fn test_table_names() {
        assert_eq!(Table::RoutineExercises.as_ref(), "routine_exercises");
        assert_eq!(Table::CompletedActivities.as_ref(), "completed_activities");
    }
}

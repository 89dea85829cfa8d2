//! Single-writer command queue.
//!
//! Registry mutations issued outside the tick loop (e.g. a loader thread that
//! just decoded a world region) go through a [`CommandSender`]. The streamer
//! drains the queue at a fixed point at the top of every tick, so external
//! edits never interleave with a window diff.

use crossbeam_channel::{Receiver, Sender, TrySendError, unbounded};

use crate::grid::CellCoord;
use crate::placeable::Placeable;
use crate::registry::Region;

/// A deferred registry mutation.
#[derive(Debug)]
pub enum RegistryCommand {
    Insert(Placeable),
    BulkInsert(Region),
    BulkRemove(Vec<CellCoord>),
}

/// Cloneable producer side of the streamer's command queue.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<RegistryCommand>,
}

impl CommandSender {
    /// Queue a command. Returns it back if the streamer has been dropped.
    pub fn send(&self, command: RegistryCommand) -> Result<(), RegistryCommand> {
        self.tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(c) | TrySendError::Disconnected(c) => c,
        })
    }

    pub fn insert(&self, placeable: Placeable) -> Result<(), RegistryCommand> {
        self.send(RegistryCommand::Insert(placeable))
    }

    pub fn bulk_insert(&self, region: Region) -> Result<(), RegistryCommand> {
        self.send(RegistryCommand::BulkInsert(region))
    }

    pub fn bulk_remove(&self, cells: impl IntoIterator<Item = CellCoord>) -> Result<(), RegistryCommand> {
        self.send(RegistryCommand::BulkRemove(cells.into_iter().collect()))
    }
}

/// Consumer side, owned by the streamer.
#[derive(Debug)]
pub(crate) struct CommandQueue {
    tx: Sender<RegistryCommand>,
    rx: Receiver<RegistryCommand>,
}

impl CommandQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub(crate) fn sender(&self) -> CommandSender {
        CommandSender { tx: self.tx.clone() }
    }

    /// Take everything queued so far. Commands sent while draining wait for
    /// the next drain.
    pub(crate) fn take_pending(&self) -> Vec<RegistryCommand> {
        let pending = self.rx.len();
        self.rx.try_iter().take(pending).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellstream_common::TemplateId;
    use glam::Vec2;

    #[test]
    fn drains_in_send_order() {
        let queue = CommandQueue::new();
        let sender = queue.sender();
        sender.bulk_remove([CellCoord::new(1, 1)]).unwrap();
        sender
            .insert(Placeable::new(TemplateId(0), Vec2::ZERO))
            .unwrap();

        let pending = queue.take_pending();
        assert_eq!(pending.len(), 2);
        assert!(matches!(pending[0], RegistryCommand::BulkRemove(_)));
        assert!(matches!(pending[1], RegistryCommand::Insert(_)));
        assert!(queue.take_pending().is_empty());
    }

    #[test]
    fn senders_work_from_other_threads() {
        let queue = CommandQueue::new();
        let sender = queue.sender();
        std::thread::spawn(move || {
            sender.bulk_remove([CellCoord::new(0, 0)]).unwrap();
        })
        .join()
        .unwrap();
        assert_eq!(queue.take_pending().len(), 1);
    }
}

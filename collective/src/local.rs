use crate::communicator::{Communicator, Element, Rank};
use crate::error::CommError;
use crossbeam::channel::{unbounded, Receiver, Sender};
use std::any::Any;
use tracing::debug;

type Envelope = Box<dyn Any + Send>;

/// Runs a process group inside the current process, one thread per rank
///
/// Every ordered pair of ranks gets its own unbounded channel so messages
/// between two ranks stay in send order while unrelated traffic never
/// interleaves with them.
pub struct LocalWorld;

impl LocalWorld {
    /// Creates the endpoints of a group of `size` ranks, indexed by rank
    pub fn endpoints(size: usize) -> Vec<LocalComm> {
        // outbox[src][dst] and inbox[dst][src] are the two ends of one channel
        let mut outbox: Vec<Vec<Sender<Envelope>>> =
            (0..size).map(|_| Vec::with_capacity(size)).collect();
        let mut inbox: Vec<Vec<Receiver<Envelope>>> =
            (0..size).map(|_| Vec::with_capacity(size)).collect();
        for src in 0..size {
            for dst in 0..size {
                let (tx, rx) = unbounded();
                outbox[src].push(tx);
                inbox[dst].push(rx);
            }
        }
        outbox
            .into_iter()
            .zip(inbox)
            .enumerate()
            .map(|(rank, (outbox, inbox))| LocalComm {
                rank,
                size,
                outbox,
                inbox,
            })
            .collect()
    }

    /// Runs `f` once per rank on its own thread and returns the results in rank order
    ///
    /// A rank that panics drops its endpoint, so peers waiting on it see
    /// `CommError::Disconnected` instead of blocking forever.
    pub fn run<F, R>(size: usize, f: F) -> Result<Vec<R>, CommError>
    where
        F: Fn(LocalComm) -> R + Sync,
        R: Send,
    {
        let f = &f;
        crossbeam::thread::scope(|s| {
            let handles: Vec<_> = LocalWorld::endpoints(size)
                .into_iter()
                .map(|comm| s.spawn(move |_| f(comm)))
                .collect();
            // join every rank before looking at the outcomes
            let joined: Vec<_> = handles.into_iter().map(|handle| handle.join()).collect();
            joined
                .into_iter()
                .enumerate()
                .map(|(rank, result)| result.map_err(|_| CommError::RankPanicked { rank }))
                .collect::<Result<Vec<R>, CommError>>()
        })
        .map_err(|_| CommError::WorldPanicked)?
    }
}

/// One rank's endpoint into a `LocalWorld`
pub struct LocalComm {
    rank: Rank,
    size: usize,
    outbox: Vec<Sender<Envelope>>,
    inbox: Vec<Receiver<Envelope>>,
}

impl Communicator for LocalComm {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send<T: Element>(&self, dest: Rank, buf: &[T]) -> Result<(), CommError> {
        self.check_rank(dest)?;
        self.outbox[dest]
            .send(Box::new(buf.to_vec()))
            .map_err(|_| CommError::Disconnected { peer: dest })?;
        debug!(from = self.rank, to = dest, len = buf.len(), "sent");
        Ok(())
    }

    fn receive_into<T: Element>(&self, source: Rank, buf: &mut [T]) -> Result<(), CommError> {
        self.check_rank(source)?;
        let envelope = self.inbox[source]
            .recv()
            .map_err(|_| CommError::Disconnected { peer: source })?;
        let message = envelope
            .downcast::<Vec<T>>()
            .map_err(|_| CommError::TypeMismatch { peer: source })?;
        if message.len() != buf.len() {
            return Err(CommError::LengthMismatch {
                peer: source,
                expected: buf.len(),
                actual: message.len(),
            });
        }
        buf.copy_from_slice(&message);
        debug!(from = source, to = self.rank, len = buf.len(), "received");
        Ok(())
    }
}

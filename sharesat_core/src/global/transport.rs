//! Two [Transport] implementations: a single-rank loopback for non-distributed
//! runs, and an in-process multi-rank stub for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam::channel::{unbounded, Receiver, Sender};

use crate::error;
use crate::global::Transport;
use crate::misc::log::targets;

/// The transport used when `enableDistributed` is false (or was never
/// requested). `world_size() == 1`; every collective is a local no-op.
pub struct LoopbackTransport {
    initialized: AtomicBool,
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        LoopbackTransport {
            initialized: AtomicBool::new(false),
        }
    }
}

impl Transport for LoopbackTransport {
    fn rank(&self) -> u32 {
        0
    }

    fn world_size(&self) -> u32 {
        1
    }

    fn init(&self) -> Result<(), error::Transport> {
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn send(&self, _to: u32, _payload: Vec<u8>) -> Result<(), error::Transport> {
        Err(error::Transport::PeerUnreachable)
    }

    fn recv(&self, _from: u32) -> Result<Vec<u8>, error::Transport> {
        Err(error::Transport::PeerUnreachable)
    }

    fn try_recv(&self, _from: u32) -> Option<Vec<u8>> {
        None
    }

    fn broadcast(&self, _root: u32, payload: Option<Vec<u8>>) -> Result<Vec<u8>, error::Transport> {
        Ok(payload.unwrap_or_default())
    }

    fn allgather(&self, payload: Vec<u8>) -> Result<Vec<Vec<u8>>, error::Transport> {
        Ok(vec![payload])
    }
}

type Envelope = (u32, Vec<u8>);

/// An in-process, multi-rank transport built from one `crossbeam` channel per
/// rank. Used to exercise the global strategies deterministically without a
/// real cluster (design note 9).
pub struct ChannelTransport {
    rank: u32,
    world_size: u32,
    senders: Vec<Sender<Envelope>>,
    receiver: Receiver<Envelope>,
    pending: Mutex<VecDeque<Envelope>>,
}

impl ChannelTransport {
    /// Builds one transport handle per rank, all wired to each other.
    pub fn cluster(world_size: u32) -> Vec<Arc<ChannelTransport>> {
        assert!(world_size > 0, "a cluster needs at least one rank");
        let mut senders = Vec::with_capacity(world_size as usize);
        let mut receivers = Vec::with_capacity(world_size as usize);
        for _ in 0..world_size {
            let (tx, rx) = unbounded();
            senders.push(tx);
            receivers.push(rx);
        }
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, receiver)| {
                Arc::new(ChannelTransport {
                    rank: rank as u32,
                    world_size,
                    senders: senders.clone(),
                    receiver,
                    pending: Mutex::new(VecDeque::new()),
                })
            })
            .collect()
    }

    fn recv_matching(&self, from: u32) -> Envelope {
        {
            let mut pending = self.pending.lock().unwrap();
            if let Some(pos) = pending.iter().position(|(r, _)| *r == from) {
                return pending.remove(pos).unwrap();
            }
        }
        loop {
            let envelope = self.receiver.recv().expect("transport peer dropped");
            if envelope.0 == from {
                return envelope;
            }
            self.pending.lock().unwrap().push_back(envelope);
        }
    }
}

impl Transport for ChannelTransport {
    fn rank(&self) -> u32 {
        self.rank
    }

    fn world_size(&self) -> u32 {
        self.world_size
    }

    fn init(&self) -> Result<(), error::Transport> {
        Ok(())
    }

    fn send(&self, to: u32, payload: Vec<u8>) -> Result<(), error::Transport> {
        let Some(sender) = self.senders.get(to as usize) else {
            log::warn!(target: targets::TRANSPORT, "Rank {} has no channel to peer {to}", self.rank);
            return Err(error::Transport::PeerUnreachable);
        };
        sender.send((self.rank, payload)).map_err(|_| {
            log::warn!(target: targets::TRANSPORT, "Rank {} failed sending to peer {to}: peer dropped", self.rank);
            error::Transport::PeerUnreachable
        })
    }

    fn recv(&self, from: u32) -> Result<Vec<u8>, error::Transport> {
        Ok(self.recv_matching(from).1)
    }

    fn try_recv(&self, from: u32) -> Option<Vec<u8>> {
        {
            let mut pending = self.pending.lock().unwrap();
            if let Some(pos) = pending.iter().position(|(r, _)| *r == from) {
                return Some(pending.remove(pos).unwrap().1);
            }
        }
        while let Ok(envelope) = self.receiver.try_recv() {
            if envelope.0 == from {
                return Some(envelope.1);
            }
            self.pending.lock().unwrap().push_back(envelope);
        }
        None
    }

    fn broadcast(&self, root: u32, payload: Option<Vec<u8>>) -> Result<Vec<u8>, error::Transport> {
        if self.rank == root {
            let payload = payload.ok_or(error::Transport::MalformedPayload)?;
            for to in 0..self.world_size {
                if to != self.rank {
                    self.send(to, payload.clone())?;
                }
            }
            Ok(payload)
        } else {
            self.recv(root)
        }
    }

    fn allgather(&self, payload: Vec<u8>) -> Result<Vec<Vec<u8>>, error::Transport> {
        for to in 0..self.world_size {
            if to != self.rank {
                self.send(to, payload.clone())?;
            }
        }
        let mut gathered = vec![Vec::new(); self.world_size as usize];
        gathered[self.rank as usize] = payload;
        for from in 0..self.world_size {
            if from != self.rank {
                gathered[from as usize] = self.recv(from)?;
            }
        }
        Ok(gathered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn loopback_allgather_returns_own_payload() {
        let t = LoopbackTransport::default();
        t.init().unwrap();
        let gathered = t.allgather(vec![1, 2, 3]).unwrap();
        assert_eq!(gathered, vec![vec![1, 2, 3]]);
    }

    #[test]
    fn channel_allgather_sees_every_rank() {
        let cluster = ChannelTransport::cluster(4);
        let handles: Vec<_> = cluster
            .into_iter()
            .map(|t| {
                thread::spawn(move || {
                    let mine = vec![t.rank() as u8];
                    t.allgather(mine).unwrap()
                })
            })
            .collect();
        for h in handles {
            let gathered = h.join().unwrap();
            assert_eq!(gathered, vec![vec![0u8], vec![1u8], vec![2u8], vec![3u8]]);
        }
    }

    #[test]
    fn channel_broadcast_reaches_every_rank() {
        let cluster = ChannelTransport::cluster(3);
        let handles: Vec<_> = cluster
            .into_iter()
            .map(|t| {
                thread::spawn(move || {
                    let payload = if t.rank() == 0 { Some(vec![42]) } else { None };
                    t.broadcast(0, payload).unwrap()
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), vec![42]);
        }
    }
}

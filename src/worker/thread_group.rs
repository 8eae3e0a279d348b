/* ************************************************************************ **
** This file is part of swfit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of swfit is provided under this permissive         **
** license, and that the project as a whole is licensed under the GPL 3.0.  **
** ************************************************************************ */

//! An in-process stand-in for a group of MPI processes.
//!
//! Each member runs on its own thread.  Collectives rendezvous through a shared hub
//! guarded by a barrier, so the members proceed in lock-step exactly like MPI ranks.

use std::sync::{Arc, Barrier, Mutex, MutexGuard};

use crate::comm::{Comm, ROOT};
use crate::protocol::Signal;

#[derive(Debug)]
struct Hub {
    barrier: Barrier,
    signal: Mutex<Option<Signal>>,
    params: Mutex<Vec<f64>>,
    // one slot per rank
    partials: Mutex<Vec<f64>>,
    chunks: Mutex<Vec<Vec<f64>>>,
}

impl Hub {
    fn lock<'a, T>(mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
        mutex.lock().expect("BUG! a member of the thread group panicked")
    }
}

/// One member of a group created by [`ThreadComm::group`].
#[derive(Debug, Clone)]
pub struct ThreadComm {
    rank: usize,
    size: usize,
    hub: Arc<Hub>,
}

impl ThreadComm {
    /// Create the members of a group of `size` threads.  The first is the root.
    ///
    /// Each member must be moved to its own thread.
    pub fn group(size: usize) -> Vec<ThreadComm> {
        assert!(size > 0, "empty thread group");
        let hub = Arc::new(Hub {
            barrier: Barrier::new(size),
            signal: Mutex::new(None),
            params: Mutex::new(vec![]),
            partials: Mutex::new(vec![0.0; size]),
            chunks: Mutex::new(vec![vec![]; size]),
        });
        (0..size).map(|rank| ThreadComm { rank, size, hub: hub.clone() }).collect()
    }

    fn wait(&self) { self.hub.barrier.wait(); }
}

impl Comm for ThreadComm {
    fn rank(&self) -> usize { self.rank }
    fn size(&self) -> usize { self.size }

    fn broadcast_signal(&self, signal: Option<Signal>) -> Signal {
        if self.is_root() {
            match signal {
                Some(signal) => *Hub::lock(&self.hub.signal) = Some(signal),
                None => panic!("root did not provide a signal to broadcast"),
            }
        }
        self.wait();
        let out = Hub::lock(&self.hub.signal).expect("BUG! signal was not written");
        // nobody may overwrite the slot until everyone has read it
        self.wait();
        out
    }

    fn broadcast_params(&self, params: &mut Vec<f64>) {
        if self.is_root() {
            Hub::lock(&self.hub.params).clone_from(params);
        }
        self.wait();
        if !self.is_root() {
            params.clone_from(&Hub::lock(&self.hub.params));
        }
        self.wait();
    }

    fn reduce_sum(&self, value: f64) -> Option<f64> {
        Hub::lock(&self.hub.partials)[self.rank] = value;
        self.wait();
        let out = match self.is_root() {
            true => Some(Hub::lock(&self.hub.partials).iter().sum()),
            false => None,
        };
        self.wait();
        out
    }

    fn gather_varcount(&self, buf: &mut [f64], counts: &[usize], displs: &[usize]) {
        assert_eq!(counts.len(), self.size);
        assert_eq!(displs.len(), self.size);

        if !self.is_root() {
            let mine = &buf[displs[self.rank]..displs[self.rank] + counts[self.rank]];
            Hub::lock(&self.hub.chunks)[self.rank] = mine.to_vec();
        }
        self.wait();
        if self.is_root() {
            let chunks = Hub::lock(&self.hub.chunks);
            for rank in (0..self.size).filter(|&r| r != ROOT) {
                assert_eq!(chunks[rank].len(), counts[rank], "BUG! gather counts disagree");
                buf[displs[rank]..displs[rank] + counts[rank]].copy_from_slice(&chunks[rank]);
            }
        }
        self.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn run_group<R: Send + 'static>(
        size: usize,
        func: impl Fn(ThreadComm) -> R + Send + Sync + 'static,
    ) -> Vec<R> {
        let func = Arc::new(func);
        let handles: Vec<_> = ThreadComm::group(size).into_iter().map(|comm| {
            let func = func.clone();
            thread::spawn(move || func(comm))
        }).collect();
        handles.into_iter().map(|h| h.join().expect("member thread panicked")).collect()
    }

    #[test]
    fn collectives() {
        let results = run_group(3, |comm| {
            let rank = comm.rank();

            let signal = comm.broadcast_signal(match comm.is_root() {
                true => Some(Signal::ResyncFull),
                false => None,
            });

            let mut params = match comm.is_root() {
                true => vec![1.0, 2.0, 3.0],
                false => vec![],
            };
            comm.broadcast_params(&mut params);

            let sum = comm.reduce_sum(rank as f64 + 1.0);

            // rank r owns r + 1 elements
            let counts = [1, 2, 3];
            let displs = [0, 1, 3];
            let mut buf = vec![-1.0; 6];
            for x in &mut buf[displs[rank]..displs[rank] + counts[rank]] {
                *x = rank as f64;
            }
            comm.gather_varcount(&mut buf, &counts, &displs);

            (signal, params, sum, buf)
        });

        for (rank, (signal, params, sum, buf)) in results.into_iter().enumerate() {
            assert_eq!(signal, Signal::ResyncFull);
            assert_eq!(params, vec![1.0, 2.0, 3.0]);
            match rank {
                0 => {
                    assert_eq!(sum, Some(6.0));
                    assert_eq!(buf, vec![0.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
                },
                1 => {
                    assert_eq!(sum, None);
                    assert_eq!(buf, vec![-1.0, 1.0, 1.0, -1.0, -1.0, -1.0]);
                },
                _ => assert_eq!(sum, None),
            }
        }
    }
}

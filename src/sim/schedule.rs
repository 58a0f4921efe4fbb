//! Deferred work drained against simulated time
//!
//! Burst sub-shots, staggered spawns, shockwave pulses and wave culls are
//! queued here instead of on wall-clock timers, so a test that advances
//! the simulation by N seconds sees exactly the work due in those N
//! seconds. Tasks carry no entity references; anything they touch is
//! looked up (and alive-checked) when they run.

use serde::{Deserialize, Serialize};

/// A unit of delayed work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    /// One primary-fire volley
    Volley,
    /// Spawn one enemy for the given wave-minute
    SpawnEnemy { minute: u32 },
    /// Partial cull of enemies tagged with `wave`
    CullWave { wave: u32 },
    /// One shockwave ring
    ShockwavePulse,
    /// Follow-up rocket
    LaunchRocket,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Deferred {
    due: f32,
    /// Insertion order for stable draining
    seq: u64,
    task: Task,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    queue: Vec<Deferred>,
    seq: u64,
}

impl Scheduler {
    /// Queue `task` to run once simulated time reaches `now + delay`
    pub fn after(&mut self, now: f32, delay: f32, task: Task) {
        self.seq += 1;
        self.queue.push(Deferred {
            due: now + delay.max(0.0),
            seq: self.seq,
            task,
        });
    }

    /// Remove and return every task due at `now`, oldest deadline first
    pub fn drain_due(&mut self, now: f32) -> Vec<Task> {
        let mut due: Vec<Deferred> = Vec::new();
        self.queue.retain(|d| {
            if d.due <= now {
                due.push(*d);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|d| d.task).collect()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether a matching task is still queued
    pub fn contains(&self, task: Task) -> bool {
        self.queue.iter().any(|d| d.task == task)
    }

    /// Deadline of the earliest matching task
    pub fn due_of(&self, task: Task) -> Option<f32> {
        self.queue
            .iter()
            .filter(|d| d.task == task)
            .map(|d| d.due)
            .min_by(f32::total_cmp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drains_only_due_tasks() {
        let mut s = Scheduler::default();
        s.after(0.0, 0.1, Task::Volley);
        s.after(0.0, 2.0, Task::CullWave { wave: 1 });
        assert_eq!(s.drain_due(0.05), vec![]);
        assert_eq!(s.drain_due(0.1), vec![Task::Volley]);
        assert_eq!(s.pending(), 1);
        assert_eq!(s.drain_due(5.0), vec![Task::CullWave { wave: 1 }]);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn test_order_by_deadline_then_insertion() {
        let mut s = Scheduler::default();
        s.after(0.0, 0.3, Task::LaunchRocket);
        s.after(0.0, 0.1, Task::SpawnEnemy { minute: 0 });
        s.after(0.0, 0.1, Task::ShockwavePulse);
        assert_eq!(
            s.drain_due(1.0),
            vec![
                Task::SpawnEnemy { minute: 0 },
                Task::ShockwavePulse,
                Task::LaunchRocket
            ]
        );
    }

    #[test]
    fn test_negative_delay_runs_now() {
        let mut s = Scheduler::default();
        s.after(3.0, -1.0, Task::Volley);
        assert_eq!(s.due_of(Task::Volley), Some(3.0));
        assert_eq!(s.drain_due(3.0), vec![Task::Volley]);
    }
}

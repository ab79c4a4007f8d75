use std::time::{Duration, Instant};

/// The four ordered subdivisions of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    PreUpdate,
    Update,
    PostUpdate,
    Output,
}

pub const PHASES: [Phase; 4] = [
    Phase::PreUpdate,
    Phase::Update,
    Phase::PostUpdate,
    Phase::Output,
];

/// Tick metadata passed to every system.
#[derive(Debug, Clone, Copy)]
pub struct TickInfo {
    /// Monotonic tick counter, starting at 1 on the first tick.
    pub number: u64,
    /// Fixed step size (the configured tick period).
    pub dt: Duration,
}

/// A registered simulation system. Systems are sorted by phase (stable with
/// respect to registration order) and run sequentially; there is no
/// intra-phase parallelism.
pub trait System<Ctx> {
    fn name(&self) -> &'static str;
    fn phase(&self) -> Phase;
    fn update(&mut self, ctx: &mut Ctx, tick: TickInfo);
}

/// Per-tick timing, logged on overrun.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub tick: u64,
    pub phase_times: [Duration; 4],
    pub total: Duration,
    pub overrun: bool,
}

/// Single-threaded cooperative executor for the phased system pipeline.
pub struct Scheduler<Ctx> {
    systems: Vec<Box<dyn System<Ctx> + Send>>,
    period: Duration,
    tick: u64,
}

impl<Ctx> Scheduler<Ctx> {
    pub fn new(period: Duration) -> Self {
        Self {
            systems: Vec::new(),
            period,
            tick: 0,
        }
    }

    /// Register a system, keeping the list sorted by phase with registration
    /// order preserved inside each phase.
    pub fn register(&mut self, system: Box<dyn System<Ctx> + Send>) {
        self.systems.push(system);
        self.systems.sort_by_key(|s| s.phase());
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Run one tick: all systems in phase order. Input drain is the loop
    /// owner's job and happens before this call.
    pub fn run_tick(&mut self, ctx: &mut Ctx) -> TickReport {
        self.tick += 1;
        let info = TickInfo {
            number: self.tick,
            dt: self.period,
        };

        let start = Instant::now();
        let mut phase_times = [Duration::ZERO; 4];

        for (i, phase) in PHASES.iter().enumerate() {
            let phase_start = Instant::now();
            for system in self.systems.iter_mut().filter(|s| s.phase() == *phase) {
                system.update(ctx, info);
            }
            phase_times[i] = phase_start.elapsed();
        }

        let total = start.elapsed();
        let overrun = total > self.period;
        if overrun {
            tracing::warn!(
                tick = self.tick,
                total_us = total.as_micros() as u64,
                pre_us = phase_times[0].as_micros() as u64,
                update_us = phase_times[1].as_micros() as u64,
                post_us = phase_times[2].as_micros() as u64,
                output_us = phase_times[3].as_micros() as u64,
                period_us = self.period.as_micros() as u64,
                "tick overran its period"
            );
        }

        TickReport {
            tick: self.tick,
            phase_times,
            total,
            overrun,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Trace {
        order: Vec<&'static str>,
    }

    struct Recorder {
        name: &'static str,
        phase: Phase,
    }

    impl System<Trace> for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }
        fn phase(&self) -> Phase {
            self.phase
        }
        fn update(&mut self, ctx: &mut Trace, _tick: TickInfo) {
            ctx.order.push(self.name);
        }
    }

    fn recorder(name: &'static str, phase: Phase) -> Box<dyn System<Trace> + Send> {
        Box::new(Recorder { name, phase })
    }

    #[test]
    fn phases_run_in_order() {
        let mut sched = Scheduler::new(Duration::from_millis(200));
        sched.register(recorder("out", Phase::Output));
        sched.register(recorder("pre", Phase::PreUpdate));
        sched.register(recorder("post", Phase::PostUpdate));
        sched.register(recorder("upd", Phase::Update));

        let mut ctx = Trace::default();
        sched.run_tick(&mut ctx);
        assert_eq!(ctx.order, vec!["pre", "upd", "post", "out"]);
    }

    #[test]
    fn registration_order_is_stable_within_phase() {
        let mut sched = Scheduler::new(Duration::from_millis(200));
        sched.register(recorder("u1", Phase::Update));
        sched.register(recorder("p1", Phase::PreUpdate));
        sched.register(recorder("u2", Phase::Update));
        sched.register(recorder("u3", Phase::Update));

        let mut ctx = Trace::default();
        sched.run_tick(&mut ctx);
        assert_eq!(ctx.order, vec!["p1", "u1", "u2", "u3"]);
    }

    #[test]
    fn tick_counter_increments() {
        let mut sched: Scheduler<Trace> = Scheduler::new(Duration::from_millis(200));
        let mut ctx = Trace::default();
        assert_eq!(sched.current_tick(), 0);
        let r1 = sched.run_tick(&mut ctx);
        let r2 = sched.run_tick(&mut ctx);
        assert_eq!(r1.tick, 1);
        assert_eq!(r2.tick, 2);
    }

    #[test]
    fn systems_observe_tick_number() {
        struct TickCheck;
        impl System<Vec<u64>> for TickCheck {
            fn name(&self) -> &'static str {
                "tick_check"
            }
            fn phase(&self) -> Phase {
                Phase::Update
            }
            fn update(&mut self, ctx: &mut Vec<u64>, tick: TickInfo) {
                ctx.push(tick.number);
            }
        }

        let mut sched = Scheduler::new(Duration::from_millis(50));
        sched.register(Box::new(TickCheck));
        let mut seen = Vec::new();
        sched.run_tick(&mut seen);
        sched.run_tick(&mut seen);
        sched.run_tick(&mut seen);
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn overrun_is_reported() {
        struct Slow;
        impl System<()> for Slow {
            fn name(&self) -> &'static str {
                "slow"
            }
            fn phase(&self) -> Phase {
                Phase::Update
            }
            fn update(&mut self, _ctx: &mut (), _tick: TickInfo) {
                std::thread::sleep(Duration::from_millis(5));
            }
        }

        let mut sched = Scheduler::new(Duration::from_millis(1));
        sched.register(Box::new(Slow));
        let report = sched.run_tick(&mut ());
        assert!(report.overrun);
        assert!(report.phase_times[1] >= Duration::from_millis(5));
    }
}

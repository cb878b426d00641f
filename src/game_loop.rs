//! Fixed timestep scheduler
//!
//! The simulation runs on its own thread. Each iteration measures the time
//! since the previous one, clamps it, updates the [`GameState`], renders into
//! the shared surface, and then either sleeps off the rest of the frame or,
//! when it ran long, performs a capped number of extra fixed-period updates
//! without rendering so the game stays close to real time.
//!
//! Time comes from a [`Clock`] so the pacing logic can be driven by hand in
//! tests.

use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TrySendError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::consts::EVENT_QUEUE_CAPACITY;
use crate::error::SimError;
use crate::render::{AssetRegistry, RenderSurface};
use crate::settings::TimingSettings;
use crate::sim::{GameEvent, GameState, Intent};

/// Monotonic time source
pub trait Clock: Send {
    /// Time since the clock's origin
    fn now(&self) -> Duration;
    fn sleep(&mut self, duration: Duration);
}

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// What to do with the time left over after an iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Ahead of schedule: idle this long
    Sleep(Duration),
    /// Exactly on budget
    OnTime,
    /// Behind: run this many extra fixed-period updates
    CatchUp(u32),
}

/// Frame budget arithmetic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePacer {
    pub period: Duration,
    /// Largest delta handed to a single update (seconds)
    pub max_delta: f32,
    pub max_skips: u32,
}

impl FramePacer {
    /// `timing` must pass [`TimingSettings::validate`]
    pub fn new(timing: &TimingSettings) -> Self {
        Self {
            period: Duration::from_secs_f32(timing.frame_period()),
            max_delta: timing.max_delta(),
            max_skips: timing.max_frame_skips,
        }
    }

    #[inline]
    pub fn period_secs(&self) -> f32 {
        self.period.as_secs_f32()
    }

    pub fn clamp_delta(&self, delta: f32) -> f32 {
        if delta.is_finite() {
            delta.clamp(0.0, self.max_delta)
        } else {
            self.period_secs()
        }
    }

    /// Decide how to spend the remainder of a frame whose work took `work`
    pub fn plan(&self, work: Duration) -> Pacing {
        if work < self.period {
            return Pacing::Sleep(self.period - work);
        }
        let overrun = (work - self.period).as_nanos();
        if overrun == 0 {
            return Pacing::OnTime;
        }
        let period = self.period.as_nanos().max(1);
        let skips = overrun.div_ceil(period).min(self.max_skips as u128) as u32;
        Pacing::CatchUp(skips)
    }
}

/// Outcome of one scheduler iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationReport {
    /// Clamped delta given to the main update
    pub delta: f32,
    pub catch_up_steps: u32,
    pub slept: Option<Duration>,
}

/// One iteration of the loop, independent of threading
pub struct LoopRunner<C: Clock> {
    clock: C,
    pacer: FramePacer,
    assets: AssetRegistry,
    last_tick: Option<Duration>,
}

impl<C: Clock> LoopRunner<C> {
    pub fn new(clock: C, pacer: FramePacer, assets: AssetRegistry) -> Self {
        Self {
            clock,
            pacer,
            assets,
            last_tick: None,
        }
    }

    pub fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    /// Forget the previous tick time (after a pause) so the next delta is
    /// one nominal period
    pub fn reset_timing(&mut self) {
        self.last_tick = None;
    }

    pub fn iterate<S: RenderSurface + ?Sized>(
        &mut self,
        state: &mut GameState,
        surface: &Mutex<S>,
    ) -> IterationReport {
        let start = self.clock.now();
        let elapsed = match self.last_tick {
            Some(last) => start.saturating_sub(last).as_secs_f32(),
            None => self.pacer.period_secs(),
        };
        self.last_tick = Some(start);

        let delta = self.pacer.clamp_delta(elapsed);
        state.update(delta);
        self.render(state, surface);

        let work = self.clock.now().saturating_sub(start);
        let mut report = IterationReport {
            delta,
            catch_up_steps: 0,
            slept: None,
        };
        match self.pacer.plan(work) {
            Pacing::Sleep(rest) => {
                self.clock.sleep(rest);
                report.slept = Some(rest);
            }
            Pacing::OnTime => {}
            Pacing::CatchUp(steps) => {
                let period = self.pacer.period_secs();
                for _ in 0..steps {
                    state.update(period);
                }
                report.catch_up_steps = steps;
                // The catch-up covered the overrun
                self.last_tick = Some(self.clock.now());
                log::debug!("Frame took {:?}; caught up with {} updates", work, steps);
            }
        }
        report
    }

    fn render<S: RenderSurface + ?Sized>(&self, state: &GameState, surface: &Mutex<S>) {
        let mut target = lock(surface);
        if let Err(e) = state.render(&mut *target, &self.assets) {
            log::warn!("Present failed: {}", e);
        }
    }

    /// Give back the assets (level teardown)
    pub fn into_assets(self) -> AssetRegistry {
        self.assets
    }
}

/// Lock, taking the data even if a previous holder panicked
fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct Control {
    running: bool,
    paused: bool,
}

#[derive(Debug)]
struct Shared {
    control: Mutex<Control>,
    wake: Condvar,
}

/// Handle to a running simulation thread
pub struct GameLoop {
    shared: Arc<Shared>,
    intents: Sender<Intent>,
    events: Receiver<GameEvent>,
    handle: Option<JoinHandle<GameState>>,
    stop_timeout: Duration,
}

impl GameLoop {
    /// Start `state` on a new thread with the wall clock
    pub fn start<S>(
        state: GameState,
        surface: Arc<Mutex<S>>,
        assets: AssetRegistry,
        timing: &TimingSettings,
    ) -> Result<Self, SimError>
    where
        S: RenderSurface + Send + 'static,
    {
        Self::start_with_clock(state, surface, assets, timing, SystemClock::new())
    }

    pub fn start_with_clock<S, C>(
        mut state: GameState,
        surface: Arc<Mutex<S>>,
        assets: AssetRegistry,
        timing: &TimingSettings,
        clock: C,
    ) -> Result<Self, SimError>
    where
        S: RenderSurface + Send + 'static,
        C: Clock + 'static,
    {
        if let Err(e) = timing.validate() {
            log::error!("Cannot start game loop: {}", e);
            return Err(SimError::InvalidTiming(e));
        }
        if let Err(e) = state.start() {
            log::error!("Cannot start game loop: {}", e);
            return Err(e);
        }

        let shared = Arc::new(Shared {
            control: Mutex::new(Control {
                running: true,
                paused: false,
            }),
            wake: Condvar::new(),
        });
        let (tx, rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::sync_channel(EVENT_QUEUE_CAPACITY);
        let pacer = FramePacer::new(timing);
        let pause_wait = Duration::from_millis(timing.pause_wait_ms);
        let runner = LoopRunner::new(clock, pacer, assets);

        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("simulation".into())
            .spawn(move || {
                run(state, runner, surface, rx, event_tx, thread_shared, pause_wait)
            })
            .map_err(|e| {
                log::error!("Failed to spawn simulation thread: {}", e);
                SimError::SpawnFailed(e)
            })?;

        log::info!("Game loop started ({} fps target)", timing.target_fps);
        Ok(Self {
            shared,
            intents: tx,
            events: event_rx,
            handle: Some(handle),
            stop_timeout: Duration::from_millis(timing.stop_timeout_ms),
        })
    }

    /// Queue an intent for the next iteration. False if the loop has exited.
    pub fn send(&self, intent: Intent) -> bool {
        self.intents.send(intent).is_ok()
    }

    /// Events produced since the last poll, oldest first
    pub fn poll_events(&self) -> Vec<GameEvent> {
        self.events.try_iter().collect()
    }

    pub fn pause(&self) {
        lock(&self.shared.control).paused = true;
        self.shared.wake.notify_all();
    }

    pub fn resume(&self) {
        lock(&self.shared.control).paused = false;
        self.shared.wake.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        lock(&self.shared.control).paused
    }

    /// Still iterating (false after stop or game over)
    pub fn is_running(&self) -> bool {
        lock(&self.shared.control).running
            && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn request_stop(&self) {
        lock(&self.shared.control).running = false;
        self.shared.wake.notify_all();
    }

    /// Stop the thread and hand back the final state
    ///
    /// The join waits at most the configured stop timeout. On timeout the
    /// thread is left detached and an error is returned.
    pub fn stop(mut self) -> Result<GameState, SimError> {
        self.request_stop();
        let Some(handle) = self.handle.take() else {
            return Err(SimError::NotInitialized);
        };
        join_bounded(handle, self.stop_timeout)
    }
}

impl Drop for GameLoop {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.request_stop();
            if let Err(e) = join_bounded(handle, self.stop_timeout) {
                log::warn!("Game loop dropped without a clean stop: {}", e);
            }
        }
    }
}

fn join_bounded(handle: JoinHandle<GameState>, timeout: Duration) -> Result<GameState, SimError> {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            log::warn!("Simulation thread did not stop within {:?}", timeout);
            return Err(SimError::JoinTimeout(timeout));
        }
        thread::sleep(Duration::from_millis(1));
    }
    match handle.join() {
        Ok(state) => {
            log::info!("Game loop stopped (score {})", state.score);
            Ok(state)
        }
        Err(_) => {
            log::error!("Simulation thread panicked");
            Err(SimError::ThreadPanicked)
        }
    }
}

/// Push events to the host without blocking; returns how many were dropped
/// because the queue was full
fn forward_events(queue: &SyncSender<GameEvent>, events: Vec<GameEvent>) -> usize {
    let mut dropped = 0;
    for event in events {
        match queue.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => dropped += 1,
            Err(TrySendError::Disconnected(_)) => break,
        }
    }
    dropped
}

fn run<S, C>(
    mut state: GameState,
    mut runner: LoopRunner<C>,
    surface: Arc<Mutex<S>>,
    intents: Receiver<Intent>,
    events: SyncSender<GameEvent>,
    shared: Arc<Shared>,
    pause_wait: Duration,
) -> GameState
where
    S: RenderSurface + ?Sized,
    C: Clock,
{
    loop {
        {
            let mut control = lock(&shared.control);
            while control.running && control.paused {
                if state.pause() {
                    log::info!("Game paused");
                }
                control = shared
                    .wake
                    .wait_timeout(control, pause_wait)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0;
            }
            if !control.running {
                break;
            }
        }

        if state.resume() {
            log::info!("Game resumed");
            runner.reset_timing();
        }

        while let Ok(intent) = intents.try_recv() {
            state.handle_intent(intent);
        }

        runner.iterate(&mut state, &surface);
        let dropped = forward_events(&events, state.drain_events());
        if dropped > 0 {
            log::trace!("Event queue full, dropped {} events", dropped);
        }

        if state.is_game_over() {
            lock(&shared.control).running = false;
            break;
        }
    }

    runner.into_assets().release();
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::error::RenderError;
    use crate::render::DrawCommand;
    use crate::settings::Settings;
    use crate::sim::{GamePhase, generate_demo_level};

    /// Hand-driven clock shared with the test surface
    #[derive(Debug, Clone, Default)]
    struct ManualClock {
        now: Arc<Mutex<Duration>>,
    }

    impl ManualClock {
        fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Duration {
            *self.now.lock().unwrap()
        }

        fn sleep(&mut self, duration: Duration) {
            self.advance(duration);
        }
    }

    /// Rendering costs `cost` of clock time per frame
    struct SlowSurface {
        clock: ManualClock,
        cost: Duration,
        frames: usize,
    }

    impl RenderSurface for SlowSurface {
        fn draw(&mut self, _command: &DrawCommand) -> Result<(), RenderError> {
            Ok(())
        }

        fn present(&mut self) -> Result<(), RenderError> {
            self.clock.advance(self.cost);
            self.frames += 1;
            Ok(())
        }
    }

    fn running_state() -> GameState {
        let mut state = GameState::new(Settings::default());
        state.initialize(&generate_demo_level(1)).unwrap();
        state.start().unwrap();
        state
    }

    fn runner(clock: &ManualClock) -> LoopRunner<ManualClock> {
        let pacer = FramePacer::new(&TimingSettings::default());
        LoopRunner::new(clock.clone(), pacer, AssetRegistry::new())
    }

    fn surface(clock: &ManualClock, cost_ms: u64) -> Mutex<SlowSurface> {
        Mutex::new(SlowSurface {
            clock: clock.clone(),
            cost: Duration::from_millis(cost_ms),
            frames: 0,
        })
    }

    #[test]
    fn test_plan_sleeps_when_ahead() {
        let pacer = FramePacer::new(&TimingSettings::default());
        match pacer.plan(Duration::from_millis(4)) {
            Pacing::Sleep(rest) => assert_eq!(rest, pacer.period - Duration::from_millis(4)),
            other => panic!("expected sleep, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_caps_catch_up() {
        let pacer = FramePacer::new(&TimingSettings::default());
        assert_eq!(pacer.plan(Duration::from_secs(1)), Pacing::CatchUp(MAX_FRAME_SKIPS));
        assert_eq!(pacer.plan(pacer.period), Pacing::OnTime);
    }

    #[test]
    fn test_delta_clamped() {
        let pacer = FramePacer::new(&TimingSettings::default());
        assert_eq!(pacer.clamp_delta(0.5), 1.0 / MIN_FPS as f32);
        assert_eq!(pacer.clamp_delta(-1.0), 0.0);
        assert_eq!(pacer.clamp_delta(f32::NAN), pacer.period_secs());
    }

    #[test]
    fn test_slow_frame_catches_up_without_rendering() {
        let clock = ManualClock::default();
        let mut runner = runner(&clock);
        let surface = surface(&clock, 50);
        let mut state = running_state();

        let report = runner.iterate(&mut state, &surface);
        assert!(report.catch_up_steps >= 2 && report.catch_up_steps <= MAX_FRAME_SKIPS);
        assert_eq!(report.slept, None);
        assert_eq!(surface.lock().unwrap().frames, 1);

        let period = runner.pacer().period_secs();
        let expected = report.delta + period * report.catch_up_steps as f32;
        assert!((state.total_time - expected).abs() < 1e-5);
    }

    #[test]
    fn test_fast_frame_sleeps_remainder() {
        let clock = ManualClock::default();
        let mut runner = runner(&clock);
        let surface = surface(&clock, 2);
        let mut state = running_state();

        let first = runner.iterate(&mut state, &surface);
        assert_eq!(first.catch_up_steps, 0);
        assert!(first.slept.is_some());

        // A full period passed (2ms work + sleep), so the next delta is one period
        let second = runner.iterate(&mut state, &surface);
        assert!((second.delta - runner.pacer().period_secs()).abs() < 1e-4);
        assert_eq!(surface.lock().unwrap().frames, 2);
    }

    #[test]
    fn test_long_stall_is_clamped() {
        let clock = ManualClock::default();
        let mut runner = runner(&clock);
        let surface = surface(&clock, 0);
        let mut state = running_state();

        runner.iterate(&mut state, &surface);
        clock.advance(Duration::from_millis(400));
        let report = runner.iterate(&mut state, &surface);
        assert_eq!(report.delta, 1.0 / MIN_FPS as f32);
    }

    #[test]
    fn test_start_requires_initialized_state() {
        let state = GameState::new(Settings::default());
        let surface = Arc::new(Mutex::new(SlowSurface {
            clock: ManualClock::default(),
            cost: Duration::ZERO,
            frames: 0,
        }));
        let result = GameLoop::start(
            state,
            surface,
            AssetRegistry::new(),
            &TimingSettings::default(),
        );
        assert!(matches!(result, Err(SimError::NotInitialized)));
    }

    /// Counts frames without touching any clock
    #[derive(Default)]
    struct CountingSurface {
        frames: usize,
    }

    impl RenderSurface for CountingSurface {
        fn draw(&mut self, _command: &DrawCommand) -> Result<(), RenderError> {
            Ok(())
        }

        fn present(&mut self) -> Result<(), RenderError> {
            self.frames += 1;
            Ok(())
        }
    }

    #[test]
    fn test_thread_runs_pauses_and_stops() {
        let surface = Arc::new(Mutex::new(CountingSurface::default()));
        let mut state = running_state();
        if let Some(player) = state.player.as_mut() {
            player.has_gun = true;
        }
        let game = GameLoop::start(
            state,
            Arc::clone(&surface),
            AssetRegistry::new(),
            &TimingSettings::default(),
        )
        .unwrap();
        assert!(game.send(Intent::MoveRight));
        assert!(game.send(Intent::Shoot));

        thread::sleep(Duration::from_millis(100));
        assert!(surface.lock().unwrap().frames > 0);
        assert!(
            game.poll_events()
                .contains(&GameEvent::ProjectileFired { from_player: true })
        );

        game.pause();
        assert!(game.is_paused());
        thread::sleep(Duration::from_millis(150));
        let frozen = surface.lock().unwrap().frames;
        thread::sleep(Duration::from_millis(150));
        assert_eq!(surface.lock().unwrap().frames, frozen);

        game.resume();
        thread::sleep(Duration::from_millis(100));
        assert!(surface.lock().unwrap().frames > frozen);

        let state = game.stop().unwrap();
        assert!(state.total_time > 0.0);
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_start_rejects_zero_fps() {
        let surface = Arc::new(Mutex::new(CountingSurface::default()));
        let timing = TimingSettings {
            target_fps: 0,
            ..TimingSettings::default()
        };
        let result = GameLoop::start(running_state(), surface, AssetRegistry::new(), &timing);
        assert!(matches!(result, Err(SimError::InvalidTiming(_))));
    }

    /// Real time, but every frame sleep stalls far longer than asked
    struct StallingClock {
        origin: Instant,
        stall: Duration,
    }

    impl Clock for StallingClock {
        fn now(&self) -> Duration {
            self.origin.elapsed()
        }

        fn sleep(&mut self, _duration: Duration) {
            thread::sleep(self.stall);
        }
    }

    #[test]
    fn test_stop_gives_up_after_timeout() {
        let surface = Arc::new(Mutex::new(CountingSurface::default()));
        let timing = TimingSettings {
            stop_timeout_ms: 50,
            ..TimingSettings::default()
        };
        let clock = StallingClock {
            origin: Instant::now(),
            stall: Duration::from_millis(800),
        };
        let game = GameLoop::start_with_clock(
            running_state(),
            surface,
            AssetRegistry::new(),
            &timing,
            clock,
        )
        .unwrap();
        thread::sleep(Duration::from_millis(20));

        let asked = Instant::now();
        let result = game.stop();
        assert!(matches!(result, Err(SimError::JoinTimeout(d)) if d == Duration::from_millis(50)));
        assert!(asked.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn test_full_event_queue_drops_newest() {
        let (tx, rx) = mpsc::sync_channel(2);
        let events = vec![
            GameEvent::Jumped,
            GameEvent::PlatformBroke,
            GameEvent::PlayerDied,
            GameEvent::GameOver { score: 7 },
        ];
        assert_eq!(forward_events(&tx, events), 2);
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![GameEvent::Jumped, GameEvent::PlatformBroke]
        );

        drop(rx);
        assert_eq!(forward_events(&tx, vec![GameEvent::Jumped]), 0);
    }
}

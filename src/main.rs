//! Trophy Dash headless runner
//!
//! Plays a scripted session on the generated demo level and logs what the
//! simulation draws and reports. Usage: `trophy-dash [settings.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use trophy_dash::render::{AnimationKey, FrameHandle, SpriteId};
    use trophy_dash::sim::{
        CollectibleKind, GameEvent, GameState, Intent, ObjectState, generate_demo_level,
    };
    use trophy_dash::{AssetRegistry, DrawCommand, GameLoop, RenderError, RenderSurface, Settings};

    const DEFAULT_SEED: u64 = 0x7209_0d15;

    /// Surface that only counts and logs what it is asked to draw
    #[derive(Debug, Default)]
    struct LogSurface {
        frames: u64,
        commands: usize,
        textured: usize,
    }

    impl RenderSurface for LogSurface {
        fn draw(&mut self, command: &DrawCommand) -> Result<(), RenderError> {
            if command.rect.width() <= 0.0 || command.rect.height() <= 0.0 {
                return Err(RenderError::Surface(format!(
                    "empty rect for {:?}",
                    command.sprite
                )));
            }
            self.commands += 1;
            if command.frame.is_some() {
                self.textured += 1;
            }
            log::trace!(
                "draw {:?} at ({:.1}, {:.1}) alpha {:.2}",
                command.sprite,
                command.rect.left,
                command.rect.top,
                command.alpha()
            );
            Ok(())
        }

        fn present(&mut self) -> Result<(), RenderError> {
            self.frames += 1;
            if self.frames % 60 == 0 {
                log::debug!(
                    "{} frames presented, {} draws ({} textured)",
                    self.frames,
                    self.commands,
                    self.textured
                );
            }
            Ok(())
        }
    }

    fn load_settings(path: Option<String>) -> Settings {
        let Some(path) = path else {
            return Settings::default();
        };
        match Settings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring settings file {}: {}", path, e);
                Settings::default()
            }
        }
    }

    /// Stand-in for a texture provider: one frame per player state
    fn demo_assets() -> AssetRegistry {
        let mut assets = AssetRegistry::new();
        let states = [
            ObjectState::Idle,
            ObjectState::Moving,
            ObjectState::Jumping,
            ObjectState::Falling,
        ];
        for (i, state) in states.into_iter().enumerate() {
            let base = i as u32 * 4;
            assets.register(
                AnimationKey::new(SpriteId::Player, state),
                (base..base + 4).map(FrameHandle).collect(),
            );
        }
        assets
    }

    /// Intents fed to the loop, each followed by a hold time
    const SCRIPT: &[(Intent, u64)] = &[
        (Intent::MoveRight, 400),
        (Intent::Jump, 200),
        (Intent::ReleaseJump, 300),
        (Intent::Shoot, 100),
        (Intent::MoveLeft, 500),
        (Intent::Stop, 200),
        (Intent::Jump, 150),
        (Intent::ReleaseJump, 400),
        (Intent::MoveRight, 800),
        (Intent::Jump, 250),
        (Intent::ReleaseJump, 500),
        (Intent::Stop, 200),
    ];

    fn log_event(event: &GameEvent) {
        match event {
            GameEvent::LevelCompleted { time, bonus } => {
                log::info!("Level complete in {:.1}s (+{} bonus)", time, bonus)
            }
            GameEvent::GameOver { score } => log::info!("Game over, final score {}", score),
            other => log::debug!("{:?}", other),
        }
    }

    pub fn run() {
        env_logger::init();

        let mut args = std::env::args().skip(1);
        let settings = load_settings(args.next());
        let seed = match args.next().map(|s| s.parse::<u64>()) {
            Some(Ok(seed)) => seed,
            Some(Err(e)) => {
                log::warn!("Bad seed argument ({}), using default", e);
                DEFAULT_SEED
            }
            None => DEFAULT_SEED,
        };
        log::info!("Trophy Dash (headless) starting, seed {:#x}", seed);

        let level = generate_demo_level(seed);
        let mut state = GameState::new(settings.clone());
        if let Err(e) = state.initialize(&level) {
            log::error!("Could not initialize level: {}", e);
            return;
        }

        let surface = Arc::new(Mutex::new(LogSurface::default()));
        let game = match GameLoop::start(
            state,
            Arc::clone(&surface),
            demo_assets(),
            &settings.timing,
        ) {
            Ok(game) => game,
            Err(e) => {
                log::error!("Could not start game loop: {}", e);
                return;
            }
        };

        for &(intent, hold_ms) in SCRIPT {
            if !game.send(intent) {
                break;
            }
            thread::sleep(Duration::from_millis(hold_ms));
            game.poll_events().iter().for_each(log_event);
        }

        game.pause();
        thread::sleep(Duration::from_millis(200));
        game.resume();
        thread::sleep(Duration::from_millis(200));
        game.poll_events().iter().for_each(log_event);

        match game.stop() {
            Ok(state) => log::info!(
                "Session over: score {}, {:.2}s simulated, {} trophies left",
                state.score,
                state.total_time,
                state
                    .collectibles
                    .iter()
                    .filter(|c| c.kind == CollectibleKind::Trophy)
                    .count()
            ),
            Err(e) => log::error!("Game loop did not stop cleanly: {}", e),
        }

        if let Ok(surface) = surface.lock() {
            log::info!(
                "{} frames presented, {} draw commands",
                surface.frames,
                surface.commands
            );
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    native::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web host drives GameState directly
}

//! Engine bootstrap: wires the scheduler, node graph, buffer unit manager,
//! backend registry and window manager into one `Engine` with an
//! `init`/`start`/`end` embedding API.
//!
//! Facade-crate-owns-the-subsystems shape matching `artifice-main`'s `App`
//! and `graal::context::Context`, with `anyhow` used only at this boundary
//! the way `artifice-main` uses it over the library crates' `thiserror`
//! types.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use mayaflux_buffers::TokenUnitManager;
use mayaflux_core::registry::BackendRegistry;
use mayaflux_core::{Clock, EventClock, FrameClock, SampleClock};
use mayaflux_nodes::NodeGraphArena;
use mayaflux_scheduler::{TaskScheduler, TickDomain};
use mayaflux_window::WindowManager;

/// Engine-wide configuration, supplied once at construction. A plain
/// builder-style struct rather than a file format — the original source
/// has no config file of its own; this mirrors
/// `TokenUnitManager`'s constructor parameters.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub sample_rate: u32,
    pub target_fps: u32,
    pub default_channel_count: usize,
    pub default_buffer_size: usize,
    /// Cycles a node may go unvisited before the graph considers it
    /// eligible for eviction by a host-side garbage pass. This crate only
    /// carries the threshold; it does not implement eviction itself
    /// (no counterpart node-eviction operation exists in spec.md).
    pub eviction_threshold: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            target_fps: 60,
            default_channel_count: 2,
            default_buffer_size: 512,
            eviction_threshold: 120,
        }
    }
}

/// Owns every subsystem spec.md's modules describe and exposes the
/// `init`/`start`/`end` lifecycle an embedding host drives.
pub struct Engine {
    config: EngineConfig,
    scheduler: TaskScheduler,
    graph: NodeGraphArena,
    units: Arc<TokenUnitManager>,
    registry: Arc<BackendRegistry>,
    window: Arc<WindowManager>,
    sample_clock: SampleClock,
    frame_clock: FrameClock,
    event_clock: EventClock,
    running: bool,
}

impl Engine {
    /// Constructs every subsystem and installs a process-wide `tracing`
    /// subscriber (idempotent: safe to call once per process, or multiple
    /// times across tests). Corresponds to spec.md §6's `Init()`.
    pub fn init(config: EngineConfig) -> Result<Self> {
        let _ = tracing_subscriber::fmt::try_init();
        tracing::info!(?config, "initializing MayaFlux engine");

        let scheduler = TaskScheduler::new(config.sample_rate, config.default_buffer_size as u32);
        let units = Arc::new(TokenUnitManager::new());
        units.ensure_audio_channels(
            mayaflux_core::ProcessingToken::AUDIO_BACKEND,
            config.default_channel_count,
            config.default_buffer_size,
        );

        Ok(Self {
            config,
            scheduler,
            graph: NodeGraphArena::new(),
            units,
            registry: Arc::new(BackendRegistry::new()),
            window: Arc::new(WindowManager::new()),
            sample_clock: SampleClock::new(config.sample_rate),
            frame_clock: FrameClock::new(config.target_fps),
            event_clock: EventClock::default(),
            running: false,
        })
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn scheduler_mut(&mut self) -> &mut TaskScheduler {
        &mut self.scheduler
    }

    pub fn graph_mut(&mut self) -> &mut NodeGraphArena {
        &mut self.graph
    }

    pub fn units(&self) -> Arc<TokenUnitManager> {
        self.units.clone()
    }

    pub fn registry(&self) -> Arc<BackendRegistry> {
        self.registry.clone()
    }

    pub fn window(&self) -> Arc<WindowManager> {
        self.window.clone()
    }

    /// Marks the engine running. Corresponds to spec.md §6's `Start()`.
    /// Does not spawn any threads itself — the audio-callback, graphics
    /// and window-polling threads are a host/backend responsibility; this
    /// only flips the flag `tick` checks.
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            anyhow::bail!("engine is already running");
        }
        self.running = true;
        tracing::info!("engine started");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Drains pending window events, advances the event clock once per
    /// drained event, advances the sample and frame clocks, and resumes
    /// every routine whose domain ticked. A single call represents one
    /// outer loop iteration a host application's main thread would drive;
    /// `sample_units`/`frame_units` let an embedding host batch several
    /// sample/frame ticks (e.g. a full audio callback's worth) per call.
    pub fn tick(&mut self, sample_units: u64, frame_units: u64) -> Result<()> {
        if !self.running {
            anyhow::bail!("engine is not running; call start() first");
        }

        let pending = self.window.drain_events();
        for _ in &pending {
            self.event_clock.tick(1);
            self.scheduler.process_token(TickDomain::Event, 1);
        }

        if sample_units > 0 {
            self.sample_clock.tick(sample_units);
            self.scheduler.process_token(TickDomain::Sample, sample_units);
        }
        if frame_units > 0 {
            self.frame_clock.tick(frame_units);
            self.scheduler.process_token(TickDomain::Frame, frame_units);
            self.graph.end_cycle();
        }
        self.scheduler.drive_on_demand();
        Ok(())
    }

    /// Tears the engine down. Corresponds to spec.md §6's `End()`.
    /// Idempotent: calling it twice is a no-op, matching
    /// `BackendRegistry::clear_all_services`'s own idempotence.
    pub fn end(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        tracing::info!("engine shutting down");
        self.registry.clear_all_services();
        self.running = false;
        Ok(())
    }
}

/// Convenience constructor matching `EngineConfig::default()`, for callers
/// that don't need to tune sample rate/FPS/channels.
pub fn bootstrap() -> Result<Engine> {
    Engine::init(EngineConfig::default()).context("failed to initialize MayaFlux engine")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_then_start_then_tick_then_end_is_a_valid_lifecycle() {
        let mut engine = Engine::init(EngineConfig::default()).unwrap();
        assert!(!engine.is_running());
        engine.start().unwrap();
        assert!(engine.is_running());
        engine.tick(512, 1).unwrap();
        engine.end().unwrap();
        assert!(!engine.is_running());
    }

    #[test]
    fn starting_twice_errs() {
        let mut engine = Engine::init(EngineConfig::default()).unwrap();
        engine.start().unwrap();
        assert!(engine.start().is_err());
    }

    #[test]
    fn ticking_before_start_errs() {
        let mut engine = Engine::init(EngineConfig::default()).unwrap();
        assert!(engine.tick(1, 0).is_err());
    }

    #[test]
    fn ending_twice_is_a_noop() {
        let mut engine = Engine::init(EngineConfig::default()).unwrap();
        engine.start().unwrap();
        engine.end().unwrap();
        assert!(engine.end().is_ok());
    }
}

//! `TokenUnitManager`: token-scoped, thread-safe storage and lazy
//! creation for `RootAudioUnit`/`RootGraphicsUnit`.
//!
//! Grounded on
//! `examples/original_source/src/MayaFlux/Buffers/Managers/TokenUnitManager.hpp`:
//! token-generic storage (doesn't distinguish audio/graphics at the data
//! level beyond which map it lives in), thread-safe via a lock per call,
//! lazy creation via `get_or_create`, and query-only accessors that never
//! create a unit.

use std::collections::HashMap;

use mayaflux_core::{Component, Context, ErrorKind, MayaFluxError, ProcessingToken, Result};
use parking_lot::Mutex;

use crate::audio::RootAudioUnit;
use crate::graphics_root::RootGraphicsUnit;

/// Single source of truth for root-unit lifecycle, keyed by
/// `ProcessingToken`. Buffer creation/destruction synchronizes through
/// this mutex.
pub struct TokenUnitManager {
    audio: Mutex<HashMap<ProcessingToken, RootAudioUnit>>,
    graphics: Mutex<HashMap<ProcessingToken, RootGraphicsUnit>>,
}

impl TokenUnitManager {
    pub fn new() -> Self {
        Self {
            audio: Mutex::new(HashMap::new()),
            graphics: Mutex::new(HashMap::new()),
        }
    }

    /// Gets or creates the audio unit for `token`, then ensures it has at
    /// least `channel_count` channels and every channel's buffers are at
    /// least `buffer_size` samples — the combined contract of
    /// `get_or_create_audio_unit` + `resize_channels` from the source.
    pub fn ensure_audio_channels(&self, token: ProcessingToken, channel_count: usize, buffer_size: usize) {
        let mut guard = self.audio.lock();
        let unit = guard.entry(token).or_insert_with(|| RootAudioUnit::new(token));
        unit.ensure_audio_channels(channel_count);
        unit.resize_buffers(buffer_size);
    }

    pub fn has_audio_unit(&self, token: ProcessingToken) -> bool {
        self.audio.lock().contains_key(&token)
    }

    pub fn active_audio_tokens(&self) -> Vec<ProcessingToken> {
        self.audio.lock().keys().copied().collect()
    }

    /// Runs `f` with exclusive access to the audio unit for `token`,
    /// creating it first if absent.
    pub fn with_audio_unit_mut<R>(&self, token: ProcessingToken, f: impl FnOnce(&mut RootAudioUnit) -> R) -> R {
        let mut guard = self.audio.lock();
        let unit = guard.entry(token).or_insert_with(|| RootAudioUnit::new(token));
        f(unit)
    }

    /// Query-only: errs if no unit has been created for `token` yet.
    pub fn with_audio_unit<R>(&self, token: ProcessingToken, f: impl FnOnce(&RootAudioUnit) -> R) -> Result<R> {
        let guard = self.audio.lock();
        guard.get(&token).map(f).ok_or_else(|| {
            MayaFluxError::new(
                Component::Buffers,
                Context::Distribution,
                ErrorKind::ResourceNotInitialized("no audio unit registered for token".into()),
            )
        })
    }

    pub fn has_graphics_unit(&self, token: ProcessingToken) -> bool {
        self.graphics.lock().contains_key(&token)
    }

    pub fn with_graphics_unit_mut<R>(&self, token: ProcessingToken, f: impl FnOnce(&mut RootGraphicsUnit) -> R) -> R {
        let mut guard = self.graphics.lock();
        let unit = guard.entry(token).or_insert_with(|| RootGraphicsUnit::new(token));
        f(unit)
    }

    pub fn with_graphics_unit<R>(&self, token: ProcessingToken, f: impl FnOnce(&RootGraphicsUnit) -> R) -> Result<R> {
        let guard = self.graphics.lock();
        guard.get(&token).map(f).ok_or_else(|| {
            MayaFluxError::new(
                Component::Buffers,
                Context::Distribution,
                ErrorKind::ResourceNotInitialized("no graphics unit registered for token".into()),
            )
        })
    }

    pub fn active_graphics_tokens(&self) -> Vec<ProcessingToken> {
        self.graphics.lock().keys().copied().collect()
    }
}

impl Default for TokenUnitManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_audio_channels_lazily_creates_unit() {
        let manager = TokenUnitManager::new();
        assert!(!manager.has_audio_unit(ProcessingToken::AUDIO_BACKEND));
        manager.ensure_audio_channels(ProcessingToken::AUDIO_BACKEND, 2, 512);
        assert!(manager.has_audio_unit(ProcessingToken::AUDIO_BACKEND));
        manager
            .with_audio_unit(ProcessingToken::AUDIO_BACKEND, |unit| {
                assert_eq!(unit.channels.len(), 2);
            })
            .unwrap();
    }

    #[test]
    fn query_only_accessor_errs_when_unit_absent() {
        let manager = TokenUnitManager::new();
        assert!(manager.with_audio_unit(ProcessingToken::AUDIO_BACKEND, |_| ()).is_err());
    }

    #[test]
    fn graphics_unit_is_created_lazily_and_singular_per_token() {
        let manager = TokenUnitManager::new();
        manager.with_graphics_unit_mut(ProcessingToken::GRAPHICS_BACKEND, |unit| {
            unit.root.children.clear();
        });
        assert!(manager.has_graphics_unit(ProcessingToken::GRAPHICS_BACKEND));
    }
}

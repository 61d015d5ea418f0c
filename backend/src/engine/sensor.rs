//! Sensor handles
//!
//! A sensor streams one [`SensorData`] per tick to a single listener. The
//! listener runs on the episode's dispatcher thread.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::bridge::Invocable;

use super::actor::Actor;
use super::error::EngineError;
use super::sensor_data::SensorData;

/// An actor that produces measurements
#[derive(Clone)]
pub struct Sensor {
    actor: Actor,
}

impl Sensor {
    pub(crate) fn new(actor: Actor) -> Self {
        Sensor { actor }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Start streaming measurements to `callback`
    ///
    /// # Errors
    ///
    /// `AlreadyListening` while another listener is installed (call
    /// [`stop`](Sensor::stop) first); `ActorNotFound` once destroyed.
    pub fn listen(&self, callback: Arc<dyn Invocable<SensorData>>) -> Result<(), EngineError> {
        let mut state = self.actor.episode().lock();
        let record = state.record_mut(self.actor.id())?;
        if record.listener.is_some() {
            return Err(EngineError::AlreadyListening(self.actor.id()));
        }
        record.listener = Some(callback);
        log::debug!("sensor {} listening", self.actor.id());
        Ok(())
    }

    /// Stop streaming; a no-op when not listening
    pub fn stop(&self) -> Result<(), EngineError> {
        let listener = {
            let mut state = self.actor.episode().lock();
            state.record_mut(self.actor.id())?.listener.take()
        };
        // Released after the episode lock; dropping may wait for the
        // listener's runtime.
        drop(listener);
        Ok(())
    }

    pub fn is_listening(&self) -> bool {
        let state = self.actor.episode().lock();
        state
            .record(self.actor.id())
            .map_or(false, |record| record.listener.is_some())
    }
}

impl Deref for Sensor {
    type Target = Actor;

    fn deref(&self) -> &Actor {
        &self.actor
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sensor(id={}, type={})", self.actor.id(), self.actor.type_id())
    }
}

impl fmt::Debug for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

//! Batched commands
//!
//! Commands are applied in order; a failing command does not stop the
//! batch, its error is reported in the matching [`CommandResponse`].

use std::fmt;

use super::actor::ActorId;
use super::blueprint::ActorBlueprint;
use super::control::VehicleControl;
use super::error::EngineError;
use super::geom::Transform;
use super::world::World;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SpawnActor {
        blueprint: ActorBlueprint,
        transform: Transform,
        parent: Option<ActorId>,
    },
    DestroyActor(ActorId),
    ApplyVehicleControl(ActorId, VehicleControl),
    ApplyTransform(ActorId, Transform),
    /// Actor, enabled, traffic manager port
    SetAutopilot(ActorId, bool, u16),
}

impl Command {
    /// Apply to `world`
    pub fn apply(&self, world: &World) -> CommandResponse {
        match self.execute(world) {
            Ok(actor_id) => CommandResponse {
                actor_id: Some(actor_id),
                error: None,
            },
            Err(err) => CommandResponse {
                actor_id: None,
                error: Some(err.to_string()),
            },
        }
    }

    fn execute(&self, world: &World) -> Result<ActorId, EngineError> {
        let actor = |id: ActorId| world.get_actor(id).ok_or(EngineError::ActorNotFound(id));
        match self {
            Command::SpawnActor {
                blueprint,
                transform,
                parent,
            } => {
                let parent = parent.map(actor).transpose()?;
                Ok(world.spawn_actor(blueprint, *transform, parent.as_ref())?.id())
            }
            Command::DestroyActor(id) => {
                if actor(*id)?.destroy() {
                    Ok(*id)
                } else {
                    Err(EngineError::ActorNotFound(*id))
                }
            }
            Command::ApplyVehicleControl(id, control) => {
                actor(*id)?.apply_control(*control)?;
                Ok(*id)
            }
            Command::ApplyTransform(id, transform) => {
                actor(*id)?.set_transform(*transform)?;
                Ok(*id)
            }
            Command::SetAutopilot(id, enabled, port) => {
                actor(*id)?.set_autopilot(*enabled, *port)?;
                Ok(*id)
            }
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SpawnActor { blueprint, .. } => write!(f, "SpawnActor({})", blueprint.id()),
            Command::DestroyActor(id) => write!(f, "DestroyActor({})", id),
            Command::ApplyVehicleControl(id, _) => write!(f, "ApplyVehicleControl({})", id),
            Command::ApplyTransform(id, _) => write!(f, "ApplyTransform({})", id),
            Command::SetAutopilot(id, enabled, port) => {
                write!(f, "SetAutopilot({}, {}, {})", id, enabled, port)
            }
        }
    }
}

/// Outcome of one command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResponse {
    pub actor_id: Option<ActorId>,
    pub error: Option<String>,
}

impl CommandResponse {
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

impl fmt::Display for CommandResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.actor_id, &self.error) {
            (_, Some(error)) => write!(f, "Response(error={})", error),
            (Some(id), None) => write!(f, "Response(actor_id={})", id),
            (None, None) => f.write_str("Response()"),
        }
    }
}

//! Client connection to a simulator
//!
//! The simulator runs in-process: clients created for the same host and
//! port share one simulator, which lives as long as any of its clients.
//!
//! # Example
//! ```
//! use libsim::engine::Client;
//!
//! let client = Client::new("localhost", 2200).unwrap();
//! let before = client.get_world().id();
//! let world = client.load_world("Town02").unwrap();
//! assert_ne!(world.id(), before);
//! assert_eq!(world.get_map().name(), "Town02");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};
use std::time::Duration;

use super::commands::{Command, CommandResponse};
use super::episode::Episode;
use super::error::EngineError;
use super::map::AVAILABLE_MAPS;
use super::settings::{ClientConfig, WorldSettings};
use super::traffic_manager::{TrafficManager, TrafficManagers};
use super::world::World;

type Address = (String, u16);

static SERVERS: OnceLock<Mutex<HashMap<Address, Weak<Server>>>> = OnceLock::new();

/// Map every new simulator starts with
const INITIAL_MAP: &str = "Town01";

struct Server {
    episode: Mutex<Arc<Episode>>,
    traffic: Arc<TrafficManagers>,
}

impl Server {
    /// The simulator at `address`, started on first use
    fn connect(address: Address) -> Result<Arc<Server>, EngineError> {
        let mut servers = SERVERS
            .get_or_init(Default::default)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(server) = servers.get(&address).and_then(Weak::upgrade) {
            return Ok(server);
        }

        servers.retain(|_, server| server.strong_count() > 0);

        let traffic = Arc::new(TrafficManagers::default());
        let episode = Episode::start(INITIAL_MAP, WorldSettings::default(), Arc::clone(&traffic))?;
        log::debug!("simulator started at {}:{}", address.0, address.1);
        let server = Arc::new(Server {
            episode: Mutex::new(episode),
            traffic,
        });
        servers.insert(address, Arc::downgrade(&server));
        Ok(server)
    }

    #[cfg(test)]
    fn is_registered(host: &str, port: u16) -> bool {
        SERVERS
            .get_or_init(Default::default)
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&(host.to_string(), port))
    }

    fn episode(&self) -> Arc<Episode> {
        self.episode.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn load(&self, map_name: &str) -> Result<Arc<Episode>, EngineError> {
        let settings = self.episode().lock().settings.clone();
        let episode = Episode::start(map_name, settings, Arc::clone(&self.traffic))?;
        let previous = {
            let mut current = self.episode.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *current, Arc::clone(&episode))
        };
        previous.close();
        Ok(episode)
    }
}

/// Connection to a simulator
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    server: Arc<Server>,
}

impl Client {
    /// Connect to the simulator at `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Result<Client, EngineError> {
        Client::from_config(ClientConfig::new(host, port))
    }

    pub fn from_config(config: ClientConfig) -> Result<Client, EngineError> {
        let server = Server::connect((config.host.clone(), config.port))?;
        Ok(Client { config, server })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Timeout for blocking simulator calls
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout_seconds = timeout.as_secs_f64();
    }

    pub fn get_timeout(&self) -> Duration {
        self.config.timeout()
    }

    /// The currently running episode
    pub fn get_world(&self) -> World {
        World::new(self.server.episode())
    }

    /// Load a map as a new episode
    ///
    /// Actors of the previous episode are destroyed; handles to them report
    /// `ActorNotFound`.
    pub fn load_world(&self, map_name: &str) -> Result<World, EngineError> {
        log::debug!("loading map {}", map_name);
        Ok(World::new(self.server.load(map_name)?))
    }

    /// Restart the current map as a new episode
    pub fn reload_world(&self) -> Result<World, EngineError> {
        let map_name = self.server.episode().map().name().to_string();
        self.load_world(&map_name)
    }

    pub fn get_available_maps(&self) -> Vec<String> {
        AVAILABLE_MAPS.iter().map(|name| name.to_string()).collect()
    }

    /// Apply commands without waiting for their outcome
    ///
    /// Failures are logged.
    pub fn apply_batch(&self, commands: Vec<Command>) {
        let world = self.get_world();
        for command in &commands {
            let response = command.apply(&world);
            if let Some(error) = response.error {
                log::warn!("command {} failed: {}", command, error);
            }
        }
    }

    /// Apply commands in order, optionally tick, and return one response
    /// per command
    pub fn apply_batch_sync(
        &self,
        commands: Vec<Command>,
        do_tick: bool,
    ) -> Result<Vec<CommandResponse>, EngineError> {
        let world = self.get_world();
        let responses = commands.iter().map(|command| command.apply(&world)).collect();
        if do_tick {
            world.tick(self.get_timeout())?;
        }
        Ok(responses)
    }

    /// The traffic manager on `port`, started on first use
    pub fn get_trafficmanager(&self, port: u16) -> TrafficManager {
        self.server.traffic.get(port)
    }

    pub fn get_client_version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    pub fn get_server_version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Client(host={}, port={})", self.config.host, self.config.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clients_on_same_address_share_world() {
        let a = Client::new("localhost", 3001).unwrap();
        let b = Client::new("localhost", 3001).unwrap();
        let c = Client::new("localhost", 3002).unwrap();
        assert_eq!(a.get_world().id(), b.get_world().id());
        assert_ne!(a.get_world().id(), c.get_world().id());
    }

    #[test]
    fn test_load_unknown_map_keeps_episode() {
        let client = Client::new("localhost", 3003).unwrap();
        let before = client.get_world().id();
        let err = client.load_world("Atlantis").unwrap_err();
        assert_eq!(err, EngineError::MapNotFound("Atlantis".to_string()));
        assert_eq!(client.get_world().id(), before);
    }

    #[test]
    fn test_stopped_simulator_is_forgotten() {
        let client = Client::new("localhost", 3005).unwrap();
        assert!(Server::is_registered("localhost", 3005));
        drop(client);

        let _other = Client::new("localhost", 3006).unwrap();
        assert!(!Server::is_registered("localhost", 3005));
        assert!(Server::is_registered("localhost", 3006));
    }

    #[test]
    fn test_set_timeout() {
        let mut client = Client::new("localhost", 3004).unwrap();
        client.set_timeout(Duration::from_millis(250));
        assert_eq!(client.get_timeout(), Duration::from_millis(250));
    }
}

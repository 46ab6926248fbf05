//! Demo backend that runs a synthetic ring-road simulation in-process
//!
//! Cars are spread around a periodic track and follow the car ahead,
//! keeping a safe gap. The tracked car cycles through a speed profile of
//! cruising, braking, crawling and accelerating phases so the speed chart
//! has something to show. Like the real service, every fetch advances the
//! simulation by exactly one step.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tsv_core::{Provisioned, SimulationBackend, Snapshot, SyncError, TrackGeometry, Vehicle, VehicleId};

// =============================================================================
// Speed profile of the tracked car: a repeating sequence of phases
// =============================================================================

#[derive(Clone, Copy)]
enum PhaseKind {
    Cruise, // Holding speed
    Brake,  // Slowing down for a jam
    Crawl,  // Stop-and-go
    Accel,  // Pulling away
}

#[derive(Clone, Copy)]
struct ProfilePhase {
    kind: PhaseKind,
    ticks: u32,        // duration of the phase in simulation steps
    target_speed: f64, // model units per tick at end of phase
}

/// ~100 tick cycle
fn demo_profile() -> Vec<ProfilePhase> {
    vec![
        ProfilePhase { kind: PhaseKind::Cruise, ticks: 30, target_speed: 0.8 },
        ProfilePhase { kind: PhaseKind::Brake,  ticks: 10, target_speed: 0.25 },
        ProfilePhase { kind: PhaseKind::Crawl,  ticks: 20, target_speed: 0.15 },
        ProfilePhase { kind: PhaseKind::Accel,  ticks: 15, target_speed: 0.6 },
        ProfilePhase { kind: PhaseKind::Cruise, ticks: 25, target_speed: 0.9 },
    ]
}

fn profile_speed(profile: &[ProfilePhase], tick: u64) -> f64 {
    let cycle: u64 = profile.iter().map(|p| p.ticks as u64).sum();
    if cycle == 0 {
        return 0.0;
    }
    let t = tick % cycle;

    let mut elapsed = 0_u64;
    for (i, phase) in profile.iter().enumerate() {
        let end = elapsed + phase.ticks as u64;
        if t < end {
            let prev_target = if i > 0 {
                profile[i - 1].target_speed
            } else {
                profile[profile.len() - 1].target_speed
            };
            let phase_t = (t - elapsed) as f64 / phase.ticks.max(1) as f64;
            let eased = match phase.kind {
                PhaseKind::Cruise | PhaseKind::Accel => smoothstep(phase_t),
                PhaseKind::Brake => phase_t.sqrt(), // bites early
                PhaseKind::Crawl => phase_t,
            };
            return lerp(prev_target, phase.target_speed, eased);
        }
        elapsed = end;
    }

    profile[profile.len() - 1].target_speed
}

fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Simple deterministic noise from a seed
fn noise(seed: f64) -> f64 {
    let x = (seed * 12.9898 + 78.233).sin() * 43_758.547;
    x - x.floor()
}

/// Small jitter centered around 0
fn jitter(seed: f64, amplitude: f64) -> f64 {
    (noise(seed) - 0.5) * 2.0 * amplitude
}

// =============================================================================
// Ring-road simulation
// =============================================================================

const MAX_SPEED: f64 = 1.0;
const ACCEL: f64 = 0.05;
const BRAKE: f64 = 0.15;
const SAFE_GAP: f64 = 1.5;
const MIN_GAP: f64 = 0.5;

#[derive(Clone, Copy)]
struct DemoCar {
    id: VehicleId,
    x: f64,
    v: f64,
    cruise: f64,
}

struct DemoSimulation {
    cars: Vec<DemoCar>,
    tick: u64,
}

impl DemoSimulation {
    fn new(config: &DemoConfig, seed: f64) -> Self {
        let count = config.car_count.max(1);
        let spacing = config.extent_x / count as f64;
        let cars = (0..count)
            .map(|i| {
                let n = seed + i as f64;
                DemoCar {
                    id: i as VehicleId + 1,
                    x: (i as f64 * spacing + jitter(n, spacing * 0.1)).rem_euclid(config.extent_x),
                    v: 0.0,
                    cruise: (0.7 + jitter(n * 1.1, 0.2)).clamp(0.2, MAX_SPEED),
                }
            })
            .collect();

        Self { cars, tick: 0 }
    }

    fn step(&mut self, config: &DemoConfig, profile: &[ProfilePhase]) {
        self.tick += 1;
        let extent = config.extent_x;
        let tracked_speed = profile_speed(profile, self.tick);

        // Speeds are decided against the positions before anyone moves.
        let speeds: Vec<f64> = self
            .cars
            .iter()
            .map(|car| {
                let gap = self.gap_ahead(car, extent);
                let desired = if car.id == config.tracked_id {
                    tracked_speed
                } else {
                    car.cruise + jitter(self.tick as f64 + car.id as f64 * 7.0, 0.05)
                };

                let mut v = if car.v < desired {
                    (car.v + ACCEL).min(desired)
                } else {
                    (car.v - BRAKE).max(desired)
                };
                if gap < SAFE_GAP {
                    v -= BRAKE;
                }
                v.min(gap - MIN_GAP).clamp(0.0, MAX_SPEED)
            })
            .collect();

        for (car, v) in self.cars.iter_mut().zip(speeds) {
            car.v = v;
            car.x = (car.x + v).rem_euclid(extent);
        }
    }

    /// Free road ahead of `car` up to the next car on the ring
    fn gap_ahead(&self, car: &DemoCar, extent: f64) -> f64 {
        self.cars
            .iter()
            .filter(|other| other.id != car.id)
            .map(|other| (other.x - car.x).rem_euclid(extent))
            .fold(extent, f64::min)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.cars.iter().map(|car| Vehicle::new(car.id, car.x)).collect())
    }
}

// =============================================================================
// DemoBackend
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct DemoConfig {
    pub extent_x: f64,
    pub car_count: usize,
    pub tracked_id: VehicleId,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            extent_x: TrackGeometry::DEFAULT_EXTENT_X,
            car_count: 6,
            tracked_id: TrackGeometry::DEFAULT_TRACKED_ID,
        }
    }
}

pub struct DemoBackend {
    config: DemoConfig,
    profile: Vec<ProfilePhase>,
    simulations: Mutex<HashMap<String, DemoSimulation>>,
    next_id: AtomicU64,
}

impl DemoBackend {
    pub fn new() -> Self {
        Self::with_config(DemoConfig::default())
    }

    pub fn with_config(config: DemoConfig) -> Self {
        Self {
            config,
            profile: demo_profile(),
            simulations: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    /// Number of simulations created so far
    pub async fn simulation_count(&self) -> usize {
        self.simulations.lock().await.len()
    }
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SimulationBackend for DemoBackend {
    fn name(&self) -> &str {
        "Demo"
    }

    async fn create_simulation(&self) -> Result<Provisioned, SyncError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let simulation = DemoSimulation::new(&self.config, id as f64 * 31.0);
        let location = format!("/simulations/{}", id);
        let cars = simulation.snapshot().cars;

        self.simulations
            .lock()
            .await
            .insert(location.clone(), simulation);

        Ok(Provisioned { location, cars })
    }

    async fn fetch_snapshot(&self, location: &str) -> Result<Snapshot, SyncError> {
        let mut simulations = self.simulations.lock().await;
        let simulation = simulations.get_mut(location).ok_or_else(|| SyncError::Status {
            status: 404,
            url: location.to_string(),
        })?;

        simulation.step(&self.config, &self.profile);
        Ok(simulation.snapshot())
    }
}

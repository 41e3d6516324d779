use colored::Colorize;
use rand::Rng;
use std::error::Error;

use passthrough_tap::config::Config;
use passthrough_tap::session::BatteryReading;
use passthrough_tap::{Sample, SessionEvent};

use super::console::console_session;
use super::replay::drive;

const GRAVITY: f32 = 9.75;

/// Synthetic accelerometer stream: gravity on z, uniform noise on every axis
/// and a jolt on all three axes at each scripted tap index.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub samples: usize,
    pub step_ns: i64,
    pub noise: f32,
    pub tap_amplitude: f32,
    pub taps: Vec<usize>,
}

impl Default for SimulationPlan {
    fn default() -> Self {
        Self {
            samples: 200,
            step_ns: 50_000_000,
            noise: 0.01,
            tap_amplitude: 1.8,
            // two double taps, 300 ms apart each
            taps: vec![30, 36, 120, 126],
        }
    }
}

impl SimulationPlan {
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Vec<Sample> {
        (0..self.samples)
            .map(|i| {
                let mut values = [
                    rng.gen_range(-self.noise..=self.noise),
                    rng.gen_range(-self.noise..=self.noise),
                    GRAVITY + rng.gen_range(-self.noise..=self.noise),
                ];
                if self.taps.contains(&i) {
                    for value in values.iter_mut() {
                        *value += self.tap_amplitude;
                    }
                }
                Sample::new(i as i64 * self.step_ns, values)
            })
            .collect()
    }
}

pub fn run(config: &Config) -> Result<(), Box<dyn Error>> {
    let plan = SimulationPlan::default();
    let samples = plan.generate(&mut rand::thread_rng());

    let mut session = console_session(config);
    session.dispatch(SessionEvent::Resume)?;
    session.dispatch(SessionEvent::Battery(BatteryReading {
        level: 80,
        scale: 100,
        plugged: 0,
    }))?;

    let toggles = drive(&mut session, &samples)?;
    session.dispatch(SessionEvent::Destroy)?;

    let expected = plan.taps.len() / 2;
    let summary = format!("{} of {} double taps detected", toggles.len(), expected);
    if toggles.len() == expected {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.red());
    }
    Ok(())
}

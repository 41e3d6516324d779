use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use passthrough_tap::config::Config;
use passthrough_tap::{DispatchOutcome, PassthroughError, Sample, SessionEvent};

use super::console::{console_session, ConsoleSession};

const TRIGGERS_FILE: &str = "triggers.csv";

#[derive(Debug, Deserialize)]
struct SampleRecord {
    timestamp_ns: i64,
    x: f32,
    y: f32,
    z: f32,
}

/// One passthrough flip caused by a detected double tap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToggleRecord {
    pub timestamp_ns: i64,
    pub passthrough: bool,
}

pub fn read_samples<R: Read>(reader: R) -> Result<Vec<Sample>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut samples = Vec::new();
    for result in rdr.deserialize() {
        let record: SampleRecord = result?;
        samples.push(Sample::new(record.timestamp_ns, [record.x, record.y, record.z]));
    }
    Ok(samples)
}

pub fn write_toggles<P: AsRef<Path>>(path: P, toggles: &[ToggleRecord]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_path(path)?;
    for toggle in toggles {
        wtr.serialize(toggle)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Feeds samples to a resumed session and collects the passthrough flips.
pub fn drive(
    session: &mut ConsoleSession,
    samples: &[Sample],
) -> Result<Vec<ToggleRecord>, PassthroughError> {
    let mut toggles = Vec::new();
    for sample in samples {
        if let DispatchOutcome::PassthroughChanged(passthrough) =
            session.dispatch(SessionEvent::Sensor(*sample))?
        {
            toggles.push(ToggleRecord {
                timestamp_ns: sample.timestamp,
                passthrough,
            });
        }
    }
    Ok(toggles)
}

pub fn run<P: AsRef<Path>>(samples_path: P, config: &Config) -> Result<(), Box<dyn Error>> {
    let samples_path = samples_path.as_ref();
    if !samples_path.exists() {
        eprintln!("Error: sample file not found at path: {}", samples_path.display());
        return Err(format!("sample file not found: {}", samples_path.display()).into());
    }

    let samples = read_samples(File::open(samples_path)?)?;
    println!("Loaded {} samples from {}", samples.len(), samples_path.display());

    let mut session = console_session(config);
    session.dispatch(SessionEvent::Resume)?;

    let start_time = Instant::now();
    let toggles = drive(&mut session, &samples)?;
    let duration = start_time.elapsed();

    session.dispatch(SessionEvent::Destroy)?;

    for toggle in &toggles {
        let label = if toggle.passthrough { "ON".green() } else { "OFF".red() };
        println!("{:>16} ns  passthrough {}", toggle.timestamp_ns, label);
    }
    write_toggles(TRIGGERS_FILE, &toggles)?;
    println!(
        "Processed {} samples in {:?}, {} toggles written to {}",
        samples.len(),
        duration,
        toggles.len(),
        TRIGGERS_FILE
    );
    Ok(())
}

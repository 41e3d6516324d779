use colored::Colorize;

use passthrough_tap::config::{Config, PreferenceStore};
use passthrough_tap::passthrough::{
    CameraDevice, CameraError, HeadsetLink, NativeOverlay, PassthroughController, PreviewRequest,
    Resolution, SensorSource,
};
use passthrough_tap::utils::log::log_to_file;
use passthrough_tap::Session;

const HEADSET_LOG: &str = "headset.log";

/// Preview sizes a typical phone camera reports.
pub const PHONE_PREVIEW_SIZES: [Resolution; 6] = [
    Resolution::new(1920, 1080),
    Resolution::new(1440, 1080),
    Resolution::new(1280, 720),
    Resolution::new(960, 720),
    Resolution::new(640, 480),
    Resolution::new(320, 240),
];

pub type ConsoleSession =
    Session<ConsoleCamera, ConsoleOverlay, PreferenceStore, ConsoleSensor, ConsoleHeadset>;

/// Camera stand-in that prints what a real device would be asked to do.
#[derive(Debug, Default)]
pub struct ConsoleCamera {
    open: bool,
    pub opened: usize,
}

impl CameraDevice for ConsoleCamera {
    fn open(&mut self, request: &PreviewRequest) -> Result<Resolution, CameraError> {
        if self.open {
            return Err(CameraError::AlreadyOpen);
        }
        let size = request.choose(&PHONE_PREVIEW_SIZES)?;
        self.open = true;
        self.opened += 1;
        println!(
            "{} requested {}x{}, preview {}",
            "[camera]".cyan(),
            request.desired_width,
            request.desired_height,
            size
        );
        Ok(size)
    }

    fn start_preview(&mut self) -> Result<(), CameraError> {
        println!("{} preview started", "[camera]".cyan());
        Ok(())
    }

    fn stop_preview(&mut self) {
        println!("{} preview stopped", "[camera]".cyan());
    }

    fn release(&mut self) {
        self.open = false;
        println!("{} released", "[camera]".cyan());
    }
}

#[derive(Debug, Default)]
pub struct ConsoleOverlay {
    active: bool,
}

impl NativeOverlay for ConsoleOverlay {
    fn set_passthrough_active(&mut self, active: bool) {
        if active != self.active {
            let label = if active { "ON".green() } else { "OFF".red() };
            println!("{} passthrough {}", "[overlay]".magenta(), label);
        }
        self.active = active;
    }

    fn set_passthrough_size(&mut self, fraction: f32) {
        println!("{} camera plane {:.2}", "[overlay]".magenta(), fraction);
    }
}

#[derive(Debug, Default)]
pub struct ConsoleSensor {
    pub registered: bool,
}

impl SensorSource for ConsoleSensor {
    fn register(&mut self) {
        self.registered = true;
        log::debug!("accelerometer registered");
    }

    fn unregister(&mut self) {
        self.registered = false;
        log::debug!("accelerometer unregistered");
    }
}

/// Headset side of the client; battery updates also go to `logs/headset.log`.
#[derive(Debug, Default)]
pub struct ConsoleHeadset;

impl ConsoleHeadset {
    fn record(&self, message: &str) {
        if let Err(e) = log_to_file(HEADSET_LOG, message) {
            log::warn!("could not write {}: {}", HEADSET_LOG, e);
        }
    }
}

impl HeadsetLink for ConsoleHeadset {
    fn pause(&mut self) {
        self.record("pause");
    }

    fn resume(&mut self) {
        self.record("resume");
    }

    fn send_battery_level(&mut self, level: f32, plugged: bool) {
        self.record(&format!("battery {:.2} plugged {}", level, plugged));
    }

    fn switch_viewer(&mut self) {
        println!("{} switch viewer", "[headset]".yellow());
        self.record("switch viewer");
    }
}

pub fn console_session(config: &Config) -> ConsoleSession {
    let controller = PassthroughController::new(
        ConsoleCamera::default(),
        ConsoleOverlay::default(),
        config.preferences.clone(),
        config.display,
    );
    Session::new(
        config.processor.clone(),
        controller,
        ConsoleSensor::default(),
        ConsoleHeadset,
    )
}

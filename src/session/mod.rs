//! Session lifecycle: every platform callback becomes a [`SessionEvent`] and
//! goes through [`Session::dispatch`].

use crate::config::preferences::{keys, read_bool, ConfigStore};
use crate::config::ProcessorConfig;
use crate::error::PassthroughError;
use crate::passthrough::controller::PassthroughController;
use crate::passthrough::devices::{CameraDevice, HeadsetLink, NativeOverlay, SensorSource};
use crate::processing::detectors::tap_gesture::DetectorConfig;
use crate::processing::detectors::Sample;
use crate::processing::signal_processor::SensorProcessor;

/// Charger codes reported with a battery reading.
pub mod plug {
    pub const AC: i32 = 1;
    pub const USB: i32 = 2;
    pub const WIRELESS: i32 = 4;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryReading {
    pub level: i32,
    pub scale: i32,
    pub plugged: i32,
}

impl BatteryReading {
    /// Charge between 0 and 1, or `None` for a reading without a usable scale.
    pub fn fraction(&self) -> Option<f32> {
        (self.scale > 0).then(|| self.level as f32 / self.scale as f32)
    }

    pub fn is_plugged(&self) -> bool {
        matches!(self.plugged, plug::AC | plug::USB | plug::WIRELESS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    SwitchViewer,
    PassthroughSettings,
    TogglePassthrough,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Resume,
    Pause,
    Destroy,
    Sensor(Sample),
    Battery(BatteryReading),
    Menu(MenuAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    Ignored,
    /// The settings screen should be shown.
    OpenSettings,
    PassthroughChanged(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Running,
    Paused,
    Destroyed,
}

pub struct Session<C, O, S, Src, H>
where
    C: CameraDevice,
    O: NativeOverlay,
    S: ConfigStore,
    Src: SensorSource,
    H: HeadsetLink,
{
    processor: SensorProcessor,
    controller: PassthroughController<C, O, S>,
    sensor: Src,
    headset: H,
    lifecycle: Lifecycle,
    tap_enabled: bool,
}

impl<C, O, S, Src, H> Session<C, O, S, Src, H>
where
    C: CameraDevice,
    O: NativeOverlay,
    S: ConfigStore,
    Src: SensorSource,
    H: HeadsetLink,
{
    pub fn new(
        processor_config: ProcessorConfig,
        controller: PassthroughController<C, O, S>,
        sensor: Src,
        headset: H,
    ) -> Self {
        Self {
            processor: SensorProcessor::with_tap_detector(
                processor_config,
                DetectorConfig::default(),
            ),
            controller,
            sensor,
            headset,
            lifecycle: Lifecycle::Created,
            tap_enabled: false,
        }
    }

    pub fn controller(&self) -> &PassthroughController<C, O, S> {
        &self.controller
    }

    pub fn processor(&self) -> &SensorProcessor {
        &self.processor
    }

    pub fn sensor(&self) -> &Src {
        &self.sensor
    }

    pub fn headset(&self) -> &H {
        &self.headset
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    pub fn tap_enabled(&self) -> bool {
        self.tap_enabled
    }

    pub fn dispatch(&mut self, event: SessionEvent) -> Result<DispatchOutcome, PassthroughError> {
        if self.lifecycle == Lifecycle::Destroyed {
            return Err(PassthroughError::SessionFinished);
        }

        match event {
            SessionEvent::Resume => {
                self.resume();
                Ok(DispatchOutcome::Handled)
            }
            SessionEvent::Pause => {
                self.pause();
                Ok(DispatchOutcome::Handled)
            }
            SessionEvent::Destroy => {
                if self.lifecycle == Lifecycle::Running {
                    self.pause();
                } else {
                    self.controller.pause();
                }
                self.lifecycle = Lifecycle::Destroyed;
                log::info!("session destroyed");
                Ok(DispatchOutcome::Handled)
            }
            SessionEvent::Sensor(sample) => self.on_sample(&sample),
            SessionEvent::Battery(reading) => Ok(self.on_battery(reading)),
            SessionEvent::Menu(action) => self.on_menu(action),
        }
    }

    fn resume(&mut self) {
        self.controller.resume();
        let (detector_config, tap_enabled) = self.controller.with_store(|store| {
            (
                DetectorConfig::from_store(store),
                read_bool(store, keys::PASSTHROUGH_TAP, true),
            )
        });

        self.processor.set_detector_config(detector_config);
        self.processor.reset();
        self.tap_enabled = tap_enabled;
        if tap_enabled {
            self.sensor.register();
        } else {
            self.sensor.unregister();
        }
        self.headset.resume();
        self.lifecycle = Lifecycle::Running;
        log::info!(
            "session resumed (tap detection {}, {:?})",
            if tap_enabled { "on" } else { "off" },
            detector_config
        );
    }

    fn pause(&mut self) {
        self.controller.pause();
        self.sensor.unregister();
        self.headset.pause();
        self.lifecycle = Lifecycle::Paused;
        log::info!("session paused");
    }

    fn on_sample(&mut self, sample: &Sample) -> Result<DispatchOutcome, PassthroughError> {
        if !self.is_running() || !self.tap_enabled {
            return Ok(DispatchOutcome::Ignored);
        }

        let mut outcome = DispatchOutcome::Handled;
        for event in self.processor.process_sample(sample) {
            let active = self.controller.on_trigger(&event)?;
            outcome = DispatchOutcome::PassthroughChanged(active);
        }
        Ok(outcome)
    }

    fn on_battery(&mut self, reading: BatteryReading) -> DispatchOutcome {
        if !self.is_running() {
            return DispatchOutcome::Ignored;
        }
        let Some(level) = reading.fraction() else {
            log::warn!("skipping battery reading with scale {}", reading.scale);
            return DispatchOutcome::Ignored;
        };
        let plugged = reading.is_plugged();
        self.headset.send_battery_level(level, plugged);
        log::debug!("Battery level changed: {}, plugged in: {}", level, plugged);
        DispatchOutcome::Handled
    }

    fn on_menu(&mut self, action: MenuAction) -> Result<DispatchOutcome, PassthroughError> {
        match action {
            MenuAction::SwitchViewer => {
                self.headset.switch_viewer();
                Ok(DispatchOutcome::Handled)
            }
            MenuAction::PassthroughSettings => Ok(DispatchOutcome::OpenSettings),
            MenuAction::TogglePassthrough => {
                if !self.is_running() {
                    return Ok(DispatchOutcome::Ignored);
                }
                let active = self.controller.toggle()?;
                Ok(DispatchOutcome::PassthroughChanged(active))
            }
        }
    }
}

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::devices::{CameraDevice, CameraError, NativeOverlay, PreviewRequest};
use super::preview_size::{PreviewSizeSelector, Resolution};
use crate::config::preferences::{keys, read_bool, read_parsed, ConfigStore};
use crate::config::DisplayConfig;
use crate::error::PassthroughError;
use crate::processing::detectors::TriggerEvent;

pub const DEFAULT_FRACTION: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughState {
    Inactive,
    Active,
}

/// Settings read from the store on every activation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    pub recording_hint: bool,
    pub fraction: f32,
}

impl ControllerSettings {
    pub fn from_store<S: ConfigStore + ?Sized>(store: &S) -> Self {
        Self {
            recording_hint: read_bool(store, keys::PASSTHROUGH_RECORDING, true),
            fraction: read_parsed(store, keys::PASSTHROUGH_FRACTION, DEFAULT_FRACTION, |v| {
                v.is_finite()
            }),
        }
    }
}

/// Preview size requested for a display: half the long edge by the short edge,
/// one eye's share of a landscape screen.
pub fn preview_target(display: DisplayConfig) -> (u32, u32) {
    if display.width < display.height {
        (display.height / 2, display.width)
    } else {
        (display.width / 2, display.height)
    }
}

struct Inner<C, O, S> {
    camera: C,
    overlay: O,
    store: S,
    state: PassthroughState,
    preview_size: Option<Resolution>,
}

impl<C: CameraDevice, O: NativeOverlay, S: ConfigStore> Inner<C, O, S> {
    fn transition(
        &mut self,
        target: PassthroughState,
        display: DisplayConfig,
        selector: PreviewSizeSelector,
    ) -> Result<(), CameraError> {
        match (self.state, target) {
            (PassthroughState::Inactive, PassthroughState::Active) => {
                let size = self.activate(display, selector)?;
                self.preview_size = Some(size);
                self.state = PassthroughState::Active;
                log::info!("passthrough on, preview {}", size);
            }
            (PassthroughState::Active, PassthroughState::Inactive) => {
                self.overlay.set_passthrough_active(false);
                self.release_camera();
                log::info!("passthrough off");
            }
            _ => log::debug!("passthrough already {:?}", target),
        }
        Ok(())
    }

    fn activate(
        &mut self,
        display: DisplayConfig,
        selector: PreviewSizeSelector,
    ) -> Result<Resolution, CameraError> {
        let settings = ControllerSettings::from_store(&self.store);
        let (desired_width, desired_height) = preview_target(display);
        let request = PreviewRequest {
            desired_width,
            desired_height,
            recording_hint: settings.recording_hint,
            selector,
        };

        let size = match self.camera.open(&request) {
            Ok(size) => size,
            Err(CameraError::AlreadyOpen) => return Err(CameraError::AlreadyOpen),
            Err(e) => {
                // the camera may have been acquired before size selection failed
                self.camera.release();
                return Err(e);
            }
        };
        log::debug!("PreviewSize: {}", size);

        self.overlay.set_passthrough_size(settings.fraction);
        self.overlay.set_passthrough_active(true);

        if let Err(e) = self.camera.start_preview() {
            self.overlay.set_passthrough_active(false);
            self.camera.release();
            return Err(e);
        }
        Ok(size)
    }

    fn release_camera(&mut self) {
        if self.state == PassthroughState::Active {
            self.camera.stop_preview();
            self.camera.release();
        }
        self.state = PassthroughState::Inactive;
        self.preview_size = None;
    }
}

/// Owns the passthrough on/off state and sequences the camera and overlay
/// around it.
///
/// All transitions run under one mutex, so a toggle from the sensor path and
/// one from the menu never overlap and the camera is opened at most once.
pub struct PassthroughController<C, O, S>
where
    C: CameraDevice,
    O: NativeOverlay,
    S: ConfigStore,
{
    display: DisplayConfig,
    selector: PreviewSizeSelector,
    inner: Mutex<Inner<C, O, S>>,
}

impl<C, O, S> PassthroughController<C, O, S>
where
    C: CameraDevice,
    O: NativeOverlay,
    S: ConfigStore,
{
    pub fn new(camera: C, overlay: O, store: S, display: DisplayConfig) -> Self {
        Self {
            display,
            selector: PreviewSizeSelector::default(),
            inner: Mutex::new(Inner {
                camera,
                overlay,
                store,
                state: PassthroughState::Inactive,
                preview_size: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<C, O, S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> PassthroughState {
        self.lock().state
    }

    pub fn is_active(&self) -> bool {
        self.state() == PassthroughState::Active
    }

    /// Resolution chosen for the current activation.
    pub fn preview_size(&self) -> Option<Resolution> {
        self.lock().preview_size
    }

    pub fn with_store<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.lock().store)
    }

    pub fn with_store_mut<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.lock().store)
    }

    /// Inspects the collaborators, mainly for tests and diagnostics.
    pub fn with_devices<R>(&self, f: impl FnOnce(&C, &O) -> R) -> R {
        let inner = self.lock();
        f(&inner.camera, &inner.overlay)
    }

    /// Moves to the requested state. Asking for the current state is a no-op.
    pub fn set_active(&self, active: bool) -> Result<(), PassthroughError> {
        let mut inner = self.lock();
        self.apply(&mut inner, active)
    }

    /// Flips the persisted `passthrough` flag and follows it.
    /// Returns the new state.
    pub fn toggle(&self) -> Result<bool, PassthroughError> {
        let mut inner = self.lock();
        let target = !read_bool(&inner.store, keys::PASSTHROUGH, false);
        self.apply(&mut inner, target)?;
        Ok(target)
    }

    pub fn on_trigger(&self, event: &TriggerEvent) -> Result<bool, PassthroughError> {
        log::debug!(
            "toggle requested by {} at {}",
            event.detector_id,
            event.timestamp
        );
        self.toggle()
    }

    /// Forces passthrough off and releases the camera, whatever the state.
    pub fn pause(&self) {
        let mut inner = self.lock();
        inner.overlay.set_passthrough_active(false);
        inner.release_camera();
        inner.store.put_bool(keys::PASSTHROUGH, false);
    }

    /// Passthrough always starts off after a resume.
    pub fn resume(&self) {
        self.lock().store.put_bool(keys::PASSTHROUGH, false);
    }

    fn apply(
        &self,
        inner: &mut Inner<C, O, S>,
        active: bool,
    ) -> Result<(), PassthroughError> {
        let target = if active {
            PassthroughState::Active
        } else {
            PassthroughState::Inactive
        };
        inner.store.put_bool(keys::PASSTHROUGH, active);
        if let Err(e) = inner.transition(target, self.display, self.selector) {
            log::warn!("passthrough transition failed: {}", e);
            inner.store.put_bool(keys::PASSTHROUGH, false);
            return Err(e.into());
        }
        Ok(())
    }
}

impl<C, O, S> Drop for PassthroughController<C, O, S>
where
    C: CameraDevice,
    O: NativeOverlay,
    S: ConfigStore,
{
    fn drop(&mut self) {
        let inner = self
            .inner
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if inner.state == PassthroughState::Active {
            inner.overlay.set_passthrough_active(false);
            inner.release_camera();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PreferenceStore;
    use std::sync::{Arc, Mutex as StdMutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Open { width: u32, height: u32, hint: bool },
        StartPreview,
        StopPreview,
        Release,
        Active(bool),
        Size(f32),
    }

    type Log = Arc<StdMutex<Vec<Call>>>;

    struct FakeCamera {
        log: Log,
        sizes: Vec<Resolution>,
        open: bool,
        fail_open: bool,
        fail_preview: bool,
    }

    impl CameraDevice for FakeCamera {
        fn open(&mut self, request: &PreviewRequest) -> Result<Resolution, CameraError> {
            self.log.lock().unwrap().push(Call::Open {
                width: request.desired_width,
                height: request.desired_height,
                hint: request.recording_hint,
            });
            if self.open {
                return Err(CameraError::AlreadyOpen);
            }
            if self.fail_open {
                return Err(CameraError::Unavailable);
            }
            self.open = true;
            Ok(request.choose(&self.sizes)?)
        }

        fn start_preview(&mut self) -> Result<(), CameraError> {
            self.log.lock().unwrap().push(Call::StartPreview);
            if self.fail_preview {
                return Err(CameraError::PreviewAttach("no texture".into()));
            }
            Ok(())
        }

        fn stop_preview(&mut self) {
            self.log.lock().unwrap().push(Call::StopPreview);
        }

        fn release(&mut self) {
            self.log.lock().unwrap().push(Call::Release);
            self.open = false;
        }
    }

    struct FakeOverlay {
        log: Log,
    }

    impl NativeOverlay for FakeOverlay {
        fn set_passthrough_active(&mut self, active: bool) {
            self.log.lock().unwrap().push(Call::Active(active));
        }

        fn set_passthrough_size(&mut self, fraction: f32) {
            self.log.lock().unwrap().push(Call::Size(fraction));
        }
    }

    fn camera(log: &Log) -> FakeCamera {
        FakeCamera {
            log: log.clone(),
            sizes: vec![
                Resolution::new(640, 480),
                Resolution::new(1280, 720),
                Resolution::new(1920, 1080),
            ],
            open: false,
            fail_open: false,
            fail_preview: false,
        }
    }

    fn controller(
        camera: FakeCamera,
        log: &Log,
        store: PreferenceStore,
    ) -> PassthroughController<FakeCamera, FakeOverlay, PreferenceStore> {
        let display = DisplayConfig {
            width: 2400,
            height: 1080,
        };
        PassthroughController::new(camera, FakeOverlay { log: log.clone() }, store, display)
    }

    fn count(log: &Log, call: &Call) -> usize {
        log.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    #[test]
    fn preview_target_uses_half_the_long_edge() {
        let landscape = DisplayConfig { width: 2400, height: 1080 };
        let portrait = DisplayConfig { width: 1080, height: 2400 };
        assert_eq!(preview_target(landscape), (1200, 1080));
        assert_eq!(preview_target(portrait), (1200, 1080));
    }

    #[test]
    fn settings_fall_back_to_defaults() {
        let store = PreferenceStore::new().with_text(keys::PASSTHROUGH_FRACTION, "half");
        let settings = ControllerSettings::from_store(&store);
        assert!(settings.recording_hint);
        assert_eq!(settings.fraction, DEFAULT_FRACTION);
    }

    #[test]
    fn activation_sequence() {
        let log = Log::default();
        let store = PreferenceStore::new()
            .with_text(keys::PASSTHROUGH_FRACTION, "0.75")
            .with_bool(keys::PASSTHROUGH_RECORDING, false);
        let controller = controller(camera(&log), &log, store);

        controller.set_active(true).unwrap();

        assert!(controller.is_active());
        assert_eq!(controller.preview_size(), Some(Resolution::new(1920, 1080)));
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                Call::Open { width: 1200, height: 1080, hint: false },
                Call::Size(0.75),
                Call::Active(true),
                Call::StartPreview,
            ]
        );
        assert!(controller.with_store(|s| s.get_bool(keys::PASSTHROUGH)).unwrap());
    }

    #[test]
    fn deactivation_sequence() {
        let log = Log::default();
        let controller = controller(camera(&log), &log, PreferenceStore::new());
        controller.set_active(true).unwrap();
        log.lock().unwrap().clear();

        controller.set_active(false).unwrap();

        assert!(!controller.is_active());
        assert_eq!(controller.preview_size(), None);
        assert_eq!(
            *log.lock().unwrap(),
            vec![Call::Active(false), Call::StopPreview, Call::Release]
        );
    }

    #[test]
    fn same_state_requests_are_no_ops() {
        let log = Log::default();
        let controller = controller(camera(&log), &log, PreferenceStore::new());
        controller.set_active(false).unwrap();
        assert!(log.lock().unwrap().is_empty());

        controller.set_active(true).unwrap();
        controller.set_active(true).unwrap();
        let opens = log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, Call::Open { .. }))
            .count();
        assert_eq!(opens, 1);
    }

    #[test]
    fn toggle_follows_persisted_flag() {
        let log = Log::default();
        let controller = controller(camera(&log), &log, PreferenceStore::new());
        assert!(controller.toggle().unwrap());
        assert!(controller.is_active());
        assert!(!controller.toggle().unwrap());
        assert!(!controller.is_active());
        assert_eq!(controller.with_store(|s| s.get_bool(keys::PASSTHROUGH)), Some(false));
    }

    #[test]
    fn pause_after_activate_releases_once() {
        let log = Log::default();
        let controller = controller(camera(&log), &log, PreferenceStore::new());
        controller.set_active(true).unwrap();

        controller.pause();
        drop(controller);

        assert_eq!(count(&log, &Call::Release), 1);
        assert_eq!(log.lock().unwrap().last(), Some(&Call::Release));
    }

    #[test]
    fn pause_while_inactive_only_resets_overlay() {
        let log = Log::default();
        let controller = controller(camera(&log), &log, PreferenceStore::new());
        controller.pause();
        assert_eq!(*log.lock().unwrap(), vec![Call::Active(false)]);
    }

    #[test]
    fn drop_releases_held_camera() {
        let log = Log::default();
        let controller = controller(camera(&log), &log, PreferenceStore::new());
        controller.set_active(true).unwrap();
        drop(controller);
        assert_eq!(count(&log, &Call::Release), 1);
        assert_eq!(count(&log, &Call::Active(false)), 1);
    }

    #[test]
    fn failed_preview_releases_camera() {
        let log = Log::default();
        let mut cam = camera(&log);
        cam.fail_preview = true;
        let controller = controller(cam, &log, PreferenceStore::new());

        let err = controller.toggle().unwrap_err();

        assert!(matches!(err, PassthroughError::Camera(CameraError::PreviewAttach(_))));
        assert!(!controller.is_active());
        assert_eq!(count(&log, &Call::Release), 1);
        assert_eq!(log.lock().unwrap().last(), Some(&Call::Release));
        assert_eq!(controller.with_store(|s| s.get_bool(keys::PASSTHROUGH)), Some(false));

        // nothing left to release later
        drop(controller);
        assert_eq!(count(&log, &Call::Release), 1);
    }

    #[test]
    fn unavailable_camera_is_reported() {
        let log = Log::default();
        let mut cam = camera(&log);
        cam.fail_open = true;
        let controller = controller(cam, &log, PreferenceStore::new());

        let err = controller.set_active(true).unwrap_err();
        assert!(matches!(err, PassthroughError::Camera(CameraError::Unavailable)));
        assert!(!controller.is_active());
        assert_eq!(count(&log, &Call::Active(true)), 0);
    }

    #[test]
    fn camera_without_sizes_is_a_selection_error() {
        let log = Log::default();
        let mut cam = camera(&log);
        cam.sizes.clear();
        let controller = controller(cam, &log, PreferenceStore::new());

        let err = controller.set_active(true).unwrap_err();
        assert!(matches!(err, PassthroughError::Camera(CameraError::Selection(_))));
        // opened before selection failed, so released again
        assert_eq!(count(&log, &Call::Release), 1);
    }

    #[test]
    fn camera_opened_elsewhere_is_not_released() {
        let log = Log::default();
        let mut cam = camera(&log);
        cam.open = true;
        let controller = controller(cam, &log, PreferenceStore::new());

        let err = controller.set_active(true).unwrap_err();
        assert!(matches!(err, PassthroughError::Camera(CameraError::AlreadyOpen)));
        assert_eq!(count(&log, &Call::Release), 0);
    }

    #[test]
    fn resume_clears_persisted_flag() {
        let log = Log::default();
        let store = PreferenceStore::new().with_bool(keys::PASSTHROUGH, true);
        let controller = controller(camera(&log), &log, store);
        controller.resume();
        assert_eq!(controller.with_store(|s| s.get_bool(keys::PASSTHROUGH)), Some(false));
    }

    #[test]
    fn controller_is_shareable_between_threads() {
        let log = Log::default();
        let controller = Arc::new(controller(camera(&log), &log, PreferenceStore::new()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let controller = Arc::clone(&controller);
                std::thread::spawn(move || {
                    controller.toggle().unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        // four toggles end where they started
        assert!(!controller.is_active());
        let opens = log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, Call::Open { .. }))
            .count();
        assert_eq!(opens, 2);
        assert_eq!(count(&log, &Call::Release), 2);
    }
}

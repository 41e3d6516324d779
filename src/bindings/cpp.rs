use crate::passthrough::preview_size::{select_preview_size as select_size, Resolution};
use crate::processing::detectors::tap_gesture::{DetectorConfig, GestureDetector};
use crate::processing::detectors::{DetectorInstance, Sample};
use crate::processing::signal_processor::TAP_DETECTOR_ID;

use std::os::raw::c_void;
use std::slice;

#[no_mangle]
pub extern "C" fn create_gesture_detector(
    passthrough_delay_ms: i64,
    lower_bound: f32,
    higher_bound: f32,
) -> *mut c_void {
    let config = DetectorConfig {
        passthrough_delay_ms,
        lower_bound,
        higher_bound,
    };
    let detector = Box::new(GestureDetector::new(TAP_DETECTOR_ID, config));
    Box::into_raw(detector) as *mut c_void
}

#[no_mangle]
pub extern "C" fn delete_gesture_detector(detector_ptr: *mut c_void) {
    if !detector_ptr.is_null() {
        unsafe {
            drop(Box::from_raw(detector_ptr as *mut GestureDetector));
        }
    }
}

/// Returns true when the sample completes a double tap.
#[no_mangle]
pub extern "C" fn gesture_detector_ingest(
    detector_ptr: *mut c_void,
    timestamp_ns: i64,
    x: f32,
    y: f32,
    z: f32,
) -> bool {
    if detector_ptr.is_null() {
        return false;
    }
    let detector = unsafe { &mut *(detector_ptr as *mut GestureDetector) };
    detector
        .ingest(Sample::new(timestamp_ns, [x, y, z]))
        .is_some()
}

#[no_mangle]
pub extern "C" fn gesture_detector_reset(detector_ptr: *mut c_void) {
    if detector_ptr.is_null() {
        return;
    }
    let detector = unsafe { &mut *(detector_ptr as *mut GestureDetector) };
    detector.reset();
}

/// `widths` and `heights` hold `len` candidates each. On success the chosen
/// size is written to `out_width` / `out_height`.
#[no_mangle]
pub extern "C" fn select_preview_size(
    widths: *const u32,
    heights: *const u32,
    len: usize,
    desired_width: u32,
    desired_height: u32,
    out_width: *mut u32,
    out_height: *mut u32,
) -> bool {
    if widths.is_null() || heights.is_null() || out_width.is_null() || out_height.is_null() {
        return false;
    }
    let (widths, heights) = unsafe {
        (
            slice::from_raw_parts(widths, len),
            slice::from_raw_parts(heights, len),
        )
    };
    let candidates: Vec<Resolution> = widths
        .iter()
        .zip(heights)
        .map(|(&w, &h)| Resolution::new(w, h))
        .collect();

    match select_size(&candidates, desired_width, desired_height) {
        Ok(size) => {
            unsafe {
                *out_width = size.width;
                *out_height = size.height;
            }
            true
        }
        Err(e) => {
            log::warn!("select_preview_size: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    const STEP_NS: i64 = 50_000_000;

    fn feed_rest(detector: *mut c_void, from: i64, count: i64) -> Vec<i64> {
        let mut triggered = Vec::new();
        for i in from..from + count {
            if gesture_detector_ingest(detector, i * STEP_NS, 0.0, 0.0, 9.75) {
                triggered.push(i);
            }
        }
        triggered
    }

    #[test]
    fn detector_round_trip_through_raw_pointer() {
        let detector = create_gesture_detector(600, 0.8, 4.0);
        assert!(!detector.is_null());

        let mut triggered = feed_rest(detector, 0, 30);
        for i in 30..60 {
            let amp = if i == 30 || i == 36 { 1.5 } else { 0.0 };
            if gesture_detector_ingest(detector, i * STEP_NS, amp, amp, 9.75 + amp) {
                triggered.push(i);
            }
        }
        // 2150 ms
        assert_eq!(triggered, vec![43]);

        gesture_detector_reset(detector);
        assert!(feed_rest(detector, 60, 20).is_empty());
        delete_gesture_detector(detector);
    }

    #[test]
    fn null_detector_is_tolerated() {
        assert!(!gesture_detector_ingest(ptr::null_mut(), 0, 1.0, 2.0, 3.0));
        gesture_detector_reset(ptr::null_mut());
        delete_gesture_detector(ptr::null_mut());
    }

    #[test]
    fn selects_through_parallel_arrays() {
        let widths = [640u32, 1280, 1920];
        let heights = [480u32, 720, 1080];
        let (mut w, mut h) = (0u32, 0u32);
        let ok = select_preview_size(
            widths.as_ptr(),
            heights.as_ptr(),
            widths.len(),
            1000,
            500,
            &mut w,
            &mut h,
        );
        assert!(ok);
        assert_eq!((w, h), (1280, 720));
    }

    #[test]
    fn empty_or_null_selection_fails() {
        let widths: [u32; 0] = [];
        let heights: [u32; 0] = [];
        let (mut w, mut h) = (7u32, 7u32);
        assert!(!select_preview_size(
            widths.as_ptr(),
            heights.as_ptr(),
            0,
            640,
            480,
            &mut w,
            &mut h
        ));
        assert_eq!((w, h), (7, 7));
        assert!(!select_preview_size(
            ptr::null(),
            ptr::null(),
            3,
            640,
            480,
            &mut w,
            &mut h
        ));
    }
}

//! C FFI — lets a C/C++ notation host compile scores without a Rust toolchain
//! on its side.
//!
//! Scores and configuration cross the boundary as UTF-8 JSON (see
//! [`Score`](crate::Score) and [`SynthConfig`](crate::SynthConfig)).
//!
//! ## Memory contract
//!
//! | Function                    | Caller frees with          |
//! |-----------------------------|----------------------------|
//! | [`singtalk_singer_load`]    | [`singtalk_singer_free`]   |
//! | [`singtalk_compose`]        | [`singtalk_free_string`]   |
//! | `error` out-parameter       | [`singtalk_free_string`]   |

use std::ffi::{c_char, CStr, CString};

use crate::{config::SynthConfig, score::Score, singer::Singer};

// ─────────────────────────────────────────────────────────────────────────────

/// Opaque handle to a configured pipeline.
pub struct SingerHandle {
    singer: Singer,
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Convert a non-null `*const c_char` to an owned `String`.
/// Returns `None` if `ptr` is null.
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

/// Heap-allocate an owned C string.  Returns null on interior nul bytes.
fn to_c_str(s: &str) -> *const c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        Err(_) => std::ptr::null(),
    }
}

/// Store `message` in `*error` if the caller asked for it.
unsafe fn set_error(error: *mut *const c_char, message: &str) {
    if !error.is_null() {
        unsafe { *error = to_c_str(message) };
    }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Create a pipeline from a JSON configuration.
///
/// @param config_json  UTF-8 JSON, or `NULL` for the stock configuration.
/// @return             Opaque handle, or `NULL` on a malformed config
///                     (details to stderr).  Free with [`singtalk_singer_free`].
#[no_mangle]
pub unsafe extern "C" fn singtalk_singer_load(config_json: *const c_char) -> *mut SingerHandle {
    let config = match unsafe { cstr_to_string(config_json) } {
        None => SynthConfig::default(),
        Some(json) => match SynthConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("[singtalk] singtalk_singer_load: {e}");
                return std::ptr::null_mut();
            }
        },
    };
    Box::into_raw(Box::new(SingerHandle { singer: Singer::new(config) }))
}

/// Compile a JSON score into engine command text.
///
/// @param singer      Handle from [`singtalk_singer_load`].
/// @param score_json  UTF-8 JSON score.
/// @param error       Optional out-parameter; on failure receives a
///                    heap-allocated message.
/// @return            Heap-allocated command text, or `NULL` on failure.
///                    Free with [`singtalk_free_string`].
#[no_mangle]
pub unsafe extern "C" fn singtalk_compose(
    singer: *const SingerHandle,
    score_json: *const c_char,
    error: *mut *const c_char,
) -> *const c_char {
    if singer.is_null() {
        unsafe { set_error(error, "null singer handle") };
        return std::ptr::null();
    }
    let Some(json) = (unsafe { cstr_to_string(score_json) }) else {
        unsafe { set_error(error, "null score") };
        return std::ptr::null();
    };

    let score = match Score::from_json(&json) {
        Ok(score) => score,
        Err(e) => {
            unsafe { set_error(error, &format!("invalid score: {e}")) };
            return std::ptr::null();
        }
    };

    let h = unsafe { &*singer };
    let composition = h.singer.compose(&score);
    for warning in &composition.warnings {
        eprintln!("[singtalk] warning: {warning}");
    }
    to_c_str(&composition.command)
}

/// Free a string returned by this library.
#[no_mangle]
pub unsafe extern "C" fn singtalk_free_string(s: *const c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s as *mut c_char) });
    }
}

/// Destroy a pipeline handle.
#[no_mangle]
pub unsafe extern "C" fn singtalk_singer_free(singer: *mut SingerHandle) {
    if !singer.is_null() {
        drop(unsafe { Box::from_raw(singer) });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

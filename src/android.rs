//! JNI bindings for Android.
//!
//! These functions are called from Kotlin via the JNI bridge.

use jni::objects::{JByteArray, JClass, JString};
use jni::sys::{jbyteArray, jint, jlong};
use jni::JNIEnv;

use crate::{export_png_to_pdf, render_worksheet_png};

fn to_java_bytes(env: &mut JNIEnv, bytes: &[u8]) -> jbyteArray {
    match env.byte_array_from_slice(bytes) {
        Ok(arr) => arr.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Render a worksheet to PNG bytes.
///
/// Called from Kotlin as:
///   external fun renderPng(glyphDir: String, difficulty: String, measures: Int, seed: Long): ByteArray?
///
/// A `seed` of 0 draws a fresh worksheet.
#[no_mangle]
pub extern "system" fn Java_com_rhythmsheet_app_RhythmLib_renderPng(
    mut env: JNIEnv,
    _class: JClass,
    glyph_dir: JString,
    difficulty: JString,
    measures: jint,
    seed: jlong,
) -> jbyteArray {
    let dir: String = match env.get_string(&glyph_dir) {
        Ok(s) => s.into(),
        Err(_) => return std::ptr::null_mut(),
    };
    let difficulty: String = match env.get_string(&difficulty) {
        Ok(s) => s.into(),
        Err(_) => return std::ptr::null_mut(),
    };

    let seed = if seed == 0 { None } else { Some(seed as u64) };

    match render_worksheet_png(&dir, &difficulty, measures as i64, seed) {
        Ok(png) => to_java_bytes(&mut env, &png),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Convert worksheet PNG bytes into a one-page A4 PDF.
///
/// Called from Kotlin as:
///   external fun exportPdf(png: ByteArray): ByteArray?
#[no_mangle]
pub extern "system" fn Java_com_rhythmsheet_app_RhythmLib_exportPdf(
    mut env: JNIEnv,
    _class: JClass,
    png: JByteArray,
) -> jbyteArray {
    let bytes = match env.convert_byte_array(&png) {
        Ok(b) => b,
        Err(_) => return std::ptr::null_mut(),
    };

    match export_png_to_pdf(&bytes) {
        Ok(pdf) => to_java_bytes(&mut env, &pdf),
        Err(_) => std::ptr::null_mut(),
    }
}

//! JNI bindings for the Android app.
//!
//! Each public function here corresponds to a `external fun` declaration
//! in RustBridge.kt. The function names follow JNI naming conventions:
//! Java_<package>_<class>_<method> with dots replaced by underscores.
//!
//! Directions cross the boundary as JSON. Errors are raised as Java
//! exceptions and the function returns null.

use std::time::Duration;

use jni::objects::{JClass, JString};
use jni::sys::jstring;
use jni::JNIEnv;
use log::{error, LevelFilter};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::generator::DirectionsGenerator;
use crate::geocode::{GeocodeResolver, Geocoder};
use crate::otp::parse_legs;

const LOG_TAG: &str = "otp-directions";

/// Returns the rust-core library version.
/// Maps to: RustBridge.version() -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_otpdirections_RustBridge_version<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jstring {
    respond(&mut env, Ok(crate::VERSION.to_string()))
}

/// Routes `log` output to logcat. Safe to call more than once.
/// Maps to: RustBridge.initLogging()
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_otpdirections_RustBridge_initLogging<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag(LOG_TAG),
    );
}

/// Maps to: RustBridge.generateDirections(legsJson: String, configToml: String) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_otpdirections_RustBridge_generateDirections<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    legs_json: JString<'local>,
    config_toml: JString<'local>,
) -> jstring {
    let result = read_args(&mut env, &legs_json, &config_toml)
        .and_then(|(legs, config)| directions_json(&legs, &config));
    respond(&mut env, result)
}

/// Like `generateDirections`, but waits for every reverse lookup first.
/// Blocks the calling thread; call it off the UI thread.
/// Maps to: RustBridge.resolveDirections(legsJson: String, configToml: String) -> String
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_otpdirections_RustBridge_resolveDirections<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    legs_json: JString<'local>,
    config_toml: JString<'local>,
) -> jstring {
    let result = read_args(&mut env, &legs_json, &config_toml).and_then(|(legs, config)| {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(resolved_directions_json(&legs, &config))
    });
    respond(&mut env, result)
}

/// Directions for a JSON array of legs, as a JSON summary.
pub fn directions_json(legs_json: &str, config_toml: &str) -> Result<String> {
    let config = load_config(config_toml)?;
    let legs = parse_legs(legs_json.as_bytes())?;
    let generator = DirectionsGenerator::new(legs, config.settings()?);
    Ok(serde_json::to_string(&generator.summary())?)
}

/// Directions with every generated name already looked up.
pub async fn resolved_directions_json(legs_json: &str, config_toml: &str) -> Result<String> {
    let config = load_config(config_toml)?;
    let legs = parse_legs(legs_json.as_bytes())?;
    let mut generator = DirectionsGenerator::new(legs, config.settings()?);

    let geocoder = Geocoder::from_config(&config.geocoding, config.display.locale)?;
    let resolver = GeocodeResolver::new(geocoder, Duration::from_secs(config.geocoding.timeout_seconds));
    resolver.resolve(&mut generator).await;

    Ok(serde_json::to_string(&generator.summary())?)
}

fn load_config(config_toml: &str) -> Result<Config> {
    let mut config = Config::from_toml_str(config_toml)?;
    config.apply_env_with(|key| std::env::var(key).ok())?;
    Ok(config)
}

fn read_args(env: &mut JNIEnv, legs_json: &JString, config_toml: &JString) -> Result<(String, String)> {
    let legs = java_string(env, legs_json)?;
    // A null config means defaults.
    let config = if config_toml.is_null() {
        String::new()
    } else {
        java_string(env, config_toml)?
    };
    Ok((legs, config))
}

fn java_string(env: &mut JNIEnv, value: &JString) -> Result<String> {
    env.get_string(value)
        .map(Into::into)
        .map_err(|e| Error::Config(format!("invalid string argument: {e}")))
}

fn respond(env: &mut JNIEnv, result: Result<String>) -> jstring {
    let message = match result {
        Ok(text) => match env.new_string(text) {
            Ok(s) => return s.into_raw(),
            Err(e) => format!("failed to create Java string: {e}"),
        },
        Err(e) => e.to_string(),
    };

    error!("{message}");
    if let Err(e) = env.throw_new("java/lang/IllegalArgumentException", &message) {
        error!("failed to throw exception: {e}");
    }
    std::ptr::null_mut()
}

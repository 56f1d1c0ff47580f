//! Aria Android JNI 绑定
//!
//! 提供 `com.aria.player.PlaybackBridge` 的 native 方法：启动/关闭协调器、
//! 网页桥接调用、系统媒体会话回调和通知栏按钮。所有入口都只把命令排队，
//! 不等待执行结果。

mod host;
mod payload;

use std::thread::{self, JoinHandle};

use jni::objects::{JClass, JObject, JString};
use jni::sys::{jboolean, jint, jlong, jstring, JNI_FALSE, JNI_TRUE};
use jni::JNIEnv;
use parking_lot::Mutex;

use aria_audio::{EngineConfig, SymphoniaEngine};
use aria_playback::{
    spawn_coordinator, BridgeCall, CustomAction, MediaSessionCallback, NotificationAction,
    PlaybackHandle, TransportRouter,
};

pub use host::JavaListener;
pub use payload::*;

/// 进程内唯一的协调器
struct Service {
    handle: PlaybackHandle,
    router: TransportRouter,
    events: Option<JoinHandle<()>>,
}

static SERVICE: Mutex<Option<Service>> = Mutex::new(None);

/// 初始化日志（Android）
#[cfg(target_os = "android")]
fn init_logging() {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag("AriaPlayer"),
    );
}

#[cfg(not(target_os = "android"))]
fn init_logging() {}

fn to_bool(ok: bool) -> jboolean {
    if ok {
        JNI_TRUE
    } else {
        JNI_FALSE
    }
}

fn to_jstring(env: &mut JNIEnv<'_>, s: &str) -> jstring {
    match env.new_string(s) {
        Ok(v) => v.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

fn read_string(env: &mut JNIEnv<'_>, s: &JString<'_>) -> Option<String> {
    if s.is_null() {
        return Some(String::new());
    }
    match env.get_string(s) {
        Ok(s) => Some(s.into()),
        Err(e) => {
            log::warn!("invalid java string: {}", e);
            None
        }
    }
}

/// 在协调器上执行只读查询，未启动时返回 `None`
fn with_service<T>(f: impl FnOnce(&Service) -> T) -> Option<T> {
    let guard = SERVICE.lock();
    match guard.as_ref() {
        Some(service) => Some(f(service)),
        None => {
            log::warn!("playback service not started");
            None
        }
    }
}

/// 取出路由的副本；入队可能阻塞，不能在持有 `SERVICE` 时进行
fn current_router() -> Option<TransportRouter> {
    with_service(|s| s.router.clone())
}

fn route(f: impl FnOnce(&TransportRouter) -> bool) -> jboolean {
    to_bool(current_router().map_or(false, |router| f(&router)))
}

/// JNI: 启动协调器
///
/// @param listener 实现 onNotification/startForeground/stopForeground/onEvent 的对象
/// @param configJson 配置 JSON，空串为默认
#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_nativeStart<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    listener: JObject<'local>,
    config_json: JString<'local>,
) -> jboolean {
    init_logging();
    to_bool(start_impl(&mut env, listener, config_json))
}

fn start_impl(env: &mut JNIEnv<'_>, listener: JObject<'_>, config_json: JString<'_>) -> bool {
    let Some(config_text) = read_string(env, &config_json) else {
        return false;
    };
    let config = match parse_config(&config_text) {
        Ok(c) => c,
        Err(e) => {
            log::error!("rejecting config: {}", e);
            return false;
        }
    };

    let vm = match env.get_java_vm() {
        Ok(vm) => vm,
        Err(e) => {
            log::error!("no JavaVM: {}", e);
            return false;
        }
    };
    let listener = match env.new_global_ref(listener) {
        Ok(r) => r,
        Err(e) => {
            log::error!("cannot keep listener: {}", e);
            return false;
        }
    };
    let java = JavaListener::new(vm, listener);

    // 重复启动时先关掉旧的
    stop_service();

    let handle = spawn_coordinator(
        Box::new(SymphoniaEngine::new(EngineConfig::default())),
        Box::new(java.clone()),
        Box::new(java.clone()),
        config,
    );
    let router = handle.router();

    let evt_rx = handle.evt_rx.clone();
    let events = thread::Builder::new()
        .name("aria-events".to_string())
        .spawn(move || {
            for event in evt_rx.iter() {
                if let Some(json) = event_json(&event) {
                    java.call("onEvent", Some(&json));
                }
            }
        });
    let events = match events {
        Ok(h) => Some(h),
        Err(e) => {
            log::error!("failed to spawn event thread: {}", e);
            None
        }
    };

    *SERVICE.lock() = Some(Service {
        handle,
        router,
        events,
    });
    log::info!("playback service started");
    true
}

fn stop_service() {
    // 先从锁里取出来，关闭时协调器线程会回调 Java
    let service = SERVICE.lock().take();
    if let Some(service) = service {
        let Service {
            handle,
            router,
            events,
        } = service;
        drop(router);
        handle.shutdown();
        if let Some(events) = events {
            let _ = events.join();
        }
        log::info!("playback service stopped");
    }
}

/// JNI: 关闭协调器（停止播放并退出前台）
#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_nativeShutdown<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) {
    stop_service();
}

/// JNI: 整体替换播放列表（JSON 数组）
#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_setPlaylist<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    tracks_json: JString<'local>,
) -> jboolean {
    let Some(text) = read_string(&mut env, &tracks_json) else {
        return JNI_FALSE;
    };
    let tracks = match parse_playlist(&text) {
        Ok(t) => t,
        Err(e) => {
            log::warn!("rejecting playlist: {}", e);
            return JNI_FALSE;
        }
    };
    route(|r| r.set_playlist(tracks))
}

// ---- 网页桥接 ----

#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_playSongAt<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
    index: jint,
) -> jboolean {
    route(|r| r.bridge(BridgeCall::PlaySongAt(index as i64)))
}

#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_pauseSong<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jboolean {
    route(|r| r.bridge(BridgeCall::PauseSong))
}

#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_resumeSong<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jboolean {
    route(|r| r.bridge(BridgeCall::ResumeSong))
}

#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_togglePlayPause<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jboolean {
    route(|r| r.bridge(BridgeCall::TogglePlayPause))
}

#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_stopSong<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jboolean {
    route(|r| r.bridge(BridgeCall::StopSong))
}

#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_nextSong<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jboolean {
    route(|r| r.bridge(BridgeCall::NextSong))
}

#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_previousSong<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jboolean {
    route(|r| r.bridge(BridgeCall::PreviousSong))
}

#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_seekTo<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
    position_ms: jlong,
) -> jboolean {
    route(|r| r.bridge(BridgeCall::SeekTo(position_ms)))
}

#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_setShuffle<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
    enabled: jboolean,
) -> jboolean {
    route(|r| r.bridge(BridgeCall::SetShuffle(enabled != JNI_FALSE)))
}

/// @param mode 0 = 关闭，1 = 列表循环，2 = 单曲循环
#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_setRepeatMode<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
    mode: jint,
) -> jboolean {
    match repeat_from_code(mode) {
        Some(mode) => route(|r| r.bridge(BridgeCall::SetRepeatMode(mode))),
        None => {
            log::debug!("ignoring repeat code {}", mode);
            JNI_FALSE
        }
    }
}

// ---- 系统媒体会话 ----

#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_onMediaPlay<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jboolean {
    route(|r| r.media_session(MediaSessionCallback::Play))
}

#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_onMediaPause<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jboolean {
    route(|r| r.media_session(MediaSessionCallback::Pause))
}

#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_onMediaSkipToNext<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jboolean {
    route(|r| r.media_session(MediaSessionCallback::SkipToNext))
}

#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_onMediaSkipToPrevious<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jboolean {
    route(|r| r.media_session(MediaSessionCallback::SkipToPrevious))
}

#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_onMediaSeekTo<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
    position_ms: jlong,
) -> jboolean {
    route(|r| r.media_session(MediaSessionCallback::SeekTo(position_ms)))
}

#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_onMediaStop<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jboolean {
    route(|r| r.media_session(MediaSessionCallback::Stop))
}

/// JNI: 媒体会话自定义动作（"SHUFFLE" / "REPEAT"）
#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_onMediaCustomAction<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    action: JString<'local>,
) -> jboolean {
    let Some(action) = read_string(&mut env, &action) else {
        return JNI_FALSE;
    };
    match action.parse::<CustomAction>() {
        Ok(action) => route(|r| r.media_session(MediaSessionCallback::CustomAction(action))),
        Err(e) => {
            log::debug!("{}", e);
            JNI_FALSE
        }
    }
}

// ---- 通知栏按钮 ----

/// JNI: 通知栏按钮（"PREVIOUS" / "PLAY_PAUSE" / "NEXT" / "SHUFFLE" / "REPEAT"）
#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_onNotificationAction<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    action: JString<'local>,
) -> jboolean {
    let Some(action) = read_string(&mut env, &action) else {
        return JNI_FALSE;
    };
    match action.parse::<NotificationAction>() {
        Ok(action) => route(|r| r.notification(action)),
        Err(e) => {
            log::debug!("{}", e);
            JNI_FALSE
        }
    }
}

// ---- 查询（无副作用） ----

#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_isPlaying<'local>(
    _env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jboolean {
    to_bool(with_service(|s| s.handle.is_playing()).unwrap_or(false))
}

/// JNI: 当前曲目 JSON；没有时返回 null
#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_currentTrackJson<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jstring {
    let json = with_service(|s| s.handle.current_track())
        .flatten()
        .and_then(|t| serde_json::to_string(&t).ok());
    match json {
        Some(json) => to_jstring(&mut env, &json),
        None => std::ptr::null_mut(),
    }
}

/// JNI: 完整会话快照 JSON
#[no_mangle]
pub extern "system" fn Java_com_aria_player_PlaybackBridge_snapshotJson<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jstring {
    let json = with_service(|s| serde_json::to_string(&s.handle.snapshot()).ok()).flatten();
    match json {
        Some(json) => to_jstring(&mut env, &json),
        None => std::ptr::null_mut(),
    }
}

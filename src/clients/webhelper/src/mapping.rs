use crate::error::WebHelperError;
use crate::models::{RawResource, RawStatus, RawTrack};
use serde::Serialize;

/// Normalized snapshot of the helper's playback state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackStatus {
    pub playing: bool,
    /// Percent, 0 to 100.
    pub volume: u8,
    pub position_seconds: f64,
    /// Absent when nothing is loaded in the player.
    pub current: Option<NowPlaying>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NowPlaying {
    pub track: Resource,
    pub artist: Resource,
    pub album: Resource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub name: String,
    pub uri: String,
    /// Canonical web link (`location.og`).
    pub link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnabledControls {
    pub previous_track: bool,
    pub play_pause: bool,
    pub next_track: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelperInfo {
    pub version: Option<u32>,
    pub client_version: Option<String>,
}

/// Map a raw helper payload onto [`PlaybackStatus`].
///
/// Scalars fall back to zero values; a `track` object that is present but
/// incomplete is rejected.
pub fn map_status(raw: &RawStatus) -> Result<PlaybackStatus, WebHelperError> {
    let current = match raw.track.as_ref().filter(|t| !t.is_null()) {
        Some(value) => {
            let track: RawTrack = serde_json::from_value(value.clone()).map_err(|e| {
                WebHelperError::MalformedStatus {
                    reason: e.to_string(),
                }
            })?;
            Some(map_now_playing(track))
        }
        None => None,
    };

    Ok(PlaybackStatus {
        playing: raw.playing.unwrap_or(false),
        volume: volume_percent(raw.volume),
        position_seconds: raw
            .playing_position
            .filter(|p| p.is_finite())
            .unwrap_or(0.0)
            .max(0.0),
        current,
    })
}

pub fn map_controls(raw: &RawStatus) -> EnabledControls {
    EnabledControls {
        previous_track: raw.prev_enabled.unwrap_or(false),
        play_pause: raw.play_enabled.unwrap_or(false),
        next_track: raw.next_enabled.unwrap_or(false),
    }
}

pub fn map_info(raw: &RawStatus) -> HelperInfo {
    HelperInfo {
        version: raw.version,
        client_version: raw.client_version.clone(),
    }
}

/// The helper reports volume as 0.0..=1.0.
pub fn volume_percent(volume: Option<f64>) -> u8 {
    match volume {
        Some(v) if v.is_finite() => (v.clamp(0.0, 1.0) * 100.0).round() as u8,
        _ => 0,
    }
}

fn map_now_playing(track: RawTrack) -> NowPlaying {
    NowPlaying {
        track: map_resource(track.track_resource),
        artist: map_resource(track.artist_resource),
        album: map_resource(track.album_resource),
    }
}

fn map_resource(resource: RawResource) -> Resource {
    Resource {
        name: resource.name,
        uri: resource.uri,
        link: resource.location.og,
    }
}

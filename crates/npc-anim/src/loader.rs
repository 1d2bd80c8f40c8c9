//! Clip-library loaders.
//!
//! # JSON format
//!
//! One object keyed by clip name.  Key order is registration order.
//!
//! ```json
//! {
//!   "idle":      { "repeat": 1, "chance": 1.0 },
//!   "idle_chew": { "repeat": 2, "chance": 0.3, "speed": 0.8 },
//!   "walk":      { "repeat": -1, "pingPong": true },
//!   "lie_down":  { "next": "lying", "reset": true,
//!                  "sound": { "name": "moo_1,moo_2", "chance": 0.5, "volume": 0.7 },
//!                  "soundFrame": { "frames": "3,10", "names": "hoof" } }
//! }
//! ```
//!
//! | Field        | Type                    | Default | Meaning                         |
//! |--------------|-------------------------|---------|---------------------------------|
//! | `repeat`     | int                     | `1`     | `-1` forever, `-2` from config  |
//! | `speed`      | float                   | `1.0`   | playback speed multiplier       |
//! | `pingPong`   | bool                    | `false` | forth-and-back passes           |
//! | `next`       | string                  | —       | clip chained on natural finish  |
//! | `chance`     | float                   | `1.0`   | random-selection weight         |
//! | `reset`      | bool                    | `false` | rewind when stopped             |
//! | `sound`      | string or object        | —       | sound cue at clip start         |
//! | `soundFrame` | `{frames, names}`       | —       | sound cue on specific frames    |
//!
//! An object-form `sound` without `chance` never plays, matching how content
//! authors have always used it.
//!
//! # CSV format
//!
//! ```csv
//! name,repeat,speed,ping_pong,next,chance,reset
//! idle,1,1.0,false,,1.0,false
//! walk,-1,1.2,true,,1.0,false
//! ```
//!
//! Every column except `name` may be left empty for its default.  CSV
//! libraries carry no sound cues.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{AnimError, AnimResult, AnimationMeta, ClipLibrary, Repeat, SoundCue, WrapMode};

// ── JSON ──────────────────────────────────────────────────────────────────────

/// Load a [`ClipLibrary`] from a JSON file.
pub fn load_library_json(path: &Path) -> AnimResult<ClipLibrary> {
    let file = std::fs::File::open(path)?;
    load_library_json_reader(file)
}

/// Like [`load_library_json`] but accepts any `Read` source.
pub fn load_library_json_reader<R: Read>(reader: R) -> AnimResult<ClipLibrary> {
    let root: Value = serde_json::from_reader(reader)
        .map_err(|e| AnimError::Parse(e.to_string()))?;
    let Value::Object(clips) = root else {
        return Err(AnimError::Parse("clip library must be a JSON object".into()));
    };

    let mut library = ClipLibrary::new();
    for (name, entry) in clips {
        let Value::Object(fields) = entry else {
            return Err(AnimError::Parse(format!("clip '{name}': entry must be an object")));
        };
        library.insert(parse_json_clip(name, &fields)?);
    }
    Ok(library)
}

fn parse_json_clip(name: String, fields: &Map<String, Value>) -> AnimResult<AnimationMeta> {
    let mut meta = AnimationMeta::new(name);

    if let Some(v) = fields.get("repeat") {
        let n = v
            .as_i64()
            .ok_or_else(|| field_error(&meta.name, "repeat", "an integer"))?;
        meta.repeat = Repeat::from(n.clamp(i32::MIN as i64, i32::MAX as i64) as i32);
    }
    if let Some(v) = fields.get("speed") {
        meta.speed = v
            .as_f64()
            .ok_or_else(|| field_error(&meta.name, "speed", "a number"))? as f32;
    }
    if let Some(v) = fields.get("pingPong") {
        let ping_pong = v
            .as_bool()
            .ok_or_else(|| field_error(&meta.name, "pingPong", "a boolean"))?;
        meta.wrap = if ping_pong { WrapMode::PingPong } else { WrapMode::Once };
    }
    if let Some(v) = fields.get("next") {
        let next = v
            .as_str()
            .ok_or_else(|| field_error(&meta.name, "next", "a string"))?;
        if !next.is_empty() {
            meta.next = Some(next.to_owned());
        }
    }
    if let Some(v) = fields.get("chance") {
        meta.chance = v
            .as_f64()
            .ok_or_else(|| field_error(&meta.name, "chance", "a number"))?;
    }
    if let Some(v) = fields.get("reset") {
        meta.reset = v
            .as_bool()
            .ok_or_else(|| field_error(&meta.name, "reset", "a boolean"))?;
    }

    let mut sound = match fields.get("sound") {
        None => None,
        Some(Value::String(s)) => Some(SoundCue { names: split_list(s), ..SoundCue::default() }),
        Some(Value::Object(cue)) => Some(SoundCue {
            names:  cue.get("name").and_then(Value::as_str).map(split_list).unwrap_or_default(),
            frames: Vec::new(),
            chance: Some(cue.get("chance").and_then(Value::as_f64).unwrap_or(0.0)),
            volume: cue.get("volume").and_then(Value::as_f64).map(|v| v as f32),
        }),
        Some(_) => return Err(field_error(&meta.name, "sound", "a string or an object")),
    };

    if let Some(v) = fields.get("soundFrame") {
        let Value::Object(frame) = v else {
            return Err(field_error(&meta.name, "soundFrame", "an object"));
        };
        let frames = frame
            .get("frames")
            .and_then(Value::as_str)
            .map(|s| {
                split_list(s)
                    .iter()
                    .map(|f| f.parse::<u32>())
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()
            .map_err(|_| field_error(&meta.name, "soundFrame.frames", "comma-separated frame numbers"))?
            .unwrap_or_default();
        let names = frame.get("names").and_then(Value::as_str).map(split_list).unwrap_or_default();
        let cue = sound.get_or_insert_with(SoundCue::default);
        cue.frames = frames;
        if cue.names.is_empty() {
            cue.names = names;
        }
    }
    meta.sound = sound;

    Ok(meta)
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect()
}

fn field_error(clip: &str, field: &str, expected: &str) -> AnimError {
    AnimError::Parse(format!("clip '{clip}': '{field}' must be {expected}"))
}

// ── CSV ───────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ClipRecord {
    name:      String,
    repeat:    Option<i32>,
    speed:     Option<f32>,
    ping_pong: Option<bool>,
    next:      Option<String>,
    chance:    Option<f64>,
    reset:     Option<bool>,
}

/// Load a [`ClipLibrary`] from a CSV file.
pub fn load_library_csv(path: &Path) -> AnimResult<ClipLibrary> {
    let file = std::fs::File::open(path)?;
    load_library_csv_reader(file)
}

/// Like [`load_library_csv`] but accepts any `Read` source.
pub fn load_library_csv_reader<R: Read>(reader: R) -> AnimResult<ClipLibrary> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut library = ClipLibrary::new();

    for result in csv_reader.deserialize::<ClipRecord>() {
        let rec = result.map_err(|e| AnimError::Parse(e.to_string()))?;
        if rec.name.is_empty() {
            return Err(AnimError::Parse("clip row with empty name".into()));
        }
        let mut meta = AnimationMeta::new(rec.name);
        if let Some(repeat) = rec.repeat {
            meta.repeat = Repeat::from(repeat);
        }
        if let Some(speed) = rec.speed {
            meta.speed = speed;
        }
        if rec.ping_pong.unwrap_or(false) {
            meta.wrap = WrapMode::PingPong;
        }
        meta.next = rec.next.filter(|n| !n.is_empty());
        if let Some(chance) = rec.chance {
            meta.chance = chance;
        }
        meta.reset = rec.reset.unwrap_or(false);
        library.insert(meta);
    }

    Ok(library)
}

//! # Input script interpreter module
//!
//! This module provides an interpreter for input scripts, which replay timed
//! input messages into the executable in place of a live message bus.
//!
//! A script is a text file where each entry has the form
//!
//! ```text
//! <time_s>: <json message>;
//! ```
//!
//! for example `0.5: {"type": "CURRENT_VEL", "payload": {"linear_ms": 0.0}};`.
//! Anything that does not match this form (such as `#` comment lines) is
//! ignored.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::RegexBuilder;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal
use comms_if::input::{InputMsg, MsgParseError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Matches one `<time>: <payload>;` entry.
const ENTRY_PATTERN: &str = r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A message which is scripted to be delivered at a specific time.
#[derive(Debug)]
struct ScriptedMsg {
    /// The time the message is supposed to be delivered at
    exec_time_s: f64,

    /// The message itself
    msg: InputMsg,
}

/// A script interpreter.
///
/// After initialising with the path to the script use `get_pending_msgs` to
/// acquire the messages that are due at the current time.
pub struct ScriptInterpreter {
    script_path: Option<PathBuf>,
    msgs: VecDeque<ScriptedMsg>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)"
    )]
    InvalidTimestamp(String),

    #[error("Script contains an invalid message at {0} s: {1}")]
    InvalidMsg(f64, MsgParseError),

    #[error("Could not build the script pattern: {0}")]
    PatternError(regex::Error),
}

/// The result of polling the interpreter for due messages.
#[derive(Debug, PartialEq)]
pub enum PendingMsgs {
    None,
    Some(Vec<InputMsg>),
    EndOfScript,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {
    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let path = PathBuf::from(script_path.as_ref());

        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        let script = fs::read_to_string(&path).map_err(ScriptError::ScriptLoadError)?;

        let mut si = Self::from_script_str(&script)?;
        si.script_path = Some(path);

        Ok(si)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_script_str(script: &str) -> Result<Self, ScriptError> {
        let re = RegexBuilder::new(ENTRY_PATTERN)
            .multi_line(true)
            .build()
            .map_err(ScriptError::PatternError)?;

        let mut msgs: Vec<ScriptedMsg> = vec![];

        for cap in re.captures_iter(script) {
            let (time_str, payload_str) = match (cap.get(1), cap.get(3)) {
                (Some(t), Some(p)) => (t.as_str(), p.as_str()),
                _ => continue,
            };

            let exec_time_s: f64 = time_str
                .parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            let msg = InputMsg::from_json(payload_str)
                .map_err(|e| ScriptError::InvalidMsg(exec_time_s, e))?;

            msgs.push(ScriptedMsg { exec_time_s, msg });
        }

        if msgs.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        // Deliver in time order, keeping file order for equal times
        msgs.sort_by(|a, b| {
            a.exec_time_s
                .partial_cmp(&b.exec_time_s)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(ScriptInterpreter {
            script_path: None,
            msgs: msgs.into(),
        })
    }

    /// Return the messages due at or before `current_time_s`.
    ///
    /// Once every message has been delivered `PendingMsgs::EndOfScript` is
    /// returned.
    pub fn get_pending_msgs(&mut self, current_time_s: f64) -> PendingMsgs {
        if self.msgs.is_empty() {
            return PendingMsgs::EndOfScript;
        }

        let mut msg_vec: Vec<InputMsg> = vec![];

        while let Some(front) = self.msgs.front() {
            if front.exec_time_s > current_time_s {
                break;
            }

            if let Some(m) = self.msgs.pop_front() {
                msg_vec.push(m.msg);
            }
        }

        if msg_vec.is_empty() {
            PendingMsgs::None
        } else {
            PendingMsgs::Some(msg_vec)
        }
    }

    /// Get the number of messages remaining in the script
    pub fn get_num_msgs(&self) -> usize {
        self.msgs.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.msgs.back() {
            Some(m) => m.exec_time_s,
            None => 0f64,
        }
    }

    /// Path the script was loaded from, if it came from a file.
    pub fn script_path(&self) -> Option<&Path> {
        self.script_path.as_deref()
    }
}

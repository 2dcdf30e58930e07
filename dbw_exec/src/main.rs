//! Main drive-by-wire executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Input acquisition from the input script
//!         - Input watchdog
//!         - Twist control processing
//!         - Actuator command publishing (only while drive-by-wire is enabled)
//!         - Archiving
//!
//! # Modules
//!
//! All modules (e.g. `twist_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use dbw_lib::{
    data_store::{DataStore, InputReadiness},
    params::DbwExecParams,
    publisher::{forward_outputs, ActuatorPublisher, ArchivePublisher},
    twist_ctrl::TwistCtrl,
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{PendingMsgs, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Modules which log on every cycle, kept off the console below `Info`.
const PER_CYCLE_LOG_TARGETS: &[&str] = &[
    "dbw_lib::twist_ctrl::controller",
    "dbw_lib::twist_ctrl::state",
    "dbw_lib::publisher",
];

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Drive-by-wire twist controller
#[derive(Debug, StructOpt)]
#[structopt(name = "dbw_exec")]
struct Opt {
    /// Path to the input script to replay
    #[structopt(parse(from_os_str))]
    script: PathBuf,

    /// Stop after this many cycles even if the script has not ended
    #[structopt(long)]
    max_cycles: Option<u64>,

    /// Minimum log level, one of `info`, `debug` or `trace`
    #[structopt(long, default_value = "debug")]
    log_level: LevelFilter,

    /// Run cycles back to back instead of at the control rate
    #[structopt(long)]
    fast: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("dbw_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opt.log_level, PER_CYCLE_LOG_TARGETS, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Drive-By-Wire Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let exec_params: DbwExecParams =
        util::params::load("dbw_exec.toml").wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE INPUT SOURCE ----

    let mut si = ScriptInterpreter::new(&opt.script).wrap_err("Failed to load script")?;

    info!(
        "Loaded {:?}, lasts {:.02} s and contains {} messages\n",
        si.script_path(),
        si.get_duration(),
        si.get_num_msgs()
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut ds = DataStore::new(exec_params.initial_dbw_enabled);

    let mut twist_ctrl =
        TwistCtrl::init("twist_ctrl.toml", &session).wrap_err("Failed to initialise TwistCtrl")?;
    info!("TwistCtrl init complete");

    let mut publisher: Box<dyn ActuatorPublisher> = if exec_params.archive_outputs {
        Box::new(
            ArchivePublisher::new(&session).wrap_err("Failed to initialise the publisher")?,
        )
    } else {
        Box::new(ArchivePublisher::log_only())
    };

    info!("Module initialisation complete\n");

    let cycle_period_s = twist_ctrl.cycle_period_s();
    let cycle_period = Duration::from_secs_f64(cycle_period_s);

    // ---- MAIN LOOP ----

    info!("Begining main loop ({:.1} Hz)\n", 1.0 / cycle_period_s);

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(cycle_period_s);

        if let Some(max) = opt.max_cycles {
            if ds.num_cycles >= max {
                info!("Reached the maximum of {} cycles, stopping", max);
                break;
            }
        }

        // ---- DATA INPUT ----

        match si.get_pending_msgs(ds.sim_time_s) {
            PendingMsgs::None => (),
            PendingMsgs::Some(msg_vec) => {
                for msg in msg_vec.iter() {
                    ds.apply_msg(msg);
                }
            }
            // Exit if end of script reached
            PendingMsgs::EndOfScript => {
                info!("End of input script reached, stopping");
                break;
            }
        }

        ds.check_input_timeouts(exec_params.input_timeout_s);

        // ---- CONTROL ALGORITHM PROCESSING ----

        match ds.readiness() {
            InputReadiness::NotReady {
                missing_current_vel,
                missing_twist_cmd,
            } => {
                if ds.is_1_hz_cycle {
                    info!(
                        "Waiting for inputs (velocity missing: {}, twist missing: {})",
                        missing_current_vel, missing_twist_cmd
                    );
                }
            }
            InputReadiness::Ready(inputs) => match twist_ctrl.proc(&inputs) {
                Ok((o, r)) => {
                    ds.twist_ctrl_output = Some(o);
                    ds.twist_ctrl_status_rpt = r;

                    // Send demands to the actuators
                    if let Err(e) = forward_outputs(&mut *publisher, inputs.dbw_enabled, &o) {
                        warn!("Could not publish actuator commands: {}", e);
                    }
                }
                Err(e) => {
                    // Bad inputs are dropped for this cycle, the next message will replace them
                    ds.num_proc_errors += 1;
                    warn!("Error during TwistCtrl processing: {}", e)
                }
            },
        }

        // ---- WRITE ARCHIVES ----

        if ds.twist_ctrl_output.is_some() {
            if let Err(e) = twist_ctrl.write() {
                warn!("Could not write TwistCtrl archives: {}", e);
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        if !opt.fast {
            // Get sleep duration
            match cycle_period.checked_sub(cycle_dur) {
                Some(d) => {
                    ds.num_consec_cycle_overruns = 0;
                    thread::sleep(d);
                }
                None => {
                    warn!(
                        "Cycle overran by {:.06} s",
                        cycle_dur.as_secs_f64() - cycle_period_s
                    );
                    ds.num_consec_cycle_overruns += 1;
                }
            }
        }

        ds.cycle_end();
    }

    // ---- SHUTDOWN ----

    info!(
        "End of execution after {} cycles ({} rejected inputs)",
        ds.num_cycles, ds.num_proc_errors
    );

    Ok(())
}

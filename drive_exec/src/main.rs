//! Main drive executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop (fixed 20 ms cycle):
//!         - System input acquisition:
//!             - Wheel encoder sensing
//!             - Pose acquisition from the odometry source
//!         - Command script processing and handling
//!         - Drive control processing (mode dispatch)
//!         - Motor driver execution
//!         - Telemetry and cycle management
//!
//! # Modules
//!
//! All cyclic modules (e.g. `drive_ctrl`) shall provide a public struct
//! implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use drive_lib::{
    data_store::DataStore,
    drive_ctrl::{self, DriveCmd},
    kinematics::WheelPair,
    motor_driver,
    sim_client::SimClient,
    telem::CsvTelem,
    wheel_sensors::WheelEncoders,
};

mod cmd_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{PendingCmds, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.02;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "drive_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Drive Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- INITIALISE COMMAND SOURCE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    // A single argument gives the command script to run
    let mut script: ScriptInterpreter<DriveCmd> = if args.len() == 2 {
        info!("Loading script from \"{}\"", &args[1]);
        ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?
    } else {
        return Err(eyre!(
            "Expected exactly one argument (the command script path), found {}",
            args.len() - 1
        ));
    };

    info!(
        "Loaded script lasts {:.02} s and contains {} commands\n",
        script.get_duration(),
        script.get_num_cmds()
    );

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    let telem = CsvTelem::new(&session)
        .map_err(|e| eyre!("Failed to initialise the telemetry sink: {}", e))?;

    ds.drive_ctrl.init(
        drive_ctrl::InitData {
            params_path: "drive_ctrl.toml",
            traj_ctrl_params_path: "traj_ctrl.toml",
            telem: Box::new(telem),
        },
        &session,
    )
    .wrap_err("Failed to initialise DriveCtrl")?;
    info!("DriveCtrl init complete");

    ds.motor_driver.init("motor_driver.toml", &session)
        .wrap_err("Failed to initialise MotorDriver")?;
    info!("MotorDriver init complete");

    let mut encoders = WheelEncoders::init("wheel_sensors.toml")
        .wrap_err("Failed to initialise WheelEncoders")?;
    info!("WheelEncoders init complete");

    // No hardware in this configuration: the simulation closes the loop,
    // standing in for the odometry source and the encoder counters.
    let mut sim = SimClient::init("sim_client.toml")
        .wrap_err("Failed to initialise SimClient")?;
    info!("SimClient init complete");

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut script_finished = false;

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ, util::session::get_elapsed_seconds());

        // ---- DATA INPUT ----

        ds.drive_ctrl_input.pose = sim.pose();
        ds.drive_ctrl_input.time_s = ds.time_s;
        ds.drive_ctrl_input.dt_s = CYCLE_PERIOD_S;

        // A failed encoder reading degrades to zero rates, it must not take
        // the cycle down
        match encoders.read(&mut sim, CYCLE_PERIOD_S) {
            Some(reading) => {
                ds.drive_ctrl_input.wheel_rates_ms = reading.rates_ms;
                ds.drive_ctrl_input.rates_valid = true;
            }
            None => {
                warn!("No encoder reading this cycle, falling back to zero rates");
                ds.drive_ctrl_input.wheel_rates_ms = WheelPair::new(0.0, 0.0);
                ds.drive_ctrl_input.rates_valid = false;
            }
        }

        // ---- COMMAND PROCESSING ----

        match script.get_pending(ds.time_s) {
            PendingCmds::None => (),
            PendingCmds::Some(cmd_vec) => {
                for cmd in cmd_vec.iter() {
                    cmd_processor::exec(&mut ds, &session, cmd);
                }
            }
            // Disable and run one final cycle so the stop reaches the motors
            PendingCmds::EndOfScript => {
                info!("End of command script reached, stopping");
                ds.drive_ctrl.disable();
                script_finished = true;
            }
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        // DriveCtrl processing
        match ds.drive_ctrl.proc(&ds.drive_ctrl_input) {
            Ok((output, report)) => {
                ds.drive_ctrl_output = output;
                ds.drive_ctrl_status_rpt = report;
            }
            Err(e) => warn!("Error during DriveCtrl processing: {}", e),
        }

        // MotorDriver processing
        match ds.motor_driver.proc(&motor_driver::InputData {
            voltages_v: ds.drive_ctrl_output,
            safe: false,
        }) {
            Ok((output, report)) => {
                ds.motor_driver_output = output;
                ds.motor_driver_status_rpt = report;
            }
            Err(e) => warn!("Error during MotorDriver processing: {}", e),
        }

        // ---- SIMULATION ----

        sim.step(ds.motor_driver_output, CYCLE_PERIOD_S);

        // 1 Hz heartbeat with the pose for quick eyeballing of a run
        if ds.is_1_hz_cycle {
            let pose = ds.drive_ctrl_input.pose;
            debug!(
                "pose: x {:.3} m, y {:.3} m, heading {:.3} rad",
                pose.position_m[0], pose.position_m[1], pose.heading_rad
            );
        }

        // ---- CYCLE MANAGEMENT ----

        if script_finished {
            break;
        }

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S)
            .checked_sub(cycle_dur)
        {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    info!("End of execution");

    session.exit();

    Ok(())
}

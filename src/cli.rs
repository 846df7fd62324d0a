// SleepCam - Simulator Command Line
//
// Arguments of the host build: a state file standing in for RTC memory,
// followed by the raw frames the replay camera hands out in order.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "sleepcam")]
#[command(about = "Run one wake of the SleepCam controller against simulated hardware", long_about = None)]
pub struct Cli {
    /// File holding the persisted cycle record; absent means a cold boot
    pub state: PathBuf,

    /// Raw 8-bit grayscale frames, one per capture
    #[arg(required = true)]
    pub frames: Vec<PathBuf>,
}

use argh::FromArgs;
use std::path::PathBuf;

#[derive(FromArgs, Debug, Default)]
/// Live heart rate and HRV from a BLE Heart Rate Monitor
pub struct TopLevelCmd {
    /// specify config file path, creates file if it doesn't exist
    #[argh(option, short = 'c')]
    pub config_override: Option<PathBuf>,
    /// config file must exist, including "config_override" files
    #[argh(switch, short = 'r')]
    pub config_required: bool,
    /// use config file as-is (don't save over it)
    #[argh(switch, short = 'n')]
    pub no_save: bool,
    /// seconds to wait for a monitor before giving up, otherwise uses config's timeout
    #[argh(option, short = 't')]
    pub timeout: Option<u64>,
    /// feed every batched RR interval into HRV, not just the first per notification
    #[argh(switch)]
    pub all_rr: bool,
    /// print a text banner per reading instead of drawing charts
    #[argh(switch)]
    pub headless: bool,
    #[argh(subcommand)]
    pub subcommands: Option<SubCommands>,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
pub enum SubCommands {
    Ble(BleCmd),
    Dummy(DummyCmd),
}

/// connect to a BLE device with the HR Measure characteristic (default)
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "ble")]
pub struct BleCmd {}

/// generate dummy heart rate data, no monitor needed
#[derive(FromArgs, Debug)]
#[argh(subcommand, name = "dummy")]
pub struct DummyCmd {}

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use jiff::civil::Date;

use crate::calculation::request_range::RequestType;
use crate::config::billing_cycle::{BillingCycle, CostColumns};
use crate::io::local_store::LocalStore;
use crate::io::locator::Container;
use crate::pipeline::ReportRequest;

impl Cli {
    /// Convenience constructor to avoid redundant `Parser` imports in main.
    pub fn new() -> Self {
        Cli::parse()
    }

    /// The store every command reads from and writes to.
    ///
    /// Defaults to `<data dir>/blobmeter` when no root is configured.
    pub fn open_store(&self) -> miette::Result<LocalStore> {
        let root = match &self.store_root {
            Some(root) => root.to_owned(),
            None => dirs::data_dir()
                .ok_or_else(|| miette::miette!("Could not find a data directory, pass --store-root."))?
                .join("blobmeter"),
        };

        Ok(LocalStore::new(root))
    }
}

impl ReportArgs {
    /// The request shared by every month of the run, dated at `date`.
    pub fn request_template(&self, date: Date) -> ReportRequest {
        ReportRequest {
            date,
            client_id: self.client_id.to_owned(),
            monthly: Container::monthly(&self.monthly_container, &self.monthly_prefix),
            daily: Container::daily(&self.daily_container, &self.daily_prefix),
            cycle: BillingCycle::default(),
            columns: CostColumns::default(),
        }
    }
}

// Structs

#[derive(Parser, Debug)]
#[command(name = "blobmeter", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    //
    // Global args start here..
    //

    //
    /// Skip animations
    #[arg(long, env = "BLOBMETER_NO_ANIMATE", default_value_t = false, global = true)]
    pub no_animate: bool,

    /// No format.
    #[arg(long, env = "BLOBMETER_UNFORMATTED", default_value_t = false, global = true)]
    pub unformatted: bool,

    /// Directory holding one sub-directory per container.
    #[arg(long, env = "BLOBMETER_STORE_ROOT", global = true)]
    pub store_root: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a newly arrived usage export into one file per meter.
    Split(SplitArgs),

    /// Build the consolidated cost report of a client.
    ///
    /// Every month touched by the requested window gets its own `{MonthName}.csv`.
    Report(ReportArgs),
}

#[derive(clap::Args, Debug)]
pub struct SplitArgs {
    /// Name of the object that triggered the run.
    #[arg(long, env = "BLOBMETER_TRIGGER_OBJECT")]
    pub object: String,

    /// Container the object arrived in.
    #[arg(long, env = "BLOBMETER_TRIGGER_CONTAINER")]
    pub container: String,

    /// Container the per-meter files go to. Defaults to the trigger container.
    #[arg(long, env = "BLOBMETER_SPLIT_CONTAINER")]
    pub output_container: Option<String>,

    /// Prefix for the per-meter files.
    #[arg(long, env = "BLOBMETER_SPLIT_PREFIX", default_value = "split/")]
    pub output_prefix: String,
}

#[derive(clap::Args, Debug)]
pub struct ReportArgs {
    /// Client (enrollment) identifier looked up in the file names.
    #[arg(long, env = "BLOBMETER_CLIENT_ID", hide_env_values = true)]
    pub client_id: String,

    /// Reporting window.
    #[arg(long, value_enum, env = "BLOBMETER_REQUEST", default_value = "mtd")]
    pub request: RequestKind,

    /// Start date (YYYY-MM-DD). Needed by 'custom' and 'custom-month'.
    #[arg(long, env = "BLOBMETER_START")]
    pub start: Option<Date>,

    /// End date (YYYY-MM-DD) for 'custom'. Defaults to today.
    #[arg(long, env = "BLOBMETER_END")]
    pub end: Option<Date>,

    #[arg(long, env = "BLOBMETER_MONTHLY_CONTAINER", default_value = "monthly-usage")]
    pub monthly_container: String,

    #[arg(long, env = "BLOBMETER_MONTHLY_PREFIX", default_value = "new/monthlyEAUsage/")]
    pub monthly_prefix: String,

    #[arg(long, env = "BLOBMETER_DAILY_CONTAINER", default_value = "daily-usage")]
    pub daily_container: String,

    #[arg(long, env = "BLOBMETER_DAILY_PREFIX", default_value = "new/dailyEAUsage/")]
    pub daily_prefix: String,

    /// Container the reports are stored in.
    #[arg(long, env = "BLOBMETER_REPORT_CONTAINER", default_value = "reports")]
    pub report_container: String,

    #[arg(long, env = "BLOBMETER_REPORT_PREFIX", default_value = "")]
    pub report_prefix: String,

    /// Print the located files of every month before aggregating them.
    #[arg(long, env = "BLOBMETER_LIST_FILES", default_value_t = false)]
    pub list_files: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
pub enum RequestKind {
    /// Month to date.
    #[default]
    Mtd,
    /// Previous month.
    Pm,
    Custom,
    CustomMonth,
}

impl From<RequestKind> for RequestType {
    fn from(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Mtd => RequestType::MonthToDate,
            RequestKind::Pm => RequestType::PreviousMonth,
            RequestKind::Custom => RequestType::Custom,
            RequestKind::CustomMonth => RequestType::CustomMonth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use jiff::civil::date;
    use std::ffi::OsStr;

    #[test]
    fn test_report_defaults() {
        let cli = Cli::try_parse_from(["blobmeter", "report", "--client-id", "123"]).unwrap();

        let Commands::Report(args) = cli.command else {
            panic!("expected the report command");
        };

        assert_eq!(args.request, RequestKind::Mtd);
        assert_eq!(args.start, None);
        assert_eq!(args.end, None);
        assert!(!args.list_files);
        assert_eq!(args.monthly_container, "monthly-usage");
        assert_eq!(args.daily_prefix, "new/dailyEAUsage/");
    }

    #[test]
    fn test_report_values_have_env_fallbacks() {
        let command = Cli::command();
        let report = command.find_subcommand("report").unwrap();

        for (id, env) in [
            ("client_id", "BLOBMETER_CLIENT_ID"),
            ("request", "BLOBMETER_REQUEST"),
            ("start", "BLOBMETER_START"),
            ("end", "BLOBMETER_END"),
            ("list_files", "BLOBMETER_LIST_FILES"),
            ("report_container", "BLOBMETER_REPORT_CONTAINER"),
        ] {
            let arg = report
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .unwrap();

            assert_eq!(arg.get_env(), Some(OsStr::new(env)), "argument {id}");
        }
    }

    #[test]
    fn test_report_custom_month() {
        let cli = Cli::try_parse_from([
            "blobmeter",
            "--store-root",
            "/tmp/blobs",
            "report",
            "--client-id",
            "123",
            "--request",
            "custom-month",
            "--start",
            "2023-03-10",
        ])
        .unwrap();

        assert_eq!(cli.store_root, Some(PathBuf::from("/tmp/blobs")));

        let Commands::Report(args) = cli.command else {
            panic!("expected the report command");
        };

        assert_eq!(RequestType::from(args.request), RequestType::CustomMonth);
        assert_eq!(args.start, Some(date(2023, 3, 10)));

        let template = args.request_template(date(2023, 3, 10));
        assert_eq!(template.monthly.name, "monthly-usage");
        assert_eq!(template.client_id, "123");
    }

    #[test]
    fn test_bad_start_date_is_rejected() {
        let parsed = Cli::try_parse_from([
            "blobmeter",
            "report",
            "--client-id",
            "123",
            "--start",
            "10/03/2023",
        ]);

        assert!(parsed.is_err());
    }

    #[test]
    fn test_split_args() {
        let cli = Cli::try_parse_from([
            "blobmeter",
            "split",
            "--object",
            "usage/export.csv",
            "--container",
            "usage",
        ])
        .unwrap();

        let Commands::Split(args) = cli.command else {
            panic!("expected the split command");
        };

        assert_eq!(args.output_container, None);
        assert_eq!(args.output_prefix, "split/");
    }
}

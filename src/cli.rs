#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSizeArg {
    #[value(name = "5")]
    Five,
    #[value(name = "10")]
    Ten,
    #[value(name = "25")]
    TwentyFive,
    #[value(name = "50")]
    Fifty,
    #[value(name = "100")]
    Hundred,
}

impl PageSizeArg {
    pub fn records(self) -> usize {
        match self {
            PageSizeArg::Five => 5,
            PageSizeArg::Ten => 10,
            PageSizeArg::TwentyFive => 25,
            PageSizeArg::Fifty => 50,
            PageSizeArg::Hundred => 100,
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumnArg {
    ServiceName,
    Location,
    ResourceGroup,
    Date,
    Cost,
    UnitOfMeasure,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderArg {
    Asc,
    Desc,
}

#[derive(clap::Parser, Debug)]
#[command(about = "Terminal viewer for cloud-cost billing records")]
pub struct Args {
    /// Show records for one application only
    #[arg(long, conflicts_with = "resource")]
    pub application: Option<String>,

    /// Show records for one resource only
    #[arg(long)]
    pub resource: Option<String>,

    /// List the available application/resource filters instead of the report
    #[arg(long)]
    pub list_filters: bool,

    /// Narrow --list-filters output by containment match
    #[arg(long, default_value = "")]
    pub search: String,

    /// Zero-based page index to jump to
    #[arg(long, default_value_t = 0)]
    pub page: i64,

    /// Records per page: 5|10|25|50|100
    #[arg(long, value_enum, default_value_t = PageSizeArg::Five)]
    pub page_size: PageSizeArg,

    /// Sort column (unsorted by default)
    #[arg(long, value_enum)]
    pub sort: Option<SortColumnArg>,

    /// Sort direction: asc|desc
    #[arg(long, value_enum, default_value_t = OrderArg::Asc)]
    pub order: OrderArg,

    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Discard cached results for this query and fetch fresh data
    #[arg(long)]
    pub refresh: bool,

    /// Skip the persistent result cache for this run
    #[arg(long)]
    pub no_cache: bool,

    /// Page through results interactively (n/p/g K/z SIZE/s COL/o/r/q)
    #[arg(long)]
    pub interactive: bool,

    /// Debug mode: show fetch and cache details on stderr
    #[arg(long, env = "CLOUDREPORT_DEBUG")]
    pub debug: bool,
}

impl Args {
    pub fn parse() -> Self {
        <Args as clap::Parser>::parse()
    }
}

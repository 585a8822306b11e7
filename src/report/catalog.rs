use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Png,
    Csv,
}

impl ReportFormat {
    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            ReportFormat::Png => "--generate-png",
            ReportFormat::Csv => "--generate-csv",
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            ReportFormat::Png => "png",
            ReportFormat::Csv => "csv",
        }
    }
}

/// One reporter plugin and the artifacts it is asked for.
#[derive(Debug, Clone, Copy)]
pub struct ReportKind {
    pub plugin: &'static str,
    pub stem: &'static str,
    pub formats: &'static [ReportFormat],
    /// Empty when the plugin takes no `--granulation`.
    pub granulations: &'static [u32],
}

const BOTH: &[ReportFormat] = &[ReportFormat::Png, ReportFormat::Csv];
const CSV_ONLY: &[ReportFormat] = &[ReportFormat::Csv];
/// Response-time buckets in milliseconds.
const GRANULATIONS: &[u32] = &[10, 100, 1000];

const fn kind(plugin: &'static str, stem: &'static str) -> ReportKind {
    ReportKind {
        plugin,
        stem,
        formats: BOTH,
        granulations: &[],
    }
}

pub const CATALOG: &[ReportKind] = &[
    ReportKind {
        plugin: "AggregateReport",
        stem: "aggregate-report",
        formats: CSV_ONLY,
        granulations: &[],
    },
    kind("BytesThroughputOverTime", "bytes-throughput-over-time"),
    kind("HitsPerSecond", "hits-per-sec"),
    kind("LatenciesOverTime", "latencies-over-time"),
    kind("ResponseCodesPerSecond", "response-codes-per-sec"),
    ReportKind {
        plugin: "ResponseTimesDistribution",
        stem: "response-times-distribution",
        formats: BOTH,
        granulations: GRANULATIONS,
    },
    ReportKind {
        plugin: "ResponseTimesOverTime",
        stem: "response-times-over-time",
        formats: BOTH,
        granulations: GRANULATIONS,
    },
    kind("ResponseTimesPercentiles", "response-times-percentiles"),
    kind("ThroughputVsThreads", "throughput-vs-threads"),
    kind("TimesVsThreads", "times-vs-threads"),
    kind("TransactionsPerSecond", "transactions-per-sec"),
    kind("PageDataExtractorOverTime", "page-data-extractor-over-time"),
];

/// A single reporter invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub plugin: &'static str,
    pub format: ReportFormat,
    pub granulation: Option<u32>,
    pub file_name: String,
}

impl ReportRequest {
    fn new(kind: &ReportKind, format: ReportFormat, granulation: Option<u32>) -> Self {
        let file_name = granulation.map_or_else(
            || format!("{}.{}", kind.stem, format.extension()),
            |value| format!("{}-{}.{}", kind.stem, value, format.extension()),
        );
        Self {
            plugin: kind.plugin,
            format,
            granulation,
            file_name,
        }
    }
}

/// Every invocation of the catalog, in catalog order.
#[must_use]
pub fn requests() -> Vec<ReportRequest> {
    let mut requests = Vec::new();
    for kind in CATALOG {
        for format in kind.formats {
            if kind.granulations.is_empty() {
                requests.push(ReportRequest::new(kind, *format, None));
            }
            for granulation in kind.granulations {
                requests.push(ReportRequest::new(kind, *format, Some(*granulation)));
            }
        }
    }
    requests
}

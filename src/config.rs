use clap::{Parser, ValueEnum};

use crate::batch::CHUNK_SIZE;

/// The two metrics this tool is deployed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Profile {
    /// Play counts, URLs in column A.
    Views,
    /// Share counts, URLs in column C.
    Shares,
}

impl Profile {
    pub fn field(self) -> &'static str {
        match self {
            Profile::Views => "playCount",
            Profile::Shares => "shareCount",
        }
    }

    pub fn source_column(self) -> u32 {
        match self {
            Profile::Views => 0,
            Profile::Shares => 2,
        }
    }

    pub fn tab(self) -> &'static str {
        match self {
            Profile::Views => "Vin計測ツール",
            Profile::Shares => "投稿シェア回数データ",
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "rtally", version, about = "Record today's per-post counters into a dated sheet column")]
pub struct Args {
    /// Which counter to record
    #[arg(long, value_enum, default_value_t = Profile::Views)]
    pub profile: Profile,

    /// Spreadsheet id (the long token in the sheet's URL)
    #[arg(long, env = "RTALLY_SHEET_ID")]
    pub sheet_id: String,

    /// Tab name, if not the profile's
    #[arg(long)]
    pub tab: Option<String>,

    /// Zero-based column holding post URLs, if not the profile's
    #[arg(long)]
    pub source_column: Option<u32>,

    /// Field name to extract from each page, if not the profile's
    #[arg(long)]
    pub field: Option<String>,

    /// Only URLs containing this host are fetched
    #[arg(long, default_value = "tiktok.com")]
    pub host: String,

    /// Rows per load/save round trip
    #[arg(long, default_value_t = CHUNK_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
    pub chunk_size: u32,

    /// Environment variable holding base64 service account JSON
    #[arg(long, default_value = "GOOGLE_CREDS_BASE64")]
    pub creds_env: String,
}

/// Everything a run needs to know, fixed before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyConfig {
    pub sheet_id: String,
    pub tab: String,
    pub source_column: u32,
    pub field: String,
    pub host: String,
    pub chunk_size: u32,
}

impl TallyConfig {
    pub fn for_profile(profile: Profile, sheet_id: &str) -> Self {
        TallyConfig {
            sheet_id: sheet_id.to_string(),
            tab: profile.tab().to_string(),
            source_column: profile.source_column(),
            field: profile.field().to_string(),
            host: "tiktok.com".to_string(),
            chunk_size: CHUNK_SIZE,
        }
    }
}

impl From<&Args> for TallyConfig {
    fn from(args: &Args) -> Self {
        let mut config = TallyConfig::for_profile(args.profile, &args.sheet_id);
        if let Some(tab) = &args.tab {
            config.tab = tab.clone();
        }
        if let Some(col) = args.source_column {
            config.source_column = col;
        }
        if let Some(field) = &args.field {
            config.field = field.clone();
        }
        config.host = args.host.clone();
        config.chunk_size = args.chunk_size;
        config
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn shares_profile_defaults() {
        let args = Args::try_parse_from(["rtally", "--profile", "shares", "--sheet-id", "abc"]).unwrap();
        let config = TallyConfig::from(&args);
        assert_eq!(config.field, "shareCount");
        assert_eq!(config.source_column, 2);
        assert_eq!(config.chunk_size, 100);
        assert_eq!(config.sheet_id, "abc");
    }

    #[test]
    fn overrides_win() {
        let args = Args::try_parse_from([
            "rtally",
            "--sheet-id",
            "abc",
            "--tab",
            "Sheet1",
            "--source-column",
            "1",
            "--field",
            "diggCount",
            "--chunk-size",
            "25",
        ])
        .unwrap();
        let config = TallyConfig::from(&args);
        assert_eq!(config.tab, "Sheet1");
        assert_eq!(config.source_column, 1);
        assert_eq!(config.field, "diggCount");
        assert_eq!(config.chunk_size, 25);
        assert_eq!(config.host, "tiktok.com");
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert!(Args::try_parse_from(["rtally", "--sheet-id", "abc", "--chunk-size", "0"]).is_err());
    }
}

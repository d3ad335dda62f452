//! Declared schema of the marriage registration file.

/// 신고월: month the registration was reported.
pub const REPORT_MONTH: &str = "신고월";
/// 남편연령5세단위코드: husband 5-year age bucket.
pub const HUSBAND_AGE: &str = "남편연령5세단위코드";
/// 아내연령5세단위코드: wife 5-year age bucket.
pub const WIFE_AGE: &str = "아내연령5세단위코드";
/// 남편직업분류코드: husband occupation code.
pub const HUSBAND_JOB: &str = "남편직업분류코드";
/// 아내직업분류코드: wife occupation code.
pub const WIFE_JOB: &str = "아내직업분류코드";
/// 남편결혼종류코드: husband marriage type.
pub const HUSBAND_MARRIAGE_TYPE: &str = "남편결혼종류코드";
/// 아내결혼종류코드: wife marriage type.
pub const WIFE_MARRIAGE_TYPE: &str = "아내결혼종류코드";

/// Columns holding integer codes. They are converted to `Int64` at load.
pub const INTEGER_COLUMNS: [&str; 5] = [
    REPORT_MONTH,
    HUSBAND_AGE,
    WIFE_AGE,
    HUSBAND_MARRIAGE_TYPE,
    WIFE_MARRIAGE_TYPE,
];

/// Columns kept as opaque text.
pub const TEXT_COLUMNS: [&str; 2] = [HUSBAND_JOB, WIFE_JOB];

/// Every column the dashboard reads, in file order.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    REPORT_MONTH,
    HUSBAND_AGE,
    WIFE_AGE,
    HUSBAND_JOB,
    WIFE_JOB,
    HUSBAND_MARRIAGE_TYPE,
    WIFE_MARRIAGE_TYPE,
];

pub const FIRST_MARRIAGE: i64 = 1;
pub const REMARRIAGE: i64 = 2;

/// Number of entries kept by the job ranking.
pub const JOB_RANKING_LIMIT: u32 = 10;

/// Name of the count column produced by every grouped view.
pub const COUNT: &str = "count";
